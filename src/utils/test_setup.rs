use dotenvy::dotenv;
use std::sync::Once;

static INIT: Once = Once::new();

pub fn setup_test_env() {
    INIT.call_once(|| {
        dotenv().ok();
        // テストでは役職割り当てを再現できるようシードを固定する
        if std::env::var("DEBUG_FIXED_SEED").is_err() {
            std::env::set_var("DEBUG_FIXED_SEED", "42");
        }
    });
}
