use std::env;

#[derive(Debug, Clone)]
pub struct DebugConfig {
    pub enabled: bool,
    pub verbose_logging: bool,
    // 役職割り当てに使うシードを固定するかどうか（再現テスト用）
    pub fixed_seed: Option<u64>,
}

impl Default for DebugConfig {
    fn default() -> Self {
        let debug_mode = cfg!(debug_assertions) || env::var("DEBUG_MODE").is_ok();

        Self {
            enabled: debug_mode,
            verbose_logging: debug_mode,
            fixed_seed: None,
        }
    }
}

impl DebugConfig {
    pub fn from_env() -> Self {
        let enabled = env::var("DEBUG_ENABLED")
            .map(|v| v == "true")
            .unwrap_or_else(|_| cfg!(debug_assertions));
        let verbose_logging = env::var("DEBUG_VERBOSE_LOGGING")
            .map(|v| v == "true")
            .unwrap_or(enabled);
        let fixed_seed = env::var("DEBUG_FIXED_SEED")
            .ok()
            .and_then(|v| v.parse::<u64>().ok());

        Self {
            enabled,
            verbose_logging,
            fixed_seed,
        }
    }
}
