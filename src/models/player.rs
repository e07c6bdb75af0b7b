use serde::{Deserialize, Serialize};

use super::role::Role;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Player {
    pub id: String,
    pub name: String,
    pub role: Option<Role>, // ゲーム開始時に一度だけ割り当てる
    pub viewed: bool,       // 自分の役職を確認済みかどうか
    pub online: bool,
}

impl Player {
    pub fn new(id: String, name: String) -> Self {
        Self {
            id,
            name,
            role: None,
            viewed: false,
            online: true,
        }
    }
}
