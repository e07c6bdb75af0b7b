use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Merlin,       // マーリン
    Percival,     // パーシヴァル
    LoyalServant, // 忠臣（重複あり）
    Morgana,      // モルガナ
    Assassin,     // 暗殺者
    Mordred,      // モードレッド
    Oberon,       // オベロン
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Alignment {
    Good,
    Evil,
}

impl Role {
    // 陣営は役職から一意に決まる
    pub fn alignment(&self) -> Alignment {
        match self {
            Role::Merlin | Role::Percival | Role::LoyalServant => Alignment::Good,
            Role::Morgana | Role::Assassin | Role::Mordred | Role::Oberon => Alignment::Evil,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Merlin => write!(f, "マーリン"),
            Role::Percival => write!(f, "パーシヴァル"),
            Role::LoyalServant => write!(f, "忠臣"),
            Role::Morgana => write!(f, "モルガナ"),
            Role::Assassin => write!(f, "暗殺者"),
            Role::Mordred => write!(f, "モードレッド"),
            Role::Oberon => write!(f, "オベロン"),
        }
    }
}

impl fmt::Display for Alignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Alignment::Good => write!(f, "正義陣営"),
            Alignment::Evil => write!(f, "邪悪陣営"),
        }
    }
}
