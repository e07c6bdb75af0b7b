use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::player::Player;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum RoomStatus {
    Lobby,
    InProgress,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Room {
    pub code: String,
    pub host: String,
    pub players: Vec<Player>,
    pub status: RoomStatus,
    pub created_at: DateTime<Utc>,
}

impl Room {
    pub fn new(code: String, host: String) -> Self {
        Room {
            code,
            host,
            players: Vec::new(),
            status: RoomStatus::Lobby,
            created_at: Utc::now(),
        }
    }
}

const CODE_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

// 6文字の英数字ルームコードを生成する
pub fn generate_room_code() -> String {
    let mut rng = rand::thread_rng();
    (0..6)
        .map(|_| CODE_CHARS[rng.gen_range(0..CODE_CHARS.len())] as char)
        .collect()
}
