use axum::extract::ws::Message;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::{broadcast, Mutex};

use crate::models::config::DebugConfig;
use crate::models::{game::Game, room::Room};

#[derive(Clone)]
pub struct AppState {
    pub rooms: Arc<Mutex<HashMap<String, Room>>>,
    pub games: Arc<Mutex<HashMap<String, Game>>>,
    pub channel: Arc<Mutex<HashMap<String, broadcast::Sender<Message>>>>,
    pub debug_config: Arc<DebugConfig>,
}

impl AppState {
    pub fn new() -> Self {
        AppState {
            rooms: Arc::new(Mutex::new(HashMap::new())),
            games: Arc::new(Mutex::new(HashMap::new())),
            channel: Arc::new(Mutex::new(HashMap::new())),
            debug_config: Arc::new(DebugConfig::from_env()),
        }
    }

    pub async fn get_or_create_room_channel(&self, room_code: &str) -> broadcast::Sender<Message> {
        let mut channels = self.channel.lock().await;
        if let Some(channel) = channels.get(room_code) {
            channel.clone()
        } else {
            let (tx, _) = broadcast::channel(1000);
            channels.insert(room_code.to_string(), tx.clone());
            tx
        }
    }

    pub async fn remove_room_channel(&self, room_code: &str) {
        self.channel.lock().await.remove(room_code);
    }

    /// 状態を変更した操作の後に呼び、ルームの全購読者へスナップショットを配る
    pub async fn broadcast_room_update(&self, room: &Room) {
        let notification = serde_json::json!({
            "message_type": "room_update",
            "room_code": room.code.clone(),
            "room": room,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });
        self.send_to_room(&room.code, notification).await;
    }

    pub async fn broadcast_game_update(&self, game: &Game) {
        let notification = serde_json::json!({
            "message_type": "game_update",
            "room_code": game.room_code.clone(),
            "state": game,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });
        self.send_to_room(&game.room_code, notification).await;
    }

    pub async fn broadcast_room_deleted(&self, room_code: &str) {
        let notification = serde_json::json!({
            "message_type": "room_deleted",
            "room_code": room_code,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });
        self.send_to_room(room_code, notification).await;
    }

    async fn send_to_room(&self, room_code: &str, notification: serde_json::Value) {
        let tx = self.get_or_create_room_channel(room_code).await;
        if let Ok(message_text) = serde_json::to_string(&notification) {
            // 購読者がいないときの送信エラーは無視してよい
            if tx.send(Message::Text(message_text)).is_err() {
                log::debug!("ルーム {} に購読者がいません", room_code);
            }
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
