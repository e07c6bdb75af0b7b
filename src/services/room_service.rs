use std::collections::HashMap;

use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::{
    models::{
        player::Player,
        room::{generate_room_code, Room, RoomStatus},
    },
    state::AppState,
};

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum RoomServiceError {
    #[error("ルームが見つかりません")]
    RoomNotFound,
    #[error("ゲームが進行中のため参加できません")]
    GameInProgress,
    #[error("その名前は既に使われています")]
    NameTaken,
    #[error("ホストのみが実行できます")]
    NotHost,
    #[error("プレイヤーが見つかりません")]
    PlayerNotFound,
}

pub async fn create_room(state: AppState, host_name: String) -> (String, Player) {
    let mut rooms = state.rooms.lock().await;

    let mut code = generate_room_code();
    while rooms.contains_key(&code) {
        code = generate_room_code();
    }

    let host = Player::new(Uuid::new_v4().to_string(), host_name.clone());
    let mut room = Room::new(code.clone(), host_name);
    room.players.push(host.clone());
    rooms.insert(code.clone(), room);

    (code, host)
}

pub async fn join_room(
    state: AppState,
    code: &str,
    name: String,
) -> Result<Player, RoomServiceError> {
    let (room, player) = {
        let mut rooms = state.rooms.lock().await;
        let room = rooms.get_mut(code).ok_or(RoomServiceError::RoomNotFound)?;

        if room.status != RoomStatus::Lobby {
            return Err(RoomServiceError::GameInProgress);
        }
        // 表示名はルーム内で一意
        if room.players.iter().any(|p| p.name == name) {
            return Err(RoomServiceError::NameTaken);
        }

        let player = Player::new(Uuid::new_v4().to_string(), name);
        room.players.push(player.clone());
        (room.clone(), player)
    };

    state.broadcast_room_update(&room).await;
    Ok(player)
}

pub async fn leave_room(
    state: AppState,
    code: &str,
    player_id: &str,
) -> Result<(), RoomServiceError> {
    let room = {
        let mut rooms = state.rooms.lock().await;
        let room = rooms.get_mut(code).ok_or(RoomServiceError::RoomNotFound)?;

        let index = room
            .players
            .iter()
            .position(|p| p.id == player_id)
            .ok_or(RoomServiceError::PlayerNotFound)?;
        room.players.remove(index);
        room.clone()
    };

    state.broadcast_room_update(&room).await;
    Ok(())
}

/// WebSocketの接続・切断に合わせてプレイヤーのオンライン状態を更新する
pub async fn set_online(
    state: AppState,
    code: &str,
    player_id: &str,
    online: bool,
) -> Result<(), RoomServiceError> {
    let room = {
        let mut rooms = state.rooms.lock().await;
        let room = rooms.get_mut(code).ok_or(RoomServiceError::RoomNotFound)?;
        let player = room
            .players
            .iter_mut()
            .find(|p| p.id == player_id)
            .ok_or(RoomServiceError::PlayerNotFound)?;
        player.online = online;
        room.clone()
    };

    state.broadcast_room_update(&room).await;
    Ok(())
}

pub async fn get_rooms(state: &AppState) -> HashMap<String, Room> {
    state.rooms.lock().await.clone()
}

pub async fn get_room_info(state: &AppState, code: &str) -> Result<Room, RoomServiceError> {
    let rooms = state.rooms.lock().await;
    rooms.get(code).cloned().ok_or(RoomServiceError::RoomNotFound)
}

/// ゲーム状態を破棄してロビーに戻す（ホストのみ）
pub async fn return_to_lobby(
    state: AppState,
    code: &str,
    caller_id: &str,
) -> Result<Room, RoomServiceError> {
    let room = {
        let mut rooms = state.rooms.lock().await;
        let mut games = state.games.lock().await;
        let room = rooms.get_mut(code).ok_or(RoomServiceError::RoomNotFound)?;

        let caller = room
            .players
            .iter()
            .find(|p| p.id == caller_id)
            .ok_or(RoomServiceError::PlayerNotFound)?;
        if caller.name != room.host {
            return Err(RoomServiceError::NotHost);
        }

        games.remove(code);
        room.status = RoomStatus::Lobby;
        for player in room.players.iter_mut() {
            player.role = None;
            player.viewed = false;
        }
        room.clone()
    };

    state.broadcast_room_update(&room).await;
    Ok(room)
}

pub async fn delete_room(
    state: AppState,
    code: &str,
    caller_id: &str,
) -> Result<(), RoomServiceError> {
    {
        let mut rooms = state.rooms.lock().await;
        let room = rooms.get(code).ok_or(RoomServiceError::RoomNotFound)?;

        let caller = room
            .players
            .iter()
            .find(|p| p.id == caller_id)
            .ok_or(RoomServiceError::PlayerNotFound)?;
        if caller.name != room.host {
            return Err(RoomServiceError::NotHost);
        }

        rooms.remove(code);
        state.games.lock().await.remove(code);
    }

    state.broadcast_room_deleted(code).await;
    state.remove_room_channel(code).await;
    Ok(())
}

/// ロビーのまま1時間以上経過し、全員オフラインのルームを削除する。
/// 削除した件数を返す。
pub async fn cleanup_idle_rooms(state: AppState) -> usize {
    let expired: Vec<String> = {
        let rooms = state.rooms.lock().await;
        let now = Utc::now();
        rooms
            .values()
            .filter(|room| {
                room.status == RoomStatus::Lobby
                    && now - room.created_at > Duration::hours(1)
                    && room.players.iter().all(|p| !p.online)
            })
            .map(|room| room.code.clone())
            .collect()
    };

    for code in &expired {
        state.rooms.lock().await.remove(code);
        state.games.lock().await.remove(code);
        state.remove_room_channel(code).await;
        log::info!("放置ルーム {} を削除しました", code);
    }
    expired.len()
}
