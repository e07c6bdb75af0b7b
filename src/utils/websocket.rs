use axum::{
    extract::{
        ws::{Message, WebSocket},
        Path, State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures::{sink::SinkExt, stream::StreamExt};
use tracing::info;

use crate::services::room_service;
use crate::state::AppState;

pub async fn handler(
    State(state): State<AppState>,
    Path((room_code, player_id)): Path<(String, String)>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, room_code, player_id))
}

/// ルームごとのブロードキャストチャンネルを購読し、状態スナップショットを
/// クライアントへ転送する。接続している間はプレイヤーをオンライン扱いにする。
pub async fn handle_socket(ws: WebSocket, state: AppState, room_code: String, player_id: String) {
    info!(
        "New WebSocket connection for room {} (player {})",
        room_code, player_id
    );
    let tx = state.get_or_create_room_channel(&room_code).await;
    let mut rx = tx.subscribe();

    if let Err(e) = room_service::set_online(state.clone(), &room_code, &player_id, true).await {
        info!("Failed to mark player online: {}", e);
    }

    let (mut sender, mut receiver) = ws.split();

    let room_code_for_send = room_code.clone();
    let send_task = tokio::spawn(async move {
        while let Ok(msg) = rx.recv().await {
            if let Message::Text(text) = &msg {
                // 別ルーム宛のメッセージはスキップ
                if let Ok(value) = serde_json::from_str::<serde_json::Value>(text) {
                    if value.get("room_code").and_then(|v| v.as_str())
                        != Some(room_code_for_send.as_str())
                    {
                        continue;
                    }
                }
            }

            if let Err(e) = sender.send(msg).await {
                eprintln!("Error sending message: {}", e);
                break;
            }
        }
    });

    // クライアントからの受信は切断検知にのみ使う。
    // 状態を変える操作はすべてHTTP API経由で届く。
    while let Some(Ok(msg)) = receiver.next().await {
        if let Message::Close(_) = msg {
            break;
        }
    }

    send_task.abort();
    if let Err(e) = room_service::set_online(state, &room_code, &player_id, false).await {
        info!("Failed to mark player offline: {}", e);
    }
    info!(
        "WebSocket connection closed for room {} (player {})",
        room_code, player_id
    );
}
