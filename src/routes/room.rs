use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::{
    models::player::Player,
    services::room_service::{self, RoomServiceError},
    state::AppState,
    utils::websocket,
};

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateRoomRequest {
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateRoomResponse {
    pub code: String,
    pub player: Player,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JoinRoomRequest {
    pub name: String,
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        // ルーム作成
        // curl -X POST http://localhost:8080/api/room/create -H 'Content-Type: application/json' -d '{"name":"Alice"}'
        .route("/create", post(create_room))
        // ルーム一覧取得
        // curl http://localhost:8080/api/room/rooms
        .route("/rooms", get(get_rooms))
        // 特定のルーム情報取得
        // curl http://localhost:8080/api/room/{code}
        .route("/:code", get(get_room_info))
        // ルーム参加
        // curl -X POST http://localhost:8080/api/room/{code}/join -H 'Content-Type: application/json' -d '{"name":"Bob"}'
        .route("/:code/join", post(join_room))
        // ルーム脱退
        .route("/:code/leave/:playerid", post(leave_room))
        // ロビーへ戻る（ホストのみ、ゲーム状態を破棄）
        .route("/:code/lobby/:playerid", post(return_to_lobby))
        // ルーム削除（ホストのみ）
        .route("/:code/delete/:playerid", delete(delete_room))
        // WebSocket接続（接続中はオンライン扱い）
        // websocat ws://localhost:8080/api/room/{code}/ws/{playerid}
        .route("/:code/ws/:playerid", get(websocket::handler))
        .with_state(state)
}

// エラーハンドリング
impl IntoResponse for RoomServiceError {
    fn into_response(self) -> Response {
        let status = match self {
            RoomServiceError::RoomNotFound | RoomServiceError::PlayerNotFound => {
                StatusCode::NOT_FOUND
            }
            RoomServiceError::GameInProgress | RoomServiceError::NameTaken => StatusCode::CONFLICT,
            RoomServiceError::NotHost => StatusCode::FORBIDDEN,
        };

        let body = Json(serde_json::json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

pub async fn create_room(
    State(state): State<AppState>,
    Json(req): Json<CreateRoomRequest>,
) -> impl IntoResponse {
    let (code, player) = room_service::create_room(state, req.name).await;
    (StatusCode::OK, Json(CreateRoomResponse { code, player }))
}

async fn get_rooms(State(state): State<AppState>) -> impl IntoResponse {
    let rooms = room_service::get_rooms(&state).await;
    (StatusCode::OK, Json(rooms))
}

async fn get_room_info(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, RoomServiceError> {
    let room = room_service::get_room_info(&state, &code).await?;
    Ok((StatusCode::OK, Json(room)))
}

pub async fn join_room(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(req): Json<JoinRoomRequest>,
) -> Result<impl IntoResponse, RoomServiceError> {
    let player = room_service::join_room(state, &code, req.name).await?;
    Ok((StatusCode::OK, Json(player)))
}

pub async fn leave_room(
    State(state): State<AppState>,
    Path((code, player_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, RoomServiceError> {
    room_service::leave_room(state, &code, &player_id).await?;
    Ok((StatusCode::OK, Json("ルームから退出しました")))
}

async fn return_to_lobby(
    State(state): State<AppState>,
    Path((code, player_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, RoomServiceError> {
    let room = room_service::return_to_lobby(state, &code, &player_id).await?;
    Ok((StatusCode::OK, Json(room)))
}

async fn delete_room(
    State(state): State<AppState>,
    Path((code, player_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, RoomServiceError> {
    room_service::delete_room(state, &code, &player_id).await?;
    Ok((StatusCode::OK, Json(format!("ルーム {} を削除しました", code))))
}
