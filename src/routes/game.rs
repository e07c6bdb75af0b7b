use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::models::game::GameError;
use crate::services::game_service;
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct StartGameRequest {
    pub player_id: String,
    pub player_count: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ToggleMemberAction {
    pub player_id: String,
    pub target: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfirmTeamAction {
    pub player_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TeamVoteAction {
    pub player_id: String,
    pub approve: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MissionVoteAction {
    pub player_id: String,
    pub success: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AssassinateAction {
    pub player_id: String,
    pub target: String,
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .nest(
            "/:code",
            Router::new()
                // ゲームの基本操作
                .route("/start", post(start_game))
                .route("/state", get(get_game_state))
                .route("/view-role/:playerid", post(view_role))
                // ゲームアクション
                .nest(
                    "/actions",
                    Router::new()
                        .route("/toggle-member", post(toggle_member_handler))
                        .route("/confirm-team", post(confirm_team_handler))
                        .route("/vote-team", post(vote_team_handler))
                        .route("/vote-mission", post(vote_mission_handler))
                        .route("/assassinate", post(assassinate_handler)),
                ),
        )
        .with_state(state)
}

// エラーハンドリング：違反は呼び出し元にだけ返し、共有状態には触れない
impl IntoResponse for GameError {
    fn into_response(self) -> Response {
        let status = match self {
            GameError::NotHost
            | GameError::NotCurrentLeader
            | GameError::NotTeamMember
            | GameError::NotAssassin => StatusCode::FORBIDDEN,
            GameError::InsufficientPlayers { .. } | GameError::UnsupportedPlayerCount(_) => {
                StatusCode::BAD_REQUEST
            }
            GameError::WrongPhase => StatusCode::CONFLICT,
            GameError::PlayerNotFound | GameError::GameNotFound | GameError::RoomNotFound => {
                StatusCode::NOT_FOUND
            }
        };

        let body = Json(serde_json::json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

pub async fn start_game(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(req): Json<StartGameRequest>,
) -> Result<impl IntoResponse, GameError> {
    let game = game_service::start_game(state, &code, &req.player_id, req.player_count).await?;
    Ok((StatusCode::OK, Json(game)))
}

pub async fn get_game_state(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, GameError> {
    let game = game_service::get_game_state(state, &code).await?;
    Ok((StatusCode::OK, Json(game)))
}

async fn view_role(
    State(state): State<AppState>,
    Path((code, player_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, GameError> {
    let info = game_service::view_role(state, &code, &player_id).await?;
    Ok((StatusCode::OK, Json(info)))
}

async fn toggle_member_handler(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(action): Json<ToggleMemberAction>,
) -> Result<impl IntoResponse, GameError> {
    let game =
        game_service::toggle_team_member(state, &code, &action.player_id, &action.target).await?;
    Ok((StatusCode::OK, Json(game)))
}

async fn confirm_team_handler(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(action): Json<ConfirmTeamAction>,
) -> Result<impl IntoResponse, GameError> {
    let game = game_service::confirm_team(state, &code, &action.player_id).await?;
    Ok((StatusCode::OK, Json(game)))
}

async fn vote_team_handler(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(action): Json<TeamVoteAction>,
) -> Result<impl IntoResponse, GameError> {
    let game = game_service::vote_team(state, &code, &action.player_id, action.approve).await?;
    Ok((StatusCode::OK, Json(game)))
}

async fn vote_mission_handler(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(action): Json<MissionVoteAction>,
) -> Result<impl IntoResponse, GameError> {
    let game = game_service::vote_mission(state, &code, &action.player_id, action.success).await?;
    Ok((StatusCode::OK, Json(game)))
}

async fn assassinate_handler(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(action): Json<AssassinateAction>,
) -> Result<impl IntoResponse, GameError> {
    let game = game_service::assassinate(state, &code, &action.player_id, &action.target).await?;
    Ok((StatusCode::OK, Json(game)))
}
