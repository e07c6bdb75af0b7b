use crate::{
    models::{
        game::{Game, GameError, RoleInfo},
        room::RoomStatus,
        setup::GameSetup,
    },
    state::AppState,
};

/// ホストがゲームを開始する。ルームの全員から `player_count` 人を選抜し、
/// シード付きの役職割り当てを行ったうえで全員に状態を配信する。
pub async fn start_game(
    state: AppState,
    code: &str,
    caller_id: &str,
    player_count: usize,
) -> Result<Game, GameError> {
    let game = {
        let mut rooms = state.rooms.lock().await;
        let room = rooms.get_mut(code).ok_or(GameError::RoomNotFound)?;

        let caller = room
            .players
            .iter()
            .find(|p| p.id == caller_id)
            .ok_or(GameError::PlayerNotFound)?;
        if caller.name != room.host {
            return Err(GameError::NotHost);
        }
        if room.players.len() < player_count {
            return Err(GameError::InsufficientPlayers {
                required: player_count,
                actual: room.players.len(),
            });
        }

        let setup = GameSetup::for_player_count(player_count)?;
        let seed = state.debug_config.fixed_seed.unwrap_or_else(rand::random);
        let game = Game::new(code.to_string(), room.players.clone(), setup, seed);

        room.status = RoomStatus::InProgress;
        state.games.lock().await.insert(code.to_string(), game.clone());
        game
    };

    log::info!("ルーム {} でゲームを開始しました (seed={})", code, game.seed);
    state.broadcast_game_update(&game).await;
    Ok(game)
}

pub async fn get_game_state(state: AppState, code: &str) -> Result<Game, GameError> {
    let games = state.games.lock().await;
    games.get(code).cloned().ok_or(GameError::GameNotFound)
}

pub async fn toggle_team_member(
    state: AppState,
    code: &str,
    caller_id: &str,
    target: &str,
) -> Result<Game, GameError> {
    let game = {
        let mut games = state.games.lock().await;
        let game = games.get_mut(code).ok_or(GameError::GameNotFound)?;
        game.toggle_team_member(caller_id, target);
        game.clone()
    };

    state.broadcast_game_update(&game).await;
    Ok(game)
}

pub async fn confirm_team(
    state: AppState,
    code: &str,
    caller_id: &str,
) -> Result<Game, GameError> {
    let game = {
        let mut games = state.games.lock().await;
        let game = games.get_mut(code).ok_or(GameError::GameNotFound)?;
        game.confirm_team(caller_id)?;
        game.clone()
    };

    state.broadcast_game_update(&game).await;
    Ok(game)
}

pub async fn vote_team(
    state: AppState,
    code: &str,
    caller_id: &str,
    approve: bool,
) -> Result<Game, GameError> {
    let game = {
        let mut games = state.games.lock().await;
        let game = games.get_mut(code).ok_or(GameError::GameNotFound)?;
        game.vote_team(caller_id, approve)?;
        game.clone()
    };

    state.broadcast_game_update(&game).await;
    Ok(game)
}

pub async fn vote_mission(
    state: AppState,
    code: &str,
    caller_id: &str,
    success: bool,
) -> Result<Game, GameError> {
    let game = {
        let mut games = state.games.lock().await;
        let game = games.get_mut(code).ok_or(GameError::GameNotFound)?;
        game.vote_mission(caller_id, success)?;
        game.clone()
    };

    state.broadcast_game_update(&game).await;
    Ok(game)
}

pub async fn assassinate(
    state: AppState,
    code: &str,
    caller_id: &str,
    target: &str,
) -> Result<Game, GameError> {
    let game = {
        let mut games = state.games.lock().await;
        let game = games.get_mut(code).ok_or(GameError::GameNotFound)?;
        game.assassinate(caller_id, target)?;
        game.clone()
    };

    state.broadcast_game_update(&game).await;
    Ok(game)
}

/// 本人にのみ役職を返す。ブロードキャストはしない。
pub async fn view_role(
    state: AppState,
    code: &str,
    caller_id: &str,
) -> Result<RoleInfo, GameError> {
    let mut games = state.games.lock().await;
    let game = games.get_mut(code).ok_or(GameError::GameNotFound)?;
    game.view_role(caller_id)
}
