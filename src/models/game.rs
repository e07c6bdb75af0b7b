use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::player::Player;
use super::role::{Alignment, Role};
use super::setup::GameSetup;

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("ホストのみがゲームを開始できます")]
    NotHost,
    #[error("プレイヤーが足りません（{required}人必要、現在{actual}人）")]
    InsufficientPlayers { required: usize, actual: usize },
    #[error("サポートされていないプレイヤー数です: {0}")]
    UnsupportedPlayerCount(usize),
    #[error("このフェーズでは実行できない操作です")]
    WrongPhase,
    #[error("現在のリーダーのみが実行できます")]
    NotCurrentLeader,
    #[error("任務に参加していないプレイヤーは投票できません")]
    NotTeamMember,
    #[error("暗殺者のみが実行できます")]
    NotAssassin,
    #[error("プレイヤーが見つかりません")]
    PlayerNotFound,
    #[error("ゲームが見つかりません")]
    GameNotFound,
    #[error("ルームが見つかりません")]
    RoomNotFound,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum GamePhase {
    TeamBuilding,  // リーダーがチームを編成中
    TeamVoting,    // 全員がチームの承認を投票
    Mission,       // チームメンバーが任務を遂行
    Assassination, // 暗殺者がマーリンを狙う
    GameOver,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum GameResult {
    InProgress,
    GoodWin,
    EvilWin,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Mission {
    pub round: usize,
    pub team_size: usize,
    pub fails_required: usize,
    pub fails: usize,
    pub success: bool,
}

/// 自分の役職確認への応答。本人にのみ返し、ブロードキャストはしない。
#[derive(Debug, Serialize, Deserialize)]
pub struct RoleInfo {
    pub role: Role,
    pub players: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Game {
    pub room_code: String,
    pub players: Vec<Player>,
    pub setup: GameSetup,
    pub phase: GamePhase,
    pub result: GameResult,
    pub current_round: usize,
    pub current_leader: usize,
    pub leader_order: Vec<String>,
    pub team: Vec<String>,
    pub votes: HashMap<String, bool>,         // プレイヤー名 -> 承認
    pub mission_votes: HashMap<String, bool>, // チームメンバー名 -> 成功
    pub team_rejections: u32,
    pub missions: Vec<Mission>,
    pub assassin_target: Option<String>,
    pub log: Vec<String>,
    pub seed: u64,
}

impl Game {
    /// ルームの全員をシャッフルして先頭 `setup.player_count` 人を選び、
    /// 役職の多重集合をシード付きでシャッフルして一度だけ割り当てる。
    pub fn new(room_code: String, roster: Vec<Player>, setup: GameSetup, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        let mut players = roster;
        players.shuffle(&mut rng);
        players.truncate(setup.player_count);

        let mut roles = setup.roles.clone();
        roles.shuffle(&mut rng);
        for (player, role) in players.iter_mut().zip(roles) {
            player.role = Some(role);
            player.viewed = false;
        }

        let leader_order = players.iter().map(|p| p.name.clone()).collect();

        Game {
            room_code,
            players,
            setup,
            phase: GamePhase::TeamBuilding,
            result: GameResult::InProgress,
            current_round: 1,
            current_leader: 0,
            leader_order,
            team: Vec::new(),
            votes: HashMap::new(),
            mission_votes: HashMap::new(),
            team_rejections: 0,
            missions: Vec::new(),
            assassin_target: None,
            log: vec!["ゲーム開始！".to_string()],
            seed,
        }
    }

    pub fn current_leader_name(&self) -> &str {
        &self.leader_order[self.current_leader]
    }

    pub fn team_size(&self) -> usize {
        self.setup.team_size(self.current_round)
    }

    fn player(&self, player_id: &str) -> Result<&Player, GameError> {
        self.players
            .iter()
            .find(|p| p.id == player_id)
            .ok_or(GameError::PlayerNotFound)
    }

    fn is_current_leader(&self, player_id: &str) -> bool {
        self.player(player_id)
            .map(|p| p.name == self.current_leader_name())
            .unwrap_or(false)
    }

    /// チームメンバーの追加・削除。チーム編成フェーズのリーダー以外からの
    /// 呼び出しは黙って無視する（状態は一切変えない）。
    pub fn toggle_team_member(&mut self, caller_id: &str, target: &str) {
        if self.phase != GamePhase::TeamBuilding || !self.is_current_leader(caller_id) {
            return;
        }
        if !self.players.iter().any(|p| p.name == target) {
            return;
        }

        if let Some(index) = self.team.iter().position(|name| name == target) {
            self.team.remove(index);
        } else if self.team.len() < self.team_size() {
            self.team.push(target.to_string());
        }
    }

    pub fn confirm_team(&mut self, caller_id: &str) -> Result<(), GameError> {
        if self.phase != GamePhase::TeamBuilding {
            return Err(GameError::WrongPhase);
        }
        self.player(caller_id)?;
        if !self.is_current_leader(caller_id) {
            return Err(GameError::NotCurrentLeader);
        }

        self.log.push(format!(
            "第{}ラウンド：リーダー{}がチームを提案：{}",
            self.current_round,
            self.current_leader_name(),
            self.team.join("、")
        ));
        self.phase = GamePhase::TeamVoting;
        self.votes.clear();
        Ok(())
    }

    /// チーム承認投票。再投票は上書き。全員の票が揃ったら集計する。
    pub fn vote_team(&mut self, caller_id: &str, approve: bool) -> Result<(), GameError> {
        if self.phase != GamePhase::TeamVoting {
            return Err(GameError::WrongPhase);
        }
        let name = self.player(caller_id)?.name.clone();
        self.votes.insert(name, approve);

        if self.votes.len() == self.players.len() {
            self.finish_team_vote();
        }
        Ok(())
    }

    fn finish_team_vote(&mut self) {
        let approve_count = self.votes.values().filter(|v| **v).count();
        // 過半数（ちょうど半数は否決）
        let approved = approve_count * 2 > self.players.len();

        self.log.push(format!(
            "投票結果：賛成{} 反対{} - {}",
            approve_count,
            self.players.len() - approve_count,
            if approved { "可決" } else { "否決" }
        ));

        if approved {
            self.phase = GamePhase::Mission;
            self.mission_votes.clear();
            self.team_rejections = 0;
        } else {
            self.team_rejections += 1;
            if self.team_rejections >= 5 {
                self.phase = GamePhase::GameOver;
                self.result = GameResult::EvilWin;
                self.log
                    .push("5回連続でチーム提案が否決されたため、邪悪陣営の勝利！".to_string());
            } else {
                self.phase = GamePhase::TeamBuilding;
                self.current_leader = (self.current_leader + 1) % self.players.len();
                self.team.clear();
            }
        }
    }

    /// 任務の成否投票。チームメンバー以外の票は受け付けない。
    pub fn vote_mission(&mut self, caller_id: &str, success: bool) -> Result<(), GameError> {
        if self.phase != GamePhase::Mission {
            return Err(GameError::WrongPhase);
        }
        let name = self.player(caller_id)?.name.clone();
        if !self.team.contains(&name) {
            return Err(GameError::NotTeamMember);
        }
        self.mission_votes.insert(name, success);

        if self.mission_votes.len() == self.team.len() {
            self.resolve_mission();
        }
        Ok(())
    }

    fn resolve_mission(&mut self) {
        let fails = self.mission_votes.values().filter(|v| !**v).count();
        let fails_required = self.setup.fails_required(self.current_round);
        let success = fails < fails_required;

        self.missions.push(Mission {
            round: self.current_round,
            team_size: self.team_size(),
            fails_required,
            fails,
            success,
        });
        // 失敗票数のみを記録する。誰が失敗票を投じたかは公開しない。
        self.log.push(format!(
            "第{}ラウンドの任務は{}（失敗票{}票）",
            self.current_round,
            if success { "成功" } else { "失敗" },
            fails
        ));

        let good_wins = self.missions.iter().filter(|m| m.success).count();
        let evil_wins = self.missions.iter().filter(|m| !m.success).count();

        if good_wins >= 3 {
            self.phase = GamePhase::Assassination;
            self.log
                .push("正義陣営が3つの任務を達成！暗殺者はマーリンを狙う…".to_string());
        } else if evil_wins >= 3 {
            self.phase = GamePhase::GameOver;
            self.result = GameResult::EvilWin;
            self.log
                .push("邪悪陣営が3つの任務を妨害したため、邪悪陣営の勝利！".to_string());
        } else {
            self.current_round += 1;
            self.current_leader = (self.current_leader + 1) % self.players.len();
            self.phase = GamePhase::TeamBuilding;
            self.team.clear();
        }
    }

    /// 暗殺フェーズで唯一受け付ける操作。対象がマーリンなら邪悪陣営の勝利。
    pub fn assassinate(&mut self, caller_id: &str, target: &str) -> Result<(), GameError> {
        if self.phase != GamePhase::Assassination {
            return Err(GameError::WrongPhase);
        }
        if self.player(caller_id)?.role != Some(Role::Assassin) {
            return Err(GameError::NotAssassin);
        }
        let target_role = self
            .players
            .iter()
            .find(|p| p.name == target)
            .and_then(|p| p.role)
            .ok_or(GameError::PlayerNotFound)?;

        self.assassin_target = Some(target.to_string());
        self.phase = GamePhase::GameOver;
        self.log.push(format!("暗殺者が{}を刺した！", target));

        if target_role == Role::Merlin {
            self.result = GameResult::EvilWin;
            self.log
                .push(format!("{}はマーリンだった！邪悪陣営の勝利！", target));
        } else {
            self.result = GameResult::GoodWin;
            self.log
                .push(format!("{}はマーリンではなかった！正義陣営の勝利！", target));
        }
        Ok(())
    }

    /// 自分の役職を確認する。確認済みフラグを立て、役職と参加者名の一覧を返す。
    pub fn view_role(&mut self, caller_id: &str) -> Result<RoleInfo, GameError> {
        let names = self.players.iter().map(|p| p.name.clone()).collect();
        let player = self
            .players
            .iter_mut()
            .find(|p| p.id == caller_id)
            .ok_or(GameError::PlayerNotFound)?;
        player.viewed = true;
        let role = player.role.ok_or(GameError::PlayerNotFound)?;
        Ok(RoleInfo {
            role,
            players: names,
        })
    }

    pub fn winner(&self) -> Option<Alignment> {
        match self.result {
            GameResult::InProgress => None,
            GameResult::GoodWin => Some(Alignment::Good),
            GameResult::EvilWin => Some(Alignment::Evil),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::setup::GameSetup;

    fn test_roster(count: usize) -> Vec<Player> {
        (1..=count)
            .map(|i| Player::new(format!("id{}", i), format!("Player{}", i)))
            .collect()
    }

    fn test_game(count: usize) -> Game {
        let setup = GameSetup::for_player_count(count).unwrap();
        Game::new("ROOM01".to_string(), test_roster(count), setup, 42)
    }

    fn id_of(game: &Game, name: &str) -> String {
        game.players
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.id.clone())
            .unwrap()
    }

    fn leader_id(game: &Game) -> String {
        id_of(game, &game.current_leader_name().to_string())
    }

    /// リーダーに先頭から必要人数のチームを提案させ、確定する
    fn propose_full_team(game: &mut Game) -> Vec<String> {
        let leader = leader_id(game);
        let members: Vec<String> = game
            .leader_order
            .iter()
            .take(game.team_size())
            .cloned()
            .collect();
        for name in &members {
            game.toggle_team_member(&leader, name);
        }
        game.confirm_team(&leader).unwrap();
        members
    }

    fn approve_all(game: &mut Game) {
        let ids: Vec<String> = game.players.iter().map(|p| p.id.clone()).collect();
        for id in ids {
            game.vote_team(&id, true).unwrap();
        }
    }

    /// 1ラウンドを最後まで回す。`fails` 人のメンバーが失敗票を投じる。
    fn play_round(game: &mut Game, fails: usize) {
        let members = propose_full_team(game);
        approve_all(game);
        for (i, name) in members.iter().enumerate() {
            let id = id_of(game, name);
            game.vote_mission(&id, i >= fails).unwrap();
        }
    }

    #[test]
    fn test_seeded_assignment_is_deterministic() {
        let a = test_game(5);
        let b = test_game(5);
        assert_eq!(a.leader_order, b.leader_order);
        for (pa, pb) in a.players.iter().zip(&b.players) {
            assert_eq!(pa.role, pb.role);
        }
    }

    #[test]
    fn test_each_player_gets_exactly_one_role() {
        for count in 5..=10 {
            let game = test_game(count);
            assert_eq!(game.players.len(), count);
            assert!(game.players.iter().all(|p| p.role.is_some()));
        }
    }

    #[test]
    fn test_oversized_roster_is_trimmed() {
        let setup = GameSetup::for_player_count(5).unwrap();
        let game = Game::new("ROOM01".to_string(), test_roster(8), setup, 7);
        assert_eq!(game.players.len(), 5);
        assert_eq!(game.leader_order.len(), 5);
    }

    #[test]
    fn test_team_never_exceeds_required_size() {
        let mut game = test_game(5);
        let leader = leader_id(&game);
        for p in ["Player1", "Player2", "Player3", "Player4", "Player5"] {
            game.toggle_team_member(&leader, p);
            assert!(game.team.len() <= game.team_size());
        }
        assert_eq!(game.team.len(), 2); // 5人ゲームの第1ラウンドは2人
    }

    #[test]
    fn test_toggle_removes_existing_member() {
        let mut game = test_game(5);
        let leader = leader_id(&game);
        game.toggle_team_member(&leader, "Player1");
        game.toggle_team_member(&leader, "Player1");
        assert!(game.team.is_empty());
    }

    #[test]
    fn test_toggle_by_non_leader_never_mutates() {
        let mut game = test_game(5);
        let outsider = game
            .players
            .iter()
            .find(|p| p.name != game.current_leader_name())
            .map(|p| p.id.clone())
            .unwrap();
        game.toggle_team_member(&outsider, "Player1");
        assert!(game.team.is_empty());
    }

    #[test]
    fn test_toggle_unknown_name_is_ignored() {
        let mut game = test_game(5);
        let leader = leader_id(&game);
        game.toggle_team_member(&leader, "誰でもない");
        assert!(game.team.is_empty());
    }

    #[test]
    fn test_toggle_outside_team_building_is_ignored() {
        let mut game = test_game(5);
        propose_full_team(&mut game);
        let leader = leader_id(&game);
        let before = game.team.clone();
        game.toggle_team_member(&leader, "Player3");
        assert_eq!(game.team, before);
    }

    #[test]
    fn test_confirm_team_requires_leader() {
        let mut game = test_game(5);
        let outsider = game
            .players
            .iter()
            .find(|p| p.name != game.current_leader_name())
            .map(|p| p.id.clone())
            .unwrap();
        assert_eq!(game.confirm_team(&outsider), Err(GameError::NotCurrentLeader));
        assert_eq!(game.phase, GamePhase::TeamBuilding);
    }

    #[test]
    fn test_strict_majority_required() {
        // 6人ゲームで賛成3反対3は否決
        let mut game = test_game(6);
        propose_full_team(&mut game);
        let ids: Vec<String> = game.players.iter().map(|p| p.id.clone()).collect();
        for (i, id) in ids.iter().enumerate() {
            game.vote_team(id, i < 3).unwrap();
        }
        assert_eq!(game.phase, GamePhase::TeamBuilding);
        assert_eq!(game.team_rejections, 1);
        assert_eq!(game.current_leader, 1);
        assert!(game.team.is_empty());
    }

    #[test]
    fn test_revote_overwrites() {
        let mut game = test_game(5);
        propose_full_team(&mut game);
        let first = game.players[0].id.clone();
        game.vote_team(&first, false).unwrap();
        game.vote_team(&first, true).unwrap();
        assert_eq!(game.votes.len(), 1);
        assert_eq!(game.votes.values().filter(|v| **v).count(), 1);
    }

    #[test]
    fn test_five_rejections_end_the_game() {
        let mut game = test_game(5);
        for rejection in 1..=5 {
            propose_full_team(&mut game);
            let ids: Vec<String> = game.players.iter().map(|p| p.id.clone()).collect();
            for id in &ids {
                game.vote_team(id, false).unwrap();
            }
            if rejection < 5 {
                assert_eq!(game.phase, GamePhase::TeamBuilding);
                assert_eq!(game.team_rejections, rejection);
            }
        }
        assert_eq!(game.phase, GamePhase::GameOver);
        assert_eq!(game.result, GameResult::EvilWin);
        assert!(game.missions.is_empty());
    }

    #[test]
    fn test_approval_resets_rejection_counter() {
        let mut game = test_game(5);
        // まず1回否決
        propose_full_team(&mut game);
        let ids: Vec<String> = game.players.iter().map(|p| p.id.clone()).collect();
        for id in &ids {
            game.vote_team(id, false).unwrap();
        }
        assert_eq!(game.team_rejections, 1);
        // 次は可決
        propose_full_team(&mut game);
        approve_all(&mut game);
        assert_eq!(game.phase, GamePhase::Mission);
        assert_eq!(game.team_rejections, 0);
    }

    #[test]
    fn test_non_member_mission_vote_rejected() {
        let mut game = test_game(5);
        let members = propose_full_team(&mut game);
        approve_all(&mut game);
        let outsider = game
            .players
            .iter()
            .find(|p| !members.contains(&p.name))
            .map(|p| p.id.clone())
            .unwrap();
        assert_eq!(
            game.vote_mission(&outsider, true),
            Err(GameError::NotTeamMember)
        );
        assert!(game.mission_votes.is_empty());
    }

    #[test]
    fn test_successful_mission_advances_round() {
        let mut game = test_game(5);
        play_round(&mut game, 0);
        assert_eq!(game.current_round, 2);
        assert_eq!(game.current_leader, 1);
        assert_eq!(game.phase, GamePhase::TeamBuilding);
        assert!(game.team.is_empty());
        let mission = &game.missions[0];
        assert!(mission.success);
        assert_eq!(mission.fails, 0);
        assert_eq!(mission.team_size, 2);
    }

    #[test]
    fn test_single_fail_fails_the_mission() {
        let mut game = test_game(5);
        play_round(&mut game, 1);
        assert!(!game.missions[0].success);
        assert_eq!(game.missions[0].fails, 1);
    }

    #[test]
    fn test_round4_with_seven_players_requires_two_fails() {
        let mut game = test_game(7);
        // 第1〜3ラウンド：成功2・失敗1で第4ラウンドへ
        play_round(&mut game, 0);
        play_round(&mut game, 1);
        play_round(&mut game, 0);
        assert_eq!(game.current_round, 4);

        play_round(&mut game, 1);
        let mission = game.missions.last().unwrap();
        assert_eq!(mission.fails_required, 2);
        assert!(mission.success, "第4ラウンドは失敗票1票では失敗しない");
    }

    #[test]
    fn test_three_successes_trigger_assassination() {
        let mut game = test_game(5);
        play_round(&mut game, 0);
        play_round(&mut game, 0);
        play_round(&mut game, 0);
        assert_eq!(game.phase, GamePhase::Assassination);
        assert_eq!(game.result, GameResult::InProgress);
    }

    #[test]
    fn test_three_fails_end_the_game() {
        let mut game = test_game(5);
        play_round(&mut game, 1);
        play_round(&mut game, 1);
        play_round(&mut game, 1);
        assert_eq!(game.phase, GamePhase::GameOver);
        assert_eq!(game.result, GameResult::EvilWin);
    }

    #[test]
    fn test_assassination_of_merlin_wins_for_evil() {
        let mut game = test_game(5);
        play_round(&mut game, 0);
        play_round(&mut game, 0);
        play_round(&mut game, 0);

        let assassin = game
            .players
            .iter()
            .find(|p| p.role == Some(Role::Assassin))
            .map(|p| p.id.clone())
            .unwrap();
        let merlin = game
            .players
            .iter()
            .find(|p| p.role == Some(Role::Merlin))
            .map(|p| p.name.clone())
            .unwrap();

        game.assassinate(&assassin, &merlin).unwrap();
        assert_eq!(game.phase, GamePhase::GameOver);
        assert_eq!(game.result, GameResult::EvilWin);
        assert_eq!(game.assassin_target.as_deref(), Some(merlin.as_str()));
    }

    #[test]
    fn test_assassination_of_other_wins_for_good() {
        let mut game = test_game(5);
        play_round(&mut game, 0);
        play_round(&mut game, 0);
        play_round(&mut game, 0);

        let assassin = game
            .players
            .iter()
            .find(|p| p.role == Some(Role::Assassin))
            .map(|p| p.id.clone())
            .unwrap();
        let not_merlin = game
            .players
            .iter()
            .find(|p| p.role == Some(Role::Percival))
            .map(|p| p.name.clone())
            .unwrap();

        game.assassinate(&assassin, &not_merlin).unwrap();
        assert_eq!(game.result, GameResult::GoodWin);
        assert_eq!(game.winner(), Some(Alignment::Good));
    }

    #[test]
    fn test_only_assassin_may_assassinate() {
        let mut game = test_game(5);
        play_round(&mut game, 0);
        play_round(&mut game, 0);
        play_round(&mut game, 0);

        let merlin = game
            .players
            .iter()
            .find(|p| p.role == Some(Role::Merlin))
            .map(|p| (p.id.clone(), p.name.clone()))
            .unwrap();
        assert_eq!(
            game.assassinate(&merlin.0, &merlin.1),
            Err(GameError::NotAssassin)
        );
        assert_eq!(game.phase, GamePhase::Assassination);
    }

    #[test]
    fn test_assassination_phase_gates_other_actions() {
        let mut game = test_game(5);
        play_round(&mut game, 0);
        play_round(&mut game, 0);
        play_round(&mut game, 0);
        assert_eq!(game.phase, GamePhase::Assassination);

        let id = game.players[0].id.clone();
        assert_eq!(game.vote_team(&id, true), Err(GameError::WrongPhase));
        assert_eq!(game.vote_mission(&id, true), Err(GameError::WrongPhase));
        assert_eq!(game.confirm_team(&id), Err(GameError::WrongPhase));
        let before = game.team.clone();
        game.toggle_team_member(&id, "Player1");
        assert_eq!(game.team, before);
    }

    #[test]
    fn test_view_role_marks_viewed_and_lists_roster() {
        let mut game = test_game(5);
        let id = game.players[2].id.clone();
        let info = game.view_role(&id).unwrap();
        assert_eq!(info.players.len(), 5);
        assert_eq!(Some(info.role), game.players[2].role);
        assert!(game.players[2].viewed);
    }

    #[test]
    fn test_unknown_caller_is_rejected() {
        let mut game = test_game(5);
        propose_full_team(&mut game);
        assert_eq!(
            game.vote_team("spectator", true),
            Err(GameError::PlayerNotFound)
        );
        assert!(game.votes.is_empty());
    }
}
