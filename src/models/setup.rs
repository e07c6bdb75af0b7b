use serde::{Deserialize, Serialize};

use super::game::GameError;
use super::role::Role;

/// プレイヤー数ごとの固定構成（役職の多重集合と各ラウンドのチーム人数）。
/// 状態を持たない純粋なルックアップテーブル。
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameSetup {
    pub player_count: usize,
    pub roles: Vec<Role>,
    pub team_sizes: [usize; 5],
}

impl GameSetup {
    pub fn for_player_count(player_count: usize) -> Result<Self, GameError> {
        use Role::*;

        let (roles, team_sizes) = match player_count {
            5 => (
                vec![Merlin, Percival, LoyalServant, Morgana, Assassin],
                [2, 3, 2, 3, 3],
            ),
            6 => (
                vec![Merlin, Percival, LoyalServant, LoyalServant, Morgana, Assassin],
                [2, 3, 4, 3, 4],
            ),
            7 => (
                vec![
                    Merlin,
                    Percival,
                    LoyalServant,
                    LoyalServant,
                    Morgana,
                    Assassin,
                    Mordred,
                ],
                [2, 3, 3, 4, 4],
            ),
            8 => (
                vec![
                    Merlin,
                    Percival,
                    LoyalServant,
                    LoyalServant,
                    LoyalServant,
                    Morgana,
                    Assassin,
                    Oberon,
                ],
                [3, 4, 4, 5, 5],
            ),
            9 => (
                vec![
                    Merlin,
                    Percival,
                    LoyalServant,
                    LoyalServant,
                    LoyalServant,
                    LoyalServant,
                    Morgana,
                    Assassin,
                    Mordred,
                ],
                [3, 4, 4, 5, 5],
            ),
            10 => (
                vec![
                    Merlin,
                    Percival,
                    LoyalServant,
                    LoyalServant,
                    LoyalServant,
                    LoyalServant,
                    Morgana,
                    Assassin,
                    Mordred,
                    Oberon,
                ],
                [3, 4, 4, 5, 5],
            ),
            _ => return Err(GameError::UnsupportedPlayerCount(player_count)),
        };

        Ok(GameSetup {
            player_count,
            roles,
            team_sizes,
        })
    }

    pub fn team_size(&self, round: usize) -> usize {
        self.team_sizes[round - 1]
    }

    /// 任務を失敗させるのに必要な失敗票数。
    /// 第4ラウンドかつ7人以上のゲームのみ2票、それ以外は1票。
    pub fn fails_required(&self, round: usize) -> usize {
        if round == 4 && self.player_count >= 7 {
            2
        } else {
            1
        }
    }
}
