//! エンティティ
//!
//! `Room` はゲームの状態機械そのものです。フェーズごとに有効なフィールドだけを
//! `RoomPhase` の各バリアントに持たせ、「WAITING なのに盤面がある」
//! 「FINISHED なのに結果がない」といった不正な状態を型で表現できないようにしています。

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{
    board::{Board, CellPosition, Seat, create_empty_board},
    error::RoomError,
    value_object::{ConnectionId, Nickname, PlayerId, RoomId, Timestamp},
};

/// 1 ルームあたりの最大人数
pub const MAX_PLAYERS_PER_ROOM: usize = 2;

/// ルームの状態（ワイヤー表現用のフラットな列挙）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomStatus {
    Waiting,
    Ready,
    Playing,
    Finished,
    PlayAgainPending,
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RoomStatus::Waiting => "waiting",
            RoomStatus::Ready => "ready",
            RoomStatus::Playing => "playing",
            RoomStatus::Finished => "finished",
            RoomStatus::PlayAgainPending => "play_again_pending",
        };
        f.write_str(s)
    }
}

/// Player エンティティ
///
/// 接続 ID は再接続のたびに更新され、ルームへの参照は退出・切断時にクリアされます。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub id: PlayerId,
    pub nickname: Nickname,
    pub avatar: String,
    pub connection_id: ConnectionId,
    pub room_id: Option<RoomId>,
}

impl Player {
    /// 新しい ID を払い出して Player を作成
    pub fn new(nickname: Nickname, avatar: String, connection_id: ConnectionId) -> Self {
        Self {
            id: PlayerId::generate(),
            nickname,
            avatar,
            connection_id,
            room_id: None,
        }
    }

    pub fn as_member(&self) -> RoomMember {
        RoomMember {
            id: self.id,
            nickname: self.nickname.clone(),
            avatar: self.avatar.clone(),
        }
    }
}

/// ルームに着席しているプレイヤー（入室順 = 座席順）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomMember {
    pub id: PlayerId,
    pub nickname: Nickname,
    pub avatar: String,
}

/// 直前の着手
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LastMove {
    pub column: usize,
    pub row: usize,
    pub player_id: PlayerId,
}

/// 対局中の状態
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveGame {
    pub board: Board,
    pub current_turn: PlayerId,
    pub last_move: Option<LastMove>,
}

impl ActiveGame {
    fn fresh(current_turn: PlayerId) -> Self {
        Self {
            board: create_empty_board(),
            current_turn,
            last_move: None,
        }
    }
}

/// 対局結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameOutcome {
    Win {
        winner: PlayerId,
        winning_cells: Vec<CellPosition>,
    },
    Draw,
}

/// 終局した対局
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishedGame {
    pub board: Board,
    pub outcome: GameOutcome,
    pub last_move: Option<LastMove>,
}

/// 再戦投票への回答
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayAgainResponse {
    pub player_id: PlayerId,
    pub accepted: bool,
    pub timestamp: Timestamp,
}

/// 再戦投票
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayAgainVote {
    pub initiator: PlayerId,
    pub responses: Vec<PlayAgainResponse>,
    pub deadline: Timestamp,
}

/// ルームのフェーズ。各フェーズで有効なデータのみを保持する。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomPhase {
    Waiting,
    Ready,
    Playing(ActiveGame),
    Finished(FinishedGame),
    PlayAgainPending {
        game: FinishedGame,
        vote: PlayAgainVote,
    },
}

impl RoomPhase {
    pub fn status(&self) -> RoomStatus {
        match self {
            RoomPhase::Waiting => RoomStatus::Waiting,
            RoomPhase::Ready => RoomStatus::Ready,
            RoomPhase::Playing(_) => RoomStatus::Playing,
            RoomPhase::Finished(_) => RoomStatus::Finished,
            RoomPhase::PlayAgainPending { .. } => RoomStatus::PlayAgainPending,
        }
    }
}

/// Room エンティティ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Room {
    pub id: RoomId,
    pub host_id: PlayerId,
    pub created_at: Timestamp,
    players: Vec<RoomMember>,
    phase: RoomPhase,
}

impl Room {
    /// `host` を唯一の参加者として WAITING 状態のルームを作成
    pub fn new(id: RoomId, host: RoomMember, created_at: Timestamp) -> Self {
        Self {
            id,
            host_id: host.id,
            created_at,
            players: vec![host],
            phase: RoomPhase::Waiting,
        }
    }

    pub fn status(&self) -> RoomStatus {
        self.phase.status()
    }

    pub fn phase(&self) -> &RoomPhase {
        &self.phase
    }

    pub fn players(&self) -> &[RoomMember] {
        &self.players
    }

    pub fn is_member(&self, player_id: &PlayerId) -> bool {
        self.players.iter().any(|p| &p.id == player_id)
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= MAX_PLAYERS_PER_ROOM
    }

    /// Seat derived from join order: the first member is seat 1, anyone else seat 2.
    pub fn seat_of(&self, player_id: &PlayerId) -> Seat {
        match self.players.first() {
            Some(first) if &first.id == player_id => Seat::One,
            _ => Seat::Two,
        }
    }

    pub fn board(&self) -> Option<&Board> {
        match &self.phase {
            RoomPhase::Playing(game) => Some(&game.board),
            RoomPhase::Finished(game) | RoomPhase::PlayAgainPending { game, .. } => {
                Some(&game.board)
            }
            RoomPhase::Waiting | RoomPhase::Ready => None,
        }
    }

    pub fn current_turn(&self) -> Option<PlayerId> {
        match &self.phase {
            RoomPhase::Playing(game) => Some(game.current_turn),
            _ => None,
        }
    }

    pub fn last_move(&self) -> Option<&LastMove> {
        match &self.phase {
            RoomPhase::Playing(game) => game.last_move.as_ref(),
            RoomPhase::Finished(game) | RoomPhase::PlayAgainPending { game, .. } => {
                game.last_move.as_ref()
            }
            RoomPhase::Waiting | RoomPhase::Ready => None,
        }
    }

    pub fn outcome(&self) -> Option<&GameOutcome> {
        match &self.phase {
            RoomPhase::Finished(game) | RoomPhase::PlayAgainPending { game, .. } => {
                Some(&game.outcome)
            }
            _ => None,
        }
    }

    pub fn winner(&self) -> Option<PlayerId> {
        match self.outcome() {
            Some(GameOutcome::Win { winner, .. }) => Some(*winner),
            _ => None,
        }
    }

    pub fn winning_cells(&self) -> &[CellPosition] {
        match self.outcome() {
            Some(GameOutcome::Win { winning_cells, .. }) => winning_cells,
            _ => &[],
        }
    }

    pub fn play_again_vote(&self) -> Option<&PlayAgainVote> {
        match &self.phase {
            RoomPhase::PlayAgainPending { vote, .. } => Some(vote),
            _ => None,
        }
    }

    fn expect_status(&self, expected: RoomStatus) -> Result<(), RoomError> {
        let actual = self.status();
        if actual == expected {
            Ok(())
        } else {
            Err(RoomError::InvalidStatus { expected, actual })
        }
    }

    fn expect_two_players(&self) -> Result<(), RoomError> {
        if self.players.len() == MAX_PLAYERS_PER_ROOM {
            Ok(())
        } else {
            Err(RoomError::NotEnoughPlayers(self.players.len()))
        }
    }

    fn expect_member(&self, player_id: &PlayerId) -> Result<(), RoomError> {
        if self.is_member(player_id) {
            Ok(())
        } else {
            Err(RoomError::NotAMember(player_id.to_string()))
        }
    }

    fn pick_first_turn(&self, first_turn_index: usize) -> PlayerId {
        self.players[first_turn_index % self.players.len()].id
    }

    /// 参加者を追加（WAITING かつ満員でない場合のみ）
    pub fn add_player(&mut self, member: RoomMember) -> Result<(), RoomError> {
        if self.is_full() {
            return Err(RoomError::RoomFull);
        }
        self.expect_status(RoomStatus::Waiting)?;
        self.players.push(member);
        Ok(())
    }

    /// WAITING + 2 人 → READY
    pub fn set_ready(&mut self) -> Result<(), RoomError> {
        self.expect_status(RoomStatus::Waiting)?;
        self.expect_two_players()?;
        self.phase = RoomPhase::Ready;
        Ok(())
    }

    /// 対局開始。`first_turn_index` 番目の参加者が先手になる。
    pub fn start_game(&mut self, first_turn_index: usize) -> Result<(), RoomError> {
        self.expect_two_players()?;
        self.phase = RoomPhase::Playing(ActiveGame::fresh(self.pick_first_turn(first_turn_index)));
        Ok(())
    }

    /// 着手後の盤面で置き換える
    pub fn update_board(&mut self, board: Board, last_move: LastMove) -> Result<(), RoomError> {
        match &mut self.phase {
            RoomPhase::Playing(game) => {
                game.board = board;
                game.last_move = Some(last_move);
                Ok(())
            }
            other => Err(RoomError::InvalidStatus {
                expected: RoomStatus::Playing,
                actual: other.status(),
            }),
        }
    }

    /// 手番をもう一方の参加者に渡す
    pub fn switch_turn(&mut self) -> Result<(), RoomError> {
        self.expect_two_players()?;
        let next_index = match &self.phase {
            RoomPhase::Playing(game) => self
                .players
                .iter()
                .position(|p| p.id == game.current_turn)
                .map_or(0, |i| (i + 1) % MAX_PLAYERS_PER_ROOM),
            other => {
                return Err(RoomError::InvalidStatus {
                    expected: RoomStatus::Playing,
                    actual: other.status(),
                });
            }
        };
        let next = self.players[next_index].id;
        if let RoomPhase::Playing(game) = &mut self.phase {
            game.current_turn = next;
        }
        Ok(())
    }

    /// PLAYING → FINISHED
    pub fn end_game(&mut self, outcome: GameOutcome) -> Result<(), RoomError> {
        let RoomPhase::Playing(game) = &self.phase else {
            return Err(RoomError::InvalidStatus {
                expected: RoomStatus::Playing,
                actual: self.status(),
            });
        };
        self.phase = RoomPhase::Finished(FinishedGame {
            board: game.board,
            outcome,
            last_move: game.last_move,
        });
        Ok(())
    }

    /// 参加者を削除する。削除した場合は true。
    ///
    /// 2 人から 1 人になった時点でゲーム中（WAITING 以外）だった場合、
    /// ルームは WAITING に戻りゲーム関連の状態はすべて破棄される。
    pub fn remove_player(&mut self, player_id: &PlayerId) -> bool {
        let before = self.players.len();
        self.players.retain(|p| &p.id != player_id);
        let removed = self.players.len() != before;

        if removed && before > 1 && self.players.len() == 1 && self.status() != RoomStatus::Waiting
        {
            tracing::info!(
                "Room {} status changed from {} to {}",
                self.id,
                self.status(),
                RoomStatus::Waiting
            );
            self.phase = RoomPhase::Waiting;
        }

        removed
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// FINISHED → PLAY_AGAIN_PENDING。発起人は承諾済みとして記録される。
    pub fn initiate_play_again(
        &mut self,
        initiator: PlayerId,
        now: Timestamp,
        deadline: Timestamp,
    ) -> Result<(), RoomError> {
        self.expect_member(&initiator)?;
        let RoomPhase::Finished(game) = &self.phase else {
            return Err(RoomError::InvalidStatus {
                expected: RoomStatus::Finished,
                actual: self.status(),
            });
        };
        self.phase = RoomPhase::PlayAgainPending {
            game: game.clone(),
            vote: PlayAgainVote {
                initiator,
                responses: vec![PlayAgainResponse {
                    player_id: initiator,
                    accepted: true,
                    timestamp: now,
                }],
                deadline,
            },
        };
        Ok(())
    }

    /// 再戦投票の回答を記録（同じプレイヤーの回答は上書き）
    pub fn record_play_again_response(
        &mut self,
        player_id: PlayerId,
        accepted: bool,
        now: Timestamp,
    ) -> Result<(), RoomError> {
        self.expect_member(&player_id)?;
        let status = self.status();
        let RoomPhase::PlayAgainPending { vote, .. } = &mut self.phase else {
            return Err(RoomError::InvalidStatus {
                expected: RoomStatus::PlayAgainPending,
                actual: status,
            });
        };

        let response = PlayAgainResponse {
            player_id,
            accepted,
            timestamp: now,
        };
        match vote.responses.iter_mut().find(|r| r.player_id == player_id) {
            Some(existing) => *existing = response,
            None => vote.responses.push(response),
        }
        Ok(())
    }

    /// 全員が承諾したか（1 人でも拒否していれば false）
    pub fn all_players_accepted(&self) -> bool {
        let Some(vote) = self.play_again_vote() else {
            return false;
        };
        if vote.responses.iter().any(|r| !r.accepted) {
            return false;
        }
        vote.responses.len() == self.players.len()
            && self.players.iter().all(|p| {
                vote.responses
                    .iter()
                    .any(|r| r.player_id == p.id && r.accepted)
            })
    }

    /// PLAY_AGAIN_PENDING → PLAYING（同じルームで新しい対局）
    pub fn reset_game(&mut self, first_turn_index: usize) -> Result<(), RoomError> {
        self.expect_status(RoomStatus::PlayAgainPending)?;
        self.expect_two_players()?;
        self.phase = RoomPhase::Playing(ActiveGame::fresh(self.pick_first_turn(first_turn_index)));
        Ok(())
    }

    /// PLAY_AGAIN_PENDING → FINISHED（拒否・タイムアウト）
    pub fn cancel_play_again(&mut self) -> Result<(), RoomError> {
        let RoomPhase::PlayAgainPending { game, .. } = &self.phase else {
            return Err(RoomError::InvalidStatus {
                expected: RoomStatus::PlayAgainPending,
                actual: self.status(),
            });
        };
        self.phase = RoomPhase::Finished(game.clone());
        Ok(())
    }

    pub fn has_play_again_timed_out(&self, now: Timestamp) -> bool {
        self.play_again_vote()
            .is_some_and(|vote| now >= vote.deadline)
    }

    /// 同じ参加者・ホストで READY 状態の新しいルームを作る
    pub fn rematch_in(&self, id: RoomId, created_at: Timestamp) -> Result<Room, RoomError> {
        self.expect_two_players()?;
        Ok(Room {
            id,
            host_id: self.host_id,
            created_at,
            players: self.players.clone(),
            phase: RoomPhase::Ready,
        })
    }
}
