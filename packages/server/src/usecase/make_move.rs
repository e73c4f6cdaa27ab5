//! UseCase: 着手（Session Orchestrator）
//!
//! 1 手ごとに「検証 → 盤面更新 → 勝敗判定 → 手番交代」を行います。
//!
//! 1. ルームが存在し、手番のプレイヤーで、対局中であること
//! 2. 列が 0..=6 であること
//! 3. 座席は入室順で決まる（1 人目が 1、2 人目が 2）
//! 4. 列が埋まっていないこと
//! 5. 盤面を保存
//! 6. 勝利なら終局（勝者と揃ったマスを記録）
//! 7. 盤面が埋まれば引き分けで終局
//! 8. それ以外は手番交代

use std::sync::Arc;

use crate::domain::{
    BOARD_COLS, CellPosition, GameOutcome, LastMove, MoveError, PlayerId, Room, RoomId,
    RoomRepository, apply_move, check_draw, check_win,
};

use super::error::MakeMoveError;

/// 着手の種類
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveKind {
    Normal,
    Win { winning_cells: Vec<CellPosition> },
    Draw,
}

/// 着手の結果
#[derive(Debug, Clone)]
pub struct MoveOutcome {
    /// 着手後のルーム
    pub room: Room,
    pub row: usize,
    pub column: usize,
    pub kind: MoveKind,
}

impl MoveOutcome {
    pub fn is_game_over(&self) -> bool {
        !matches!(self.kind, MoveKind::Normal)
    }
}

/// 着手のユースケース
pub struct MakeMoveUseCase {
    room_repository: Arc<dyn RoomRepository>,
}

impl MakeMoveUseCase {
    pub fn new(room_repository: Arc<dyn RoomRepository>) -> Self {
        Self { room_repository }
    }

    pub async fn execute(
        &self,
        room_id: &RoomId,
        player_id: &PlayerId,
        column: i64,
    ) -> Result<MoveOutcome, MakeMoveError> {
        let room = self
            .room_repository
            .find_by_id(room_id)
            .await
            .ok_or(MakeMoveError::RoomNotFound)?;

        let (current_turn, board) = match (room.current_turn(), room.board()) {
            (Some(turn), Some(board)) => (turn, *board),
            _ => return Err(MakeMoveError::GameNotInProgress),
        };
        if &current_turn != player_id {
            return Err(MakeMoveError::NotYourTurn);
        }

        let column = usize::try_from(column)
            .ok()
            .filter(|c| *c < BOARD_COLS)
            .ok_or(MakeMoveError::InvalidColumn)?;

        let seat = room.seat_of(player_id);
        let applied = apply_move(&board, column, seat).map_err(|e| match e {
            MoveError::InvalidColumn => MakeMoveError::InvalidColumn,
            MoveError::ColumnFull => MakeMoveError::ColumnFull,
        })?;
        let row = applied.row;

        self.room_repository
            .update_board(
                room_id,
                applied.board,
                LastMove {
                    column,
                    row,
                    player_id: *player_id,
                },
            )
            .await?;

        let (room, kind) = if let Some(winning_cells) = check_win(&applied.board, row, column, seat)
        {
            tracing::info!("Player {} won in room {}", player_id, room_id);
            let room = self
                .room_repository
                .end_game(
                    room_id,
                    GameOutcome::Win {
                        winner: *player_id,
                        winning_cells: winning_cells.clone(),
                    },
                )
                .await?;
            (room, MoveKind::Win { winning_cells })
        } else if check_draw(&applied.board) {
            tracing::info!("Game in room {} ended in a draw", room_id);
            let room = self
                .room_repository
                .end_game(room_id, GameOutcome::Draw)
                .await?;
            (room, MoveKind::Draw)
        } else {
            let room = self.room_repository.switch_turn(room_id).await?;
            (room, MoveKind::Normal)
        };

        Ok(MoveOutcome {
            room,
            row,
            column,
            kind,
        })
    }
}
