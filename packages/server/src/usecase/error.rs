//! UseCase 層のエラー
//!
//! `Display` の文言はそのままクライアントへの `error` イベント / ack に使われます。

use thiserror::Error;

use crate::domain::{RepositoryError, RoomStatus, ValueObjectError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CreateRoomError {
    #[error("Invalid nickname: {0}")]
    InvalidNickname(#[from] ValueObjectError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JoinRoomError {
    #[error("Room not found")]
    RoomNotFound,

    #[error("Room is full")]
    RoomFull,

    /// 人数に空きはあるが WAITING ではない（ゲーム進行中など）
    #[error("Room is not accepting players (status: {0})")]
    NotJoinable(RoomStatus),

    #[error("Invalid nickname: {0}")]
    InvalidNickname(#[from] ValueObjectError),

    #[error("Failed to join room")]
    Repository(RepositoryError),
}

impl JoinRoomError {
    /// クライアントが画面遷移すべき致命的なエラーか
    pub fn is_critical(&self) -> bool {
        matches!(self, JoinRoomError::NotJoinable(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StartGameError {
    #[error("Room not found")]
    RoomNotFound,

    #[error("Only the host can start the game")]
    NotHost,

    #[error("Cannot start game - room not ready or missing players")]
    NotReady,

    #[error("Failed to start game")]
    Repository(#[from] RepositoryError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MakeMoveError {
    #[error("Room not found")]
    RoomNotFound,

    #[error("Invalid move: game is not in progress")]
    GameNotInProgress,

    #[error("Invalid move: not your turn")]
    NotYourTurn,

    #[error("Invalid move: column out of range")]
    InvalidColumn,

    #[error("Invalid move: column is full")]
    ColumnFull,

    #[error("Failed to make move")]
    Repository(#[from] RepositoryError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconnectError {
    #[error("Player not found")]
    PlayerNotFound,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlayAgainError {
    #[error("Room not found or not in finished state")]
    NotFinished,

    #[error("Room not found or not in play again state")]
    NotPending,

    #[error("Player is not a member of this room")]
    NotAMember,

    #[error("Failed to process play again request")]
    Repository(#[from] RepositoryError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GetRoomDetailError {
    #[error("Room not found")]
    RoomNotFound,
}
