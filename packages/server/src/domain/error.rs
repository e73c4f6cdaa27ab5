//! Domain errors.

use thiserror::Error;

use super::entity::RoomStatus;

/// 値オブジェクトの生成失敗
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("room id must be exactly 6 ASCII digits, got '{0}'")]
    InvalidRoomId(String),

    #[error("player id is not a valid UUID: '{0}'")]
    InvalidPlayerId(String),

    #[error("nickname must not be empty")]
    EmptyNickname,

    #[error("nickname is too long ({0} characters)")]
    NicknameTooLong(usize),
}

/// Board Engine のエラー
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MoveError {
    #[error("column is outside the board")]
    InvalidColumn,

    #[error("column is full")]
    ColumnFull,
}

/// Room エンティティの状態遷移エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomError {
    #[error("room is full")]
    RoomFull,

    #[error("room status is {actual}, expected {expected}")]
    InvalidStatus {
        expected: RoomStatus,
        actual: RoomStatus,
    },

    #[error("room needs exactly 2 players, has {0}")]
    NotEnoughPlayers(usize),

    #[error("player '{0}' is not a member of this room")]
    NotAMember(String),
}

/// Repository 層のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("room '{0}' not found")]
    RoomNotFound(String),

    #[error("player '{0}' not found")]
    PlayerNotFound(String),

    #[error(transparent)]
    Room(#[from] RoomError),
}

/// MessagePusher のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    #[error("connection '{0}' not found")]
    ConnectionNotFound(String),

    #[error("failed to push message: {0}")]
    PushFailed(String),
}
