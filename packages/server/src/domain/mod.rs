//! Domain layer
//!
//! ゲームのルール（盤面計算）、ルームの状態遷移、値オブジェクト、
//! そして Infrastructure 層が実装するインターフェース（Repository, MessagePusher）を定義します。

pub mod board;
pub mod entity;
pub mod error;
pub mod message_pusher;
pub mod repository;
pub mod value_object;

pub use board::{
    AppliedMove, BOARD_COLS, BOARD_ROWS, Board, CellPosition, Seat, WINNING_COUNT, apply_move,
    check_draw, check_win, create_empty_board, find_available_row,
};
pub use entity::{
    ActiveGame, FinishedGame, GameOutcome, LastMove, MAX_PLAYERS_PER_ROOM, PlayAgainResponse,
    PlayAgainVote, Player, Room, RoomMember, RoomPhase, RoomStatus,
};
pub use error::{MessagePushError, MoveError, RepositoryError, RoomError, ValueObjectError};
pub use message_pusher::{MessagePusher, PusherChannel};
#[cfg(test)]
pub use message_pusher::MockMessagePusher;
pub use repository::{PlayerRepository, RoomRepository};
pub use value_object::{ConnectionId, Nickname, PlayerId, RoomId, RoomIdFactory, Timestamp};
