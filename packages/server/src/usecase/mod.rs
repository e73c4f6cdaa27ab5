//! UseCase 層
//!
//! 各ユースケースは Repository の trait オブジェクトだけに依存し、
//! クライアントへの通知は UI 層（GameGateway）が担当します。

mod create_room;
mod disconnect_player;
mod error;
mod get_room_detail;
mod get_rooms;
mod join_room;
mod leave_room;
mod make_move;
mod play_again;
mod reconnect_player;
mod start_game;

#[cfg(test)]
pub(crate) mod test_support;

pub use create_room::{CreateRoomOutput, CreateRoomUseCase};
pub use disconnect_player::DisconnectPlayerUseCase;
pub use error::{
    CreateRoomError, GetRoomDetailError, JoinRoomError, MakeMoveError, PlayAgainError,
    ReconnectError, StartGameError,
};
pub use get_room_detail::GetRoomDetailUseCase;
pub use get_rooms::GetRoomsUseCase;
pub use join_room::{JoinRoomOutput, JoinRoomUseCase};
pub use leave_room::{LeaveRoomUseCase, RoomDeparture};
pub use make_move::{MakeMoveUseCase, MoveKind, MoveOutcome};
pub use play_again::{
    PlayAgainResolution, PlayAgainResponseOutcome, PlayAgainStrategy, PlayAgainUseCase,
};
pub use reconnect_player::{ReconnectOutput, ReconnectPlayerUseCase};
pub use start_game::StartGameUseCase;
