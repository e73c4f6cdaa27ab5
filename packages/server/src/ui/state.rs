//! Server state shared by the handlers.

use std::sync::Arc;

use crate::usecase::{GetRoomDetailUseCase, GetRoomsUseCase};

use super::GameGateway;

/// Shared application state
pub struct AppState {
    /// GameGateway（WebSocket イベントの処理）
    pub gateway: Arc<GameGateway>,
    /// GetRoomsUseCase（ルーム一覧取得のユースケース）
    pub get_rooms_usecase: Arc<GetRoomsUseCase>,
    /// GetRoomDetailUseCase（ルーム詳細取得のユースケース）
    pub get_room_detail_usecase: Arc<GetRoomDetailUseCase>,
}
