//! UseCase: ルーム詳細の取得

use std::sync::Arc;

use crate::domain::{Room, RoomId, RoomRepository};

use super::error::GetRoomDetailError;

pub struct GetRoomDetailUseCase {
    room_repository: Arc<dyn RoomRepository>,
}

impl GetRoomDetailUseCase {
    pub fn new(room_repository: Arc<dyn RoomRepository>) -> Self {
        Self { room_repository }
    }

    /// ルームコードの形式が不正な場合も `RoomNotFound` を返す
    pub async fn execute(&self, room_id: &str) -> Result<Room, GetRoomDetailError> {
        let room_id =
            RoomId::new(room_id.to_string()).map_err(|_| GetRoomDetailError::RoomNotFound)?;
        self.room_repository
            .find_by_id(&room_id)
            .await
            .ok_or(GetRoomDetailError::RoomNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecase::test_support::TestContext;

    #[tokio::test]
    async fn test_get_existing_room() {
        // テスト項目: 存在するルームの詳細が取得できる
        // given (前提条件):
        let ctx = TestContext::new();
        let (alice, room) = ctx.host_room("alice").await;
        let usecase = GetRoomDetailUseCase::new(ctx.rooms.clone());

        // when (操作):
        let found = usecase.execute(room.id.as_str()).await.unwrap();

        // then (期待する結果):
        assert_eq!(found.id, room.id);
        assert_eq!(found.host_id, alice.id);
    }

    #[tokio::test]
    async fn test_get_missing_or_malformed_room() {
        // テスト項目: 存在しない・形式不正なコードは RoomNotFound
        // given (前提条件):
        let ctx = TestContext::new();
        let usecase = GetRoomDetailUseCase::new(ctx.rooms.clone());

        // when (操作) / then (期待する結果):
        for id in ["123456", "abc", ""] {
            assert_eq!(
                usecase.execute(id).await.unwrap_err(),
                GetRoomDetailError::RoomNotFound
            );
        }
    }
}
