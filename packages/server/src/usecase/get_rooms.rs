//! UseCase: ルーム一覧の取得

use std::sync::Arc;

use crate::domain::{Room, RoomRepository};

pub struct GetRoomsUseCase {
    room_repository: Arc<dyn RoomRepository>,
}

impl GetRoomsUseCase {
    pub fn new(room_repository: Arc<dyn RoomRepository>) -> Self {
        Self { room_repository }
    }

    /// 作成日時の古い順
    pub async fn execute(&self) -> Vec<Room> {
        self.room_repository.list_all().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecase::test_support::TestContext;

    #[tokio::test]
    async fn test_get_rooms_in_creation_order() {
        // テスト項目: 作成済みのルームが作成順に返る
        // given (前提条件):
        let ctx = TestContext::new();
        let (_, first_room) = ctx.host_room("alice").await;
        ctx.clock.advance(10);
        let (_, second_room) = ctx.host_room("bob").await;
        let usecase = GetRoomsUseCase::new(ctx.rooms.clone());

        // when (操作):
        let rooms = usecase.execute().await;

        // then (期待する結果):
        let ids: Vec<_> = rooms.into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![first_room.id, second_room.id]);
    }

    #[tokio::test]
    async fn test_get_rooms_empty() {
        // テスト項目: ルームがなければ空のリスト
        // given (前提条件):
        let ctx = TestContext::new();
        let usecase = GetRoomsUseCase::new(ctx.rooms.clone());

        // when (操作):
        let rooms = usecase.execute().await;

        // then (期待する結果):
        assert!(rooms.is_empty());
    }
}
