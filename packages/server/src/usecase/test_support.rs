//! UseCase / UI テスト用のヘルパー

use std::{sync::Arc, time::Duration};

use yonmoku_shared::time::ManualClock;

use crate::{
    domain::{ConnectionId, Nickname, Player, PlayerRepository, Room, RoomRepository},
    infrastructure::repository::{InMemoryPlayerRepository, InMemoryRoomRepository},
};

pub const PLAY_AGAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// インメモリ実装と手動クロックをまとめたテスト用コンテキスト
pub struct TestContext {
    pub players: Arc<InMemoryPlayerRepository>,
    pub rooms: Arc<InMemoryRoomRepository>,
    pub clock: Arc<ManualClock>,
}

impl TestContext {
    pub fn new() -> Self {
        let clock = Arc::new(ManualClock::new(1_000_000));
        Self {
            players: Arc::new(InMemoryPlayerRepository::new()),
            rooms: Arc::new(InMemoryRoomRepository::new(
                clock.clone(),
                PLAY_AGAIN_TIMEOUT,
            )),
            clock,
        }
    }

    /// プレイヤーを登録し、その人がホストのルームを作る
    pub async fn host_room(&self, nickname: &str) -> (Player, Room) {
        let player = self
            .players
            .create_player(
                Nickname::new(nickname).unwrap(),
                format!("{}.svg", nickname),
                ConnectionId::generate(),
            )
            .await;
        let room = self.rooms.create_room(player.as_member()).await;
        let player = self
            .players
            .assign_room(&player.id, room.id.clone())
            .await
            .unwrap();
        (player, room)
    }

    /// 既存のルームにプレイヤーを追加する（2 人目なら READY にする）
    pub async fn join(&self, room: &Room, nickname: &str) -> (Player, Room) {
        let player = self
            .players
            .create_player(
                Nickname::new(nickname).unwrap(),
                format!("{}.svg", nickname),
                ConnectionId::generate(),
            )
            .await;
        let mut room = self
            .rooms
            .add_player_to_room(&room.id, player.as_member())
            .await
            .unwrap();
        let player = self
            .players
            .assign_room(&player.id, room.id.clone())
            .await
            .unwrap();
        if room.is_full() {
            room = self.rooms.set_room_ready(&room.id).await.unwrap();
        }
        (player, room)
    }

    /// 対局中のルーム。戻り値は (先手, 後手, ルーム)
    pub async fn playing_room(&self) -> (Player, Player, Room) {
        let (alice, room) = self.host_room("alice").await;
        let (bob, room) = self.join(&room, "bob").await;
        let room = self.rooms.start_game(&room.id).await.unwrap();
        if room.current_turn() == Some(alice.id) {
            (alice, bob, room)
        } else {
            (bob, alice, room)
        }
    }
}
