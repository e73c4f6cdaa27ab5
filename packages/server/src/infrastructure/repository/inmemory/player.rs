//! InMemory Player Repository 実装
//!
//! 登録順を保つために `Vec` をストレージとして使用します。
//! 同時接続数は高々数百程度を想定しているため、線形探索で十分です。

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    ConnectionId, Nickname, Player, PlayerId, PlayerRepository, RepositoryError, RoomId,
};

/// インメモリ Player Repository 実装
#[derive(Default)]
pub struct InMemoryPlayerRepository {
    players: Arc<Mutex<Vec<Player>>>,
}

impl InMemoryPlayerRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn find_mut<'a>(
    players: &'a mut [Player],
    player_id: &PlayerId,
) -> Result<&'a mut Player, RepositoryError> {
    players
        .iter_mut()
        .find(|p| &p.id == player_id)
        .ok_or_else(|| RepositoryError::PlayerNotFound(player_id.to_string()))
}

#[async_trait]
impl PlayerRepository for InMemoryPlayerRepository {
    async fn create_player(
        &self,
        nickname: Nickname,
        avatar: String,
        connection_id: ConnectionId,
    ) -> Player {
        let player = Player::new(nickname, avatar, connection_id);
        self.players.lock().await.push(player.clone());
        tracing::debug!(
            "Player '{}' ({}) registered on connection {}",
            player.nickname,
            player.id,
            connection_id
        );
        player
    }

    async fn find_by_id(&self, player_id: &PlayerId) -> Option<Player> {
        let players = self.players.lock().await;
        players.iter().find(|p| &p.id == player_id).cloned()
    }

    async fn find_by_connection_id(&self, connection_id: &ConnectionId) -> Option<Player> {
        let players = self.players.lock().await;
        players
            .iter()
            .find(|p| &p.connection_id == connection_id)
            .cloned()
    }

    async fn find_by_nickname(&self, nickname: &Nickname) -> Option<Player> {
        let players = self.players.lock().await;
        players.iter().find(|p| &p.nickname == nickname).cloned()
    }

    async fn update_connection_id(
        &self,
        player_id: &PlayerId,
        connection_id: ConnectionId,
    ) -> Result<Player, RepositoryError> {
        let mut players = self.players.lock().await;
        let player = find_mut(&mut players, player_id)?;
        player.connection_id = connection_id;
        Ok(player.clone())
    }

    async fn assign_room(
        &self,
        player_id: &PlayerId,
        room_id: RoomId,
    ) -> Result<Player, RepositoryError> {
        let mut players = self.players.lock().await;
        let player = find_mut(&mut players, player_id)?;
        player.room_id = Some(room_id);
        Ok(player.clone())
    }

    async fn clear_room(&self, player_id: &PlayerId) -> Result<Player, RepositoryError> {
        let mut players = self.players.lock().await;
        let player = find_mut(&mut players, player_id)?;
        player.room_id = None;
        Ok(player.clone())
    }

    async fn list_all(&self) -> Vec<Player> {
        self.players.lock().await.clone()
    }
}
