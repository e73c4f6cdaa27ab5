//! WebSocket を使った MessagePusher 実装
//!
//! ## 責務
//!
//! - 接続ごとの `UnboundedSender` を管理
//! - 接続へのメッセージ送信（push_to, broadcast）
//!
//! WebSocket の受け付けと sender の生成は UI 層（`ui/handler/websocket.rs`）で行われ、
//! この実装は生成された sender を受け取って送信にのみ使用します。

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{ConnectionId, MessagePushError, MessagePusher, PusherChannel};

/// WebSocket を使った MessagePusher 実装
#[derive(Default)]
pub struct WebSocketMessagePusher {
    /// Key: 接続 ID, Value: その接続の送信チャンネル
    connections: Arc<Mutex<HashMap<ConnectionId, PusherChannel>>>,
}

impl WebSocketMessagePusher {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登録中の接続数
    pub async fn connection_count(&self) -> usize {
        self.connections.lock().await.len()
    }
}

#[async_trait]
impl MessagePusher for WebSocketMessagePusher {
    async fn register_client(&self, connection_id: ConnectionId, sender: PusherChannel) {
        let mut connections = self.connections.lock().await;
        connections.insert(connection_id, sender);
        tracing::debug!("Connection {} registered to MessagePusher", connection_id);
    }

    async fn unregister_client(&self, connection_id: &ConnectionId) {
        let mut connections = self.connections.lock().await;
        connections.remove(connection_id);
        tracing::debug!("Connection {} unregistered from MessagePusher", connection_id);
    }

    async fn push_to(
        &self,
        connection_id: &ConnectionId,
        content: &str,
    ) -> Result<(), MessagePushError> {
        let connections = self.connections.lock().await;

        let sender = connections
            .get(connection_id)
            .ok_or_else(|| MessagePushError::ConnectionNotFound(connection_id.to_string()))?;
        sender
            .send(content.to_string())
            .map_err(|e| MessagePushError::PushFailed(e.to_string()))?;
        tracing::debug!("Pushed message to connection {}", connection_id);
        Ok(())
    }

    async fn broadcast(
        &self,
        targets: Vec<ConnectionId>,
        content: &str,
    ) -> Result<(), MessagePushError> {
        let connections = self.connections.lock().await;

        for target in targets {
            match connections.get(&target) {
                // ブロードキャストでは一部の送信失敗を許容
                Some(sender) => {
                    if let Err(e) = sender.send(content.to_string()) {
                        tracing::warn!("Failed to push message to connection {}: {}", target, e);
                    } else {
                        tracing::debug!("Broadcasted message to connection {}", target);
                    }
                }
                None => {
                    tracing::warn!("Connection {} not found during broadcast, skipping", target);
                }
            }
        }

        Ok(())
    }
}
