//! HTTP API response DTOs.

use serde::Serialize;

use crate::domain::RoomStatus;

use super::websocket::{PlayerDto, RoomDto};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// `GET /api/rooms` の 1 要素
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummaryDto {
    pub id: String,
    pub status: RoomStatus,
    pub players: Vec<PlayerDto>,
    pub host_id: String,
    /// JST (RFC 3339)
    pub created_at: Option<String>,
}

/// `GET /api/rooms/{room_id}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomDetailDto {
    pub room: RoomDto,
    /// JST (RFC 3339)
    pub created_at: Option<String>,
    /// Present while a play-again vote is open
    #[serde(skip_serializing_if = "Option::is_none")]
    pub play_again_deadline: Option<String>,
}
