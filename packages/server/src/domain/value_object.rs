//! 値オブジェクト
//!
//! プリミティブ型をそのまま使わず、生成時に検証済みの型として扱います。

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::ValueObjectError;

/// ルームコードの桁数
pub const ROOM_ID_LENGTH: usize = 6;

/// ニックネームの最大文字数
pub const NICKNAME_MAX_CHARS: usize = 32;

/// Player の識別子（UUID v4）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(Uuid);

impl PlayerId {
    /// 新しい PlayerId を生成
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl TryFrom<&str> for PlayerId {
    type Error = ValueObjectError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Uuid::parse_str(value)
            .map(Self)
            .map_err(|_| ValueObjectError::InvalidPlayerId(value.to_string()))
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// WebSocket 接続の識別子
///
/// 接続ごとに払い出され、再接続すると別の値になります。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Room の識別子（6 桁の数字）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomId(String);

impl RoomId {
    /// 検証付きで RoomId を作成
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        if value.len() == ROOM_ID_LENGTH && value.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(value))
        } else {
            Err(ValueObjectError::InvalidRoomId(value))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for RoomId {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RoomId> for String {
    fn from(value: RoomId) -> Self {
        value.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// RoomId の生成
pub struct RoomIdFactory;

impl RoomIdFactory {
    /// ランダムな 6 桁のルームコードを生成（先頭は 0 以外）
    pub fn generate() -> RoomId {
        let code: u32 = rand::rng().random_range(100_000..=999_999);
        RoomId(code.to_string())
    }

    /// `is_taken` が false を返すまで再生成し、未使用のルームコードを返す
    pub fn generate_unique(is_taken: impl Fn(&RoomId) -> bool) -> RoomId {
        loop {
            let candidate = Self::generate();
            if !is_taken(&candidate) {
                return candidate;
            }
            tracing::debug!("Room id {} collided, regenerating", candidate);
        }
    }
}

/// 表示用ニックネーム
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Nickname(String);

impl Nickname {
    /// 前後の空白を取り除いて検証する
    pub fn new(value: &str) -> Result<Self, ValueObjectError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValueObjectError::EmptyNickname);
        }
        let chars = trimmed.chars().count();
        if chars > NICKNAME_MAX_CHARS {
            return Err(ValueObjectError::NicknameTooLong(chars));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Nickname {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unix タイムスタンプ（ミリ秒）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(millis: i64) -> Self {
        Self(millis)
    }

    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn plus_millis(&self, millis: i64) -> Self {
        Self(self.0.saturating_add(millis))
    }
}
