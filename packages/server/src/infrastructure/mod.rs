//! Infrastructure layer
//!
//! ドメイン層が定義するインターフェース（Repository, MessagePusher）の具体的な実装と、
//! ワイヤー表現（DTO）を提供します。

pub mod dto;
pub mod message_pusher;
pub mod repository;
