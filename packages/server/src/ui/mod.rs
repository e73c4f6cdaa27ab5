//! UI layer: axum server, WebSocket/HTTP handlers and the connection gateway.

mod gateway;
mod handler;
mod play_again_timer;
mod server;
mod signal;
pub mod state;

pub use gateway::{GameGateway, GameUseCases};
pub use server::Server;
