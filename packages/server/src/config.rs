//! Command line configuration.

use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::usecase::PlayAgainStrategy;

/// 再戦の始め方（CLI 表記）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum PlayAgainStrategyArg {
    /// Reset the board in the same room
    #[default]
    ResetRoom,
    /// Move both players to a freshly numbered room
    NewRoom,
}

impl From<PlayAgainStrategyArg> for PlayAgainStrategy {
    fn from(arg: PlayAgainStrategyArg) -> Self {
        match arg {
            PlayAgainStrategyArg::ResetRoom => PlayAgainStrategy::ResetRoom,
            PlayAgainStrategyArg::NewRoom => PlayAgainStrategy::NewRoom,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "yonmoku-server")]
#[command(about = "Two-player four-in-a-row session server over WebSocket", long_about = None)]
pub struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    pub host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    pub port: u16,

    /// Default log level (overridden by RUST_LOG)
    #[arg(long, default_value = "debug")]
    pub log_level: String,

    /// Seconds the players have to answer a play-again request
    #[arg(long, default_value = "30")]
    pub play_again_timeout_secs: u64,

    /// How a rematch starts once every player accepted
    #[arg(long, value_enum, default_value_t = PlayAgainStrategyArg::ResetRoom)]
    pub play_again_strategy: PlayAgainStrategyArg,
}

/// Server settings resolved from [`Args`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub play_again_timeout: Duration,
    pub play_again_strategy: PlayAgainStrategy,
}

impl From<Args> for ServerConfig {
    fn from(args: Args) -> Self {
        Self {
            host: args.host,
            port: args.port,
            log_level: args.log_level,
            play_again_timeout: Duration::from_secs(args.play_again_timeout_secs),
            play_again_strategy: args.play_again_strategy.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        // テスト項目: 引数なしでデフォルト値が使われる
        // given (前提条件):
        let argv = ["yonmoku-server"];

        // when (操作):
        let config = ServerConfig::from(Args::parse_from(argv));

        // then (期待する結果):
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.play_again_timeout, Duration::from_secs(30));
        assert_eq!(config.play_again_strategy, PlayAgainStrategy::ResetRoom);
    }

    #[test]
    fn test_all_options() {
        // テスト項目: すべてのオプションが反映される
        // given (前提条件):
        let argv = [
            "yonmoku-server",
            "-H",
            "0.0.0.0",
            "-p",
            "3000",
            "--log-level",
            "info",
            "--play-again-timeout-secs",
            "10",
            "--play-again-strategy",
            "new-room",
        ];

        // when (操作):
        let config = ServerConfig::from(Args::parse_from(argv));

        // then (期待する結果):
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.play_again_timeout, Duration::from_secs(10));
        assert_eq!(config.play_again_strategy, PlayAgainStrategy::NewRoom);
    }

    #[test]
    fn test_unknown_strategy_is_rejected() {
        // テスト項目: 未知の再戦戦略はエラー
        // given (前提条件):
        let argv = ["yonmoku-server", "--play-again-strategy", "swap-seats"];

        // when (操作):
        let result = Args::try_parse_from(argv);

        // then (期待する結果):
        assert!(result.is_err());
    }
}
