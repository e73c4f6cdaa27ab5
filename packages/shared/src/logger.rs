//! Logging setup utilities for the Yonmoku packages.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Build the default filter directive used when `RUST_LOG` is not set.
///
/// Every crate in `crate_names` (plus the binary itself) is enabled at
/// `default_log_level`. Dashes are replaced by underscores because tracing
/// targets use the Rust module path.
pub fn default_filter_directive(
    binary_name: &str,
    crate_names: &[&str],
    default_log_level: &str,
) -> String {
    std::iter::once(binary_name)
        .chain(crate_names.iter().copied())
        .map(|name| format!("{}={}", name.replace('-', "_"), default_log_level))
        .collect::<Vec<_>>()
        .join(",")
}

/// Initialize the tracing subscriber with the specified default log level.
///
/// The log level can be overridden using the `RUST_LOG` environment variable.
///
/// # Arguments
///
/// * `binary_name` - The name of the binary (e.g., "yonmoku-server")
/// * `crate_names` - Library crates whose events should be shown
/// * `default_log_level` - The default log level (e.g., "debug", "info", "warn", "error")
///
/// # Examples
///
/// ```no_run
/// use yonmoku_shared::logger::setup_logger;
///
/// setup_logger("yonmoku-server", &["yonmoku-server", "tower-http"], "debug");
/// ```
pub fn setup_logger(binary_name: &str, crate_names: &[&str], default_log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                default_filter_directive(binary_name, crate_names, default_log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_directive_includes_binary_and_crates() {
        // テスト項目: バイナリ名とクレート名がすべてフィルタに含まれる
        // given (前提条件):
        let crates = ["yonmoku-server", "tower-http"];

        // when (操作):
        let directive = default_filter_directive("yonmoku-server", &crates, "info");

        // then (期待する結果):
        assert_eq!(
            directive,
            "yonmoku_server=info,yonmoku_server=info,tower_http=info"
        );
    }

    #[test]
    fn test_default_filter_directive_without_crates() {
        // テスト項目: クレート指定がない場合はバイナリのみが対象になる
        // given (前提条件):
        let crates: [&str; 0] = [];

        // when (操作):
        let directive = default_filter_directive("server", &crates, "debug");

        // then (期待する結果):
        assert_eq!(directive, "server=debug");
    }
}
