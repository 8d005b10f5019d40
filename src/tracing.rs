//! Tracing setup and caret snapshots for diagnostics
//!
//! # Usage
//!
//! Configure via RUST_LOG environment variable:
//! - `RUST_LOG=debug` - all debug logs
//! - `RUST_LOG=sprig::caret=trace` - module-level filtering
//!
//! # Log Files
//!
//! Logs are written to `~/.config/sprig/logs/sprig.log` with daily rotation.
//! File logging uses debug level by default.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::caret::{Caret, Position};

/// Initialize tracing subscriber with console and file logging
///
/// Console output respects RUST_LOG and goes to stderr, so it never mixes
/// with a replayed document printed on stdout.
pub fn init() {
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .with_filter(console_filter);

    let file_layer = match crate::config_paths::ensure_logs_dir() {
        Ok(logs_dir) => {
            let file_appender = tracing_appender::rolling::daily(logs_dir, "sprig.log");
            Some(
                fmt::layer()
                    .with_writer(file_appender)
                    .with_ansi(false)
                    .with_target(true)
                    .with_line_number(true)
                    .with_filter(EnvFilter::new("debug")),
            )
        }
        Err(e) => {
            eprintln!("Warning: Could not initialize file logging: {e:#}");
            None
        }
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();
}

/// Lightweight snapshot of caret state for diffing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaretSnapshot {
    pub length: usize,
    pub line: Option<usize>,
    pub column: Option<usize>,
    pub selection: bool,
}

impl CaretSnapshot {
    pub fn from_caret(caret: &Caret) -> Self {
        Self {
            length: caret.source().len(),
            line: caret.line(),
            column: caret.column(),
            selection: matches!(caret.position(), Position::Node(_)),
        }
    }

    /// Describe what changed between two snapshots
    pub fn diff(&self, other: &CaretSnapshot) -> Option<String> {
        let mut changes = Vec::new();
        if self.length != other.length {
            changes.push(format!("length: {} → {}", self.length, other.length));
        }
        if self.line != other.line || self.column != other.column {
            changes.push(format!(
                "({:?},{:?}) → ({:?},{:?})",
                self.line, self.column, other.line, other.column
            ));
        }
        if self.selection != other.selection {
            let status = if other.selection { "selected" } else { "collapsed" };
            changes.push(format!("selection {status}"));
        }

        if changes.is_empty() {
            None
        } else {
            Some(changes.join("; "))
        }
    }
}
