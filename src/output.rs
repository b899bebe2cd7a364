//! # Output Configuration
//!
//! Controls how the CLI renders human-facing output: colors, emoji, and the
//! per-source run summaries printed by `sync`.
//!
//! ## Respecting User Preferences
//!
//! - `--color=never|always|auto` - CLI flag for color control
//! - `NO_COLOR` - Disables colors when set (per https://no-color.org/)
//! - `CLICOLOR=0` - Disables colors
//! - `CLICOLOR_FORCE=1` - Forces colors even in non-TTY
//! - `TERM=dumb` - Disables colors for dumb terminals
//!
//! Summaries go to stderr so stdout stays a clean JSON-lines stream.

use std::env;

use console::style;

use crate::error::ErrorKind;
use crate::pipeline::RunSummary;

/// Output configuration for controlling colors and emojis.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Whether colors and emojis should be used in output.
    pub use_color: bool,
}

impl OutputConfig {
    /// Create an output configuration from environment and CLI flag.
    ///
    /// `--color=always` overrides `NO_COLOR`; `auto` disables colors when
    /// `NO_COLOR` is set, `CLICOLOR=0`, `TERM=dumb`, or stderr is not a TTY
    /// (unless `CLICOLOR_FORCE=1`).
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => Self::detect_color_support(),
        };

        Self { use_color }
    }

    fn detect_color_support() -> bool {
        // The presence of the variable (even if empty) disables colors
        if env::var_os("NO_COLOR").is_some() {
            return false;
        }

        if env::var("CLICOLOR").is_ok_and(|v| v == "0") {
            return false;
        }

        if env::var("CLICOLOR_FORCE").is_ok_and(|v| v != "0" && !v.is_empty()) {
            return true;
        }

        if env::var("TERM").is_ok_and(|v| v == "dumb") {
            return false;
        }

        console::Term::stderr().features().colors_supported()
    }

    /// Create a configuration with colors always enabled.
    pub fn with_color() -> Self {
        Self { use_color: true }
    }

    /// Create a configuration with colors always disabled.
    pub fn without_color() -> Self {
        Self { use_color: false }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}

/// Returns the emoji when colors are enabled, `plain` otherwise.
pub fn emoji<'a>(config: &OutputConfig, emoji_str: &'a str, plain: &'a str) -> &'a str {
    if config.use_color {
        emoji_str
    } else {
        plain
    }
}

/// One line per completed source, e.g.
/// `[OK] blog: cloned, 12 file(s) (posts: 10, pages: 2)`.
pub fn format_summary(config: &OutputConfig, summary: &RunSummary) -> String {
    let marker = emoji(config, "✅", "[OK]");
    let name = if config.use_color {
        style(&summary.name).bold().force_styling(true).to_string()
    } else {
        summary.name.clone()
    };

    let groups = summary
        .groups
        .iter()
        .map(|g| format!("{}: {}", g.name, g.files))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "{} {}: {}, {} file(s) ({})",
        marker, name, summary.sync, summary.files_emitted, groups
    )
}

/// One line per halted source.
pub fn format_halt(config: &OutputConfig, name: &str, kind: ErrorKind) -> String {
    let marker = emoji(config, "❌", "[FAILED]");
    let kind = if config.use_color {
        style(kind.to_string()).red().force_styling(true).to_string()
    } else {
        kind.to_string()
    };
    format!("{} {}: halted with {}", marker, name, kind)
}
