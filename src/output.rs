//! # Output Configuration
//!
//! Utilities for the appearance of CLI output: whether to use color, and the
//! status tags (`[done]`, `[error]`, `[warning]`, `[info]`) that prefix
//! command reports.
//!
//! ## Respecting User Preferences
//!
//! - `--color=never|always|auto` - CLI flag for color control
//! - `NO_COLOR` - Disables colors when set (per https://no-color.org/)
//! - `CLICOLOR=0` - Disables colors
//! - `CLICOLOR_FORCE=1` - Forces colors even in non-TTY
//! - `TERM=dumb` - Disables colors for dumb terminals

use std::env;

use console::style;

/// Output configuration for controlling colors.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Whether status tags are colored.
    pub use_color: bool,
}

impl OutputConfig {
    /// Create an output configuration from environment and CLI flag.
    ///
    /// `color_flag` is "always", "never" or "auto". In auto mode colors are
    /// disabled when `NO_COLOR` is set, `CLICOLOR=0`, `TERM=dumb`, or stdout
    /// is not a TTY (unless `CLICOLOR_FORCE=1`).
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

        console::Term::stdout().features().colors_supported()
    }

    #[cfg(test)]
    pub fn with_color() -> Self {
        Self { use_color: true }
    }

    #[cfg(test)]
    pub fn without_color() -> Self {
        Self { use_color: false }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}

/// Kind of a report line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Done,
    Error,
    Warning,
    Info,
}

impl Status {
    fn label(self) -> &'static str {
        match self {
            Status::Done => "[done]",
            Status::Error => "[error]",
            Status::Warning => "[warning]",
            Status::Info => "[info]",
        }
    }
}

/// The tag of `status`, colored when the configuration allows it.
pub fn tag(config: &OutputConfig, status: Status) -> String {
    let label = status.label();
    if !config.use_color {
        return label.to_string();
    }
    let styled = match status {
        Status::Done => style(label).green(),
        Status::Error => style(label).red().bold(),
        Status::Warning => style(label).yellow(),
        Status::Info => style(label).cyan(),
    };
    styled.force_styling(true).to_string()
}

/// A tagged report line.
pub fn line(config: &OutputConfig, status: Status, message: &str) -> String {
    format!("{} {}", tag(config, status), message)
}
