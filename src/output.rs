//! # Output Configuration
//!
//! Controls whether the CLI decorates its report lines with symbols or plain
//! bracketed markers. The choice follows the `--color` flag and, in `auto`
//! mode, the usual environment conventions:
//!
//! - `NO_COLOR` set (any value) disables decoration
//! - `CLICOLOR=0` disables decoration
//! - `CLICOLOR_FORCE=1` forces decoration even without a TTY
//! - `TERM=dumb` disables decoration

use std::env;

/// Kind of report line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    Warn,
    Error,
    Info,
}

impl Status {
    fn decorated(self) -> &'static str {
        match self {
            Status::Ok => "✅",
            Status::Warn => "⚠️",
            Status::Error => "❌",
            Status::Info => "📄",
        }
    }

    fn plain(self) -> &'static str {
        match self {
            Status::Ok => "[OK]",
            Status::Warn => "[WARN]",
            Status::Error => "[ERR]",
            Status::Info => "[INFO]",
        }
    }
}

#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub use_color: bool,
}

impl OutputConfig {
    /// `always` and `never` force the choice; anything else detects.
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => Self::detect_color_support(),
        };
        Self { use_color }
    }

    fn detect_color_support() -> bool {
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

    /// Marker to prefix a report line of the given kind with.
    pub fn marker(&self, status: Status) -> &'static str {
        if self.use_color {
            status.decorated()
        } else {
            status.plain()
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}
