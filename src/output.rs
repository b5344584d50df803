//! # Output Configuration
//!
//! This module controls how command output is presented: color and emoji
//! support for the CLI summaries, and how each external command is announced.
//!
//! ## Command Announcements
//!
//! Every shelled command is announced as `<cwd> $> <command>`. When running on
//! GitHub Actions (`GITHUB_ACTIONS` is set) the announcement opens a
//! collapsible log group that is closed once the command finishes.
//!
//! ## Respecting User Preferences
//!
//! The module respects the following environment variables and flags:
//! - `--color=never|always|auto` - CLI flag for color control
//! - `NO_COLOR` - Disables colors when set (per https://no-color.org/)
//! - `CLICOLOR=0` - Disables colors
//! - `CLICOLOR_FORCE=1` - Forces colors even in non-TTY
//! - `TERM=dumb` - Disables colors for dumb terminals

use std::env;
use std::path::Path;

/// Output configuration for controlling colors, emojis and log grouping.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Whether colors and emojis should be used in output.
    pub use_color: bool,
    /// Whether command output is wrapped in GitHub Actions log groups.
    pub github_actions: bool,
}

impl OutputConfig {
    /// Create an output configuration from environment and CLI flag.
    ///
    /// # Arguments
    /// * `color_flag` - The value of the --color CLI flag: "always", "never", or "auto"
    ///
    /// In auto mode, colors are disabled if:
    /// - `NO_COLOR` environment variable is set (any value, including empty)
    /// - `CLICOLOR=0` is set
    /// - `TERM=dumb` is set
    /// - stdout is not a TTY (unless `CLICOLOR_FORCE=1`)
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => Self::detect_color_support(),
        };

        Self {
            use_color,
            github_actions: Self::detect_github_actions(),
        }
    }

    fn detect_github_actions() -> bool {
        env::var_os("GITHUB_ACTIONS").is_some_and(|v| !v.is_empty())
    }

    /// Detect whether color output is supported based on environment.
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

    /// Plain output: no colors, no log groups.
    pub fn plain() -> Self {
        Self {
            use_color: false,
            github_actions: false,
        }
    }

    /// Formats the line that announces a command about to run.
    pub fn command_header(&self, cwd: &Path, command: &str) -> String {
        let line = format!("{} $> {}", cwd.display(), command);
        if self.github_actions {
            format!("::group::{}", line)
        } else {
            line
        }
    }

    /// The line closing a command's output, if the format needs one.
    pub fn command_footer(&self) -> Option<&'static str> {
        self.github_actions.then_some("::endgroup::")
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}

/// Returns the appropriate string based on color configuration.
///
/// When colors are enabled, returns the emoji. When disabled, returns
/// the plain text alternative.
pub fn emoji<'a>(config: &OutputConfig, emoji_str: &'a str, plain: &'a str) -> &'a str {
    if config.use_color {
        emoji_str
    } else {
        plain
    }
}
