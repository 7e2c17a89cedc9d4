//! # Output Configuration
//!
//! Controls how the CLI decorates what it prints: status markers, colours
//! and the progress spinner shown during long map operations.
//!
//! ## Respecting User Preferences
//!
//! - `--color=never|always|auto` - CLI flag for color control
//! - `NO_COLOR` - Disables colors when set (per https://no-color.org/)
//! - `CLICOLOR=0` - Disables colors
//! - `CLICOLOR_FORCE=1` - Forces colors even in non-TTY
//! - `TERM=dumb` - Disables colors for dumb terminals
//!
//! Without colour support the markers fall back to bracketed words
//! (`[OK]`, `[WARN]`) and the spinner is hidden.

use std::env;
use std::time::Duration;

use clap::ValueEnum;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Value of the `--color` flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    #[default]
    Auto,
    Always,
    Never,
}

/// Output configuration for controlling colors and emojis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputConfig {
    /// Whether colors and emojis should be used in output.
    pub use_color: bool,
}

/// Kinds of status line the commands print.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Info,
    Warning,
    Search,
}

impl OutputConfig {
    /// `Always` forces colour on even when `NO_COLOR` is set; `Auto` looks at
    /// the environment and the terminal.
    pub fn new(choice: ColorChoice) -> Self {
        let use_color = match choice {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => Self::detect_color_support(),
        };
        Self { use_color }
    }

    fn detect_color_support() -> bool {
        // Presence alone disables, even when empty
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

    /// The marker leading a status line.
    pub fn marker(&self, status: Status) -> String {
        let (emoji, plain) = match status {
            Status::Success => ("✅", "[OK]"),
            Status::Info => ("📊", "[INFO]"),
            Status::Warning => ("⚠️", "[WARN]"),
            Status::Search => ("🔍", "[SCAN]"),
        };
        if self.use_color {
            emoji.to_string()
        } else {
            plain.to_string()
        }
    }

    /// `text` in bold when colours are on.
    pub fn emphasis(&self, text: &str) -> String {
        if self.use_color {
            style(text).bold().to_string()
        } else {
            text.to_string()
        }
    }

    /// A ticking spinner on stderr, hidden when colours are off.
    pub fn spinner(&self, message: impl Into<String>) -> ProgressBar {
        if !self.use_color {
            return ProgressBar::hidden();
        }
        let spinner = ProgressBar::new_spinner();
        if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            spinner.set_style(spinner_style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "✓"]));
        }
        spinner.set_message(message.into());
        spinner.enable_steady_tick(Duration::from_millis(100));
        spinner
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::new(ColorChoice::Auto)
    }
}
