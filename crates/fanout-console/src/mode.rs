//! Output mode detection.
//!
//! # Detection Priority
//!
//! First match wins:
//!
//! 1. `FANOUT_PLAIN=1` - Force plain output
//! 2. `FANOUT_JSON=1` - Force JSON output
//! 3. `FANOUT_RICH=1` - Force rich output
//! 4. `NO_COLOR` - Standard env var for disabling colors
//! 5. `CI=true` - CI environment detection
//! 6. `TERM=dumb` - Dumb terminal
//! 7. stdout is not a terminal - Piped or redirected output
//! 8. Default: Rich output

use std::env;
use std::io::IsTerminal;

/// Output mode for console rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum OutputMode {
    /// ASCII tables, no icons. Stable for diffs and pipes.
    Plain,

    /// Box-drawing tables and status icons for interactive terminals.
    #[default]
    Rich,

    /// One JSON object per line for programmatic consumption.
    Json,
}

impl OutputMode {
    /// Detect the appropriate output mode from the process environment.
    #[must_use]
    pub fn detect() -> Self {
        Self::detect_from(|name| env::var(name).ok(), std::io::stdout().is_terminal())
    }

    /// Detection with an explicit variable lookup and terminal flag.
    ///
    /// ```rust
    /// use fanout_console::OutputMode;
    ///
    /// let mode = OutputMode::detect_from(|name| (name == "CI").then(|| "true".to_string()), true);
    /// assert_eq!(mode, OutputMode::Plain);
    /// ```
    pub fn detect_from(lookup: impl Fn(&str) -> Option<String>, stdout_is_terminal: bool) -> Self {
        let truthy = |name: &str| lookup(name).is_some_and(|v| is_truthy(&v));

        // Explicit overrides (highest priority)
        if truthy("FANOUT_PLAIN") {
            return Self::Plain;
        }
        if truthy("FANOUT_JSON") {
            return Self::Json;
        }
        if truthy("FANOUT_RICH") {
            return Self::Rich;
        }

        // Standard "no color" convention (https://no-color.org/)
        if lookup("NO_COLOR").is_some() {
            return Self::Plain;
        }

        if truthy("CI") {
            return Self::Plain;
        }

        if lookup("TERM").is_some_and(|t| t == "dumb") {
            return Self::Plain;
        }

        if !stdout_is_terminal {
            return Self::Plain;
        }

        Self::Rich
    }

    /// Get the mode name as a string slice.
    ///
    /// ```rust
    /// use fanout_console::OutputMode;
    ///
    /// assert_eq!(OutputMode::Plain.as_str(), "plain");
    /// assert_eq!(OutputMode::Rich.as_str(), "rich");
    /// assert_eq!(OutputMode::Json.as_str(), "json");
    /// ```
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::Rich => "rich",
            Self::Json => "json",
        }
    }
}

impl std::fmt::Display for OutputMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Recognizes: `1`, `true`, `yes`, `on` (case-insensitive).
pub fn is_truthy(value: &str) -> bool {
    let v = value.trim().to_lowercase();
    v == "1" || v == "true" || v == "yes" || v == "on"
}

/// Recognizes: `0`, `false`, `no`, `off` (case-insensitive).
pub fn is_falsy(value: &str) -> bool {
    let v = value.trim().to_lowercase();
    v == "0" || v == "false" || v == "no" || v == "off"
}
