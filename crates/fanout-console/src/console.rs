//! Console - mode-aware output coordinator.
//!
//! # Stream Separation
//!
//! - `print()`, `results()`, `tree()` → stdout (the transcript)
//! - `warning()`, `error()` → stderr (feedback)
//!
//! In JSON mode plain text goes to stderr so stdout carries only JSON lines.
//!
//! # Example
//!
//! ```rust
//! use fanout_console::{Console, OutputMode};
//!
//! let (console, captured) = Console::capture(OutputMode::Plain);
//! console.print("Results:");
//! console.warning("observer connection failed");
//! assert_eq!(captured.stdout(), "Results:\n");
//! assert_eq!(captured.stderr(), "observer connection failed\n");
//! ```

use crate::mode::OutputMode;
use crate::renderables::{QueryResults, TreeNode};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Clone)]
enum Stream {
    Stdout,
    Stderr,
    Buffer(Rc<RefCell<String>>),
}

impl Stream {
    fn line(&self, text: &str) {
        match self {
            Stream::Stdout => println!("{text}"),
            Stream::Stderr => eprintln!("{text}"),
            Stream::Buffer(buf) => {
                let mut buf = buf.borrow_mut();
                buf.push_str(text);
                buf.push('\n');
            }
        }
    }
}

/// Text written to a capturing [`Console`].
#[derive(Debug, Clone, Default)]
pub struct Captured {
    stdout: Rc<RefCell<String>>,
    stderr: Rc<RefCell<String>>,
}

impl Captured {
    #[must_use]
    pub fn stdout(&self) -> String {
        self.stdout.borrow().clone()
    }

    #[must_use]
    pub fn stderr(&self) -> String {
        self.stderr.borrow().clone()
    }
}

/// Main coordinator for harness console output.
#[derive(Debug, Clone)]
pub struct Console {
    mode: OutputMode,
    out: Stream,
    err: Stream,
}

impl Console {
    /// Create a console with auto-detected mode writing to the process streams.
    #[must_use]
    pub fn new() -> Self {
        Self::with_mode(OutputMode::detect())
    }

    /// Create a console with a specific output mode.
    #[must_use]
    pub fn with_mode(mode: OutputMode) -> Self {
        Self {
            mode,
            out: Stream::Stdout,
            err: Stream::Stderr,
        }
    }

    /// Create a console that writes into memory instead of the process streams.
    #[must_use]
    pub fn capture(mode: OutputMode) -> (Self, Captured) {
        let captured = Captured::default();
        let console = Self {
            mode,
            out: Stream::Buffer(Rc::clone(&captured.stdout)),
            err: Stream::Buffer(Rc::clone(&captured.stderr)),
        };
        (console, captured)
    }

    #[must_use]
    pub const fn mode(&self) -> OutputMode {
        self.mode
    }

    #[must_use]
    pub fn is_json(&self) -> bool {
        self.mode == OutputMode::Json
    }

    // =========================================================================
    // Basic Output Methods
    // =========================================================================

    /// Print a line of transcript text.
    pub fn print(&self, message: &str) {
        match self.mode {
            OutputMode::Plain | OutputMode::Rich => self.out.line(message),
            // In JSON mode, regular prints go to stderr to keep stdout for JSON
            OutputMode::Json => self.err.line(message),
        }
    }

    /// Print an empty transcript line.
    pub fn newline(&self) {
        self.print("");
    }

    /// Print an error message (cross in rich mode).
    pub fn error(&self, message: &str) {
        self.print_styled_status(message, "\u{2717}");
    }

    /// Print a warning message (warning sign in rich mode).
    pub fn warning(&self, message: &str) {
        self.print_styled_status(message, "\u{26A0}");
    }

    fn print_styled_status(&self, message: &str, icon: &str) {
        match self.mode {
            OutputMode::Rich | OutputMode::Json => self.err.line(&format!("{icon} {message}")),
            // Plain mode: no icons, just the message
            OutputMode::Plain => self.err.line(message),
        }
    }

    // =========================================================================
    // Renderables
    // =========================================================================

    /// Print a result table in the current mode's style.
    pub fn results(&self, results: &QueryResults) {
        match self.mode {
            OutputMode::Plain => self.out.line(&results.to_plain()),
            OutputMode::Rich => self.out.line(&results.to_boxed()),
            OutputMode::Json => self.out.line(&results.to_json().to_string()),
        }
    }

    /// Print a tree in the current mode's style.
    pub fn tree(&self, tree: &TreeNode) {
        match self.mode {
            OutputMode::Plain => self.out.line(&tree.render_plain()),
            OutputMode::Rich => self.out.line(&tree.render_unicode()),
            OutputMode::Json => {
                if let Ok(json) = serde_json::to_string(tree) {
                    self.out.line(&json);
                }
            }
        }
    }

    // =========================================================================
    // JSON Output
    // =========================================================================

    /// Output one compact JSON line to stdout.
    pub fn print_json<T: serde::Serialize>(&self, value: &T) -> Result<(), serde_json::Error> {
        let json = serde_json::to_string(value)?;
        self.out.line(&json);
        Ok(())
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}
