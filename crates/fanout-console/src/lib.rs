//! fanout console - terminal output for the fanout harness.
//!
//! Output adapts to where it is going:
//!
//! - **Plain**: ASCII tables, no icons (CI, pipes, dumb terminals)
//! - **Rich**: box-drawing tables and status icons (interactive terminals)
//! - **Json**: one JSON object per line (tooling)
//!
//! Override detection with `FANOUT_PLAIN=1`, `FANOUT_RICH=1` or
//! `FANOUT_JSON=1`.
//!
//! # Example
//!
//! ```rust
//! use fanout_console::{Console, OutputMode};
//! use fanout_console::renderables::QueryResults;
//!
//! let console = Console::with_mode(OutputMode::Plain);
//! console.print("Results:");
//! console.results(&QueryResults::new(vec!["event_id".into()], vec![vec!["1".into()]]));
//! ```

#![forbid(unsafe_code)]

pub mod console;
pub mod mode;
pub mod renderables;

pub use console::{Captured, Console};
pub use mode::OutputMode;
