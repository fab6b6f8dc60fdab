//! Statement notifications delivered while a fetch runs.
//!
//! Callers opt in per fetch by passing [`Diagnostics::Armed`] with a
//! [`StatementObserver`]; nothing is global.

use fanout_core::{Error, Value};
use std::time::Duration;

/// A statement that has just finished executing.
#[derive(Debug, Clone, Copy)]
pub struct CommandExecuted<'a> {
    pub sql: &'a str,
    pub params: &'a [Value],
    pub row_count: usize,
    pub elapsed: Duration,
}

impl CommandExecuted<'_> {
    /// `?1=1, ?2='Event 1'`
    pub fn parameter_list(&self) -> String {
        self.params
            .iter()
            .enumerate()
            .map(|(i, value)| format!("?{}={}", i + 1, value.to_parameter_literal()))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Two-line summary: timing and bindings, then the SQL text.
    pub fn description(&self) -> String {
        format!(
            "Executed statement ({}ms) [Parameters=[{}]]\n{}",
            self.elapsed.as_millis(),
            self.parameter_list(),
            self.sql
        )
    }
}

/// Receives statement events from a fetch.
pub trait StatementObserver {
    /// Called once per executed statement, after its rows were read.
    fn on_executed(&self, event: &CommandExecuted<'_>);

    /// Called after the last statement of a successful fetch.
    fn on_completed(&self) {}

    /// Called when a statement fails, before the error is returned.
    fn on_error(&self, _error: &Error) {}
}

/// Whether a fetch reports its statements.
#[derive(Clone, Copy, Default)]
pub enum Diagnostics<'a> {
    #[default]
    Disarmed,
    Armed(&'a dyn StatementObserver),
}

impl Diagnostics<'_> {
    pub fn is_armed(&self) -> bool {
        matches!(self, Diagnostics::Armed(_))
    }

    pub(crate) fn executed(&self, event: &CommandExecuted<'_>) {
        if let Diagnostics::Armed(observer) = self {
            observer.on_executed(event);
        }
    }

    pub(crate) fn completed(&self) {
        if let Diagnostics::Armed(observer) = self {
            observer.on_completed();
        }
    }

    pub(crate) fn failed(&self, error: &Error) {
        if let Diagnostics::Armed(observer) = self {
            observer.on_error(error);
        }
    }
}

impl std::fmt::Debug for Diagnostics<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Diagnostics::Disarmed => "Disarmed",
            Diagnostics::Armed(_) => "Armed",
        })
    }
}
