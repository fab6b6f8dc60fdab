//! Replays each executed statement on a second connection and prints the
//! raw rows it returns.
//!
//! Failures while replaying never reach the fetch: they are logged and shown
//! as a one-line warning.

use crate::store::Store;
use fanout_console::Console;
use fanout_console::renderables::QueryResults;
use fanout_core::{Result, Row};
use fanout_query::{CommandExecuted, StatementObserver};
use serde_json::json;

/// Prints every statement of a fetch together with its raw rows.
pub struct ReplayObserver<'a> {
    store: &'a Store,
    console: &'a Console,
}

impl<'a> ReplayObserver<'a> {
    pub fn new(store: &'a Store, console: &'a Console) -> Self {
        Self { store, console }
    }

    /// Run the statement again on a fresh connection, closed on return.
    fn replay(&self, event: &CommandExecuted<'_>) -> Result<(Vec<String>, Vec<Row>)> {
        let conn = self.store.connect_again()?;
        conn.query_with_columns(event.sql, event.params)
    }

    fn print(&self, event: &CommandExecuted<'_>, columns: Vec<String>, rows: &[Row]) {
        if self.console.is_json() {
            let payload = json!({
                "sql": event.sql,
                "parameters": event.params.iter().map(fanout_core::Value::to_json).collect::<Vec<_>>(),
                "elapsed_ms": u64::try_from(event.elapsed.as_millis()).unwrap_or(u64::MAX),
                "columns": columns,
                "rows": rows
                    .iter()
                    .map(|row| row.values().map(fanout_core::Value::to_json).collect::<Vec<_>>())
                    .collect::<Vec<_>>(),
                "count": rows.len(),
            });
            if let Err(e) = self.console.print_json(&payload) {
                tracing::warn!(error = %e, "could not serialize statement results");
            }
            return;
        }

        let cells: Vec<Vec<String>> = rows
            .iter()
            .map(|row| row.values().map(ToString::to_string).collect())
            .collect();
        self.console.print(&event.description());
        self.console.newline();
        self.console.print("Results:");
        self.console.results(&QueryResults::new(columns, cells));
        self.console.newline();
    }
}

impl StatementObserver for ReplayObserver<'_> {
    fn on_executed(&self, event: &CommandExecuted<'_>) {
        match self.replay(event) {
            Ok((columns, rows)) => {
                if rows.len() != event.row_count {
                    tracing::debug!(
                        replayed = rows.len(),
                        executed = event.row_count,
                        "replay returned a different row count"
                    );
                }
                self.print(event, columns, &rows);
            }
            Err(e) => {
                tracing::warn!(error = %e, sql = event.sql, "statement replay failed");
                self.console
                    .warning(&format!("could not replay statement: {e}"));
            }
        }
    }
}
