//! Running a fetch plan against a connection.

use crate::diagnostics::{CommandExecuted, Diagnostics};
use crate::fetch::{FetchSpec, SplitMode};
use crate::graph::RowGraph;
use crate::plan::{FetchPlan, PlannedStatement};
use fanout_core::{Catalog, Connection, Result, Row, Value};
use std::time::{Duration, Instant};

/// What one statement of a fetch did.
#[derive(Debug, Clone)]
pub struct StatementReport {
    pub sql: String,
    pub params: Vec<Value>,
    /// Raw rows returned, before de-duplication.
    pub row_count: usize,
    pub elapsed: Duration,
}

/// Result of a fetch: the de-duplicated rows and every statement issued.
#[derive(Debug, Clone)]
pub struct Fetched {
    pub graph: RowGraph,
    pub statements: Vec<StatementReport>,
}

impl Fetched {
    /// Raw row counts in statement order.
    pub fn raw_row_counts(&self) -> Vec<usize> {
        self.statements.iter().map(|s| s.row_count).collect()
    }
}

/// Plan and run `spec`, reporting each statement to `diagnostics`.
#[tracing::instrument(level = "debug", skip_all, fields(root = spec.root(), mode = %spec.split_mode()))]
pub fn fetch<C: Connection>(
    conn: &C,
    catalog: &Catalog,
    spec: &FetchSpec,
    diagnostics: Diagnostics<'_>,
) -> Result<Fetched> {
    let plan = FetchPlan::resolve(catalog, spec)?;
    let mut graph = RowGraph::new(&plan);
    let mut statements = Vec::new();

    match plan.mode() {
        SplitMode::Combined => {
            let rows = run(conn, plan.combined_statement(), diagnostics, &mut statements)?;
            for row in &rows {
                for (index, node) in plan.nodes().iter().enumerate() {
                    graph.insert(index, row.subset_by_prefix(&node.alias))?;
                }
            }
        }
        SplitMode::PerRelation => {
            for row in run(conn, plan.root_statement(), diagnostics, &mut statements)? {
                graph.insert(0, row)?;
            }
            for (index, node) in plan.nodes().iter().enumerate().skip(1) {
                let (Some(parent), Some(relation)) = (node.parent, node.relation) else {
                    continue;
                };
                let keys = graph.distinct_keys(parent, relation.local_key)?;
                if keys.is_empty() {
                    tracing::debug!(relation = relation.name, "no parent keys; skipping statement");
                    continue;
                }
                let stmt = plan.relation_statement(index, &keys)?;
                for row in run(conn, stmt, diagnostics, &mut statements)? {
                    graph.insert(index, row)?;
                }
            }
        }
    }

    graph.link()?;
    diagnostics.completed();

    tracing::debug!(
        statements = statements.len(),
        roots = graph.roots().count(),
        "fetch complete"
    );
    Ok(Fetched { graph, statements })
}

fn run<C: Connection>(
    conn: &C,
    stmt: PlannedStatement,
    diagnostics: Diagnostics<'_>,
    reports: &mut Vec<StatementReport>,
) -> Result<Vec<Row>> {
    tracing::trace!(sql = %stmt.sql, "executing");
    let start = Instant::now();
    let rows = match conn.query(&stmt.sql, &stmt.params) {
        Ok(rows) => rows,
        Err(e) => {
            tracing::debug!(error = %e, sql = %stmt.sql, "statement failed");
            diagnostics.failed(&e);
            return Err(e);
        }
    };
    let elapsed = start.elapsed();

    diagnostics.executed(&CommandExecuted {
        sql: &stmt.sql,
        params: &stmt.params,
        row_count: rows.len(),
        elapsed,
    });
    reports.push(StatementReport {
        sql: stmt.sql,
        params: stmt.params,
        row_count: rows.len(),
        elapsed,
    });
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::StatementObserver;
    use crate::fetch::Filter;
    use crate::test_catalog::CATALOG;
    use fanout_sqlite::SqliteConnection;
    use std::cell::RefCell;

    fn seeded() -> SqliteConnection {
        let conn = SqliteConnection::open_memory().unwrap();
        conn.execute_raw(
            "CREATE TABLE events (event_id INTEGER PRIMARY KEY, event_name TEXT NOT NULL);
             CREATE TABLE users (user_id INTEGER PRIMARY KEY, user_name TEXT NOT NULL);
             CREATE TABLE participants (participant_id INTEGER PRIMARY KEY,
                 participant_name TEXT NOT NULL,
                 event_id INTEGER NOT NULL REFERENCES events(event_id),
                 created_by_id INTEGER NOT NULL REFERENCES users(user_id));
             CREATE TABLE hobbies (hobby_id INTEGER PRIMARY KEY, hobby_name TEXT NOT NULL,
                 user_id INTEGER NOT NULL REFERENCES users(user_id));
             INSERT INTO events (event_name) VALUES ('Event 1');
             INSERT INTO users (user_name) VALUES ('User 1');
             INSERT INTO participants (participant_name, event_id, created_by_id)
                 VALUES ('Participant 1', 1, 1), ('Participant 2', 1, 1);
             INSERT INTO hobbies (hobby_name, user_id)
                 VALUES ('Crocheting', 1), ('Beatboxing', 1), ('Witchcraft', 1);",
        )
        .unwrap();
        conn
    }

    fn spec(mode: SplitMode, event_id: i64) -> FetchSpec {
        FetchSpec::new("events")
            .filter(Filter::eq("event_id", event_id))
            .include("participants")
            .then_include("created_by")
            .then_include("hobbies")
            .mode(mode)
    }

    #[derive(Default)]
    struct Recorder {
        events: RefCell<Vec<(String, usize)>>,
        completed: RefCell<u32>,
    }

    impl StatementObserver for Recorder {
        fn on_executed(&self, event: &CommandExecuted<'_>) {
            self.events
                .borrow_mut()
                .push((event.sql.to_string(), event.row_count));
        }

        fn on_completed(&self) {
            *self.completed.borrow_mut() += 1;
        }
    }

    #[test]
    fn combined_mode_fans_out_in_one_statement() {
        let conn = seeded();
        let fetched = fetch(&conn, &CATALOG, &spec(SplitMode::Combined, 1), Diagnostics::Disarmed)
            .unwrap();
        assert_eq!(fetched.raw_row_counts(), [6]);
        assert_eq!(
            fetched.graph.row_counts(),
            [("events", 1), ("participants", 2), ("users", 1), ("hobbies", 3)]
        );
    }

    #[test]
    fn per_relation_mode_issues_one_statement_per_level() {
        let conn = seeded();
        let recorder = Recorder::default();
        let fetched = fetch(
            &conn,
            &CATALOG,
            &spec(SplitMode::PerRelation, 1),
            Diagnostics::Armed(&recorder),
        )
        .unwrap();
        assert_eq!(fetched.raw_row_counts(), [1, 2, 1, 3]);
        let seen: Vec<usize> = recorder.events.borrow().iter().map(|e| e.1).collect();
        assert_eq!(seen, [1, 2, 1, 3]);
        assert_eq!(*recorder.completed.borrow(), 1);

        let hobbies: Vec<i64> = fetched.graph.children(3, 1).map(|(pk, _)| pk).collect();
        assert_eq!(hobbies, [1, 2, 3]);
    }

    #[test]
    fn missing_root_short_circuits() {
        let conn = seeded();
        let fetched = fetch(
            &conn,
            &CATALOG,
            &spec(SplitMode::PerRelation, 99),
            Diagnostics::Disarmed,
        )
        .unwrap();
        assert_eq!(fetched.raw_row_counts(), [0]);
        assert_eq!(fetched.graph.roots().count(), 0);
    }

    #[test]
    fn failing_statement_notifies_observer() {
        struct ErrorCounter(RefCell<u32>);
        impl StatementObserver for ErrorCounter {
            fn on_executed(&self, _event: &CommandExecuted<'_>) {}
            fn on_error(&self, _error: &fanout_core::Error) {
                *self.0.borrow_mut() += 1;
            }
        }

        let conn = SqliteConnection::open_memory().unwrap();
        let counter = ErrorCounter(RefCell::new(0));
        let err = fetch(
            &conn,
            &CATALOG,
            &spec(SplitMode::Combined, 1),
            Diagnostics::Armed(&counter),
        )
        .unwrap_err();
        assert!(matches!(err, fanout_core::Error::Query(_)));
        assert_eq!(*counter.0.borrow(), 1);
    }
}
