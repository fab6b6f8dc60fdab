//! Split-query fan-out reproduction harness.
//!
//! Seeds one event whose two participants were created by the same user,
//! who has three hobbies, then eager-loads
//! `events -> participants -> created_by -> hobbies` in one of two modes:
//!
//! - [`SplitMode::Combined`]: a single `LEFT JOIN` statement. The raw result
//!   repeats the event and user once per participant-hobby pair (2 x 3 = 6
//!   rows).
//! - [`SplitMode::PerRelation`]: one statement per level, returning 1, 2, 1
//!   and 3 rows.
//!
//! With diagnostics armed, every statement is replayed on a second
//! connection and its raw rows printed next to the SQL.
//!
//! ```no_run
//! use fanout::{HarnessConfig, run};
//! use fanout_console::Console;
//!
//! let console = Console::new();
//! let report = run(&HarnessConfig::default(), &console)?;
//! assert_eq!(report.events.len(), 1);
//! # Ok::<(), fanout_core::Error>(())
//! ```

pub mod config;
pub mod entities;
pub mod hydrate;
pub mod observer;
pub mod seed;
pub mod store;

pub use config::HarnessConfig;
pub use entities::{CATALOG, Event, Hobby, Participant, User};
pub use fanout_query::{Diagnostics, FetchSpec, SplitMode, StatementReport};
pub use observer::ReplayObserver;
pub use seed::{SavedKeys, SeedGraph, UserRef};
pub use store::{Loaded, Store};

use fanout_console::Console;
use fanout_console::renderables::TreeNode;
use fanout_core::{Error, Result};
use fanout_query::Filter;
use serde::Serialize;
use std::rc::Rc;

/// The query under test: one event with its whole participant graph.
pub fn event_query(event_id: i64, mode: SplitMode) -> FetchSpec {
    FetchSpec::new("events")
        .filter(Filter::eq("event_id", event_id))
        .include("participants")
        .then_include("created_by")
        .then_include("hobbies")
        .mode(mode)
}

/// What one harness run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub mode: SplitMode,
    pub keys: SavedKeys,
    pub events: Vec<Event>,
    #[serde(skip)]
    pub statements: Vec<StatementReport>,
}

impl RunReport {
    pub fn raw_row_counts(&self) -> Vec<usize> {
        self.statements.iter().map(|s| s.row_count).collect()
    }
}

/// Open the store, seed it, and run the event query once.
///
/// The store stays alive for the duration of the call only.
#[tracing::instrument(level = "info", skip_all, fields(store = %config.store, mode = %config.split_mode))]
pub fn run(config: &HarnessConfig, console: &Console) -> Result<RunReport> {
    let store = Store::open(&config.store)?;
    store.ensure_schema()?;
    let keys = store.save(&SeedGraph::fixture())?;
    let event_id = keys
        .events
        .first()
        .copied()
        .ok_or_else(|| Error::Custom("the seed graph produced no event".to_string()))?;

    let observer = ReplayObserver::new(&store, console);
    let diagnostics = if config.diagnostics {
        Diagnostics::Armed(&observer)
    } else {
        Diagnostics::Disarmed
    };

    let loaded = store.query(&event_query(event_id, config.split_mode), diagnostics)?;
    tracing::info!(
        statements = loaded.statements.len(),
        events = loaded.events.len(),
        "query complete"
    );
    Ok(RunReport {
        mode: config.split_mode,
        keys,
        events: loaded.events,
        statements: loaded.statements,
    })
}

/// Tree of the materialized events down to hobbies.
pub fn summary_tree(events: &[Event]) -> TreeNode {
    let mut root = TreeNode::new(format!("{} event(s)", events.len()));
    for event in events {
        let mut event_node = TreeNode::new(format!("{} (#{})", event.event_name, event.event_id));
        for participant in &event.participants {
            let mut participant_node = TreeNode::new(format!(
                "{} (#{})",
                participant.participant_name, participant.participant_id
            ));
            if let Some(user) = &participant.created_by {
                let shared = Rc::strong_count(user);
                let mut user_node = TreeNode::new(if shared > 1 {
                    format!(
                        "created by {} (#{}, shared by {shared})",
                        user.user_name, user.user_id
                    )
                } else {
                    format!("created by {} (#{})", user.user_name, user.user_id)
                });
                for hobby in &user.hobbies {
                    user_node = user_node.child(TreeNode::new(format!(
                        "{} (#{})",
                        hobby.hobby_name, hobby.hobby_id
                    )));
                }
                participant_node = participant_node.child(user_node);
            }
            event_node = event_node.child(participant_node);
        }
        root = root.child(event_node);
    }
    root
}

/// Print the materialized graph and the per-statement row counts.
pub fn print_summary(console: &Console, report: &RunReport) {
    if console.is_json() {
        let payload = serde_json::json!({
            "mode": report.mode,
            "events": report.events,
            "raw_row_counts": report.raw_row_counts(),
        });
        if let Err(e) = console.print_json(&payload) {
            tracing::warn!(error = %e, "could not serialize run summary");
        }
        return;
    }

    console.print(&format!("Materialized ({} mode):", report.mode));
    console.tree(&summary_tree(&report.events));
    console.newline();
    for (index, statement) in report.statements.iter().enumerate() {
        console.print(&format!(
            "statement {}: {} raw row(s) in {}ms",
            index + 1,
            statement.row_count,
            statement.elapsed.as_millis()
        ));
    }
}
