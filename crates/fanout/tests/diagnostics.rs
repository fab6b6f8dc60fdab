use fanout::{Diagnostics, HarnessConfig, ReplayObserver, SeedGraph, SplitMode, Store, event_query};
use fanout_console::{Console, OutputMode};
use fanout_core::Value;
use fanout_query::{CommandExecuted, StatementObserver};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

fn unique_store() -> String {
    static NEXT: AtomicUsize = AtomicUsize::new(0);
    format!("diagnostics_{}", NEXT.fetch_add(1, Ordering::Relaxed))
}

fn seeded_store() -> (Store, i64) {
    let store = Store::open(&unique_store()).expect("open store");
    store.ensure_schema().expect("create schema");
    let keys = store.save(&SeedGraph::fixture()).expect("seed fixture");
    (store, keys.events[0])
}

#[test]
fn armed_observer_prints_one_table_per_statement() {
    let (store, event_id) = seeded_store();
    let (console, captured) = Console::capture(OutputMode::Plain);
    let observer = ReplayObserver::new(&store, &console);

    store
        .query(
            &event_query(event_id, SplitMode::PerRelation),
            Diagnostics::Armed(&observer),
        )
        .unwrap();

    let out = captured.stdout();
    assert_eq!(out.matches("Results:").count(), 4);
    assert_eq!(out.matches("Executed statement (").count(), 4);
    for count in [" Count: 1", " Count: 2", " Count: 3"] {
        assert!(out.contains(count), "missing {count:?} in\n{out}");
    }
    assert!(captured.stderr().is_empty());
}

#[test]
fn statement_block_layout() {
    let (store, event_id) = seeded_store();
    let (console, captured) = Console::capture(OutputMode::Plain);
    let observer = ReplayObserver::new(&store, &console);

    let root_only = fanout_query::FetchSpec::new("events")
        .filter(fanout_query::Filter::eq("event_id", event_id))
        .mode(SplitMode::PerRelation);
    store
        .query(&root_only, Diagnostics::Armed(&observer))
        .unwrap();

    let out = captured.stdout();
    let (header, rest) = out.split_once('\n').unwrap();
    assert!(header.starts_with("Executed statement ("));
    assert!(header.ends_with(&format!("ms) [Parameters=[?1={event_id}]]")));

    let expected = format!(
        "\
SELECT event_id, event_name FROM events WHERE event_id = ?1 ORDER BY event_id

Results:
+----------+------------+
| event_id | event_name |
+----------+------------+
| {event_id:<8} | Event 1    |
+----------+------------+

 Count: 1

"
    );
    assert_eq!(rest, expected);
}

#[test]
fn combined_statement_replays_all_six_rows() {
    let (store, event_id) = seeded_store();
    let (console, captured) = Console::capture(OutputMode::Plain);
    let observer = ReplayObserver::new(&store, &console);

    store
        .query(
            &event_query(event_id, SplitMode::Combined),
            Diagnostics::Armed(&observer),
        )
        .unwrap();

    let out = captured.stdout();
    assert_eq!(out.matches("Results:").count(), 1);
    assert!(out.contains("events__event_name"));
    assert!(out.contains("hobbies__hobby_name"));
    assert!(out.contains(" Count: 6"));
    assert_eq!(out.matches("| Participant 1 ").count(), 3);
}

#[test]
fn disarmed_diagnostics_print_nothing() {
    let (store, event_id) = seeded_store();
    let (_console, captured) = Console::capture(OutputMode::Plain);

    for mode in [SplitMode::Combined, SplitMode::PerRelation] {
        store
            .query(&event_query(event_id, mode), Diagnostics::Disarmed)
            .unwrap();
    }

    assert!(captured.stdout().is_empty());
    assert!(captured.stderr().is_empty());
}

#[test]
fn replay_failure_is_isolated() {
    let (store, _) = seeded_store();
    let (console, captured) = Console::capture(OutputMode::Plain);
    let observer = ReplayObserver::new(&store, &console);

    observer.on_executed(&CommandExecuted {
        sql: "SELECT * FROM no_such_table",
        params: &[],
        row_count: 0,
        elapsed: Duration::ZERO,
    });

    assert!(captured.stdout().is_empty());
    let err = captured.stderr();
    assert!(err.starts_with("could not replay statement:"), "{err}");
    assert!(err.contains("no_such_table"));
}

#[test]
fn replay_rebinds_parameters() {
    let (store, _) = seeded_store();
    let (console, captured) = Console::capture(OutputMode::Plain);
    let observer = ReplayObserver::new(&store, &console);

    observer.on_executed(&CommandExecuted {
        sql: "SELECT hobby_name FROM hobbies WHERE hobby_name = ?1",
        params: &[Value::Text("Beatboxing".into())],
        row_count: 1,
        elapsed: Duration::ZERO,
    });

    let out = captured.stdout();
    assert!(out.contains("[Parameters=[?1='Beatboxing']]"));
    assert!(out.contains("| Beatboxing |"));
    assert!(out.contains(" Count: 1"));
}

#[test]
fn json_mode_writes_one_object_per_statement() {
    let (store, event_id) = seeded_store();
    let (console, captured) = Console::capture(OutputMode::Json);
    let observer = ReplayObserver::new(&store, &console);

    store
        .query(
            &event_query(event_id, SplitMode::PerRelation),
            Diagnostics::Armed(&observer),
        )
        .unwrap();

    let counts: Vec<u64> = captured
        .stdout()
        .lines()
        .map(|line| {
            let value: serde_json::Value = serde_json::from_str(line).unwrap();
            assert!(value["sql"].as_str().unwrap().starts_with("SELECT "));
            value["count"].as_u64().unwrap()
        })
        .collect();
    assert_eq!(counts, [1, 2, 1, 3]);
}

#[test]
fn run_prints_transcript_then_summary() {
    let config = HarnessConfig::default()
        .store(unique_store())
        .split_mode(SplitMode::Combined)
        .output(OutputMode::Plain);
    let (console, captured) = Console::capture(config.output);

    let report = fanout::run(&config, &console).unwrap();
    fanout::print_summary(&console, &report);

    assert_eq!(report.raw_row_counts(), [6]);
    let out = captured.stdout();
    let results = out.find("Results:").unwrap();
    let summary = out.find("Materialized (combined mode):").unwrap();
    assert!(results < summary);
    assert!(out.contains("created by User 1 (#1, shared by 2)"));
    assert!(out.contains("statement 1: 6 raw row(s)"));
}

#[test]
fn run_without_diagnostics_prints_only_the_summary() {
    let config = HarnessConfig::default()
        .store(unique_store())
        .diagnostics(false)
        .output(OutputMode::Plain);
    let (console, captured) = Console::capture(config.output);

    let report = fanout::run(&config, &console).unwrap();
    assert_eq!(report.raw_row_counts(), [1, 2, 1, 3]);
    assert!(captured.stdout().is_empty());

    fanout::print_summary(&console, &report);
    assert!(!captured.stdout().contains("Results:"));
}

#[test]
fn replay_reaches_stores_with_escaped_names() {
    let config = HarnessConfig::default()
        .store(format!("%00{}", unique_store()))
        .split_mode(SplitMode::Combined)
        .output(OutputMode::Plain);
    let (console, captured) = Console::capture(config.output);

    let report = fanout::run(&config, &console).unwrap();
    assert_eq!(report.raw_row_counts(), [6]);
    assert!(captured.stderr().is_empty(), "{}", captured.stderr());
    assert!(captured.stdout().contains(" Count: 6"));
}
