//! The harness store: one named shared-cache in-memory SQLite database.

use crate::entities::{CATALOG, Event};
use crate::hydrate;
use crate::seed::{SavedKeys, SeedGraph, UserRef};
use fanout_core::{
    Connection, ConstraintKind, ConstraintViolation, Error, Model, Result, TransactionOps,
};
use fanout_query::{Diagnostics, FetchSpec, RowGraph, StatementReport, ensure_schema};
use fanout_sqlite::{SqliteConfig, SqliteConnection};

/// Materialized events plus every statement that produced them.
#[derive(Debug, Clone)]
pub struct Loaded {
    pub events: Vec<Event>,
    pub statements: Vec<StatementReport>,
    pub graph: RowGraph,
}

impl Loaded {
    /// Raw row counts in statement order.
    pub fn raw_row_counts(&self) -> Vec<usize> {
        self.statements.iter().map(|s| s.row_count).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Event> {
        self.events.iter()
    }
}

impl IntoIterator for Loaded {
    type Item = Event;
    type IntoIter = std::vec::IntoIter<Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.into_iter()
    }
}

/// Owns the primary connection. The database lives as long as some
/// connection to its name is open.
pub struct Store {
    name: String,
    config: SqliteConfig,
    conn: SqliteConnection,
}

impl Store {
    /// Open (or attach to) the named in-memory store.
    #[tracing::instrument(level = "debug")]
    pub fn open(name: &str) -> Result<Self> {
        let config = SqliteConfig::shared_memory(name);
        let conn = SqliteConnection::open(&config)?;
        tracing::info!(store = name, "store opened");
        Ok(Self {
            name: name.to_string(),
            config,
            conn,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn connection(&self) -> &SqliteConnection {
        &self.conn
    }

    /// Open another independent connection to the same database.
    pub fn connect_again(&self) -> Result<SqliteConnection> {
        SqliteConnection::open(&self.config)
    }

    /// Create missing tables and verify existing ones.
    pub fn ensure_schema(&self) -> Result<()> {
        ensure_schema(&self.conn, &CATALOG)
    }

    /// Insert `graph` in one transaction and return the assigned keys.
    ///
    /// Nothing is kept when any insert fails.
    #[tracing::instrument(level = "debug", skip_all, fields(store = %self.name))]
    pub fn save(&self, graph: &SeedGraph) -> Result<SavedKeys> {
        let tx = self.conn.begin()?;
        let mut keys = SavedKeys::default();

        for user in graph.users() {
            let user_id = tx
                .insert(
                    "INSERT INTO users (user_name) VALUES (?1)",
                    &[user.name.as_str().into()],
                )
                .map_err(in_table("users"))?;
            keys.users.push(user_id);
            for hobby in &user.hobbies {
                let hobby_id = tx
                    .insert(
                        "INSERT INTO hobbies (hobby_name, user_id) VALUES (?1, ?2)",
                        &[hobby.as_str().into(), user_id.into()],
                    )
                    .map_err(in_table("hobbies"))?;
                keys.hobbies.push(hobby_id);
            }
        }

        for event in graph.events() {
            let event_id = tx
                .insert(
                    "INSERT INTO events (event_name) VALUES (?1)",
                    &[event.name.as_str().into()],
                )
                .map_err(in_table("events"))?;
            keys.events.push(event_id);
            for participant in &event.participants {
                let created_by_id = match participant.created_by {
                    UserRef::Existing(user_id) => user_id,
                    UserRef::Seeded(index) => {
                        keys.users.get(index).copied().ok_or_else(|| {
                            Error::Constraint(ConstraintViolation {
                                kind: ConstraintKind::ForeignKey,
                                table: Some("participants".to_string()),
                                sql: None,
                                message: format!(
                                    "participant '{}' refers to seeded user #{index}, but the graph has {} users",
                                    participant.name,
                                    keys.users.len()
                                ),
                            })
                        })?
                    }
                };
                let participant_id = tx
                    .insert(
                        "INSERT INTO participants (participant_name, event_id, created_by_id) VALUES (?1, ?2, ?3)",
                        &[
                            participant.name.as_str().into(),
                            event_id.into(),
                            created_by_id.into(),
                        ],
                    )
                    .map_err(in_table("participants"))?;
                keys.participants.push(participant_id);
            }
        }

        tx.commit()?;
        tracing::debug!(
            users = keys.users.len(),
            hobbies = keys.hobbies.len(),
            events = keys.events.len(),
            participants = keys.participants.len(),
            "seed graph saved"
        );
        Ok(keys)
    }

    /// Run an eager fetch rooted at `events` and materialize the result.
    pub fn query(&self, spec: &FetchSpec, diagnostics: Diagnostics<'_>) -> Result<Loaded> {
        if spec.root() != Event::TABLE.name {
            return Err(Error::malformed(format!(
                "the store materializes '{}' roots, not '{}'",
                Event::TABLE.name,
                spec.root()
            )));
        }
        let fetched = fanout_query::fetch(&self.conn, &CATALOG, spec, diagnostics)?;
        let events = hydrate::events(&fetched.graph)?;
        Ok(Loaded {
            events,
            statements: fetched.statements,
            graph: fetched.graph,
        })
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store").field("name", &self.name).finish()
    }
}

/// Attach the table name to constraint violations reported by SQLite.
fn in_table(table: &'static str) -> impl FnOnce(Error) -> Error {
    move |err| match err {
        Error::Constraint(mut violation) => {
            violation.table.get_or_insert_with(|| table.to_string());
            Error::Constraint(violation)
        }
        other => other,
    }
}
