//! The four entities of the fan-out graph and their table metadata.
//!
//! ```text
//! events 1--* participants *--1 users 1--* hobbies
//! ```
//!
//! Several participants may share one creating user. After materialization
//! they hold clones of the same `Rc<User>`.

use fanout_core::{Catalog, FieldInfo, Model, RelationshipInfo, Result, Row, SqlType, TableInfo};
use serde::Serialize;
use std::rc::Rc;

pub const EVENTS: TableInfo = TableInfo {
    name: "events",
    primary_key: "event_id",
    fields: &[
        FieldInfo::new("event_id", SqlType::Integer).primary_key(),
        FieldInfo::new("event_name", SqlType::Text),
    ],
    relationships: &[RelationshipInfo::one_to_many(
        "participants",
        "participants",
        "event_id",
        "event_id",
    )],
};

pub const USERS: TableInfo = TableInfo {
    name: "users",
    primary_key: "user_id",
    fields: &[
        FieldInfo::new("user_id", SqlType::Integer).primary_key(),
        FieldInfo::new("user_name", SqlType::Text),
    ],
    relationships: &[RelationshipInfo::one_to_many(
        "hobbies", "hobbies", "user_id", "user_id",
    )],
};

pub const PARTICIPANTS: TableInfo = TableInfo {
    name: "participants",
    primary_key: "participant_id",
    fields: &[
        FieldInfo::new("participant_id", SqlType::Integer).primary_key(),
        FieldInfo::new("participant_name", SqlType::Text),
        FieldInfo::new("event_id", SqlType::Integer).references("events.event_id"),
        FieldInfo::new("created_by_id", SqlType::Integer).references("users.user_id"),
    ],
    relationships: &[
        RelationshipInfo::many_to_one("event", "events", "event_id", "event_id"),
        RelationshipInfo::many_to_one("created_by", "users", "created_by_id", "user_id"),
    ],
};

pub const HOBBIES: TableInfo = TableInfo {
    name: "hobbies",
    primary_key: "hobby_id",
    fields: &[
        FieldInfo::new("hobby_id", SqlType::Integer).primary_key(),
        FieldInfo::new("hobby_name", SqlType::Text),
        FieldInfo::new("user_id", SqlType::Integer).references("users.user_id"),
    ],
    relationships: &[],
};

/// Every harness table, referenced tables first.
pub static CATALOG: Catalog = Catalog::new(&[&EVENTS, &USERS, &PARTICIPANTS, &HOBBIES]);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub event_id: i64,
    pub event_name: String,
    pub participants: Vec<Participant>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Participant {
    pub participant_id: i64,
    pub participant_name: String,
    pub event_id: i64,
    pub created_by_id: i64,
    /// Loaded only when the fetch includes `created_by`.
    pub created_by: Option<Rc<User>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub user_id: i64,
    pub user_name: String,
    pub hobbies: Vec<Hobby>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hobby {
    pub hobby_id: i64,
    pub hobby_name: String,
    pub user_id: i64,
}

impl Model for Event {
    const TABLE: &'static TableInfo = &EVENTS;

    fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            event_id: row.get_named("event_id")?,
            event_name: row.get_named("event_name")?,
            participants: Vec::new(),
        })
    }
}

impl Model for Participant {
    const TABLE: &'static TableInfo = &PARTICIPANTS;

    fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            participant_id: row.get_named("participant_id")?,
            participant_name: row.get_named("participant_name")?,
            event_id: row.get_named("event_id")?,
            created_by_id: row.get_named("created_by_id")?,
            created_by: None,
        })
    }
}

impl Model for User {
    const TABLE: &'static TableInfo = &USERS;

    fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            user_id: row.get_named("user_id")?,
            user_name: row.get_named("user_name")?,
            hobbies: Vec::new(),
        })
    }
}

impl Model for Hobby {
    const TABLE: &'static TableInfo = &HOBBIES;

    fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            hobby_id: row.get_named("hobby_id")?,
            hobby_name: row.get_named("hobby_name")?,
            user_id: row.get_named("user_id")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fanout_core::Value;

    #[test]
    fn catalog_lists_referenced_tables_first() {
        let names: Vec<&str> = CATALOG.tables().iter().map(|t| t.name).collect();
        assert_eq!(names, ["events", "users", "participants", "hobbies"]);
    }

    #[test]
    fn participant_from_row_leaves_user_unloaded() {
        let row = Row::new(
            vec![
                "participant_id".into(),
                "participant_name".into(),
                "event_id".into(),
                "created_by_id".into(),
            ],
            vec![
                Value::BigInt(2),
                Value::Text("Participant 2".into()),
                Value::BigInt(1),
                Value::BigInt(1),
            ],
        );
        let participant = Participant::from_row(&row).unwrap();
        assert_eq!(participant.participant_name, "Participant 2");
        assert_eq!(participant.created_by_id, 1);
        assert!(participant.created_by.is_none());
    }

    #[test]
    fn missing_column_is_a_type_error() {
        let row = Row::new(vec!["hobby_id".into()], vec![Value::BigInt(1)]);
        assert!(matches!(
            Hobby::from_row(&row),
            Err(fanout_core::Error::Type(_))
        ));
    }
}
