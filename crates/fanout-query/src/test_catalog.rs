//! Event/participant/user/hobby tables shared by this crate's unit tests.

use fanout_core::{Catalog, FieldInfo, RelationshipInfo, SqlType, TableInfo};

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
    relationships: &[RelationshipInfo::many_to_one(
        "created_by",
        "users",
        "created_by_id",
        "user_id",
    )],
};

pub const HOBBIES: TableInfo = TableInfo {
    name: "hobbies",
    primary_key: "hobby_id",
    fields: &[
        FieldInfo::new("hobby_id", SqlType::Integer).primary_key(),
        FieldInfo::new("hobby_name", SqlType::Text),
        FieldInfo::new("user_id", SqlType::Integer).references("users.user_id"),
    ],
    relationships: &[RelationshipInfo::many_to_one(
        "owner", "users", "user_id", "user_id",
    )],
};

pub static CATALOG: Catalog = Catalog::new(&[&EVENTS, &USERS, &PARTICIPANTS, &HOBBIES]);
