//! The seed graph handed to [`Store::save`](crate::store::Store::save).
//!
//! Users live in an arena and participants refer to them through
//! [`UserRef`] handles, so one user can be the creator of any number of
//! participants without cloning it.

use serde::Serialize;

/// Reference to the user who created a participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserRef {
    /// The n-th user added to the same [`SeedGraph`].
    Seeded(usize),
    /// A user row that already exists in the store, by key.
    Existing(i64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub hobbies: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewParticipant {
    pub name: String,
    pub created_by: UserRef,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEvent {
    pub name: String,
    pub participants: Vec<NewParticipant>,
}

/// Unsaved events, participants, users and hobbies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedGraph {
    users: Vec<NewUser>,
    events: Vec<NewEvent>,
}

impl SeedGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// One event, two participants created by the same user, who has three
    /// hobbies.
    pub fn fixture() -> Self {
        let mut graph = Self::new();
        let user = graph.add_user("User 1", ["Crocheting", "Beatboxing", "Witchcraft"]);
        graph.add_event(
            "Event 1",
            [("Participant 1", user), ("Participant 2", user)],
        );
        graph
    }

    /// Add a user with its hobbies and return a handle to it.
    pub fn add_user<I, S>(&mut self, name: impl Into<String>, hobbies: I) -> UserRef
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.users.push(NewUser {
            name: name.into(),
            hobbies: hobbies.into_iter().map(Into::into).collect(),
        });
        UserRef::Seeded(self.users.len() - 1)
    }

    /// Add an event with `(participant name, creator)` pairs.
    pub fn add_event<I, S>(&mut self, name: impl Into<String>, participants: I)
    where
        I: IntoIterator<Item = (S, UserRef)>,
        S: Into<String>,
    {
        self.events.push(NewEvent {
            name: name.into(),
            participants: participants
                .into_iter()
                .map(|(name, created_by)| NewParticipant {
                    name: name.into(),
                    created_by,
                })
                .collect(),
        });
    }

    pub fn users(&self) -> &[NewUser] {
        &self.users
    }

    pub fn events(&self) -> &[NewEvent] {
        &self.events
    }
}

/// Keys assigned by the store, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SavedKeys {
    pub users: Vec<i64>,
    pub hobbies: Vec<i64>,
    pub events: Vec<i64>,
    pub participants: Vec<i64>,
}
