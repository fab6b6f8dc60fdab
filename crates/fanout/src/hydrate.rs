//! Turning a fetched [`RowGraph`] into [`Event`] values.
//!
//! Users are built once per key and shared through `Rc`, so participants
//! created by the same user point at the same allocation.

use crate::entities::{Event, Hobby, Participant, User};
use fanout_core::{Model, Result};
use fanout_query::RowGraph;
use std::collections::HashMap;
use std::rc::Rc;

/// Materialize the root events with whatever relationships were fetched.
pub fn events(graph: &RowGraph) -> Result<Vec<Event>> {
    let participants = graph.child_node(0, "participants");
    let users = participants.and_then(|p| graph.child_node(p, "created_by"));
    let hobbies = users.and_then(|u| graph.child_node(u, "hobbies"));

    let mut shared: HashMap<i64, Rc<User>> = HashMap::new();
    if let Some(node) = users.and_then(|u| graph.node(u)) {
        for (user_id, row) in node.rows() {
            let mut user = User::from_row(row)?;
            if let Some(hobbies) = hobbies {
                user.hobbies = graph
                    .children(hobbies, user_id)
                    .map(|(_, row)| Hobby::from_row(row))
                    .collect::<Result<_>>()?;
            }
            shared.insert(user_id, Rc::new(user));
        }
    }

    graph
        .roots()
        .map(|(event_id, row)| -> Result<Event> {
            let mut event = Event::from_row(row)?;
            if let Some(participants) = participants {
                event.participants = graph
                    .children(participants, event_id)
                    .map(|(participant_id, row)| -> Result<Participant> {
                        let mut participant = Participant::from_row(row)?;
                        participant.created_by = users
                            .and_then(|u| graph.children(u, participant_id).next())
                            .and_then(|(user_id, _)| shared.get(&user_id).cloned());
                        Ok(participant)
                    })
                    .collect::<Result<_>>()?;
            }
            Ok(event)
        })
        .collect()
}
