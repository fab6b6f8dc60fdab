//! Identity-mapped rows recovered from an eager fetch.
//!
//! A [`RowGraph`] holds one node per [`PlanNode`]. Each node keeps its rows
//! keyed by primary key, so a row fetched many times (the joined statement
//! repeats parents once per child) is stored once. Parent-to-child links are
//! derived from foreign key columns after all rows are in, the same way in
//! every split mode.

use crate::plan::{FetchPlan, PlanNode};
use fanout_core::{RelationshipInfo, RelationshipKind, Result, Row, TableInfo};
use std::collections::{BTreeMap, BTreeSet};

/// Rows of one table reached by the fetch.
#[derive(Debug, Clone)]
pub struct GraphNode {
    pub table: &'static TableInfo,
    pub relation: Option<&'static RelationshipInfo>,
    pub parent: Option<usize>,
    rows: BTreeMap<i64, Row>,
    /// parent primary key -> child primary keys, ascending
    links: BTreeMap<i64, Vec<i64>>,
}

impl GraphNode {
    fn new(node: &PlanNode) -> Self {
        Self {
            table: node.table,
            relation: node.relation,
            parent: node.parent,
            rows: BTreeMap::new(),
            links: BTreeMap::new(),
        }
    }

    /// Distinct rows in primary key order.
    pub fn rows(&self) -> impl Iterator<Item = (i64, &Row)> {
        self.rows.iter().map(|(pk, row)| (*pk, row))
    }

    pub fn row(&self, pk: i64) -> Option<&Row> {
        self.rows.get(&pk)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Primary keys of the rows linked under `parent_pk`.
    pub fn children_of(&self, parent_pk: i64) -> &[i64] {
        self.links.get(&parent_pk).map_or(&[][..], Vec::as_slice)
    }
}

/// De-duplicated rows of every node in a fetch plan.
#[derive(Debug, Clone)]
pub struct RowGraph {
    nodes: Vec<GraphNode>,
}

impl RowGraph {
    pub(crate) fn new(plan: &FetchPlan) -> Self {
        Self {
            nodes: plan.nodes().iter().map(GraphNode::new).collect(),
        }
    }

    /// Record a row for `node`. Rows whose primary key is NULL (an unmatched
    /// LEFT JOIN) are ignored. Returns `true` when the key was new.
    pub(crate) fn insert(&mut self, node: usize, row: Row) -> Result<bool> {
        let entry = &mut self.nodes[node];
        let pk: Option<i64> = row.get_named(entry.table.primary_key)?;
        match pk {
            Some(pk) if !entry.rows.contains_key(&pk) => {
                entry.rows.insert(pk, row);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Distinct non-NULL values of `column` across `node`'s rows.
    pub(crate) fn distinct_keys(&self, node: usize, column: &str) -> Result<Vec<i64>> {
        let mut keys = BTreeSet::new();
        for row in self.nodes[node].rows.values() {
            if let Some(key) = row.get_named::<Option<i64>>(column)? {
                keys.insert(key);
            }
        }
        Ok(keys.into_iter().collect())
    }

    /// Attach every child row to its parent by matching foreign keys.
    pub(crate) fn link(&mut self) -> Result<()> {
        for index in 1..self.nodes.len() {
            let (Some(parent), Some(relation)) =
                (self.nodes[index].parent, self.nodes[index].relation)
            else {
                continue;
            };

            let mut links: BTreeMap<i64, Vec<i64>> = BTreeMap::new();
            let child = &self.nodes[index];
            let parent_node = &self.nodes[parent];
            match relation.kind {
                RelationshipKind::OneToMany => {
                    for (child_pk, row) in child.rows() {
                        let Some(fk) = row.get_named::<Option<i64>>(relation.remote_key)? else {
                            continue;
                        };
                        if parent_node.rows.contains_key(&fk) {
                            links.entry(fk).or_default().push(child_pk);
                        }
                    }
                }
                RelationshipKind::ManyToOne => {
                    for (parent_pk, row) in parent_node.rows() {
                        let Some(fk) = row.get_named::<Option<i64>>(relation.local_key)? else {
                            continue;
                        };
                        if child.rows.contains_key(&fk) {
                            links.entry(parent_pk).or_default().push(fk);
                        }
                    }
                }
            }
            self.nodes[index].links = links;
        }
        Ok(())
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn node(&self, index: usize) -> Option<&GraphNode> {
        self.nodes.get(index)
    }

    /// The root node's rows in primary key order.
    pub fn roots(&self) -> impl Iterator<Item = (i64, &Row)> {
        self.nodes.iter().take(1).flat_map(GraphNode::rows)
    }

    /// Index of the node reached from `parent` through `relation`.
    pub fn child_node(&self, parent: usize, relation: &str) -> Option<usize> {
        self.nodes
            .iter()
            .position(|n| n.parent == Some(parent) && n.relation.is_some_and(|r| r.name == relation))
    }

    /// Rows of `node` linked under the parent row `parent_pk`.
    pub fn children(&self, node: usize, parent_pk: i64) -> impl Iterator<Item = (i64, &Row)> {
        let entry = self.nodes.get(node);
        entry
            .map(|n| n.children_of(parent_pk))
            .unwrap_or(&[])
            .iter()
            .filter_map(move |pk| entry.and_then(|n| n.row(*pk)).map(|row| (*pk, row)))
    }

    /// Number of distinct rows per node, in plan order.
    pub fn row_counts(&self) -> Vec<(&'static str, usize)> {
        self.nodes.iter().map(|n| (n.table.name, n.len())).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::FetchSpec;
    use crate::test_catalog::CATALOG;
    use fanout_core::Value;

    fn row(names: &[&str], values: Vec<Value>) -> Row {
        Row::new(names.iter().map(|s| (*s).to_string()).collect(), values)
    }

    fn chain_graph() -> RowGraph {
        let spec = FetchSpec::new("events")
            .include("participants")
            .then_include("created_by");
        RowGraph::new(&FetchPlan::resolve(&CATALOG, &spec).unwrap())
    }

    #[test]
    fn identity_map_keeps_first_row_per_key() {
        let mut graph = chain_graph();
        let names = ["event_id", "event_name"];
        assert!(graph
            .insert(0, row(&names, vec![Value::BigInt(1), "Event 1".into()]))
            .unwrap());
        assert!(!graph
            .insert(0, row(&names, vec![Value::BigInt(1), "Event 1".into()]))
            .unwrap());
        assert!(!graph
            .insert(0, row(&names, vec![Value::Null, Value::Null]))
            .unwrap());
        assert_eq!(graph.nodes()[0].len(), 1);
    }

    #[test]
    fn links_follow_foreign_keys() {
        let mut graph = chain_graph();
        graph
            .insert(0, row(&["event_id", "event_name"], vec![Value::BigInt(1), "Event 1".into()]))
            .unwrap();
        let participant = ["participant_id", "participant_name", "event_id", "created_by_id"];
        for id in [2_i64, 1] {
            graph
                .insert(
                    1,
                    row(
                        &participant,
                        vec![
                            Value::BigInt(id),
                            format!("Participant {id}").into(),
                            Value::BigInt(1),
                            Value::BigInt(9),
                        ],
                    ),
                )
                .unwrap();
        }
        graph
            .insert(2, row(&["user_id", "user_name"], vec![Value::BigInt(9), "User 1".into()]))
            .unwrap();
        graph.link().unwrap();

        let participants: Vec<i64> = graph.children(1, 1).map(|(pk, _)| pk).collect();
        assert_eq!(participants, [1, 2]);
        for pk in participants {
            let users: Vec<i64> = graph.children(2, pk).map(|(pk, _)| pk).collect();
            assert_eq!(users, [9]);
        }
        assert_eq!(graph.child_node(1, "created_by"), Some(2));
        assert_eq!(graph.child_node(0, "created_by"), None);
        assert_eq!(graph.distinct_keys(1, "created_by_id").unwrap(), [9]);
        assert_eq!(
            graph.row_counts(),
            [("events", 1), ("participants", 2), ("users", 1)]
        );
    }
}
