//! Resolving a [`FetchSpec`] against a [`Catalog`] and generating SQL.
//!
//! Every included relationship becomes a [`PlanNode`]. Nodes are stored in
//! pre-order, so a node's parent always has a smaller index.

use crate::fetch::{FetchSpec, SplitMode};
use fanout_core::{
    Catalog, Error, FieldInfo, RelationshipInfo, RelationshipKind, Result, TableInfo, Value,
};

/// One table reached by the fetch.
#[derive(Debug, Clone)]
pub struct PlanNode {
    pub table: &'static TableInfo,
    /// Name used to qualify and prefix this node's columns in joined SQL.
    pub alias: String,
    /// Relationship followed from the parent; `None` for the root.
    pub relation: Option<&'static RelationshipInfo>,
    pub parent: Option<usize>,
}

/// SQL text plus positional bindings.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedStatement {
    pub sql: String,
    pub params: Vec<Value>,
}

/// A validated fetch.
#[derive(Debug, Clone)]
pub struct FetchPlan {
    nodes: Vec<PlanNode>,
    filter: Option<(&'static FieldInfo, Value)>,
    mode: SplitMode,
}

impl FetchPlan {
    /// Validate `spec` against `catalog`.
    ///
    /// Every defect is a malformed-query error: builder misuse, an unknown
    /// root table, an unknown filter column, an empty include segment, an
    /// include chain whose first relationship was already included, or a
    /// relationship name the table does not declare.
    pub fn resolve(catalog: &Catalog, spec: &FetchSpec) -> Result<Self> {
        if let Some(misuse) = spec.misuse() {
            return Err(Error::malformed(misuse));
        }

        let root = catalog.table(spec.root()).ok_or_else(|| {
            Error::malformed(format!("unknown root table '{}'", spec.root()))
        })?;

        let filter = match spec.filter_ref() {
            Some(filter) => {
                let field = root.field(&filter.column).ok_or_else(|| {
                    Error::malformed(format!(
                        "unknown filter column '{}' on table '{}'",
                        filter.column, root.name
                    ))
                })?;
                Some((field, filter.value.clone()))
            }
            None => None,
        };

        let mut nodes = vec![PlanNode {
            table: root,
            alias: root.name.to_string(),
            relation: None,
            parent: None,
        }];
        let mut seen_roots: Vec<&str> = Vec::new();

        for path in spec.includes() {
            let joined = path.segments().join(".");
            if path.segments().iter().any(String::is_empty) {
                return Err(Error::malformed(format!(
                    "empty segment in include path '{joined}'"
                )));
            }
            if let Some(first) = path.segments().first() {
                if seen_roots.contains(&first.as_str()) {
                    return Err(Error::malformed(format!(
                        "relationship '{first}' is included more than once"
                    )));
                }
                seen_roots.push(first);
            }

            let mut parent = 0;
            for segment in path.segments() {
                let parent_table = nodes[parent].table;
                let relation = parent_table.relationship(segment).ok_or_else(|| {
                    Error::malformed(format!(
                        "unknown relationship '{}' on table '{}'",
                        segment, parent_table.name
                    ))
                })?;
                let table = catalog.table(relation.related_table).ok_or_else(|| {
                    Error::malformed(format!(
                        "relationship '{}' targets unknown table '{}'",
                        segment, relation.related_table
                    ))
                })?;
                let alias = if nodes.iter().any(|n| n.table.name == table.name) {
                    format!("{}_{}", table.name, nodes.len())
                } else {
                    table.name.to_string()
                };
                nodes.push(PlanNode {
                    table,
                    alias,
                    relation: Some(relation),
                    parent: Some(parent),
                });
                parent = nodes.len() - 1;
            }
        }

        tracing::debug!(
            root = root.name,
            nodes = nodes.len(),
            mode = %spec.split_mode(),
            "resolved fetch plan"
        );

        Ok(Self {
            nodes,
            filter,
            mode: spec.split_mode(),
        })
    }

    pub fn nodes(&self) -> &[PlanNode] {
        &self.nodes
    }

    pub fn mode(&self) -> SplitMode {
        self.mode
    }

    /// The single joined statement loading every node.
    ///
    /// Columns are aliased `<alias>__<column>` so each node's part of a raw
    /// row can be recovered with `Row::subset_by_prefix`.
    pub fn combined_statement(&self) -> PlannedStatement {
        let columns: Vec<String> = self
            .nodes
            .iter()
            .flat_map(|node| build_aliased_column_parts(&node.alias, node.table))
            .collect();

        let root = &self.nodes[0];
        let mut sql = format!(
            "SELECT {} FROM {}",
            columns.join(", "),
            table_ref(root.table, &root.alias)
        );

        for node in &self.nodes[1..] {
            if let (Some(relation), Some(parent)) = (node.relation, node.parent) {
                sql.push_str(&build_join_clause(&self.nodes[parent].alias, node, relation));
            }
        }

        let mut params = Vec::new();
        if let Some((field, value)) = &self.filter {
            sql.push_str(&format!(
                " WHERE {}.{} = ?1",
                root.alias, field.column_name
            ));
            params.push(value.clone());
        }

        let order: Vec<String> = self
            .nodes
            .iter()
            .map(|node| format!("{}.{}", node.alias, node.table.primary_key))
            .collect();
        sql.push_str(" ORDER BY ");
        sql.push_str(&order.join(", "));

        PlannedStatement { sql, params }
    }

    /// The statement loading the root rows on their own.
    pub fn root_statement(&self) -> PlannedStatement {
        let root = self.nodes[0].table;
        let mut sql = format!("SELECT {} FROM {}", column_list(root), root.name);
        let mut params = Vec::new();
        if let Some((field, value)) = &self.filter {
            sql.push_str(&format!(" WHERE {} = ?1", field.column_name));
            params.push(value.clone());
        }
        sql.push_str(&format!(" ORDER BY {}", root.primary_key));
        PlannedStatement { sql, params }
    }

    /// The statement loading `node`'s rows whose key is one of `keys`.
    ///
    /// `keys` are the values of the relationship's local key on the parent
    /// rows: parent primary keys for one-to-many, foreign key values for
    /// many-to-one. Both are matched against the relationship's remote key.
    pub fn relation_statement(&self, node: usize, keys: &[i64]) -> Result<PlannedStatement> {
        let plan_node = self
            .nodes
            .get(node)
            .ok_or_else(|| Error::malformed(format!("no plan node {node}")))?;
        let relation = plan_node
            .relation
            .ok_or_else(|| Error::malformed("the root node has no relationship"))?;
        let table = plan_node.table;

        let placeholders: Vec<String> = (1..=keys.len()).map(|i| format!("?{i}")).collect();
        let order = match relation.kind {
            RelationshipKind::OneToMany if relation.remote_key != table.primary_key => {
                format!("{}, {}", relation.remote_key, table.primary_key)
            }
            _ => table.primary_key.to_string(),
        };

        let sql = format!(
            "SELECT {} FROM {} WHERE {} IN ({}) ORDER BY {}",
            column_list(table),
            table.name,
            relation.remote_key,
            placeholders.join(", "),
            order
        );
        let params = keys.iter().copied().map(Value::BigInt).collect();
        Ok(PlannedStatement { sql, params })
    }
}

fn column_list(table: &TableInfo) -> String {
    table.column_names().collect::<Vec<_>>().join(", ")
}

fn table_ref(table: &TableInfo, alias: &str) -> String {
    if table.name == alias {
        table.name.to_string()
    } else {
        format!("{} AS {}", table.name, alias)
    }
}

/// `<alias>.<column> AS <alias>__<column>` for every column of `table`.
pub fn build_aliased_column_parts(alias: &str, table: &TableInfo) -> Vec<String> {
    table
        .column_names()
        .map(|col| format!("{}.{} AS {}__{}", alias, col, alias, col))
        .collect()
}

/// Generate the LEFT JOIN clause reaching `node` from its parent.
fn build_join_clause(parent_alias: &str, node: &PlanNode, relation: &RelationshipInfo) -> String {
    let target = table_ref(node.table, &node.alias);
    match relation.kind {
        // LEFT JOIN related ON parent.fk = related.pk
        RelationshipKind::ManyToOne => format!(
            " LEFT JOIN {} ON {}.{} = {}.{}",
            target, parent_alias, relation.local_key, node.alias, relation.remote_key
        ),
        // LEFT JOIN related ON related.fk = parent.pk
        RelationshipKind::OneToMany => format!(
            " LEFT JOIN {} ON {}.{} = {}.{}",
            target, node.alias, relation.remote_key, parent_alias, relation.local_key
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::Filter;
    use crate::test_catalog::CATALOG;

    fn event_spec() -> FetchSpec {
        FetchSpec::new("events")
            .filter(Filter::eq("event_id", 1_i64))
            .include("participants")
            .then_include("created_by")
            .then_include("hobbies")
    }

    #[test]
    fn resolves_chain_in_preorder() {
        let plan = FetchPlan::resolve(&CATALOG, &event_spec()).unwrap();
        let tables: Vec<_> = plan.nodes().iter().map(|n| n.table.name).collect();
        assert_eq!(tables, ["events", "participants", "users", "hobbies"]);
        let parents: Vec<_> = plan.nodes().iter().map(|n| n.parent).collect();
        assert_eq!(parents, [None, Some(0), Some(1), Some(2)]);
    }

    #[test]
    fn combined_statement_joins_every_level() {
        let plan = FetchPlan::resolve(&CATALOG, &event_spec()).unwrap();
        let stmt = plan.combined_statement();
        assert!(stmt.sql.starts_with("SELECT events.event_id AS events__event_id"));
        assert!(stmt.sql.contains(
            " FROM events LEFT JOIN participants ON participants.event_id = events.event_id"
        ));
        assert!(stmt
            .sql
            .contains(" LEFT JOIN users ON participants.created_by_id = users.user_id"));
        assert!(stmt
            .sql
            .contains(" LEFT JOIN hobbies ON hobbies.user_id = users.user_id"));
        assert!(stmt.sql.ends_with(
            " WHERE events.event_id = ?1 ORDER BY events.event_id, participants.participant_id, users.user_id, hobbies.hobby_id"
        ));
        assert_eq!(stmt.params, vec![Value::BigInt(1)]);
    }

    #[test]
    fn relation_statements_use_key_lists() {
        let plan = FetchPlan::resolve(&CATALOG, &event_spec()).unwrap();
        assert_eq!(
            plan.root_statement().sql,
            "SELECT event_id, event_name FROM events WHERE event_id = ?1 ORDER BY event_id"
        );
        let participants = plan.relation_statement(1, &[1]).unwrap();
        assert_eq!(
            participants.sql,
            "SELECT participant_id, participant_name, event_id, created_by_id FROM participants \
             WHERE event_id IN (?1) ORDER BY event_id, participant_id"
        );
        let users = plan.relation_statement(2, &[4, 7]).unwrap();
        assert_eq!(
            users.sql,
            "SELECT user_id, user_name FROM users WHERE user_id IN (?1, ?2) ORDER BY user_id"
        );
        assert_eq!(users.params, vec![Value::BigInt(4), Value::BigInt(7)]);
        assert!(plan.relation_statement(0, &[1]).is_err());
    }

    #[test]
    fn repeated_tables_get_distinct_aliases() {
        let spec = FetchSpec::new("users")
            .include("hobbies")
            .then_include("owner");
        let plan = FetchPlan::resolve(&CATALOG, &spec).unwrap();
        let aliases: Vec<_> = plan.nodes().iter().map(|n| n.alias.as_str()).collect();
        assert_eq!(aliases, ["users", "hobbies", "users_2"]);
        assert!(plan
            .combined_statement()
            .sql
            .contains(" LEFT JOIN users AS users_2 ON hobbies.user_id = users_2.user_id"));
    }

    #[test]
    fn malformed_specs_are_rejected() {
        let cases = [
            FetchSpec::new("tickets"),
            FetchSpec::new("events").filter(Filter::eq("ticket_id", 1_i64)),
            FetchSpec::new("events").include("sponsors"),
            FetchSpec::new("events").include_path("participants..hobbies"),
            FetchSpec::new("events")
                .include("participants")
                .include("participants"),
            FetchSpec::new("events").then_include("participants"),
        ];
        for spec in &cases {
            let err = FetchPlan::resolve(&CATALOG, spec).unwrap_err();
            assert!(err.is_malformed_query(), "{spec:?} gave {err}");
        }
    }
}
