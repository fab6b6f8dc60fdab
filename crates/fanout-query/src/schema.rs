//! CREATE TABLE generation and schema verification.

use fanout_core::{Catalog, Connection, Error, FieldInfo, Result, SchemaError, SchemaErrorKind, TableInfo};

/// Build the `CREATE TABLE IF NOT EXISTS` statement for `table`.
pub fn create_table_sql(table: &TableInfo) -> String {
    let mut column_defs = Vec::new();
    let mut constraints = Vec::new();

    for field in table.fields {
        column_defs.push(column_definition(field));

        if let Some((target, column)) = field.foreign_key_parts() {
            constraints.push(format!(
                "CONSTRAINT fk_{}_{} FOREIGN KEY ({}) REFERENCES {}({})",
                table.name, field.column_name, field.column_name, target, column
            ));
        }
    }

    let all_parts: Vec<_> = column_defs.into_iter().chain(constraints).collect();
    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n  {}\n)",
        table.name,
        all_parts.join(",\n  ")
    )
}

fn column_definition(field: &FieldInfo) -> String {
    let mut def = format!("{} {}", field.column_name, field.sql_type.sql_name());
    if !field.nullable {
        def.push_str(" NOT NULL");
    }
    if field.primary_key {
        def.push_str(" PRIMARY KEY AUTOINCREMENT");
    }
    def
}

/// A column as reported by `PRAGMA table_info`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescription {
    pub name: String,
    pub sql_type: String,
    pub primary_key: bool,
}

impl ColumnDescription {
    fn expected(field: &FieldInfo) -> Self {
        Self {
            name: field.column_name.to_string(),
            sql_type: field.sql_type.sql_name().to_string(),
            primary_key: field.primary_key,
        }
    }
}

/// Read the live column list of `table`.
pub fn describe_table<C: Connection>(conn: &C, table: &str) -> Result<Vec<ColumnDescription>> {
    let rows = conn.query(&format!("PRAGMA table_info({table})"), &[])?;
    rows.iter()
        .map(|row| {
            Ok(ColumnDescription {
                name: row.get_named("name")?,
                sql_type: row.get_named::<String>("type")?.to_ascii_uppercase(),
                primary_key: row.get_named::<i64>("pk")? > 0,
            })
        })
        .collect()
}

/// Create every catalog table that does not exist yet, then check that each
/// table's columns match its definition.
///
/// Running it again is a no-op. A pre-existing table with different columns
/// is a [`SchemaErrorKind::Conflict`].
#[tracing::instrument(level = "debug", skip_all)]
pub fn ensure_schema<C: Connection>(conn: &C, catalog: &Catalog) -> Result<()> {
    for table in catalog.tables() {
        let ddl = create_table_sql(table);
        conn.execute_raw(&ddl).map_err(|e| {
            Error::Schema(SchemaError {
                kind: SchemaErrorKind::Ddl,
                table: Some(table.name.to_string()),
                message: e.to_string(),
            })
        })?;

        let actual = describe_table(conn, table.name)?;
        let expected: Vec<_> = table.fields.iter().map(ColumnDescription::expected).collect();
        if actual != expected {
            tracing::warn!(table = table.name, "existing table does not match its definition");
            return Err(Error::Schema(SchemaError {
                kind: SchemaErrorKind::Conflict,
                table: Some(table.name.to_string()),
                message: format!(
                    "expected columns ({}) but found ({})",
                    summarize(&expected),
                    summarize(&actual)
                ),
            }));
        }
        tracing::trace!(table = table.name, "table verified");
    }
    Ok(())
}

fn summarize(columns: &[ColumnDescription]) -> String {
    columns
        .iter()
        .map(|c| format!("{} {}", c.name, c.sql_type))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_catalog::{CATALOG, PARTICIPANTS};
    use fanout_sqlite::SqliteConnection;

    #[test]
    fn ddl_declares_keys_and_references() {
        let sql = create_table_sql(&PARTICIPANTS);
        assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS participants ("));
        assert!(sql.contains("participant_id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT"));
        assert!(sql.contains("participant_name TEXT NOT NULL"));
        assert!(sql.contains(
            "CONSTRAINT fk_participants_created_by_id FOREIGN KEY (created_by_id) REFERENCES users(user_id)"
        ));
    }

    #[test]
    fn ensure_schema_is_idempotent() {
        let conn = SqliteConnection::open_memory().unwrap();
        ensure_schema(&conn, &CATALOG).unwrap();
        ensure_schema(&conn, &CATALOG).unwrap();
        let columns = describe_table(&conn, "hobbies").unwrap();
        assert_eq!(columns.len(), 3);
        assert!(columns[0].primary_key);
    }

    #[test]
    fn conflicting_table_is_a_schema_error() {
        let conn = SqliteConnection::open_memory().unwrap();
        conn.execute_raw("CREATE TABLE users (user_id INTEGER PRIMARY KEY, email TEXT)")
            .unwrap();
        let err = ensure_schema(&conn, &CATALOG).unwrap_err();
        match err {
            Error::Schema(e) => {
                assert_eq!(e.kind, SchemaErrorKind::Conflict);
                assert_eq!(e.table.as_deref(), Some("users"));
                assert!(e.message.contains("email"));
            }
            other => panic!("expected schema error, got {other:?}"),
        }
    }
}
