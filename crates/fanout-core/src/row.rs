//! Database row representation.

use crate::Result;
use crate::error::{Error, TypeError};
use crate::value::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Column metadata shared across all rows in a result set.
///
/// Wrapped in `Arc` so every row from the same statement shares one copy.
#[derive(Debug, Clone)]
pub struct ColumnInfo {
    /// Column names in order
    names: Vec<String>,
    /// Name -> index mapping for O(1) lookup
    name_to_index: HashMap<String, usize>,
}

impl ColumnInfo {
    /// Create new column info from a list of column names.
    pub fn new(names: Vec<String>) -> Self {
        let name_to_index = names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
        Self {
            names,
            name_to_index,
        }
    }

    /// Get the number of columns.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Check if there are no columns.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Get the index of a column by name.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.name_to_index.get(name).copied()
    }

    /// Get all column names.
    pub fn names(&self) -> &[String] {
        &self.names
    }
}

/// A single row returned from a statement.
#[derive(Debug, Clone)]
pub struct Row {
    values: Vec<Value>,
    columns: Arc<ColumnInfo>,
}

impl Row {
    /// Create a new row with the given columns and values.
    ///
    /// For multiple rows from the same result set, prefer `with_columns`
    /// to share the column metadata.
    pub fn new(column_names: Vec<String>, values: Vec<Value>) -> Self {
        let columns = Arc::new(ColumnInfo::new(column_names));
        Self { values, columns }
    }

    /// Create a new row with shared column metadata.
    pub fn with_columns(columns: Arc<ColumnInfo>, values: Vec<Value>) -> Self {
        Self { values, columns }
    }

    /// Get the number of columns in this row.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if this row is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Get a value by column index.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Get a value by column name.
    pub fn get_by_name(&self, name: &str) -> Option<&Value> {
        self.columns.index_of(name).and_then(|i| self.values.get(i))
    }

    /// Get a typed value by column name.
    pub fn get_named<T: FromValue>(&self, name: &str) -> Result<T> {
        let value = self.get_by_name(name).ok_or_else(|| {
            Error::Type(TypeError {
                expected: std::any::type_name::<T>(),
                actual: format!("column '{}' not found", name),
                column: Some(name.to_string()),
            })
        })?;
        T::from_value(value).map_err(|e| match e {
            Error::Type(mut te) => {
                te.column = Some(name.to_string());
                Error::Type(te)
            }
            e => e,
        })
    }

    /// Get all column names.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.names().iter().map(String::as_str)
    }

    /// Iterate over all values.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.values.iter()
    }

    /// Extract the columns aliased `<prefix>__<column>` into a new row.
    ///
    /// The prefix and separator are stripped from the resulting column
    /// names. Returns an empty row when no column carries the prefix.
    pub fn subset_by_prefix(&self, prefix: &str) -> Row {
        let marker = format!("{}__", prefix);
        let mut names = Vec::new();
        let mut values = Vec::new();
        for (name, value) in self.columns.names().iter().zip(&self.values) {
            if let Some(stripped) = name.strip_prefix(&marker) {
                names.push(stripped.to_string());
                values.push(value.clone());
            }
        }
        Row::new(names, values)
    }
}

/// Trait for converting from a `Value` to a typed value.
pub trait FromValue: Sized {
    /// Convert from a Value, returning an error if the conversion fails.
    fn from_value(value: &Value) -> Result<Self>;
}

fn type_error(expected: &'static str, value: &Value) -> Error {
    Error::Type(TypeError {
        expected,
        actual: value.type_name().to_string(),
        column: None,
    })
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Result<Self> {
        value.as_i64().ok_or_else(|| type_error("i64", value))
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self> {
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| type_error("String", value))
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Result<Self> {
        if value.is_null() {
            Ok(None)
        } else {
            T::from_value(value).map(Some)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn joined_row() -> Row {
        Row::new(
            vec![
                "events__event_id".to_string(),
                "events__event_name".to_string(),
                "participants__participant_id".to_string(),
            ],
            vec![
                Value::BigInt(1),
                Value::Text("Event 1".to_string()),
                Value::Null,
            ],
        )
    }

    #[test]
    fn subset_by_prefix_strips_alias() {
        let row = joined_row();
        let events = row.subset_by_prefix("events");
        assert_eq!(events.len(), 2);
        assert_eq!(events.get_named::<i64>("event_id").unwrap(), 1);
        assert_eq!(events.get_named::<String>("event_name").unwrap(), "Event 1");

        assert!(row.subset_by_prefix("hobbies").is_empty());
    }

    #[test]
    fn get_named_reports_column() {
        let row = joined_row();
        let err = row
            .get_named::<String>("events__event_id")
            .expect_err("integer is not text");
        match err {
            Error::Type(te) => assert_eq!(te.column.as_deref(), Some("events__event_id")),
            other => panic!("expected type error, got {other:?}"),
        }
    }

    #[test]
    fn nullable_columns_decode_to_none() {
        let row = joined_row();
        let id: Option<i64> = row.get_named("participants__participant_id").unwrap();
        assert_eq!(id, None);
        assert!(row.get_named::<i64>("missing").is_err());
    }
}
