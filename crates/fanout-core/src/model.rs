//! Table metadata and the `Model` trait.
//!
//! Entities describe their table with a static [`TableInfo`]: columns,
//! primary key and named relationships. The loader walks relationships by
//! name through a [`Catalog`]; DDL is generated from the same metadata.

use crate::Result;
use crate::row::Row;

/// SQLite column type affinities used by the entity tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Integer,
    Real,
    Text,
    Blob,
}

impl SqlType {
    /// Get the SQL type name for this type.
    pub const fn sql_name(&self) -> &'static str {
        match self {
            SqlType::Integer => "INTEGER",
            SqlType::Real => "REAL",
            SqlType::Text => "TEXT",
            SqlType::Blob => "BLOB",
        }
    }
}

/// Metadata about a model column.
#[derive(Debug, Clone, Copy)]
pub struct FieldInfo {
    /// Database column name
    pub column_name: &'static str,
    /// SQL type for this column
    pub sql_type: SqlType,
    /// Whether this is the (auto-incrementing) primary key
    pub primary_key: bool,
    /// Whether this column is nullable
    pub nullable: bool,
    /// Foreign key reference (table.column)
    pub foreign_key: Option<&'static str>,
}

impl FieldInfo {
    /// Create a new NOT NULL column.
    pub const fn new(column_name: &'static str, sql_type: SqlType) -> Self {
        Self {
            column_name,
            sql_type,
            primary_key: false,
            nullable: false,
            foreign_key: None,
        }
    }

    /// Mark as the auto-incrementing integer primary key.
    pub const fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Allow NULL values.
    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Reference another table's column, written as `table.column`.
    pub const fn references(mut self, target: &'static str) -> Self {
        self.foreign_key = Some(target);
        self
    }

    /// Split the foreign key reference into `(table, column)`.
    pub fn foreign_key_parts(&self) -> Option<(&'static str, &'static str)> {
        self.foreign_key.and_then(|fk| fk.split_once('.'))
    }
}

/// The type of relationship between two tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationshipKind {
    /// The related table holds a foreign key to this table.
    OneToMany,
    /// This table holds a foreign key to the related table.
    ManyToOne,
}

/// A named relationship from one table to another.
///
/// For `OneToMany`, `local_key` is this table's primary key and
/// `remote_key` is the foreign key column on the related table. For
/// `ManyToOne`, `local_key` is the foreign key column on this table and
/// `remote_key` is the related table's primary key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationshipInfo {
    /// Name of the relationship, e.g. `"participants"`.
    pub name: &'static str,
    /// The related model's table name.
    pub related_table: &'static str,
    /// Kind of relationship.
    pub kind: RelationshipKind,
    /// Key column on this table.
    pub local_key: &'static str,
    /// Key column on the related table.
    pub remote_key: &'static str,
}

impl RelationshipInfo {
    /// A collection of rows on `related_table` whose `foreign_key` points at `parent_key`.
    pub const fn one_to_many(
        name: &'static str,
        related_table: &'static str,
        parent_key: &'static str,
        foreign_key: &'static str,
    ) -> Self {
        Self {
            name,
            related_table,
            kind: RelationshipKind::OneToMany,
            local_key: parent_key,
            remote_key: foreign_key,
        }
    }

    /// A single row on `related_table` referenced by this table's `foreign_key`.
    pub const fn many_to_one(
        name: &'static str,
        related_table: &'static str,
        foreign_key: &'static str,
        related_key: &'static str,
    ) -> Self {
        Self {
            name,
            related_table,
            kind: RelationshipKind::ManyToOne,
            local_key: foreign_key,
            remote_key: related_key,
        }
    }
}

/// Static description of one entity table.
#[derive(Debug, Clone, Copy)]
pub struct TableInfo {
    pub name: &'static str,
    pub primary_key: &'static str,
    pub fields: &'static [FieldInfo],
    pub relationships: &'static [RelationshipInfo],
}

impl TableInfo {
    /// Column names in declaration order.
    pub fn column_names(&self) -> impl Iterator<Item = &'static str> {
        self.fields.iter().map(|f| f.column_name)
    }

    /// Look up a column by name.
    pub fn field(&self, column: &str) -> Option<&'static FieldInfo> {
        self.fields.iter().find(|f| f.column_name == column)
    }

    /// Look up a relationship by name.
    pub fn relationship(&self, name: &str) -> Option<&'static RelationshipInfo> {
        self.relationships.iter().find(|r| r.name == name)
    }
}

/// The set of tables a fetch specification may traverse.
#[derive(Debug, Clone, Copy)]
pub struct Catalog {
    tables: &'static [&'static TableInfo],
}

impl Catalog {
    pub const fn new(tables: &'static [&'static TableInfo]) -> Self {
        Self { tables }
    }

    /// Look up a table by name.
    pub fn table(&self, name: &str) -> Option<&'static TableInfo> {
        self.tables.iter().copied().find(|t| t.name == name)
    }

    /// All tables in dependency order (referenced tables first).
    pub fn tables(&self) -> &'static [&'static TableInfo] {
        self.tables
    }
}

/// Trait for entities that map to a table.
pub trait Model: Sized {
    /// The table this entity is stored in.
    const TABLE: &'static TableInfo;

    /// Build the scalar part of the entity from a row.
    ///
    /// Relationship collections are left empty; the loader fills them.
    fn from_row(row: &Row) -> Result<Self>;
}

#[cfg(test)]
mod tests {
    use super::*;

    const AUTHORS: TableInfo = TableInfo {
        name: "authors",
        primary_key: "author_id",
        fields: &[
            FieldInfo::new("author_id", SqlType::Integer).primary_key(),
            FieldInfo::new("author_name", SqlType::Text),
        ],
        relationships: &[RelationshipInfo::one_to_many(
            "books",
            "books",
            "author_id",
            "author_id",
        )],
    };

    const BOOKS: TableInfo = TableInfo {
        name: "books",
        primary_key: "book_id",
        fields: &[
            FieldInfo::new("book_id", SqlType::Integer).primary_key(),
            FieldInfo::new("author_id", SqlType::Integer).references("authors.author_id"),
            FieldInfo::new("subtitle", SqlType::Text).nullable(),
        ],
        relationships: &[],
    };

    static CATALOG: Catalog = Catalog::new(&[&AUTHORS, &BOOKS]);

    #[test]
    fn lookups_by_name() {
        assert!(AUTHORS.field("author_name").is_some());
        assert!(AUTHORS.field("title").is_none());
        let rel = AUTHORS.relationship("books").unwrap();
        assert_eq!(rel.kind, RelationshipKind::OneToMany);
        assert_eq!(CATALOG.table(rel.related_table).unwrap().primary_key, "book_id");
        assert!(CATALOG.table("reviews").is_none());
    }

    #[test]
    fn foreign_key_parts_split_on_dot() {
        let fk = BOOKS.field("author_id").unwrap();
        assert_eq!(fk.foreign_key_parts(), Some(("authors", "author_id")));
        assert!(BOOKS.field("subtitle").unwrap().nullable);
        assert_eq!(
            BOOKS.column_names().collect::<Vec<_>>(),
            vec!["book_id", "author_id", "subtitle"]
        );
    }
}
