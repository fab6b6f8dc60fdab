//! Declarative fetch specifications.
//!
//! A [`FetchSpec`] names a root table, an optional equality filter, the
//! relationships to eager-load and the [`SplitMode`] to load them with.
//! Building never fails; misuse is recorded and reported when the spec is
//! planned against a catalog.

use fanout_core::{Error, Value};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How an eager fetch is turned into statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SplitMode {
    /// One statement joining every included level.
    Combined,
    /// One statement per included relationship.
    #[default]
    PerRelation,
}

impl SplitMode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            SplitMode::Combined => "combined",
            SplitMode::PerRelation => "per-relation",
        }
    }
}

impl fmt::Display for SplitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SplitMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "combined" | "single" => Ok(SplitMode::Combined),
            "per-relation" | "per_relation" | "split" => Ok(SplitMode::PerRelation),
            other => Err(Error::config(
                "split_mode",
                format!("unknown split mode '{other}' (expected 'combined' or 'per-relation')"),
            )),
        }
    }
}

/// Equality filter on a root table column.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: String,
    pub value: Value,
}

impl Filter {
    /// `column = value`
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }
}

/// A chain of relationship names starting at the root table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludePath {
    segments: Vec<String>,
}

impl IncludePath {
    /// Relationship names in traversal order.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

/// What to fetch and how.
///
/// ```ignore
/// let spec = FetchSpec::new("events")
///     .filter(Filter::eq("event_id", 1_i64))
///     .include("participants")
///     .then_include("created_by")
///     .then_include("hobbies")
///     .mode(SplitMode::PerRelation);
/// ```
#[derive(Debug, Clone)]
pub struct FetchSpec {
    root: String,
    filter: Option<Filter>,
    includes: Vec<IncludePath>,
    mode: SplitMode,
    misuse: Option<String>,
}

impl FetchSpec {
    /// Start a fetch rooted at `table`.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            root: table.into(),
            filter: None,
            includes: Vec::new(),
            mode: SplitMode::default(),
            misuse: None,
        }
    }

    /// Restrict the root rows with an equality filter.
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Start a new include chain with a relationship of the root table.
    pub fn include(mut self, relationship: impl Into<String>) -> Self {
        self.includes.push(IncludePath {
            segments: vec![relationship.into()],
        });
        self
    }

    /// Extend the most recent include chain by one relationship.
    pub fn then_include(mut self, relationship: impl Into<String>) -> Self {
        let relationship = relationship.into();
        match self.includes.last_mut() {
            Some(path) => path.segments.push(relationship),
            None => self.record_misuse(format!(
                "then_include(\"{relationship}\") without a preceding include"
            )),
        }
        self
    }

    /// Add a dotted include chain, e.g. `"participants.created_by.hobbies"`.
    pub fn include_path(mut self, path: &str) -> Self {
        let segments: Vec<String> = path.split('.').map(|s| s.trim().to_string()).collect();
        self.includes.push(IncludePath { segments });
        self
    }

    /// Choose the execution mode.
    pub fn mode(mut self, mode: SplitMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn filter_ref(&self) -> Option<&Filter> {
        self.filter.as_ref()
    }

    pub fn includes(&self) -> &[IncludePath] {
        &self.includes
    }

    pub fn split_mode(&self) -> SplitMode {
        self.mode
    }

    /// The first builder misuse, if any.
    pub fn misuse(&self) -> Option<&str> {
        self.misuse.as_deref()
    }

    fn record_misuse(&mut self, message: String) {
        if self.misuse.is_none() {
            self.misuse = Some(message);
        }
    }
}
