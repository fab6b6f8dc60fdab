//! Raw statement results as a table.
//!
//! ```rust
//! use fanout_console::renderables::QueryResults;
//!
//! let results = QueryResults::new(
//!     vec!["user_id".to_string(), "user_name".to_string()],
//!     vec![vec!["1".to_string(), "User 1".to_string()]],
//! );
//! assert!(results.to_plain().contains("| user_id | user_name |"));
//! ```

use serde_json::json;

/// Border glyphs for one table style.
struct Borders {
    top: [char; 3],
    mid: [char; 3],
    bottom: [char; 3],
    horizontal: char,
    vertical: char,
}

const ASCII: Borders = Borders {
    top: ['+', '+', '+'],
    mid: ['+', '+', '+'],
    bottom: ['+', '+', '+'],
    horizontal: '-',
    vertical: '|',
};

const BOX: Borders = Borders {
    top: ['┌', '┬', '┐'],
    mid: ['├', '┼', '┤'],
    bottom: ['└', '┴', '┘'],
    horizontal: '─',
    vertical: '│',
};

/// Column names plus rows of display strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryResults {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl QueryResults {
    /// Create a result table. Short rows are padded with empty cells.
    #[must_use]
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { columns, rows }
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn widths(&self) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .map(|(i, name)| {
                self.rows
                    .iter()
                    .filter_map(|row| row.get(i))
                    .map(|cell| cell.chars().count())
                    .chain(std::iter::once(name.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect()
    }

    fn render(&self, borders: &Borders) -> String {
        let widths = self.widths();

        let rule = |[left, cross, right]: [char; 3]| {
            let segments: Vec<String> = widths
                .iter()
                .map(|w| borders.horizontal.to_string().repeat(w + 2))
                .collect();
            format!("{left}{}{right}", segments.join(cross.to_string().as_str()))
        };
        let line = |cells: &[String]| {
            let padded: Vec<String> = widths
                .iter()
                .enumerate()
                .map(|(i, w)| {
                    let cell = cells.get(i).map_or("", String::as_str);
                    let pad = w - cell.chars().count();
                    format!(" {cell}{} ", " ".repeat(pad))
                })
                .collect();
            let v = borders.vertical;
            format!("{v}{}{v}", padded.join(v.to_string().as_str()))
        };

        let mut lines = vec![rule(borders.top), line(self.columns.as_slice()), rule(borders.mid)];
        for row in &self.rows {
            lines.push(line(row.as_slice()));
        }
        lines.push(rule(borders.bottom));
        lines.push(String::new());
        lines.push(format!(" Count: {}", self.rows.len()));
        lines.join("\n")
    }

    /// ASCII table followed by a row count footer.
    #[must_use]
    pub fn to_plain(&self) -> String {
        self.render(&ASCII)
    }

    /// Box-drawing table followed by a row count footer.
    #[must_use]
    pub fn to_boxed(&self) -> String {
        self.render(&BOX)
    }

    /// `{"columns": [...], "rows": [[...]], "count": n}`
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "columns": self.columns,
            "rows": self.rows,
            "count": self.rows.len(),
        })
    }
}
