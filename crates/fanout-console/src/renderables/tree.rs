//! Labelled trees, used for the materialized object graph summary.

use serde::Serialize;

/// One labelled node and its children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeNode {
    pub label: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            children: Vec::new(),
        }
    }

    /// Append a child.
    #[must_use]
    pub fn child(mut self, node: TreeNode) -> Self {
        self.children.push(node);
        self
    }

    /// Render with ASCII branches (`+--`, `\--`).
    #[must_use]
    pub fn render_plain(&self) -> String {
        self.render(("+-- ", "\\-- ", "|   ", "    "))
    }

    /// Render with box-drawing branches.
    #[must_use]
    pub fn render_unicode(&self) -> String {
        self.render(("├── ", "└── ", "│   ", "    "))
    }

    fn render(&self, chars: (&str, &str, &str, &str)) -> String {
        let mut lines = vec![self.label.clone()];
        render_children(&self.children, "", chars, &mut lines);
        lines.join("\n")
    }
}

fn render_children(
    children: &[TreeNode],
    prefix: &str,
    chars: (&str, &str, &str, &str),
    lines: &mut Vec<String>,
) {
    let (branch, last_branch, pipe, space) = chars;
    for (i, child) in children.iter().enumerate() {
        let last = i + 1 == children.len();
        lines.push(format!(
            "{prefix}{}{}",
            if last { last_branch } else { branch },
            child.label
        ));
        let nested = format!("{prefix}{}", if last { space } else { pipe });
        render_children(&child.children, &nested, chars, lines);
    }
}
