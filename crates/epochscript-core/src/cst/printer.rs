//! Deterministic textual dump of a syntax tree
//!
//! One line per element, indented two spaces per level:
//!
//! ```text
//! Program@0..5
//!   ExpressionStatement@0..5
//!     Identifier@0..5 "close"
//! ```
//!
//! Used by snapshot tests and when debugging recovery.

use std::fmt::Write;

use rowan::{NodeOrToken, WalkEvent};

use super::EpochSyntaxNode;

/// Render `node` and everything below it
pub fn debug_tree(node: &EpochSyntaxNode) -> String {
    let mut out = String::new();
    let mut depth = 0usize;

    for event in node.preorder_with_tokens() {
        match event {
            WalkEvent::Enter(element) => {
                push_indent(&mut out, depth);
                let range = element.text_range();
                let _ = match &element {
                    NodeOrToken::Node(node) => {
                        write!(out, "{:?}@{:?}", node.kind(), range)
                    }
                    NodeOrToken::Token(token) => {
                        write!(out, "{:?}@{:?} {:?}", token.kind(), range, token.text())
                    }
                };
                out.push('\n');
                depth += 1;
            }
            WalkEvent::Leave(_) => depth -= 1,
        }
    }

    out
}

/// One line per top-level statement: kind, range and source text
pub fn statement_outline(root: &EpochSyntaxNode) -> String {
    let mut out = String::new();
    for statement in root.children() {
        let _ = writeln!(
            out,
            "{:?}@{:?} {:?}",
            statement.kind(),
            statement.text_range(),
            statement.text().to_string()
        );
    }
    out
}

fn push_indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str("  ");
    }
}
