//! Trivia queries for the EpochScript CST
//!
//! Trivia (whitespace, newlines, `#` comments) lives in the tree as ordinary
//! tokens. The helpers here answer which trivia belongs to which significant
//! token: the trivia between two significant tokens is split after the first
//! line break. Everything up to and including that break trails the earlier
//! token, the rest leads the later one. A comment on its own line is
//! therefore attached to the token that follows it.
//!
//! # Example
//!
//! ```
//! use epochscript_core::cst::trivia::{TriviaCollector, leading_trivia};
//! use epochscript_core::parse;
//!
//! let tree = parse("x = 1  # one\n# the answer\ny = 42\n");
//! let y = tree.token_at_offset(26).unwrap();
//! assert_eq!(y.text(), "y");
//!
//! let comments: Vec<_> = leading_trivia(&y)
//!     .into_iter()
//!     .filter_map(|t| t.comment_content())
//!     .collect();
//! assert_eq!(comments, ["the answer"]);
//!
//! let info = TriviaCollector::new().collect_node_trivia(&tree.syntax());
//! assert!(info.has_comments());
//! ```

use std::collections::HashMap;

use rowan::{Direction, TextRange};

use super::{EpochSyntaxKind, EpochSyntaxNode, EpochSyntaxToken};

/// Trivia around and inside a node
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TriviaInfo {
    /// Trivia attached to the node's first significant token
    pub leading: Vec<TriviaToken>,
    /// Trivia attached to the node's last significant token, up to the line break
    pub trailing: Vec<TriviaToken>,
    /// Trivia between the node's significant tokens
    pub internal: Vec<TriviaToken>,
}

impl TriviaInfo {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.leading.is_empty() && self.trailing.is_empty() && self.internal.is_empty()
    }

    pub fn has_comments(&self) -> bool {
        self.all().any(TriviaToken::is_comment)
    }

    pub fn has_whitespace(&self) -> bool {
        self.all().any(TriviaToken::is_whitespace)
    }

    pub fn comments(&self) -> Vec<&TriviaToken> {
        self.all().filter(|t| t.is_comment()).collect()
    }

    fn all(&self) -> impl Iterator<Item = &TriviaToken> {
        self.leading
            .iter()
            .chain(self.internal.iter())
            .chain(self.trailing.iter())
    }
}

/// A single trivia token detached from the tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriviaToken {
    pub kind: EpochSyntaxKind,
    pub text: String,
    pub range: TextRange,
}

impl TriviaToken {
    pub fn new(kind: EpochSyntaxKind, text: String, range: TextRange) -> Self {
        Self { kind, text, range }
    }

    pub fn from_token(token: &EpochSyntaxToken) -> Self {
        Self {
            kind: token.kind(),
            text: token.text().to_string(),
            range: token.text_range(),
        }
    }

    pub fn is_comment(&self) -> bool {
        self.kind == EpochSyntaxKind::Comment
    }

    /// Whitespace or a line break
    pub fn is_whitespace(&self) -> bool {
        matches!(self.kind, EpochSyntaxKind::Whitespace | EpochSyntaxKind::Newline)
    }

    pub fn is_newline(&self) -> bool {
        self.kind == EpochSyntaxKind::Newline
    }

    /// Comment text without the `#` and surrounding blanks
    pub fn comment_content(&self) -> Option<String> {
        self.is_comment()
            .then(|| self.text.trim_start_matches('#').trim().to_string())
    }
}

/// Trivia attached before `token`
pub fn leading_trivia(token: &EpochSyntaxToken) -> Vec<TriviaToken> {
    let mut before = trivia_run(token, Direction::Prev);
    before.reverse();

    // Without an earlier significant token, every preceding trivia leads
    if reaches_boundary(token, Direction::Prev, before.len()) {
        return before;
    }
    match before.iter().position(TriviaToken::is_newline) {
        Some(index) => before.split_off(index + 1),
        None => Vec::new(),
    }
}

/// Trivia attached after `token`, up to and including the first line break
pub fn trailing_trivia(token: &EpochSyntaxToken) -> Vec<TriviaToken> {
    let mut after = trivia_run(token, Direction::Next);
    if let Some(index) = after.iter().position(TriviaToken::is_newline) {
        after.truncate(index + 1);
    }
    after
}

/// Consecutive trivia tokens next to `token`, nearest first
fn trivia_run(token: &EpochSyntaxToken, direction: Direction) -> Vec<TriviaToken> {
    std::iter::successors(step(token, direction), |t| step(t, direction))
        .take_while(|t| t.kind().is_trivia())
        .map(|t| TriviaToken::from_token(&t))
        .collect()
}

fn step(token: &EpochSyntaxToken, direction: Direction) -> Option<EpochSyntaxToken> {
    match direction {
        Direction::Next => token.next_token(),
        Direction::Prev => token.prev_token(),
    }
}

/// Whether the run of `len` trivia tokens ends at the start or end of the tree
fn reaches_boundary(token: &EpochSyntaxToken, direction: Direction, len: usize) -> bool {
    std::iter::successors(step(token, direction), |t| step(t, direction))
        .nth(len)
        .is_none()
}

/// First and last non-trivia tokens of a node
fn significant_bounds(node: &EpochSyntaxNode) -> Option<(EpochSyntaxToken, EpochSyntaxToken)> {
    let mut tokens = node
        .descendants_with_tokens()
        .filter_map(|e| e.into_token())
        .filter(|t| !t.kind().is_trivia());
    let first = tokens.next()?;
    let last = tokens.last().unwrap_or_else(|| first.clone());
    Some((first, last))
}

/// Collects trivia information from CST nodes
pub struct TriviaCollector {
    collect_internal: bool,
}

impl TriviaCollector {
    pub fn new() -> Self {
        Self {
            collect_internal: true,
        }
    }

    /// Only leading and trailing trivia
    pub fn external_only() -> Self {
        Self {
            collect_internal: false,
        }
    }

    /// Trivia attached to the node's first and last significant tokens and,
    /// unless disabled, the trivia between them
    ///
    /// A node without significant tokens reports its own trivia as leading.
    pub fn collect_node_trivia(&self, node: &EpochSyntaxNode) -> TriviaInfo {
        let Some((first, last)) = significant_bounds(node) else {
            return TriviaInfo {
                leading: node
                    .descendants_with_tokens()
                    .filter_map(|e| e.into_token())
                    .map(|t| TriviaToken::from_token(&t))
                    .collect(),
                ..TriviaInfo::empty()
            };
        };

        let mut info = TriviaInfo {
            leading: leading_trivia(&first),
            trailing: trailing_trivia(&last),
            internal: Vec::new(),
        };

        if self.collect_internal && first != last {
            let inner = TextRange::new(first.text_range().end(), last.text_range().start());
            info.internal = node
                .descendants_with_tokens()
                .filter_map(|e| e.into_token())
                .filter(|t| t.kind().is_trivia() && inner.contains_range(t.text_range()))
                .map(|t| TriviaToken::from_token(&t))
                .collect();
        }

        info
    }

    /// Trivia of every node below `root`, keyed by range
    ///
    /// Nested nodes sharing a range report under the outermost one.
    pub fn collect_trivia(&self, root: &EpochSyntaxNode) -> HashMap<TextRange, TriviaInfo> {
        let mut trivia_map = HashMap::new();
        for node in root.descendants() {
            let trivia = self.collect_node_trivia(&node);
            if !trivia.is_empty() {
                trivia_map.entry(node.text_range()).or_insert(trivia);
            }
        }
        trivia_map
    }

    /// Comments of the whole tree in source order
    pub fn comments(&self, root: &EpochSyntaxNode) -> Vec<TriviaToken> {
        root.descendants_with_tokens()
            .filter_map(|e| e.into_token())
            .filter(|t| t.kind() == EpochSyntaxKind::Comment)
            .map(|t| TriviaToken::from_token(&t))
            .collect()
    }
}

impl Default for TriviaCollector {
    fn default() -> Self {
        Self::new()
    }
}
