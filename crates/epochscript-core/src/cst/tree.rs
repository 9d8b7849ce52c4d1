//! Immutable syntax tree handle
//!
//! [`SyntaxTree`] owns the green root, the source text, the token stream and
//! an index of top-level statements. Green nodes and token arrays are
//! `Arc`-shared, so a tree is cheap to clone, is `Send + Sync`, and shares
//! unchanged statements and tokens with the trees derived from it by
//! [`crate::reparse`]. Red nodes with parent pointers are materialised on
//! demand by [`SyntaxTree::syntax`].

use std::ops::Range;

use rowan::{GreenNode, GreenNodeData, NodeOrToken, TextRange, TextSize};

use super::parser::ParsedStatement;
use super::{
    EpochSyntaxElement, EpochSyntaxKind, EpochSyntaxNode, EpochSyntaxToken, LexErrorKind,
    TokenStream,
};

/// One top-level statement of a tree
#[derive(Debug, Clone)]
pub struct StatementSlot {
    /// Index of the statement's first token (its leading trivia included)
    pub first_token: usize,
    pub token_count: usize,
    /// Tokens the parser looked at while building the statement, counted from
    /// `first_token`; may run past `token_count`
    pub examined: usize,
    pub green: GreenNode,
}

impl StatementSlot {
    pub(crate) fn new(first_token: usize, parsed: ParsedStatement) -> Self {
        Self {
            first_token,
            token_count: parsed.token_count,
            examined: parsed.examined,
            green: parsed.green,
        }
    }

    pub fn tokens(&self) -> Range<usize> {
        self.first_token..self.first_token + self.token_count
    }

    /// The same statement with its token indices moved by `offset`
    pub(crate) fn moved(&self, offset: isize) -> Self {
        Self {
            first_token: self.first_token.wrapping_add_signed(offset),
            ..self.clone()
        }
    }

    /// Whether both slots hold the very same green node allocation
    pub fn shares_green_with(&self, other: &StatementSlot) -> bool {
        std::ptr::eq::<GreenNodeData>(&*self.green, &*other.green)
    }
}

/// Where an error in the tree came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorOrigin {
    /// An `Error` token produced by the lexer
    Lex(LexErrorKind),
    /// An `Error` node inserted by parser recovery
    Syntax,
}

/// Location of an error embedded in the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ErrorSpan {
    pub origin: ErrorOrigin,
    pub range: TextRange,
}

/// Lossless EpochScript syntax tree
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    green: GreenNode,
    source: String,
    tokens: TokenStream,
    statements: Vec<StatementSlot>,
}

impl SyntaxTree {
    pub(crate) fn from_parts(
        green: GreenNode,
        source: String,
        tokens: TokenStream,
        statements: Vec<StatementSlot>,
    ) -> Self {
        Self {
            green,
            source,
            tokens,
            statements,
        }
    }

    /// Red root node for traversal
    pub fn syntax(&self) -> EpochSyntaxNode {
        EpochSyntaxNode::new_root(self.green.clone())
    }

    pub fn green(&self) -> &GreenNode {
        &self.green
    }

    /// Source text the tree was built from
    pub fn text(&self) -> &str {
        &self.source
    }

    /// Flat token stream, trivia included
    pub fn tokens(&self) -> &TokenStream {
        &self.tokens
    }

    pub fn statements(&self) -> &[StatementSlot] {
        &self.statements
    }

    /// Whether any lexer or parser error is embedded in the tree
    pub fn has_errors(&self) -> bool {
        self.tokens
            .iter()
            .any(|token| token.kind == EpochSyntaxKind::Error)
            || self
                .syntax()
                .descendants()
                .any(|node| node.kind() == EpochSyntaxKind::Error)
    }

    /// All embedded errors in source order
    ///
    /// An `Error` node that wraps a lexer `Error` token yields one span for
    /// each.
    pub fn errors(&self) -> Vec<ErrorSpan> {
        self.syntax()
            .descendants_with_tokens()
            .filter(|element| element.kind() == EpochSyntaxKind::Error)
            .map(|element| {
                let origin = match &element {
                    NodeOrToken::Node(_) => ErrorOrigin::Syntax,
                    NodeOrToken::Token(token) => {
                        ErrorOrigin::Lex(LexErrorKind::of_error_text(token.text()))
                    }
                };
                ErrorSpan {
                    origin,
                    range: element.text_range(),
                }
            })
            .collect()
    }

    /// Token containing `offset`; at the end of the text, the last token
    pub fn token_at_offset(&self, offset: usize) -> Option<EpochSyntaxToken> {
        if offset > self.source.len() {
            return None;
        }
        self.syntax()
            .token_at_offset(text_size(offset))
            .right_biased()
    }

    /// Smallest node whose range covers `range`
    pub fn covering_node(&self, range: Range<usize>) -> Option<EpochSyntaxNode> {
        if range.start > range.end || range.end > self.source.len() {
            return None;
        }
        let range = TextRange::new(text_size(range.start), text_size(range.end));
        match self.syntax().covering_element(range) {
            NodeOrToken::Node(node) => Some(node),
            NodeOrToken::Token(token) => token.parent(),
        }
    }

    /// Kinds from the root down to the token at `offset`, inclusive
    pub fn ancestor_path(&self, offset: usize) -> Vec<EpochSyntaxKind> {
        self.token_at_offset(offset)
            .map(|token| element_path(&NodeOrToken::Token(token)))
            .unwrap_or_default()
    }
}

/// Whether `node` is an `Error` node or contains an error node or token
pub fn has_error(node: &EpochSyntaxNode) -> bool {
    node.descendants_with_tokens()
        .any(|element| element.kind() == EpochSyntaxKind::Error)
}

/// Kinds from the root down to `element`, inclusive
pub fn element_path(element: &EpochSyntaxElement) -> Vec<EpochSyntaxKind> {
    let parents = match element {
        NodeOrToken::Node(node) => node.parent(),
        NodeOrToken::Token(token) => token.parent(),
    };
    let mut path: Vec<_> = parents
        .into_iter()
        .flat_map(|parent| parent.ancestors())
        .map(|node| node.kind())
        .collect();
    path.reverse();
    path.push(element.kind());
    path
}

fn text_size(offset: usize) -> TextSize {
    TextSize::from(offset as u32)
}
