//! Green tree construction
//!
//! A thin wrapper over `rowan::GreenNodeBuilder`. Every top-level statement is
//! built by its own builder, and all builders of one parse share a single
//! [`NodeCache`], so identical tokens and small subtrees are interned once.

use rowan::{Checkpoint, GreenNode, GreenNodeBuilder, GreenToken, NodeCache, NodeOrToken};

use super::{CstToken, EpochSyntaxKind};

/// Builder for one green subtree
pub struct CstBuilder<'cache> {
    builder: GreenNodeBuilder<'cache>,
}

impl CstBuilder<'static> {
    /// Builder with its own private cache
    pub fn new() -> Self {
        Self {
            builder: GreenNodeBuilder::new(),
        }
    }
}

impl<'cache> CstBuilder<'cache> {
    /// Builder interning into a cache shared with other builders
    pub fn with_cache(cache: &'cache mut NodeCache) -> Self {
        Self {
            builder: GreenNodeBuilder::with_cache(cache),
        }
    }

    pub fn start_node(&mut self, kind: EpochSyntaxKind) {
        self.builder.start_node(kind.into());
    }

    pub fn finish_node(&mut self) {
        self.builder.finish_node();
    }

    pub fn checkpoint(&self) -> Checkpoint {
        self.builder.checkpoint()
    }

    /// Wrap everything added since `checkpoint` in a new node
    pub fn start_node_at(&mut self, checkpoint: Checkpoint, kind: EpochSyntaxKind) {
        self.builder.start_node_at(checkpoint, kind.into());
    }

    pub fn token(&mut self, kind: EpochSyntaxKind, text: &str) {
        self.builder.token(kind.into(), text);
    }

    /// Add a lexed token, reading its text from `source`
    pub fn add_token(&mut self, token: &CstToken, source: &str) {
        self.token(token.kind, token.text(source));
    }

    /// Insert a zero-width `Error` node
    pub fn empty_error(&mut self) {
        self.start_node(EpochSyntaxKind::Error);
        self.finish_node();
    }

    pub fn finish(self) -> GreenNode {
        self.builder.finish()
    }
}

impl Default for CstBuilder<'static> {
    fn default() -> Self {
        Self::new()
    }
}

/// Assemble the `Program` root from finished statements and the trivia
/// tokens that follow the last one
pub fn build_program(
    statements: impl IntoIterator<Item = GreenNode>,
    tail: impl IntoIterator<Item = CstToken>,
    source: &str,
) -> GreenNode {
    let tail = tail
        .into_iter()
        .map(|token| NodeOrToken::Token(GreenToken::new(token.kind.into(), token.text(source))));
    let children: Vec<NodeOrToken<GreenNode, GreenToken>> = statements
        .into_iter()
        .map(NodeOrToken::Node)
        .chain(tail)
        .collect();
    GreenNode::new(EpochSyntaxKind::Program.into(), children)
}
