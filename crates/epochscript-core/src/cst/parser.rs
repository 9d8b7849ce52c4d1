//! Statement-at-a-time parser for EpochScript
//!
//! The parser consumes the flat token stream produced by the lexer and builds
//! one green node per top-level statement. Expressions are parsed by
//! precedence climbing; binary and postfix nodes are opened retroactively
//! with builder checkpoints.
//!
//! Trivia handling: trivia tokens are skipped lazily and only added to the
//! tree right before the next significant token (or node) is. Nodes therefore
//! never end in trivia, and the trivia between two operands lands inside the
//! expression that joins them. A statement node owns its leading trivia, its
//! trailing same-line trivia and its terminator.
//!
//! Precedence, from loosest to tightest:
//!
//! | Level | Operators | Node |
//! |---|---|---|
//! | conditional | `a if c else b` | `ConditionalExpression` |
//! | or / and | `or`, `and` | `BinaryExpression` |
//! | not | `not` | `UnaryExpression` |
//! | comparison | `< > <= >= == !=` (chained) | `ComparisonExpression` |
//! | pipeline | `\|` | `PipelineExpression` |
//! | lag / lead | `>> <<` | `BinaryExpression` |
//! | additive, multiplicative | `+ -`, `* / %` | `BinaryExpression` |
//! | sign | unary `- +` | `UnaryExpression` |
//! | power | `**` (right-assoc) | `BinaryExpression` |
//! | postfix | call, `.member` | `CallExpression`, `AttributeExpression` |
//!
//! Brackets, `not` and signs nest by recursion. Past [`MAX_NESTING_DEPTH`]
//! levels the rest of the nested input is kept in one `Error` node, so no
//! input can exhaust the stack.

use std::cell::Cell;

use rowan::{Checkpoint, GreenNode, NodeCache};

use super::builder::build_program;
use super::tree::{StatementSlot, SyntaxTree};
use super::{CstBuilder, EpochSyntaxKind, TokenStream, lex_with_trivia};

/// Deepest nesting of brackets, `not` and signs parsed as structure
pub const MAX_NESTING_DEPTH: usize = 256;

/// Parse EpochScript source into a lossless syntax tree
///
/// Never fails: malformed input is represented by `Error` tokens and nodes.
///
/// # Example
///
/// ```
/// use epochscript_core::parse;
///
/// let tree = parse("fast = ema(12)(src.c)\n");
/// assert!(!tree.has_errors());
/// assert_eq!(tree.syntax().text().to_string(), "fast = ema(12)(src.c)\n");
/// ```
pub fn parse(source: &str) -> SyntaxTree {
    let tokens = TokenStream::from(lex_with_trivia(source));
    parse_tokens(source.to_string(), tokens)
}

/// Parse an already lexed token stream into a tree owning `source`
pub(crate) fn parse_tokens(source: String, tokens: TokenStream) -> SyntaxTree {
    let mut cache = NodeCache::default();
    let mut statements = Vec::new();
    let mut pos = 0;

    while let Some(parsed) = parse_statement_at(&source, &tokens, pos, &mut cache) {
        let slot = StatementSlot::new(pos, parsed);
        pos += slot.token_count;
        statements.push(slot);
    }

    let green = build_program(
        statements.iter().map(|slot| slot.green.clone()),
        tokens.iter_from(pos),
        &source,
    );
    SyntaxTree::from_parts(green, source, tokens, statements)
}

/// Outcome of parsing one statement
#[derive(Debug, Clone)]
pub(crate) struct ParsedStatement {
    pub green: GreenNode,
    /// Tokens owned by the statement
    pub token_count: usize,
    /// Tokens the parser examined, counted from the statement start. Reaching
    /// end of input counts as examining one token past the stream.
    pub examined: usize,
}

/// Parse the statement whose leading trivia starts at token `start`
///
/// Returns `None` when only trivia remains, which then belongs to `Program`.
pub(crate) fn parse_statement_at(
    source: &str,
    tokens: &TokenStream,
    start: usize,
    cache: &mut NodeCache,
) -> Option<ParsedStatement> {
    let has_content = tokens
        .iter_from(start)
        .any(|token| !token.kind.is_trivia());
    if !has_content {
        return None;
    }

    let mut parser = Parser::new(source, tokens, start, cache);
    parser.parse_statement();
    let token_count = parser.pos - start;
    let examined = parser.examined.get().max(parser.pos) - start;
    Some(ParsedStatement {
        green: parser.builder.finish(),
        token_count,
        examined,
    })
}

/// Token stream parser for a single statement
struct Parser<'t, 'c> {
    source: &'t str,
    tokens: &'t TokenStream,
    pos: usize,
    /// Trivia tokens directly before `pos` that are not in the tree yet
    pending: usize,
    /// Open bracket depth; newlines are trivia while it is non-zero
    depth: usize,
    /// Recursion depth through brackets, `not` and signs
    nesting: usize,
    /// Highest token index inspected, exclusive
    examined: Cell<usize>,
    builder: CstBuilder<'c>,
}

impl<'t, 'c> Parser<'t, 'c> {
    fn new(
        source: &'t str,
        tokens: &'t TokenStream,
        start: usize,
        cache: &'c mut NodeCache,
    ) -> Self {
        Self {
            source,
            tokens,
            pos: start,
            pending: 0,
            depth: 0,
            nesting: 0,
            examined: Cell::new(start),
            builder: CstBuilder::with_cache(cache),
        }
    }

    /// Parse one statement including its trivia and terminator
    fn parse_statement(&mut self) {
        let statement = self.builder.checkpoint();

        // Leading trivia, blank lines included
        while self.nth_kind(0).is_trivia() {
            self.skip_one();
        }

        let kind = if self.at_terminator() {
            self.builder.empty_error();
            EpochSyntaxKind::ExpressionStatement
        } else {
            let targets = self.checkpoint();
            self.parse_expression();
            if self.at(EpochSyntaxKind::Comma) || self.at(EpochSyntaxKind::Eq) {
                self.parse_assignment_rest(targets);
                EpochSyntaxKind::Assignment
            } else {
                EpochSyntaxKind::ExpressionStatement
            }
        };

        if !self.at_terminator() {
            self.junk_to_terminator();
        }

        self.flush_trivia();
        if self.at(EpochSyntaxKind::Newline) || self.at(EpochSyntaxKind::Semicolon) {
            self.add_current_token();
        }

        self.builder.start_node_at(statement, kind);
        self.builder.finish_node();
    }

    /// Remaining targets, `=` and the value of an assignment
    fn parse_assignment_rest(&mut self, targets: Checkpoint) {
        while self.at(EpochSyntaxKind::Comma) {
            self.bump();
            if self.at(EpochSyntaxKind::Eq) || self.at_terminator() {
                break;
            }
            self.parse_expression();
        }
        self.builder
            .start_node_at(targets, EpochSyntaxKind::AssignmentTargets);
        self.builder.finish_node();

        if self.at(EpochSyntaxKind::Eq) {
            self.bump();
            self.parse_expression();
        } else {
            self.builder.empty_error();
        }
    }

    fn parse_expression(&mut self) {
        self.nested(Self::parse_conditional);
    }

    /// Run `parse` one nesting level deeper, or wrap the nested input in an
    /// `Error` node once the limit is reached
    fn nested(&mut self, parse: fn(&mut Self)) {
        if self.nesting >= MAX_NESTING_DEPTH {
            self.too_deep();
            return;
        }
        self.nesting += 1;
        parse(self);
        self.nesting -= 1;
    }

    /// Consume tokens up to the closing bracket or terminator that ends the
    /// current nesting level
    fn too_deep(&mut self) {
        tracing::trace!(offset = self.offset(), "nesting too deep");
        self.start_node(EpochSyntaxKind::Error);
        let mut open = 0usize;
        loop {
            let kind = self.current_kind();
            if kind == EpochSyntaxKind::Eof {
                break;
            }
            if open == 0
                && (kind.closing_bracket()
                    || kind == EpochSyntaxKind::Newline
                    || kind == EpochSyntaxKind::Semicolon)
            {
                break;
            }
            if kind.opening_bracket() {
                open += 1;
            } else if kind.closing_bracket() {
                open -= 1;
            }
            self.bump();
        }
        self.builder.finish_node();
    }

    /// `body if condition else alternative`, each part at `or` level
    fn parse_conditional(&mut self) {
        let checkpoint = self.checkpoint();
        self.parse_or();
        if !self.at(EpochSyntaxKind::IfKw) {
            return;
        }

        self.builder
            .start_node_at(checkpoint, EpochSyntaxKind::ConditionalExpression);
        self.bump();
        self.parse_or();
        if self.at(EpochSyntaxKind::ElseKw) {
            self.bump();
            self.parse_or();
        } else {
            self.builder.empty_error();
        }
        self.builder.finish_node();
    }

    fn parse_or(&mut self) {
        self.parse_binary(&[EpochSyntaxKind::OrKw], Self::parse_and);
    }

    fn parse_and(&mut self) {
        self.parse_binary(&[EpochSyntaxKind::AndKw], Self::parse_not);
    }

    fn parse_not(&mut self) {
        if self.at(EpochSyntaxKind::NotKw) {
            self.start_node(EpochSyntaxKind::UnaryExpression);
            self.bump();
            self.nested(Self::parse_not);
            self.builder.finish_node();
        } else {
            self.parse_comparison();
        }
    }

    /// Chained comparisons stay flat: `a < b <= c` is one node
    fn parse_comparison(&mut self) {
        let checkpoint = self.checkpoint();
        self.parse_pipeline();
        if !self.current_kind().is_comparison_operator() {
            return;
        }

        self.builder
            .start_node_at(checkpoint, EpochSyntaxKind::ComparisonExpression);
        while self.current_kind().is_comparison_operator() {
            self.start_node(EpochSyntaxKind::ComparisonOp);
            self.bump();
            self.builder.finish_node();
            self.parse_pipeline();
        }
        self.builder.finish_node();
    }

    fn parse_pipeline(&mut self) {
        let checkpoint = self.checkpoint();
        self.parse_shift();
        while self.at(EpochSyntaxKind::Pipe) {
            self.builder
                .start_node_at(checkpoint, EpochSyntaxKind::PipelineExpression);
            self.bump();
            self.parse_shift();
            self.builder.finish_node();
        }
    }

    fn parse_shift(&mut self) {
        self.parse_binary(
            &[EpochSyntaxKind::ShiftRight, EpochSyntaxKind::ShiftLeft],
            Self::parse_additive,
        );
    }

    fn parse_additive(&mut self) {
        self.parse_binary(
            &[EpochSyntaxKind::Plus, EpochSyntaxKind::Minus],
            Self::parse_multiplicative,
        );
    }

    fn parse_multiplicative(&mut self) {
        self.parse_binary(
            &[
                EpochSyntaxKind::Star,
                EpochSyntaxKind::Slash,
                EpochSyntaxKind::Percent,
            ],
            Self::parse_sign,
        );
    }

    /// Left-associative binary level
    fn parse_binary(&mut self, operators: &[EpochSyntaxKind], operand: fn(&mut Self)) {
        let checkpoint = self.checkpoint();
        operand(self);
        while operators.contains(&self.current_kind()) {
            self.builder
                .start_node_at(checkpoint, EpochSyntaxKind::BinaryExpression);
            self.bump();
            operand(self);
            self.builder.finish_node();
        }
    }

    fn parse_sign(&mut self) {
        if self.at(EpochSyntaxKind::Minus) || self.at(EpochSyntaxKind::Plus) {
            self.start_node(EpochSyntaxKind::UnaryExpression);
            self.bump();
            self.nested(Self::parse_sign);
            self.builder.finish_node();
        } else {
            self.parse_power();
        }
    }

    /// `**` binds tighter than a leading sign and is right-associative
    fn parse_power(&mut self) {
        let checkpoint = self.checkpoint();
        self.parse_postfix();
        if self.at(EpochSyntaxKind::StarStar) {
            self.builder
                .start_node_at(checkpoint, EpochSyntaxKind::BinaryExpression);
            self.bump();
            self.nested(Self::parse_sign);
            self.builder.finish_node();
        }
    }

    /// Calls and member access; `f(a)(b)` nests the first call as callee
    fn parse_postfix(&mut self) {
        let checkpoint = self.checkpoint();
        self.parse_atom();
        loop {
            match self.current_kind() {
                EpochSyntaxKind::LParen => {
                    self.builder
                        .start_node_at(checkpoint, EpochSyntaxKind::CallExpression);
                    self.parse_argument_list();
                    self.builder.finish_node();
                }
                EpochSyntaxKind::Dot => {
                    self.builder
                        .start_node_at(checkpoint, EpochSyntaxKind::AttributeExpression);
                    self.bump();
                    if self.at(EpochSyntaxKind::Identifier) {
                        self.bump();
                    } else {
                        self.error_expected();
                    }
                    self.builder.finish_node();
                }
                _ => break,
            }
        }
    }

    fn parse_atom(&mut self) {
        match self.current_kind() {
            kind if kind.is_literal() => self.bump(),
            EpochSyntaxKind::LParen => self.parse_parenthesized(),
            EpochSyntaxKind::LBracket => {
                self.start_node(EpochSyntaxKind::ListLiteral);
                self.bump();
                self.parse_comma_separated(EpochSyntaxKind::RBracket, Self::parse_expression);
                self.expect_closing(EpochSyntaxKind::RBracket);
                self.builder.finish_node();
            }
            EpochSyntaxKind::LBrace => {
                self.start_node(EpochSyntaxKind::DictLiteral);
                self.bump();
                self.parse_comma_separated(EpochSyntaxKind::RBrace, Self::parse_dict_pair);
                self.expect_closing(EpochSyntaxKind::RBrace);
                self.builder.finish_node();
            }
            _ => self.error_expected(),
        }
    }

    /// `(a)` groups, `()`, `(a,)` and `(a, b)` are tuples
    fn parse_parenthesized(&mut self) {
        let checkpoint = self.checkpoint();
        self.bump();

        let kind = if self.at(EpochSyntaxKind::RParen) {
            EpochSyntaxKind::TupleLiteral
        } else {
            self.parse_expression();
            if self.at(EpochSyntaxKind::Comma) {
                self.bump();
                self.parse_comma_separated(EpochSyntaxKind::RParen, Self::parse_expression);
                EpochSyntaxKind::TupleLiteral
            } else {
                EpochSyntaxKind::ParenthesizedExpression
            }
        };
        self.expect_closing(EpochSyntaxKind::RParen);

        self.builder.start_node_at(checkpoint, kind);
        self.builder.finish_node();
    }

    fn parse_dict_pair(&mut self) {
        self.start_node(EpochSyntaxKind::DictPair);
        self.parse_expression();
        if self.at(EpochSyntaxKind::Colon) {
            self.bump();
            self.parse_expression();
        } else {
            self.builder.empty_error();
        }
        self.builder.finish_node();
    }

    /// `( positional*, keyword* )`, consuming both parentheses
    fn parse_argument_list(&mut self) {
        self.start_node(EpochSyntaxKind::ArgumentList);
        self.bump();

        let mut seen_keyword = false;
        self.parse_comma_separated(EpochSyntaxKind::RParen, |parser| {
            if parser.at(EpochSyntaxKind::Identifier)
                && parser.nth_significant(1) == EpochSyntaxKind::Eq
            {
                parser.start_node(EpochSyntaxKind::KeywordArgument);
                parser.bump();
                parser.bump();
                parser.parse_expression();
                parser.builder.finish_node();
                seen_keyword = true;
            } else if seen_keyword {
                // Positional arguments must precede keyword arguments
                tracing::trace!(offset = parser.offset(), "positional argument after keyword");
                parser.start_node(EpochSyntaxKind::Error);
                parser.parse_expression();
                parser.builder.finish_node();
            } else {
                parser.parse_expression();
            }
        });

        self.expect_closing(EpochSyntaxKind::RParen);
        self.builder.finish_node();
    }

    /// Elements separated by commas up to `close`, trailing comma allowed
    ///
    /// Stops without consuming at `close`, end of input or any token that
    /// cannot continue the sequence.
    fn parse_comma_separated(
        &mut self,
        close: EpochSyntaxKind,
        mut element: impl FnMut(&mut Self),
    ) {
        while !self.at(close) && !self.at(EpochSyntaxKind::Eof) {
            if self.at(EpochSyntaxKind::Comma) {
                self.builder.empty_error();
            } else {
                element(self);
            }
            if !self.at(EpochSyntaxKind::Comma) {
                break;
            }
            self.bump();
        }
    }

    /// Consume a closing bracket, or mark it missing and leave the bracket
    fn expect_closing(&mut self, kind: EpochSyntaxKind) {
        if self.at(kind) {
            self.bump();
            return;
        }

        tracing::trace!(offset = self.offset(), expected = %kind, "missing closing bracket");
        self.builder.empty_error();
        self.depth = self.depth.saturating_sub(1);
        // Trivia skipped inside the bracket may hold the line break that ends
        // the statement at the restored depth
        self.pos -= self.pending;
        self.pending = 0;
        self.skip_trivia();
    }

    /// Recovery where an expression was expected
    fn error_expected(&mut self) {
        if self.at_recovery_anchor() {
            tracing::trace!(offset = self.offset(), "missing expression");
            self.builder.empty_error();
        } else {
            tracing::trace!(
                offset = self.offset(),
                kind = %self.current_kind(),
                "unexpected token"
            );
            self.start_node(EpochSyntaxKind::Error);
            self.add_current_token();
            self.skip_trivia();
            self.builder.finish_node();
        }
    }

    /// Wrap everything up to the statement terminator in one `Error` node
    fn junk_to_terminator(&mut self) {
        tracing::trace!(offset = self.offset(), "unexpected tokens before end of statement");
        self.start_node(EpochSyntaxKind::Error);
        loop {
            let kind = self.nth_kind(0);
            if kind == EpochSyntaxKind::Eof
                || kind == EpochSyntaxKind::Semicolon
                || (kind == EpochSyntaxKind::Newline && self.depth == 0)
            {
                break;
            }
            if kind.is_trivia() {
                self.skip_one();
            } else {
                self.flush_trivia();
                self.add_current_token();
            }
        }
        self.builder.finish_node();
    }

    // Token stream helpers

    fn nth_kind(&self, n: usize) -> EpochSyntaxKind {
        let index = self.pos + n;
        self.examined.set(self.examined.get().max(index + 1));
        self.tokens.kind(index).unwrap_or(EpochSyntaxKind::Eof)
    }

    /// Current significant kind; trivia is always skipped past `pos`
    fn current_kind(&self) -> EpochSyntaxKind {
        self.nth_kind(0)
    }

    fn at(&self, kind: EpochSyntaxKind) -> bool {
        self.current_kind() == kind
    }

    /// Kind of the `n`th significant token from the current one
    fn nth_significant(&self, n: usize) -> EpochSyntaxKind {
        let mut remaining = n;
        let mut offset = 0;
        loop {
            let kind = self.nth_kind(offset);
            if kind == EpochSyntaxKind::Eof {
                return kind;
            }
            if !self.is_skippable(kind) {
                if remaining == 0 {
                    return kind;
                }
                remaining -= 1;
            }
            offset += 1;
        }
    }

    fn is_skippable(&self, kind: EpochSyntaxKind) -> bool {
        match kind {
            EpochSyntaxKind::Newline => self.depth > 0,
            kind => kind.is_trivia(),
        }
    }

    fn at_terminator(&self) -> bool {
        matches!(
            self.current_kind(),
            EpochSyntaxKind::Newline | EpochSyntaxKind::Semicolon | EpochSyntaxKind::Eof
        )
    }

    /// Tokens at which recovery inserts a missing expression instead of
    /// consuming anything
    fn at_recovery_anchor(&self) -> bool {
        let kind = self.current_kind();
        kind.closing_bracket()
            || matches!(
                kind,
                EpochSyntaxKind::Newline
                    | EpochSyntaxKind::Semicolon
                    | EpochSyntaxKind::Eof
                    | EpochSyntaxKind::Comma
                    | EpochSyntaxKind::Colon
                    | EpochSyntaxKind::Eq
                    | EpochSyntaxKind::ElseKw
            )
    }

    fn offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map_or(self.source.len(), |token| token.span.start)
    }

    /// Skip one token as pending trivia
    fn skip_one(&mut self) {
        self.pos += 1;
        self.pending += 1;
    }

    fn skip_trivia(&mut self) {
        while self.is_skippable(self.nth_kind(0)) {
            self.skip_one();
        }
    }

    fn flush_trivia(&mut self) {
        for token in self.tokens.iter_from(self.pos - self.pending).take(self.pending) {
            self.builder.add_token(&token, self.source);
        }
        self.pending = 0;
    }

    /// Flush pending trivia so it stays outside the node about to open
    fn checkpoint(&mut self) -> Checkpoint {
        self.flush_trivia();
        self.builder.checkpoint()
    }

    fn start_node(&mut self, kind: EpochSyntaxKind) {
        self.flush_trivia();
        self.builder.start_node(kind);
    }

    /// Add the current token verbatim, without touching bracket depth
    fn add_current_token(&mut self) {
        if let Some(token) = self.tokens.get(self.pos) {
            self.flush_trivia();
            self.builder.add_token(&token, self.source);
            self.pos += 1;
        }
    }

    /// Consume the current token, track brackets and skip following trivia
    fn bump(&mut self) {
        let kind = self.current_kind();
        if kind.opening_bracket() {
            self.depth += 1;
        } else if kind.closing_bracket() {
            self.depth = self.depth.saturating_sub(1);
        }
        self.add_current_token();
        self.skip_trivia();
    }
}
