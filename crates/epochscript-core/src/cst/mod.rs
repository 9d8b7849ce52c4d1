//! Concrete Syntax Tree (CST) for EpochScript
//!
//! This module implements a lossless syntax tree using the Rowan library.
//! The CST preserves all source information including whitespace, comments,
//! and malformed input, enabling:
//! - Live re-highlighting while the user types
//! - Incremental reparsing that reuses untouched statements
//! - Error-tolerant analysis of half-written scripts
//!
//! ## Architecture
//!
//! The CST uses Rowan's green/red tree pattern:
//!
//! - **Green Tree**: Immutable, position-independent storage
//!   - Stores actual source text with trivia (whitespace, comments)
//!   - Deduplicates identical subtrees through a shared node cache
//!   - Cheap to clone (uses Arc internally)
//!
//! - **Red Tree**: Dynamically constructed view with parent pointers
//!   - Created on-demand for traversal
//!   - Provides typed AST-like API
//!   - Enables efficient parent/sibling navigation
//!
//! ## Trivia Handling
//!
//! Every top-level statement owns its leading trivia (blank lines, comments,
//! indentation), its trailing same-line trivia and its terminator. Inside an
//! expression, trivia sits between the tokens it separates, so no node starts
//! or ends with trivia.
//!
//! This enables lossless representation: `parse(source).syntax().text() == source`
//!
//! ## Example
//!
//! ```
//! use epochscript_core::cst::EpochSyntaxKind;
//! use epochscript_core::parse;
//!
//! let tree = parse("# fast average\nfast = ema(12)(src.c)\n");
//! assert_eq!(tree.syntax().text().to_string(), tree.text());
//!
//! let comments = tree
//!     .syntax()
//!     .descendants_with_tokens()
//!     .filter(|element| element.kind() == EpochSyntaxKind::Comment)
//!     .count();
//! assert_eq!(comments, 1);
//! ```

mod builder;
mod language;
mod lexer;
mod parser;
mod syntax_kind;
mod token_stream;
mod tree;

pub mod ast;
pub mod incremental;
pub mod literal;
pub mod printer;
pub mod round_trip;
pub mod trivia;

pub use builder::{CstBuilder, build_program};
pub use incremental::{
    EditViolation, IncrementalUpdater, TextEdit, UpdateMetrics, UpdateResult,
    apply_text_edits, reparse, validate_edits,
};
pub use language::{EpochLanguage, LANGUAGE_DATA, LanguageData};
pub use lexer::{
    CstSpan, CstToken, LexErrorKind, TIMEFRAME_ANCHORS, TIMEFRAME_LAST, TIMEFRAME_UNITS, lex_token,
    lex_with_trivia,
};
pub use parser::{MAX_NESTING_DEPTH, parse};
pub use round_trip::{DifferenceKind, RoundTripValidator, StructuralDifference, ValidationResult};
pub use syntax_kind::EpochSyntaxKind;
pub use token_stream::TokenStream;
pub use tree::{ErrorOrigin, ErrorSpan, StatementSlot, SyntaxTree, element_path, has_error};
pub use trivia::{TriviaCollector, TriviaInfo, TriviaToken};

/// Red syntax node of an EpochScript tree
pub type EpochSyntaxNode = rowan::SyntaxNode<EpochLanguage>;
/// Red syntax token of an EpochScript tree
pub type EpochSyntaxToken = rowan::SyntaxToken<EpochLanguage>;
/// Node or token of an EpochScript tree
pub type EpochSyntaxElement = rowan::SyntaxElement<EpochLanguage>;
