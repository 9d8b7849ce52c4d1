//! Round-trip validation for EpochScript trees
//!
//! Two properties every tree must satisfy:
//!
//! - **Lossless**: the tree text, the concatenated token stream and the
//!   source are byte-identical, and the token stream is what a fresh lex of
//!   the source produces.
//! - **Incremental equivalence**: a tree produced by applying edits
//!   incrementally is structurally identical to a from-scratch parse of the
//!   edited text.
//!
//! # Example
//!
//! ```
//! use epochscript_core::cst::{RoundTripValidator, TextEdit};
//! use epochscript_core::parse;
//!
//! let validator = RoundTripValidator::new();
//! assert!(validator.validate_round_trip("x = 1  # one\n").is_valid);
//!
//! let tree = parse("a = 1\nb = 2\n");
//! let result = validator
//!     .validate_incremental(&tree, &[TextEdit::replace_range(4..5, "10")])
//!     .unwrap();
//! assert!(result.is_valid, "{:?}", result.differences);
//! ```

use rowan::{NodeOrToken, TextRange, TextSize};

use super::{
    EpochSyntaxElement, EpochSyntaxKind, EpochSyntaxNode, IncrementalUpdater, SyntaxTree, TextEdit,
    TriviaCollector, lex_with_trivia, parse,
};
use crate::result::Result;

/// Outcome of a validation run
#[derive(Debug, Clone)]
pub struct ValidationResult {
    /// Whether no difference was found
    pub is_valid: bool,
    /// Text the checked tree was built from
    pub source: String,
    pub differences: Vec<StructuralDifference>,
    /// Number of comments in the checked tree and in the reference
    pub comment_counts: (usize, usize),
}

impl ValidationResult {
    fn from_differences(
        source: String,
        differences: Vec<StructuralDifference>,
        comment_counts: (usize, usize),
    ) -> Self {
        Self {
            is_valid: differences.is_empty(),
            source,
            differences,
            comment_counts,
        }
    }

    /// Human-readable list of every difference
    pub fn issues(&self) -> Vec<String> {
        self.differences.iter().map(ToString::to_string).collect()
    }
}

/// A place where a tree deviates from its reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuralDifference {
    pub kind: DifferenceKind,
    /// Range in the checked tree
    pub location: TextRange,
    pub expected: Option<String>,
    pub actual: Option<String>,
}

impl std::fmt::Display for StructuralDifference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?} at {:?}", self.kind, self.location)?;
        if let Some(expected) = &self.expected {
            write!(f, ", expected {expected}")?;
        }
        if let Some(actual) = &self.actual {
            write!(f, ", found {actual}")?;
        }
        Ok(())
    }
}

/// Types of structural differences
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DifferenceKind {
    /// The reference has an element the checked tree lacks
    MissingElement,
    /// The checked tree has an element the reference lacks
    ExtraElement,
    /// Elements at the same position have different kinds
    KindMismatch,
    /// Tokens of the same kind have different text or range
    TextMismatch,
    /// Tree text and source disagree
    LossyText,
    /// Stored token stream and a fresh lex disagree
    TokenStreamMismatch,
}

/// Validator for lossless parsing and incremental equivalence
#[derive(Debug, Clone, Default)]
pub struct RoundTripValidator {
    updater: IncrementalUpdater,
}

impl RoundTripValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate with a custom updater, e.g. a tighter resync lookahead
    pub fn with_updater(updater: IncrementalUpdater) -> Self {
        Self { updater }
    }

    /// Parse `source` and check that nothing was lost
    pub fn validate_round_trip(&self, source: &str) -> ValidationResult {
        let tree = parse(source);
        let differences = self.check_lossless(&tree);
        let comments = TriviaCollector::new().comments(&tree.syntax()).len();
        let expected_comments = lex_with_trivia(source)
            .iter()
            .filter(|t| t.kind == EpochSyntaxKind::Comment)
            .count();
        ValidationResult::from_differences(
            source.to_string(),
            differences,
            (comments, expected_comments),
        )
    }

    /// Apply `edits` incrementally and compare against a full parse
    pub fn validate_incremental(
        &self,
        tree: &SyntaxTree,
        edits: &[TextEdit],
    ) -> Result<ValidationResult> {
        let updated = self.updater.apply_edits(tree, edits)?.tree;
        let reference = parse(updated.text());

        let mut differences = self.check_lossless(&updated);
        differences.extend(compare_trees(&updated.syntax(), &reference.syntax()));

        let collector = TriviaCollector::new();
        let comment_counts = (
            collector.comments(&updated.syntax()).len(),
            collector.comments(&reference.syntax()).len(),
        );
        Ok(ValidationResult::from_differences(
            updated.text().to_string(),
            differences,
            comment_counts,
        ))
    }

    fn check_lossless(&self, tree: &SyntaxTree) -> Vec<StructuralDifference> {
        let mut differences = Vec::new();
        let whole = TextRange::up_to(TextSize::from(tree.text().len() as u32));

        let tree_text = tree.syntax().text().to_string();
        if tree_text != tree.text() {
            differences.push(StructuralDifference {
                kind: DifferenceKind::LossyText,
                location: whole,
                expected: Some(format!("{:?}", tree.text())),
                actual: Some(format!("{tree_text:?}")),
            });
        }

        let fresh = lex_with_trivia(tree.text());
        let actual = tree.tokens().to_vec();
        if fresh != actual {
            let first_mismatch = fresh
                .iter()
                .zip(&actual)
                .position(|(a, b)| a != b)
                .unwrap_or(fresh.len().min(actual.len()));
            differences.push(StructuralDifference {
                kind: DifferenceKind::TokenStreamMismatch,
                location: whole,
                expected: fresh.get(first_mismatch).map(|t| format!("{t:?}")),
                actual: actual.get(first_mismatch).map(|t| format!("{t:?}")),
            });
        }

        differences
    }
}

/// Walk both trees in parallel and report where `actual` deviates
///
/// Children of mismatching nodes are not compared further.
pub fn compare_trees(
    actual: &EpochSyntaxNode,
    expected: &EpochSyntaxNode,
) -> Vec<StructuralDifference> {
    let mut differences = Vec::new();
    compare_elements(
        &NodeOrToken::Node(actual.clone()),
        &NodeOrToken::Node(expected.clone()),
        &mut differences,
    );
    differences
}

fn compare_elements(
    actual: &EpochSyntaxElement,
    expected: &EpochSyntaxElement,
    differences: &mut Vec<StructuralDifference>,
) {
    if actual.kind() != expected.kind() {
        differences.push(StructuralDifference {
            kind: DifferenceKind::KindMismatch,
            location: actual.text_range(),
            expected: Some(expected.kind().to_string()),
            actual: Some(actual.kind().to_string()),
        });
        return;
    }

    match (actual, expected) {
        (NodeOrToken::Token(a), NodeOrToken::Token(e)) => {
            if a.text() != e.text() || a.text_range() != e.text_range() {
                differences.push(StructuralDifference {
                    kind: DifferenceKind::TextMismatch,
                    location: a.text_range(),
                    expected: Some(format!("{:?}@{:?}", e.text(), e.text_range())),
                    actual: Some(format!("{:?}@{:?}", a.text(), a.text_range())),
                });
            }
        }
        (NodeOrToken::Node(a), NodeOrToken::Node(e)) => {
            // Identical green nodes need no walk
            if a.green() == e.green() && a.text_range() == e.text_range() {
                return;
            }
            let mut actual_children = a.children_with_tokens();
            let mut expected_children = e.children_with_tokens();
            loop {
                match (actual_children.next(), expected_children.next()) {
                    (Some(a), Some(e)) => compare_elements(&a, &e, differences),
                    (Some(a), None) => differences.push(StructuralDifference {
                        kind: DifferenceKind::ExtraElement,
                        location: a.text_range(),
                        expected: None,
                        actual: Some(a.kind().to_string()),
                    }),
                    (None, Some(e)) => differences.push(StructuralDifference {
                        kind: DifferenceKind::MissingElement,
                        location: TextRange::empty(a.text_range().end()),
                        expected: Some(e.kind().to_string()),
                        actual: None,
                    }),
                    (None, None) => break,
                }
            }
        }
        // `Error` is both a token and a node kind
        _ => differences.push(StructuralDifference {
            kind: DifferenceKind::KindMismatch,
            location: actual.text_range(),
            expected: Some(element_variety(expected).to_string()),
            actual: Some(element_variety(actual).to_string()),
        }),
    }
}

fn element_variety(element: &EpochSyntaxElement) -> &'static str {
    match element {
        NodeOrToken::Node(_) => "node",
        NodeOrToken::Token(_) => "token",
    }
}
