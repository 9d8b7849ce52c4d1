//! Rowan language implementation for EpochScript
//!
//! This module implements the `rowan::Language` trait for EpochScript, which
//! connects [`EpochSyntaxKind`] to Rowan's generic CST infrastructure, and
//! carries the declarative language data a host editor registers alongside the
//! grammar.

use rowan::Language;

use super::EpochSyntaxKind;

/// Language implementation for EpochScript
///
/// This is a zero-sized type that implements `rowan::Language` to provide
/// the connection between our syntax kinds and Rowan's generic tree types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EpochLanguage;

impl Language for EpochLanguage {
    type Kind = EpochSyntaxKind;

    fn kind_from_raw(raw: rowan::SyntaxKind) -> Self::Kind {
        // Trees are only ever built from EpochSyntaxKind values, so an unknown
        // raw kind can only come from a foreign green node.
        EpochSyntaxKind::from_raw(raw.0).unwrap_or_else(|| {
            tracing::warn!("Unknown syntax kind: {}", raw.0);
            EpochSyntaxKind::Error
        })
    }

    fn kind_to_raw(kind: Self::Kind) -> rowan::SyntaxKind {
        kind.into()
    }
}

/// Declarative editor configuration for EpochScript
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguageData {
    pub name: &'static str,
    /// Prefix of a line comment
    pub line_comment: &'static str,
    /// Brackets and quotes an editor should auto-close
    pub close_brackets: &'static [&'static str],
}

pub const LANGUAGE_DATA: LanguageData = LanguageData {
    name: "epochscript",
    line_comment: "#",
    close_brackets: &["(", "[", "{", "'", "\""],
};
