//! Incremental reparsing for EpochScript
//!
//! Applying a batch of edits produces exactly the tree a from-scratch parse of
//! the new text would, while doing lexing and parsing work proportional to the
//! damaged region:
//!
//! 1. **Relex.** Old tokens whose recorded lookahead ends at or before the
//!    next edit are copied. Copying shares the old token arrays and records
//!    the byte shift once per chunk, so no token is touched. Lexing restarts
//!    at the first token that looked into the edit and stops once a new token
//!    boundary, past the inserted text, lines up with an old token start.
//!    Copying then resumes.
//! 2. **Reparse.** Statement boundaries are walked over the new token stream.
//!    A statement is reused by reference when it starts on a copied token that
//!    began an old statement, and every token the parser examined for it lies
//!    in the same copied run. Consecutive reusable statements are copied as
//!    one slice.
//!
//! Both phases give up realigning after `max_resync_lookahead` steps and
//! degrade to plain lexing or parsing of the remainder.
//!
//! # Example
//!
//! ```
//! use epochscript_core::cst::{IncrementalUpdater, TextEdit};
//! use epochscript_core::parse;
//!
//! let tree = parse("fast = ema(12)(src.c)\nslow = ema(26)(src.c)\n");
//! let updater = IncrementalUpdater::new();
//! let result = updater.apply_edit(&tree, &TextEdit::replace_range(11..13, "9")).unwrap();
//!
//! assert_eq!(result.tree.text(), "fast = ema(9)(src.c)\nslow = ema(26)(src.c)\n");
//! assert_eq!(result.metrics.statements_reused, 1);
//! ```

use std::time::Instant;

use rowan::{NodeCache, TextRange, TextSize};
use thiserror::Error;

use super::parser::{parse_statement_at, parse_tokens};
use super::tree::{StatementSlot, SyntaxTree};
use super::token_stream::{TokenStream, TokenStreamBuilder};
use super::{build_program, lex_token, lex_with_trivia};
use crate::config::ParserConfig;
use crate::error::EpochError;
use crate::result::Result;

/// Represents a text edit operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    /// Range to replace, in pre-edit coordinates
    pub range: TextRange,
    /// New text to insert
    pub new_text: String,
}

impl TextEdit {
    /// Create a new text edit
    pub fn new(range: TextRange, new_text: String) -> Self {
        Self { range, new_text }
    }

    /// Create a replacement edit
    pub fn replace(range: impl Into<TextRange>, new_text: impl Into<String>) -> Self {
        Self {
            range: range.into(),
            new_text: new_text.into(),
        }
    }

    /// Create a replacement edit from usize range
    ///
    /// A range with `start > end` is empty, as it is for `Range` itself, and
    /// becomes an insertion at `start`.
    pub fn replace_range(range: std::ops::Range<usize>, new_text: impl Into<String>) -> Self {
        Self {
            range: range_to_text_range(range),
            new_text: new_text.into(),
        }
    }

    /// Create an insertion edit
    pub fn insert(position: TextSize, text: impl Into<String>) -> Self {
        Self {
            range: TextRange::new(position, position),
            new_text: text.into(),
        }
    }

    /// Create a deletion edit
    pub fn delete(range: impl Into<TextRange>) -> Self {
        Self {
            range: range.into(),
            new_text: String::new(),
        }
    }

    /// Check if this edit is an insertion
    pub fn is_insertion(&self) -> bool {
        self.range.is_empty() && !self.new_text.is_empty()
    }

    /// Check if this edit is a deletion
    pub fn is_deletion(&self) -> bool {
        !self.range.is_empty() && self.new_text.is_empty()
    }

    /// Check if this edit is a replacement
    pub fn is_replacement(&self) -> bool {
        !self.range.is_empty() && !self.new_text.is_empty()
    }

    /// Get the length change caused by this edit
    pub fn length_delta(&self) -> i64 {
        self.new_text.len() as i64 - usize::from(self.range.len()) as i64
    }

    fn start(&self) -> usize {
        self.range.start().into()
    }

    fn end(&self) -> usize {
        self.range.end().into()
    }
}

impl From<(TextRange, String)> for TextEdit {
    fn from((range, new_text): (TextRange, String)) -> Self {
        Self::new(range, new_text)
    }
}

impl From<(std::ops::Range<usize>, &str)> for TextEdit {
    fn from((range, new_text): (std::ops::Range<usize>, &str)) -> Self {
        Self::replace_range(range, new_text)
    }
}

fn range_to_text_range(range: std::ops::Range<usize>) -> TextRange {
    let offset = |offset: usize| TextSize::from(u32::try_from(offset).unwrap_or(u32::MAX));
    let start = offset(range.start);
    TextRange::new(start, offset(range.end).max(start))
}

/// Why an edit batch was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum EditViolation {
    #[error("starts before the previous edit")]
    OutOfOrder,
    #[error("overlaps the previous edit")]
    Overlapping,
    #[error("reaches past the end of the text")]
    OutOfBounds,
    #[error("splits a character")]
    NotCharBoundary,
}

/// Check that `edits` are ascending, disjoint, in range and on char
/// boundaries of `source`
pub fn validate_edits(source: &str, edits: &[TextEdit]) -> Result<()> {
    let mut previous: Option<&TextEdit> = None;
    for (index, edit) in edits.iter().enumerate() {
        let violation = if edit.end() > source.len() {
            Some(EditViolation::OutOfBounds)
        } else if !source.is_char_boundary(edit.start()) || !source.is_char_boundary(edit.end()) {
            Some(EditViolation::NotCharBoundary)
        } else if previous.is_some_and(|prev| edit.start() < prev.start()) {
            Some(EditViolation::OutOfOrder)
        } else if previous.is_some_and(|prev| edit.start() < prev.end()) {
            Some(EditViolation::Overlapping)
        } else {
            None
        };
        if let Some(reason) = violation {
            return Err(EpochError::incremental_inconsistency(index, reason));
        }
        previous = Some(edit);
    }
    Ok(())
}

/// Apply a validated batch of edits to `source`
pub fn apply_text_edits(source: &str, edits: &[TextEdit]) -> String {
    let inserted: usize = edits.iter().map(|edit| edit.new_text.len()).sum();
    let mut result = String::with_capacity(source.len() + inserted);
    let mut last = 0;
    for edit in edits {
        result.push_str(&source[last..edit.start()]);
        result.push_str(&edit.new_text);
        last = edit.end();
    }
    result.push_str(&source[last..]);
    result
}

/// Result of an incremental update operation
#[derive(Debug, Clone)]
pub struct UpdateResult {
    /// The updated tree
    pub tree: SyntaxTree,
    /// Whether the whole text was reparsed from scratch
    pub full_reparse: bool,
    /// Performance metrics
    pub metrics: UpdateMetrics,
}

/// Performance metrics for incremental updates
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateMetrics {
    /// Time taken for the update (in microseconds)
    pub update_time_us: u64,
    /// Tokens produced by the lexer
    pub tokens_relexed: usize,
    /// Tokens copied from the previous tree
    pub tokens_reused: usize,
    /// Statements parsed afresh
    pub statements_reparsed: usize,
    /// Statements shared with the previous tree
    pub statements_reused: usize,
    /// Span of the edited text, in post-edit coordinates
    pub affected_range: Option<TextRange>,
}

impl UpdateMetrics {
    /// Calculate the statement reuse ratio (0.0 to 1.0)
    pub fn reuse_ratio(&self) -> f64 {
        let total = self.statements_reparsed + self.statements_reused;
        if total == 0 {
            0.0
        } else {
            self.statements_reused as f64 / total as f64
        }
    }

    /// Check if the update was efficient (high reuse ratio)
    pub fn is_efficient(&self) -> bool {
        self.reuse_ratio() > 0.7 // 70% reuse threshold
    }
}

/// Handles incremental updates to EpochScript trees
#[derive(Debug, Clone, Default)]
pub struct IncrementalUpdater {
    config: ParserConfig,
}

impl IncrementalUpdater {
    /// Create a new incremental updater with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: ParserConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Set maximum size for incremental updates (larger changes trigger full reparse)
    pub fn max_incremental_size(mut self, size: usize) -> Self {
        self.config.max_incremental_size = size;
        self
    }

    /// Set how far relexing and reparsing look for a resynchronisation point
    pub fn max_resync_lookahead(mut self, tokens: usize) -> Self {
        self.config.max_resync_lookahead = tokens.max(1);
        self
    }

    /// Enable or disable reuse of the previous tree
    pub fn incremental(mut self, enabled: bool) -> Self {
        self.config.incremental = enabled;
        self
    }

    /// Apply a single text edit to a tree
    pub fn apply_edit(&self, tree: &SyntaxTree, edit: &TextEdit) -> Result<UpdateResult> {
        self.apply_edits(tree, std::slice::from_ref(edit))
    }

    /// Apply a batch of edits given in ascending pre-edit coordinates
    pub fn apply_edits(&self, tree: &SyntaxTree, edits: &[TextEdit]) -> Result<UpdateResult> {
        let start_time = Instant::now();
        validate_edits(tree.text(), edits)?;

        if edits.is_empty() {
            return Ok(UpdateResult {
                tree: tree.clone(),
                full_reparse: false,
                metrics: UpdateMetrics::default(),
            });
        }

        let new_source = apply_text_edits(tree.text(), edits);
        let changes = Change::from_edits(edits);
        let affected_range = changes.first().zip(changes.last()).map(|(first, last)| {
            TextRange::new(
                TextSize::from(first.new_start as u32),
                TextSize::from(last.new_end as u32),
            )
        });

        let mut result = if self.should_full_reparse(edits) {
            full_reparse(new_source)
        } else {
            self.incremental_reparse(tree, new_source, &changes)
        };
        result.metrics.affected_range = affected_range;
        result.metrics.update_time_us = start_time.elapsed().as_micros() as u64;

        tracing::debug!(
            full = result.full_reparse,
            tokens_relexed = result.metrics.tokens_relexed,
            tokens_reused = result.metrics.tokens_reused,
            statements_reparsed = result.metrics.statements_reparsed,
            statements_reused = result.metrics.statements_reused,
            update_time_us = result.metrics.update_time_us,
            "reparsed after {} edit(s)",
            edits.len()
        );
        Ok(result)
    }

    /// Check if we should do a full reparse instead of incremental update
    fn should_full_reparse(&self, edits: &[TextEdit]) -> bool {
        let inserted: usize = edits.iter().map(|edit| edit.new_text.len()).sum();
        !self.config.incremental || inserted > self.config.max_incremental_size
    }

    fn incremental_reparse(
        &self,
        tree: &SyntaxTree,
        new_source: String,
        changes: &[Change],
    ) -> UpdateResult {
        let limit = self.config.max_resync_lookahead.max(1);
        let relexed = relex(tree.tokens(), &new_source, changes, limit);
        let mut metrics = UpdateMetrics {
            tokens_relexed: relexed.relexed,
            tokens_reused: relexed.tokens.len() - relexed.relexed,
            ..UpdateMetrics::default()
        };

        let old_statements = tree.statements();
        let mut cache = NodeCache::default();
        let mut statements = Vec::with_capacity(old_statements.len());
        let mut pos = 0;
        let mut old_cursor = 0;
        let mut run_index = 0;
        let mut misaligned = 0;
        let mut reuse_enabled = true;

        loop {
            while relexed
                .runs
                .get(run_index)
                .is_some_and(|run| run.new_end() <= pos)
            {
                run_index += 1;
            }
            let run = relexed
                .runs
                .get(run_index)
                .filter(|run| run.new_start <= pos);

            if let Some(run) = run.filter(|_| reuse_enabled) {
                let old_index = run.old_start + (pos - run.new_start);
                old_cursor += old_statements[old_cursor..]
                    .partition_point(|slot| slot.first_token < old_index);
                let reused = reusable_statements(&old_statements[old_cursor..], old_index, run);
                if !reused.is_empty() {
                    let offset = pos as isize - old_index as isize;
                    statements.extend(reused.iter().map(|slot| slot.moved(offset)));
                    pos += reused.iter().map(|slot| slot.token_count).sum::<usize>();
                    old_cursor += reused.len();
                    misaligned = 0;
                    metrics.statements_reused += reused.len();
                    continue;
                }
            }

            let Some(parsed) = parse_statement_at(&new_source, &relexed.tokens, pos, &mut cache)
            else {
                break;
            };
            let end = pos + parsed.token_count;
            if reuse_enabled && run.is_some_and(|run| end <= run.new_end()) {
                // Unchanged tokens, but no old statement started here
                misaligned += 1;
                if misaligned >= limit {
                    tracing::trace!(token = pos, "statement boundaries did not realign");
                    reuse_enabled = false;
                }
            } else {
                misaligned = 0;
            }
            statements.push(StatementSlot::new(pos, parsed));
            pos = end;
            metrics.statements_reparsed += 1;
        }

        let green = build_program(
            statements.iter().map(|slot| slot.green.clone()),
            relexed.tokens.iter_from(pos),
            &new_source,
        );
        UpdateResult {
            tree: SyntaxTree::from_parts(green, new_source, relexed.tokens, statements),
            full_reparse: false,
            metrics,
        }
    }
}

/// Reparse `source` after applying `edits` to `tree`
///
/// Shorthand for [`IncrementalUpdater::apply_edits`] with default settings.
pub fn reparse(tree: &SyntaxTree, edits: &[TextEdit]) -> Result<SyntaxTree> {
    IncrementalUpdater::new()
        .apply_edits(tree, edits)
        .map(|result| result.tree)
}

fn full_reparse(new_source: String) -> UpdateResult {
    let tokens = TokenStream::from(lex_with_trivia(&new_source));
    let tree = parse_tokens(new_source, tokens);
    let metrics = UpdateMetrics {
        tokens_relexed: tree.tokens().len(),
        statements_reparsed: tree.statements().len(),
        ..UpdateMetrics::default()
    };
    UpdateResult {
        tree,
        full_reparse: true,
        metrics,
    }
}

/// Leading old statements that can be reused as they are
///
/// The first must start at token `old_index`, and every token each one
/// examined must lie in `run`.
fn reusable_statements<'a>(
    candidates: &'a [StatementSlot],
    old_index: usize,
    run: &Run,
) -> &'a [StatementSlot] {
    if candidates.first().is_none_or(|slot| slot.first_token != old_index) {
        return &[];
    }
    let run_end = run.old_start + run.len;
    let count = candidates
        .iter()
        .take_while(|slot| slot.first_token + slot.examined <= run_end)
        .count();
    &candidates[..count]
}

/// One edit in both coordinate systems
#[derive(Debug, Clone, Copy)]
struct Change {
    old_start: usize,
    old_end: usize,
    new_start: usize,
    new_end: usize,
}

impl Change {
    fn from_edits(edits: &[TextEdit]) -> Vec<Change> {
        let mut delta = 0isize;
        edits
            .iter()
            .map(|edit| {
                let new_start = edit.start().wrapping_add_signed(delta);
                let change = Change {
                    old_start: edit.start(),
                    old_end: edit.end(),
                    new_start,
                    new_end: new_start + edit.new_text.len(),
                };
                delta = change.delta();
                change
            })
            .collect()
    }

    /// Shift applied to old offsets after this change
    fn delta(&self) -> isize {
        self.new_end as isize - self.old_end as isize
    }
}

/// Stretch of tokens copied unchanged from the old stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Run {
    new_start: usize,
    old_start: usize,
    len: usize,
}

impl Run {
    fn new_end(&self) -> usize {
        self.new_start + self.len
    }
}

struct Relexed {
    tokens: TokenStream,
    runs: Vec<Run>,
    relexed: usize,
}

/// Produce the token stream of `new_source` from the old stream and the edits
fn relex(old: &TokenStream, new_source: &str, changes: &[Change], limit: usize) -> Relexed {
    let mut tokens = TokenStreamBuilder::default();
    let mut runs = Vec::new();
    let mut relexed = 0;
    let mut old_index = 0;
    let mut delta = 0isize;
    let mut next_change = 0;

    'copy: loop {
        let bound = changes.get(next_change).map(|change| change.old_start);
        let new_start = tokens.len();
        let copied_to = old.copy_into(old_index, bound, delta, &mut tokens);
        if copied_to > old_index {
            runs.push(Run {
                new_start,
                old_start: old_index,
                len: copied_to - old_index,
            });
        }
        old_index = copied_to;

        let Some(change) = changes.get(next_change) else {
            break;
        };
        next_change += 1;
        delta = change.delta();
        let mut edited_end = change.new_end;
        let mut pos = tokens.end_offset();
        let mut past_edit = 0;

        loop {
            while let Some(later) = changes.get(next_change).filter(|c| c.new_start < pos) {
                delta = later.delta();
                edited_end = edited_end.max(later.new_end);
                next_change += 1;
            }

            if pos >= edited_end {
                if let Some(index) = old_token_starting_at(old, pos as isize - delta, old_index) {
                    old_index = index;
                    continue 'copy;
                }
                past_edit += 1;
                if past_edit > limit {
                    tracing::trace!(offset = pos, "token boundaries did not realign");
                    relexed += lex_rest(new_source, pos, &mut tokens);
                    break 'copy;
                }
            }

            let Some(token) = lex_token(new_source, pos) else {
                break 'copy;
            };
            pos = token.span.end;
            tokens.push(token);
            relexed += 1;
        }
    }

    Relexed {
        tokens: tokens.finish(),
        runs,
        relexed,
    }
}

fn old_token_starting_at(old: &TokenStream, offset: isize, from: usize) -> Option<usize> {
    let offset = usize::try_from(offset).ok()?;
    old.index_starting_at(offset).filter(|&index| index >= from)
}

fn lex_rest(source: &str, mut pos: usize, tokens: &mut TokenStreamBuilder) -> usize {
    let mut count = 0;
    while let Some(token) = lex_token(source, pos) {
        pos = token.span.end;
        tokens.push(token);
        count += 1;
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;

    #[test]
    fn test_apply_text_edits() {
        let source = "fast = ema(12)\nslow = ema(26)";
        let edits = vec![
            TextEdit::replace_range(0..4, "quick"),
            TextEdit::replace_range(26..28, "50"),
        ];
        assert_eq!(
            apply_text_edits(source, &edits),
            "quick = ema(12)\nslow = ema(50)"
        );
    }

    #[test]
    fn test_validate_edits() {
        let source = "x = 'é'";
        let ok = [
            TextEdit::insert(TextSize::from(1), "a"),
            TextEdit::insert(TextSize::from(1), "b"),
            TextEdit::replace_range(1..3, ""),
            TextEdit::replace_range(3..4, "+"),
        ];
        assert!(validate_edits(source, &ok).is_ok());

        let check = |edits: &[TextEdit]| match validate_edits(source, edits) {
            Err(EpochError::IncrementalInconsistency { index, reason }) => Some((index, reason)),
            _ => None,
        };
        assert_eq!(
            check(&[
                TextEdit::replace_range(4..5, ""),
                TextEdit::replace_range(1..2, ""),
            ]),
            Some((1, EditViolation::OutOfOrder))
        );
        assert_eq!(
            check(&[
                TextEdit::replace_range(1..4, ""),
                TextEdit::replace_range(2..5, ""),
            ]),
            Some((1, EditViolation::Overlapping))
        );
        assert_eq!(
            check(&[TextEdit::replace_range(0..40, "")]),
            Some((0, EditViolation::OutOfBounds))
        );
        assert_eq!(
            check(&[TextEdit::replace_range(6..7, "")]),
            Some((0, EditViolation::NotCharBoundary))
        );
    }

    #[test]
    fn test_relex_resynchronises() {
        let old_source = "a = 1\nb = 2\nc = 3\n";
        let old = TokenStream::from(lex_with_trivia(old_source));
        let edits = [TextEdit::replace_range(10..11, "20")];
        let new_source = apply_text_edits(old_source, &edits);
        let relexed = relex(&old, &new_source, &Change::from_edits(&edits), 64);

        assert_eq!(relexed.tokens, TokenStream::from(lex_with_trivia(&new_source)));
        // The number, and the whitespace whose scan peeked at it
        assert_eq!(relexed.relexed, 2);
        assert_eq!(
            relexed.runs,
            vec![
                Run {
                    new_start: 0,
                    old_start: 0,
                    len: 9
                },
                Run {
                    new_start: 11,
                    old_start: 11,
                    len: 7
                },
            ]
        );
    }

    #[test]
    fn test_relex_uses_lookahead() {
        // "1" looked at "x" to rule out a timeframe unit
        let old_source = "y = 1x\n";
        let old = TokenStream::from(lex_with_trivia(old_source));
        let edits = [TextEdit::replace_range(5..6, "D")];
        let new_source = apply_text_edits(old_source, &edits);
        let relexed = relex(&old, &new_source, &Change::from_edits(&edits), 64);
        assert_eq!(relexed.tokens, TokenStream::from(lex_with_trivia(&new_source)));
        let timeframe = relexed.tokens.get(4).expect("token");
        assert_eq!(timeframe.text(&new_source), "1D");
    }

    #[test]
    fn test_relex_absorbs_adjacent_changes() {
        let old_source = "abc = de\n";
        let old = TokenStream::from(lex_with_trivia(old_source));
        let edits = [
            TextEdit::replace_range(1..2, "X"),
            TextEdit::replace_range(2..3, "Y"),
            TextEdit::insert(TextSize::from(8), "f"),
        ];
        let new_source = apply_text_edits(old_source, &edits);
        let relexed = relex(&old, &new_source, &Change::from_edits(&edits), 64);
        assert_eq!(new_source, "aXY = def\n");
        assert_eq!(relexed.tokens, TokenStream::from(lex_with_trivia(&new_source)));
    }

    #[test]
    fn test_incremental_update_reuses_statements() {
        let source = "a = 1\nb = 2\nc = 3\n";
        let tree = parse(source);
        let updater = IncrementalUpdater::new();

        let result = updater
            .apply_edit(&tree, &TextEdit::replace_range(10..11, "20"))
            .unwrap();
        assert!(!result.full_reparse);
        assert_eq!(result.tree.text(), "a = 1\nb = 20\nc = 3\n");
        assert_eq!(result.tree.green(), parse(result.tree.text()).green());
        assert_eq!(result.metrics.statements_reused, 2);
        assert_eq!(result.metrics.statements_reparsed, 1);

        let old = tree.statements();
        let new = result.tree.statements();
        assert!(new[0].shares_green_with(&old[0]));
        assert!(!new[1].shares_green_with(&old[1]));
        assert!(new[2].shares_green_with(&old[2]));
    }

    #[test]
    fn test_full_reparse_thresholds() {
        let tree = parse("a = 1\n");
        let edit = TextEdit::insert(TextSize::from(6), "b = 2\n");

        let result = IncrementalUpdater::new()
            .max_incremental_size(3)
            .apply_edit(&tree, &edit)
            .unwrap();
        assert!(result.full_reparse);

        let result = IncrementalUpdater::new()
            .incremental(false)
            .apply_edit(&tree, &edit)
            .unwrap();
        assert!(result.full_reparse);
        assert_eq!(result.tree.text(), "a = 1\nb = 2\n");
        assert_eq!(result.metrics.statements_reparsed, 2);
    }

    #[test]
    fn test_empty_batch_returns_same_tree() {
        let tree = parse("a = 1\n");
        let result = IncrementalUpdater::new().apply_edits(&tree, &[]).unwrap();
        assert_eq!(result.metrics, UpdateMetrics::default());
        assert!(result.tree.statements()[0].shares_green_with(&tree.statements()[0]));
    }

    #[test]
    fn test_reversed_range_is_an_insertion() {
        let edit = TextEdit::replace_range(5..2, "x");
        assert_eq!(edit.range, TextRange::empty(TextSize::from(5)));
        assert!(edit.is_insertion());

        let tree = parse("a = 1\nb = 2\n");
        let result = IncrementalUpdater::new()
            .apply_edit(&tree, &TextEdit::replace_range(5..2, ""))
            .unwrap();
        assert_eq!(result.tree.text(), tree.text());

        let far = TextEdit::replace_range(usize::MAX..0, "");
        assert!(matches!(
            validate_edits(tree.text(), &[far]),
            Err(EpochError::IncrementalInconsistency {
                index: 0,
                reason: EditViolation::OutOfBounds
            })
        ));
    }

    #[test]
    fn test_edit_shares_unchanged_tokens() {
        let tree = parse(&"x = 1\n".repeat(2000));
        let result = IncrementalUpdater::new()
            .apply_edit(&tree, &TextEdit::replace_range(4..5, "42"))
            .unwrap();

        let tokens = result.tree.tokens();
        assert_eq!(tokens, parse(result.tree.text()).tokens());
        assert!(tokens.shares_storage_with(tree.tokens()));
        assert_eq!(tokens.chunk_count(), 3);
        assert_eq!(result.metrics.tokens_relexed, 2);

        assert_eq!(result.metrics.statements_reused, 1999);
        let last = result.tree.statements().last().expect("statement");
        assert_eq!(last.first_token, 1999 * 6);
        assert!(last.shares_green_with(&tree.statements()[1999]));
    }
}
