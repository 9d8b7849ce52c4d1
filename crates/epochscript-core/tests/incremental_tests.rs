//! Incremental reparsing must agree with a from-scratch parse
//!
//! Every test compares the incrementally updated tree with `parse` of the
//! edited text: green trees are structurally equal and the token streams,
//! lookahead included, are identical.

use epochscript_core::cst::{EditViolation, TextEdit};
use epochscript_core::{EpochError, ErrorKind, IncrementalUpdater, SyntaxTree, parse, reparse};
use proptest::prelude::*;
use proptest::sample::Index;

const SCRIPT: &str = "\
# Momentum crossover
src = market_data_source(timeframe=1D)()
fast = ema(period=12)(src.c)
slow = ema(period=26)(src.c)
signal = 1.0 if fast > slow else -1.0
spread = (src.h - src.l) / src.c * 100
prev = src.c >> 1
bands = {'upper': fast, 'lower': slow}
out = signal | smooth(5) | clip(lo=-1, hi=1)
doc = \"\"\"multi
line\"\"\"
";

fn assert_matches_full_parse(tree: &SyntaxTree) {
    let fresh = parse(tree.text());
    assert_eq!(tree.green(), fresh.green(), "green mismatch for {:?}", tree.text());
    assert_eq!(tree.tokens(), fresh.tokens(), "token mismatch for {:?}", tree.text());
    assert_eq!(tree.statements().len(), fresh.statements().len());
}

fn apply(tree: &SyntaxTree, edits: &[TextEdit]) -> SyntaxTree {
    let tree = reparse(tree, edits).expect("valid edits");
    assert_matches_full_parse(&tree);
    tree
}

#[test]
fn edit_inside_one_statement_reuses_the_others() {
    let tree = parse("a = 1\nb = 2\nc = 3\n");
    let result = IncrementalUpdater::new()
        .apply_edit(&tree, &TextEdit::replace_range(10..11, "42"))
        .expect("valid edit");

    assert!(!result.full_reparse);
    assert_eq!(result.tree.text(), "a = 1\nb = 42\nc = 3\n");
    assert_eq!(result.metrics.statements_reused, 2);
    assert_eq!(result.metrics.statements_reparsed, 1);
    assert!(result.metrics.tokens_reused > result.metrics.tokens_relexed);
    assert_matches_full_parse(&result.tree);

    let old = tree.statements();
    let new = result.tree.statements();
    assert!(new[0].shares_green_with(&old[0]));
    assert!(!new[1].shares_green_with(&old[1]));
    assert!(new[2].shares_green_with(&old[2]));
}

#[test]
fn reused_statements_in_a_larger_script() {
    let tree = parse(SCRIPT);
    let offset = SCRIPT.find("period=26").expect("present") + "period=".len();
    let result = IncrementalUpdater::new()
        .apply_edit(&tree, &TextEdit::replace_range(offset..offset + 2, "50"))
        .expect("valid edit");

    assert_eq!(result.metrics.statements_reparsed, 1);
    assert_eq!(
        result.metrics.statements_reused,
        tree.statements().len() - 1
    );
    assert!(result.metrics.is_efficient());
    assert_matches_full_parse(&result.tree);
}

#[test]
fn edits_that_change_token_boundaries() {
    // Opening a triple-quoted string swallows the rest of the text
    let tree = parse("a = 1\nb = 2\n");
    let opened = apply(&tree, &[TextEdit::replace_range(4..4, "\"\"\"")]);
    assert!(opened.has_errors());
    let closed = apply(&opened, &[TextEdit::replace_range(4..7, "")]);
    assert_eq!(closed.green(), tree.green());

    // Deleting a space merges a number and a unit into a timeframe
    let tree = parse("tf = 1 D\n");
    let merged = apply(&tree, &[TextEdit::replace_range(6..7, "")]);
    assert_eq!(merged.text(), "tf = 1D\n");

    // Commenting out a statement
    let tree = parse("a = 1\nb = 2\n");
    apply(&tree, &[TextEdit::replace_range(6..6, "# ")]);

    // Splitting a statement across a newline and joining it back
    let tree = parse("a = f(1, 2)\nb = 3\n");
    let split = apply(&tree, &[TextEdit::replace_range(5..5, "\n")]);
    apply(&split, &[TextEdit::replace_range(5..6, "")]);

    // Newlines inside brackets stay trivia
    let tree = parse("a = [1, 2]\n");
    let wrapped = apply(&tree, &[TextEdit::replace_range(7..8, "\n")]);
    assert!(!wrapped.has_errors());
}

#[test]
fn batches_in_ascending_order() {
    let tree = parse("fast = ema(12)\nslow = ema(26)\nx = fast - slow\n");
    let updated = apply(
        &tree,
        &[
            TextEdit::replace_range(0..4, "quick"),
            TextEdit::replace_range(26..28, "50"),
            TextEdit::replace_range(29..29, "\ny = 0"),
        ],
    );
    assert_eq!(
        updated.text(),
        "quick = ema(12)\nslow = ema(50)\ny = 0\nx = fast - slow\n"
    );
}

#[test]
fn typing_a_script_character_by_character() {
    let target = "out = src.c | sma(20) >> 1  # lagged\nflag = out > 0 and not halt\n";
    let mut tree = parse("");
    for (offset, ch) in target.char_indices() {
        tree = apply(
            &tree,
            &[TextEdit::replace_range(offset..offset, ch.to_string())],
        );
    }
    assert_eq!(tree.text(), target);
    assert!(!tree.has_errors());

    // And deleting it again from the front
    while !tree.text().is_empty() {
        tree = apply(&tree, &[TextEdit::replace_range(0..1, "")]);
    }
    assert!(tree.statements().is_empty());
}

#[test]
fn no_op_edit_is_idempotent() {
    let tree = parse(SCRIPT);
    let offset = SCRIPT.find("ema").expect("present");
    let same = apply(&tree, &[TextEdit::replace_range(offset..offset + 3, "ema")]);
    assert_eq!(same.green(), tree.green());
    assert_eq!(same.tokens(), tree.tokens());
}

#[test]
fn empty_batch_returns_the_same_tree() {
    let tree = parse(SCRIPT);
    let result = IncrementalUpdater::new()
        .apply_edits(&tree, &[])
        .expect("empty batch");
    assert!(!result.full_reparse);
    assert_eq!(result.tree.green(), tree.green());
    assert_eq!(result.metrics.statements_reparsed, 0);
}

#[test]
fn large_insertions_take_a_full_reparse() {
    let tree = parse("a = 1\n");
    let updater = IncrementalUpdater::new().max_incremental_size(3);
    let result = updater
        .apply_edit(&tree, &TextEdit::replace_range(6..6, "b = 2\n"))
        .expect("valid edit");
    assert!(result.full_reparse);
    assert_eq!(result.metrics.statements_reused, 0);
    assert_matches_full_parse(&result.tree);

    let result = updater
        .apply_edit(&tree, &TextEdit::replace_range(4..5, "7"))
        .expect("valid edit");
    assert!(!result.full_reparse);
}

#[test]
fn disabled_reuse_always_reparses() {
    let tree = parse("a = 1\nb = 2\n");
    let result = IncrementalUpdater::new()
        .incremental(false)
        .apply_edit(&tree, &TextEdit::replace_range(4..5, "7"))
        .expect("valid edit");
    assert!(result.full_reparse);
    assert_eq!(result.metrics.statements_reparsed, 2);
    assert_matches_full_parse(&result.tree);
}

#[test]
fn short_resync_lookahead_still_agrees() {
    let tree = parse(SCRIPT);
    let updater = IncrementalUpdater::new().max_resync_lookahead(1);
    let result = updater
        .apply_edit(&tree, &TextEdit::replace_range(0..0, "\"\"\""))
        .expect("valid edit");
    assert_matches_full_parse(&result.tree);
}

#[test]
fn inconsistent_batches_are_rejected() {
    let tree = parse("x = 'é'\n");
    let reject = |edits: &[TextEdit]| -> (usize, EditViolation) {
        match reparse(&tree, edits) {
            Err(EpochError::IncrementalInconsistency { index, reason }) => (index, reason),
            other => panic!("expected rejection, got {other:?}"),
        }
    };

    assert_eq!(
        reject(&[
            TextEdit::replace_range(4..5, ""),
            TextEdit::replace_range(0..1, "y"),
        ]),
        (1, EditViolation::OutOfOrder)
    );
    assert_eq!(
        reject(&[
            TextEdit::replace_range(0..3, ""),
            TextEdit::replace_range(2..4, ""),
        ]),
        (1, EditViolation::Overlapping)
    );
    assert_eq!(
        reject(&[TextEdit::replace_range(0..100, "")]),
        (0, EditViolation::OutOfBounds)
    );
    assert_eq!(
        reject(&[TextEdit::replace_range(5..6, "e")]),
        (0, EditViolation::NotCharBoundary)
    );

    let err = reparse(&tree, &[TextEdit::replace_range(0..100, "")]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Incremental);
}

const FRAGMENTS: &[&str] = &[
    "", " ", "\n", "x", "1", "1D", "W-FRI", "'", "\"\"\"", "#", "(", ")", "[", "]", "{", "}",
    ",", ":", "=", "==", ">>", "<", "|", ".", "if ", " else ", "not ", "and", "f(a=1)",
    "\ny = 2\n", ";", "@",
];

fn edit_strategy() -> impl Strategy<Value = (Index, Index, usize)> {
    (any::<Index>(), any::<Index>(), 0..FRAGMENTS.len())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn random_edit_batches_match_full_parse(
        raw in prop::collection::vec(edit_strategy(), 1..4)
    ) {
        let tree = parse(SCRIPT);
        let len = SCRIPT.len();

        // Ascending, disjoint ranges over the ASCII script
        let mut bounds: Vec<(usize, usize, &str)> = raw
            .iter()
            .map(|(start, width, fragment)| {
                let start = start.index(len + 1);
                let end = (start + width.index(8)).min(len);
                (start, end, FRAGMENTS[*fragment])
            })
            .collect();
        bounds.sort_by_key(|&(start, _, _)| start);
        let mut edits = Vec::new();
        let mut last_end = 0;
        for (start, end, fragment) in bounds {
            if start < last_end {
                continue;
            }
            edits.push(TextEdit::replace_range(start..end, fragment));
            last_end = end;
        }

        let updated = reparse(&tree, &edits).expect("edits are consistent");
        let fresh = parse(updated.text());
        prop_assert_eq!(updated.green(), fresh.green());
        prop_assert_eq!(updated.tokens(), fresh.tokens());
        prop_assert_eq!(updated.syntax().text().to_string(), updated.text());
    }

    #[test]
    fn chained_edits_match_full_parse(
        raw in prop::collection::vec(edit_strategy(), 1..12)
    ) {
        let mut tree = parse(SCRIPT);
        for (start, width, fragment) in raw {
            let len = tree.text().len();
            let start = start.index(len + 1);
            let end = (start + width.index(4)).min(len);
            tree = reparse(&tree, &[TextEdit::replace_range(start..end, FRAGMENTS[fragment])])
                .expect("edit is consistent");
        }
        let fresh = parse(tree.text());
        prop_assert_eq!(tree.green(), fresh.green());
        prop_assert_eq!(tree.tokens(), fresh.tokens());
    }
}
