//! Projection of a syntax tree onto presentation tags
//!
//! Every element is tagged by the most specific rule matching its path from
//! the root. Built-in names are plain identifiers in the tree; the projector
//! substitutes `BuiltinType` / `BuiltinFunction` for the last path entry
//! unless the identifier names a keyword argument or a member.

use std::collections::HashMap;

use rowan::{NodeOrToken, TextRange, TextSize};

use super::rules::{builtin_kind, match_path};
use super::tags::Tag;
use crate::cst::{
    EpochSyntaxElement, EpochSyntaxKind, EpochSyntaxNode, EpochSyntaxToken, element_path,
};

/// Tags of the elements of one tree, in preorder
#[derive(Debug, Clone)]
pub struct TagMap {
    root: EpochSyntaxNode,
    entries: Vec<(EpochSyntaxElement, Tag)>,
    index: HashMap<EpochSyntaxElement, usize>,
}

impl TagMap {
    pub fn get(&self, element: &EpochSyntaxElement) -> Option<Tag> {
        self.index.get(element).map(|&i| self.entries[i].1)
    }

    /// Innermost tagged element covering `offset`, with its tag
    pub fn at_offset(&self, offset: usize) -> Option<(EpochSyntaxElement, Tag)> {
        if offset > usize::from(self.root.text_range().end()) {
            return None;
        }
        let token = self
            .root
            .token_at_offset(TextSize::from(offset as u32))
            .right_biased()?;
        let token_element: EpochSyntaxElement = token.clone().into();
        std::iter::once(token_element)
            .chain(token.parent_ancestors().map(NodeOrToken::Node))
            .find_map(|element| self.get(&element).map(|tag| (element, tag)))
    }

    pub fn iter(&self) -> impl Iterator<Item = &(EpochSyntaxElement, Tag)> {
        self.entries.iter()
    }

    /// Tagged tokens only, for span-based consumers
    pub fn token_spans(&self) -> impl Iterator<Item = (TextRange, Tag)> + '_ {
        self.entries
            .iter()
            .filter(|(element, _)| element.as_token().is_some())
            .map(|(element, tag)| (element.text_range(), *tag))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a TagMap {
    type Item = &'a (EpochSyntaxElement, Tag);
    type IntoIter = std::slice::Iter<'a, (EpochSyntaxElement, Tag)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Tag every element below and including `root`
///
/// # Example
///
/// ```
/// use epochscript_core::highlight::project_tags;
/// use epochscript_core::parse;
///
/// let tree = parse("x = abs(close) # note");
/// let tags = project_tags(&tree.syntax());
/// let (_, tag) = tags.at_offset(5).unwrap();
/// assert_eq!(tag.to_string(), "standard(function(variableName))");
/// ```
pub fn project_tags(root: &EpochSyntaxNode) -> TagMap {
    let mut entries = Vec::new();
    let mut index = HashMap::new();

    for element in root.descendants_with_tokens() {
        if let Some(tag) = tag_of(&element) {
            index.insert(element.clone(), entries.len());
            entries.push((element, tag));
        }
    }

    tracing::trace!(tagged = entries.len(), "projected tags");
    TagMap {
        root: root.clone(),
        entries,
        index,
    }
}

/// Tag of a single element, if any rule matches
pub fn tag_of(element: &EpochSyntaxElement) -> Option<Tag> {
    let mut path = element_path(element);
    if let NodeOrToken::Token(token) = element {
        if let Some(builtin) = classify_builtin(token) {
            if let Some(last) = path.last_mut() {
                *last = builtin;
            }
        }
    }
    match_path(&path).map(|rule| rule.tag)
}

fn classify_builtin(token: &EpochSyntaxToken) -> Option<EpochSyntaxKind> {
    if token.kind() != EpochSyntaxKind::Identifier || in_name_slot(token) {
        return None;
    }
    builtin_kind(token.text())
}

/// Keyword argument names and members after `.`
fn in_name_slot(token: &EpochSyntaxToken) -> bool {
    let Some(parent) = token.parent() else {
        return false;
    };
    let previous =
        std::iter::successors(token.prev_sibling_or_token(), |e| e.prev_sibling_or_token())
            .find(|e| !e.kind().is_trivia());
    match parent.kind() {
        EpochSyntaxKind::KeywordArgument => previous.is_none(),
        EpochSyntaxKind::AttributeExpression => {
            previous.is_some_and(|e| e.kind() == EpochSyntaxKind::Dot)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;

    /// `text: tag` for every tagged token
    fn token_tags(source: &str) -> Vec<String> {
        let tree = parse(source);
        let tags = project_tags(&tree.syntax());
        tags.iter()
            .filter_map(|(element, tag)| {
                element
                    .as_token()
                    .map(|token| format!("{}: {tag}", token.text()))
            })
            .collect()
    }

    #[test]
    fn test_two_stage_call_tags() {
        insta::assert_snapshot!(token_tags("x = sma(period=20)(src.c)").join("\n"), @r"
        x: definition(variableName)
        sma: function(variableName)
        period: propertyName
        20: number
        src: propertyName
        c: propertyName
        ");
    }

    #[test]
    fn test_builtins_outside_name_slots() {
        let tags = token_tags("t = Time(hour=9)\nm = max(a, b)\ny = f(abs=1).max");
        insta::assert_snapshot!(tags.join("\n"), @r"
        t: definition(variableName)
        Time: typeName
        hour: propertyName
        9: number
        m: definition(variableName)
        max: standard(function(variableName))
        a: variableName
        b: variableName
        y: definition(variableName)
        f: function(variableName)
        abs: propertyName
        1: number
        max: propertyName
        ");
    }

    #[test]
    fn test_literals_and_keywords() {
        let tags = token_tags("s = 'a' if True and not None else 1W-FRI  # c");
        insta::assert_snapshot!(tags.join("\n"), @r"
        s: definition(variableName)
        'a': string
        if: keyword
        True: bool
        and: keyword
        not: keyword
        None: null
        else: keyword
        1W-FRI: special(literal)
        # c: lineComment
        ");
    }

    #[test]
    fn test_node_tags() {
        let tree = parse("d = {'k': [1, (2, 3)]}\nok = a < b");
        let tags = project_tags(&tree.syntax());
        let node_tags: Vec<_> = tags
            .iter()
            .filter_map(|(element, tag)| {
                element
                    .as_node()
                    .map(|node| format!("{:?}: {tag}", node.kind()))
            })
            .collect();
        assert_eq!(
            node_tags,
            [
                "DictLiteral: list",
                "DictPair: definition(propertyName)",
                "ListLiteral: list",
                "TupleLiteral: list",
                "ComparisonOp: compareOperator",
            ]
        );
    }

    #[test]
    fn test_at_offset_prefers_innermost() {
        let tree = parse("p = {'k': v}");
        let tags = project_tags(&tree.syntax());
        let (element, tag) = tags.at_offset(5).unwrap();
        assert_eq!(element.kind(), EpochSyntaxKind::String);
        assert_eq!(tag.to_string(), "string");

        // The colon itself is untagged, its pair is not
        let (element, _) = tags.at_offset(8).unwrap();
        assert_eq!(element.kind(), EpochSyntaxKind::DictPair);
        assert!(tags.at_offset(100).is_none());
    }

    #[test]
    fn test_projection_does_not_touch_tree() {
        let tree = parse("a = b | c");
        let before = tree.green().clone();
        let tags = project_tags(&tree.syntax());
        assert_eq!(*tree.green(), before);
        assert!(tags.get(&tree.syntax().into()).is_none());
        assert_eq!(tags.token_spans().count(), tags.len());
    }
}
