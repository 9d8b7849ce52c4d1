//! Static tag rule table and built-in name sets

use std::collections::HashMap;
use std::sync::LazyLock;

use super::tags::{Tag, TagModifier, TagName};
use crate::cst::EpochSyntaxKind as K;

/// Maps elements whose ancestor path ends with `pattern` to `tag`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagRule {
    /// Kinds from an ancestor down to the element itself, each the parent of
    /// the next
    pub pattern: &'static [K],
    pub tag: Tag,
}

impl TagRule {
    pub fn matches(&self, path: &[K]) -> bool {
        path.ends_with(self.pattern)
    }
}

const FUNCTION_NAME: Tag = Tag::modified(TagName::VariableName, &[TagModifier::Function]);
const KEYWORD: Tag = Tag::plain(TagName::Keyword);
const LIST: Tag = Tag::plain(TagName::List);

pub static TAG_RULES: &[TagRule] = &[
    TagRule {
        pattern: &[K::Identifier],
        tag: Tag::plain(TagName::VariableName),
    },
    TagRule {
        pattern: &[K::CallExpression, K::AttributeExpression, K::Identifier],
        tag: FUNCTION_NAME,
    },
    TagRule {
        pattern: &[K::CallExpression, K::Identifier],
        tag: FUNCTION_NAME,
    },
    TagRule {
        pattern: &[K::KeywordArgument, K::Identifier],
        tag: Tag::plain(TagName::PropertyName),
    },
    TagRule {
        pattern: &[K::AttributeExpression, K::Identifier],
        tag: Tag::plain(TagName::PropertyName),
    },
    TagRule {
        pattern: &[K::AssignmentTargets, K::Identifier],
        tag: Tag::modified(TagName::VariableName, &[TagModifier::Definition]),
    },
    TagRule {
        pattern: &[K::BuiltinType],
        tag: Tag::plain(TagName::TypeName),
    },
    TagRule {
        pattern: &[K::BuiltinFunction],
        tag: Tag::modified(
            TagName::VariableName,
            &[TagModifier::Function, TagModifier::Standard],
        ),
    },
    TagRule {
        pattern: &[K::Number],
        tag: Tag::plain(TagName::Number),
    },
    TagRule {
        pattern: &[K::String],
        tag: Tag::plain(TagName::String),
    },
    TagRule {
        pattern: &[K::Boolean],
        tag: Tag::plain(TagName::Bool),
    },
    TagRule {
        pattern: &[K::None],
        tag: Tag::plain(TagName::Null),
    },
    TagRule {
        pattern: &[K::Timeframe],
        tag: Tag::modified(TagName::Literal, &[TagModifier::Special]),
    },
    TagRule {
        pattern: &[K::IfKw],
        tag: KEYWORD,
    },
    TagRule {
        pattern: &[K::ElseKw],
        tag: KEYWORD,
    },
    TagRule {
        pattern: &[K::AndKw],
        tag: KEYWORD,
    },
    TagRule {
        pattern: &[K::OrKw],
        tag: KEYWORD,
    },
    TagRule {
        pattern: &[K::NotKw],
        tag: KEYWORD,
    },
    TagRule {
        pattern: &[K::ComparisonOp],
        tag: Tag::plain(TagName::CompareOperator),
    },
    TagRule {
        pattern: &[K::Comment],
        tag: Tag::plain(TagName::LineComment),
    },
    TagRule {
        pattern: &[K::ListLiteral],
        tag: LIST,
    },
    TagRule {
        pattern: &[K::TupleLiteral],
        tag: LIST,
    },
    TagRule {
        pattern: &[K::DictLiteral],
        tag: LIST,
    },
    TagRule {
        pattern: &[K::DictPair],
        tag: Tag::modified(TagName::PropertyName, &[TagModifier::Definition]),
    },
];

/// Names classified as `BuiltinType`
pub const BUILTIN_TYPES: &[&str] = &[
    "Time",
    "Duration",
    "Session",
    "SessionAnchor",
    "EventMarkerSchema",
];

/// Names classified as `BuiltinFunction`
pub const BUILTIN_FUNCTIONS: &[&str] = &[
    "abs",
    "sqrt",
    "log",
    "exp",
    "pow",
    "min",
    "max",
    "round",
    "floor",
    "ceil",
    "crossover",
    "crossunder",
];

/// Classification kind of a built-in name
pub fn builtin_kind(name: &str) -> Option<K> {
    if BUILTIN_TYPES.contains(&name) {
        Some(K::BuiltinType)
    } else if BUILTIN_FUNCTIONS.contains(&name) {
        Some(K::BuiltinFunction)
    } else {
        None
    }
}

/// Rules keyed by the kind their pattern ends with, longest pattern first
static RULE_INDEX: LazyLock<HashMap<K, Vec<&'static TagRule>>> = LazyLock::new(|| {
    let mut index: HashMap<K, Vec<&'static TagRule>> = HashMap::new();
    for rule in TAG_RULES {
        if let Some(last) = rule.pattern.last() {
            index.entry(*last).or_default().push(rule);
        }
    }
    for rules in index.values_mut() {
        rules.sort_by_key(|rule| std::cmp::Reverse(rule.pattern.len()));
    }
    index
});

/// Most specific rule whose pattern is a suffix of `path`
pub fn match_path(path: &[K]) -> Option<&'static TagRule> {
    let last = path.last()?;
    RULE_INDEX
        .get(last)?
        .iter()
        .copied()
        .find(|rule| rule.matches(path))
}
