//! Semantic presentation tags for EpochScript trees
//!
//! The projector is a pure function from a tree to a [`TagMap`]; it never
//! mutates the tree and knows nothing about colours or styles. Rules match a
//! suffix of an element's root-to-element kind path, the longest match wins:
//!
//! | Pattern | Tag |
//! |---|---|
//! | `Identifier` | `variableName` |
//! | `CallExpression/Identifier` | `function(variableName)` |
//! | `KeywordArgument/Identifier` | `propertyName` |
//! | `AssignmentTargets/Identifier` | `definition(variableName)` |
//! | `BuiltinFunction` | `standard(function(variableName))` |
//! | `Timeframe` | `special(literal)` |
//!
//! The full table is [`TAG_RULES`].

mod projector;
mod rules;
mod tags;

pub use projector::{TagMap, project_tags, tag_of};
pub use rules::{BUILTIN_FUNCTIONS, BUILTIN_TYPES, TAG_RULES, TagRule, builtin_kind, match_path};
pub use tags::{Tag, TagModifier, TagName};
