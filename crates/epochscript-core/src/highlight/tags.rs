//! Presentation tags
//!
//! A [`Tag`] is a base category plus modifiers. Modifiers are listed
//! innermost first, so `standard(function(variableName))` is
//! `VariableName` with `[Function, Standard]`.

use std::fmt;

use serde::Serialize;

/// Base presentation category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TagName {
    VariableName,
    PropertyName,
    TypeName,
    Number,
    String,
    Bool,
    Null,
    Literal,
    Keyword,
    CompareOperator,
    LineComment,
    List,
}

impl TagName {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::VariableName => "variableName",
            Self::PropertyName => "propertyName",
            Self::TypeName => "typeName",
            Self::Number => "number",
            Self::String => "string",
            Self::Bool => "bool",
            Self::Null => "null",
            Self::Literal => "literal",
            Self::Keyword => "keyword",
            Self::CompareOperator => "compareOperator",
            Self::LineComment => "lineComment",
            Self::List => "list",
        }
    }
}

/// Refinement wrapped around a tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TagModifier {
    Function,
    Standard,
    Special,
    Definition,
}

impl TagModifier {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Function => "function",
            Self::Standard => "standard",
            Self::Special => "special",
            Self::Definition => "definition",
        }
    }
}

/// A base category with modifiers applied innermost first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Tag {
    pub name: TagName,
    pub modifiers: &'static [TagModifier],
}

impl Tag {
    pub const fn plain(name: TagName) -> Self {
        Self {
            name,
            modifiers: &[],
        }
    }

    pub const fn modified(name: TagName, modifiers: &'static [TagModifier]) -> Self {
        Self { name, modifiers }
    }

    pub fn has_modifier(&self, modifier: TagModifier) -> bool {
        self.modifiers.contains(&modifier)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for modifier in self.modifiers.iter().rev() {
            write!(f, "{}(", modifier.as_str())?;
        }
        f.write_str(self.name.as_str())?;
        for _ in self.modifiers {
            f.write_str(")")?;
        }
        Ok(())
    }
}
