//! Syntax kinds for EpochScript
//!
//! A single enum covers tokens produced by the lexer, nodes produced by the
//! parser, and two classification kinds that only the tag projector uses.
//! Rowan stores kinds as `u16`, so the discriminants are contiguous from zero
//! and [`EpochSyntaxKind::ALL`] lists them in discriminant order.

use std::fmt;

/// All token and node kinds of the EpochScript CST
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EpochSyntaxKind {
    // Trivia
    Whitespace = 0,
    Newline,
    Comment,

    // Literals & identifiers
    Identifier,
    Number,
    Timeframe,
    String,
    Boolean,
    None,

    // Keywords
    IfKw,
    ElseKw,
    AndKw,
    OrKw,
    NotKw,

    // Operators
    Plus,
    Minus,
    Star,
    StarStar,
    Slash,
    Percent,
    Pipe,
    ShiftRight,
    ShiftLeft,
    Lt,
    Gt,
    LtEq,
    GtEq,
    EqEq,
    NotEq,
    Eq,

    // Punctuation
    Dot,
    Comma,
    Colon,
    Semicolon,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,

    // Lexer error token and error-marked node
    Error,
    /// Sentinel returned by the parser past the last token, never stored in a tree
    Eof,

    // Statements
    Program,
    Assignment,
    AssignmentTargets,
    ExpressionStatement,

    // Expressions
    ConditionalExpression,
    BinaryExpression,
    UnaryExpression,
    ComparisonExpression,
    ComparisonOp,
    PipelineExpression,
    CallExpression,
    ArgumentList,
    KeywordArgument,
    AttributeExpression,
    ParenthesizedExpression,

    // Containers
    TupleLiteral,
    ListLiteral,
    DictLiteral,
    DictPair,

    // Classification kinds assigned by the tag projector to plain identifiers
    BuiltinType,
    BuiltinFunction,
}

impl EpochSyntaxKind {
    /// Every kind, indexed by its discriminant
    pub const ALL: &'static [EpochSyntaxKind] = &[
        Self::Whitespace,
        Self::Newline,
        Self::Comment,
        Self::Identifier,
        Self::Number,
        Self::Timeframe,
        Self::String,
        Self::Boolean,
        Self::None,
        Self::IfKw,
        Self::ElseKw,
        Self::AndKw,
        Self::OrKw,
        Self::NotKw,
        Self::Plus,
        Self::Minus,
        Self::Star,
        Self::StarStar,
        Self::Slash,
        Self::Percent,
        Self::Pipe,
        Self::ShiftRight,
        Self::ShiftLeft,
        Self::Lt,
        Self::Gt,
        Self::LtEq,
        Self::GtEq,
        Self::EqEq,
        Self::NotEq,
        Self::Eq,
        Self::Dot,
        Self::Comma,
        Self::Colon,
        Self::Semicolon,
        Self::LParen,
        Self::RParen,
        Self::LBracket,
        Self::RBracket,
        Self::LBrace,
        Self::RBrace,
        Self::Error,
        Self::Eof,
        Self::Program,
        Self::Assignment,
        Self::AssignmentTargets,
        Self::ExpressionStatement,
        Self::ConditionalExpression,
        Self::BinaryExpression,
        Self::UnaryExpression,
        Self::ComparisonExpression,
        Self::ComparisonOp,
        Self::PipelineExpression,
        Self::CallExpression,
        Self::ArgumentList,
        Self::KeywordArgument,
        Self::AttributeExpression,
        Self::ParenthesizedExpression,
        Self::TupleLiteral,
        Self::ListLiteral,
        Self::DictLiteral,
        Self::DictPair,
        Self::BuiltinType,
        Self::BuiltinFunction,
    ];

    /// Look up a kind by its raw discriminant
    pub fn from_raw(raw: u16) -> Option<Self> {
        Self::ALL.get(raw as usize).copied()
    }

    /// Whitespace, newlines and comments
    pub fn is_trivia(self) -> bool {
        matches!(self, Self::Whitespace | Self::Newline | Self::Comment)
    }

    pub fn is_keyword(self) -> bool {
        matches!(
            self,
            Self::IfKw | Self::ElseKw | Self::AndKw | Self::OrKw | Self::NotKw
        )
    }

    /// Tokens that form an atom on their own
    pub fn is_literal(self) -> bool {
        matches!(
            self,
            Self::Identifier
                | Self::Number
                | Self::Timeframe
                | Self::String
                | Self::Boolean
                | Self::None
        )
    }

    pub fn is_comparison_operator(self) -> bool {
        matches!(
            self,
            Self::Lt | Self::Gt | Self::LtEq | Self::GtEq | Self::EqEq | Self::NotEq
        )
    }

    pub fn is_operator(self) -> bool {
        (Self::Plus as u16..=Self::Eq as u16).contains(&(self as u16))
    }

    pub fn is_punctuation(self) -> bool {
        (Self::Dot as u16..=Self::RBrace as u16).contains(&(self as u16))
    }

    /// Kinds the lexer can produce
    pub fn is_token(self) -> bool {
        (self as u16) <= Self::Error as u16
    }

    /// Kinds the parser can produce as interior nodes
    pub fn is_node(self) -> bool {
        (Self::Program as u16..=Self::DictPair as u16).contains(&(self as u16))
            || self == Self::Error
    }

    /// Keyword and keyword-like literal lookup for an identifier-shaped word
    pub fn from_keyword(word: &str) -> Option<Self> {
        let kind = match word {
            "if" => Self::IfKw,
            "else" => Self::ElseKw,
            "and" => Self::AndKw,
            "or" => Self::OrKw,
            "not" => Self::NotKw,
            "True" | "False" => Self::Boolean,
            "None" => Self::None,
            _ => return None,
        };
        Some(kind)
    }

    pub fn opening_bracket(self) -> bool {
        matches!(self, Self::LParen | Self::LBracket | Self::LBrace)
    }

    pub fn closing_bracket(self) -> bool {
        matches!(self, Self::RParen | Self::RBracket | Self::RBrace)
    }
}

impl fmt::Display for EpochSyntaxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl From<EpochSyntaxKind> for rowan::SyntaxKind {
    fn from(kind: EpochSyntaxKind) -> Self {
        rowan::SyntaxKind(kind as u16)
    }
}
