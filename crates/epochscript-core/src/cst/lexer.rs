//! CST-aware lexer that preserves all trivia (whitespace, newlines, comments)
//!
//! Every byte of the source ends up in exactly one token, so concatenating the
//! token texts reproduces the input. The lexer is stateless at token
//! boundaries: [`lex_token`] produces the token starting at any boundary from
//! the text alone. Each token records how far the lexer looked ahead while
//! producing it, which is what incremental relexing uses to decide which
//! tokens an edit can influence.

use crate::cst::EpochSyntaxKind;
use std::ops::Range;

/// Simple span representing a byte range in the source
pub type CstSpan = Range<usize>;

/// Units accepted directly after a digit run in a timeframe literal
pub const TIMEFRAME_UNITS: &[&str] = &[
    "S", "Min", "H", "D", "B", "W", "ME", "MS", "BME", "BMS", "QE", "QS", "BQE", "BQS", "YE", "YS",
];

/// Anchors accepted after `-` in a timeframe literal
pub const TIMEFRAME_ANCHORS: &[&str] = &[
    "MON", "TUE", "WED", "THU", "FRI", "SAT", "SUN", "JAN", "FEB", "MAR", "APR", "MAY", "JUN",
    "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];

/// Final optional suffix of an anchored timeframe
pub const TIMEFRAME_LAST: &str = "Last";

/// A token with its syntax kind and span
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CstToken {
    pub kind: EpochSyntaxKind,
    pub span: CstSpan,
    /// Exclusive end of the bytes examined to produce this token.
    /// `source.len() + 1` means the lexer observed the end of input.
    pub lookahead: usize,
}

impl CstToken {
    pub fn new(kind: EpochSyntaxKind, span: CstSpan, lookahead: usize) -> Self {
        Self {
            kind,
            span,
            lookahead,
        }
    }

    pub fn text<'s>(&self, source: &'s str) -> &'s str {
        &source[self.span.clone()]
    }

    pub fn len(&self) -> usize {
        self.span.len()
    }

    pub fn is_empty(&self) -> bool {
        self.span.is_empty()
    }

    /// The same token moved by `delta` bytes
    pub(crate) fn shifted(&self, delta: isize) -> Self {
        let shift = |offset: usize| offset.wrapping_add_signed(delta);
        Self {
            kind: self.kind,
            span: shift(self.span.start)..shift(self.span.end),
            lookahead: shift(self.lookahead),
        }
    }

    /// Lexical error carried by an `Error` token
    pub fn lex_error(&self, source: &str) -> Option<LexErrorKind> {
        if self.kind != EpochSyntaxKind::Error {
            return None;
        }
        Some(LexErrorKind::of_error_text(self.text(source)))
    }
}

/// Kinds of lexical error embedded in the token stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LexErrorKind {
    UnterminatedString,
    UnrecognizedCharacter,
}

impl LexErrorKind {
    /// Classify the text of an `Error` token
    pub(crate) fn of_error_text(text: &str) -> Self {
        match text.chars().next() {
            Some('"' | '\'') => Self::UnterminatedString,
            _ => Self::UnrecognizedCharacter,
        }
    }
}

/// Lex input preserving ALL trivia for CST construction
///
/// Whitespace, newlines and comments become tokens, and malformed input
/// becomes `Error` tokens, so `tokens.map(text).concat() == input` always.
pub fn lex_with_trivia(input: &str) -> Vec<CstToken> {
    let mut tokens = Vec::new();
    let mut offset = 0;
    while let Some(token) = lex_token(input, offset) {
        offset = token.span.end;
        tokens.push(token);
    }
    tokens
}

/// Lex the single token starting at `offset`
///
/// Returns `None` at the end of input. `offset` must be a token boundary of
/// the text (any char boundary works, but only token boundaries reproduce the
/// stream of [`lex_with_trivia`]).
pub fn lex_token(input: &str, offset: usize) -> Option<CstToken> {
    if offset >= input.len() {
        return None;
    }
    let mut cursor = Cursor::new(input, offset);
    let kind = next_kind(&mut cursor);
    Some(CstToken::new(kind, offset..cursor.pos, cursor.furthest))
}

fn next_kind(cursor: &mut Cursor<'_>) -> EpochSyntaxKind {
    let Some(first) = cursor.bump() else {
        return EpochSyntaxKind::Eof;
    };

    match first {
        '\n' => EpochSyntaxKind::Newline,
        '\r' => {
            // Handle \r\n as single newline
            cursor.eat('\n');
            EpochSyntaxKind::Newline
        }
        c if c.is_whitespace() => {
            cursor.eat_while(|ch| ch.is_whitespace() && ch != '\n' && ch != '\r');
            EpochSyntaxKind::Whitespace
        }
        '#' => {
            cursor.eat_while(|ch| ch != '\n' && ch != '\r');
            EpochSyntaxKind::Comment
        }
        '"' => {
            if cursor.peek() == Some('"') && cursor.peek_at(cursor.pos + 1) == Some('"') {
                cursor.pos += 2;
                lex_triple_string(cursor)
            } else {
                lex_string(cursor, '"')
            }
        }
        '\'' => lex_string(cursor, '\''),
        c if c.is_ascii_digit() => lex_number(cursor),
        c if is_ident_start(c) => {
            let start = cursor.pos - c.len_utf8();
            cursor.eat_while(is_ident_continue);
            EpochSyntaxKind::from_keyword(&cursor.input[start..cursor.pos])
                .unwrap_or(EpochSyntaxKind::Identifier)
        }
        '*' => {
            if cursor.eat('*') {
                EpochSyntaxKind::StarStar
            } else {
                EpochSyntaxKind::Star
            }
        }
        '>' => {
            if cursor.eat('>') {
                EpochSyntaxKind::ShiftRight
            } else if cursor.eat('=') {
                EpochSyntaxKind::GtEq
            } else {
                EpochSyntaxKind::Gt
            }
        }
        '<' => {
            if cursor.eat('<') {
                EpochSyntaxKind::ShiftLeft
            } else if cursor.eat('=') {
                EpochSyntaxKind::LtEq
            } else {
                EpochSyntaxKind::Lt
            }
        }
        '=' => {
            if cursor.eat('=') {
                EpochSyntaxKind::EqEq
            } else {
                EpochSyntaxKind::Eq
            }
        }
        '!' => {
            if cursor.eat('=') {
                EpochSyntaxKind::NotEq
            } else {
                EpochSyntaxKind::Error
            }
        }
        '+' => EpochSyntaxKind::Plus,
        '-' => EpochSyntaxKind::Minus,
        '/' => EpochSyntaxKind::Slash,
        '%' => EpochSyntaxKind::Percent,
        '|' => EpochSyntaxKind::Pipe,
        '.' => EpochSyntaxKind::Dot,
        ',' => EpochSyntaxKind::Comma,
        ':' => EpochSyntaxKind::Colon,
        ';' => EpochSyntaxKind::Semicolon,
        '(' => EpochSyntaxKind::LParen,
        ')' => EpochSyntaxKind::RParen,
        '[' => EpochSyntaxKind::LBracket,
        ']' => EpochSyntaxKind::RBracket,
        '{' => EpochSyntaxKind::LBrace,
        '}' => EpochSyntaxKind::RBrace,
        _ => EpochSyntaxKind::Error,
    }
}

/// Lex a single-line string after its opening quote
fn lex_string(cursor: &mut Cursor<'_>, quote: char) -> EpochSyntaxKind {
    loop {
        match cursor.peek() {
            None | Some('\n' | '\r') => return EpochSyntaxKind::Error,
            Some('\\') => {
                cursor.bump();
                // An escape never swallows a raw line break
                if cursor.peek().is_some_and(|ch| ch != '\n' && ch != '\r') {
                    cursor.bump();
                }
            }
            Some(ch) if ch == quote => {
                cursor.bump();
                return EpochSyntaxKind::String;
            }
            Some(_) => {
                cursor.bump();
            }
        }
    }
}

/// Lex a `"""` string after its opening delimiter
fn lex_triple_string(cursor: &mut Cursor<'_>) -> EpochSyntaxKind {
    loop {
        if cursor.peek() == Some('"')
            && cursor.peek_at(cursor.pos + 1) == Some('"')
            && cursor.peek_at(cursor.pos + 2) == Some('"')
        {
            cursor.pos += 3;
            return EpochSyntaxKind::String;
        }
        if cursor.bump().is_none() {
            return EpochSyntaxKind::Error;
        }
    }
}

/// Lex a number, or a timeframe when the digits carry a unit suffix
fn lex_number(cursor: &mut Cursor<'_>) -> EpochSyntaxKind {
    cursor.eat_while(|ch| ch.is_ascii_digit());
    let mut is_float = false;

    if cursor.peek() == Some('.')
        && cursor
            .peek_at(cursor.pos + 1)
            .is_some_and(|ch| ch.is_ascii_digit())
    {
        cursor.pos += 1;
        cursor.eat_while(|ch| ch.is_ascii_digit());
        is_float = true;
    }

    if matches!(cursor.peek(), Some('e' | 'E')) {
        let mut after = cursor.pos + 1;
        if matches!(cursor.peek_at(after), Some('+' | '-')) {
            after += 1;
        }
        if cursor.peek_at(after).is_some_and(|ch| ch.is_ascii_digit()) {
            cursor.pos = after;
            cursor.eat_while(|ch| ch.is_ascii_digit());
            is_float = true;
        }
    }

    if is_float || !cursor.peek().is_some_and(is_ident_start) {
        return EpochSyntaxKind::Number;
    }

    let unit_start = cursor.pos;
    let unit_end = cursor.scan_word(unit_start);
    if !TIMEFRAME_UNITS.contains(&&cursor.input[unit_start..unit_end]) {
        // Digits and the following word tokenize separately
        return EpochSyntaxKind::Number;
    }
    cursor.pos = unit_end;

    if let Some(end) = timeframe_suffix(cursor, cursor.pos, TIMEFRAME_ANCHORS) {
        cursor.pos = end;
        if let Some(end) = timeframe_suffix(cursor, cursor.pos, &[TIMEFRAME_LAST]) {
            cursor.pos = end;
        }
    }
    EpochSyntaxKind::Timeframe
}

/// End of a complete `-WORD` suffix at `at` whose word is one of `words`
fn timeframe_suffix(cursor: &mut Cursor<'_>, at: usize, words: &[&str]) -> Option<usize> {
    if cursor.peek_at(at) != Some('-') {
        return None;
    }
    let word_start = at + 1;
    if !cursor.peek_at(word_start).is_some_and(is_ident_start) {
        return None;
    }
    let word_end = cursor.scan_word(word_start);
    words
        .contains(&&cursor.input[word_start..word_end])
        .then_some(word_end)
}

pub(crate) fn is_ident_start(ch: char) -> bool {
    ch == '_' || ch.is_alphabetic()
}

pub(crate) fn is_ident_continue(ch: char) -> bool {
    ch == '_' || ch.is_alphanumeric()
}

/// Scanning position that remembers the furthest byte it examined
struct Cursor<'a> {
    input: &'a str,
    pos: usize,
    furthest: usize,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str, pos: usize) -> Self {
        Self {
            input,
            pos,
            furthest: pos,
        }
    }

    fn peek_at(&mut self, index: usize) -> Option<char> {
        let seen = if index >= self.input.len() {
            self.input.len() + 1
        } else {
            index + 1
        };
        self.furthest = self.furthest.max(seen);
        self.input.get(index..)?.chars().next()
    }

    fn peek(&mut self) -> Option<char> {
        self.peek_at(self.pos)
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn eat_while(&mut self, predicate: impl Fn(char) -> bool) {
        while let Some(ch) = self.peek() {
            if !predicate(ch) {
                break;
            }
            self.pos += ch.len_utf8();
        }
    }

    /// End of the identifier-character run starting at `start`
    fn scan_word(&mut self, start: usize) -> usize {
        let mut end = start;
        while let Some(ch) = self.peek_at(end) {
            if !is_ident_continue(ch) {
                break;
            }
            end += ch.len_utf8();
        }
        end
    }
}
