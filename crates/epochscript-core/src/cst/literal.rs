//! Decoding of literal tokens
//!
//! The tree stores literals as source text. These helpers turn the text of a
//! `Number`, `Timeframe`, `String`, `Boolean` or `None` token into a value.

use std::fmt;

use super::{EpochSyntaxKind, EpochSyntaxToken, TIMEFRAME_ANCHORS, TIMEFRAME_LAST};

/// Decoded value of a literal token
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Integer(i64),
    Float(f64),
    String(String),
    Boolean(bool),
    None,
    Timeframe(Timeframe),
}

/// Bar interval unit of a timeframe literal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeframeUnit {
    Second,
    Minute,
    Hour,
    Day,
    BusinessDay,
    Week,
    MonthEnd,
    MonthStart,
    BusinessMonthEnd,
    BusinessMonthStart,
    QuarterEnd,
    QuarterStart,
    BusinessQuarterEnd,
    BusinessQuarterStart,
    YearEnd,
    YearStart,
}

impl TimeframeUnit {
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        let unit = match suffix {
            "S" => Self::Second,
            "Min" => Self::Minute,
            "H" => Self::Hour,
            "D" => Self::Day,
            "B" => Self::BusinessDay,
            "W" => Self::Week,
            "ME" => Self::MonthEnd,
            "MS" => Self::MonthStart,
            "BME" => Self::BusinessMonthEnd,
            "BMS" => Self::BusinessMonthStart,
            "QE" => Self::QuarterEnd,
            "QS" => Self::QuarterStart,
            "BQE" => Self::BusinessQuarterEnd,
            "BQS" => Self::BusinessQuarterStart,
            "YE" => Self::YearEnd,
            "YS" => Self::YearStart,
            _ => return None,
        };
        Some(unit)
    }

    pub fn suffix(self) -> &'static str {
        match self {
            Self::Second => "S",
            Self::Minute => "Min",
            Self::Hour => "H",
            Self::Day => "D",
            Self::BusinessDay => "B",
            Self::Week => "W",
            Self::MonthEnd => "ME",
            Self::MonthStart => "MS",
            Self::BusinessMonthEnd => "BME",
            Self::BusinessMonthStart => "BMS",
            Self::QuarterEnd => "QE",
            Self::QuarterStart => "QS",
            Self::BusinessQuarterEnd => "BQE",
            Self::BusinessQuarterStart => "BQS",
            Self::YearEnd => "YE",
            Self::YearStart => "YS",
        }
    }
}

/// A parsed timeframe such as `15Min` or `1W-FRI-Last`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Timeframe {
    pub count: u64,
    pub unit: TimeframeUnit,
    /// Weekday or month code after the first `-`
    pub anchor: Option<&'static str>,
    /// Whether the anchor carries the `-Last` suffix
    pub last: bool,
}

impl Timeframe {
    /// Parse the text of a `Timeframe` token
    pub fn parse(text: &str) -> Option<Self> {
        let digits_end = text
            .find(|ch: char| !ch.is_ascii_digit())
            .unwrap_or(text.len());
        let count = text[..digits_end].parse().ok()?;

        let mut parts = text[digits_end..].split('-');
        let unit = TimeframeUnit::from_suffix(parts.next()?)?;
        let anchor = match parts.next() {
            Some(code) => Some(*TIMEFRAME_ANCHORS.iter().find(|anchor| **anchor == code)?),
            None => None,
        };
        let last = match parts.next() {
            Some(suffix) if suffix == TIMEFRAME_LAST && anchor.is_some() => true,
            Some(_) => return None,
            None => false,
        };
        if parts.next().is_some() {
            return None;
        }

        Some(Self {
            count,
            unit,
            anchor,
            last,
        })
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.count, self.unit.suffix())?;
        if let Some(anchor) = self.anchor {
            write!(f, "-{anchor}")?;
            if self.last {
                write!(f, "-{TIMEFRAME_LAST}")?;
            }
        }
        Ok(())
    }
}

/// Decode a literal token
pub fn literal_value(token: &EpochSyntaxToken) -> Option<LiteralValue> {
    decode_literal(token.kind(), token.text())
}

/// Decode literal text of the given kind; `None` for non-literal kinds and
/// malformed text
pub fn decode_literal(kind: EpochSyntaxKind, text: &str) -> Option<LiteralValue> {
    match kind {
        EpochSyntaxKind::Number => decode_number(text),
        EpochSyntaxKind::Timeframe => Timeframe::parse(text).map(LiteralValue::Timeframe),
        EpochSyntaxKind::String => string_value(text).map(LiteralValue::String),
        EpochSyntaxKind::Boolean => match text {
            "True" => Some(LiteralValue::Boolean(true)),
            "False" => Some(LiteralValue::Boolean(false)),
            _ => None,
        },
        EpochSyntaxKind::None => Some(LiteralValue::None),
        _ => None,
    }
}

fn decode_number(text: &str) -> Option<LiteralValue> {
    if text.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(value) = text.parse() {
            return Some(LiteralValue::Integer(value));
        }
    }
    text.parse().ok().map(LiteralValue::Float)
}

/// Contents of a string literal with escapes resolved
///
/// Triple-quoted strings are raw. In quoted strings the usual single-character
/// escapes are decoded and any other escaped character is kept together with
/// its backslash.
pub fn string_value(text: &str) -> Option<String> {
    if let Some(raw) = text
        .strip_prefix(r#"""""#)
        .and_then(|rest| rest.strip_suffix(r#"""""#))
    {
        return Some(raw.to_string());
    }

    let quote = text.chars().next().filter(|ch| matches!(ch, '"' | '\''))?;
    let body = text[1..].strip_suffix(quote)?;

    let mut value = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            value.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => value.push('\n'),
            Some('t') => value.push('\t'),
            Some('r') => value.push('\r'),
            Some('0') => value.push('\0'),
            Some(escaped @ ('\\' | '\'' | '"')) => value.push(escaped),
            Some(other) => {
                value.push('\\');
                value.push(other);
            }
            None => value.push('\\'),
        }
    }
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numbers() {
        assert_eq!(
            decode_literal(EpochSyntaxKind::Number, "42"),
            Some(LiteralValue::Integer(42))
        );
        assert_eq!(
            decode_literal(EpochSyntaxKind::Number, "2.5e3"),
            Some(LiteralValue::Float(2500.0))
        );
        assert_eq!(
            decode_literal(EpochSyntaxKind::Number, "99999999999999999999"),
            Some(LiteralValue::Float(1e20))
        );
    }

    #[test]
    fn test_timeframes() {
        let tf = Timeframe::parse("15Min").unwrap();
        assert_eq!(tf.count, 15);
        assert_eq!(tf.unit, TimeframeUnit::Minute);
        assert_eq!(tf.anchor, None);

        let tf = Timeframe::parse("1W-FRI-Last").unwrap();
        assert_eq!(tf.unit, TimeframeUnit::Week);
        assert_eq!(tf.anchor, Some("FRI"));
        assert!(tf.last);
        assert_eq!(tf.to_string(), "1W-FRI-Last");

        assert!(Timeframe::parse("1Q").is_none());
        assert!(Timeframe::parse("1W-Last").is_none());
        assert!(Timeframe::parse("1W-FOO").is_none());
    }

    #[test]
    fn test_strings() {
        assert_eq!(string_value(r#""a\tb""#).as_deref(), Some("a\tb"));
        assert_eq!(string_value(r"'it\'s'").as_deref(), Some("it's"));
        assert_eq!(string_value(r"'\d+'").as_deref(), Some(r"\d+"));
        assert_eq!(
            string_value("\"\"\"line\\n\nnext\"\"\"").as_deref(),
            Some("line\\n\nnext")
        );
        assert_eq!(string_value("'open"), None);
    }

    #[test]
    fn test_keyword_literals() {
        assert_eq!(
            decode_literal(EpochSyntaxKind::Boolean, "False"),
            Some(LiteralValue::Boolean(false))
        );
        assert_eq!(
            decode_literal(EpochSyntaxKind::None, "None"),
            Some(LiteralValue::None)
        );
        assert_eq!(decode_literal(EpochSyntaxKind::Identifier, "x"), None);
    }

    #[test]
    fn test_literal_value_from_tree() {
        let tree = crate::parse("x = '1D'");
        let token = tree
            .syntax()
            .descendants_with_tokens()
            .filter_map(|e| e.into_token())
            .find(|t| t.kind() == EpochSyntaxKind::String)
            .unwrap();
        assert_eq!(
            literal_value(&token),
            Some(LiteralValue::String("1D".to_string()))
        );
    }
}
