use chrono::{NaiveDate, NaiveDateTime};

/// A decoded ODL value. `Unknown` is the explicit decoding of the
/// archive's `UNK` / `N/A` placeholders; it is never represented as an
/// absent keyword.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// `"…"` quoted text.
    Text(String),
    /// Bare or `'…'` quoted symbol.
    Symbol(String),
    Integer(i64),
    Real(f64),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    /// `(…)` ordered sequence.
    List(Vec<Value>),
    /// `{…}` unordered set.
    Set(Vec<Value>),
    Unknown,
}

const UNKNOWN_TOKENS: &[&str] = &["UNK", "N/A", "NULL", "UNKNOWN", "TBD"];

impl Value {
    /// Interprets a bare word: placeholder, date, number, or symbol, in
    /// that order.
    pub(crate) fn from_word(word: &str) -> Value {
        if UNKNOWN_TOKENS.iter().any(|t| word.eq_ignore_ascii_case(t)) {
            return Value::Unknown;
        }
        if let Some(value) = parse_temporal(word) {
            return value;
        }
        if let Ok(n) = word.parse::<i64>() {
            return Value::Integer(n);
        }
        if let Ok(n) = word.parse::<f64>() {
            return Value::Real(n);
        }
        Value::Symbol(word.to_string())
    }

    /// Interprets quoted text: placeholders stay explicit even when the
    /// author quoted them.
    pub(crate) fn from_quoted(text: &str) -> Value {
        if UNKNOWN_TOKENS.iter().any(|t| text.trim().eq_ignore_ascii_case(t)) {
            return Value::Unknown;
        }
        Value::Text(text.to_string())
    }

    /// The value as text, for identifier keywords. Quoted text and
    /// symbols qualify; anything else does not.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) | Value::Symbol(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            Value::DateTime(dt) => Some(dt.date()),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Elements of a list or set; a scalar acts as a one-element list, the
    /// way catalog authors write single-target missions.
    pub fn elements(&self) -> Vec<&Value> {
        match self {
            Value::List(items) | Value::Set(items) => items.iter().collect(),
            other => vec![other],
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Value::Unknown)
    }
}

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d", // calendar
    "%Y-%j",    // day-of-year
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%jT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
];

/// Accepts the date shapes seen across the archive: `1994-10-12`,
/// `1994-285` (ordinal), `1994-W41-3` (ISO week), and the `T`-separated
/// datetime forms of each, with optional fraction and trailing `Z`.
fn parse_temporal(word: &str) -> Option<Value> {
    // Dates start with a four-digit year; barewords like MGS-M-MOLA do not.
    if word.len() < 6 || !word[..4].chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let text = word.strip_suffix('Z').unwrap_or(word);

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(Value::DateTime(dt));
        }
    }
    for format in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(text, format) {
            return Some(Value::Date(d));
        }
    }
    // ISO week dates put the year in %G, so they need their own pass.
    if let Ok(d) = NaiveDate::parse_from_str(text, "%G-W%V-%u") {
        return Some(Value::Date(d));
    }
    None
}

/// True when a symbol can be written back without quoting.
fn is_bare_symbol(text: &str) -> bool {
    !text.is_empty()
        && text
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | ':' | '^' | '+' | '/'))
        && !text.contains(char::is_whitespace)
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Text(s) => write!(f, "\"{s}\""),
            Value::Symbol(s) if is_bare_symbol(s) => f.write_str(s),
            Value::Symbol(s) => write!(f, "'{s}'"),
            Value::Integer(n) => write!(f, "{n}"),
            Value::Real(n) => {
                if n.fract() == 0.0 && n.is_finite() {
                    write!(f, "{n:.1}")
                } else {
                    write!(f, "{n}")
                }
            }
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S%.f")),
            Value::List(items) => {
                f.write_str("(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str(")")
            }
            Value::Set(items) => {
                f.write_str("{")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("}")
            }
            Value::Unknown => f.write_str("UNK"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn words_decode_by_shape() {
        assert_eq!(Value::Integer(42), Value::from_word("42"));
        assert_eq!(Value::Real(1.5), Value::from_word("1.5"));
        assert_eq!(
            Value::Symbol("MGS-M-MOLA-3-PEDR-L1A-V1.0".into()),
            Value::from_word("MGS-M-MOLA-3-PEDR-L1A-V1.0")
        );
        assert_eq!(Value::Unknown, Value::from_word("UNK"));
        assert_eq!(Value::Unknown, Value::from_word("N/A"));
        assert_eq!(Value::Unknown, Value::from_quoted("N/A"));
    }

    #[test]
    fn temporal_shapes_decode() {
        assert_eq!(
            Value::Date(NaiveDate::from_ymd_opt(1994, 10, 12).unwrap()),
            Value::from_word("1994-10-12")
        );
        // Ordinal day 285 of 1994 is October 12.
        assert_eq!(
            Value::Date(NaiveDate::from_ymd_opt(1994, 10, 12).unwrap()),
            Value::from_word("1994-285")
        );
        // ISO week date.
        assert_eq!(
            Value::Date(NaiveDate::from_ymd_opt(1994, 10, 12).unwrap()),
            Value::from_word("1994-W41-3")
        );
        assert!(matches!(Value::from_word("1997-247T13:14:15"), Value::DateTime(_)));
        assert!(matches!(
            Value::from_word("1997-09-15T19:10:00.000Z"),
            Value::DateTime(_)
        ));
        // A dataset id that merely starts with digits stays a symbol.
        assert!(matches!(Value::from_word("2001-MARS-ODYSSEY"), Value::Symbol(_)));
    }

    #[test]
    fn display_round_trips_through_from_word() {
        for value in [
            Value::Integer(7),
            Value::Real(2.0),
            Value::Real(0.25),
            Value::Date(NaiveDate::from_ymd_opt(1994, 10, 12).unwrap()),
            Value::Unknown,
            Value::Symbol("MOLA".into()),
        ] {
            let printed = value.to_string();
            assert_eq!(value, Value::from_word(&printed), "{printed}");
        }
    }
}
