//! Value type inference.
//!
//! Every raw value keeps its text. On top of that the parser records a
//! [`ValueTypes`] set naming every type the text can be read as without
//! loss, so typed accessors only need a membership check before converting.

use crate::options::{BooleanCase, Options};
use std::fmt;

#[cfg(test)]
#[path = "./value_tests.rs"]
mod tests;

/// The value types a field can be read as.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum ValueType {
    /// A 64-bit signed integer: optional `-`, then ASCII digits.
    Integer,
    /// A floating-point literal, e.g. `1.5`, `-2e10`, `.5`, `42`.
    Decimal,
    /// The raw text. Every value is a string.
    String,
    /// `true` or `false`.
    Boolean,
    /// A bracketed, comma-separated list: `[a, b, c]`.
    Array,
}

impl ValueType {
    const ALL: [ValueType; 5] = [
        ValueType::Integer,
        ValueType::Decimal,
        ValueType::String,
        ValueType::Boolean,
        ValueType::Array,
    ];

    #[inline]
    const fn bit(self) -> u8 {
        match self {
            ValueType::Integer => 1,
            ValueType::Decimal => 1 << 1,
            ValueType::String => 1 << 2,
            ValueType::Boolean => 1 << 3,
            ValueType::Array => 1 << 4,
        }
    }

    /// Lowercase name used in error messages.
    pub fn name(self) -> &'static str {
        match self {
            ValueType::Integer => "integer",
            ValueType::Decimal => "decimal",
            ValueType::String => "string",
            ValueType::Boolean => "boolean",
            ValueType::Array => "array",
        }
    }
}

/// A set of [`ValueType`]s.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct ValueTypes(u8);

impl ValueTypes {
    /// The set with no members.
    pub const EMPTY: ValueTypes = ValueTypes(0);

    /// The set containing only [`ValueType::String`].
    pub const STRING: ValueTypes = ValueTypes(ValueType::String.bit());

    /// Computes every type `raw` can be read as.
    ///
    /// [`ValueType::String`] is always a member.
    pub fn infer(raw: &str, options: &Options) -> ValueTypes {
        let mut types = ValueTypes::STRING;
        if parse_integer(raw).is_some() {
            types.insert(ValueType::Integer);
        }
        if parse_decimal(raw).is_some() {
            types.insert(ValueType::Decimal);
        }
        if parse_bool(raw, options.boolean_case).is_some() {
            types.insert(ValueType::Boolean);
        }
        if array_body(raw).is_some() {
            types.insert(ValueType::Array);
        }
        types
    }

    /// Returns `true` if `ty` is in the set.
    #[inline]
    pub fn contains(self, ty: ValueType) -> bool {
        self.0 & ty.bit() != 0
    }

    /// Adds `ty` to the set.
    #[inline]
    pub fn insert(&mut self, ty: ValueType) {
        self.0 |= ty.bit();
    }

    /// Returns `true` if the set has no members.
    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Number of members.
    #[inline]
    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Iterates the members in declaration order.
    pub fn iter(self) -> impl Iterator<Item = ValueType> {
        ValueType::ALL.into_iter().filter(move |ty| self.contains(*ty))
    }
}

impl FromIterator<ValueType> for ValueTypes {
    fn from_iter<I: IntoIterator<Item = ValueType>>(iter: I) -> Self {
        let mut set = ValueTypes::EMPTY;
        for ty in iter {
            set.insert(ty);
        }
        set
    }
}

impl fmt::Debug for ValueTypes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// Parses an optional `-` followed by one or more ASCII digits.
pub(crate) fn parse_integer(raw: &str) -> Option<i64> {
    let digits = raw.strip_prefix('-').unwrap_or(raw);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

/// Parses a floating-point literal.
///
/// Grammar: `[+-]? (digits ('.' digits?)? | '.' digits) ([eE] [+-]? digits)?`.
/// Named values such as `inf` and `nan` are not literals.
pub(crate) fn parse_decimal(raw: &str) -> Option<f64> {
    let bytes = raw.as_bytes();
    let mut i = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        i += 1;
    }
    let int_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let mut mantissa_digits = i - int_start;
    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        let frac_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        mantissa_digits += i - frac_start;
    }
    if mantissa_digits == 0 {
        return None;
    }
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        i += 1;
        if matches!(bytes.get(i), Some(b'+' | b'-')) {
            i += 1;
        }
        let exp_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == exp_start {
            return None;
        }
    }
    if i != bytes.len() {
        return None;
    }
    match raw.parse::<f64>() {
        Ok(n) if n.is_finite() => Some(n),
        _ => None,
    }
}

/// Matches the boolean literals under the configured case policy.
pub(crate) fn parse_bool(raw: &str, case: BooleanCase) -> Option<bool> {
    match case {
        BooleanCase::Exact => match raw {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        BooleanCase::Insensitive => {
            if raw.eq_ignore_ascii_case("true") {
                Some(true)
            } else if raw.eq_ignore_ascii_case("false") {
                Some(false)
            } else {
                None
            }
        }
    }
}

/// Returns the text between the brackets of an array value.
fn array_body(raw: &str) -> Option<&str> {
    raw.strip_prefix('[')?.strip_suffix(']')
}

/// Iterator over the items of an array value.
///
/// Items are separated by `,` and trimmed of spaces and tabs. `[]` and
/// `[ ]` have no items; every other body yields one item per comma plus one.
#[derive(Clone, Debug)]
pub struct ArrayItems<'a> {
    rest: Option<&'a str>,
}

impl<'a> ArrayItems<'a> {
    pub(crate) fn new(raw: &'a str) -> Option<Self> {
        let body = array_body(raw)?;
        let rest = if trim_blank(body).is_empty() {
            None
        } else {
            Some(body)
        };
        Some(Self { rest })
    }
}

impl<'a> Iterator for ArrayItems<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let rest = self.rest?;
        match rest.split_once(',') {
            Some((item, tail)) => {
                self.rest = Some(tail);
                Some(trim_blank(item))
            }
            None => {
                self.rest = None;
                Some(trim_blank(rest))
            }
        }
    }
}

#[inline]
pub(crate) fn is_blank(ch: char) -> bool {
    ch == ' ' || ch == '\t'
}

#[inline]
pub(crate) fn trim_blank(s: &str) -> &str {
    s.trim_matches(is_blank)
}
