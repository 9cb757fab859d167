//! Typed configuration values.
//!
//! A [`Property`] is a named leaf of the category tree. Its value is kept in the
//! same string form it has on disk, tagged with a [`PropertyKind`]. Reads are
//! lenient: asking for an integer out of a value that does not parse as one
//! yields the caller's fallback instead of an error.
//!
//! ## Kinds
//!
//! | Kind | On disk | Example |
//! |------|---------|---------|
//! | Boolean | `true` / `false` | `enabled=true` |
//! | Integer | 32-bit decimal | `port=25565` |
//! | String | rest of the line, verbatim | `motd=Hello, world` |
//! | List | quoted elements in brackets | `admins=["alice", "bob"]` |
//!
//! A value always fits on one line. Line breaks in scalar values are replaced
//! by spaces when the value is stored; list elements escape them instead.
//!
//! ## Examples
//!
//! ```rust
//! use cfgtree::{Property, PropertyKind};
//!
//! let prop = Property::from_raw("port", "8080");
//! assert_eq!(prop.kind(), PropertyKind::Integer);
//! assert_eq!(prop.as_int(0), 8080);
//!
//! let prop = Property::from_raw("port", "eighty");
//! assert_eq!(prop.kind(), PropertyKind::String);
//! assert_eq!(prop.as_int(80), 80);
//! ```

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use tracing::warn;

const LINE_BREAKS: [char; 2] = ['\r', '\n'];

/// Declared type of a property.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyKind {
    Boolean,
    Integer,
    String,
    List,
}

impl PropertyKind {
    /// Infers the kind a raw on-disk value most likely had when it was written.
    #[must_use]
    pub fn infer(raw: &str) -> Self {
        if parse_bool(raw).is_some() {
            PropertyKind::Boolean
        } else if raw.parse::<i32>().is_ok() {
            PropertyKind::Integer
        } else if parse_list(raw).is_some() {
            PropertyKind::List
        } else {
            PropertyKind::String
        }
    }
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PropertyKind::Boolean => "boolean",
            PropertyKind::Integer => "integer",
            PropertyKind::String => "string",
            PropertyKind::List => "list",
        })
    }
}

/// The stored value of a property: one scalar string or an ordered list of strings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Scalar(String),
    List(Vec<String>),
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::Scalar(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::Scalar(s)
    }
}

impl From<i32> for PropertyValue {
    fn from(n: i32) -> Self {
        PropertyValue::Scalar(n.to_string())
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        PropertyValue::Scalar(b.to_string())
    }
}

impl From<Vec<String>> for PropertyValue {
    fn from(v: Vec<String>) -> Self {
        PropertyValue::List(v)
    }
}

impl From<&[&str]> for PropertyValue {
    fn from(v: &[&str]) -> Self {
        PropertyValue::List(v.iter().map(|s| s.to_string()).collect())
    }
}

/// A single named, typed configuration value with an optional comment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    name: String,
    value: PropertyValue,
    kind: PropertyKind,
    comment: Option<String>,
}

impl Property {
    /// Creates a property with an explicit kind.
    ///
    /// Line breaks in a scalar value become spaces, and the name is cleaned
    /// with the same rules as category names.
    pub fn new(name: impl Into<String>, value: impl Into<PropertyValue>, kind: PropertyKind) -> Self {
        Property {
            name: owned_name(name.into()),
            value: single_line(value.into()),
            kind,
            comment: None,
        }
    }

    /// Builds a property from the text right of `=`, inferring its kind.
    ///
    /// The text is kept verbatim, so a string that merely looks like a list
    /// is not reformatted. [`Property::as_list`] parses list literals on demand.
    pub fn from_raw(name: impl Into<String>, raw: &str) -> Self {
        Property::new(name, raw, PropertyKind::infer(raw))
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn kind(&self) -> PropertyKind {
        self.kind
    }

    #[must_use]
    pub fn value(&self) -> &PropertyValue {
        &self.value
    }

    #[must_use]
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// Attaches a comment. Multi-line comments are written one `#` line per input line.
    pub fn set_comment(&mut self, comment: impl Into<String>) {
        self.comment = Some(comment.into());
    }

    /// Replaces the value, keeping the declared kind.
    pub fn set(&mut self, value: impl Into<PropertyValue>) {
        self.value = single_line(value.into());
    }

    pub(crate) fn set_kind(&mut self, kind: PropertyKind) {
        self.kind = kind;
    }

    /// Turns the value into a scalar holding its written form.
    pub(crate) fn make_scalar(&mut self) {
        if let PropertyValue::List(items) = &self.value {
            self.value = PropertyValue::Scalar(write_list(items));
        }
        self.kind = PropertyKind::String;
    }

    /// Turns the value into a list. A scalar holding a list literal yields its
    /// elements, any other scalar becomes a one-element list.
    pub(crate) fn make_list(&mut self) {
        if let PropertyValue::Scalar(s) = &mut self.value {
            let items = parse_list(s).unwrap_or_else(|| vec![std::mem::take(s)]);
            self.value = PropertyValue::List(items);
        }
        self.kind = PropertyKind::List;
    }

    /// Returns the scalar value, or `None` for list properties.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match &self.value {
            PropertyValue::Scalar(_) if self.kind == PropertyKind::List => None,
            PropertyValue::Scalar(s) => Some(s.as_str()),
            PropertyValue::List(_) => None,
        }
    }

    /// Returns the list elements.
    ///
    /// A list-kind scalar is parsed as a list literal; any other scalar reads
    /// as a one-element list.
    #[must_use]
    pub fn as_list(&self) -> Vec<Cow<'_, str>> {
        match &self.value {
            PropertyValue::Scalar(s) if self.kind == PropertyKind::List => match parse_list(s) {
                Some(items) => items.into_iter().map(Cow::Owned).collect(),
                None => vec![Cow::Borrowed(s.as_str())],
            },
            PropertyValue::Scalar(s) => vec![Cow::Borrowed(s.as_str())],
            PropertyValue::List(items) => items.iter().map(|s| Cow::Borrowed(s.as_str())).collect(),
        }
    }

    #[inline]
    #[must_use]
    pub fn is_int(&self) -> bool {
        self.as_str().is_some_and(|s| s.parse::<i32>().is_ok())
    }

    #[inline]
    #[must_use]
    pub fn is_bool(&self) -> bool {
        self.as_str().and_then(parse_bool).is_some()
    }

    /// Reads the value as an integer, falling back to `default`.
    #[must_use]
    pub fn as_int(&self, default: i32) -> i32 {
        self.as_str()
            .and_then(|s| s.parse().ok())
            .unwrap_or(default)
    }

    /// Reads the value as a boolean, falling back to `default`.
    #[must_use]
    pub fn as_bool(&self, default: bool) -> bool {
        self.as_str().and_then(parse_bool).unwrap_or(default)
    }

    /// The text written right of `=`.
    #[must_use]
    pub fn to_raw(&self) -> Cow<'_, str> {
        match &self.value {
            PropertyValue::Scalar(s) => Cow::Borrowed(s.as_str()),
            PropertyValue::List(items) => Cow::Owned(write_list(items)),
        }
    }
}

/// Replaces what a single line cannot hold in a name: line breaks become
/// spaces and `"` becomes `'`.
pub(crate) fn clean_name(name: &str) -> Cow<'_, str> {
    if name.contains(LINE_BREAKS) || name.contains('"') {
        Cow::Owned(name.replace(LINE_BREAKS, " ").replace('"', "'"))
    } else {
        Cow::Borrowed(name)
    }
}

fn owned_name(name: String) -> String {
    match clean_name(&name) {
        Cow::Borrowed(_) => name,
        Cow::Owned(cleaned) => {
            warn!(name = %name, cleaned = %cleaned, "name cannot be written as is");
            cleaned
        }
    }
}

fn single_line(value: PropertyValue) -> PropertyValue {
    match value {
        PropertyValue::Scalar(s) if s.contains(LINE_BREAKS) => {
            warn!(value = %s, "replacing line breaks in a scalar value with spaces");
            PropertyValue::Scalar(s.replace(LINE_BREAKS, " "))
        }
        other => other,
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    if raw.eq_ignore_ascii_case("true") {
        Some(true)
    } else if raw.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Formats a list as `["a", "b"]`.
pub(crate) fn write_list(items: &[String]) -> String {
    let mut out = String::with_capacity(2 + items.iter().map(|s| s.len() + 4).sum::<usize>());
    out.push('[');
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push('"');
        for ch in item.chars() {
            match ch {
                '"' => out.push_str("\\\""),
                '\\' => out.push_str("\\\\"),
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '\t' => out.push_str("\\t"),
                _ => out.push(ch),
            }
        }
        out.push('"');
    }
    out.push(']');
    out
}

/// Parses a list literal. Returns `None` if `raw` is not exactly one well-formed list.
pub(crate) fn parse_list(raw: &str) -> Option<Vec<String>> {
    let inner = raw.strip_prefix('[')?.strip_suffix(']')?;
    let mut chars = inner.chars().peekable();
    let mut items = Vec::new();

    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        match chars.next() {
            None if items.is_empty() => return Some(items),
            Some('"') => {}
            _ => return None,
        }

        let mut item = String::new();
        loop {
            match chars.next()? {
                '"' => break,
                '\\' => match chars.next()? {
                    '"' => item.push('"'),
                    '\\' => item.push('\\'),
                    'n' => item.push('\n'),
                    'r' => item.push('\r'),
                    't' => item.push('\t'),
                    _ => return None,
                },
                other => item.push(other),
            }
        }
        items.push(item);

        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        match chars.next() {
            None => return Some(items),
            Some(',') => {}
            Some(_) => return None,
        }
    }
}
