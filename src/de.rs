//! Configuration text parsing.
//!
//! Parsing happens in two layers:
//!
//! - [`tokenize_line`] classifies one line of text into a [`Line`]: an
//!   embedded-document boundary, or a (possibly empty) run of [`Token`]s
//! - [`Deserializer`] drives the tokens, tracking the open category scopes,
//!   the pending comment lines and the active embedded document
//!
//! ## Grammar
//!
//! ```text
//! # comment to end of line
//! name {                 opens a category below the current one
//! a.b.c {                opens a.b.c, creating a and a.b on the way
//! "any name!" {          quoted names may hold any character but `"`
//! key=raw value          the rest of the line is the value, verbatim
//! }                      closes the innermost open category
//! START: "doc"           begins an embedded document
//! END: "doc"             ends it
//! ```
//!
//! Errors are fatal and carry the line they were found on:
//!
//! ```rust
//! use cfgtree::de::Deserializer;
//! use cfgtree::Error;
//!
//! let err = Deserializer::from_str("general {\n  \"open=1\n}").parse().unwrap_err();
//! assert_eq!(err, Error::UnmatchedQuote { line: 2 });
//! ```

use crate::category::CategoryTree;
use crate::{Error, Property, Result};
use std::collections::BTreeMap;
use tracing::warn;

const ALLOWED_CHARS: &str = "._-";
const DOCUMENT_START: &str = "START: \"";
const DOCUMENT_END: &str = "END: \"";

/// Returns `true` for characters allowed in an unquoted name.
#[inline]
#[must_use]
pub fn is_name_char(ch: char) -> bool {
    ch.is_alphanumeric() || ALLOWED_CHARS.contains(ch)
}

/// One structural element of a line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token {
    CategoryOpen(String),
    CategoryClose,
    Property { name: String, value: String },
    /// Text of a whole-line comment, without the `#` and one following space.
    Comment(String),
}

/// Classification of one input line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Line {
    DocumentStart(String),
    DocumentEnd(String),
    /// Zero tokens means the line was blank (or held a dangling name).
    Tokens(Vec<Token>),
}

/// Name accumulator. Whitespace between name characters is kept, whitespace
/// around the name is dropped, and quoted content is taken as-is.
///
/// Once a name has started, a `"` no longer opens a quote. Like the quote
/// that closed a quoted span, it is kept only if more of the name follows, so
/// `"a" "b"` reads as `a" "b`.
#[derive(Default)]
struct NameBuf {
    text: String,
    pending_ws: String,
    started: bool,
}

impl NameBuf {
    fn push(&mut self, ch: char) {
        self.text.push_str(&self.pending_ws);
        self.pending_ws.clear();
        self.text.push(ch);
        self.started = true;
    }

    /// Holds `ch` until another name character follows.
    fn hold(&mut self, ch: char) {
        if self.started {
            self.pending_ws.push(ch);
        }
    }

    fn open_quote(&mut self) {
        self.text.push_str(&self.pending_ws);
        self.pending_ws.clear();
        self.started = true;
    }

    fn take(&mut self) -> Option<String> {
        let started = std::mem::take(&mut self.started);
        self.pending_ws.clear();
        let text = std::mem::take(&mut self.text);
        started.then_some(text)
    }
}

fn boundary<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    text.trim()
        .strip_prefix(prefix)?
        .strip_suffix('"')
        .filter(|name| !name.is_empty() && !name.contains('"'))
}

fn dangling(line: usize, name: &str) {
    warn!(line, name, "ignoring name not followed by '{{' or '='");
}

/// Classifies one line of configuration text.
///
/// `line` is only used for error reporting.
///
/// # Errors
///
/// Returns an error for an unmatched quote, a `{` or `=` without a name in
/// front of it, or any character outside the grammar.
///
/// # Examples
///
/// ```rust
/// use cfgtree::de::{tokenize_line, Line, Token};
///
/// assert_eq!(
///     tokenize_line(1, "   port=25565").unwrap(),
///     Line::Tokens(vec![Token::Property { name: "port".into(), value: "25565".into() }])
/// );
/// assert_eq!(
///     tokenize_line(1, "START: \"mods/a.cfg\"").unwrap(),
///     Line::DocumentStart("mods/a.cfg".into())
/// );
/// ```
pub fn tokenize_line(line: usize, text: &str) -> Result<Line> {
    if let Some(name) = boundary(text, DOCUMENT_START) {
        return Ok(Line::DocumentStart(name.to_string()));
    }
    if let Some(name) = boundary(text, DOCUMENT_END) {
        return Ok(Line::DocumentEnd(name.to_string()));
    }

    let mut tokens = Vec::new();
    let mut name = NameBuf::default();
    let mut quoted = false;

    for (i, ch) in text.char_indices() {
        if quoted {
            if ch == '"' {
                quoted = false;
                name.hold(ch);
            } else {
                name.push(ch);
            }
            continue;
        }

        if is_name_char(ch) {
            name.push(ch);
            continue;
        }
        if ch.is_whitespace() {
            name.hold(ch);
            continue;
        }

        match ch {
            '#' => {
                match name.take() {
                    Some(n) => dangling(line, &n),
                    None if tokens.is_empty() => {
                        let rest = &text[i + 1..];
                        let rest = rest.strip_prefix(' ').unwrap_or(rest);
                        tokens.push(Token::Comment(rest.to_string()));
                    }
                    None => {}
                }
                return Ok(Line::Tokens(tokens));
            }
            '"' if name.started => name.hold(ch),
            '"' => {
                quoted = true;
                name.open_quote();
            }
            '{' => {
                let n = name.take().ok_or(Error::MissingName { line, token: '{' })?;
                tokens.push(Token::CategoryOpen(n));
            }
            '}' => {
                if let Some(n) = name.take() {
                    dangling(line, &n);
                }
                tokens.push(Token::CategoryClose);
            }
            '=' => {
                let n = name.take().ok_or(Error::MissingName { line, token: '=' })?;
                tokens.push(Token::Property {
                    name: n,
                    value: text[i + 1..].to_string(),
                });
                return Ok(Line::Tokens(tokens));
            }
            other => return Err(Error::UnknownCharacter { line, ch: other }),
        }
    }

    if quoted {
        return Err(Error::UnmatchedQuote { line });
    }
    if let Some(n) = name.take() {
        dangling(line, &n);
    }
    Ok(Line::Tokens(tokens))
}

fn is_rule(text: &str) -> bool {
    text.len() >= 3 && text.chars().all(|c| c == '#')
}

fn is_separator(text: &str) -> bool {
    text.len() >= 3 && text.chars().all(|c| c == '=')
}

/// Comment lines seen since the last category or property.
///
/// Recognises the banner the serializer writes above each category:
///
/// ```text
/// ####################
/// # name
/// #===================
/// # user comment
/// ####################
/// ```
#[derive(Default)]
struct CommentBuffer {
    lines: Vec<String>,
}

impl CommentBuffer {
    fn push(&mut self, text: String) {
        self.lines.push(text);
    }

    fn clear(&mut self) {
        self.lines.clear();
    }

    /// Index of the opening rule of a banner that ends the buffer.
    ///
    /// The earliest match wins, so comment lines that look like rules stay
    /// part of the comment.
    fn banner_start(&self) -> Option<usize> {
        let last = self.lines.len().checked_sub(1)?;
        if !is_rule(&self.lines[last]) {
            return None;
        }
        (0..last.saturating_sub(1)).find(|&start| {
            is_rule(&self.lines[start])
                && (start + 2 == last || is_separator(&self.lines[start + 2]))
        })
    }

    fn take_category_comment(&mut self) -> Option<String> {
        let start = self.banner_start();
        let lines = std::mem::take(&mut self.lines);
        match start {
            // Rule, name line, closing rule.
            Some(start) if start + 2 == lines.len() - 1 => None,
            // Rule, name line, separator, comment, closing rule.
            Some(start) => Some(lines[start + 3..lines.len() - 1].join("\n")),
            None if lines.is_empty() => None,
            None => Some(lines.join("\n")),
        }
    }

    fn take_property_comment(&mut self) -> Option<String> {
        let lines = std::mem::take(&mut self.lines);
        (!lines.is_empty()).then(|| lines.join("\n"))
    }
}

/// An open category: where `}` returns to, and what it closes.
struct Scope {
    previous: Option<String>,
    qualified: String,
    line: usize,
}

/// An embedded document being captured between `START:` and `END:`.
struct Block {
    name: String,
    tree: CategoryTree,
    line: usize,
}

/// Output of a successful parse.
#[derive(Debug, Default)]
pub struct Parsed {
    /// Categories outside any embedded document.
    pub categories: CategoryTree,
    /// Embedded documents by name.
    pub children: BTreeMap<String, CategoryTree>,
}

/// The configuration parser.
///
/// Created via [`Deserializer::from_str`] and consumed by [`Deserializer::parse`].
pub struct Deserializer<'de> {
    input: &'de str,
    current: Option<String>,
    scopes: Vec<Scope>,
    comments: CommentBuffer,
    own: CategoryTree,
    block: Option<Block>,
    children: BTreeMap<String, CategoryTree>,
}

impl<'de> Deserializer<'de> {
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(input: &'de str) -> Self {
        Deserializer {
            input,
            current: None,
            scopes: Vec::new(),
            comments: CommentBuffer::default(),
            own: CategoryTree::new(),
            block: None,
            children: BTreeMap::new(),
        }
    }

    /// Parses the whole input.
    ///
    /// # Errors
    ///
    /// Returns the first syntax, scope or embedding error found.
    pub fn parse(mut self) -> Result<Parsed> {
        let input = self.input;
        for (index, text) in input.lines().enumerate() {
            let line = index + 1;
            match tokenize_line(line, text)? {
                Line::DocumentStart(name) => self.start_document(line, name)?,
                Line::DocumentEnd(name) => self.end_document(line, &name)?,
                Line::Tokens(tokens) => {
                    for token in tokens {
                        self.apply(line, token)?;
                    }
                }
            }
        }

        self.ensure_closed()?;
        if let Some(block) = self.block {
            return Err(Error::document(
                block.line,
                &format!("document {} is never ended", block.name),
            ));
        }

        Ok(Parsed {
            categories: self.own,
            children: self.children,
        })
    }

    fn tree(&mut self) -> &mut CategoryTree {
        match &mut self.block {
            Some(block) => &mut block.tree,
            None => &mut self.own,
        }
    }

    fn ensure_closed(&self) -> Result<()> {
        match self.scopes.last() {
            Some(scope) => Err(Error::UnclosedCategory {
                line: scope.line,
                name: scope.qualified.clone(),
            }),
            None => Ok(()),
        }
    }

    fn start_document(&mut self, line: usize, name: String) -> Result<()> {
        if let Some(open) = &self.block {
            return Err(Error::document(
                line,
                &format!("document {name} starts inside document {}", open.name),
            ));
        }
        self.ensure_closed()?;
        self.comments.clear();
        self.block = Some(Block {
            name,
            tree: CategoryTree::new(),
            line,
        });
        Ok(())
    }

    fn end_document(&mut self, line: usize, name: &str) -> Result<()> {
        match &self.block {
            None => {
                return Err(Error::document(
                    line,
                    &format!("document {name} ends without a start"),
                ))
            }
            Some(open) if open.name != name => {
                return Err(Error::document(
                    line,
                    &format!("document {name} ends while {} is open", open.name),
                ))
            }
            Some(_) => {}
        }
        self.ensure_closed()?;
        self.comments.clear();
        if let Some(block) = self.block.take() {
            self.children.insert(block.name, block.tree);
        }
        Ok(())
    }

    fn apply(&mut self, line: usize, token: Token) -> Result<()> {
        match token {
            Token::Comment(text) => self.comments.push(text),
            Token::CategoryOpen(name) => {
                let comment = self.comments.take_category_comment();
                let base = self.current.take();
                let category = self.tree().ensure(base.as_deref(), &name);
                if let Some(comment) = comment {
                    category.set_comment(comment);
                }
                let qualified = category.qualified_name().to_string();
                self.scopes.push(Scope {
                    previous: base,
                    qualified: qualified.clone(),
                    line,
                });
                self.current = Some(qualified);
            }
            Token::CategoryClose => {
                self.comments.clear();
                let scope = self.scopes.pop().ok_or(Error::UnbalancedClose { line })?;
                self.current = scope.previous;
            }
            Token::Property { name, value } => {
                let Some(current) = self.current.clone() else {
                    return Err(Error::PropertyWithoutScope { line, name });
                };
                let mut property = Property::from_raw(name, &value);
                if let Some(comment) = self.comments.take_property_comment() {
                    property.set_comment(comment);
                }
                let category = self
                    .tree()
                    .get_mut(&current)
                    .ok_or_else(|| Error::syntax(line, "current category vanished"))?;
                category.properties_mut().insert(property);
            }
        }
        Ok(())
    }
}
