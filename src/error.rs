//! Error types for configuration parsing, lookup and id allocation.
//!
//! Every parse failure carries the 1-based line number of the decoded text it
//! was raised on. Parse errors are fatal for the load that produced them: the
//! caller should throw the half-built document away rather than keep using it.
//!
//! ## Error Categories
//!
//! - **Syntax Errors**: unmatched quotes, stray braces, unknown characters
//! - **Scope Errors**: properties outside any category, unclosed categories
//! - **Document Errors**: misuse of `START:` / `END:` embedding markers
//! - **Lookup Errors**: querying a key under a category that does not exist
//! - **Allocation Errors**: an id domain with no free slot left
//! - **I/O Errors**: only surfaced by the `try_*` entry points
//!
//! ## Examples
//!
//! ```rust
//! use cfgtree::{from_str, Error};
//!
//! let result = from_str("orphan=1");
//! assert!(matches!(result, Err(Error::PropertyWithoutScope { line: 1, .. })));
//! ```

use std::fmt;
use thiserror::Error;

/// Represents all possible errors raised by this crate.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// IO error during reading or writing
    #[error("IO error: {0}")]
    Io(String),

    /// Generic syntax error
    #[error("Syntax error at line {line}: {msg}")]
    Syntax { line: usize, msg: String },

    /// A quoted span was still open at the end of the line
    #[error("Syntax error at line {line}: unmatched quote")]
    UnmatchedQuote { line: usize },

    /// `name=value` appeared before any category was opened
    #[error("Syntax error at line {line}: property {name} has no scope")]
    PropertyWithoutScope { line: usize, name: String },

    /// `}` with nothing left to close
    #[error("Syntax error at line {line}: closing brace without an open category")]
    UnbalancedClose { line: usize },

    /// A category was still open when its enclosing block ended
    #[error("Syntax error at line {line}: category {name} is never closed")]
    UnclosedCategory { line: usize, name: String },

    /// Character outside the grammar
    #[error("Syntax error at line {line}: unknown character {ch:?}")]
    UnknownCharacter { line: usize, ch: char },

    /// `{` or `=` without an identifier in front of it
    #[error("Syntax error at line {line}: missing name before {token:?}")]
    MissingName { line: usize, token: char },

    /// Misplaced or mismatched `START:` / `END:` marker
    #[error("Document error at line {line}: {msg}")]
    Document { line: usize, msg: String },

    /// Key lookup under a category that does not exist
    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    /// Every slot of an id domain is taken
    #[error("No more {domain} ids available for {key}")]
    IdsExhausted { domain: String, key: String },

    /// Custom error
    #[error("Error: {0}")]
    Custom(String),
}

impl Error {
    /// Creates a syntax error with a line number.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cfgtree::Error;
    ///
    /// let err = Error::syntax(10, "unexpected token");
    /// assert!(err.to_string().contains("line 10"));
    /// ```
    pub fn syntax(line: usize, msg: &str) -> Self {
        Error::Syntax {
            line,
            msg: msg.to_string(),
        }
    }

    /// Creates an error for a misplaced embedding marker.
    pub fn document(line: usize, msg: &str) -> Self {
        Error::Document {
            line,
            msg: msg.to_string(),
        }
    }

    /// Creates an allocation error for an exhausted domain.
    pub fn ids_exhausted(domain: impl fmt::Display, key: &str) -> Self {
        Error::IdsExhausted {
            domain: domain.to_string(),
            key: key.to_string(),
        }
    }

    /// Creates a custom error with a display message.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cfgtree::Error;
    ///
    /// let err = Error::custom("something went wrong");
    /// assert!(err.to_string().contains("something went wrong"));
    /// ```
    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }

    /// Creates an I/O error for file reading/writing failures.
    pub fn io(msg: &str) -> Self {
        Error::Io(msg.to_string())
    }

    /// Returns the line an error was raised on, if it came from the parser.
    #[must_use]
    pub fn line(&self) -> Option<usize> {
        match self {
            Error::Syntax { line, .. }
            | Error::UnmatchedQuote { line }
            | Error::PropertyWithoutScope { line, .. }
            | Error::UnbalancedClose { line }
            | Error::UnclosedCategory { line, .. }
            | Error::UnknownCharacter { line, .. }
            | Error::MissingName { line, .. }
            | Error::Document { line, .. } => Some(*line),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
