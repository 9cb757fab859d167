//! Configuration options for documents.
//!
//! - [`DocumentOptions`]: encoding fallback, category case handling and output layout
//! - [`LineEnding`]: line terminator used when writing
//!
//! ## Examples
//!
//! ```rust
//! use cfgtree::{DocumentOptions, LineEnding};
//! use cfgtree::encoding::Encoding;
//!
//! let options = DocumentOptions::new()
//!     .with_default_encoding(Encoding::Utf16Le)
//!     .with_case_sensitive(true)
//!     .with_line_ending(LineEnding::Lf);
//! assert_eq!(options.indent, 3);
//! ```

use crate::encoding::Encoding;

/// Line terminator written after every output line.
///
/// The parser accepts both regardless of this setting.
///
/// ```rust
/// use cfgtree::LineEnding;
///
/// assert_eq!(LineEnding::CrLf.as_str(), "\r\n");
/// assert_eq!(LineEnding::Lf.as_str(), "\n");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LineEnding {
    #[default]
    CrLf,
    Lf,
}

impl LineEnding {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            LineEnding::CrLf => "\r\n",
            LineEnding::Lf => "\n",
        }
    }
}

/// Options shared by every load and save of a document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocumentOptions {
    /// Encoding assumed when the file has no byte order mark.
    pub default_encoding: Encoding,
    /// Keep category names as given instead of lower-casing them on lookup.
    pub case_sensitive: bool,
    /// Spaces per nesting level.
    pub indent: usize,
    pub line_ending: LineEnding,
}

impl Default for DocumentOptions {
    fn default() -> Self {
        DocumentOptions {
            default_encoding: Encoding::Utf8,
            case_sensitive: false,
            indent: 3,
            line_ending: LineEnding::CrLf,
        }
    }
}

impl DocumentOptions {
    /// Creates default options (UTF-8, case-insensitive categories, 3-space indent, CRLF).
    ///
    /// ```rust
    /// use cfgtree::DocumentOptions;
    ///
    /// let options = DocumentOptions::new();
    /// assert!(!options.case_sensitive);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_default_encoding(mut self, encoding: Encoding) -> Self {
        self.default_encoding = encoding;
        self
    }

    /// Makes category lookups case-sensitive.
    #[must_use]
    pub fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    /// Sets the indentation size (number of spaces per level).
    ///
    /// ```rust
    /// use cfgtree::DocumentOptions;
    ///
    /// let options = DocumentOptions::new().with_indent(4);
    /// assert_eq!(options.indent, 4);
    /// ```
    #[must_use]
    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    #[must_use]
    pub fn with_line_ending(mut self, line_ending: LineEnding) -> Self {
        self.line_ending = line_ending;
        self
    }
}
