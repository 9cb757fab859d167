//! # cfgtree
//!
//! Hierarchical configuration files with nested categories, typed properties
//! and persistent numeric id allocation.
//!
//! ## Key Features
//!
//! - **Nested categories**: `a.b.c` paths create every missing level
//! - **Typed properties**: booleans, integers, strings and string lists, read leniently
//! - **Deterministic output**: the same data always writes the same text
//! - **Comments survive**: category and property comments are read back on load
//! - **Embedded documents**: several trees in one file via `START:`/`END:` blocks
//! - **Unicode encodings**: BOM detection for UTF-8, UTF-16 and UTF-32
//! - **Id allocation**: bounded id domains with persisted assignments
//!
//! ## Quick Start
//!
//! ```rust
//! use cfgtree::{from_str, to_string};
//!
//! let mut doc = from_str("server {\n   port=25565\n}\n").unwrap();
//! assert_eq!(doc.get_int("server", "port", 80).as_int(0), 25565);
//!
//! doc.get_bool("server", "whitelist", false);
//! let text = to_string(&doc);
//! assert!(text.contains("whitelist=false"));
//! ```
//!
//! ### Files
//!
//! ```rust,no_run
//! use cfgtree::{Document, DocumentOptions};
//!
//! let mut doc = Document::open("config/server.cfg", DocumentOptions::default())?;
//! let motd = doc.get_string("general", "motd", "Welcome").to_raw().into_owned();
//! doc.save();
//! # Ok::<(), cfgtree::Error>(())
//! ```
//!
//! ### Ids
//!
//! ```rust
//! use cfgtree::{AllocatorConfig, Document, DocumentOptions, Domain, IdAllocator, NoReservations};
//!
//! let mut ids = IdAllocator::new(AllocatorConfig::default(), NoReservations);
//! let mut doc = Document::new(DocumentOptions::default());
//! let torch = ids.get_or_assign_default(&mut doc, "torch", 50, Domain::Primary).unwrap();
//! assert_eq!(torch, 50);
//! ```
//!
//! See [`format`] for the file layout.

pub mod alloc;
pub mod category;
pub mod de;
pub mod document;
pub mod encoding;
pub mod error;
pub mod format;
pub mod map;
pub mod options;
pub mod property;
pub mod registry;
pub mod ser;

pub use alloc::{AllocatorConfig, Domain, IdAllocator, NoReservations, ReservationOracle};
pub use category::{Category, CategoryTree};
pub use de::Deserializer;
pub use document::{Document, CATEGORY_GENERAL};
pub use encoding::Encoding;
pub use error::{Error, Result};
pub use map::PropertyMap;
pub use options::{DocumentOptions, LineEnding};
pub use property::{Property, PropertyKind, PropertyValue};
pub use registry::Registry;
pub use ser::Serializer;

use chrono::{Local, NaiveDateTime};
use std::io;

/// Parse a document from configuration text with default options.
///
/// # Examples
///
/// ```rust
/// use cfgtree::from_str;
///
/// let doc = from_str("general {\n   enabled=true\n}\n").unwrap();
/// assert_eq!(doc.has_key("general", "enabled"), Ok(true));
/// ```
///
/// # Errors
///
/// Returns an error carrying the line number if the text does not parse.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_str(s: &str) -> Result<Document> {
    from_str_with_options(s, DocumentOptions::default())
}

/// Parse a document from configuration text with custom options.
///
/// # Errors
///
/// Returns an error carrying the line number if the text does not parse.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_str_with_options(s: &str, options: DocumentOptions) -> Result<Document> {
    let parsed = Deserializer::from_str(s).parse()?;
    Ok(Document::from_parsed(parsed, options))
}

/// Parse a document from encoded bytes.
///
/// A leading byte order mark selects the encoding; otherwise
/// `options.default_encoding` is used. The resulting document writes back in
/// the same encoding.
///
/// # Examples
///
/// ```rust
/// use cfgtree::{from_slice, DocumentOptions, Encoding};
///
/// let bytes = b"\xEF\xBB\xBFgeneral {\n}\n";
/// let doc = from_slice(bytes, DocumentOptions::default()).unwrap();
/// assert_eq!(doc.encoding(), Encoding::Utf8);
/// assert!(doc.has_bom());
/// ```
///
/// # Errors
///
/// Returns an error if the decoded text does not parse.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_slice(v: &[u8], options: DocumentOptions) -> Result<Document> {
    from_reader(v, options)
}

/// Parse a document from an I/O stream of encoded bytes.
///
/// # Errors
///
/// Returns an error if reading fails or the decoded text does not parse.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_reader<R>(reader: R, options: DocumentOptions) -> Result<Document>
where
    R: io::Read,
{
    Document::from_reader(reader, options)
}

/// Write a document as configuration text, stamped with the current local time.
#[must_use]
pub fn to_string(doc: &Document) -> String {
    to_string_at(doc, Local::now().naive_local())
}

/// Write a document as configuration text with a fixed generation time.
///
/// # Examples
///
/// ```rust
/// use cfgtree::{to_string_at, Document, DocumentOptions, LineEnding};
/// use chrono::NaiveDate;
///
/// let mut doc = Document::new(DocumentOptions::new().with_line_ending(LineEnding::Lf));
/// doc.get_int("general", "port", 1);
///
/// let at = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap().and_hms_opt(10, 30, 0).unwrap();
/// assert!(to_string_at(&doc, at).starts_with("# Configuration file\n# Generated on 2024-01-15 10:30:00\n"));
/// ```
#[must_use]
pub fn to_string_at(doc: &Document, generated: NaiveDateTime) -> String {
    doc.to_text(generated)
}

/// Write a document to a writer, encoded the way it was read.
///
/// # Errors
///
/// Returns an error if writing to the writer fails.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_writer<W>(mut writer: W, doc: &Document) -> Result<()>
where
    W: io::Write,
{
    writer
        .write_all(&doc.to_bytes(Local::now().naive_local()))
        .map_err(|e| Error::io(&e.to_string()))?;
    Ok(())
}
