//! On-disk format reference
//!
//! This module documents the configuration file format read by
//! [`Deserializer`](crate::Deserializer) and written by
//! [`Serializer`](crate::Serializer).
//!
//! # Overview
//!
//! A file is a tree of named **categories**, each holding **properties**
//! (`name=value` lines) and nested child categories. A file may instead hold
//! several **embedded documents**, each a complete category tree of its own.
//!
//! ```text
//! # Configuration file
//! # Generated on 2024-01-15 10:30:00
//!
//! ####################
//! # server
//! #===================
//! # Network settings
//! ####################
//!
//! server {
//!    # Port to listen on
//!    port=25565
//!    motd=Welcome, traveller
//!    admins=["alice", "bob"]
//! }
//!
//! ```
//!
//! # Lines
//!
//! The parser looks at one line at a time. Lines end with `\n` or `\r\n`.
//!
//! | Line | Meaning |
//! |------|---------|
//! | blank | ignored |
//! | `# text` | comment, runs to the end of the line |
//! | `name {` | opens a category below the current one |
//! | `}` | closes the innermost open category |
//! | `name=value` | property of the current category |
//! | `START: "doc"` | begins embedded document `doc` |
//! | `END: "doc"` | ends it |
//!
//! Several structural tokens may share a line (`a { b { } }`); everything
//! right of `=` is the value, so a property always ends its line.
//!
//! # Names
//!
//! Unquoted names use letters, digits and `._-`. Whitespace between two
//! name characters is part of the name, whitespace around it is not:
//!
//! ```text
//! two words {        category "two words"
//! ```
//!
//! Anything else has to be quoted. A quote at the start of a name opens a
//! span whose content is taken verbatim; an unterminated quote is an error.
//! Once a name has started, quotes are ordinary characters, and so is the
//! quote that closed a span if more of the name follows it:
//!
//! ```text
//! "my category!" {       my category!
//!    " padded "=1        " padded " with its spaces
//!    "a" "b"=2           a" "b
//! }
//! ```
//!
//! Stored names never contain `"` or a line break: both are replaced (by
//! `'` and a space) when a name enters a document, whether from a file or
//! from an accessor. The last name above is therefore stored as `a' 'b`, and
//! written back as `"a' 'b"`.
//!
//! # Dotted paths
//!
//! A dot in a category name is a level separator. `a.b.c {` opens `c`,
//! creating `a` and `a.b` on the way if they do not exist, and is equivalent
//! to three nested blocks. Its closing `}` returns to the category that was
//! open before it.
//!
//! Property names are never split: `pick.axe=3` is a single property called
//! `pick.axe`.
//!
//! # Values
//!
//! Values are read verbatim, including surrounding spaces and any `#`, and
//! always end at the line break. Line breaks in a stored string become
//! spaces; list elements escape them. The kind of a value read from a file is
//! inferred, and the typed getters convert it to the kind they ask for:
//!
//! | Text | Kind |
//! |------|------|
//! | `true`, `FALSE` | boolean |
//! | `-42` (fits in 32 bits) | integer |
//! | `["a", "b\"c"]` | list (`\"`, `\\`, `\n`, `\r`, `\t` escapes) |
//! | anything else | string |
//!
//! # Comments
//!
//! Every category is written under a banner. A category comment goes below a
//! `#===` separator inside the banner; property comments are plain `#` lines
//! right above the property. Both are read back when the file is loaded,
//! including comment lines that look like banner rules. Other comment lines
//! are dropped.
//!
//! # Embedded documents
//!
//! ```text
//! START: "alpha"
//! ...categories of alpha...
//! END: "alpha"
//! ```
//!
//! Blocks cannot nest, must be closed with the name they were opened with,
//! and every category opened inside must be closed before `END`. When a
//! document has embedded documents only their blocks are written, in name
//! order.
//!
//! # Encoding
//!
//! A byte order mark selects UTF-8, UTF-16 or UTF-32 in either byte order;
//! without one the configured default applies. Files are written back in the
//! encoding they were read in, with a mark only if they had one.
//!
//! # Ordering
//!
//! Root categories and child categories are written sorted by name;
//! properties keep the order they were created or read in. Writing the same
//! data twice gives the same text apart from the timestamp.
