//! Configuration text writing.
//!
//! The [`Serializer`] walks a document deterministically: root categories in
//! name order, each followed by its properties in insertion order and then its
//! children sorted by name. Two documents holding the same data therefore
//! produce the same text no matter in which order their values were touched.
//!
//! ## Layout
//!
//! ```text
//! # Configuration file
//! # Generated on 2024-01-15 10:30:00
//!
//! ####################
//! # general
//! #===================
//! # optional category comment
//! ####################
//!
//! general {
//!    # optional property comment
//!    port=25565
//!    ####################
//!    # nested
//!    ####################
//!
//!    nested {
//!    }
//!
//! }
//! ```
//!
//! When a document holds embedded documents, each one is written as a
//! `START: "name"` / `END: "name"` block instead of the document's own
//! categories.
//!
//! ```rust
//! use cfgtree::{Document, DocumentOptions, LineEnding, Serializer};
//! use chrono::NaiveDate;
//!
//! let options = DocumentOptions::new().with_line_ending(LineEnding::Lf);
//! let mut doc = Document::new(options.clone());
//! doc.get_int("general", "port", 25565);
//!
//! let at = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap().and_hms_opt(10, 30, 0).unwrap();
//! let mut serializer = Serializer::new(options);
//! serializer.write_document(&doc, at);
//! assert!(serializer.into_inner().contains("general {\n   port=25565\n}\n"));
//! ```

use crate::category::{comment_lines, Category, CategoryTree};
use crate::de::is_name_char;
use crate::{Document, DocumentOptions, Property};
use chrono::NaiveDateTime;

const RULE: &str = "####################";
const COMMENT_SEPARATOR: &str = "#===================";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Returns `true` if `name` has to be quoted to be read back.
#[inline]
#[must_use]
pub fn needs_quotes(name: &str) -> bool {
    name.is_empty() || !name.chars().all(is_name_char)
}

/// The configuration writer.
pub struct Serializer {
    output: String,
    options: DocumentOptions,
}

impl Serializer {
    pub fn new(options: DocumentOptions) -> Self {
        Serializer {
            output: String::with_capacity(1024),
            options,
        }
    }

    pub fn into_inner(self) -> String {
        self.output
    }

    fn line(&mut self, depth: usize, text: &str) {
        self.indent(depth);
        self.output.push_str(text);
        self.blank();
    }

    fn blank(&mut self) {
        self.output.push_str(self.options.line_ending.as_str());
    }

    fn write_name(&mut self, name: &str) {
        if needs_quotes(name) {
            self.output.push('"');
            self.output.push_str(name);
            self.output.push('"');
        } else {
            self.output.push_str(name);
        }
    }

    fn write_comment(&mut self, depth: usize, comment: Option<&str>) {
        for text in comment_lines(comment).unwrap_or_default() {
            self.line(depth, &format!("# {text}"));
        }
    }

    /// Writes the file banner.
    pub fn write_header(&mut self, generated: NaiveDateTime) {
        self.line(0, "# Configuration file");
        self.line(0, &format!("# Generated on {}", generated.format(TIMESTAMP_FORMAT)));
        self.blank();
    }

    /// Writes a complete document: header, then either its embedded documents
    /// or its own categories.
    pub fn write_document(&mut self, document: &Document, generated: NaiveDateTime) {
        self.write_header(generated);

        if document.children().is_empty() {
            self.write_tree(document.categories());
            return;
        }

        for (name, child) in document.children() {
            self.line(0, &format!("START: \"{name}\""));
            self.write_tree(child.categories());
            self.line(0, &format!("END: \"{name}\""));
            self.blank();
        }
    }

    /// Writes every root category of `tree` and, recursively, their children.
    pub fn write_tree(&mut self, tree: &CategoryTree) {
        for category in tree.roots() {
            self.write_category(tree, category, 0);
        }
    }

    fn write_category(&mut self, tree: &CategoryTree, category: &Category, depth: usize) {
        self.line(depth, RULE);
        self.line(depth, &format!("# {}", category.name()));
        if category.comment().is_some() {
            self.line(depth, COMMENT_SEPARATOR);
            self.write_comment(depth, category.comment());
        }
        self.line(depth, RULE);
        self.blank();

        self.indent(depth);
        self.write_name(category.name());
        self.output.push_str(" {");
        self.blank();

        for property in category.properties().values() {
            self.write_property(property, depth + 1);
        }

        for child in tree.children_of(category) {
            self.write_category(tree, child, depth + 1);
        }

        self.line(depth, "}");
        self.blank();
    }

    fn write_property(&mut self, property: &Property, depth: usize) {
        self.write_comment(depth, property.comment());
        self.indent(depth);
        self.write_name(property.name());
        self.output.push('=');
        self.output.push_str(&property.to_raw());
        self.blank();
    }

    fn indent(&mut self, depth: usize) {
        for _ in 0..depth * self.options.indent {
            self.output.push(' ');
        }
    }
}
