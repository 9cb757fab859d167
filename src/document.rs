//! Configuration documents.
//!
//! A [`Document`] owns a [`CategoryTree`], an optional set of embedded child
//! documents and the knowledge of where it is persisted:
//!
//! - detached: in memory only, `load` and `save` do nothing
//! - file-backed: read from and written to one path
//! - a section of a shared [`Registry`]: stored as an embedded document of the
//!   registry's root file
//!
//! Values are read through typed getters that create missing entries with the
//! given default, so the first run of a program writes out a complete file.
//!
//! ```rust
//! use cfgtree::{Document, DocumentOptions};
//!
//! let mut doc = Document::new(DocumentOptions::default());
//! let port = doc.get_int("server.network", "port", 25565).as_int(0);
//! assert_eq!(port, 25565);
//! assert!(doc.has_category("server"));
//! assert_eq!(doc.has_key("server.network", "port"), Ok(true));
//! ```

use crate::category::{Category, CategoryTree};
use crate::de::{Deserializer, Parsed};
use crate::encoding::{Encoding, UnicodeReader};
use crate::property::clean_name;
use crate::ser::Serializer;
use crate::{DocumentOptions, Error, Property, PropertyKind, PropertyValue, Registry, Result};
use chrono::{Local, NaiveDateTime};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fs;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, error};

/// Category used by hosts that do not pick their own.
pub const CATEGORY_GENERAL: &str = "general";

/// Where a document is persisted.
#[derive(Clone, Debug)]
pub enum Backing {
    Detached,
    File(PathBuf),
    /// Embedded document `name` inside the registry's root file.
    Section { registry: Registry, name: String },
}

/// A hierarchical configuration document.
#[derive(Clone, Debug)]
pub struct Document {
    backing: Backing,
    options: DocumentOptions,
    encoding: Encoding,
    write_bom: bool,
    categories: CategoryTree,
    children: BTreeMap<String, Document>,
}

impl Document {
    /// Creates an empty in-memory document.
    #[must_use]
    pub fn new(options: DocumentOptions) -> Self {
        Document {
            backing: Backing::Detached,
            encoding: options.default_encoding,
            options,
            write_bom: false,
            categories: CategoryTree::new(),
            children: BTreeMap::new(),
        }
    }

    /// Creates a document backed by `path` without reading it.
    #[must_use]
    pub fn with_file(path: impl Into<PathBuf>, options: DocumentOptions) -> Self {
        Document {
            backing: Backing::File(path.into()),
            ..Document::new(options)
        }
    }

    /// Creates a document backed by `path` and loads it.
    ///
    /// A missing file is created empty. Read failures are logged and leave the
    /// document empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but does not parse.
    pub fn open(path: impl Into<PathBuf>, options: DocumentOptions) -> Result<Self> {
        let mut doc = Document::with_file(path, options);
        doc.load()?;
        Ok(doc)
    }

    /// Creates a document stored as a section of `registry`'s root file.
    ///
    /// The section is named after `path` relative to the registry's base
    /// directory, see [`Registry::section_name`].
    #[must_use]
    pub fn open_in(registry: &Registry, path: impl AsRef<Path>, options: DocumentOptions) -> Self {
        registry.attach(path, options)
    }

    pub(crate) fn section(registry: Registry, name: String, options: DocumentOptions) -> Self {
        Document {
            backing: Backing::Section { registry, name },
            ..Document::new(options)
        }
    }

    pub(crate) fn from_parsed(parsed: Parsed, options: DocumentOptions) -> Self {
        let mut doc = Document::new(options);
        doc.install(parsed);
        doc
    }

    fn install(&mut self, parsed: Parsed) {
        self.categories = self.fold_case(parsed.categories);
        self.children = parsed
            .children
            .into_iter()
            .map(|(name, categories)| {
                let child = Document {
                    categories: self.fold_case(categories),
                    ..Document::new(self.options.clone())
                };
                (name, child)
            })
            .collect();
    }

    fn fold_case(&self, tree: CategoryTree) -> CategoryTree {
        if self.options.case_sensitive {
            tree
        } else {
            tree.into_lowercase()
        }
    }

    /// Decodes and parses a complete encoded file image.
    pub(crate) fn from_reader<R: Read>(reader: R, options: DocumentOptions) -> Result<Self> {
        let reader = UnicodeReader::new(reader, options.default_encoding)?;
        let (encoding, write_bom) = (reader.encoding(), reader.has_bom());
        let text = reader.read_text()?;
        let mut doc = Document::from_parsed(Deserializer::from_str(&text).parse()?, options);
        doc.encoding = encoding;
        doc.write_bom = write_bom;
        Ok(doc)
    }

    #[must_use]
    pub fn backing(&self) -> &Backing {
        &self.backing
    }

    /// The backing file, if this document has its own.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match &self.backing {
            Backing::File(path) => Some(path),
            _ => None,
        }
    }

    /// `true` for documents stored inside a registry.
    #[must_use]
    pub fn is_section(&self) -> bool {
        matches!(self.backing, Backing::Section { .. })
    }

    #[must_use]
    pub fn options(&self) -> &DocumentOptions {
        &self.options
    }

    /// Encoding detected on the last load, or the configured default.
    #[must_use]
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Whether saving writes a byte order mark, i.e. whether one was read.
    #[must_use]
    pub fn has_bom(&self) -> bool {
        self.write_bom
    }

    /// Changes the output encoding, optionally with a byte order mark.
    pub fn set_encoding(&mut self, encoding: Encoding, bom: bool) {
        self.encoding = encoding;
        self.write_bom = bom;
    }

    /// Re-reads the document from its backing store, replacing its contents.
    ///
    /// Read failures are logged and leave the document untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored text does not parse.
    pub fn load(&mut self) -> Result<()> {
        match self.try_load() {
            Err(Error::Io(msg)) => {
                error!(path = ?self.path(), error = %msg, "failed to read configuration");
                Ok(())
            }
            other => other,
        }
    }

    /// Like [`Document::load`] but also reports read failures.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be created or read, or a
    /// syntax error if it does not parse.
    pub fn try_load(&mut self) -> Result<()> {
        match &self.backing {
            Backing::Detached => Ok(()),
            Backing::File(path) => {
                let path = path.clone();
                self.load_file(&path)
            }
            Backing::Section { registry, name } => {
                self.categories = registry.load_section(name);
                self.children.clear();
                Ok(())
            }
        }
    }

    fn load_file(&mut self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        if !path.exists() {
            fs::File::create(path)?;
            debug!(path = %path.display(), "created empty configuration file");
            return Ok(());
        }

        let file = fs::File::open(path)?;
        let loaded = Document::from_reader(BufReader::new(file), self.options.clone())?;
        self.encoding = loaded.encoding;
        self.write_bom = loaded.write_bom;
        self.categories = loaded.categories;
        self.children = loaded.children;
        debug!(
            path = %path.display(),
            encoding = %self.encoding,
            categories = self.categories.len(),
            "loaded configuration"
        );
        Ok(())
    }

    /// Writes the document to its backing store. Failures are logged.
    pub fn save(&self) {
        if let Err(err) = self.try_save() {
            error!(path = ?self.path(), error = %err, "failed to save configuration");
        }
    }

    /// Like [`Document::save`] but reports failures.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be written.
    pub fn try_save(&self) -> Result<()> {
        match &self.backing {
            Backing::Detached => Ok(()),
            Backing::File(path) => {
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(path, self.to_bytes(Local::now().naive_local()))?;
                debug!(path = %path.display(), "saved configuration");
                Ok(())
            }
            Backing::Section { registry, name } => registry.store_section(name, &self.categories),
        }
    }

    /// Renders the document as text with the given generation time.
    #[must_use]
    pub fn to_text(&self, generated: NaiveDateTime) -> String {
        let mut serializer = Serializer::new(self.options.clone());
        serializer.write_document(self, generated);
        serializer.into_inner()
    }

    /// Renders and encodes the document, prefixed by a byte order mark if one was read.
    #[must_use]
    pub fn to_bytes(&self, generated: NaiveDateTime) -> Vec<u8> {
        let mut bytes = Vec::new();
        if self.write_bom {
            bytes.extend_from_slice(self.encoding.bom());
        }
        bytes.extend(self.encoding.encode(&self.to_text(generated)));
        bytes
    }

    #[must_use]
    pub fn categories(&self) -> &CategoryTree {
        &self.categories
    }

    pub fn categories_mut(&mut self) -> &mut CategoryTree {
        &mut self.categories
    }

    /// Looks a category up by qualified name.
    #[must_use]
    pub fn category(&self, name: &str) -> Option<&Category> {
        self.categories.get(&self.normalize(name))
    }

    #[must_use]
    pub fn has_category(&self, name: &str) -> bool {
        self.categories.contains(&self.normalize(name))
    }

    /// Tests whether `key` exists directly inside `category`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownCategory`] if `category` does not exist.
    pub fn has_key(&self, category: &str, key: &str) -> Result<bool> {
        Ok(self.property(category, key)?.is_some())
    }

    /// Reads a property without creating anything.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownCategory`] if `category` does not exist.
    pub fn property(&self, category: &str, key: &str) -> Result<Option<&Property>> {
        self.category(category)
            .map(|c| c.get(&clean_name(key)))
            .ok_or_else(|| Error::UnknownCategory(category.to_string()))
    }

    /// Returns the property `key` of `category`, creating it from `default` if missing.
    ///
    /// The category path and its ancestors are always created. Without a
    /// default, a missing key yields `None`.
    pub fn get(
        &mut self,
        category: &str,
        key: &str,
        default: Option<PropertyValue>,
        kind: PropertyKind,
    ) -> Option<&mut Property> {
        match default {
            Some(default) => Some(self.entry(category, key, default, kind)),
            None => {
                let category = self.normalize(category).into_owned();
                self.categories.ensure(None, &category).get_mut(&clean_name(key))
            }
        }
    }

    fn entry(
        &mut self,
        category: &str,
        key: &str,
        default: PropertyValue,
        kind: PropertyKind,
    ) -> &mut Property {
        let category = self.normalize(category).into_owned();
        let key = clean_name(key);
        self.categories
            .ensure(None, &category)
            .properties_mut()
            .get_or_insert_with(&key, || Property::new(&*key, coerce(default, kind), kind))
    }

    /// Integer property; a stored value that is not an integer is reset to `default`.
    pub fn get_int(&mut self, category: &str, key: &str, default: i32) -> &mut Property {
        let prop = self.entry(category, key, default.into(), PropertyKind::Integer);
        if !prop.is_int() {
            prop.set(default);
        }
        prop.set_kind(PropertyKind::Integer);
        prop
    }

    /// Boolean property; a stored value that is not a boolean is reset to `default`.
    pub fn get_bool(&mut self, category: &str, key: &str, default: bool) -> &mut Property {
        let prop = self.entry(category, key, default.into(), PropertyKind::Boolean);
        if !prop.is_bool() {
            prop.set(default);
        }
        prop.set_kind(PropertyKind::Boolean);
        prop
    }

    /// String property; a stored list is turned back into its written form.
    pub fn get_string(&mut self, category: &str, key: &str, default: &str) -> &mut Property {
        let prop = self.entry(category, key, default.into(), PropertyKind::String);
        prop.make_scalar();
        prop
    }

    /// List property; a stored scalar that is not a list literal becomes a
    /// one-element list.
    pub fn get_list(&mut self, category: &str, key: &str, default: &[&str]) -> &mut Property {
        let prop = self.entry(category, key, default.into(), PropertyKind::List);
        prop.make_list();
        prop
    }

    /// Sets the comment of an existing category. Returns `false` if it does not exist.
    pub fn add_comment(&mut self, category: &str, comment: &str) -> bool {
        let name = self.normalize(category).into_owned();
        match self.categories.get_mut(&name) {
            Some(cat) => {
                cat.set_comment(comment);
                true
            }
            None => false,
        }
    }

    /// Sets the comment of an existing property. Returns `false` if it does not exist.
    pub fn add_property_comment(&mut self, category: &str, key: &str, comment: &str) -> bool {
        let name = self.normalize(category).into_owned();
        match self.categories.get_mut(&name).and_then(|c| c.get_mut(&clean_name(key))) {
            Some(prop) => {
                prop.set_comment(comment);
                true
            }
            None => false,
        }
    }

    /// Embedded documents by name.
    #[must_use]
    pub fn children(&self) -> &BTreeMap<String, Document> {
        &self.children
    }

    #[must_use]
    pub fn child(&self, name: &str) -> Option<&Document> {
        self.children.get(name)
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut Document> {
        self.children.get_mut(name)
    }

    /// Embeds `child` under `name`, returning the document it replaces.
    ///
    /// Once a document has children, saving writes only their blocks.
    ///
    /// # Errors
    ///
    /// Returns an error if `name` is empty or contains `"`, which the
    /// boundary markers cannot represent.
    pub fn insert_child(&mut self, name: &str, child: Document) -> Result<Option<Document>> {
        if name.is_empty() || name.contains('"') {
            return Err(Error::custom(format!("invalid document name {name:?}")));
        }
        Ok(self.children.insert(name.to_string(), child))
    }

    pub(crate) fn child_categories(&mut self, name: &str) -> &mut CategoryTree {
        let options = self.options.clone();
        &mut self
            .children
            .entry(name.to_string())
            .or_insert_with(|| Document::new(options))
            .categories
    }

    /// Compares the data two documents would write, ignoring child order.
    #[must_use]
    pub fn is_equivalent(&self, other: &Document) -> bool {
        self.categories.is_equivalent(&other.categories)
            && self.children.len() == other.children.len()
            && self
                .children
                .iter()
                .zip(other.children.iter())
                .all(|((na, a), (nb, b))| na == nb && a.is_equivalent(b))
    }

    fn normalize<'a>(&self, name: &'a str) -> Cow<'a, str> {
        let name = clean_name(name);
        if self.options.case_sensitive || !name.chars().any(char::is_uppercase) {
            name
        } else {
            Cow::Owned(name.to_lowercase())
        }
    }
}

/// Shapes a default to the requested kind: lists keep all elements, scalars
/// take the first one.
fn coerce(value: PropertyValue, kind: PropertyKind) -> PropertyValue {
    match (value, kind) {
        (PropertyValue::Scalar(s), PropertyKind::List) => PropertyValue::List(vec![s]),
        (PropertyValue::List(items), kind) if kind != PropertyKind::List => {
            PropertyValue::Scalar(items.into_iter().next().unwrap_or_default())
        }
        (value, _) => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LineEnding;

    fn doc() -> Document {
        Document::new(DocumentOptions::new().with_line_ending(LineEnding::Lf))
    }

    #[test]
    fn test_getters_create_defaults_and_ancestors() {
        let mut doc = doc();
        assert_eq!(doc.get_int("a.b.c", "n", 5).as_int(0), 5);
        assert!(doc.has_category("a"));
        assert!(doc.has_category("a.b"));
        assert_eq!(doc.category("a.b.c").unwrap().name(), "c");

        doc.get_int("a.b.c", "n", 5).set(9);
        assert_eq!(doc.get_int("a.b.c", "n", 5).as_int(0), 9);
    }

    #[test]
    fn test_get_without_default() {
        let mut doc = doc();
        assert!(doc
            .get("general", "missing", None, PropertyKind::String)
            .is_none());
        assert!(doc.has_category("general"));

        let prop = doc
            .get("general", "motd", Some("hi".into()), PropertyKind::String)
            .unwrap();
        assert_eq!(prop.as_str(), Some("hi"));
    }

    #[test]
    fn test_typed_getters_repair_bad_values() {
        let mut doc = crate::from_str("general {\n  port=eighty\n  flag=maybe\n}\n").unwrap();
        let port = doc.get_int("general", "port", 80);
        assert_eq!(port.as_int(0), 80);
        assert_eq!(port.kind(), PropertyKind::Integer);
        assert_eq!(port.to_raw(), "80");

        let flag = doc.get_bool("general", "flag", true);
        assert!(flag.as_bool(false));
        assert_eq!(flag.kind(), PropertyKind::Boolean);
    }

    #[test]
    fn test_defaults_take_requested_shape() {
        let mut doc = doc();
        let list = doc.get_list("general", "admins", &["alice", "bob"]);
        assert_eq!(list.as_list(), vec!["alice", "bob"]);
        assert_eq!(list.to_raw(), "[\"alice\", \"bob\"]");

        let single = doc
            .get("general", "single", Some("x".into()), PropertyKind::List)
            .unwrap();
        assert_eq!(single.as_list(), vec!["x"]);

        let first = doc
            .get("general", "first", Some((&["p", "q"][..]).into()), PropertyKind::String)
            .unwrap();
        assert_eq!(first.as_str(), Some("p"));
    }

    #[test]
    fn test_category_lookups_ignore_case() {
        let mut doc = doc();
        doc.get_int("Server.Net", "port", 1);
        assert!(doc.has_category("server.net"));
        assert!(doc.has_category("SERVER"));
        assert_eq!(doc.category("server.net").unwrap().name(), "net");

        let mut strict = Document::new(DocumentOptions::new().with_case_sensitive(true));
        strict.get_int("Server", "port", 1);
        assert!(strict.has_category("Server"));
        assert!(!strict.has_category("server"));
    }

    #[test]
    fn test_parsed_names_fold_to_lower_case() {
        let mut doc = crate::from_str("General {\n   port=1234\n   Sub {\n   }\n}\n").unwrap();
        assert!(doc.has_category("General"));
        assert!(doc.has_category("general.sub"));
        assert_eq!(doc.get_int("General", "port", 80).as_int(0), 1234);
        let names: Vec<_> = doc.categories().iter().map(Category::qualified_name).collect();
        assert_eq!(names, vec!["general", "general.sub"]);

        let merged = crate::from_str("A {\n   x=1\n}\na {\n   x=2\n   y=3\n}\n").unwrap();
        assert_eq!(merged.categories().len(), 1);
        let a = merged.category("a").unwrap();
        assert_eq!(a.get("x").map(|p| p.as_int(0)), Some(1));
        assert_eq!(a.get("y").map(|p| p.as_int(0)), Some(3));

        let strict = crate::from_str_with_options(
            "General {\n}\n",
            DocumentOptions::new().with_case_sensitive(true),
        )
        .unwrap();
        assert!(strict.has_category("General"));
        assert!(!strict.has_category("general"));
    }

    #[test]
    fn test_embedded_documents_fold_case_too() {
        let doc = crate::from_str("START: \"Mods\"\nChat {\n}\nEND: \"Mods\"\n").unwrap();
        let child = doc.child("Mods").unwrap();
        assert!(child.categories().contains("chat"));
    }

    #[test]
    fn test_string_and_list_getters_restore_kind() {
        let mut doc = crate::from_str("c {\n   s=[]\n   t=[\"a\",\"b\"]\n   l=plain\n}\n").unwrap();
        assert_eq!(doc.property("c", "s").unwrap().unwrap().kind(), PropertyKind::List);

        let s = doc.get_string("c", "s", "x");
        assert_eq!(s.kind(), PropertyKind::String);
        assert_eq!(s.as_str(), Some("[]"));
        assert_eq!(doc.get_string("c", "t", "x").as_str(), Some("[\"a\",\"b\"]"));

        let l = doc.get_list("c", "l", &[]);
        assert_eq!(l.kind(), PropertyKind::List);
        assert_eq!(l.as_list(), vec!["plain"]);
    }

    #[test]
    fn test_line_breaks_are_cleaned_from_names() {
        let mut doc = doc();
        doc.get_string("motd", "two\nlines", "x");
        doc.get_int("a\nb", "k", 1);
        assert!(doc.has_category("a b"));
        assert!(doc.has_category("a\nb"));
        assert_eq!(doc.has_key("motd", "two lines"), Ok(true));
        assert_eq!(doc.has_key("motd", "two\nlines"), Ok(true));
    }

    #[test]
    fn test_has_key_requires_category() {
        let mut doc = doc();
        doc.get_bool("general", "enabled", true);
        assert_eq!(doc.has_key("general", "enabled"), Ok(true));
        assert_eq!(doc.has_key("general", "other"), Ok(false));
        assert_eq!(
            doc.has_key("nowhere", "enabled"),
            Err(Error::UnknownCategory("nowhere".into()))
        );
    }

    #[test]
    fn test_comments_need_existing_targets() {
        let mut doc = doc();
        assert!(!doc.add_comment("general", "x"));
        doc.get_int("general", "port", 1);
        assert!(doc.add_comment("general", "main"));
        assert!(doc.add_property_comment("general", "port", "listen port"));
        assert!(!doc.add_property_comment("general", "nope", "x"));

        assert_eq!(doc.category("general").unwrap().comment(), Some("main"));
        assert_eq!(
            doc.property("general", "port").unwrap().unwrap().comment(),
            Some("listen port")
        );
    }

    #[test]
    fn test_child_names_are_validated() {
        let mut doc = doc();
        assert!(doc.insert_child("", Document::new(DocumentOptions::default())).is_err());
        assert!(doc.insert_child("a\"b", Document::new(DocumentOptions::default())).is_err());
        assert!(doc
            .insert_child("alpha", Document::new(DocumentOptions::default()))
            .unwrap()
            .is_none());
        assert!(doc.child("alpha").is_some());
    }

    #[test]
    fn test_detached_load_and_save_are_noops() {
        let mut doc = doc();
        doc.get_int("general", "n", 1);
        assert!(doc.try_load().is_ok());
        assert!(doc.try_save().is_ok());
        assert!(doc.has_category("general"));
        assert_eq!(doc.path(), None);
    }

    #[test]
    fn test_bom_only_when_read() {
        let mut doc = doc();
        doc.get_int("a", "k", 1);
        let at = chrono::NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert!(!doc.to_bytes(at).starts_with(&[0xEF, 0xBB, 0xBF]));

        doc.set_encoding(Encoding::Utf16Le, true);
        let bytes = doc.to_bytes(at);
        assert!(bytes.starts_with(&[0xFF, 0xFE, b'#', 0]));
    }
}
