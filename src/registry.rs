//! Shared multi-document file.
//!
//! A [`Registry`] owns one root [`Document`] whose embedded documents are the
//! sections of other documents. Handles are cheap to clone and share the same
//! root; documents attached with [`Registry::attach`] read their categories
//! from it and write them back into it on save.
//!
//! ```rust,no_run
//! use cfgtree::{DocumentOptions, Registry};
//!
//! let registry = Registry::open("config/main.cfg", DocumentOptions::default())?;
//! let mut tools = registry.attach("config/tools.cfg", DocumentOptions::default());
//! tools.get_int("general", "limit", 10);
//! tools.save();
//! # Ok::<(), cfgtree::Error>(())
//! ```

use crate::category::CategoryTree;
use crate::{Document, DocumentOptions, Result};
use parking_lot::Mutex;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// A cloneable handle to a shared root document.
#[derive(Clone)]
pub struct Registry {
    root: Arc<Mutex<Document>>,
    base_dir: PathBuf,
}

impl Registry {
    /// Opens (or creates) the root file at `path`.
    ///
    /// Section names are computed relative to the directory holding `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the root file exists but does not parse.
    pub fn open(path: impl Into<PathBuf>, options: DocumentOptions) -> Result<Self> {
        let path = path.into();
        let base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Ok(Registry::from_document(Document::open(path, options)?, base_dir))
    }

    /// Wraps an already loaded root document.
    #[must_use]
    pub fn from_document(root: Document, base_dir: impl Into<PathBuf>) -> Self {
        Registry {
            root: Arc::new(Mutex::new(root)),
            base_dir: base_dir.into(),
        }
    }

    #[must_use]
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// The section name for a document stored at `path`: its path relative to
    /// the base directory, components joined with `/`.
    ///
    /// ```rust
    /// use cfgtree::{Document, DocumentOptions, Registry};
    ///
    /// let registry = Registry::from_document(Document::new(DocumentOptions::default()), "game");
    /// assert_eq!(registry.section_name("game/config/tools.cfg"), "config/tools.cfg");
    /// assert_eq!(registry.section_name("elsewhere.cfg"), "elsewhere.cfg");
    /// ```
    #[must_use]
    pub fn section_name(&self, path: impl AsRef<Path>) -> String {
        let path = path.as_ref();
        let relative = path.strip_prefix(&self.base_dir).unwrap_or(path);
        relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Creates a document stored as the section for `path` and loads it.
    pub fn attach(&self, path: impl AsRef<Path>, options: DocumentOptions) -> Document {
        let name = self.section_name(path);
        let categories = self.load_section(&name);
        let mut doc = Document::section(self.clone(), name, options);
        *doc.categories_mut() = categories;
        doc
    }

    /// Names of every section currently held by the root.
    #[must_use]
    pub fn sections(&self) -> Vec<String> {
        self.root.lock().children().keys().cloned().collect()
    }

    /// Runs `f` with the root document locked.
    ///
    /// Saving an attached document from inside `f` deadlocks.
    pub fn with_root<T>(&self, f: impl FnOnce(&mut Document) -> T) -> T {
        f(&mut self.root.lock())
    }

    /// Re-reads the root file.
    ///
    /// # Errors
    ///
    /// Returns an error if the root file does not parse.
    pub fn load(&self) -> Result<()> {
        self.root.lock().load()
    }

    /// Writes the root file. Failures are logged.
    pub fn save(&self) {
        self.root.lock().save();
    }

    /// Copies the categories stored for `name`, registering an empty section if needed.
    pub(crate) fn load_section(&self, name: &str) -> CategoryTree {
        self.root.lock().child_categories(name).clone()
    }

    /// Replaces the categories stored for `name` and writes the root file.
    pub(crate) fn store_section(&self, name: &str, categories: &CategoryTree) -> Result<()> {
        let mut root = self.root.lock();
        root.child_categories(name).clone_from(categories);
        debug!(section = name, "stored configuration section");
        root.try_save()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("base_dir", &self.base_dir)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detached() -> Registry {
        Registry::from_document(Document::new(DocumentOptions::default()), "base")
    }

    #[test]
    fn test_section_names_are_relative() {
        let registry = detached();
        assert_eq!(registry.section_name("base/a/b.cfg"), "a/b.cfg");
        assert_eq!(registry.section_name("other/c.cfg"), "other/c.cfg");
    }

    #[test]
    fn test_attach_registers_empty_section() {
        let registry = detached();
        let doc = registry.attach("base/tools.cfg", DocumentOptions::default());
        assert!(doc.is_section());
        assert!(doc.categories().is_empty());
        assert_eq!(registry.sections(), vec!["tools.cfg".to_string()]);
    }

    #[test]
    fn test_sections_share_the_root() {
        let registry = detached();
        let mut tools = registry.attach("base/tools.cfg", DocumentOptions::default());
        tools.get_int("general", "limit", 3);
        tools.save();

        let handle = registry.clone();
        let again = handle.attach("base/tools.cfg", DocumentOptions::default());
        assert_eq!(
            again.property("general", "limit").unwrap().map(|p| p.as_int(0)),
            Some(3)
        );

        let stored = registry.with_root(|root| root.child("tools.cfg").map(|c| c.categories().len()));
        assert_eq!(stored, Some(1));
    }
}
