//! Categories and the flat category tree.
//!
//! Categories are stored in one sorted map keyed by qualified name
//! (`parent.child.grandchild`). A category refers to its parent and children
//! by name only, so the tree holds no reference cycles and every lookup goes
//! through [`CategoryTree`].
//!
//! ```rust
//! use cfgtree::CategoryTree;
//!
//! let mut tree = CategoryTree::new();
//! tree.ensure(None, "server.network.limits");
//!
//! assert!(tree.contains("server"));
//! assert!(tree.contains("server.network"));
//! let limits = tree.get("server.network.limits").unwrap();
//! assert_eq!(limits.name(), "limits");
//! assert_eq!(limits.parent(), Some("server.network"));
//! ```

use crate::property::clean_name;
use crate::{Property, PropertyMap};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Separator between the levels of a qualified category name.
pub const SEPARATOR: char = '.';

/// Joins a parent's qualified name and a local name.
#[must_use]
pub fn qualify(parent: Option<&str>, local: &str) -> String {
    match parent {
        Some(parent) => format!("{parent}{SEPARATOR}{local}"),
        None => local.to_string(),
    }
}

/// A named scope holding properties and the names of its child categories.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    name: String,
    qualified_name: String,
    parent: Option<String>,
    children: Vec<String>,
    properties: PropertyMap,
    comment: Option<String>,
}

impl Category {
    fn new(name: &str, parent: Option<&str>) -> Self {
        Category {
            name: name.to_string(),
            qualified_name: qualify(parent, name),
            parent: parent.map(str::to_string),
            children: Vec::new(),
            properties: PropertyMap::new(),
            comment: None,
        }
    }

    /// Local name, i.e. the last level of the qualified name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    /// Qualified name of the parent category.
    #[must_use]
    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Local names of the direct children, in the order they were added.
    #[must_use]
    pub fn children(&self) -> &[String] {
        &self.children
    }

    /// Local names of the direct children, sorted lexicographically.
    #[must_use]
    pub fn sorted_children(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.children.iter().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    #[must_use]
    pub fn properties(&self) -> &PropertyMap {
        &self.properties
    }

    pub fn properties_mut(&mut self) -> &mut PropertyMap {
        &mut self.properties
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Property> {
        self.properties.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Property> {
        self.properties.get_mut(key)
    }

    #[must_use]
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn set_comment(&mut self, comment: impl Into<String>) {
        self.comment = Some(comment.into());
    }

    fn add_child(&mut self, local: &str) {
        if !self.children.iter().any(|c| c == local) {
            self.children.push(local.to_string());
        }
    }

    /// Compares two categories the way a save/load cycle preserves them:
    /// child order and comment line endings are not significant, and
    /// properties are compared by kind and written form.
    #[must_use]
    pub fn is_equivalent(&self, other: &Category) -> bool {
        self.name == other.name
            && self.qualified_name == other.qualified_name
            && self.parent == other.parent
            && self.sorted_children() == other.sorted_children()
            && comment_lines(self.comment()) == comment_lines(other.comment())
            && self.properties.len() == other.properties.len()
            && self
                .properties
                .values()
                .zip(other.properties.values())
                .all(|(a, b)| {
                    a.name() == b.name()
                        && a.kind() == b.kind()
                        && a.to_raw() == b.to_raw()
                        && comment_lines(a.comment()) == comment_lines(b.comment())
                })
    }
}

/// Splits a stored comment into the lines it is written as.
pub(crate) fn comment_lines(comment: Option<&str>) -> Option<Vec<&str>> {
    comment.map(|c| {
        c.split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line))
            .collect()
    })
}

/// Every category of a document, keyed and sorted by qualified name.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryTree(BTreeMap<String, Category>);

impl CategoryTree {
    #[must_use]
    pub fn new() -> Self {
        CategoryTree(BTreeMap::new())
    }

    #[must_use]
    pub fn get(&self, qualified: &str) -> Option<&Category> {
        self.0.get(qualified)
    }

    pub fn get_mut(&mut self, qualified: &str) -> Option<&mut Category> {
        self.0.get_mut(qualified)
    }

    #[must_use]
    pub fn contains(&self, qualified: &str) -> bool {
        self.0.contains_key(qualified)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// All categories in qualified-name order.
    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.0.values()
    }

    /// Top-level categories in name order.
    pub fn roots(&self) -> impl Iterator<Item = &Category> {
        self.0.values().filter(|c| c.is_root())
    }

    /// Direct children of `category`, sorted by local name.
    ///
    /// Names recorded on the parent without a matching entry are skipped.
    #[must_use]
    pub fn children_of(&self, category: &Category) -> Vec<&Category> {
        category
            .sorted_children()
            .into_iter()
            .filter_map(|local| self.0.get(&qualify(Some(category.qualified_name()), local)))
            .collect()
    }

    /// Creates every missing level of `path` below `base` and returns the innermost one.
    ///
    /// `path` is split on [`SEPARATOR`]; each level is linked to its parent
    /// exactly once, so calling this again with the same path is a no-op.
    /// Line breaks and `"` in a segment are replaced, as they cannot be written.
    pub fn ensure(&mut self, base: Option<&str>, path: &str) -> &mut Category {
        let mut parent: Option<String> = base.map(str::to_string);

        for segment in path.split(SEPARATOR) {
            let segment = clean_name(segment);
            let qualified = qualify(parent.as_deref(), &segment);
            if !self.0.contains_key(&qualified) {
                self.0
                    .insert(qualified.clone(), Category::new(&segment, parent.as_deref()));
            }
            if let Some(owner) = parent.as_deref().and_then(|p| self.0.get_mut(p)) {
                owner.add_child(&segment);
            }
            parent = Some(qualified);
        }

        // `split` always yields at least one segment, so `parent` names an entry.
        let innermost = parent.unwrap_or_default();
        self.0
            .entry(innermost.clone())
            .or_insert_with(|| Category::new(&innermost, None))
    }

    /// Rebuilds the tree with every name lower-cased.
    ///
    /// Categories that only differ in case are merged. The first one in
    /// qualified-name order keeps its comment and wins on duplicate keys.
    #[must_use]
    pub fn into_lowercase(self) -> CategoryTree {
        let mut folded = CategoryTree::new();
        for (qualified, category) in self.0 {
            let target = folded.ensure(None, &qualified.to_lowercase());
            if target.comment.is_none() {
                target.comment = category.comment;
            }
            for (key, property) in category.properties {
                if !target.properties.contains_key(&key) {
                    target.properties.insert(property);
                }
            }
        }
        folded
    }

    /// Compares two trees category by category, see [`Category::is_equivalent`].
    #[must_use]
    pub fn is_equivalent(&self, other: &CategoryTree) -> bool {
        self.0.len() == other.0.len()
            && self
                .0
                .iter()
                .zip(other.0.iter())
                .all(|((ka, a), (kb, b))| ka == kb && a.is_equivalent(b))
    }
}

impl<'a> IntoIterator for &'a CategoryTree {
    type Item = &'a Category;
    type IntoIter = std::collections::btree_map::Values<'a, String, Category>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.values()
    }
}
