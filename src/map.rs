//! Ordered map type for category properties.
//!
//! [`PropertyMap`] is a thin wrapper around [`IndexMap`] keyed by property name.
//! Properties are written back in the order they were first created or parsed,
//! so a file that is loaded and saved again keeps its property layout.
//!
//! ## Examples
//!
//! ```rust
//! use cfgtree::{Property, PropertyKind, PropertyMap};
//!
//! let mut map = PropertyMap::new();
//! map.insert(Property::new("port", 25565, PropertyKind::Integer));
//! map.insert(Property::new("motd", "hi", PropertyKind::String));
//!
//! let keys: Vec<_> = map.keys().cloned().collect();
//! assert_eq!(keys, vec!["port", "motd"]);
//! ```

use crate::Property;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// An insertion-ordered map of property name to [`Property`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyMap(IndexMap<String, Property>);

impl PropertyMap {
    /// Creates an empty `PropertyMap`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cfgtree::PropertyMap;
    ///
    /// let map = PropertyMap::new();
    /// assert!(map.is_empty());
    /// ```
    #[must_use]
    pub fn new() -> Self {
        PropertyMap(IndexMap::new())
    }

    /// Inserts a property under its own name.
    ///
    /// If the map already held a property with that name it is replaced in
    /// place (keeping its position) and the old one is returned.
    pub fn insert(&mut self, property: Property) -> Option<Property> {
        self.0.insert(property.name().to_string(), property)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Property> {
        self.0.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Property> {
        self.0.get_mut(name)
    }

    /// Returns the property called `name`, inserting the one built by `make` if it is missing.
    pub fn get_or_insert_with(
        &mut self,
        name: &str,
        make: impl FnOnce() -> Property,
    ) -> &mut Property {
        self.0.entry(name.to_string()).or_insert_with(make)
    }

    #[must_use]
    pub fn contains_key(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Removes a property, shifting the ones after it up to keep their order.
    pub fn remove(&mut self, name: &str) -> Option<Property> {
        self.0.shift_remove(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns an iterator over the property names, in insertion order.
    pub fn keys(&self) -> indexmap::map::Keys<'_, String, Property> {
        self.0.keys()
    }

    /// Returns an iterator over the properties, in insertion order.
    pub fn values(&self) -> indexmap::map::Values<'_, String, Property> {
        self.0.values()
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Property> {
        self.0.iter()
    }
}

impl IntoIterator for PropertyMap {
    type Item = (String, Property);
    type IntoIter = indexmap::map::IntoIter<String, Property>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl FromIterator<Property> for PropertyMap {
    fn from_iter<T: IntoIterator<Item = Property>>(iter: T) -> Self {
        PropertyMap(
            iter.into_iter()
                .map(|p| (p.name().to_string(), p))
                .collect(),
        )
    }
}
