//! Node variants stored in a [`Document`](crate::Document).

use std::fmt;

use crate::meta::NodeMeta;

/// Index of a node inside its document arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub(crate) fn from_index(index: usize) -> Self {
        Self(index)
    }

    /// Position in the arena.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One unit of the document tree.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Element with tag name, attributes and metadata.
    Element(Element),
    /// Character data.
    Text(String),
    /// Comment (`<!-- ... -->`).
    Comment(String),
}

impl NodeKind {
    /// Element payload, if this is an element.
    #[must_use]
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Self::Element(element) => Some(element),
            _ => None,
        }
    }

    /// Text content, if this is a text node.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// Element node payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// Lower-case tag name.
    pub name: String,
    /// Attributes (unique names).
    pub attrs: Attributes,
    /// Provenance metadata.
    pub meta: NodeMeta,
}

impl Element {
    /// Create an element with no attributes and empty metadata.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into().to_ascii_lowercase(),
            attrs: Attributes::default(),
            meta: NodeMeta::default(),
        }
    }

    /// Set an attribute.
    #[must_use]
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.set(name, value);
        self
    }

    /// Set metadata.
    #[must_use]
    pub fn with_meta(mut self, meta: NodeMeta) -> Self {
        self.meta = meta;
        self
    }

    /// Get an attribute value.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name)
    }
}

/// Element attributes.
///
/// Names are unique. Iteration follows insertion order, but equality ignores it.
#[derive(Debug, Clone, Default)]
pub struct Attributes(Vec<(String, String)>);

impl Attributes {
    /// Get an attribute value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Set an attribute, replacing any existing value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        if let Some(slot) = self.0.iter_mut().find(|(key, _)| *key == name) {
            slot.1 = value;
        } else {
            self.0.push((name, value));
        }
    }

    /// Remove an attribute, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        let pos = self.0.iter().position(|(key, _)| key == name)?;
        Some(self.0.remove(pos).1)
    }

    /// Iterate over `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Pairs sorted by name.
    #[must_use]
    pub fn sorted(&self) -> Vec<(&str, &str)> {
        let mut pairs: Vec<_> = self.iter().collect();
        pairs.sort_unstable();
        pairs
    }

    /// Number of attributes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no attributes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl PartialEq for Attributes {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.sorted() == other.sorted()
    }
}

impl Eq for Attributes {}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut attrs = Self::default();
        for (name, value) in iter {
            attrs.set(name, value);
        }
        attrs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_replaces_existing() {
        let mut attrs = Attributes::default();
        attrs.set("class", "a");
        attrs.set("id", "x");
        attrs.set("class", "b");
        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs.get("class"), Some("b"));
    }

    #[test]
    fn test_equality_ignores_order() {
        let a: Attributes = [("class", "a"), ("id", "x")].into_iter().collect();
        let b: Attributes = [("id", "x"), ("class", "a")].into_iter().collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_remove() {
        let mut attrs: Attributes = [("style", "color:red")].into_iter().collect();
        assert_eq!(attrs.remove("style").as_deref(), Some("color:red"));
        assert!(attrs.is_empty());
        assert_eq!(attrs.remove("style"), None);
    }

    #[test]
    fn test_element_name_is_lowercased() {
        let element = Element::new("TD").with_attr("colspan", "2");
        assert_eq!(element.name, "td");
        assert_eq!(element.attr("colspan"), Some("2"));
    }
}
