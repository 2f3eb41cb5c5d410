//! Shape fingerprints for change detection.
//!
//! A shape summarizes an element as two SHA-256 digests: one over the wrapper
//! (tag name and attribute set) and one over the whole subtree. Comparing the
//! fingerprints recorded at build time against freshly computed ones tells the
//! serializer which parts of the tree were edited.
//!
//! # Hash Format
//!
//! - wrapper: `sha256("{name}\0" + "{key}={value}\0"...)` with attributes sorted by name
//! - subtree: `sha256(wrapper + one token per child)` where a token is
//!   `e{subtree}`, `t{len}:{text}` or `c{len}:{comment}`

use sha2::{Digest, Sha256};

use crate::document::Document;
use crate::meta::Shape;
use crate::node::{Element, NodeId, NodeKind};

/// Current shapes of every element reachable from the root.
#[derive(Debug, Clone, Default)]
pub struct ShapeIndex {
    shapes: Vec<Option<Shape>>,
}

impl ShapeIndex {
    /// Compute shapes for all attached elements in one bottom-up pass.
    #[must_use]
    pub fn compute(doc: &Document) -> Self {
        let mut shapes = vec![None; doc.len()];

        // Post-order walk without recursion so deep trees cannot overflow.
        let mut stack = vec![(doc.root(), false)];
        while let Some((id, expanded)) = stack.pop() {
            let NodeKind::Element(element) = doc.node(id) else {
                continue;
            };
            if expanded {
                shapes[id.index()] = Some(element_shape(doc, id, element, &shapes));
            } else {
                stack.push((id, true));
                for &child in doc.children(id).iter().rev() {
                    stack.push((child, false));
                }
            }
        }

        Self { shapes }
    }

    /// Shape of an element.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Shape> {
        self.shapes.get(id.index()).and_then(Option::as_ref)
    }
}

/// Fingerprint of an element's wrapper.
#[must_use]
pub fn wrapper_fingerprint(element: &Element) -> String {
    let mut hasher = Sha256::new();
    hasher.update(element.name.as_bytes());
    hasher.update([0]);
    for (key, value) in element.attrs.sorted() {
        hasher.update(key.as_bytes());
        hasher.update(b"=");
        hasher.update(value.as_bytes());
        hasher.update([0]);
    }
    hex::encode(hasher.finalize())
}

fn element_shape(doc: &Document, id: NodeId, element: &Element, done: &[Option<Shape>]) -> Shape {
    let wrapper = wrapper_fingerprint(element);
    let mut hasher = Sha256::new();
    hasher.update(wrapper.as_bytes());
    for &child in doc.children(id) {
        match doc.node(child) {
            NodeKind::Element(_) => {
                hasher.update(b"e");
                if let Some(shape) = &done[child.index()] {
                    hasher.update(shape.subtree.as_bytes());
                }
            }
            NodeKind::Text(text) => hash_token(&mut hasher, b't', text),
            NodeKind::Comment(text) => hash_token(&mut hasher, b'c', text),
        }
    }
    Shape {
        wrapper,
        subtree: hex::encode(hasher.finalize()),
    }
}

fn hash_token(hasher: &mut Sha256, tag: u8, content: &str) {
    hasher.update([tag]);
    hasher.update(content.len().to_string().as_bytes());
    hasher.update(b":");
    hasher.update(content.as_bytes());
}
