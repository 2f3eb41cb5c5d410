//! Error types for serialization.

use wt_dom::NodeId;

use crate::LossyNote;

/// Error raised during a generation pass.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum SerializeError {
    /// A node's shape contradicts what its handler requires.
    #[error("structural violation at <{kind}> {node}: {reason}")]
    StructuralViolation {
        /// Offending node.
        node: NodeId,
        /// Element kind.
        kind: String,
        /// What was wrong.
        reason: String,
    },

    /// No handler is registered for the element and no fallback applies.
    #[error("no handler for <{kind}> {node}")]
    UnknownElementKind {
        /// Offending node.
        node: NodeId,
        /// Element kind.
        kind: String,
    },

    /// The scoped context stack was left unbalanced.
    #[error("context stack imbalance: expected depth {expected}, found {actual}")]
    ContextStackImbalance {
        /// Depth before the call.
        expected: usize,
        /// Depth after the call.
        actual: usize,
    },

    /// A chosen separator violates its merged range.
    #[error(
        "separator with {newlines} newlines violates range {min}..={}",
        .max.map_or_else(|| "inf".to_owned(), |max| max.to_string())
    )]
    SeparatorRangeUnsatisfiable {
        /// Merged minimum.
        min: u32,
        /// Merged maximum (`None` = unbounded).
        max: Option<u32>,
        /// Newlines in the rejected separator.
        newlines: usize,
    },
}

impl SerializeError {
    /// Build a structural violation.
    pub(crate) fn structural(node: NodeId, kind: &str, reason: impl Into<String>) -> Self {
        Self::StructuralViolation {
            node,
            kind: kind.to_owned(),
            reason: reason.into(),
        }
    }

    /// Node the error is about, for errors that can fall back to source.
    #[must_use]
    pub fn node(&self) -> Option<NodeId> {
        match self {
            Self::StructuralViolation { node, .. } | Self::UnknownElementKind { node, .. } => {
                Some(*node)
            }
            Self::ContextStackImbalance { .. } | Self::SeparatorRangeUnsatisfiable { .. } => None,
        }
    }
}

/// A failed pass: the error plus every note recorded before it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{error}")]
pub struct SerializeFailure {
    /// What went wrong.
    #[source]
    pub error: SerializeError,
    /// Lossy-fallback notes accumulated so far.
    pub notes: Vec<LossyNote>,
}
