//! Document root.

use wt_dom::NodeId;

use super::{NodeHandler, Resume};
use crate::SerializeError;
use crate::context::GenerationContext;

/// Document root: children only.
pub struct BodyHandler;

impl NodeHandler for BodyHandler {
    fn handle(
        &self,
        node: NodeId,
        ctx: &mut GenerationContext<'_>,
        _wrapper_unmodified: bool,
    ) -> Result<Resume, SerializeError> {
        ctx.serialize_children(node, None)?;
        Ok(Resume::Next)
    }
}
