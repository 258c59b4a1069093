use bitflags::bitflags;

use crate::scene::NodeHandle;
use crate::scene::bounds::BoundingBox;
use crate::scene::transform::Transform;

bitflags! {
    /// Roles a node plays outside the narrative content.
    ///
    /// Any node carrying [`NodeFlags::PERSISTENT`] belongs to the clear
    /// exclusion set and survives every scene transition.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct NodeFlags: u32 {
        const PERSISTENT = 1 << 0;
        const LIGHT      = 1 << 1;
        const CAMERA     = 1 << 2;
        const CONTROLLER = 1 << 3;
        const RAY        = 1 << 4;
        const UI         = 1 << 5;
    }
}

/// A scene node: hierarchy, transform, visibility and an optional pick volume.
#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,

    pub(crate) parent: Option<NodeHandle>,
    pub(crate) children: Vec<NodeHandle>,

    pub transform: Transform,
    pub visible: bool,
    pub flags: NodeFlags,

    /// Local-space volume used by ray hit tests. Nodes without one are
    /// transparent to rays but their descendants are still tested.
    pub bounds: Option<BoundingBox>,
}

impl Node {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            parent: None,
            children: Vec::new(),
            transform: Transform::new(),
            visible: true,
            flags: NodeFlags::empty(),
            bounds: None,
        }
    }

    #[must_use]
    pub fn with_bounds(mut self, bounds: BoundingBox) -> Self {
        self.bounds = Some(bounds);
        self
    }

    #[must_use]
    pub fn with_flags(mut self, flags: NodeFlags) -> Self {
        self.flags |= flags;
        self
    }

    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<NodeHandle> {
        self.parent
    }

    #[inline]
    #[must_use]
    pub fn children(&self) -> &[NodeHandle] {
        &self.children
    }

    #[inline]
    #[must_use]
    pub fn is_persistent(&self) -> bool {
        self.flags.contains(NodeFlags::PERSISTENT)
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::new("")
    }
}
