use glam::Affine3A;
use slotmap::SlotMap;

use crate::assets::prefab::Prefab;
use crate::scene::NodeHandle;
use crate::scene::node::Node;

/// Scene graph storage.
///
/// Nodes live in a slotmap so handles stay valid while other nodes come and
/// go. A node is *live* when it is reachable from [`Scene::root_nodes`];
/// detached nodes keep their data and can be re-attached later, which is how
/// loaded models move in and out of scenes without being reloaded.
#[derive(Debug, Default)]
pub struct Scene {
    nodes: SlotMap<NodeHandle, Node>,
    root_nodes: Vec<NodeHandle>,
}

impl Scene {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Construction
    // ========================================================================

    /// Stores a node without attaching it anywhere.
    pub fn create_node(&mut self, node: Node) -> NodeHandle {
        self.nodes.insert(node)
    }

    /// Stores a node as a new root.
    pub fn add_node(&mut self, node: Node) -> NodeHandle {
        let handle = self.nodes.insert(node);
        self.root_nodes.push(handle);
        handle
    }

    pub fn add_to_parent(&mut self, child: Node, parent: NodeHandle) -> NodeHandle {
        let handle = self.nodes.insert(child);
        self.attach(handle, parent);
        handle
    }

    /// Spawns a detached copy of `prefab` under a new group node named `name`.
    ///
    /// Child indices that are out of range or already visited are skipped, so
    /// a malformed prefab yields a partial hierarchy rather than a loop.
    pub fn instantiate(&mut self, name: &str, prefab: &Prefab) -> NodeHandle {
        let root = self.create_node(Node::new(name));
        let mut spawned: Vec<Option<NodeHandle>> = vec![None; prefab.nodes.len()];
        let mut stack: Vec<(usize, NodeHandle)> = prefab.roots.iter().rev().map(|&i| (i, root)).collect();

        while let Some((index, parent)) = stack.pop() {
            let Some(source) = prefab.nodes.get(index) else {
                log::warn!("Prefab '{name}' references missing node {index}");
                continue;
            };
            if spawned[index].is_some() {
                log::warn!("Prefab '{name}' visits node {index} twice, skipping");
                continue;
            }

            let mut node = Node::new(&source.name);
            node.transform = source.transform;
            node.bounds = source.bounds;
            let handle = self.create_node(node);
            self.attach(handle, parent);
            spawned[index] = Some(handle);

            stack.extend(source.children.iter().rev().map(|&c| (c, handle)));
        }

        root
    }

    // ========================================================================
    // Hierarchy
    // ========================================================================

    /// Makes `handle` a root, detaching it from any parent first.
    pub fn add_to_root(&mut self, handle: NodeHandle) {
        if !self.nodes.contains_key(handle) {
            log::warn!("add_to_root: unknown node");
            return;
        }
        self.detach(handle);
        self.root_nodes.push(handle);
    }

    /// Parents `child` under `parent`, detaching it from wherever it was.
    pub fn attach(&mut self, child: NodeHandle, parent: NodeHandle) {
        if child == parent {
            log::warn!("Cannot attach node to itself!");
            return;
        }
        if !self.nodes.contains_key(child) || !self.nodes.contains_key(parent) {
            log::warn!("attach: unknown node");
            return;
        }
        if self.ancestors(parent).any(|a| a == child) {
            log::warn!("Cannot attach node beneath its own descendant!");
            return;
        }

        self.detach(child);

        if let Some(p) = self.nodes.get_mut(parent) {
            p.children.push(child);
        }
        if let Some(c) = self.nodes.get_mut(child) {
            c.parent = Some(parent);
        }
    }

    /// Unlinks `handle` from its parent (or the root list). The node and its
    /// subtree stay stored.
    pub fn detach(&mut self, handle: NodeHandle) {
        let parent = self.nodes.get(handle).and_then(Node::parent);
        if let Some(p) = parent {
            if let Some(n) = self.nodes.get_mut(p)
                && let Some(i) = n.children.iter().position(|&x| x == handle)
            {
                n.children.remove(i);
            }
            if let Some(n) = self.nodes.get_mut(handle) {
                n.parent = None;
            }
        } else if let Some(i) = self.root_nodes.iter().position(|&x| x == handle) {
            self.root_nodes.remove(i);
        }
    }

    /// Removes a node and its whole subtree from storage.
    pub fn remove_node(&mut self, handle: NodeHandle) {
        if !self.nodes.contains_key(handle) {
            return;
        }
        self.detach(handle);
        for node in self.descendants(handle) {
            self.nodes.remove(node);
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn get_node(&self, handle: NodeHandle) -> Option<&Node> {
        self.nodes.get(handle)
    }

    #[inline]
    #[must_use]
    pub fn get_node_mut(&mut self, handle: NodeHandle) -> Option<&mut Node> {
        self.nodes.get_mut(handle)
    }

    #[inline]
    #[must_use]
    pub fn root_nodes(&self) -> &[NodeHandle] {
        &self.root_nodes
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// First stored node with the given name, preferring live ones.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<NodeHandle> {
        let mut detached = None;
        for (handle, node) in &self.nodes {
            if node.name == name {
                if self.is_parented(handle) {
                    return Some(handle);
                }
                detached.get_or_insert(handle);
            }
        }
        detached
    }

    /// `handle` followed by its parent chain up to the topmost ancestor.
    pub fn ancestors(&self, handle: NodeHandle) -> impl Iterator<Item = NodeHandle> + '_ {
        std::iter::successors(self.nodes.contains_key(handle).then_some(handle), |&h| {
            self.nodes.get(h).and_then(Node::parent)
        })
    }

    /// True when `handle` is reachable from a root node.
    #[must_use]
    pub fn is_parented(&self, handle: NodeHandle) -> bool {
        self.ancestors(handle)
            .last()
            .is_some_and(|top| self.root_nodes.contains(&top))
    }

    /// True when the node is live and neither it nor any ancestor is hidden.
    #[must_use]
    pub fn is_shown(&self, handle: NodeHandle) -> bool {
        self.is_parented(handle)
            && self
                .ancestors(handle)
                .all(|h| self.nodes.get(h).is_some_and(|n| n.visible))
    }

    /// World matrix composed through the ancestor chain at call time.
    #[must_use]
    pub fn world_matrix(&self, handle: NodeHandle) -> Affine3A {
        let chain: Vec<NodeHandle> = self.ancestors(handle).collect();
        chain
            .iter()
            .rev()
            .filter_map(|&h| self.nodes.get(h))
            .fold(Affine3A::IDENTITY, |world, node| world * node.transform.local_matrix())
    }

    /// `handle` and every node beneath it, depth-first, parents first.
    #[must_use]
    pub fn descendants(&self, handle: NodeHandle) -> Vec<NodeHandle> {
        let mut out = Vec::new();
        if !self.nodes.contains_key(handle) {
            return out;
        }
        let mut stack = vec![handle];
        while let Some(h) = stack.pop() {
            out.push(h);
            if let Some(node) = self.nodes.get(h) {
                stack.extend(node.children.iter().rev());
            }
        }
        out
    }

    /// Top-level objects currently in the scene.
    #[must_use]
    pub fn live_objects(&self) -> Vec<NodeHandle> {
        self.root_nodes.clone()
    }

    pub fn set_visible(&mut self, handle: NodeHandle, visible: bool) {
        if let Some(node) = self.nodes.get_mut(handle) {
            node.visible = visible;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn attach_rejects_cycles() {
        let mut scene = Scene::new();
        let a = scene.add_node(Node::new("a"));
        let b = scene.add_to_parent(Node::new("b"), a);
        scene.attach(a, b);
        assert_eq!(scene.get_node(b).unwrap().parent(), Some(a));
        assert_eq!(scene.get_node(a).unwrap().parent(), None);
    }

    #[test]
    fn world_matrix_composes_parents() {
        let mut scene = Scene::new();
        let mut parent = Node::new("parent");
        parent.transform.position = Vec3::new(1.0, 0.0, 0.0);
        let p = scene.add_node(parent);
        let mut child = Node::new("child");
        child.transform.position = Vec3::new(0.0, 2.0, 0.0);
        let c = scene.add_to_parent(child, p);

        let world = scene.world_matrix(c);
        assert!(Vec3::from(world.translation).abs_diff_eq(Vec3::new(1.0, 2.0, 0.0), 1e-6));
    }
}
