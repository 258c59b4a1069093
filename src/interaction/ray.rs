use glam::Vec3;

use crate::scene::{NodeHandle, Ray, Scene};

/// A ray intersection with one node's pick volume.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// The node whose bounds were hit, possibly deep inside a model.
    pub node: NodeHandle,
    /// World-space distance from the ray origin.
    pub distance: f32,
    pub point: Vec3,
}

/// Intersects `ray` with every shown node beneath `roots` (inclusive).
///
/// Hidden subtrees are skipped. Hits are sorted nearest first; a node
/// reachable from two roots is reported once.
pub fn raycast(scene: &Scene, roots: impl IntoIterator<Item = NodeHandle>, ray: &Ray) -> Vec<RayHit> {
    let mut hits: Vec<RayHit> = Vec::new();
    let mut stack: Vec<NodeHandle> = Vec::new();

    for root in roots {
        if !scene.is_shown(root) {
            continue;
        }
        stack.push(root);
        while let Some(handle) = stack.pop() {
            let Some(node) = scene.get_node(handle) else {
                continue;
            };
            if !node.visible {
                continue;
            }
            if let Some(bounds) = &node.bounds
                && !hits.iter().any(|h| h.node == handle)
                && let Some((distance, point)) = ray.intersect_box(bounds, &scene.world_matrix(handle))
            {
                hits.push(RayHit {
                    node: handle,
                    distance,
                    point,
                });
            }
            stack.extend(node.children());
        }
    }

    hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    hits
}
