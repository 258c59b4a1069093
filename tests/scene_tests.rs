//! Scene Graph Integration Tests
//!
//! Tests for:
//! - Hierarchy: add/attach/detach/remove, cycle rejection
//! - Liveness: is_parented, is_shown, live_objects
//! - Queries: find_by_name, descendants, world_matrix
//! - Prefab instantiation

use glam::{Quat, Vec3};
use parallax::assets::{Prefab, PrefabNode};
use parallax::scene::{BoundingBox, Node, NodeFlags, Scene};

// ============================================================================
// Hierarchy
// ============================================================================

#[test]
fn add_node_is_live() {
    let mut scene = Scene::new();
    let handle = scene.add_node(Node::new("a"));
    assert!(scene.root_nodes().contains(&handle));
    assert!(scene.is_parented(handle));
    assert!(scene.is_shown(handle));
}

#[test]
fn created_node_is_detached() {
    let mut scene = Scene::new();
    let handle = scene.create_node(Node::new("loose"));
    assert!(scene.get_node(handle).is_some());
    assert!(!scene.is_parented(handle));
    assert!(scene.live_objects().is_empty());
}

#[test]
fn detach_keeps_subtree_stored() {
    let mut scene = Scene::new();
    let parent = scene.add_node(Node::new("parent"));
    let child = scene.add_to_parent(Node::new("child"), parent);

    scene.detach(parent);

    assert!(!scene.is_parented(parent));
    assert!(!scene.is_parented(child));
    assert_eq!(scene.get_node(child).unwrap().parent(), Some(parent));

    scene.add_to_root(parent);
    assert!(scene.is_parented(child));
}

#[test]
fn reattach_moves_child() {
    let mut scene = Scene::new();
    let a = scene.add_node(Node::new("a"));
    let b = scene.add_node(Node::new("b"));
    let c = scene.add_to_parent(Node::new("c"), a);

    scene.attach(c, b);

    assert!(scene.get_node(a).unwrap().children().is_empty());
    assert_eq!(scene.get_node(b).unwrap().children(), &[c]);
    assert_eq!(scene.get_node(c).unwrap().parent(), Some(b));
}

#[test]
fn attach_to_self_is_ignored() {
    let mut scene = Scene::new();
    let a = scene.add_node(Node::new("a"));
    scene.attach(a, a);
    assert!(scene.root_nodes().contains(&a));
    assert_eq!(scene.get_node(a).unwrap().parent(), None);
}

#[test]
fn remove_node_is_recursive() {
    let mut scene = Scene::new();
    let parent = scene.add_node(Node::new("parent"));
    let child = scene.add_to_parent(Node::new("child"), parent);
    let grandchild = scene.add_to_parent(Node::new("grandchild"), child);

    scene.remove_node(parent);

    assert!(scene.get_node(parent).is_none());
    assert!(scene.get_node(child).is_none());
    assert!(scene.get_node(grandchild).is_none());
    assert!(scene.is_empty());
}

// ============================================================================
// Visibility & Queries
// ============================================================================

#[test]
fn hidden_ancestor_hides_descendants() {
    let mut scene = Scene::new();
    let parent = scene.add_node(Node::new("parent"));
    let child = scene.add_to_parent(Node::new("child"), parent);

    scene.set_visible(parent, false);

    assert!(scene.is_parented(child));
    assert!(!scene.is_shown(child));
}

#[test]
fn find_by_name_prefers_live_nodes() {
    let mut scene = Scene::new();
    let _detached = scene.create_node(Node::new("button"));
    let live = scene.add_node(Node::new("button"));
    assert_eq!(scene.find_by_name("button"), Some(live));
    assert_eq!(scene.find_by_name("missing"), None);
}

#[test]
fn descendants_lists_parents_first() {
    let mut scene = Scene::new();
    let root = scene.add_node(Node::new("root"));
    let a = scene.add_to_parent(Node::new("a"), root);
    let b = scene.add_to_parent(Node::new("b"), a);

    assert_eq!(scene.descendants(root), vec![root, a, b]);
}

#[test]
fn world_matrix_tracks_parent_changes_immediately() {
    let mut scene = Scene::new();
    let parent = scene.add_node(Node::new("parent"));
    let mut child_node = Node::new("child");
    child_node.transform.position = Vec3::new(0.0, 0.0, -1.0);
    let child = scene.add_to_parent(child_node, parent);

    let node = scene.get_node_mut(parent).unwrap();
    node.transform.position = Vec3::new(2.0, 0.0, 0.0);
    node.transform.rotation = Quat::from_rotation_y(std::f32::consts::FRAC_PI_2);

    // Child sits 1 m along the parent's −Z, which now points to world −X.
    let world = scene.world_matrix(child);
    assert!(Vec3::from(world.translation).abs_diff_eq(Vec3::new(1.0, 0.0, 0.0), 1e-5));
}

#[test]
fn persistent_flag_is_reported() {
    let mut scene = Scene::new();
    let light = scene.add_node(Node::new("light").with_flags(NodeFlags::PERSISTENT | NodeFlags::LIGHT));
    let model = scene.add_node(Node::new("model"));
    assert!(scene.get_node(light).unwrap().is_persistent());
    assert!(!scene.get_node(model).unwrap().is_persistent());
}

// ============================================================================
// Prefab
// ============================================================================

#[test]
fn instantiate_builds_detached_hierarchy() {
    let mut prefab = Prefab::new();
    let body = prefab.push(PrefabNode::new("body").with_bounds(BoundingBox::from_size(Vec3::ONE)), None);
    prefab.push(PrefabNode::new("head"), Some(body));

    let mut scene = Scene::new();
    let root = scene.instantiate("wendy", &prefab);

    assert_eq!(scene.get_node(root).unwrap().name, "wendy");
    assert!(!scene.is_parented(root));

    let names: Vec<String> = scene
        .descendants(root)
        .into_iter()
        .map(|h| scene.get_node(h).unwrap().name.clone())
        .collect();
    assert_eq!(names, vec!["wendy", "body", "head"]);
}

#[test]
fn instantiate_skips_bad_indices() {
    let mut prefab = Prefab::new();
    prefab.nodes.push(PrefabNode::new("only"));
    prefab.roots = vec![0, 7];
    prefab.nodes[0].children.push(0);

    let mut scene = Scene::new();
    let root = scene.instantiate("broken", &prefab);
    assert_eq!(scene.descendants(root).len(), 2);
}
