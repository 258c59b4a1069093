//! Placement Integration Tests
//!
//! Tests for:
//! - Viewer-relative resolution: named angles, heading tracking, height
//! - Idempotence for a fixed pose
//! - Face-viewer orientation
//! - `place` side effects

use std::f32::consts::FRAC_PI_2;

use glam::{Quat, Vec3};
use parallax::scene::placement::{place, resolve, scale_model};
use parallax::scene::{Node, PlacementSpec, Scene, StoryAngle, ViewerPose};

fn eye() -> ViewerPose {
    ViewerPose::new(Vec3::new(0.0, 1.6, 0.0), Quat::IDENTITY)
}

// ============================================================================
// Resolution
// ============================================================================

#[test]
fn front_is_straight_ahead() {
    let spec = PlacementSpec::new(1.5, StoryAngle::FRONT, -0.5);
    let pose = resolve(&eye(), &spec);
    assert!(pose.position.abs_diff_eq(Vec3::new(0.0, 1.1, -1.5), 1e-5));
}

#[test]
fn behind_is_opposite_of_forward() {
    let spec = PlacementSpec::new(4.0, StoryAngle::BEHIND, 0.0);
    let pose = resolve(&eye(), &spec);
    assert!(pose.position.abs_diff_eq(Vec3::new(0.0, 1.6, 4.0), 1e-5));
}

#[test]
fn positive_angles_turn_left() {
    let left = resolve(&eye(), &PlacementSpec::new(2.0, StoryAngle::LEFT, 0.0));
    let right = resolve(&eye(), &PlacementSpec::new(2.0, StoryAngle::RIGHT, 0.0));
    assert!(left.position.abs_diff_eq(Vec3::new(-2.0, 1.6, 0.0), 1e-5));
    assert!(right.position.abs_diff_eq(Vec3::new(2.0, 1.6, 0.0), 1e-5));
}

#[test]
fn placement_follows_current_heading() {
    // Viewer turned to face −X, standing away from the origin.
    let viewer = ViewerPose::new(Vec3::new(3.0, 1.6, 1.0), Quat::from_rotation_y(FRAC_PI_2));
    let pose = resolve(&viewer, &PlacementSpec::new(2.0, StoryAngle::FRONT, 0.0));
    assert!(pose.position.abs_diff_eq(Vec3::new(1.0, 1.6, 1.0), 1e-5));
}

#[test]
fn resolved_distance_is_horizontal() {
    let viewer = ViewerPose::new(Vec3::new(0.5, 1.6, -2.0), Quat::from_rotation_y(0.7));
    let spec = PlacementSpec::new(2.5, StoryAngle::FRONT_RIGHT, 0.2);
    let pose = resolve(&viewer, &spec);
    let flat = (pose.position - viewer.position) * Vec3::new(1.0, 0.0, 1.0);
    assert!((flat.length() - 2.5).abs() < 1e-5);
    assert!((pose.position.y - 1.8).abs() < 1e-5);
}

// ============================================================================
// Idempotence
// ============================================================================

#[test]
fn placing_twice_gives_same_pose() {
    let viewer = ViewerPose::new(Vec3::new(0.2, 1.5, 0.3), Quat::from_rotation_y(-1.1));
    let spec = PlacementSpec::new(3.0, StoryAngle::BACK_LEFT, 0.4);

    let mut scene = Scene::new();
    let object = scene.add_node(Node::new("doc"));

    let first = place(&mut scene, object, &viewer, &spec).unwrap();
    let after_first = scene.get_node(object).unwrap().transform;
    let second = place(&mut scene, object, &viewer, &spec).unwrap();
    let after_second = scene.get_node(object).unwrap().transform;

    assert!(first.position.abs_diff_eq(second.position, 1e-6));
    assert!(after_first.position.abs_diff_eq(after_second.position, 1e-6));
    assert!(after_first.rotation.abs_diff_eq(after_second.rotation, 1e-6));
}

#[test]
fn moving_viewer_moves_placement() {
    let spec = PlacementSpec::new(1.5, StoryAngle::FRONT, 0.0);
    let a = resolve(&eye(), &spec);
    let b = resolve(&ViewerPose::new(Vec3::new(1.0, 1.6, 0.0), Quat::IDENTITY), &spec);
    assert!((b.position - a.position).abs_diff_eq(Vec3::X, 1e-5));
}

// ============================================================================
// Orientation
// ============================================================================

#[test]
fn face_viewer_points_local_z_at_viewer() {
    let viewer = ViewerPose::new(Vec3::new(0.0, 1.6, 0.0), Quat::from_rotation_y(0.4));
    let spec = PlacementSpec::new(2.0, StoryAngle::FRONT_LEFT, -0.5);
    let pose = resolve(&viewer, &spec);

    let rotation = pose.rotation.expect("face_viewer is on");
    let toward_viewer = (viewer.position - pose.position).normalize();
    assert!((rotation * Vec3::Z).abs_diff_eq(toward_viewer, 1e-5));
    assert!((rotation * Vec3::X).y.abs() < 1e-5);
}

#[test]
fn face_viewer_off_keeps_rotation() {
    let mut scene = Scene::new();
    let mut node = Node::new("word");
    node.transform.rotation = Quat::from_rotation_x(0.3);
    let object = scene.add_node(node);

    let spec = PlacementSpec::new(3.5, StoryAngle::LEFT, 1.0).facing(false);
    let resolved = place(&mut scene, object, &eye(), &spec).unwrap();

    assert!(resolved.rotation.is_none());
    let rotation = scene.get_node(object).unwrap().transform.rotation;
    assert!(rotation.abs_diff_eq(Quat::from_rotation_x(0.3), 1e-6));
}

// ============================================================================
// Side effects
// ============================================================================

#[test]
fn place_only_writes_the_transform() {
    let mut scene = Scene::new();
    let object = scene.create_node(Node::new("loose"));
    place(&mut scene, object, &eye(), &PlacementSpec::new(1.0, 0.0, 0.0)).unwrap();
    assert!(!scene.is_parented(object));
    assert!(scene.get_node(object).unwrap().visible);
}

#[test]
fn place_on_missing_node_returns_none() {
    let mut scene = Scene::new();
    let object = scene.add_node(Node::new("gone"));
    scene.remove_node(object);
    assert!(place(&mut scene, object, &eye(), &PlacementSpec::new(1.0, 0.0, 0.0)).is_none());
}

#[test]
fn scale_model_is_uniform() {
    let mut scene = Scene::new();
    let object = scene.add_node(Node::new("quit"));
    scale_model(&mut scene, object, 0.3);
    assert!(scene.get_node(object).unwrap().transform.scale.abs_diff_eq(Vec3::splat(0.3), 1e-6));
}
