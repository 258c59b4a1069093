//! Interaction
//!
//! Hit-test dispatch for pointer and XR controller input.

pub mod controller;
pub mod pointer;
pub mod ray;
pub mod registry;

pub use controller::{ControllerRay, IndicatorState, RayIndicator};
pub use pointer::PointerGesture;
pub use ray::{RayHit, raycast};
pub use registry::{
    Dispatched, InteractionCallback, InteractionHandle, InteractionRegistry, RegistrationId, RegistrationState,
};
