//! Utility Module
//!
//! - [`Clock`]: monotonic frame clock (clock-delta model)
//! - [`FallbackLook`]: drag-to-look control for the non-immersive fallback

pub mod fallback_look;
pub mod time;

pub use fallback_look::FallbackLook;
pub use time::Clock;
