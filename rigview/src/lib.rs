//! Core of the rigview viewer.
//!
//! Turns joint parameters into per-part world and normal matrices through an
//! arena of pivoted rigid nodes, and simulates the tank's shells. Everything
//! here runs on the frame thread: input mutates a scene, the scene is ticked
//! once per frame and then asked for its [`FrameParts`](scene::FrameParts).
//!
//! The two rigs shipped with the viewer:
//! - [`tank::TankRig`]: body, turret and barrel rotating around fixed pivots.
//! - [`hand::HandRig`]: a palm with a thumb and four three-segment fingers,
//!   each joint attached at the tip of the previous segment.

pub mod camera;
pub mod hand;
pub mod hierarchy;
pub mod projectile;
pub mod scene;
pub mod tank;

pub use rigview_types as types;
