//! # Eden Core
//!
//! Foundational types shared by the Eden engine crates.
//!
//! - **Math**: glam re-exports, axis-aligned boxes, rays and interpolation helpers
//! - **Time**: fixed-step simulation timing for host game loops

pub mod math;
pub mod time;

pub use math::{Aabb, Ray};
pub use time::{FixedTimeStep, SimulationClock};
