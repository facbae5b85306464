//! Backend-neutral character controller contract.
//!
//! Gameplay code talks to a `dyn CharacterController` and never to a concrete
//! backend, so the in-house solver and a library-backed one can be swapped
//! without touching callers.

use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::raycast::RaycastResult;
use crate::shapes::PlatformId;

pub const DEFAULT_HEIGHT: f32 = 1.8;
pub const DEFAULT_RADIUS: f32 = 0.3;
pub const DEFAULT_JUMP_VELOCITY: f32 = 8.0;
pub const DEFAULT_MAX_STAIR_HEIGHT: f32 = 0.4;

/// Physics backend implementations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhysicsBackend {
    /// Wrapper around the Jolt physics library.
    Jolt,
    /// In-house collision and movement.
    #[default]
    Homebrew,
}

impl std::fmt::Display for PhysicsBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Jolt => f.write_str("jolt"),
            Self::Homebrew => f.write_str("homebrew"),
        }
    }
}

impl std::str::FromStr for PhysicsBackend {
    type Err = crate::PhysicsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "jolt" => Ok(Self::Jolt),
            "homebrew" => Ok(Self::Homebrew),
            other => Err(crate::PhysicsError::UnknownBackend(other.to_string())),
        }
    }
}

/// A single character moving through static and kinematic geometry.
///
/// Rotations are part of the contract; backends that only support
/// axis-aligned geometry ignore them. None of these calls fail: bad input is
/// dropped or answered with a sentinel ([`PlatformId::INVALID`], a missed
/// [`RaycastResult`]).
pub trait CharacterController {
    /// Bring the backend up. Returns `true` when ready, including when already initialized.
    fn initialize(&mut self) -> bool;
    /// Release everything; geometry is cleared.
    fn shutdown(&mut self);

    /// Add a triangle mesh, baked through `transform`.
    fn add_static_mesh(&mut self, vertices: &[Vec3], indices: &[u32], transform: Mat4);
    fn add_static_box(&mut self, half_extents: Vec3, position: Vec3, rotation: Quat);
    /// Add a convex hull; `points` are relative to `position`.
    fn add_convex_hull(&mut self, points: &[Vec3], position: Vec3, rotation: Quat);
    /// Add a `sample_count × sample_count` row-major heightfield.
    fn add_terrain_heightfield(&mut self, heights: &[f32], sample_count: usize, offset: Vec3, scale: Vec3);

    /// Add a moving platform and return the id used to drive it.
    fn add_kinematic_platform(&mut self, half_extents: Vec3, position: Vec3, rotation: Quat) -> PlatformId;
    /// Move a platform. `velocity` is authoritative and is not derived from position changes.
    fn update_platform_transform(
        &mut self,
        id: PlatformId,
        position: Vec3,
        rotation: Quat,
        velocity: Vec3,
        dt: f32,
    );
    /// Remove all geometry (level unload).
    fn clear_bodies(&mut self);

    fn create_character(&mut self, position: Vec3, height: f32, radius: f32);

    /// Advance the character one tick and return its new position.
    fn update(&mut self, dt: f32, desired_velocity: Vec3, jump: bool, jump_velocity: f32) -> Vec3;
    /// As [`update`](Self::update) with a stair-step allowance.
    fn extended_update(
        &mut self,
        dt: f32,
        desired_velocity: Vec3,
        jump: bool,
        jump_velocity: f32,
        max_stair_height: f32,
    ) -> Vec3;

    fn position(&self) -> Vec3;
    fn linear_velocity(&self) -> Vec3;
    fn is_on_ground(&self) -> bool;
    fn is_on_steep_ground(&self) -> bool;
    fn ground_normal(&self) -> Vec3;
    fn ground_velocity(&self) -> Vec3;

    fn set_position(&mut self, position: Vec3);
    fn set_linear_velocity(&mut self, velocity: Vec3);
    fn set_gravity(&mut self, gravity: f32);
    fn set_max_slope_angle(&mut self, degrees: f32);

    /// Closest hit along the segment `from -> to`.
    fn raycast(&self, from: Vec3, to: Vec3) -> RaycastResult;

    fn backend(&self) -> PhysicsBackend;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_parse() {
        assert_eq!("homebrew".parse::<PhysicsBackend>().unwrap(), PhysicsBackend::Homebrew);
        assert_eq!("JOLT".parse::<PhysicsBackend>().unwrap(), PhysicsBackend::Jolt);
        assert!("bullet".parse::<PhysicsBackend>().is_err());
    }

    #[test]
    fn test_backend_display_roundtrip() {
        for backend in [PhysicsBackend::Jolt, PhysicsBackend::Homebrew] {
            assert_eq!(backend.to_string().parse::<PhysicsBackend>().unwrap(), backend);
        }
    }
}
