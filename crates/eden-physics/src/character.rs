//! Per-character state and the movement step that advances it.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::ground::{GroundState, classify_ground};
use crate::movement::{MoveInput, compose_velocity, integrate};
use crate::resolve::{Contact, resolve_collisions};
use crate::world::CollisionWorld;

/// Tunables shared by every step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterSettings {
    /// Downward acceleration, world units per second squared.
    pub gravity: f32,
    /// Steepest walkable slope in degrees.
    pub max_slope_angle: f32,
}

impl Default for CharacterSettings {
    fn default() -> Self {
        Self {
            gravity: 20.0,
            max_slope_angle: 50.0,
        }
    }
}

/// Mutable character record, updated once per tick.
#[derive(Debug, Clone, PartialEq)]
pub struct CharacterState {
    /// Capsule center.
    pub position: Vec3,
    pub velocity: Vec3,
    /// Full standing height.
    pub height: f32,
    pub radius: f32,
    pub ground: GroundState,
    /// Corrections applied during the last step.
    pub contacts: SmallVec<[Contact; 4]>,
}

impl CharacterState {
    pub fn new(position: Vec3, height: f32, radius: f32) -> Self {
        Self {
            position,
            velocity: Vec3::ZERO,
            height,
            radius,
            ground: GroundState::AIRBORNE,
            contacts: SmallVec::new(),
        }
    }

    pub fn feet(&self) -> f32 {
        self.position.y - self.height * 0.5
    }

    /// Re-classify the ground at the current position.
    pub fn refresh_ground(&mut self, world: &CollisionWorld, settings: &CharacterSettings) {
        self.ground = classify_ground(world, self.position, self.height, settings.max_slope_angle);
    }

    /// Advance one tick and return the new position.
    ///
    /// Classify ground, compose velocity, integrate, resolve collisions,
    /// then classify again so the next tick starts from the post-move state.
    pub fn step(
        &mut self,
        world: &CollisionWorld,
        settings: &CharacterSettings,
        input: &MoveInput,
        dt: f32,
    ) -> Vec3 {
        self.refresh_ground(world, settings);

        let composed = compose_velocity(self.velocity, &self.ground, input, settings.gravity, dt);
        let tentative = integrate(self.position, composed.velocity, dt);

        let resolution = resolve_collisions(world, tentative, composed.velocity, self.height, self.radius);
        self.position = resolution.position;
        self.velocity = resolution.velocity;
        self.contacts = resolution.contacts;

        // Stair stepping is not performed; `input.max_stair_height` is ignored.

        self.refresh_ground(world, settings);
        log::trace!(
            "step: pos={} vel={} ground={:?} jumped={}",
            self.position,
            self.velocity,
            self.ground.kind,
            composed.jumped
        );
        self.position
    }
}

impl Default for CharacterState {
    fn default() -> Self {
        Self::new(Vec3::ZERO, 0.9, 0.15)
    }
}
