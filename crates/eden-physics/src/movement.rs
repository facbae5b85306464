//! Velocity composition and position integration.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::ground::GroundState;

/// Per-tick movement request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoveInput {
    /// Desired velocity; only X and Z are used.
    pub desired_velocity: Vec3,
    pub jump: bool,
    pub jump_velocity: f32,
    /// Reserved for stair stepping, which is not performed.
    pub max_stair_height: f32,
}

impl MoveInput {
    pub fn walk(desired_velocity: Vec3) -> Self {
        Self {
            desired_velocity,
            ..Self::default()
        }
    }

    pub fn with_jump(mut self, jump: bool) -> Self {
        self.jump = jump;
        self
    }
}

impl Default for MoveInput {
    fn default() -> Self {
        Self {
            desired_velocity: Vec3::ZERO,
            jump: false,
            jump_velocity: crate::controller::DEFAULT_JUMP_VELOCITY,
            max_stair_height: 0.0,
        }
    }
}

/// Outcome of [`compose_velocity`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComposedVelocity {
    pub velocity: Vec3,
    /// A jump was started this tick.
    pub jumped: bool,
}

/// Build this tick's velocity from the previous one, the ground state and input.
///
/// - On any ground, steep included, the velocity is replaced by the ground's
///   velocity and a requested jump overrides the vertical component.
/// - Airborne, gravity is integrated into the previous velocity.
///
/// Horizontal input is then added on top of the ground's horizontal velocity.
pub fn compose_velocity(
    previous: Vec3,
    ground: &GroundState,
    input: &MoveInput,
    gravity: f32,
    dt: f32,
) -> ComposedVelocity {
    let mut velocity;
    let mut jumped = false;

    if ground.on_ground() {
        velocity = ground.velocity;
        if input.jump {
            velocity.y = input.jump_velocity;
            jumped = true;
        }
    } else {
        velocity = previous;
        velocity.y -= gravity * dt;
    }

    velocity.x = input.desired_velocity.x + ground.velocity.x;
    velocity.z = input.desired_velocity.z + ground.velocity.z;

    ComposedVelocity { velocity, jumped }
}

/// Explicit Euler step.
pub fn integrate(position: Vec3, velocity: Vec3, dt: f32) -> Vec3 {
    position + velocity * dt
}
