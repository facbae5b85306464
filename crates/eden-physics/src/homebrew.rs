//! In-house [`CharacterController`] built on [`CollisionWorld`].
//!
//! Single-threaded: geometry may only change between ticks, and each
//! instance owns its world exclusively.

use glam::{Mat4, Quat, Vec3};

use crate::character::{CharacterSettings, CharacterState};
use crate::controller::{CharacterController, PhysicsBackend};
use crate::movement::MoveInput;
use crate::raycast::RaycastResult;
use crate::resolve::Contact;
use crate::shapes::PlatformId;
use crate::world::{CollisionWorld, HeightQuery};

/// Character controller without an external physics library.
///
/// Every call made before [`initialize`](CharacterController::initialize)
/// is a no-op.
#[derive(Debug, Default)]
pub struct HomebrewCharacter {
    world: CollisionWorld,
    state: CharacterState,
    settings: CharacterSettings,
    initialized: bool,
}

impl HomebrewCharacter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: CharacterSettings) -> Self {
        let mut character = Self::default();
        character.settings = settings;
        character
    }

    /// Terrain source used when no heightfield is registered.
    pub fn set_height_query(&mut self, query: HeightQuery) {
        self.world.set_height_query(query);
    }

    pub fn clear_height_query(&mut self) {
        self.world.clear_height_query();
    }

    pub fn world(&self) -> &CollisionWorld {
        &self.world
    }

    pub fn state(&self) -> &CharacterState {
        &self.state
    }

    pub fn settings(&self) -> &CharacterSettings {
        &self.settings
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Positional corrections applied during the last update.
    pub fn last_contacts(&self) -> &[Contact] {
        &self.state.contacts
    }

    /// Re-run ground classification without moving.
    pub fn check_ground_state(&mut self) {
        if self.initialized {
            self.state.refresh_ground(&self.world, &self.settings);
        }
    }

    /// Advance one tick with a prepared [`MoveInput`].
    pub fn step(&mut self, dt: f32, input: &MoveInput) -> Vec3 {
        if !self.initialized {
            return self.state.position;
        }
        self.state.step(&self.world, &self.settings, input, dt)
    }
}

impl CharacterController for HomebrewCharacter {
    fn initialize(&mut self) -> bool {
        if !self.initialized {
            self.initialized = true;
            log::info!("homebrew physics initialized");
        }
        true
    }

    fn shutdown(&mut self) {
        if !self.initialized {
            return;
        }
        self.world.clear();
        self.initialized = false;
        log::info!("homebrew physics shut down");
    }

    fn add_static_mesh(&mut self, vertices: &[Vec3], indices: &[u32], transform: Mat4) {
        if self.initialized {
            self.world.add_static_mesh(vertices, indices, transform);
        }
    }

    fn add_static_box(&mut self, half_extents: Vec3, position: Vec3, rotation: Quat) {
        if self.initialized {
            self.world.add_static_box(half_extents, position, rotation);
        }
    }

    fn add_convex_hull(&mut self, points: &[Vec3], position: Vec3, rotation: Quat) {
        if self.initialized {
            self.world.add_convex_hull(points, position, rotation);
        }
    }

    fn add_terrain_heightfield(&mut self, heights: &[f32], sample_count: usize, offset: Vec3, scale: Vec3) {
        if self.initialized {
            self.world.add_terrain_heightfield(heights, sample_count, offset, scale);
        }
    }

    fn add_kinematic_platform(&mut self, half_extents: Vec3, position: Vec3, rotation: Quat) -> PlatformId {
        if !self.initialized {
            return PlatformId::INVALID;
        }
        self.world.add_kinematic_platform(half_extents, position, rotation)
    }

    fn update_platform_transform(
        &mut self,
        id: PlatformId,
        position: Vec3,
        rotation: Quat,
        velocity: Vec3,
        dt: f32,
    ) {
        if self.initialized {
            self.world.update_platform_transform(id, position, rotation, velocity, dt);
        }
    }

    fn clear_bodies(&mut self) {
        self.world.clear();
    }

    fn create_character(&mut self, position: Vec3, height: f32, radius: f32) {
        if !self.initialized {
            return;
        }
        self.state = CharacterState::new(position, height, radius);
        log::info!(
            "created character at {} (height {}, radius {})",
            position,
            height,
            radius
        );
    }

    fn update(&mut self, dt: f32, desired_velocity: Vec3, jump: bool, jump_velocity: f32) -> Vec3 {
        self.extended_update(dt, desired_velocity, jump, jump_velocity, 0.0)
    }

    fn extended_update(
        &mut self,
        dt: f32,
        desired_velocity: Vec3,
        jump: bool,
        jump_velocity: f32,
        max_stair_height: f32,
    ) -> Vec3 {
        let input = MoveInput {
            desired_velocity,
            jump,
            jump_velocity,
            max_stair_height,
        };
        self.step(dt, &input)
    }

    fn position(&self) -> Vec3 {
        self.state.position
    }

    fn linear_velocity(&self) -> Vec3 {
        self.state.velocity
    }

    fn is_on_ground(&self) -> bool {
        self.state.ground.on_ground()
    }

    fn is_on_steep_ground(&self) -> bool {
        self.state.ground.on_steep_ground()
    }

    fn ground_normal(&self) -> Vec3 {
        self.state.ground.normal
    }

    fn ground_velocity(&self) -> Vec3 {
        self.state.ground.velocity
    }

    fn set_position(&mut self, position: Vec3) {
        self.state.position = position;
    }

    fn set_linear_velocity(&mut self, velocity: Vec3) {
        self.state.velocity = velocity;
    }

    fn set_gravity(&mut self, gravity: f32) {
        self.settings.gravity = gravity;
    }

    fn set_max_slope_angle(&mut self, degrees: f32) {
        self.settings.max_slope_angle = degrees;
    }

    fn raycast(&self, from: Vec3, to: Vec3) -> RaycastResult {
        if !self.initialized {
            return RaycastResult::miss();
        }
        self.world.raycast(from, to)
    }

    fn backend(&self) -> PhysicsBackend {
        PhysicsBackend::Homebrew
    }
}

impl Drop for HomebrewCharacter {
    fn drop(&mut self) {
        self.shutdown();
    }
}
