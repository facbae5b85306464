//! # Eden Physics
//!
//! Collision world and kinematic character controller for the Eden engine.
//!
//! ## Features
//! - Static geometry: boxes, convex hulls (as bounds), triangle meshes, heightfields
//! - Kinematic platforms that carry standing characters
//! - Segment raycasts against every primitive kind
//! - Ground classification with slope limits
//! - Backend-neutral [`CharacterController`] trait
//! - JSON scene descriptions
//!
//! Each [`HomebrewCharacter`] owns its [`CollisionWorld`] exclusively and is
//! driven from a single thread, one fixed tick at a time.

use thiserror::Error;

pub mod backend;
pub mod character;
pub mod controller;
pub mod ground;
pub mod homebrew;
pub mod movement;
pub mod raycast;
pub mod resolve;
pub mod scene;
pub mod shapes;
pub mod world;

pub use backend::{create_controller, create_initialized};
pub use character::{CharacterSettings, CharacterState};
pub use controller::{CharacterController, PhysicsBackend};
pub use ground::{GroundKind, GroundState};
pub use homebrew::HomebrewCharacter;
pub use movement::MoveInput;
pub use raycast::RaycastResult;
pub use resolve::{Contact, ContactSource};
pub use scene::{SceneDesc, SceneError};
pub use shapes::PlatformId;
pub use world::{CollisionWorld, HeightQuery};

/// Physics errors
#[derive(Error, Debug)]
pub enum PhysicsError {
    #[error("Physics backend not available: {0}")]
    BackendUnavailable(PhysicsBackend),

    #[error("Unknown physics backend: {0}")]
    UnknownBackend(String),

    #[error("Physics backend failed to initialize: {0}")]
    InitializationFailed(PhysicsBackend),
}

/// Result type for physics operations
pub type PhysicsResult<T> = Result<T, PhysicsError>;
