//! Ground classification.
//!
//! Kinematic platforms are checked first by proximity and always count as
//! walkable. Otherwise a short ray is cast straight down from the capsule
//! center and the hit normal decides between walkable and steep ground.

use glam::Vec3;

use crate::shapes::PlatformId;
use crate::world::CollisionWorld;

/// Allowed distance between the feet and a platform's top face.
pub const PLATFORM_VERTICAL_TOLERANCE: f32 = 0.15;
/// Horizontal growth of a platform's footprint for the proximity test.
pub const PLATFORM_FOOTPRINT_MARGIN: f32 = 0.1;
/// Ray length past the feet.
pub const GROUND_PROBE_EXTRA: f32 = 0.1;
/// Hits closer than half-height plus this count as ground.
pub const GROUND_PROBE_MARGIN: f32 = 0.05;

/// What the character is standing on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroundKind {
    #[default]
    Airborne,
    /// Walkable static geometry.
    Static,
    /// A kinematic platform.
    Platform(PlatformId),
    /// Static geometry steeper than the slope limit.
    Steep,
}

/// Per-tick ground classification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundState {
    pub kind: GroundKind,
    /// Up when airborne or on a platform.
    pub normal: Vec3,
    /// Velocity inherited from the support, zero unless on a platform.
    pub velocity: Vec3,
}

impl GroundState {
    pub const AIRBORNE: Self = Self {
        kind: GroundKind::Airborne,
        normal: Vec3::Y,
        velocity: Vec3::ZERO,
    };

    /// In contact with ground of any steepness.
    pub fn on_ground(&self) -> bool {
        !matches!(self.kind, GroundKind::Airborne)
    }

    pub fn on_steep_ground(&self) -> bool {
        matches!(self.kind, GroundKind::Steep)
    }

    pub fn platform(&self) -> Option<PlatformId> {
        match self.kind {
            GroundKind::Platform(id) => Some(id),
            _ => None,
        }
    }
}

impl Default for GroundState {
    fn default() -> Self {
        Self::AIRBORNE
    }
}

/// Angle between `normal` and world up, in degrees.
pub fn slope_angle_degrees(normal: Vec3) -> f32 {
    normal.dot(Vec3::Y).clamp(-1.0, 1.0).acos().to_degrees()
}

/// Classify the ground under a capsule centered at `position`.
///
/// Pure with respect to the world: classifying twice without moving yields
/// the same state.
pub fn classify_ground(
    world: &CollisionWorld,
    position: Vec3,
    height: f32,
    max_slope_angle: f32,
) -> GroundState {
    let half_height = height * 0.5;
    let feet = position.y - half_height;

    for platform in world.kinematic_platforms() {
        let near_top = (feet - platform.top()).abs() <= PLATFORM_VERTICAL_TOLERANCE;
        if near_top && platform.footprint_contains(position.x, position.z, PLATFORM_FOOTPRINT_MARGIN) {
            return GroundState {
                kind: GroundKind::Platform(platform.id),
                normal: Vec3::Y,
                velocity: platform.velocity,
            };
        }
    }

    let probe_end = position - Vec3::Y * (half_height + GROUND_PROBE_EXTRA);
    let hit = world.raycast(position, probe_end);
    if !hit.hit || hit.distance >= half_height + GROUND_PROBE_MARGIN {
        return GroundState::AIRBORNE;
    }

    let kind = if slope_angle_degrees(hit.normal) > max_slope_angle {
        GroundKind::Steep
    } else {
        GroundKind::Static
    };
    GroundState {
        kind,
        normal: hit.normal,
        velocity: Vec3::ZERO,
    }
}
