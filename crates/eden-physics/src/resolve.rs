//! Collision response for the character capsule.
//!
//! The capsule is treated as a sphere of radius `radius + half_height`
//! around its center while separated from a box, and pushed out through the
//! face of least penetration once its center is inside. Boxes are resolved
//! one after another in registration order; each push also zeroes the
//! velocity along the axes it moved.

use eden_core::math::Aabb;
use glam::Vec3;
use smallvec::SmallVec;

use crate::shapes::PlatformId;
use crate::world::CollisionWorld;

/// Push components below this are ignored when zeroing velocity.
pub const CONTACT_THRESHOLD: f32 = 0.001;
/// Smallest capsule half-height (cylinder part) used for collision.
pub const MIN_CAPSULE_HALF_HEIGHT: f32 = 0.01;
/// Squared distance below which the sphere test has no usable direction.
const MIN_SEPARATION_SQ: f32 = 0.0001;

/// What a contact was made with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactSource {
    StaticBox(usize),
    Platform(PlatformId),
    Terrain,
}

/// Positional correction applied during resolution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub source: ContactSource,
    pub push: Vec3,
}

/// Corrected position and velocity after resolving a move.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub position: Vec3,
    pub velocity: Vec3,
    pub contacts: SmallVec<[Contact; 4]>,
}

/// Half-height of the capsule's cylinder for a character of `height` and `radius`.
pub fn capsule_half_height(height: f32, radius: f32) -> f32 {
    ((height - 2.0 * radius) * 0.5).max(MIN_CAPSULE_HALF_HEIGHT)
}

/// Push-out vector that separates the capsule at `center` from `aabb`.
pub fn capsule_aabb_collision(center: Vec3, radius: f32, half_height: f32, aabb: &Aabb) -> Option<Vec3> {
    let closest = aabb.closest_point(center);
    let diff = center - closest;
    let dist_sq = diff.length_squared();
    let reach = radius + half_height;

    if dist_sq < reach * reach && dist_sq > MIN_SEPARATION_SQ {
        let dist = dist_sq.sqrt();
        return Some(diff / dist * (reach - dist));
    }

    if !aabb.contains_point(center) {
        return None;
    }

    // Center is inside: leave through the nearest face plus the radius.
    let to_min = center - aabb.min;
    let to_max = aabb.max - center;
    let exits = [
        (to_min.x, Vec3::new(-to_min.x - radius, 0.0, 0.0)),
        (to_max.x, Vec3::new(to_max.x + radius, 0.0, 0.0)),
        (to_min.y, Vec3::new(0.0, -to_min.y - radius, 0.0)),
        (to_max.y, Vec3::new(0.0, to_max.y + radius, 0.0)),
        (to_min.z, Vec3::new(0.0, 0.0, -to_min.z - radius)),
        (to_max.z, Vec3::new(0.0, 0.0, to_max.z + radius)),
    ];
    let mut best = exits[0];
    for exit in &exits[1..] {
        if exit.0 < best.0 {
            best = *exit;
        }
    }
    Some(best.1)
}

/// Zero velocity components along which `push` moved the character.
fn block_axes(velocity: &mut Vec3, push: Vec3) {
    for axis in 0..3 {
        if push[axis].abs() > CONTACT_THRESHOLD {
            velocity[axis] = 0.0;
        }
    }
}

/// Keep the feet above `terrain_y`; returns the push applied, if any.
fn clamp_to_terrain(position: &mut Vec3, velocity: &mut Vec3, half_height: f32, terrain_y: f32) -> Option<Vec3> {
    let feet = position.y - half_height;
    if feet >= terrain_y {
        return None;
    }
    let push = Vec3::new(0.0, terrain_y - feet, 0.0);
    position.y = terrain_y + half_height;
    if velocity.y < 0.0 {
        velocity.y = 0.0;
    }
    Some(push)
}

/// Resolve a tentative move against the world.
///
/// Order: static boxes, kinematic platforms, then heightfields (or the
/// height query when no heightfield is registered).
pub fn resolve_collisions(
    world: &CollisionWorld,
    position: Vec3,
    velocity: Vec3,
    height: f32,
    radius: f32,
) -> Resolution {
    let half_height = capsule_half_height(height, radius);
    let mut resolution = Resolution {
        position,
        velocity,
        contacts: SmallVec::new(),
    };

    for (index, aabb) in world.static_boxes().iter().enumerate() {
        if let Some(push) = capsule_aabb_collision(resolution.position, radius, half_height, aabb) {
            resolution.position += push;
            block_axes(&mut resolution.velocity, push);
            resolution.contacts.push(Contact {
                source: ContactSource::StaticBox(index),
                push,
            });
        }
    }

    for platform in world.kinematic_platforms() {
        if let Some(push) = capsule_aabb_collision(resolution.position, radius, half_height, &platform.bounds) {
            resolution.position += push;
            block_axes(&mut resolution.velocity, push);
            resolution.contacts.push(Contact {
                source: ContactSource::Platform(platform.id),
                push,
            });
        }
    }

    let feet_offset = height * 0.5;
    if world.heightfields().is_empty() {
        if let Some(query) = world.height_query() {
            let terrain_y = query(resolution.position.x, resolution.position.z);
            resolution.apply_terrain(feet_offset, terrain_y);
        }
    } else {
        for field in world.heightfields() {
            let terrain_y = field.height_at(resolution.position.x, resolution.position.z);
            resolution.apply_terrain(feet_offset, terrain_y);
        }
    }

    resolution
}

impl Resolution {
    fn apply_terrain(&mut self, feet_offset: f32, terrain_y: f32) {
        if let Some(push) = clamp_to_terrain(&mut self.position, &mut self.velocity, feet_offset, terrain_y) {
            self.contacts.push(Contact {
                source: ContactSource::Terrain,
                push,
            });
        }
    }
}
