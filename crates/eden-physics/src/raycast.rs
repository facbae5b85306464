//! Raycast queries against the collision world.
//!
//! Every primitive kind is tested in a fixed order (static boxes, kinematic
//! boxes, heightfields, triangles) and the closest hit with a strictly
//! positive distance wins. Equal distances keep the earlier primitive.

use eden_core::math::{Aabb, Ray};
use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::shapes::{Heightfield, Triangle};
use crate::world::CollisionWorld;

/// Directions with a smaller component than this are treated as parallel to that slab.
pub const SLAB_PARALLEL_EPSILON: f32 = 0.0001;
/// Möller–Trumbore determinant and distance epsilon.
pub const TRIANGLE_EPSILON: f32 = 0.000_000_1;
/// Distance between heightfield samples along the ray.
pub const HEIGHTFIELD_STEP: f32 = 0.05;
/// Bisection rounds once the ray has crossed the terrain.
pub const HEIGHTFIELD_REFINE_STEPS: u32 = 5;
/// Upper bound on samples taken by a single terrain march.
pub const MAX_MARCH_STEPS: u64 = 1 << 20;

/// Result of a raycast.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RaycastResult {
    pub hit: bool,
    pub point: Vec3,
    pub normal: Vec3,
    pub distance: f32,
}

impl RaycastResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            point: Vec3::ZERO,
            normal: Vec3::Y,
            distance: 0.0,
        }
    }
}

impl Default for RaycastResult {
    fn default() -> Self {
        Self::miss()
    }
}

/// Slab test. Returns the entry distance and the normal of the entered face.
///
/// Rays starting inside the box have no entry face and report distance 0
/// with a zero normal.
pub fn ray_aabb(ray: &Ray, max_distance: f32, aabb: &Aabb) -> Option<(f32, Vec3)> {
    let mut t_min = 0.0_f32;
    let mut t_max = max_distance;
    let mut normal = Vec3::ZERO;

    for axis in 0..3 {
        let origin = ray.origin[axis];
        let dir = ray.direction[axis];
        let (lo, hi) = (aabb.min[axis], aabb.max[axis]);

        if dir.abs() < SLAB_PARALLEL_EPSILON {
            if origin < lo || origin > hi {
                return None;
            }
            continue;
        }

        let inv = 1.0 / dir;
        let mut t1 = (lo - origin) * inv;
        let mut t2 = (hi - origin) * inv;
        // Entering through the min face means travelling along +axis.
        let mut face = Vec3::ZERO;
        face[axis] = -dir.signum();
        if t1 > t2 {
            std::mem::swap(&mut t1, &mut t2);
        }

        if t1 > t_min {
            t_min = t1;
            normal = face;
        }
        t_max = t_max.min(t2);
        if t_min > t_max {
            return None;
        }
    }

    Some((t_min, normal))
}

/// Möller–Trumbore. Returns the distance along the ray when it crosses the
/// triangle in front of the origin; both windings are hit.
pub fn ray_triangle(ray: &Ray, triangle: &Triangle) -> Option<f32> {
    let edge1 = triangle.v1 - triangle.v0;
    let edge2 = triangle.v2 - triangle.v0;
    let h = ray.direction.cross(edge2);
    let a = edge1.dot(h);
    if a.abs() < TRIANGLE_EPSILON {
        return None;
    }

    let f = 1.0 / a;
    let s = ray.origin - triangle.v0;
    let u = f * s.dot(h);
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(edge1);
    let v = f * ray.direction.dot(q);
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = f * edge2.dot(q);
    (t > TRIANGLE_EPSILON).then_some(t)
}

/// March a ray over a terrain height function.
///
/// Samples every [`HEIGHTFIELD_STEP`] until the ray is at or below the
/// terrain, then bisects the last interval. Returns the refined distance.
pub fn march_terrain(ray: &Ray, max_distance: f32, height: impl Fn(f32, f32) -> f32) -> Option<f32> {
    march_span(ray, 0.0, max_distance, height)
}

/// [`march_terrain`] restricted to distances in `[start, end]`.
///
/// The end of the span is always sampled. At most [`MAX_MARCH_STEPS`]
/// samples are taken, so unbounded spans terminate.
pub fn march_span(ray: &Ray, start: f32, end: f32, height: impl Fn(f32, f32) -> f32) -> Option<f32> {
    if !(start <= end) {
        return None;
    }
    let below = |t: f32| {
        let p = ray.at(t);
        p.y <= height(p.x, p.z)
    };

    let mut previous = start;
    let mut step: u64 = 0;
    loop {
        let t = (start + step as f32 * HEIGHTFIELD_STEP).min(end);
        if below(t) {
            let mut t_low = previous;
            let mut t_high = t;
            for _ in 0..HEIGHTFIELD_REFINE_STEPS {
                let mid = (t_low + t_high) * 0.5;
                if below(mid) {
                    t_high = mid;
                } else {
                    t_low = mid;
                }
            }
            return Some(t_high);
        }
        if t >= end || step >= MAX_MARCH_STEPS {
            return None;
        }
        previous = t;
        step += 1;
    }
}

/// Raycast a single heightfield, returning distance and surface normal.
///
/// Queries outside the grid clamp to its border, so along the ray the
/// surface is flat before the ray first enters the footprint's slab on a
/// horizontal axis it moves along and after it has left all of them. Only
/// the part in between, and within the field's height range, is marched.
pub fn ray_heightfield(ray: &Ray, max_distance: f32, field: &Heightfield) -> Option<(f32, Vec3)> {
    let (low, high) = field.height_range();
    let (start, end) = vertical_span(ray, max_distance, low, high)?;
    let (near, far) = footprint_span(ray, field);

    let t = flat_crossing(ray, start, near.min(end), field)
        .or_else(|| march_span(ray, start.max(near), far.min(end), |x, z| field.height_at(x, z)))
        .or_else(|| flat_crossing(ray, start.max(far), end, field))?;
    let p = ray.at(t);
    Some((t, field.normal_at(p.x, p.z)))
}

/// Distances between which the ray can meet terrain spanning `[low, high]`.
fn vertical_span(ray: &Ray, max_distance: f32, low: f32, high: f32) -> Option<(f32, f32)> {
    let (oy, dy) = (ray.origin.y, ray.direction.y);
    let start = if oy <= high {
        0.0
    } else if dy < 0.0 {
        (high - oy) / dy
    } else {
        return None;
    };
    // One step past `low` the ray is under the terrain everywhere.
    let end = if dy < 0.0 {
        ((low - oy) / dy + HEIGHTFIELD_STEP).max(start).min(max_distance)
    } else {
        max_distance
    };
    (start <= end).then_some((start, end))
}

/// Distances at which the ray first enters and finally leaves the
/// footprint's slabs along the horizontal axes it moves on.
fn footprint_span(ray: &Ray, field: &Heightfield) -> (f32, f32) {
    let (min, max) = field.footprint();
    let axes = [
        (ray.origin.x, ray.direction.x, min.x, max.x),
        (ray.origin.z, ray.direction.z, min.y, max.y),
    ];

    let mut near = f32::INFINITY;
    let mut far = 0.0_f32;
    for (origin, dir, lo, hi) in axes {
        if dir == 0.0 {
            continue;
        }
        let (enter, exit) = if dir > 0.0 { (lo, hi) } else { (hi, lo) };
        near = near.min(((enter - origin) / dir).max(0.0));
        far = far.max((exit - origin) / dir);
    }
    if near.is_infinite() {
        // Vertical ray: the surface under it never changes.
        return (0.0, 0.0);
    }
    (near, far.max(near))
}

/// First crossing in `[from, to]`, where the surface height along the ray is constant.
fn flat_crossing(ray: &Ray, from: f32, to: f32, field: &Heightfield) -> Option<f32> {
    if !(from <= to) {
        return None;
    }
    let p = ray.at(from);
    let h = field.height_at(p.x, p.z);
    if p.y <= h {
        return Some(from);
    }
    if ray.direction.y >= 0.0 {
        return None;
    }
    let t = from + (h - p.y) / ray.direction.y;
    (t <= to).then_some(t)
}

/// Closest-hit bookkeeping shared by the per-primitive loops.
struct ClosestHit {
    distance: f32,
    normal: Vec3,
    hit: bool,
}

impl ClosestHit {
    fn offer(&mut self, distance: f32, normal: Vec3) {
        if distance > 0.0 && distance < self.distance {
            self.distance = distance;
            self.normal = normal;
            self.hit = true;
        }
    }
}

impl CollisionWorld {
    /// Closest hit along the segment `from -> to`.
    ///
    /// Degenerate segments and empty worlds report a miss. When no
    /// heightfield is registered the height query, if any, stands in for the
    /// terrain with an up normal.
    pub fn raycast(&self, from: Vec3, to: Vec3) -> RaycastResult {
        let Some((ray, length)) = Ray::from_segment(from, to) else {
            return RaycastResult::miss();
        };

        let mut closest = ClosestHit {
            distance: length,
            normal: Vec3::Y,
            hit: false,
        };

        for aabb in self.static_boxes() {
            if let Some((t, n)) = ray_aabb(&ray, closest.distance, aabb) {
                closest.offer(t, n);
            }
        }

        for platform in self.kinematic_platforms() {
            if let Some((t, n)) = ray_aabb(&ray, closest.distance, &platform.bounds) {
                closest.offer(t, n);
            }
        }

        if self.heightfields().is_empty() {
            if let Some(query) = self.height_query() {
                if let Some(t) = march_terrain(&ray, closest.distance, query) {
                    closest.offer(t, Vec3::Y);
                }
            }
        } else {
            for field in self.heightfields() {
                if let Some((t, n)) = ray_heightfield(&ray, closest.distance, field) {
                    closest.offer(t, n);
                }
            }
        }

        for triangle in self.triangles() {
            if let Some(t) = ray_triangle(&ray, triangle) {
                closest.offer(t, triangle.normal);
            }
        }

        if !closest.hit {
            return RaycastResult::miss();
        }
        RaycastResult {
            hit: true,
            point: ray.at(closest.distance),
            normal: closest.normal,
            distance: closest.distance,
        }
    }
}
