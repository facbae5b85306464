//! Math utilities
//!
//! Re-exports from glam plus the small set of geometric types the collision
//! code is built on.

pub use glam::{Mat3, Mat4, Quat, Vec2, Vec3, Vec4};

use serde::{Deserialize, Serialize};

/// Shortest ray segment that still has a usable direction.
pub const MIN_RAY_LENGTH: f32 = 0.0001;

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    /// Minimum corner
    pub min: Vec3,
    /// Maximum corner
    pub max: Vec3,
}

impl Aabb {
    /// Create an AABB from min and max corners
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create an AABB from center and half-extents
    pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    /// Smallest AABB enclosing every point, `None` for an empty slice
    pub fn from_points(points: &[Vec3]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut aabb = Self::new(*first, *first);
        for &p in rest {
            aabb.expand_to_include(p);
        }
        Some(aabb)
    }

    /// Get the center of the AABB
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get the half-extents of the AABB
    pub fn half_extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// True when any half-extent is non-positive or a corner is not finite.
    ///
    /// Flat boxes are degenerate too: they have no interior to push a
    /// character out of.
    pub fn is_degenerate(&self) -> bool {
        if !self.min.is_finite() || !self.max.is_finite() {
            return true;
        }
        self.half_extents().cmple(Vec3::ZERO).any()
    }

    /// Check if a point is inside the AABB (faces included)
    pub fn contains_point(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    /// Point of the box closest to `point`
    pub fn closest_point(&self, point: Vec3) -> Vec3 {
        point.clamp(self.min, self.max)
    }

    /// Expand the AABB to include a point
    pub fn expand_to_include(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    /// Same box moved by `offset`
    pub fn translated(&self, offset: Vec3) -> Aabb {
        Aabb {
            min: self.min + offset,
            max: self.max + offset,
        }
    }
}

/// Ray for raycasting
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Ray origin
    pub origin: Vec3,
    /// Ray direction (normalized)
    pub direction: Vec3,
}

impl Ray {
    /// Create a new ray; `direction` is normalized
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    /// Ray along the segment `from -> to` together with the segment length.
    ///
    /// Returns `None` for segments shorter than [`MIN_RAY_LENGTH`].
    pub fn from_segment(from: Vec3, to: Vec3) -> Option<(Ray, f32)> {
        let delta = to - from;
        let length = delta.length();
        if !(length >= MIN_RAY_LENGTH) {
            return None;
        }
        Some((
            Ray {
                origin: from,
                direction: delta / length,
            },
            length,
        ))
    }

    /// Get a point along the ray at distance t
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Linear interpolation
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Bilinear interpolation over a unit cell.
///
/// `h00`/`h10` are the samples on the first row, `h01`/`h11` on the second;
/// `fx` blends along the row and `fz` across rows.
pub fn bilinear(h00: f32, h10: f32, h01: f32, h11: f32, fx: f32, fz: f32) -> f32 {
    lerp(lerp(h00, h10, fx), lerp(h01, h11, fx), fz)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aabb_from_center() {
        let aabb = Aabb::from_center_half_extents(Vec3::new(1.0, 2.0, 3.0), Vec3::splat(0.5));
        assert_eq!(aabb.center(), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(aabb.half_extents(), Vec3::splat(0.5));
    }

    #[test]
    fn test_aabb_from_points() {
        let points = [
            Vec3::new(-1.0, 0.0, 2.0),
            Vec3::new(3.0, -2.0, 0.0),
            Vec3::new(0.0, 4.0, 1.0),
        ];
        let aabb = Aabb::from_points(&points).unwrap();
        assert_eq!(aabb.min, Vec3::new(-1.0, -2.0, 0.0));
        assert_eq!(aabb.max, Vec3::new(3.0, 4.0, 2.0));
        assert!(Aabb::from_points(&[]).is_none());
    }

    #[test]
    fn test_aabb_degenerate() {
        assert!(!Aabb::new(Vec3::ZERO, Vec3::ONE).is_degenerate());
        assert!(Aabb::new(Vec3::ZERO, Vec3::new(1.0, 0.0, 1.0)).is_degenerate());
        assert!(Aabb::new(Vec3::ONE, Vec3::ZERO).is_degenerate());
        assert!(Aabb::new(Vec3::ZERO, Vec3::new(f32::NAN, 1.0, 1.0)).is_degenerate());
    }

    #[test]
    fn test_aabb_contains_point() {
        let aabb = Aabb::new(Vec3::ZERO, Vec3::ONE);
        assert!(aabb.contains_point(Vec3::splat(0.5)));
        assert!(aabb.contains_point(Vec3::ONE));
        assert!(!aabb.contains_point(Vec3::splat(2.0)));
    }

    #[test]
    fn test_aabb_closest_point() {
        let aabb = Aabb::new(Vec3::ZERO, Vec3::ONE);
        assert_eq!(aabb.closest_point(Vec3::new(0.5, 3.0, -1.0)), Vec3::new(0.5, 1.0, 0.0));
    }

    #[test]
    fn test_ray_from_segment() {
        let (ray, length) = Ray::from_segment(Vec3::ZERO, Vec3::new(0.0, -4.0, 0.0)).unwrap();
        assert_eq!(length, 4.0);
        assert_eq!(ray.direction, Vec3::NEG_Y);
        assert_eq!(ray.at(2.0), Vec3::new(0.0, -2.0, 0.0));
    }

    #[test]
    fn test_ray_degenerate_segment() {
        assert!(Ray::from_segment(Vec3::ONE, Vec3::ONE).is_none());
        assert!(Ray::from_segment(Vec3::ZERO, Vec3::splat(1e-6)).is_none());
    }

    #[test]
    fn test_lerp() {
        assert_eq!(lerp(0.0, 10.0, 0.5), 5.0);
        assert_eq!(lerp(0.0, 10.0, 0.0), 0.0);
        assert_eq!(lerp(0.0, 10.0, 1.0), 10.0);
    }

    #[test]
    fn test_bilinear() {
        assert_eq!(bilinear(0.0, 1.0, 2.0, 3.0, 0.0, 0.0), 0.0);
        assert_eq!(bilinear(0.0, 1.0, 2.0, 3.0, 1.0, 1.0), 3.0);
        assert_eq!(bilinear(0.0, 1.0, 2.0, 3.0, 0.5, 0.5), 1.5);
    }
}
