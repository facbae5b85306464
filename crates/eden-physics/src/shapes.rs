//! Collision primitives stored by the [`CollisionWorld`](crate::CollisionWorld).
//!
//! Everything here is baked into world space at registration time so queries
//! never re-transform geometry.

use eden_core::math::{Aabb, bilinear};
use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Horizontal offset used by finite-difference heightfield normals.
pub const NORMAL_SAMPLE_DELTA: f32 = 0.1;

/// Identifier handed out for kinematic platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlatformId(pub u32);

impl PlatformId {
    /// Returned when a platform could not be registered.
    pub const INVALID: Self = Self(u32::MAX);

    pub fn is_valid(&self) -> bool {
        *self != Self::INVALID
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for PlatformId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_valid() {
            write!(f, "#{}", self.0)
        } else {
            f.write_str("#invalid")
        }
    }
}

/// World-space triangle with a precomputed unit normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub v0: Vec3,
    pub v1: Vec3,
    pub v2: Vec3,
    pub normal: Vec3,
}

impl Triangle {
    /// Build a triangle, `None` when it has no area.
    ///
    /// The normal follows the winding `(v1 - v0) x (v2 - v0)`.
    pub fn new(v0: Vec3, v1: Vec3, v2: Vec3) -> Option<Self> {
        let normal = (v1 - v0).cross(v2 - v0).try_normalize()?;
        Some(Self { v0, v1, v2, normal })
    }
}

/// Box moved every tick by external code.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KinematicPlatform {
    pub id: PlatformId,
    pub bounds: Aabb,
    /// Velocity last supplied by the caller, stored verbatim.
    pub velocity: Vec3,
}

impl KinematicPlatform {
    pub fn top(&self) -> f32 {
        self.bounds.max.y
    }

    /// Whether `(x, z)` lies inside the footprint grown by `margin` on each side.
    pub fn footprint_contains(&self, x: f32, z: f32, margin: f32) -> bool {
        x >= self.bounds.min.x - margin
            && x <= self.bounds.max.x + margin
            && z >= self.bounds.min.z - margin
            && z <= self.bounds.max.z + margin
    }
}

/// Regular grid of terrain heights.
///
/// Samples are row-major: row `z`, column `x`, `sample_count` per row.
/// Queries outside the grid clamp to its border.
#[derive(Debug, Clone, PartialEq)]
pub struct Heightfield {
    heights: Vec<f32>,
    sample_count: usize,
    offset: Vec3,
    scale: Vec3,
    min_height: f32,
    max_height: f32,
}

impl Heightfield {
    /// Validate and copy a heightfield.
    ///
    /// Rejects empty grids, buffers that are not `sample_count²` long and
    /// non-positive horizontal spacing.
    pub fn new(heights: &[f32], sample_count: usize, offset: Vec3, scale: Vec3) -> Option<Self> {
        if sample_count == 0 || heights.len() != sample_count.checked_mul(sample_count)? {
            return None;
        }
        if !(scale.x > 0.0 && scale.z > 0.0) {
            return None;
        }
        let (min_height, max_height) = heights.iter().fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), h| {
            let y = offset.y + h * scale.y;
            (lo.min(y), hi.max(y))
        });
        Some(Self {
            heights: heights.to_vec(),
            sample_count,
            offset,
            scale,
            min_height,
            max_height,
        })
    }

    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    pub fn offset(&self) -> Vec3 {
        self.offset
    }

    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    /// Lowest and highest world-space height of any sample.
    pub fn height_range(&self) -> (f32, f32) {
        (self.min_height, self.max_height)
    }

    /// World-space `(x, z)` corners of the sampled grid.
    pub fn footprint(&self) -> (Vec2, Vec2) {
        let last = (self.sample_count - 1) as f32;
        let min = Vec2::new(self.offset.x, self.offset.z);
        (min, min + Vec2::new(self.scale.x, self.scale.z) * last)
    }

    fn sample(&self, x: usize, z: usize) -> f32 {
        self.heights[z * self.sample_count + x]
    }

    /// World-space terrain height at `(x, z)`, bilinearly interpolated.
    pub fn height_at(&self, x: f32, z: f32) -> f32 {
        let last = (self.sample_count - 1) as f32;
        let local_x = ((x - self.offset.x) / self.scale.x).clamp(0.0, last);
        let local_z = ((z - self.offset.z) / self.scale.z).clamp(0.0, last);

        let x0 = local_x as usize;
        let z0 = local_z as usize;
        let x1 = (x0 + 1).min(self.sample_count - 1);
        let z1 = (z0 + 1).min(self.sample_count - 1);

        let height = bilinear(
            self.sample(x0, z0),
            self.sample(x1, z0),
            self.sample(x0, z1),
            self.sample(x1, z1),
            local_x - x0 as f32,
            local_z - z0 as f32,
        );
        self.offset.y + height * self.scale.y
    }

    /// Surface normal at `(x, z)` from central differences.
    pub fn normal_at(&self, x: f32, z: f32) -> Vec3 {
        let d = NORMAL_SAMPLE_DELTA;
        let left = self.height_at(x - d, z);
        let right = self.height_at(x + d, z);
        let back = self.height_at(x, z - d);
        let front = self.height_at(x, z + d);
        Vec3::new(left - right, 2.0 * d, back - front).normalize_or(Vec3::Y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp() -> Heightfield {
        // Height rises one unit per sample along +X.
        let heights: Vec<f32> = (0..9).map(|i| (i % 3) as f32).collect();
        Heightfield::new(&heights, 3, Vec3::ZERO, Vec3::ONE).unwrap()
    }

    #[test]
    fn test_triangle_normal() {
        let tri = Triangle::new(Vec3::ZERO, Vec3::new(0.0, 0.0, 1.0), Vec3::new(1.0, 0.0, 0.0)).unwrap();
        assert!((tri.normal - Vec3::Y).length() < 1e-6);
    }

    #[test]
    fn test_degenerate_triangle() {
        assert!(Triangle::new(Vec3::ZERO, Vec3::X, Vec3::X * 2.0).is_none());
    }

    #[test]
    fn test_heightfield_validation() {
        assert!(Heightfield::new(&[], 0, Vec3::ZERO, Vec3::ONE).is_none());
        assert!(Heightfield::new(&[0.0; 8], 3, Vec3::ZERO, Vec3::ONE).is_none());
        assert!(Heightfield::new(&[0.0; 9], 3, Vec3::ZERO, Vec3::new(0.0, 1.0, 1.0)).is_none());
        assert!(Heightfield::new(&[0.0; 9], 3, Vec3::ZERO, Vec3::ONE).is_some());
    }

    #[test]
    fn test_heightfield_interpolation() {
        let hf = ramp();
        assert_eq!(hf.height_at(0.0, 0.0), 0.0);
        assert_eq!(hf.height_at(1.0, 1.0), 1.0);
        assert!((hf.height_at(0.5, 1.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_heightfield_clamps_outside() {
        let hf = ramp();
        assert_eq!(hf.height_at(-10.0, 0.0), 0.0);
        assert_eq!(hf.height_at(10.0, 10.0), 2.0);
    }

    #[test]
    fn test_heightfield_offset_and_scale() {
        let hf = Heightfield::new(&[1.0; 4], 2, Vec3::new(10.0, 5.0, 10.0), Vec3::new(2.0, 3.0, 2.0)).unwrap();
        assert_eq!(hf.height_at(11.0, 11.0), 8.0);
    }

    #[test]
    fn test_heightfield_bounds() {
        let hf = Heightfield::new(&[1.0, -2.0, 0.5, 3.0], 2, Vec3::new(10.0, 5.0, -4.0), Vec3::new(2.0, -1.0, 3.0)).unwrap();
        assert_eq!(hf.height_range(), (2.0, 7.0));
        assert_eq!(hf.footprint(), (Vec2::new(10.0, -4.0), Vec2::new(12.0, -1.0)));
    }

    #[test]
    fn test_heightfield_normal() {
        let flat = Heightfield::new(&[2.0; 4], 2, Vec3::ZERO, Vec3::ONE).unwrap();
        assert!((flat.normal_at(0.5, 0.5) - Vec3::Y).length() < 1e-6);

        let n = ramp().normal_at(1.0, 1.0);
        let expected = Vec3::new(-1.0, 1.0, 0.0).normalize();
        assert!((n - expected).length() < 1e-4);
    }

    #[test]
    fn test_platform_footprint() {
        let platform = KinematicPlatform {
            id: PlatformId(1),
            bounds: Aabb::new(Vec3::ZERO, Vec3::ONE),
            velocity: Vec3::ZERO,
        };
        assert!(platform.footprint_contains(1.05, 0.5, 0.1));
        assert!(!platform.footprint_contains(1.2, 0.5, 0.1));
        assert_eq!(platform.top(), 1.0);
    }

    #[test]
    fn test_platform_id_display() {
        assert_eq!(PlatformId(3).to_string(), "#3");
        assert_eq!(PlatformId::INVALID.to_string(), "#invalid");
    }
}
