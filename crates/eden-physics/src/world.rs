//! Primitive store.
//!
//! The world owns every registered collision primitive by value in flat
//! containers. Kinematic platforms are addressed by [`PlatformId`] through a
//! slot index into their container. Geometry lives until [`CollisionWorld::clear`].
//!
//! Rotations are accepted but ignored: boxes, hulls and platforms are always
//! axis-aligned.

use ahash::AHashMap;
use eden_core::math::Aabb;
use glam::{Mat4, Quat, Vec3};

use crate::shapes::{Heightfield, KinematicPlatform, PlatformId, Triangle};

/// Terrain height callback `(x, z) -> y` for procedurally represented terrain.
pub type HeightQuery = Box<dyn Fn(f32, f32) -> f32>;

/// Collision geometry for one character.
pub struct CollisionWorld {
    static_boxes: Vec<Aabb>,
    kinematic: Vec<KinematicPlatform>,
    platform_slots: AHashMap<PlatformId, usize>,
    triangles: Vec<Triangle>,
    heightfields: Vec<Heightfield>,
    height_query: Option<HeightQuery>,
    next_platform_id: u32,
}

impl CollisionWorld {
    pub fn new() -> Self {
        Self {
            static_boxes: Vec::new(),
            kinematic: Vec::new(),
            platform_slots: AHashMap::new(),
            triangles: Vec::new(),
            heightfields: Vec::new(),
            height_query: None,
            next_platform_id: 1,
        }
    }

    /// Bake an indexed triangle mesh into world-space triangles.
    ///
    /// Trailing indices that do not form a full triangle are ignored, as are
    /// triangles with out-of-range indices or zero area.
    pub fn add_static_mesh(&mut self, vertices: &[Vec3], indices: &[u32], transform: Mat4) {
        let before = self.triangles.len();
        for tri in indices.chunks_exact(3) {
            let corner = |i: u32| {
                vertices
                    .get(i as usize)
                    .map(|v| transform.transform_point3(*v))
            };
            let (Some(v0), Some(v1), Some(v2)) = (corner(tri[0]), corner(tri[1]), corner(tri[2]))
            else {
                continue;
            };
            if let Some(triangle) = Triangle::new(v0, v1, v2) {
                self.triangles.push(triangle);
            }
        }
        let added = self.triangles.len() - before;
        if added < indices.len() / 3 {
            log::debug!(
                "static mesh: kept {} of {} triangles",
                added,
                indices.len() / 3
            );
        }
    }

    /// Register an axis-aligned box. Degenerate boxes are dropped.
    pub fn add_static_box(&mut self, half_extents: Vec3, position: Vec3, _rotation: Quat) {
        let bounds = Aabb::from_center_half_extents(position, half_extents);
        self.push_static(bounds, "box");
    }

    /// Register a convex hull approximated by the AABB of its points.
    ///
    /// `points` are relative to `position`.
    pub fn add_convex_hull(&mut self, points: &[Vec3], position: Vec3, _rotation: Quat) {
        if let Some(local) = Aabb::from_points(points) {
            self.push_static(local.translated(position), "convex hull");
        }
    }

    fn push_static(&mut self, bounds: Aabb, kind: &str) {
        if bounds.is_degenerate() {
            log::debug!("dropping degenerate static {}: {:?}", kind, bounds);
            return;
        }
        self.static_boxes.push(bounds);
    }

    /// Register a terrain heightfield, see [`Heightfield::new`] for what is rejected.
    pub fn add_terrain_heightfield(
        &mut self,
        heights: &[f32],
        sample_count: usize,
        offset: Vec3,
        scale: Vec3,
    ) {
        match Heightfield::new(heights, sample_count, offset, scale) {
            Some(field) => self.heightfields.push(field),
            None => log::debug!(
                "dropping heightfield: {} samples for a {}x{} grid, scale {:?}",
                heights.len(),
                sample_count,
                sample_count,
                scale
            ),
        }
    }

    /// Register a kinematic platform and return its id.
    ///
    /// Ids start at 1 and increase monotonically until [`clear`](Self::clear).
    /// Degenerate boxes yield [`PlatformId::INVALID`].
    pub fn add_kinematic_platform(
        &mut self,
        half_extents: Vec3,
        position: Vec3,
        _rotation: Quat,
    ) -> PlatformId {
        let bounds = Aabb::from_center_half_extents(position, half_extents);
        if bounds.is_degenerate() || self.next_platform_id == u32::MAX {
            log::debug!("dropping degenerate kinematic platform: {:?}", bounds);
            return PlatformId::INVALID;
        }

        let id = PlatformId(self.next_platform_id);
        self.next_platform_id += 1;
        self.platform_slots.insert(id, self.kinematic.len());
        self.kinematic.push(KinematicPlatform {
            id,
            bounds,
            velocity: Vec3::ZERO,
        });
        log::debug!("added kinematic platform {} at {}", id, position);
        id
    }

    /// Move a platform to `position` and store `velocity` as supplied.
    ///
    /// The platform keeps its half-extents. Unknown ids are ignored.
    pub fn update_platform_transform(
        &mut self,
        id: PlatformId,
        position: Vec3,
        _rotation: Quat,
        velocity: Vec3,
        _dt: f32,
    ) {
        let Some(&slot) = self.platform_slots.get(&id) else {
            log::trace!("update for unknown platform {}", id);
            return;
        };
        let platform = &mut self.kinematic[slot];
        platform.bounds = Aabb::from_center_half_extents(position, platform.bounds.half_extents());
        platform.velocity = velocity;
    }

    /// Remove all geometry and restart platform ids at 1.
    ///
    /// The height query is configuration rather than geometry and is kept.
    pub fn clear(&mut self) {
        self.static_boxes.clear();
        self.kinematic.clear();
        self.platform_slots.clear();
        self.triangles.clear();
        self.heightfields.clear();
        self.next_platform_id = 1;
    }

    pub fn set_height_query(&mut self, query: HeightQuery) {
        self.height_query = Some(query);
    }

    pub fn clear_height_query(&mut self) {
        self.height_query = None;
    }

    pub fn height_query(&self) -> Option<&HeightQuery> {
        self.height_query.as_ref()
    }

    pub fn static_boxes(&self) -> &[Aabb] {
        &self.static_boxes
    }

    pub fn kinematic_platforms(&self) -> &[KinematicPlatform] {
        &self.kinematic
    }

    pub fn platform(&self, id: PlatformId) -> Option<&KinematicPlatform> {
        self.platform_slots.get(&id).map(|&slot| &self.kinematic[slot])
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    pub fn heightfields(&self) -> &[Heightfield] {
        &self.heightfields
    }

    pub fn is_empty(&self) -> bool {
        self.static_boxes.is_empty()
            && self.kinematic.is_empty()
            && self.triangles.is_empty()
            && self.heightfields.is_empty()
    }
}

impl Default for CollisionWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CollisionWorld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollisionWorld")
            .field("static_boxes", &self.static_boxes.len())
            .field("kinematic", &self.kinematic.len())
            .field("triangles", &self.triangles.len())
            .field("heightfields", &self.heightfields.len())
            .field("height_query", &self.height_query.is_some())
            .field("next_platform_id", &self.next_platform_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_box_registration() {
        let mut world = CollisionWorld::new();
        world.add_static_box(Vec3::new(1.0, 0.5, 2.0), Vec3::new(0.0, 1.0, 0.0), Quat::IDENTITY);
        assert_eq!(world.static_boxes().len(), 1);
        assert_eq!(world.static_boxes()[0].min, Vec3::new(-1.0, 0.5, -2.0));
        assert_eq!(world.static_boxes()[0].max, Vec3::new(1.0, 1.5, 2.0));
    }

    #[test]
    fn test_degenerate_boxes_dropped() {
        let mut world = CollisionWorld::new();
        world.add_static_box(Vec3::new(1.0, 0.0, 1.0), Vec3::ZERO, Quat::IDENTITY);
        world.add_static_box(Vec3::new(-1.0, 1.0, 1.0), Vec3::ZERO, Quat::IDENTITY);
        assert!(world.static_boxes().is_empty());
        let id = world.add_kinematic_platform(Vec3::ZERO, Vec3::ZERO, Quat::IDENTITY);
        assert_eq!(id, PlatformId::INVALID);
        assert!(world.kinematic_platforms().is_empty());
    }

    #[test]
    fn test_rotation_ignored() {
        let mut world = CollisionWorld::new();
        let rotation = Quat::from_rotation_y(std::f32::consts::FRAC_PI_4);
        world.add_static_box(Vec3::ONE, Vec3::ZERO, rotation);
        assert_eq!(world.static_boxes()[0], Aabb::new(-Vec3::ONE, Vec3::ONE));
    }

    #[test]
    fn test_convex_hull_as_aabb() {
        let mut world = CollisionWorld::new();
        let points = [
            Vec3::new(-1.0, 0.0, -1.0),
            Vec3::new(1.0, 0.0, -1.0),
            Vec3::new(0.0, 2.0, 1.0),
        ];
        world.add_convex_hull(&points, Vec3::new(5.0, 0.0, 0.0), Quat::IDENTITY);
        world.add_convex_hull(&[], Vec3::ZERO, Quat::IDENTITY);
        assert_eq!(world.static_boxes().len(), 1);
        assert_eq!(world.static_boxes()[0].min, Vec3::new(4.0, 0.0, -1.0));
        assert_eq!(world.static_boxes()[0].max, Vec3::new(6.0, 2.0, 1.0));
    }

    #[test]
    fn test_static_mesh_baked() {
        let mut world = CollisionWorld::new();
        let vertices = [
            Vec3::new(-1.0, 0.0, -1.0),
            Vec3::new(-1.0, 0.0, 1.0),
            Vec3::new(1.0, 0.0, 1.0),
            Vec3::new(1.0, 0.0, -1.0),
        ];
        let indices = [0, 1, 2, 0, 2, 3, 0, 9, 1, 0, 1];
        world.add_static_mesh(&vertices, &indices, Mat4::from_translation(Vec3::Y * 2.0));
        assert_eq!(world.triangles().len(), 2);
        for tri in world.triangles() {
            assert_eq!(tri.v0.y, 2.0);
            assert!((tri.normal - Vec3::Y).length() < 1e-6);
        }
    }

    #[test]
    fn test_platform_ids_monotonic() {
        let mut world = CollisionWorld::new();
        let a = world.add_kinematic_platform(Vec3::ONE, Vec3::ZERO, Quat::IDENTITY);
        let b = world.add_kinematic_platform(Vec3::ONE, Vec3::X * 5.0, Quat::IDENTITY);
        assert_eq!(a, PlatformId(1));
        assert_eq!(b, PlatformId(2));

        world.clear();
        let c = world.add_kinematic_platform(Vec3::ONE, Vec3::ZERO, Quat::IDENTITY);
        assert_eq!(c, PlatformId(1));
    }

    #[test]
    fn test_update_platform_transform() {
        let mut world = CollisionWorld::new();
        let id = world.add_kinematic_platform(Vec3::new(2.0, 0.5, 2.0), Vec3::ZERO, Quat::IDENTITY);
        let velocity = Vec3::new(1.5, 0.0, -0.5);
        world.update_platform_transform(id, Vec3::new(3.0, 1.0, 0.0), Quat::IDENTITY, velocity, 1.0 / 60.0);

        let platform = world.platform(id).unwrap();
        assert_eq!(platform.bounds.center(), Vec3::new(3.0, 1.0, 0.0));
        assert_eq!(platform.bounds.half_extents(), Vec3::new(2.0, 0.5, 2.0));
        assert_eq!(platform.velocity, velocity);
    }

    #[test]
    fn test_update_unknown_platform_is_noop() {
        let mut world = CollisionWorld::new();
        let id = world.add_kinematic_platform(Vec3::ONE, Vec3::ZERO, Quat::IDENTITY);
        let before = *world.platform(id).unwrap();
        world.update_platform_transform(PlatformId(42), Vec3::splat(9.0), Quat::IDENTITY, Vec3::ONE, 0.1);
        world.update_platform_transform(PlatformId::INVALID, Vec3::splat(9.0), Quat::IDENTITY, Vec3::ONE, 0.1);
        assert_eq!(*world.platform(id).unwrap(), before);
    }

    #[test]
    fn test_clear_keeps_height_query() {
        let mut world = CollisionWorld::new();
        world.add_static_box(Vec3::ONE, Vec3::ZERO, Quat::IDENTITY);
        world.add_terrain_heightfield(&[0.0; 4], 2, Vec3::ZERO, Vec3::ONE);
        world.set_height_query(Box::new(|_, _| 0.0));
        assert!(!world.is_empty());

        world.clear();
        assert!(world.is_empty());
        assert!(world.height_query().is_some());
    }
}
