//! Serializable level descriptions.
//!
//! A scene lists the geometry and character spawn for one level and can be
//! loaded into any [`CharacterController`]. Kinematic platforms carry
//! analytic sinusoidal motion so their velocity is exact rather than
//! differenced from positions.

use std::f32::consts::TAU;
use std::path::Path;

use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::PhysicsResult;
use crate::backend::create_initialized;
use crate::character::CharacterSettings;
use crate::controller::{CharacterController, DEFAULT_HEIGHT, DEFAULT_RADIUS, PhysicsBackend};
use crate::shapes::PlatformId;

/// Scene loading errors
#[derive(Error, Debug)]
pub enum SceneError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid scene JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid scene: {0}")]
    Invalid(String),
}

/// Result type for scene operations
pub type SceneResult<T> = Result<T, SceneError>;

/// Character spawn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterDesc {
    pub position: Vec3,
    pub height: f32,
    pub radius: f32,
}

impl Default for CharacterDesc {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, DEFAULT_HEIGHT * 0.5, 0.0),
            height: DEFAULT_HEIGHT,
            radius: DEFAULT_RADIUS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxDesc {
    pub half_extents: Vec3,
    pub position: Vec3,
    #[serde(default)]
    pub rotation: Quat,
}

/// Convex hull; points are relative to `position`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HullDesc {
    pub points: Vec<Vec3>,
    pub position: Vec3,
    #[serde(default)]
    pub rotation: Quat,
}

/// Indexed triangle mesh placed by translation, rotation and scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshDesc {
    pub vertices: Vec<Vec3>,
    pub indices: Vec<u32>,
    #[serde(default)]
    pub translation: Vec3,
    #[serde(default)]
    pub rotation: Quat,
    #[serde(default = "unit_scale")]
    pub scale: Vec3,
}

impl MeshDesc {
    pub fn transform(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

fn unit_scale() -> Vec3 {
    Vec3::ONE
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeightfieldDesc {
    /// Row-major `sample_count × sample_count` samples.
    pub heights: Vec<f32>,
    pub sample_count: usize,
    pub offset: Vec3,
    pub scale: Vec3,
}

/// Sinusoidal oscillation around a platform's rest position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformMotion {
    /// Peak displacement along each axis.
    pub amplitude: Vec3,
    /// Seconds per full cycle; non-positive means stationary.
    pub period: f32,
    /// Phase offset in radians.
    pub phase: f32,
}

impl Default for PlatformMotion {
    fn default() -> Self {
        Self {
            amplitude: Vec3::ZERO,
            period: 4.0,
            phase: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlatformDesc {
    pub half_extents: Vec3,
    /// Rest position.
    pub position: Vec3,
    #[serde(default)]
    pub motion: Option<PlatformMotion>,
}

impl PlatformDesc {
    /// Position and velocity at time `t` seconds.
    pub fn sample(&self, t: f32) -> (Vec3, Vec3) {
        let Some(motion) = self.motion.filter(|m| m.period > 0.0) else {
            return (self.position, Vec3::ZERO);
        };
        let omega = TAU / motion.period;
        let angle = omega * t + motion.phase;
        let position = self.position + motion.amplitude * angle.sin();
        let velocity = motion.amplitude * (omega * angle.cos());
        (position, velocity)
    }
}

/// Complete level description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneDesc {
    pub backend: PhysicsBackend,
    pub settings: CharacterSettings,
    pub character: CharacterDesc,
    pub boxes: Vec<BoxDesc>,
    pub hulls: Vec<HullDesc>,
    pub meshes: Vec<MeshDesc>,
    pub heightfields: Vec<HeightfieldDesc>,
    pub platforms: Vec<PlatformDesc>,
}

impl Default for SceneDesc {
    fn default() -> Self {
        Self {
            backend: PhysicsBackend::Homebrew,
            settings: CharacterSettings::default(),
            character: CharacterDesc::default(),
            boxes: Vec::new(),
            hulls: Vec::new(),
            meshes: Vec::new(),
            heightfields: Vec::new(),
            platforms: Vec::new(),
        }
    }
}

impl SceneDesc {
    pub fn from_json_str(json: &str) -> SceneResult<Self> {
        let scene: Self = serde_json::from_str(json)?;
        scene.validate()?;
        Ok(scene)
    }

    pub fn from_path(path: impl AsRef<Path>) -> SceneResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let scene = Self::from_json_str(&json)?;
        log::debug!(
            "loaded scene {} ({} boxes, {} platforms)",
            path.display(),
            scene.boxes.len(),
            scene.platforms.len()
        );
        Ok(scene)
    }

    pub fn to_json_pretty(&self) -> SceneResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject scenes the controller cannot spawn a character in.
    ///
    /// Degenerate geometry is not an error here; the world drops it on registration.
    pub fn validate(&self) -> SceneResult<()> {
        let c = &self.character;
        if !(c.height > 0.0 && c.radius > 0.0) {
            return Err(SceneError::Invalid(format!(
                "character height {} and radius {} must be positive",
                c.height, c.radius
            )));
        }
        if !c.position.is_finite() {
            return Err(SceneError::Invalid("character position is not finite".into()));
        }
        if !self.settings.gravity.is_finite() {
            return Err(SceneError::Invalid("gravity is not finite".into()));
        }
        Ok(())
    }

    /// Register the scene with an initialized controller and spawn the character.
    ///
    /// Returns one id per entry of [`platforms`](Self::platforms), in order.
    pub fn apply(&self, controller: &mut dyn CharacterController) -> Vec<PlatformId> {
        controller.set_gravity(self.settings.gravity);
        controller.set_max_slope_angle(self.settings.max_slope_angle);

        for b in &self.boxes {
            controller.add_static_box(b.half_extents, b.position, b.rotation);
        }
        for hull in &self.hulls {
            controller.add_convex_hull(&hull.points, hull.position, hull.rotation);
        }
        for mesh in &self.meshes {
            controller.add_static_mesh(&mesh.vertices, &mesh.indices, mesh.transform());
        }
        for field in &self.heightfields {
            controller.add_terrain_heightfield(&field.heights, field.sample_count, field.offset, field.scale);
        }

        let ids = self
            .platforms
            .iter()
            .map(|platform| {
                let (position, velocity) = platform.sample(0.0);
                let id = controller.add_kinematic_platform(platform.half_extents, position, Quat::IDENTITY);
                controller.update_platform_transform(id, position, Quat::IDENTITY, velocity, 0.0);
                id
            })
            .collect();

        controller.create_character(self.character.position, self.character.height, self.character.radius);
        ids
    }

    /// Create and initialize this scene's backend, then [`apply`](Self::apply) the scene.
    pub fn instantiate(&self) -> PhysicsResult<(Box<dyn CharacterController>, Vec<PlatformId>)> {
        let mut controller = create_initialized(self.backend)?;
        let ids = self.apply(controller.as_mut());
        Ok((controller, ids))
    }

    /// Move every platform to its analytic pose at time `t`.
    pub fn update_platforms(&self, controller: &mut dyn CharacterController, ids: &[PlatformId], t: f32, dt: f32) {
        for (platform, id) in self.platforms.iter().zip(ids) {
            if !id.is_valid() {
                continue;
            }
            let (position, velocity) = platform.sample(t);
            controller.update_platform_transform(*id, position, Quat::IDENTITY, velocity, dt);
        }
    }

    /// Small level exercising every primitive kind.
    pub fn sample() -> Self {
        let n = 9;
        let heights = (0..n * n)
            .map(|i| {
                let (x, z) = ((i % n) as f32, (i / n) as f32);
                0.25 * (x * 0.7).sin() * (z * 0.5).cos()
            })
            .collect();

        Self {
            character: CharacterDesc {
                position: Vec3::new(0.0, 1.0, 0.0),
                ..CharacterDesc::default()
            },
            boxes: vec![
                BoxDesc {
                    half_extents: Vec3::new(10.0, 0.5, 10.0),
                    position: Vec3::new(0.0, -0.5, 0.0),
                    rotation: Quat::IDENTITY,
                },
                BoxDesc {
                    half_extents: Vec3::new(0.5, 2.0, 6.0),
                    position: Vec3::new(8.0, 2.0, 0.0),
                    rotation: Quat::IDENTITY,
                },
            ],
            hulls: vec![HullDesc {
                points: vec![
                    Vec3::new(-1.0, 0.0, -1.0),
                    Vec3::new(1.0, 0.0, -1.0),
                    Vec3::new(0.0, 1.0, 1.0),
                    Vec3::new(0.0, 0.0, 1.0),
                ],
                position: Vec3::new(-4.0, 0.0, 4.0),
                rotation: Quat::IDENTITY,
            }],
            meshes: vec![MeshDesc {
                vertices: vec![
                    Vec3::new(0.0, 0.0, 0.0),
                    Vec3::new(2.0, 0.0, 0.0),
                    Vec3::new(2.0, 0.0, 2.0),
                    Vec3::new(0.0, 0.0, 2.0),
                ],
                indices: vec![0, 2, 1, 0, 3, 2],
                translation: Vec3::new(-6.0, 0.3, -6.0),
                rotation: Quat::IDENTITY,
                scale: Vec3::ONE,
            }],
            heightfields: vec![HeightfieldDesc {
                heights,
                sample_count: n,
                offset: Vec3::new(12.0, -0.2, -4.0),
                scale: Vec3::ONE,
            }],
            platforms: vec![PlatformDesc {
                half_extents: Vec3::new(1.5, 0.25, 1.5),
                position: Vec3::new(4.0, 1.0, -4.0),
                motion: Some(PlatformMotion {
                    amplitude: Vec3::new(0.0, 0.75, 2.0),
                    period: 6.0,
                    phase: 0.0,
                }),
            }],
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PhysicsError;

    #[test]
    fn test_minimal_json_uses_defaults() {
        let scene = SceneDesc::from_json_str("{}").unwrap();
        assert_eq!(scene, SceneDesc::default());
        assert_eq!(scene.settings.gravity, 20.0);
        assert_eq!(scene.backend, PhysicsBackend::Homebrew);
    }

    #[test]
    fn test_parse_geometry() {
        let json = r#"{
            "backend": "homebrew",
            "settings": { "gravity": 9.81 },
            "boxes": [ { "half_extents": [5, 0.5, 5], "position": [0, -0.5, 0] } ],
            "platforms": [
                { "half_extents": [1, 0.25, 1], "position": [3, 1, 0],
                  "motion": { "amplitude": [0, 1, 0], "period": 2 } }
            ]
        }"#;
        let scene = SceneDesc::from_json_str(json).unwrap();
        assert_eq!(scene.settings.gravity, 9.81);
        assert_eq!(scene.settings.max_slope_angle, 50.0);
        assert_eq!(scene.boxes[0].rotation, Quat::IDENTITY);
        let motion = scene.platforms[0].motion.unwrap();
        assert_eq!(motion.period, 2.0);
        assert_eq!(motion.phase, 0.0);
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(SceneDesc::from_json_str("{ boxes: 3"), Err(SceneError::Json(_))));
        let bad = r#"{ "character": { "height": 0.0 } }"#;
        assert!(matches!(SceneDesc::from_json_str(bad), Err(SceneError::Invalid(_))));
    }

    #[test]
    fn test_missing_file() {
        let err = SceneDesc::from_path("/nonexistent/eden-scene.json").unwrap_err();
        assert!(matches!(err, SceneError::Io(_)));
    }

    #[test]
    fn test_platform_motion_is_analytic() {
        let platform = PlatformDesc {
            half_extents: Vec3::ONE,
            position: Vec3::new(0.0, 2.0, 0.0),
            motion: Some(PlatformMotion {
                amplitude: Vec3::new(1.0, 0.5, 0.0),
                period: 4.0,
                phase: 0.0,
            }),
        };
        let (p0, v0) = platform.sample(0.0);
        assert_eq!(p0, platform.position);
        let omega = TAU / 4.0;
        assert!((v0 - Vec3::new(omega, 0.5 * omega, 0.0)).length() < 1e-5);

        // Quarter period: peak displacement, at rest.
        let (p1, v1) = platform.sample(1.0);
        assert!((p1 - Vec3::new(1.0, 2.5, 0.0)).length() < 1e-5);
        assert!(v1.length() < 1e-5);
    }

    #[test]
    fn test_stationary_platform() {
        let platform = PlatformDesc {
            half_extents: Vec3::ONE,
            position: Vec3::X,
            motion: Some(PlatformMotion {
                period: 0.0,
                ..PlatformMotion::default()
            }),
        };
        assert_eq!(platform.sample(3.0), (Vec3::X, Vec3::ZERO));
    }

    #[test]
    fn test_apply_sample_scene() {
        let scene = SceneDesc::sample();
        let mut controller = create_initialized(scene.backend).unwrap();
        let ids = scene.apply(controller.as_mut());
        assert_eq!(ids, vec![PlatformId(1)]);
        assert_eq!(controller.position(), scene.character.position);

        // Floor below the spawn, moving platform above its rest top.
        let down = controller.raycast(Vec3::new(0.0, 5.0, 0.0), Vec3::new(0.0, -5.0, 0.0));
        assert!(down.hit);
        assert!(down.point.y.abs() < 1e-4);
        let platform = controller.raycast(Vec3::new(4.0, 5.0, -4.0), Vec3::new(4.0, 0.0, -4.0));
        assert!((platform.point.y - 1.25).abs() < 1e-4);
    }

    #[test]
    fn test_update_platforms_follows_motion() {
        let scene = SceneDesc::sample();
        let mut controller = create_initialized(scene.backend).unwrap();
        let ids = scene.apply(controller.as_mut());

        // Quarter period: the platform is 0.75 up and 2 along +Z.
        scene.update_platforms(controller.as_mut(), &ids, 1.5, 1.0 / 60.0);
        let hit = controller.raycast(Vec3::new(4.0, 5.0, -2.0), Vec3::new(4.0, 0.0, -2.0));
        assert!(hit.hit);
        assert!((hit.point.y - 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_instantiate_jolt_scene_fails() {
        let scene = SceneDesc {
            backend: PhysicsBackend::Jolt,
            ..SceneDesc::sample()
        };
        assert!(matches!(scene.instantiate(), Err(PhysicsError::BackendUnavailable(_))));
    }

    #[test]
    fn test_sample_scene_json() {
        let json = SceneDesc::sample().to_json_pretty().unwrap();
        let parsed = SceneDesc::from_json_str(&json).unwrap();
        assert_eq!(parsed.platforms.len(), 1);
        assert_eq!(parsed.heightfields[0].heights.len(), 81);
    }
}
