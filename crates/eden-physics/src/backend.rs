//! Backend selection.

use crate::controller::{CharacterController, PhysicsBackend};
use crate::homebrew::HomebrewCharacter;
use crate::{PhysicsError, PhysicsResult};

/// Build an uninitialized controller for `backend`.
pub fn create_controller(backend: PhysicsBackend) -> PhysicsResult<Box<dyn CharacterController>> {
    log::debug!("creating {} character controller", backend);
    match backend {
        PhysicsBackend::Homebrew => Ok(Box::new(HomebrewCharacter::new())),
        PhysicsBackend::Jolt => Err(PhysicsError::BackendUnavailable(backend)),
    }
}

/// Build a controller and initialize it.
pub fn create_initialized(backend: PhysicsBackend) -> PhysicsResult<Box<dyn CharacterController>> {
    let mut controller = create_controller(backend)?;
    if !controller.initialize() {
        return Err(PhysicsError::InitializationFailed(backend));
    }
    Ok(controller)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_homebrew_available() {
        let controller = create_controller(PhysicsBackend::Homebrew).unwrap();
        assert_eq!(controller.backend(), PhysicsBackend::Homebrew);
    }

    #[test]
    fn test_jolt_unavailable() {
        let err = create_controller(PhysicsBackend::Jolt).err().unwrap();
        assert!(matches!(err, PhysicsError::BackendUnavailable(PhysicsBackend::Jolt)));
        assert_eq!(err.to_string(), "Physics backend not available: jolt");
    }

    #[test]
    fn test_create_initialized_accepts_geometry() {
        let mut controller = create_initialized(PhysicsBackend::Homebrew).unwrap();
        let id = controller.add_kinematic_platform(glam::Vec3::ONE, glam::Vec3::ZERO, glam::Quat::IDENTITY);
        assert!(id.is_valid());
    }
}
