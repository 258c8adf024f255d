use std::f32::consts::PI;

use glam::Vec3;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::camera::{CameraConstraints, CameraPose, Projection};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Camera", inline)]
#[serde(default)]
/// Camera projection and motion constraints.
pub struct CameraOptions {
    /// Vertical field of view in degrees.
    #[schemars(title = "Field of View", range(min = 20.0, max = 90.0), extend("step" = 1.0))]
    pub fovy: f32,
    /// Near clipping plane distance.
    #[schemars(skip)]
    pub znear: f32,
    /// Far clipping plane distance.
    #[schemars(skip)]
    pub zfar: f32,
    /// Orbit sensitivity: normalized pointer motion is multiplied by this
    /// before the arcsine mapping.
    #[schemars(title = "Rotate Speed", range(min = 1.0, max = 120.0), extend("step" = 1.0))]
    pub rotational_factor: f32,
    /// Closest approach to the focus point.
    #[schemars(title = "Min Distance", range(min = 0.05, max = 2.0), extend("step" = 0.05))]
    pub min_distance: f32,
    /// Farthest distance from the focus point (keep inside the skybox).
    #[schemars(title = "Max Distance", range(min = 1.0, max = 50.0), extend("step" = 0.1))]
    pub max_distance: f32,
    /// Smallest tilt from the up axis, radians.
    #[schemars(skip)]
    pub min_tilt: f32,
    /// Largest tilt from the up axis, radians.
    #[schemars(skip)]
    pub max_tilt: f32,
    /// Lowest eye height above the ground plane.
    #[schemars(title = "Min Height", range(min = 0.0, max = 1.0), extend("step" = 0.01))]
    pub min_height: f32,
    /// Whether the distance and height clamps start enabled.
    #[schemars(title = "Limit Camera")]
    pub limit_enabled: bool,
    /// Eye position at startup.
    #[schemars(skip)]
    pub default_position: [f32; 3],
}

impl Default for CameraOptions {
    fn default() -> Self {
        Self {
            fovy: 45.0,
            znear: 0.1,
            zfar: 500.0,
            rotational_factor: 60.0,
            min_distance: 0.25,
            max_distance: 4.9,
            min_tilt: 0.1,
            max_tilt: PI - 0.1,
            min_height: 0.1,
            limit_enabled: true,
            default_position: [-1.0, 0.0, 1.0],
        }
    }
}

impl CameraOptions {
    /// Projection parameters.
    #[must_use]
    pub fn projection(&self) -> Projection {
        Projection {
            fovy: self.fovy,
            znear: self.znear,
            zfar: self.zfar,
        }
    }

    /// Motion constraints for a skybox of the given half-extent. The far
    /// bound never reaches past the skybox walls.
    #[must_use]
    pub fn constraints(&self, skybox_size: f32) -> CameraConstraints {
        CameraConstraints {
            rotational_factor: self.rotational_factor,
            min_height: self.min_height,
            min_distance: self.min_distance,
            max_distance: self.max_distance.min(skybox_size),
            min_tilt: self.min_tilt,
            max_tilt: self.max_tilt,
            limit_enabled: self.limit_enabled,
        }
    }

    /// Startup pose looking at the origin with +Z up.
    #[must_use]
    pub fn initial_pose(&self) -> CameraPose {
        CameraPose::new(Vec3::from(self.default_position), Vec3::ZERO, Vec3::Z)
    }

    /// Check internal consistency, returning a description of the first
    /// problem found.
    pub(crate) fn validate(&self, skybox_size: f32) -> Result<(), String> {
        if !(self.znear > 0.0 && self.zfar > self.znear) {
            return Err(format!(
                "camera: need 0 < znear < zfar (got {} / {})",
                self.znear, self.zfar
            ));
        }
        if !(self.fovy > 0.0 && self.fovy < 180.0) {
            return Err(format!("camera: fovy {} out of (0, 180)", self.fovy));
        }
        if !(self.min_distance > 0.0 && self.min_distance < self.max_distance)
        {
            return Err(format!(
                "camera: need 0 < min_distance < max_distance (got {} / {})",
                self.min_distance, self.max_distance
            ));
        }
        if self.max_distance >= skybox_size {
            return Err(format!(
                "camera: max_distance {} must stay inside skybox_size {}",
                self.max_distance, skybox_size
            ));
        }
        if !(0.0 < self.min_tilt && self.min_tilt < self.max_tilt && self.max_tilt < PI) {
            return Err(format!(
                "camera: need 0 < min_tilt < max_tilt < π (got {} / {})",
                self.min_tilt, self.max_tilt
            ));
        }
        if Vec3::from(self.default_position).length() <= f32::EPSILON {
            return Err("camera: default_position must differ from the focus point".to_owned());
        }
        Ok(())
    }
}
