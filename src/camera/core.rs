use glam::{Mat4, Vec3};

/// Where the eye is and what it looks at.
///
/// The focus point and up axis are fixed for the lifetime of the viewer;
/// only [`CameraController`](super::controller::CameraController) moves
/// the position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    pub(crate) position: Vec3,
    focus: Vec3,
    up: Vec3,
}

impl CameraPose {
    /// Pose at `position`, looking at `focus`, with `up` as the world
    /// vertical (normalized here).
    #[must_use]
    pub fn new(position: Vec3, focus: Vec3, up: Vec3) -> Self {
        Self {
            position,
            focus,
            up: up.normalize_or(Vec3::Z),
        }
    }

    /// Eye position in world space.
    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Look-at target.
    #[must_use]
    pub fn focus(&self) -> Vec3 {
        self.focus
    }

    /// Unit world-vertical axis.
    #[must_use]
    pub fn up(&self) -> Vec3 {
        self.up
    }

    /// Distance from the eye to the focus point.
    #[must_use]
    pub fn distance(&self) -> f32 {
        (self.position - self.focus).length()
    }

    /// Angle in radians between the up axis and the focus-to-eye vector:
    /// 0 looking straight down, π straight up.
    #[must_use]
    pub fn tilt(&self) -> f32 {
        let offset = (self.position - self.focus).normalize_or_zero();
        self.up.dot(offset).clamp(-1.0, 1.0).acos()
    }

    /// Height of the eye along the up axis.
    #[must_use]
    pub fn height(&self) -> f32 {
        self.position.dot(self.up)
    }
}

impl Default for CameraPose {
    fn default() -> Self {
        Self::new(Vec3::new(-1.0, 0.0, 1.0), Vec3::ZERO, Vec3::Z)
    }
}

/// Perspective projection parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    /// Vertical field of view in degrees.
    pub fovy: f32,
    /// Near clipping plane distance.
    pub znear: f32,
    /// Far clipping plane distance.
    pub zfar: f32,
}

impl Projection {
    /// Projection matrix for a `width` x `height` viewport. A degenerate
    /// viewport falls back to a square aspect.
    #[must_use]
    pub fn matrix(&self, (width, height): (u32, u32)) -> Mat4 {
        let aspect = if width > 0 && height > 0 {
            width as f32 / height as f32
        } else {
            1.0
        };
        // perspective_rh already uses [0,1] depth range (wgpu/Vulkan
        // convention)
        Mat4::perspective_rh(self.fovy.to_radians(), aspect, self.znear, self.zfar)
    }
}

impl Default for Projection {
    fn default() -> Self {
        Self {
            fovy: 45.0,
            znear: 0.1,
            zfar: 500.0,
        }
    }
}

/// The combined projection * view matrix, kept current with the pose and
/// viewport.
///
/// Recomputed eagerly on every pose or viewport change, so readers never
/// see a matrix older than the last mutation.
#[derive(Debug, Clone)]
pub struct ViewProjectionCache {
    projection: Projection,
    viewport: (u32, u32),
    matrix: Mat4,
}

impl ViewProjectionCache {
    /// Build the cache and compute the initial matrix.
    #[must_use]
    pub fn new(
        projection: Projection,
        viewport: (u32, u32),
        pose: &CameraPose,
    ) -> Self {
        let mut cache = Self {
            projection,
            viewport,
            matrix: Mat4::IDENTITY,
        };
        cache.update(pose);
        cache
    }

    /// Recompute after the pose changed.
    pub fn update(&mut self, pose: &CameraPose) {
        let view = Mat4::look_at_rh(pose.position(), pose.focus(), pose.up());
        self.matrix = self.projection.matrix(self.viewport) * view;
    }

    /// Recompute after the viewport changed.
    pub fn set_viewport(&mut self, width: u32, height: u32, pose: &CameraPose) {
        self.viewport = (width, height);
        self.update(pose);
    }

    /// Current projection * view matrix.
    #[must_use]
    pub fn matrix(&self) -> Mat4 {
        self.matrix
    }

    /// Viewport the matrix was built for.
    #[must_use]
    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    /// Projection parameters.
    #[must_use]
    pub fn projection(&self) -> Projection {
        self.projection
    }
}
