use std::f32::consts::PI;

use glam::{Quat, Vec2, Vec3};

use super::core::CameraPose;

/// Bounds on camera motion. Fixed after construction apart from
/// [`limit_enabled`](Self::limit_enabled), which gates the distance and
/// height clamps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraConstraints {
    /// Multiplier from normalized pointer motion to orbit input.
    pub rotational_factor: f32,
    /// Lowest eye height above the ground plane.
    pub min_height: f32,
    /// Closest approach to the focus point.
    pub min_distance: f32,
    /// Farthest distance from the focus point.
    pub max_distance: f32,
    /// Smallest allowed tilt (radians from the up axis).
    pub min_tilt: f32,
    /// Largest allowed tilt.
    pub max_tilt: f32,
    /// Whether the distance and height clamps apply.
    pub limit_enabled: bool,
}

impl Default for CameraConstraints {
    fn default() -> Self {
        Self {
            rotational_factor: 60.0,
            min_height: 0.1,
            min_distance: 0.25,
            max_distance: 4.9,
            min_tilt: 0.1,
            max_tilt: PI - 0.1,
            limit_enabled: true,
        }
    }
}

/// Orbit and zoom around a fixed focus point, within [`CameraConstraints`].
///
/// Pointer positions are normalized device coordinates in `[-1, 1]`. Both
/// operations take the previous and current pointer position; identical
/// positions are a no-op.
#[derive(Debug, Clone)]
pub struct CameraController {
    pose: CameraPose,
    constraints: CameraConstraints,
}

impl CameraController {
    /// Controller starting at `pose`.
    #[must_use]
    pub fn new(pose: CameraPose, constraints: CameraConstraints) -> Self {
        Self { pose, constraints }
    }

    /// Current pose.
    #[must_use]
    pub fn pose(&self) -> &CameraPose {
        &self.pose
    }

    /// Active constraints.
    #[must_use]
    pub fn constraints(&self) -> &CameraConstraints {
        &self.constraints
    }

    /// Toggle the distance and height clamps.
    pub fn set_limit_enabled(&mut self, enabled: bool) {
        self.constraints.limit_enabled = enabled;
    }

    /// Rotate the eye about the focus point.
    ///
    /// Horizontal motion yaws about the up axis, vertical motion tilts
    /// toward or away from it. A move that would push the tilt past its
    /// bounds is dropped entirely, yaw included.
    ///
    /// Returns `true` if the pose changed.
    pub fn orbit(&mut self, previous: Vec2, current: Vec2) -> bool {
        if previous == current {
            return false;
        }
        let c = &self.constraints;
        let t = ((previous - current) * c.rotational_factor)
            .clamp(Vec2::splat(-1.0), Vec2::splat(1.0));
        let phi = Vec2::new(2.0 * t.x.asin(), 2.0 * t.y.asin());

        let predicted = self.pose.tilt() + phi.y;
        if (predicted < c.min_tilt && phi.y < 0.0)
            || (predicted > c.max_tilt && phi.y > 0.0)
        {
            log::trace!("orbit rejected: tilt {predicted:.3} out of range");
            return false;
        }

        let up = self.pose.up();
        let focus = self.pose.focus();
        let yawed = Quat::from_axis_angle(up, phi.x) * (self.pose.position - focus);
        let Some(tilt_axis) = up.cross(yawed).try_normalize() else {
            return false;
        };
        let orbited = Quat::from_axis_angle(tilt_axis, phi.y) * yawed;

        let mut position = focus + orbited;
        if c.limit_enabled {
            position = self.lift_to_min_height(position);
        }
        self.pose.position = position;
        true
    }

    /// Move the eye along the focus-to-eye line.
    ///
    /// Vertical motion scales the distance by `1 + dy`; horizontal motion is
    /// ignored. A scale that would collapse the eye onto (or through) the
    /// focus point is dropped.
    ///
    /// Returns `true` if the pose changed.
    pub fn zoom(&mut self, previous: Vec2, current: Vec2) -> bool {
        if previous == current {
            return false;
        }
        let scale = 1.0 + (current.y - previous.y);
        if scale <= f32::EPSILON {
            log::trace!("zoom rejected: scale {scale:.3} would pass the focus");
            return false;
        }

        let focus = self.pose.focus();
        let offset = self.pose.position - focus;
        let mut candidate = offset * scale;

        if self.constraints.limit_enabled {
            let direction = offset.normalize_or_zero();
            let c = &self.constraints;
            if candidate.length() > c.max_distance {
                candidate = direction * c.max_distance;
            }
            if candidate.length() < c.min_distance {
                candidate = direction * c.min_distance;
            }
            self.pose.position = self.enforce_limits(focus + candidate);
        } else {
            self.pose.position = focus + candidate;
        }
        true
    }

    /// Raise the eye straight up to the minimum height if it sits below.
    fn lift_to_min_height(&self, position: Vec3) -> Vec3 {
        let up = self.pose.up();
        let height = position.dot(up);
        if height < self.constraints.min_height {
            position + up * (self.constraints.min_height - height)
        } else {
            position
        }
    }

    /// Raise the eye to the minimum height, then bring the distance back
    /// into range by moving horizontally at that height.
    fn enforce_limits(&self, position: Vec3) -> Vec3 {
        let c = &self.constraints;
        let up = self.pose.up();
        let focus = self.pose.focus();
        let position = self.lift_to_min_height(position);

        let offset = position - focus;
        let distance = offset.length();
        let target = distance.clamp(c.min_distance, c.max_distance);
        if (distance - target).abs() <= f32::EPSILON {
            return position;
        }

        let vertical = up * offset.dot(up);
        let horizontal = offset - vertical;
        let radius_sq = target * target - vertical.length_squared();
        match horizontal.try_normalize() {
            Some(direction) if radius_sq > 0.0 => {
                focus + vertical + direction * radius_sq.sqrt()
            }
            _ => position,
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;

    const EPS: f32 = 1e-4;

    fn controller() -> CameraController {
        CameraController::new(CameraPose::default(), CameraConstraints::default())
    }

    fn assert_vec_eq(actual: Vec3, expected: Vec3) {
        assert!(
            actual.abs_diff_eq(expected, EPS),
            "expected {expected:?}, got {actual:?}"
        );
    }

    #[test]
    fn orbit_full_horizontal_drag_yaws_half_turn() {
        let mut cam = controller();
        assert!(cam.orbit(Vec2::ZERO, Vec2::new(0.1, 0.0)));
        assert_vec_eq(cam.pose().position(), Vec3::new(1.0, 0.0, 1.0));
        assert!((cam.pose().distance() - 2f32.sqrt()).abs() < EPS);
    }

    #[test]
    fn orbit_with_identical_points_is_noop() {
        let mut cam = controller();
        let before = *cam.pose();
        let p = Vec2::new(0.3, -0.2);
        assert!(!cam.orbit(p, p));
        assert_eq!(*cam.pose(), before);
    }

    #[test]
    fn orbit_preserves_distance_when_unclamped() {
        let mut cam = controller();
        cam.set_limit_enabled(false);
        let before = cam.pose().distance();
        assert!(cam.orbit(Vec2::new(0.0, 0.0), Vec2::new(0.004, 0.002)));
        assert!((cam.pose().distance() - before).abs() < EPS);
    }

    #[test]
    fn orbit_keeps_distance_after_limits_are_reenabled() {
        let mut cam = controller();
        cam.set_limit_enabled(false);
        for dy in [0.5, 0.5, 0.5, 0.3] {
            assert!(cam.zoom(Vec2::ZERO, Vec2::new(0.0, dy)));
        }
        let before = cam.pose().distance();
        assert!(before > cam.constraints().max_distance);

        cam.set_limit_enabled(true);
        assert!(cam.orbit(Vec2::ZERO, Vec2::new(0.001, 0.0)));
        assert!((cam.pose().distance() - before).abs() < EPS);
    }

    #[test]
    fn orbit_below_min_height_lifts_only_vertically() {
        let pose = CameraPose::new(Vec3::new(-2.0, 0.0, 0.05), Vec3::ZERO, Vec3::Z);
        let mut cam = CameraController::new(pose, CameraConstraints::default());
        assert!(cam.orbit(Vec2::ZERO, Vec2::new(0.001, 0.0)));
        let position = cam.pose().position();
        assert!((position.z - cam.constraints().min_height).abs() < EPS);
        let horizontal = Vec2::new(position.x, position.y).length();
        assert!((horizontal - 2.0).abs() < EPS);
    }

    #[test]
    fn orbit_vertical_drag_changes_tilt_by_phi() {
        let mut cam = controller();
        let before = cam.pose().tilt();
        // t.y = (0 - -0.005) * 60 = 0.3
        assert!(cam.orbit(Vec2::ZERO, Vec2::new(0.0, -0.005)));
        let phi = 2.0 * 0.3f32.asin();
        assert!((cam.pose().tilt() - (before + phi)).abs() < EPS);
    }

    #[test]
    fn orbit_past_max_tilt_is_rejected() {
        let mut cam = controller();
        let before = *cam.pose();
        // phi.y = 2 * asin(1) = π, far past max tilt from π/4
        assert!(!cam.orbit(Vec2::ZERO, Vec2::new(0.05, -0.5)));
        assert_eq!(*cam.pose(), before);
    }

    #[test]
    fn orbit_toward_min_tilt_is_rejected() {
        let mut cam = controller();
        let before = *cam.pose();
        assert!(!cam.orbit(Vec2::ZERO, Vec2::new(0.0, 0.5)));
        assert_eq!(*cam.pose(), before);
    }

    #[test]
    fn random_orbits_keep_tilt_in_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut cam = controller();
        let c = *cam.constraints();
        let mut last = Vec2::ZERO;
        for _ in 0..2000 {
            let next = last
                + Vec2::new(
                    rng.random_range(-0.01..0.01),
                    rng.random_range(-0.01..0.01),
                );
            let _ = cam.orbit(last, next);
            last = next;
            let tilt = cam.pose().tilt();
            assert!(tilt >= c.min_tilt - EPS && tilt <= c.max_tilt + EPS);
            assert!(cam.pose().height() >= c.min_height - EPS);
        }
    }

    #[test]
    fn zoom_scales_by_one_plus_dy() {
        let mut cam = controller();
        assert!(cam.zoom(Vec2::new(0.0, 0.0), Vec2::new(0.0, 0.1)));
        assert_vec_eq(cam.pose().position(), Vec3::new(-1.1, 0.0, 1.1));
    }

    #[test]
    fn zoom_ignores_horizontal_motion() {
        let mut cam = controller();
        assert!(cam.zoom(Vec2::new(0.0, 0.2), Vec2::new(0.7, 0.2)));
        assert_vec_eq(cam.pose().position(), Vec3::new(-1.0, 0.0, 1.0));
    }

    #[test]
    fn zoom_clamps_to_max_distance() {
        let mut cam = controller();
        for _ in 0..40 {
            let _ = cam.zoom(Vec2::ZERO, Vec2::new(0.0, 0.5));
        }
        let c = cam.constraints();
        assert!((cam.pose().distance() - c.max_distance).abs() < EPS);
        assert!(cam.pose().height() >= c.min_height);
    }

    #[test]
    fn zoom_clamps_to_min_distance_along_prior_direction() {
        let mut cam = controller();
        assert!(cam.zoom(Vec2::ZERO, Vec2::new(0.0, -0.99)));
        let c = cam.constraints();
        assert!((cam.pose().distance() - c.min_distance).abs() < EPS);
        let direction = cam.pose().position().normalize();
        assert_vec_eq(direction, Vec3::new(-1.0, 0.0, 1.0).normalize());
    }

    #[test]
    fn zoom_near_ground_respects_height_and_distance() {
        let constraints = CameraConstraints::default();
        let pose = CameraPose::new(Vec3::new(-4.8, 0.0, 0.12), Vec3::ZERO, Vec3::Z);
        let mut cam = CameraController::new(pose, constraints);
        assert!(cam.zoom(Vec2::ZERO, Vec2::new(0.0, 0.5)));
        assert!(cam.pose().height() >= constraints.min_height - EPS);
        assert!(cam.pose().distance() <= constraints.max_distance + EPS);
        assert!(cam.pose().distance() >= constraints.min_distance - EPS);
    }

    #[test]
    fn zoom_without_limits_is_unbounded() {
        let mut cam = controller();
        cam.set_limit_enabled(false);
        for _ in 0..10 {
            let _ = cam.zoom(Vec2::ZERO, Vec2::new(0.0, 0.5));
        }
        assert!(cam.pose().distance() > cam.constraints().max_distance);
    }

    #[test]
    fn zoom_through_focus_is_rejected() {
        let mut cam = controller();
        cam.set_limit_enabled(false);
        let before = *cam.pose();
        assert!(!cam.zoom(Vec2::new(0.0, 1.0), Vec2::new(0.0, -1.0)));
        assert_eq!(*cam.pose(), before);
    }

    #[test]
    fn random_zooms_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut cam = controller();
        let c = *cam.constraints();
        for _ in 0..500 {
            let dy = rng.random_range(-0.6..0.6);
            let _ = cam.zoom(Vec2::ZERO, Vec2::new(0.0, dy));
            let d = cam.pose().distance();
            assert!(d >= c.min_distance - EPS && d <= c.max_distance + EPS);
            assert!(cam.pose().height() >= c.min_height - EPS);
        }
    }
}
