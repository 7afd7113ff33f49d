//! Viewing transforms and the window/world conversions used by mouse input.

use glam::{Mat4, Vec2, Vec3, Vec4, Vec4Swizzles};

/// Window rectangle, `(x, y, width, height)` in pixels.
pub type Viewport = Vec4;

/// Projects an object space point through `mvp` into window coordinates.
/// The returned `z` and `w` are the normalized depth and `1`.
pub fn project(point: Vec3, mvp: Mat4, viewport: Viewport) -> Vec4 {
    let clip = mvp * point.extend(1.0);
    let mut ndc = clip / clip.w;
    ndc.x = (0.5 * ndc.x + 0.5) * viewport.z + viewport.x;
    ndc.y = (0.5 * ndc.y + 0.5) * viewport.w + viewport.y;
    ndc
}

/// Inverse of [`project`]: takes a window coordinate with depth back into
/// object space.
///
/// Returns `None` when `mvp` has no inverse.
pub fn unproject(window: Vec3, mvp: Mat4, viewport: Viewport) -> Option<Vec3> {
    let determinant = mvp.determinant();
    if determinant == 0.0 || !determinant.is_finite() {
        return None;
    }
    let ndc = Vec4::new(
        2.0 * (window.x - viewport.x) / viewport.z - 1.0,
        2.0 * (window.y - viewport.y) / viewport.w - 1.0,
        window.z,
        1.0,
    );
    let object = mvp.inverse() * ndc;
    Some(object.xyz() / object.w)
}

/// Object space vector that appears as the window space offset `window`
/// when drawn from the object origin.
pub fn unproject_vector(window: Vec3, mvp: Mat4, viewport: Viewport) -> Option<Vec3> {
    let origin = project(Vec3::ZERO, mvp, viewport);
    unproject(origin.xyz() + window, mvp, viewport)
}

/// Perspective camera orbited and panned by mouse drags.
///
/// The view is `T(position) * R`: the scene is rotated by the accumulated
/// drag rotation and then pushed in front of the camera.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct OrbitCamera {
    pub fovy_degrees: f32,
    pub position: Vec3,
    pub near: f32,
    pub far: f32,
    pub rotation: Mat4,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            fovy_degrees: 45.0,
            position: Vec3::new(-0.2, -0.5, -4.0),
            near: 0.1,
            far: 100.0,
            rotation: Mat4::IDENTITY,
        }
    }
}

impl OrbitCamera {
    pub const MIN_DISTANCE: f32 = 1.0;
    pub const MAX_DISTANCE: f32 = 50.0;
    /// Distance change per wheel unit.
    pub const ZOOM_SPEED: f32 = 0.01;
    /// Rotation in degrees per squared pixel of drag.
    pub const ROTATE_SPEED: f32 = 0.1;

    pub fn projection(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fovy_degrees.to_radians(), aspect, self.near, self.far)
    }

    pub fn view(&self) -> Mat4 {
        Mat4::from_translation(self.position) * self.rotation
    }

    pub fn view_projection(&self, aspect: f32) -> Mat4 {
        self.projection(aspect) * self.view()
    }

    /// Moves the camera along its view axis, keeping the distance within
    /// [`Self::MIN_DISTANCE`] and [`Self::MAX_DISTANCE`].
    pub fn zoom(&mut self, wheel_delta: f32) {
        let distance = (-self.position.z + wheel_delta * Self::ZOOM_SPEED).clamp(Self::MIN_DISTANCE, Self::MAX_DISTANCE);
        self.position.z = -distance;
    }

    /// Rotates the scene by a mouse drag of `drag` pixels. The angle grows with
    /// the square of the drag length.
    pub fn rotate(&mut self, drag: Vec2, viewport: Viewport) {
        let mvp = self.view_projection(viewport.z / viewport.w);
        let Some(axis) = unproject_vector(Vec3::new(drag.y, drag.x, 0.0), mvp, viewport) else {
            return;
        };
        let Some(axis) = axis.try_normalize() else {
            return;
        };
        let angle = (drag.length_squared() * Self::ROTATE_SPEED).to_radians();
        self.rotation *= Mat4::from_axis_angle(axis, angle);
    }

    /// Slides the camera by a mouse drag of `drag` pixels.
    pub fn pan(&mut self, drag: Vec2, viewport: Viewport) {
        let mvp = self.view_projection(viewport.z / viewport.w);
        if let Some(by) = unproject_vector(Vec3::new(drag.x, -drag.y, 0.0), mvp, viewport) {
            self.position += self.rotation.transform_point3(by);
        }
    }
}

/// Fixed orthographic camera looking at a target.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct OrthographicCamera {
    pub eye: Vec3,
    pub target: Vec3,
    /// Half of the visible height in world units.
    pub half_height: f32,
    pub near: f32,
    pub far: f32,
}

impl OrthographicCamera {
    pub fn view_projection(&self, aspect: f32) -> Mat4 {
        let half_width = self.half_height * aspect;
        let projection = Mat4::orthographic_rh(
            -half_width,
            half_width,
            -self.half_height,
            self.half_height,
            self.near,
            self.far,
        );
        projection * Mat4::look_at_rh(self.eye, self.target, Vec3::Y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWPORT: Viewport = Vec4::new(0.0, 0.0, 800.0, 600.0);

    #[test]
    fn project_then_unproject() {
        let mvp = OrbitCamera::default().view_projection(800.0 / 600.0);
        for point in [Vec3::ZERO, Vec3::new(0.5, -0.3, 1.0), Vec3::new(-1.0, 1.0, -2.0)] {
            let window = project(point, mvp, VIEWPORT);
            let back = unproject(window.xyz(), mvp, VIEWPORT).unwrap();
            assert!((back - point).length() < 1e-3, "{point} -> {window} -> {back}");
        }
    }

    #[test]
    fn origin_projects_off_centre() {
        // The default position shifts the scene left and down.
        let mvp = OrbitCamera::default().view_projection(1.0);
        let window = project(Vec3::ZERO, mvp, Vec4::new(0.0, 0.0, 100.0, 100.0));
        assert!(window.x < 50.0 && window.y < 50.0);
        assert!(window.z > 0.0 && window.z < 1.0);
    }

    #[test]
    fn unproject_vector_is_an_offset_from_the_origin() {
        let mvp = OrbitCamera::default().view_projection(800.0 / 600.0);
        let v = unproject_vector(Vec3::new(10.0, 0.0, 0.0), mvp, VIEWPORT).unwrap();
        assert!(v.x > 0.0);
        assert!(v.y.abs() < 1e-3);
    }

    #[test]
    fn singular_matrices_do_not_unproject() {
        assert_eq!(unproject(Vec3::ONE, Mat4::ZERO, VIEWPORT), None);
    }

    #[test]
    fn zoom_is_clamped() {
        let mut camera = OrbitCamera::default();
        camera.zoom(100.0);
        assert!((camera.position.z + 5.0).abs() < 1e-6);
        camera.zoom(1e6);
        assert_eq!(camera.position.z, -50.0);
        camera.zoom(-1e6);
        assert_eq!(camera.position.z, -1.0);
    }

    #[test]
    fn drags_rotate_and_pan() {
        let mut camera = OrbitCamera::default();
        camera.rotate(Vec2::new(5.0, 0.0), VIEWPORT);
        assert_ne!(camera.rotation, Mat4::IDENTITY);
        // 25 px² of drag at 0.1 degrees each.
        let angle = camera.rotation.transform_vector3(Vec3::Z).angle_between(Vec3::Z);
        assert!(angle <= 2.5f32.to_radians() + 1e-5);

        let mut camera = OrbitCamera::default();
        camera.rotate(Vec2::ZERO, VIEWPORT);
        assert_eq!(camera.rotation, Mat4::IDENTITY);

        camera.pan(Vec2::new(20.0, 0.0), VIEWPORT);
        assert!(camera.position.x > -0.2);
        assert!((camera.position.z + 4.0).abs() < 1e-4);
    }

    #[test]
    fn orthographic_camera_looks_at_its_target() {
        let camera = OrthographicCamera {
            eye: Vec3::new(0.0, 10.0, 20.0),
            target: Vec3::new(0.0, 5.0, 0.0),
            half_height: 10.0,
            near: 0.1,
            far: 100.0,
        };
        let clip = camera.view_projection(1.5) * camera.target.extend(1.0);
        assert!(clip.x.abs() < 1e-5 && clip.y.abs() < 1e-5);
        assert!(clip.z > 0.0 && clip.z < 1.0);
    }
}
