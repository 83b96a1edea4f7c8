//! Camera state, projection and the camera uniform.
//!
//! The camera never orbits. Pointer drags rotate the whole scene instead
//! (`scene_rotation`), and zoom works on the vertical field of view, which is
//! clamped to the configured range.

use cgmath::{
    Deg, EuclideanSpace, Matrix4, Point3, Quaternion, Rad, Rotation3, SquareMatrix, Vector2,
    Vector3, Vector4,
};

use crate::{config::ViewerConfig, data_structures::instance::Instance, pick::Ray};

/// cgmath produces OpenGL clip space (z in -1..1), wgpu expects z in 0..1.
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Where `reset` puts the camera back to.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraDefaults {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub fov: Deg<f32>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    fov: Deg<f32>,
    min_fov: Deg<f32>,
    max_fov: Deg<f32>,
    aspect: f32,
    znear: f32,
    zfar: f32,
    /// Accumulated whole-scene rotation in radians: x tilts, y turns.
    scene_rotation: Vector2<f32>,
    projection: Matrix4<f32>,
    defaults: CameraDefaults,
}

impl Camera {
    pub fn new(config: &ViewerConfig, width: u32, height: u32) -> Self {
        let defaults = CameraDefaults {
            position: Point3::from(config.camera_position),
            target: Point3::from(config.camera_target),
            fov: Deg(config.default_fov.clamp(config.min_fov, config.max_fov)),
        };
        let mut camera = Self {
            position: defaults.position,
            target: defaults.target,
            fov: defaults.fov,
            min_fov: Deg(config.min_fov),
            max_fov: Deg(config.max_fov),
            aspect: aspect_of(width, height),
            znear: config.near,
            zfar: config.far,
            scene_rotation: Vector2::new(0.0, 0.0),
            projection: Matrix4::identity(),
            defaults,
        };
        camera.update_projection();
        camera
    }

    pub fn fov(&self) -> Deg<f32> {
        self.fov
    }

    pub fn fov_limits(&self) -> (Deg<f32>, Deg<f32>) {
        (self.min_fov, self.max_fov)
    }

    /// Sets the field of view, clamped to the configured range. Returns the applied value.
    pub fn set_fov(&mut self, fov: Deg<f32>) -> Deg<f32> {
        let clamped = if fov.0.is_nan() {
            self.fov
        } else {
            Deg(fov.0.clamp(self.min_fov.0, self.max_fov.0))
        };
        self.fov = clamped;
        self.update_projection();
        clamped
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    /// Zero-sized surfaces keep the previous aspect ratio.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = aspect_of(width, height);
            self.update_projection();
        }
    }

    pub fn scene_rotation(&self) -> Vector2<f32> {
        self.scene_rotation
    }

    pub fn rotate_scene(&mut self, tilt: f32, turn: f32) {
        self.scene_rotation.x += tilt;
        self.scene_rotation.y += turn;
    }

    /// Transform applied on top of every scene node.
    pub fn scene_transform(&self) -> Instance {
        let rotation: Quaternion<f32> = Quaternion::from_angle_y(Rad(self.scene_rotation.y))
            * Quaternion::from_angle_x(Rad(self.scene_rotation.x));
        Instance {
            rotation,
            ..Instance::new()
        }
    }

    /// Default position, target and FOV, no scene rotation.
    pub fn reset(&mut self) {
        self.position = self.defaults.position;
        self.target = self.defaults.target;
        self.fov = self.defaults.fov;
        self.scene_rotation = Vector2::new(0.0, 0.0);
        self.update_projection();
    }

    pub fn defaults(&self) -> CameraDefaults {
        self.defaults
    }

    pub fn update_projection(&mut self) {
        self.projection = cgmath::perspective(self.fov, self.aspect, self.znear, self.zfar);
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.position, self.target, Vector3::unit_y())
    }

    /// OpenGL-convention projection, as last recomputed.
    pub fn projection_matrix(&self) -> Matrix4<f32> {
        self.projection
    }

    pub fn view_proj(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * self.projection * self.view_matrix()
    }

    /// World-space ray through a pixel of a `width` x `height` surface.
    pub fn screen_ray(&self, x: f32, y: f32, width: u32, height: u32) -> Option<Ray> {
        if width == 0 || height == 0 {
            return None;
        }
        let ndc_x = 2.0 * x / width as f32 - 1.0;
        let ndc_y = 1.0 - 2.0 * y / height as f32;
        let inverse = (self.projection * self.view_matrix()).invert()?;
        let unproject = |z: f32| {
            let p = inverse * Vector4::new(ndc_x, ndc_y, z, 1.0);
            p.truncate() / p.w
        };
        let near = unproject(-1.0);
        let far = unproject(1.0);
        Ray::new(Point3::from_vec(near), far - near)
    }
}

fn aspect_of(width: u32, height: u32) -> f32 {
    if width == 0 || height == 0 {
        1.0
    } else {
        width as f32 / height as f32
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_position: [f32; 4],
    pub view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        Self {
            view_position: [0.0; 4],
            view_proj: Matrix4::identity().into(),
        }
    }

    pub fn update_view_proj(&mut self, camera: &Camera) {
        self.view_position = camera.position.to_homogeneous().into();
        self.view_proj = camera.view_proj().into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use cgmath::InnerSpace;

    use super::*;

    #[test]
    fn fov_is_clamped_on_both_ends() {
        let mut camera = Camera::new(&ViewerConfig::default(), 800, 600);
        assert_eq!(camera.set_fov(Deg(500.0)), Deg(100.0));
        assert_eq!(camera.set_fov(Deg(-20.0)), Deg(10.0));
        assert_eq!(camera.set_fov(Deg(f32::NAN)), Deg(10.0));
    }

    #[test]
    fn reset_restores_defaults() {
        let mut camera = Camera::new(&ViewerConfig::default(), 800, 600);
        camera.rotate_scene(1.0, -2.0);
        camera.set_fov(Deg(30.0));
        camera.position = Point3::new(1.0, 2.0, 3.0);
        camera.reset();
        assert_eq!(camera.fov(), Deg(75.0));
        assert_eq!(camera.scene_rotation(), Vector2::new(0.0, 0.0));
        assert_eq!(camera.position, Point3::new(10.0, 10.0, 10.0));
        assert_eq!(camera.scene_transform(), Instance::new());
    }

    #[test]
    fn centre_ray_points_at_the_target() {
        let camera = Camera::new(&ViewerConfig::default(), 800, 600);
        let ray = camera.screen_ray(400.0, 300.0, 800, 600).unwrap();
        let expected = (camera.target - camera.position).normalize();
        assert_relative_eq!(ray.direction.x, expected.x, epsilon = 1e-4);
        assert_relative_eq!(ray.direction.y, expected.y, epsilon = 1e-4);
        assert_relative_eq!(ray.direction.z, expected.z, epsilon = 1e-4);
    }

    #[test]
    fn zero_sized_resize_keeps_aspect() {
        let mut camera = Camera::new(&ViewerConfig::default(), 800, 400);
        camera.resize(0, 300);
        assert_eq!(camera.aspect(), 2.0);
        camera.resize(300, 300);
        assert_eq!(camera.aspect(), 1.0);
    }
}
