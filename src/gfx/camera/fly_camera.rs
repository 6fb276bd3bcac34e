use cgmath::{perspective, Deg, EuclideanSpace, InnerSpace, Matrix4, Point3, SquareMatrix, Vector3};

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.5,
    0.0, 0.0, 0.0, 1.0,
);

/// Strafe directions understood by [`FlyCamera::change_pos`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveDir {
    Forward,
    Backward,
    Left,
    Right,
}

/// First-person fly camera.
///
/// Holds position, an up vector and a front vector derived from yaw/pitch,
/// plus the view and projection matrices. The input adapters only mutate
/// camera fields; [`FlyCamera::calc_view`] and [`FlyCamera::calc_projection`]
/// are the explicit per-frame recompute step.
#[derive(Clone, Debug)]
pub struct FlyCamera {
    pub position: Vector3<f32>,
    pub up: Vector3<f32>,
    pub front: Vector3<f32>,
    /// Yaw in degrees; -90 looks down negative Z.
    pub yaw: f32,
    /// Pitch in degrees, clamped to [-89, 89].
    pub pitch: f32,
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub max_fov: f32,
    pub aspect: f32,
    /// Movement speed in units per second for [`FlyCamera::input_move`].
    pub move_speed: f32,
    view: Matrix4<f32>,
    projection: Matrix4<f32>,
}

impl FlyCamera {
    pub const ZNEAR: f32 = 0.1;
    pub const ZFAR: f32 = 500.0;

    pub fn new(aspect: f32, position: Vector3<f32>) -> Self {
        let mut camera = Self {
            position,
            up: Vector3::unit_y(),
            front: -Vector3::unit_z(),
            yaw: -90.0,
            pitch: 0.0,
            fov: 45.0,
            max_fov: 75.0,
            aspect,
            move_speed: 5.0,
            view: Matrix4::identity(),
            projection: Matrix4::identity(),
        };
        camera.calc_view();
        camera.calc_projection();
        camera
    }

    /// Recomputes the view matrix from position/front/up.
    pub fn calc_view(&mut self) {
        let eye = Point3::from_vec(self.position);
        let target = Point3::from_vec(self.position + self.front);
        self.view = Matrix4::look_at_rh(eye, target, self.up);
    }

    /// Recomputes the perspective projection from fov/aspect.
    pub fn calc_projection(&mut self) {
        self.projection =
            OPENGL_TO_WGPU_MATRIX * perspective(Deg(self.fov), self.aspect, Self::ZNEAR, Self::ZFAR);
    }

    pub fn view(&self) -> Matrix4<f32> {
        self.view
    }

    pub fn projection(&self) -> Matrix4<f32> {
        self.projection
    }

    /// Moves the camera `step` units along the given strafe direction.
    pub fn change_pos(&mut self, dir: MoveDir, step: f32) {
        match dir {
            MoveDir::Forward => self.position += self.front * step,
            MoveDir::Backward => self.position -= self.front * step,
            MoveDir::Left => self.position -= self.front.cross(self.up).normalize() * step,
            MoveDir::Right => self.position += self.front.cross(self.up).normalize() * step,
        }
    }

    /// Applies yaw/pitch deltas in degrees and re-derives the front vector.
    ///
    /// Pitch is clamped to [-89, 89] degrees to keep the view matrix away
    /// from the gimbal flip at straight up/down.
    pub fn change_pitch_yaw(&mut self, yaw_delta: f32, pitch_delta: f32) {
        self.yaw += yaw_delta;
        self.pitch = (self.pitch + pitch_delta).clamp(-89.0, 89.0);

        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        self.front = Vector3::new(
            yaw.cos() * pitch.cos(),
            pitch.sin(),
            yaw.sin() * pitch.cos(),
        )
        .normalize();
    }

    pub fn change_fov(&mut self, target_fov: f32) {
        self.fov = target_fov;
    }

    /// Frame-rate independent movement: `dt` seconds at `move_speed`.
    pub fn input_move(&mut self, dir: MoveDir, dt: f32) {
        self.change_pos(dir, self.move_speed * dt);
    }

    /// Scroll-wheel zoom; the field of view stays within [1, max_fov].
    pub fn input_fov(&mut self, scroll: f32) {
        self.fov = (self.fov - scroll * 2.0).clamp(1.0, self.max_fov);
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pitch_clamps_regardless_of_step_count() {
        let mut camera = FlyCamera::new(1.5, Vector3::new(0.0, 0.0, 3.0));
        // +200 degrees total, in uneven steps with sign oscillation
        for delta in [50.0, 80.0, -10.0, 40.0, 40.0] {
            camera.change_pitch_yaw(0.0, delta);
            assert!(camera.pitch <= 89.0);
        }
        assert_eq!(camera.pitch, 89.0);

        for _ in 0..50 {
            camera.change_pitch_yaw(0.0, -10.0);
        }
        assert_eq!(camera.pitch, -89.0);
    }

    #[test]
    fn front_follows_yaw() {
        let mut camera = FlyCamera::new(1.0, Vector3::new(0.0, 0.0, 0.0));
        // default yaw of -90 looks down -Z
        assert!((camera.front.z + 1.0).abs() < 1e-5);
        camera.change_pitch_yaw(90.0, 0.0);
        // yaw 0 looks down +X
        assert!((camera.front.x - 1.0).abs() < 1e-5);
        assert!(camera.front.z.abs() < 1e-5);
    }

    #[test]
    fn fov_input_clamps_to_bounds() {
        let mut camera = FlyCamera::new(1.0, Vector3::new(0.0, 0.0, 0.0));
        for _ in 0..100 {
            camera.input_fov(-3.0);
        }
        assert_eq!(camera.fov, camera.max_fov);
        for _ in 0..100 {
            camera.input_fov(3.0);
        }
        assert_eq!(camera.fov, 1.0);
    }

    #[test]
    fn forward_moves_along_front() {
        let mut camera = FlyCamera::new(1.0, Vector3::new(0.0, 0.0, 3.0));
        camera.input_move(MoveDir::Forward, 0.5);
        assert!((camera.position.z - 0.5).abs() < 1e-5);
    }
}
