use super::fly_camera::FlyCamera;

/// Turns raw cursor/scroll input into camera state changes.
///
/// Keeps the previous cursor position so absolute cursor coordinates become
/// deltas; the first sample only establishes the anchor and moves nothing.
pub struct CameraController {
    /// Degrees of yaw/pitch per cursor pixel.
    pub sensitivity: f32,
    /// When false, cursor motion is ignored (Escape toggles this).
    pub look_enabled: bool,
    last_cursor: Option<(f64, f64)>,
}

impl CameraController {
    pub fn new(sensitivity: f32) -> Self {
        Self {
            sensitivity,
            look_enabled: true,
            last_cursor: None,
        }
    }

    /// Feeds an absolute cursor position, rotating the camera by the delta
    /// from the previous one.
    pub fn handle_cursor(&mut self, camera: &mut FlyCamera, x: f64, y: f64) {
        let Some((last_x, last_y)) = self.last_cursor.replace((x, y)) else {
            return;
        };
        if !self.look_enabled {
            return;
        }
        let yaw_delta = (x - last_x) as f32 * self.sensitivity;
        // window y grows downward, pitch grows upward
        let pitch_delta = (last_y - y) as f32 * self.sensitivity;
        camera.change_pitch_yaw(yaw_delta, pitch_delta);
    }

    /// Feeds a scroll amount into the camera's field of view.
    pub fn handle_scroll(&mut self, camera: &mut FlyCamera, amount: f32) {
        camera.input_fov(amount);
    }

    pub fn toggle_look(&mut self) {
        self.look_enabled = !self.look_enabled;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Vector3;

    #[test]
    fn first_cursor_sample_only_anchors() {
        let mut controller = CameraController::new(0.05);
        let mut camera = FlyCamera::new(1.0, Vector3::new(0.0, 0.0, 0.0));
        let before = (camera.yaw, camera.pitch);
        controller.handle_cursor(&mut camera, 400.0, 300.0);
        assert_eq!((camera.yaw, camera.pitch), before);

        controller.handle_cursor(&mut camera, 500.0, 300.0);
        assert!((camera.yaw - (before.0 + 100.0 * 0.05)).abs() < 1e-5);
    }

    #[test]
    fn disabled_look_ignores_motion() {
        let mut controller = CameraController::new(0.05);
        let mut camera = FlyCamera::new(1.0, Vector3::new(0.0, 0.0, 0.0));
        controller.handle_cursor(&mut camera, 0.0, 0.0);
        controller.toggle_look();
        controller.handle_cursor(&mut camera, 100.0, 50.0);
        assert_eq!(camera.yaw, -90.0);
        assert_eq!(camera.pitch, 0.0);
    }
}
