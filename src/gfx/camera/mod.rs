pub mod controller;
pub mod fly_camera;

// Re-export main types
pub use controller::CameraController;
pub use fly_camera::{FlyCamera, MoveDir};
