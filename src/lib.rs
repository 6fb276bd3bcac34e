// src/lib.rs
//! Cairn 3D toy renderer
//!
//! A small 3D rendering toy built on wgpu and winit: loads meshes and
//! textures through external importers, compiles shader programs, and draws
//! them each frame with a fly camera and Phong-style lighting, with a Dear
//! ImGui debug overlay on top.

pub mod app;
pub mod gfx;
pub mod prelude;
pub mod ui;

// Re-export main types for convenience
pub use app::{CairnApp, WindowConfig};

/// Creates a Cairn application with default window settings
pub fn default() -> CairnApp {
    CairnApp::new(WindowConfig::default())
}
