//! # Debug UI Module
//!
//! Dear ImGui overlay support: one [`UiManager`] owns the imgui context,
//! the winit platform glue and the wgpu renderer. The app feeds it input
//! events and calls [`UiManager::draw`] once per frame after the scene pass.

pub mod manager;

pub use manager::UiManager;
