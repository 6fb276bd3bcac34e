//! # Graphics Module
//!
//! Everything GPU-facing in Cairn: the render engine, shader programs with
//! named uniforms, vertex/index buffers, textures, the fly camera, the
//! transform arena, light kinds and model loading.
//!
//! ## Architecture Overview
//!
//! - **Camera** ([`camera`]) - fly camera with yaw/pitch/fov input adapters
//! - **Transforms** ([`transform`]) - arena of parent-linked transform nodes
//! - **Buffers** ([`buffer`]) - interleaved vertex/index buffer wrapper
//! - **Shaders** ([`shader`], [`uniforms`]) - pipelines with named uniform slots
//! - **Textures** ([`texture`]) - image decode and GPU upload
//! - **Models** ([`model`]) - meshes imported from OBJ/glTF scene files
//! - **Lighting** ([`lighting`]) - directional/point/spot lights
//! - **Geometry** ([`geometry`]) - cube preset and revolution surfaces

pub mod buffer;
pub mod camera;
pub mod geometry;
pub mod lighting;
pub mod model;
pub mod render_engine;
pub mod shader;
pub mod texture;
pub mod transform;
pub mod uniforms;

// Re-export commonly used types
pub use buffer::{GpuBuffer, VertexLayout};
pub use camera::{CameraController, FlyCamera, MoveDir};
pub use lighting::{DirLight, Light, LightSet, PointLight, SpotLight};
pub use model::{Mesh, Model, TextureKind};
pub use render_engine::RenderEngine;
pub use shader::ShaderProgram;
pub use texture::{Texture, TextureError};
pub use transform::{NodeId, TransformArena};
