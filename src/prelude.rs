//! # Cairn Prelude
//!
//! One-stop import for typical Cairn applications:
//!
//! ```no_run
//! use cairn::prelude::*;
//!
//! fn main() {
//!     let app = cairn::default();
//!     // register callbacks, then:
//!     app.run();
//! }
//! ```

// Application surface
pub use crate::app::{CairnApp, EngineContext, WindowConfig};
pub use crate::default;

// Graphics types
pub use crate::gfx::buffer::{GpuBuffer, VertexLayout};
pub use crate::gfx::camera::{CameraController, FlyCamera, MoveDir};
pub use crate::gfx::geometry::{cone_vertices, revolve, sphere_vertices, CUBE_VERTICES};
pub use crate::gfx::lighting::{DirLight, Light, LightSet, PointLight, SpotLight};
pub use crate::gfx::model::{Mesh, Model, ModelVertex, TextureKind};
pub use crate::gfx::shader::ShaderProgram;
pub use crate::gfx::texture::{Texture, TextureError};
pub use crate::gfx::transform::{NodeId, TransformArena};

// Math re-exports
pub use cgmath::{Deg, Matrix4, Quaternion, Vector2, Vector3, Vector4};
