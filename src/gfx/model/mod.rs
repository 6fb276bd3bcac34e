//! Meshes and models
//!
//! A [`Mesh`] is one drawable primitive group: CPU-side vertex/index arrays,
//! references into its model's texture pool, and the GPU resources created
//! by a one-shot upload. A [`Model`] is a flat list of meshes built once
//! from an external scene file, owning a deduplicated texture pool for its
//! whole lifetime.

pub mod importer;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use cgmath::Matrix4;
use wgpu::util::DeviceExt;

use crate::gfx::{
    buffer::{GpuBuffer, VertexLayout},
    shader::ShaderProgram,
    texture::Texture,
};

pub use importer::{ImportError, ImportedScene};

/// Semantic slot a texture feeds into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextureKind {
    Diffuse,
    Specular,
}

/// One interleaved vertex: position, normal, texcoord.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coords: [f32; 2],
}

/// Reinterprets interleaved `{3, 3, 2}` float data as vertices.
pub fn vertices_from_interleaved(data: &[f32]) -> Vec<ModelVertex> {
    VertexLayout::position_normal_uv().vertex_count_for(data.len());
    bytemuck::cast_slice(data).to_vec()
}

struct MeshGpu {
    buffer: GpuBuffer,
    model_buffer: wgpu::Buffer,
    model_bind_group: wgpu::BindGroup,
    material_bind_group: wgpu::BindGroup,
}

/// One drawable primitive group within a model.
pub struct Mesh {
    pub vertices: Vec<ModelVertex>,
    pub indices: Vec<u32>,
    /// (kind, index into the owning model's texture pool).
    pub textures: Vec<(TextureKind, usize)>,
    gpu: Option<MeshGpu>,
}

impl Mesh {
    pub fn new(
        vertices: Vec<ModelVertex>,
        indices: Vec<u32>,
        textures: Vec<(TextureKind, usize)>,
    ) -> Self {
        Self {
            vertices,
            indices,
            textures,
            gpu: None,
        }
    }

    /// A textureless mesh from interleaved `{3, 3, 2}` float data, drawn
    /// unindexed. Handy for the geometry presets.
    pub fn from_interleaved(data: &[f32]) -> Self {
        Self::new(vertices_from_interleaved(data), Vec::new(), Vec::new())
    }

    /// Creates the GPU buffer, the model-matrix uniform and the material
    /// bind group. One-shot: a second call is a programmer error.
    ///
    /// `pool` is the owning model's texture pool; pass `&[]` for meshes
    /// without textures.
    pub fn upload(&mut self, device: &wgpu::Device, shader: &ShaderProgram, pool: &[Texture]) {
        assert!(self.gpu.is_none(), "mesh GPU buffers already created");

        let floats: &[f32] = bytemuck::cast_slice(&self.vertices);
        let buffer = GpuBuffer::new(
            device,
            floats,
            VertexLayout::position_normal_uv(),
            (!self.indices.is_empty()).then_some(&self.indices[..]),
        );

        let identity: [[f32; 4]; 4] = Matrix4::from_scale(1.0f32).into();
        let model_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Model Buffer"),
            contents: bytemuck::cast_slice(&identity),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let model_bind_group = shader.model_bind_group(&model_buffer);

        let diffuse = self
            .textures
            .iter()
            .find(|(kind, _)| *kind == TextureKind::Diffuse)
            .map(|(_, index)| &pool[*index]);
        let specular = self
            .textures
            .iter()
            .find(|(kind, _)| *kind == TextureKind::Specular)
            .map(|(_, index)| &pool[*index]);
        let material_bind_group = shader.material_bind_group(diffuse, specular);

        self.gpu = Some(MeshGpu {
            buffer,
            model_buffer,
            model_bind_group,
            material_bind_group,
        });
    }

    pub fn is_uploaded(&self) -> bool {
        self.gpu.is_some()
    }

    /// Writes this mesh's model matrix; effective for the next submitted
    /// frame.
    pub fn set_model_matrix(&self, queue: &wgpu::Queue, matrix: Matrix4<f32>) {
        let gpu = self.gpu.as_ref().expect("mesh used before upload");
        let columns: [[f32; 4]; 4] = matrix.into();
        queue.write_buffer(&gpu.model_buffer, 0, bytemuck::cast_slice(&columns));
    }

    /// Binds textures by semantic slot and issues this mesh's draw call.
    ///
    /// The shader's unit table is cleared first, so every mesh starts its
    /// own bind cycle.
    pub fn draw(
        &self,
        shader: &mut ShaderProgram,
        pass: &mut wgpu::RenderPass<'_>,
        pool: &[Texture],
    ) {
        let gpu = self.gpu.as_ref().expect("mesh drawn before upload");

        shader.clear_textures();
        let (mut diffuse_count, mut specular_count) = (0usize, 0usize);
        for (kind, index) in &self.textures {
            match kind {
                TextureKind::Diffuse => {
                    shader.bind_texture(
                        &format!("material.diffuse[{}]", diffuse_count),
                        &pool[*index],
                    );
                    diffuse_count += 1;
                }
                TextureKind::Specular => {
                    shader.bind_texture(
                        &format!("material.specular[{}]", specular_count),
                        &pool[*index],
                    );
                    specular_count += 1;
                }
            }
        }

        pass.set_bind_group(1, &gpu.model_bind_group, &[]);
        pass.set_bind_group(2, &gpu.material_bind_group, &[]);
        if gpu.buffer.index_count() > 0 {
            gpu.buffer.draw_indexed(pass);
        } else {
            gpu.buffer.draw_all(pass);
        }
    }
}

/// A collection of meshes parsed from one external scene asset.
///
/// Loading is one-shot by construction: `Model::load` imports, builds and
/// uploads in one step, and the result is immutable afterwards.
pub struct Model {
    meshes: Vec<Mesh>,
    textures: Vec<Texture>,
    path: PathBuf,
}

impl Model {
    /// Imports `path`, decodes each pooled texture once and uploads every
    /// mesh.
    ///
    /// A texture that fails to decode is logged and replaced with the
    /// shader's white fallback; the model itself still loads.
    pub fn load(
        device: &Arc<wgpu::Device>,
        queue: &Arc<wgpu::Queue>,
        shader: &ShaderProgram,
        path: impl AsRef<Path>,
    ) -> Result<Self, ImportError> {
        let path = path.as_ref();
        let scene = importer::import_scene(path)?;
        let plan = importer::plan_textures(&scene);

        let mut textures = Vec::with_capacity(plan.sources.len());
        for (kind, source) in &plan.sources {
            let loaded = match source {
                importer::TextureRef::External(file) => Texture::from_file(device, queue, file),
                importer::TextureRef::Embedded { tag, bytes } => {
                    Texture::from_bytes(device, queue, bytes, tag)
                }
            };
            match loaded {
                Ok(texture) => textures.push(texture),
                Err(err) => {
                    log::warn!("substituting fallback for {:?} texture: {}", kind, err);
                    textures.push(shader.fallback_texture().clone());
                }
            }
        }

        let mut meshes = Vec::with_capacity(scene.primitives.len());
        for (primitive, slots) in scene.primitives.iter().zip(plan.per_primitive) {
            let mut mesh = Mesh::new(primitive.vertices(), primitive.indices.clone(), slots);
            mesh.upload(device, shader, &textures);
            meshes.push(mesh);
        }

        log::info!(
            "loaded model {} ({} meshes, {} pooled textures)",
            path.display(),
            meshes.len(),
            textures.len()
        );
        Ok(Self {
            meshes,
            textures,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    /// The deduplicated texture pool; lives as long as the model.
    pub fn textures(&self) -> &[Texture] {
        &self.textures
    }

    /// Applies one model matrix to every mesh.
    pub fn set_model_matrix(&self, queue: &wgpu::Queue, matrix: Matrix4<f32>) {
        for mesh in &self.meshes {
            mesh.set_model_matrix(queue, matrix);
        }
    }

    /// Draws all meshes with their textures bound by semantic slot.
    pub fn draw(&self, shader: &mut ShaderProgram, pass: &mut wgpu::RenderPass<'_>) {
        for mesh in &self.meshes {
            mesh.draw(shader, pass, &self.textures);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interleaved_data_maps_to_vertices() {
        let data = [
            1.0, 2.0, 3.0, 0.0, 1.0, 0.0, 0.5, 0.5, //
            4.0, 5.0, 6.0, 0.0, 0.0, 1.0, 1.0, 0.0,
        ];
        let vertices = vertices_from_interleaved(&data);
        assert_eq!(vertices.len(), 2);
        assert_eq!(vertices[0].position, [1.0, 2.0, 3.0]);
        assert_eq!(vertices[1].normal, [0.0, 0.0, 1.0]);
        assert_eq!(vertices[1].tex_coords, [1.0, 0.0]);
    }

    #[test]
    #[should_panic(expected = "not a multiple")]
    fn interleaved_data_must_be_whole_vertices() {
        vertices_from_interleaved(&[1.0; 9]);
    }
}
