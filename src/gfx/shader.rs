//! Shader programs
//!
//! A [`ShaderProgram`] owns one render pipeline plus the frame uniform block
//! addressed by string keys, and manages per-frame texture unit assignment.
//! WGSL validation failures are fatal: a broken shader leaves nothing to
//! render, so the process logs the diagnostic and exits.

use std::path::Path;
use std::sync::Arc;

use crate::gfx::{
    buffer::VertexLayout,
    camera::FlyCamera,
    texture::Texture,
    uniforms::{
        UniformBlock, UniformBlockLayout, UniformBlockLayoutBuilder, UniformType, UniformValue,
    },
};

/// Texture units available within one bind cycle.
pub const MAX_BOUND_TEXTURES: usize = 16;

/// Material sampler slots per semantic kind (`material.diffuse[0..4]`).
pub const MAX_MATERIAL_MAPS: usize = 4;

/// Built-in Phong shader; pair it with [`phong_frame_layout`].
pub const PHONG_SHADER: &str = include_str!("shader.wgsl");

/// Per-frame map from texture id to texture unit.
///
/// Re-binding a texture already in the table returns its existing unit
/// instead of burning a new one; the table must be cleared at the start of
/// each bind cycle or stale units leak across frames.
#[derive(Default)]
pub(crate) struct TextureBindingTable {
    units: Vec<u64>,
}

impl TextureBindingTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn assign(&mut self, texture_id: u64) -> u32 {
        if let Some(unit) = self.units.iter().position(|&id| id == texture_id) {
            return unit as u32;
        }
        assert!(
            self.units.len() < MAX_BOUND_TEXTURES,
            "too many textures bound (limit {})",
            MAX_BOUND_TEXTURES
        );
        self.units.push(texture_id);
        (self.units.len() - 1) as u32
    }

    pub(crate) fn clear(&mut self) {
        self.units.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.units.len()
    }
}

/// The frame uniform block matching the built-in Phong shader.
///
/// Field order mirrors `FrameUniforms` in `shader.wgsl`; the two must not
/// drift apart.
pub fn phong_frame_layout() -> UniformBlockLayout {
    let mut builder = UniformBlockLayoutBuilder::new()
        .field("view", UniformType::Mat4)
        .field("projection", UniformType::Mat4)
        .field("view_pos", UniformType::Vec3)
        .field("material.shininess", UniformType::Float)
        .field("dir_light_num", UniformType::Int)
        .field("point_light_num", UniformType::Int)
        .field("spot_light_num", UniformType::Int)
        .pad(4);

    for i in 0..crate::gfx::lighting::MAX_LIGHTS_PER_KIND {
        builder = builder
            .field(&format!("lights_dir[{}].direction", i), UniformType::Vec3)
            .pad(4)
            .field(&format!("lights_dir[{}].ambient", i), UniformType::Vec3)
            .pad(4)
            .field(&format!("lights_dir[{}].diffuse", i), UniformType::Vec3)
            .pad(4)
            .field(&format!("lights_dir[{}].specular", i), UniformType::Vec3)
            .pad(4);
    }
    for i in 0..crate::gfx::lighting::MAX_LIGHTS_PER_KIND {
        builder = builder
            .field(&format!("lights_point[{}].position", i), UniformType::Vec3)
            .field(&format!("lights_point[{}].constant", i), UniformType::Float)
            .field(&format!("lights_point[{}].ambient", i), UniformType::Vec3)
            .field(&format!("lights_point[{}].linear", i), UniformType::Float)
            .field(&format!("lights_point[{}].diffuse", i), UniformType::Vec3)
            .field(&format!("lights_point[{}].quadratic", i), UniformType::Float)
            .field(&format!("lights_point[{}].specular", i), UniformType::Vec3)
            .pad(4);
    }
    for i in 0..crate::gfx::lighting::MAX_LIGHTS_PER_KIND {
        builder = builder
            .field(&format!("lights_spot[{}].position", i), UniformType::Vec3)
            .field(&format!("lights_spot[{}].cutoff", i), UniformType::Float)
            .field(&format!("lights_spot[{}].direction", i), UniformType::Vec3)
            .field(&format!("lights_spot[{}].cutoff_outer", i), UniformType::Float)
            .field(&format!("lights_spot[{}].ambient", i), UniformType::Vec3)
            .field(&format!("lights_spot[{}].constant", i), UniformType::Float)
            .field(&format!("lights_spot[{}].diffuse", i), UniformType::Vec3)
            .field(&format!("lights_spot[{}].linear", i), UniformType::Float)
            .field(&format!("lights_spot[{}].specular", i), UniformType::Vec3)
            .field(&format!("lights_spot[{}].quadratic", i), UniformType::Float);
    }
    for i in 0..MAX_MATERIAL_MAPS {
        builder = builder.field(&format!("material.diffuse[{}]", i), UniformType::Int);
    }
    for i in 0..MAX_MATERIAL_MAPS {
        builder = builder.field(&format!("material.specular[{}]", i), UniformType::Int);
    }
    builder.finish()
}

/// Compiled/linked GPU program with named uniform and texture-bind access.
pub struct ShaderProgram {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    pipeline: wgpu::RenderPipeline,
    frame_block: UniformBlock,
    frame_bind_group: wgpu::BindGroup,
    model_layout: wgpu::BindGroupLayout,
    material_layout: wgpu::BindGroupLayout,
    binding: TextureBindingTable,
    fallback: Texture,
    view_key: String,
    projection_key: String,
    model_key: String,
}

impl ShaderProgram {
    /// Builds the built-in Phong program.
    pub fn phong(
        device: &Arc<wgpu::Device>,
        queue: &Arc<wgpu::Queue>,
        surface_format: wgpu::TextureFormat,
    ) -> Self {
        Self::from_source(
            device,
            queue,
            surface_format,
            PHONG_SHADER,
            PHONG_SHADER,
            &VertexLayout::position_normal_uv(),
            phong_frame_layout(),
            "view",
            "projection",
            "model",
        )
    }

    /// Reads vertex and fragment WGSL from two files.
    ///
    /// A missing file is fatal, like a compile failure: the renderer is
    /// unusable without its shaders.
    #[allow(clippy::too_many_arguments)]
    pub fn from_files(
        device: &Arc<wgpu::Device>,
        queue: &Arc<wgpu::Queue>,
        surface_format: wgpu::TextureFormat,
        vertex_path: impl AsRef<Path>,
        fragment_path: impl AsRef<Path>,
        vertex_layout: &VertexLayout,
        frame_layout: UniformBlockLayout,
        view_key: &str,
        projection_key: &str,
        model_key: &str,
    ) -> Self {
        let read = |path: &Path| match std::fs::read_to_string(path) {
            Ok(source) => source,
            Err(err) => {
                log::error!("failed to read shader file {}: {}", path.display(), err);
                std::process::exit(1);
            }
        };
        let vertex_src = read(vertex_path.as_ref());
        let fragment_src = read(fragment_path.as_ref());
        Self::from_source(
            device,
            queue,
            surface_format,
            &vertex_src,
            &fragment_src,
            vertex_layout,
            frame_layout,
            view_key,
            projection_key,
            model_key,
        )
    }

    /// Builds a program from in-memory WGSL sources.
    ///
    /// `vertex_src` must expose `vs_main`, `fragment_src` must expose
    /// `fs_main`; passing the same string twice compiles a single module
    /// with both entry points. The frame layout must declare the view and
    /// projection keys as mat4 slots.
    #[allow(clippy::too_many_arguments)]
    pub fn from_source(
        device: &Arc<wgpu::Device>,
        queue: &Arc<wgpu::Queue>,
        surface_format: wgpu::TextureFormat,
        vertex_src: &str,
        fragment_src: &str,
        vertex_layout: &VertexLayout,
        frame_layout: UniformBlockLayout,
        view_key: &str,
        projection_key: &str,
        model_key: &str,
    ) -> Self {
        for key in [view_key, projection_key] {
            match frame_layout.offset_of(key) {
                Some((_, UniformType::Mat4)) => {}
                other => panic!(
                    "frame layout must declare {} as a mat4, found {:?}",
                    key, other
                ),
            }
        }

        let vertex_module = compile_module(device, vertex_src, "vertex shader");
        let fragment_module = if fragment_src == vertex_src {
            None
        } else {
            Some(compile_module(device, fragment_src, "fragment shader"))
        };

        let frame_layout_desc =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Frame Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let model_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Model Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let material_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Material Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Shader Pipeline Layout"),
            bind_group_layouts: &[&frame_layout_desc, &model_layout, &material_layout],
            push_constant_ranges: &[],
        });

        let attributes = vertex_layout.attributes();
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Shader Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &vertex_module,
                entry_point: Some("vs_main"),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: vertex_layout.stride(),
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &attributes,
                }],
                compilation_options: Default::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
                unclipped_depth: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: wgpu::TextureFormat::Depth32Float,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            fragment: Some(wgpu::FragmentState {
                module: fragment_module.as_ref().unwrap_or(&vertex_module),
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            multiview: None,
            cache: None,
        });

        let frame_block = UniformBlock::new(device, frame_layout);
        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Frame Bind Group"),
            layout: &frame_layout_desc,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_block.binding_resource(),
            }],
        });

        let fallback = Texture::solid_color(device, queue, [255, 255, 255, 255], "fallback-white");

        Self {
            device: device.clone(),
            queue: queue.clone(),
            pipeline,
            frame_block,
            frame_bind_group,
            model_layout,
            material_layout,
            binding: TextureBindingTable::new(),
            fallback,
            view_key: view_key.to_string(),
            projection_key: projection_key.to_string(),
            model_key: model_key.to_string(),
        }
    }

    /// Writes a typed value into the named frame uniform.
    ///
    /// Panics on an unknown key or type mismatch.
    pub fn set_uniform(&mut self, key: &str, value: impl Into<UniformValue>) {
        self.frame_block.set(key, value.into());
    }

    /// Writes the view and projection matrices under this program's fixed
    /// keys, plus the eye position when the layout declares `view_pos`.
    pub fn update_camera(&mut self, camera: &FlyCamera) {
        let view_key = self.view_key.clone();
        let projection_key = self.projection_key.clone();
        self.set_uniform(&view_key, camera.view());
        self.set_uniform(&projection_key, camera.projection());
        if self.frame_block.layout().contains("view_pos") {
            self.set_uniform("view_pos", camera.position);
        }
    }

    /// Assigns `texture` a unit for this frame and writes the unit index
    /// into the named int uniform.
    ///
    /// Binding the same texture again returns the unit it already holds;
    /// running out of the 16 units is a programmer error.
    pub fn bind_texture(&mut self, key: &str, texture: &Texture) -> u32 {
        let unit = self.binding.assign(texture.id());
        self.frame_block.set(key, UniformValue::Int(unit as i32));
        unit
    }

    /// Resets the per-frame unit table. Call once at the start of each bind
    /// cycle, before the first `bind_texture`.
    pub fn clear_textures(&mut self) {
        self.binding.clear();
    }

    pub fn bound_texture_count(&self) -> usize {
        self.binding.len()
    }

    /// Uploads the staged frame uniforms to the GPU.
    pub fn flush_uniforms(&self) {
        self.frame_block.flush(&self.queue);
    }

    /// Sets the pipeline and the frame bind group on a pass.
    pub fn bind(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.frame_bind_group, &[]);
    }

    pub fn model_key(&self) -> &str {
        &self.model_key
    }

    pub fn fallback_texture(&self) -> &Texture {
        &self.fallback
    }

    /// Bind group for one object's model-matrix uniform buffer.
    pub fn model_bind_group(&self, model_buffer: &wgpu::Buffer) -> wgpu::BindGroup {
        self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Model Bind Group"),
            layout: &self.model_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: model_buffer.as_entire_binding(),
            }],
        })
    }

    /// Bind group for a mesh's material textures; missing slots fall back
    /// to the built-in white texture.
    pub fn material_bind_group(
        &self,
        diffuse: Option<&Texture>,
        specular: Option<&Texture>,
    ) -> wgpu::BindGroup {
        let diffuse = diffuse.unwrap_or(&self.fallback);
        let specular = specular.unwrap_or(&self.fallback);
        self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Material Bind Group"),
            layout: &self.material_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&diffuse.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&diffuse.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&specular.view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(&specular.sampler),
                },
            ],
        })
    }
}

/// Compiles one WGSL module; validation failure terminates the process
/// after printing the diagnostic.
fn compile_module(device: &wgpu::Device, source: &str, label: &str) -> wgpu::ShaderModule {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });
    if let Some(err) = pollster::block_on(device.pop_error_scope()) {
        log::error!("{} failed to compile: {}", label, err);
        std::process::exit(1);
    }
    module
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rebinding_a_texture_reuses_its_unit() {
        let mut table = TextureBindingTable::new();
        let first = table.assign(7);
        let second = table.assign(9);
        assert_eq!(first, 0);
        assert_eq!(second, 1);
        // same texture again: same unit, no growth
        assert_eq!(table.assign(7), first);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn clear_releases_all_units() {
        let mut table = TextureBindingTable::new();
        table.assign(1);
        table.assign(2);
        table.clear();
        assert_eq!(table.len(), 0);
        assert_eq!(table.assign(3), 0);
    }

    #[test]
    fn sixteen_distinct_textures_fit() {
        let mut table = TextureBindingTable::new();
        for id in 0..16 {
            assert_eq!(table.assign(id), id as u32);
        }
    }

    #[test]
    #[should_panic(expected = "too many textures bound")]
    fn seventeenth_texture_panics() {
        let mut table = TextureBindingTable::new();
        for id in 0..17 {
            table.assign(id);
        }
    }

    #[test]
    fn phong_layout_matches_wgsl_offsets() {
        let layout = phong_frame_layout();
        assert_eq!(layout.offset_of("view").unwrap().0, 0);
        assert_eq!(layout.offset_of("projection").unwrap().0, 64);
        assert_eq!(layout.offset_of("view_pos").unwrap().0, 128);
        assert_eq!(layout.offset_of("material.shininess").unwrap().0, 140);
        assert_eq!(layout.offset_of("dir_light_num").unwrap().0, 144);
        assert_eq!(layout.offset_of("spot_light_num").unwrap().0, 152);
        // array<DirLight, 4> starts at 160, stride 64
        assert_eq!(layout.offset_of("lights_dir[0].direction").unwrap().0, 160);
        assert_eq!(layout.offset_of("lights_dir[3].specular").unwrap().0, 160 + 3 * 64 + 48);
        // array<PointLight, 4> starts at 416, stride 64
        assert_eq!(layout.offset_of("lights_point[0].position").unwrap().0, 416);
        assert_eq!(layout.offset_of("lights_point[0].quadratic").unwrap().0, 416 + 44);
        // array<SpotLight, 4> starts at 672, stride 80
        assert_eq!(layout.offset_of("lights_spot[0].position").unwrap().0, 672);
        assert_eq!(layout.offset_of("lights_spot[3].quadratic").unwrap().0, 672 + 3 * 80 + 76);
        // material unit vectors close out the block
        assert_eq!(layout.offset_of("material.diffuse[0]").unwrap().0, 992);
        assert_eq!(layout.offset_of("material.specular[3]").unwrap().0, 1020);
        assert_eq!(layout.size(), 1024);
    }
}
