//! Vertex/index buffer wrapper
//!
//! [`GpuBuffer`] owns one vertex buffer with an interleaved float attribute
//! layout, and optionally an index buffer. Data is uploaded once at creation;
//! afterwards only explicit sub-range updates are allowed.

use std::ops::Range;

use wgpu::util::DeviceExt;

/// Interleaved float attribute layout, as per-attribute component counts.
///
/// `{3, 3, 2}` means each vertex is 8 floats: position, normal, texcoord.
/// Attribute `i` lands at shader location `i`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VertexLayout {
    attrs: Vec<u32>,
}

impl VertexLayout {
    pub fn new(attrs: &[u32]) -> Self {
        assert!(!attrs.is_empty(), "vertex layout needs at least one attribute");
        assert!(
            attrs.iter().all(|&n| (1..=4).contains(&n)),
            "vertex attributes must have 1 to 4 components, got {:?}",
            attrs
        );
        Self {
            attrs: attrs.to_vec(),
        }
    }

    /// The `{3, 3, 2}` position/normal/texcoord layout used by meshes.
    pub fn position_normal_uv() -> Self {
        Self::new(&[3, 3, 2])
    }

    pub fn floats_per_vertex(&self) -> u32 {
        self.attrs.iter().sum()
    }

    pub fn stride(&self) -> u64 {
        self.floats_per_vertex() as u64 * std::mem::size_of::<f32>() as u64
    }

    /// Number of vertices in `len` floats of data.
    ///
    /// Panics when `len` is not an exact multiple of the layout; a partial
    /// trailing vertex is always a bug in the caller's data.
    pub fn vertex_count_for(&self, len: usize) -> u32 {
        let per_vertex = self.floats_per_vertex() as usize;
        assert!(
            len % per_vertex == 0,
            "vertex data length {} is not a multiple of {} floats per vertex",
            len,
            per_vertex
        );
        (len / per_vertex) as u32
    }

    pub fn attributes(&self) -> Vec<wgpu::VertexAttribute> {
        let mut offset = 0u64;
        self.attrs
            .iter()
            .enumerate()
            .map(|(location, &components)| {
                let format = match components {
                    1 => wgpu::VertexFormat::Float32,
                    2 => wgpu::VertexFormat::Float32x2,
                    3 => wgpu::VertexFormat::Float32x3,
                    _ => wgpu::VertexFormat::Float32x4,
                };
                let attribute = wgpu::VertexAttribute {
                    offset,
                    shader_location: location as u32,
                    format,
                };
                offset += components as u64 * std::mem::size_of::<f32>() as u64;
                attribute
            })
            .collect()
    }
}

/// Device-resident vertex/index storage plus its attribute layout.
pub struct GpuBuffer {
    vertex_buffer: wgpu::Buffer,
    index_buffer: Option<wgpu::Buffer>,
    vertex_count: u32,
    index_count: u32,
    layout: VertexLayout,
}

impl GpuBuffer {
    /// Uploads `vertices` (and `indices`, when given) to the device.
    ///
    /// The vertex data length must be an exact multiple of the layout's
    /// floats per vertex.
    pub fn new(
        device: &wgpu::Device,
        vertices: &[f32],
        layout: VertexLayout,
        indices: Option<&[u32]>,
    ) -> Self {
        let vertex_count = layout.vertex_count_for(vertices.len());

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Vertex Buffer"),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });

        let index_buffer = indices.map(|indices| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Index Buffer"),
                contents: bytemuck::cast_slice(indices),
                usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
            })
        });

        Self {
            vertex_buffer,
            index_buffer,
            vertex_count,
            index_count: indices.map_or(0, |i| i.len() as u32),
            layout,
        }
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    /// Zero means "non-indexed".
    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    pub fn layout(&self) -> &VertexLayout {
        &self.layout
    }

    /// Draws a sub-range of vertices as an unindexed triangle list.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>, vertices: Range<u32>) {
        assert!(
            vertices.end <= self.vertex_count,
            "draw range {:?} exceeds {} vertices",
            vertices,
            self.vertex_count
        );
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.draw(vertices, 0..1);
    }

    /// Draws every vertex as an unindexed triangle list.
    pub fn draw_all(&self, pass: &mut wgpu::RenderPass<'_>) {
        self.draw(pass, 0..self.vertex_count);
    }

    /// Draws the whole buffer as an indexed triangle list.
    pub fn draw_indexed(&self, pass: &mut wgpu::RenderPass<'_>) {
        assert!(self.index_count > 0, "no index data to draw");
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_index_buffer(
            self.index_buffer.as_ref().unwrap().slice(..),
            wgpu::IndexFormat::Uint32,
        );
        pass.draw_indexed(0..self.index_count, 0, 0..1);
    }

    /// Re-uploads a sub-range of vertices, starting at `vertex_offset`.
    pub fn update_vertices(&self, queue: &wgpu::Queue, vertex_offset: u32, data: &[f32]) {
        let count = self.layout.vertex_count_for(data.len());
        assert!(
            vertex_offset + count <= self.vertex_count,
            "vertex update range {}..{} exceeds {} vertices",
            vertex_offset,
            vertex_offset + count,
            self.vertex_count
        );
        queue.write_buffer(
            &self.vertex_buffer,
            vertex_offset as u64 * self.layout.stride(),
            bytemuck::cast_slice(data),
        );
    }

    /// Re-uploads a sub-range of indices, starting at `index_offset`.
    pub fn update_indices(&self, queue: &wgpu::Queue, index_offset: u32, data: &[u32]) {
        let index_buffer = self
            .index_buffer
            .as_ref()
            .expect("buffer was created without index data");
        assert!(
            index_offset + data.len() as u32 <= self.index_count,
            "index update range {}..{} exceeds {} indices",
            index_offset,
            index_offset + data.len() as u32,
            self.index_count
        );
        queue.write_buffer(
            index_buffer,
            index_offset as u64 * std::mem::size_of::<u32>() as u64,
            bytemuck::cast_slice(data),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_counts_vertices() {
        let layout = VertexLayout::position_normal_uv();
        assert_eq!(layout.floats_per_vertex(), 8);
        assert_eq!(layout.vertex_count_for(24), 3);
    }

    #[test]
    #[should_panic(expected = "not a multiple")]
    fn layout_rejects_partial_vertex() {
        VertexLayout::position_normal_uv().vertex_count_for(25);
    }

    #[test]
    fn attributes_are_interleaved() {
        let layout = VertexLayout::new(&[3, 3, 2]);
        let attrs = layout.attributes();
        assert_eq!(attrs.len(), 3);
        assert_eq!(attrs[0].offset, 0);
        assert_eq!(attrs[1].offset, 12);
        assert_eq!(attrs[2].offset, 24);
        assert_eq!(attrs[2].format, wgpu::VertexFormat::Float32x2);
        assert_eq!(layout.stride(), 32);
    }

    #[test]
    #[should_panic(expected = "1 to 4 components")]
    fn layout_rejects_wide_attributes() {
        VertexLayout::new(&[5]);
    }
}
