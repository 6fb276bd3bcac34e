//! Named uniform blocks
//!
//! A [`UniformBlockLayout`] maps string keys to typed byte offsets within one
//! uniform buffer, computed with the same alignment rules WGSL applies to the
//! uniform address space. The layout MUST be declared in the same field order
//! as the matching WGSL struct, or the two will disagree about offsets.
//!
//! [`UniformBlock`] pairs a layout with a CPU staging block and the GPU
//! buffer; setting an unknown key or a wrongly-typed value is a programmer
//! error and panics.

use std::collections::HashMap;

use cgmath::{Matrix4, Vector3, Vector4};

/// Scalar/vector/matrix types a named uniform slot can hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UniformType {
    Bool,
    Int,
    UInt,
    Float,
    Vec3,
    Vec4,
    Mat4,
}

impl UniformType {
    /// Alignment in the WGSL uniform address space.
    fn align(self) -> u32 {
        match self {
            Self::Bool | Self::Int | Self::UInt | Self::Float => 4,
            Self::Vec3 | Self::Vec4 | Self::Mat4 => 16,
        }
    }

    /// Size in bytes; note a vec3 occupies 12, so a scalar may pack into its
    /// tail exactly like WGSL allows.
    fn size(self) -> u32 {
        match self {
            Self::Bool | Self::Int | Self::UInt | Self::Float => 4,
            Self::Vec3 => 12,
            Self::Vec4 => 16,
            Self::Mat4 => 64,
        }
    }
}

/// A typed value for [`UniformBlock::set`].
#[derive(Clone, Copy, Debug)]
pub enum UniformValue {
    Bool(bool),
    Int(i32),
    UInt(u32),
    Float(f32),
    Vec3(Vector3<f32>),
    Vec4(Vector4<f32>),
    Mat4(Matrix4<f32>),
}

impl UniformValue {
    fn ty(&self) -> UniformType {
        match self {
            Self::Bool(_) => UniformType::Bool,
            Self::Int(_) => UniformType::Int,
            Self::UInt(_) => UniformType::UInt,
            Self::Float(_) => UniformType::Float,
            Self::Vec3(_) => UniformType::Vec3,
            Self::Vec4(_) => UniformType::Vec4,
            Self::Mat4(_) => UniformType::Mat4,
        }
    }
}

impl From<bool> for UniformValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}
impl From<i32> for UniformValue {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}
impl From<u32> for UniformValue {
    fn from(v: u32) -> Self {
        Self::UInt(v)
    }
}
impl From<f32> for UniformValue {
    fn from(v: f32) -> Self {
        Self::Float(v)
    }
}
impl From<Vector3<f32>> for UniformValue {
    fn from(v: Vector3<f32>) -> Self {
        Self::Vec3(v)
    }
}
impl From<Vector4<f32>> for UniformValue {
    fn from(v: Vector4<f32>) -> Self {
        Self::Vec4(v)
    }
}
impl From<Matrix4<f32>> for UniformValue {
    fn from(v: Matrix4<f32>) -> Self {
        Self::Mat4(v)
    }
}

/// Builds a [`UniformBlockLayout`] field by field, in WGSL declaration order.
pub struct UniformBlockLayoutBuilder {
    cursor: u32,
    fields: HashMap<String, (u32, UniformType)>,
}

impl UniformBlockLayoutBuilder {
    pub fn new() -> Self {
        Self {
            cursor: 0,
            fields: HashMap::new(),
        }
    }

    /// Registers the next field. The offset follows from everything declared
    /// before it, exactly like the WGSL struct member would.
    pub fn field(mut self, name: &str, ty: UniformType) -> Self {
        let offset = align_to(self.cursor, ty.align());
        let previous = self.fields.insert(name.to_string(), (offset, ty));
        assert!(previous.is_none(), "duplicate uniform key: {}", name);
        self.cursor = offset + ty.size();
        self
    }

    /// Skips `bytes` of explicit padding (a `_pad` member on the WGSL side).
    pub fn pad(mut self, bytes: u32) -> Self {
        self.cursor += bytes;
        self
    }

    /// Rounds the cursor up to a 16-byte boundary, as WGSL does at struct and
    /// array-element boundaries.
    pub fn align16(mut self) -> Self {
        self.cursor = align_to(self.cursor, 16);
        self
    }

    pub fn finish(self) -> UniformBlockLayout {
        UniformBlockLayout {
            size: align_to(self.cursor, 16).max(16),
            fields: self.fields,
        }
    }
}

impl Default for UniformBlockLayoutBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Key -> (offset, type) map for one uniform buffer.
#[derive(Clone, Debug)]
pub struct UniformBlockLayout {
    fields: HashMap<String, (u32, UniformType)>,
    size: u32,
}

impl UniformBlockLayout {
    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn offset_of(&self, key: &str) -> Option<(u32, UniformType)> {
        self.fields.get(key).copied()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }
}

/// One uniform buffer with CPU staging and name-addressed writes.
pub struct UniformBlock {
    layout: UniformBlockLayout,
    staging: Vec<u8>,
    buffer: wgpu::Buffer,
}

impl UniformBlock {
    pub fn new(device: &wgpu::Device, layout: UniformBlockLayout) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("UniformBlock"),
            size: layout.size() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        Self {
            staging: vec![0; layout.size() as usize],
            layout,
            buffer,
        }
    }

    pub fn layout(&self) -> &UniformBlockLayout {
        &self.layout
    }

    /// Writes `value` into the staging block under `key`.
    ///
    /// Panics on an unknown key or a type mismatch; both mean the caller and
    /// the shader disagree about the uniform interface.
    pub fn set(&mut self, key: &str, value: UniformValue) {
        store(&self.layout, &mut self.staging, key, value);
    }

    /// Uploads the staging block to the GPU buffer.
    pub fn flush(&self, queue: &wgpu::Queue) {
        queue.write_buffer(&self.buffer, 0, &self.staging);
    }

    pub fn binding_resource(&self) -> wgpu::BindingResource<'_> {
        self.buffer.as_entire_binding()
    }
}

/// Writes one value into `staging` at the offset `layout` assigns to `key`.
pub(crate) fn store(
    layout: &UniformBlockLayout,
    staging: &mut [u8],
    key: &str,
    value: UniformValue,
) {
    let Some((offset, ty)) = layout.offset_of(key) else {
        panic!("invalid uniform key: {}", key);
    };
    assert!(
        value.ty() == ty,
        "uniform {} holds {:?}, got {:?}",
        key,
        ty,
        value.ty()
    );
    let offset = offset as usize;
    let write = |staging: &mut [u8], bytes: &[u8]| {
        staging[offset..offset + bytes.len()].copy_from_slice(bytes);
    };
    match value {
        UniformValue::Bool(v) => write(staging, bytemuck::bytes_of(&(v as u32))),
        UniformValue::Int(v) => write(staging, bytemuck::bytes_of(&v)),
        UniformValue::UInt(v) => write(staging, bytemuck::bytes_of(&v)),
        UniformValue::Float(v) => write(staging, bytemuck::bytes_of(&v)),
        UniformValue::Vec3(v) => write(staging, bytemuck::bytes_of(&[v.x, v.y, v.z])),
        UniformValue::Vec4(v) => write(staging, bytemuck::bytes_of(&[v.x, v.y, v.z, v.w])),
        UniformValue::Mat4(m) => {
            let columns: [[f32; 4]; 4] = m.into();
            write(staging, bytemuck::bytes_of(&columns))
        }
    }
}

fn align_to(value: u32, align: u32) -> u32 {
    value.div_ceil(align) * align
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> UniformBlockLayout {
        UniformBlockLayoutBuilder::new()
            .field("view", UniformType::Mat4)
            .field("view_pos", UniformType::Vec3)
            .field("shininess", UniformType::Float)
            .field("count", UniformType::Int)
            .field("color", UniformType::Vec4)
            .finish()
    }

    #[test]
    fn offsets_follow_wgsl_uniform_rules() {
        let layout = layout();
        assert_eq!(layout.offset_of("view"), Some((0, UniformType::Mat4)));
        // vec3 aligns to 16 and spans 12 bytes
        assert_eq!(layout.offset_of("view_pos"), Some((64, UniformType::Vec3)));
        // a float packs into the vec3's tail
        assert_eq!(layout.offset_of("shininess"), Some((76, UniformType::Float)));
        assert_eq!(layout.offset_of("count"), Some((80, UniformType::Int)));
        // vec4 re-aligns to 16
        assert_eq!(layout.offset_of("color"), Some((96, UniformType::Vec4)));
        assert_eq!(layout.size(), 112);
    }

    #[test]
    fn pad_and_align_advance_the_cursor() {
        let layout = UniformBlockLayoutBuilder::new()
            .field("a", UniformType::Float)
            .pad(4)
            .field("b", UniformType::Float)
            .align16()
            .field("c", UniformType::Float)
            .finish();
        assert_eq!(layout.offset_of("b"), Some((8, UniformType::Float)));
        assert_eq!(layout.offset_of("c"), Some((16, UniformType::Float)));
    }

    #[test]
    #[should_panic(expected = "duplicate uniform key")]
    fn rejects_duplicate_keys() {
        UniformBlockLayoutBuilder::new()
            .field("x", UniformType::Float)
            .field("x", UniformType::Int);
    }

    #[test]
    fn store_writes_little_endian_floats() {
        let layout = layout();
        let mut staging = vec![0u8; layout.size() as usize];
        store(&layout, &mut staging, "shininess", UniformValue::Float(32.0));
        assert_eq!(&staging[76..80], &32.0f32.to_le_bytes());

        store(
            &layout,
            &mut staging,
            "view_pos",
            UniformValue::Vec3(Vector3::new(1.0, 2.0, 3.0)),
        );
        assert_eq!(&staging[64..68], &1.0f32.to_le_bytes());
        assert_eq!(&staging[72..76], &3.0f32.to_le_bytes());
        // the packed float survives the neighbouring vec3 write
        assert_eq!(&staging[76..80], &32.0f32.to_le_bytes());
    }

    #[test]
    #[should_panic(expected = "invalid uniform key: nope")]
    fn store_rejects_unknown_keys() {
        let layout = layout();
        let mut staging = vec![0u8; layout.size() as usize];
        store(&layout, &mut staging, "nope", UniformValue::Float(1.0));
    }

    #[test]
    #[should_panic(expected = "holds")]
    fn store_rejects_type_mismatch() {
        let layout = layout();
        let mut staging = vec![0u8; layout.size() as usize];
        store(&layout, &mut staging, "count", UniformValue::Float(1.0));
    }
}
