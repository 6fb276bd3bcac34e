//! Texture decode and upload
//!
//! Textures are decoded with the `image` crate from a file or an in-memory
//! encoded buffer, with the channel format inferred from the decoded color
//! type. A failed load is an ordinary `Err` the caller can substitute or
//! abort on; nothing in here terminates the process.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use image::GenericImageView;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TextureError {
    #[error("failed to read image file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to decode image {name}: {source}")]
    Decode {
        name: String,
        source: image::ImageError,
    },
    #[error("unsupported channel count {channels} in image {name}")]
    UnsupportedChannels { name: String, channels: u8 },
}

/// Where a texture's pixels came from; used to deduplicate pool entries.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TextureSource {
    File(PathBuf),
    Memory(String),
}

/// One GPU texture image with its view and sampler.
///
/// Carries a process-unique id so binding tables and pools can compare
/// textures without touching GPU handles. Cloning shares the underlying
/// GPU resources and the id.
#[derive(Clone)]
pub struct Texture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
    id: u64,
    source: TextureSource,
}

static NEXT_TEXTURE_ID: AtomicU64 = AtomicU64::new(1);

impl Texture {
    /// Reads and decodes an image file.
    pub fn from_file(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        path: impl AsRef<Path>,
    ) -> Result<Self, TextureError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| TextureError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::decode(
            device,
            queue,
            &bytes,
            TextureSource::File(path.to_path_buf()),
            &path.display().to_string(),
        )
    }

    /// Decodes an already-encoded image held in memory (e.g. a blob embedded
    /// in a scene file). `tag` identifies the blob for logging and dedup.
    pub fn from_bytes(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        bytes: &[u8],
        tag: &str,
    ) -> Result<Self, TextureError> {
        Self::decode(
            device,
            queue,
            bytes,
            TextureSource::Memory(tag.to_string()),
            tag,
        )
    }

    /// A 1x1 texture of one color, used as the stand-in for missing material
    /// slots.
    pub fn solid_color(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        rgba: [u8; 4],
        tag: &str,
    ) -> Self {
        Self::upload(
            device,
            queue,
            wgpu::TextureFormat::Rgba8UnormSrgb,
            &rgba,
            1,
            1,
            4,
            TextureSource::Memory(tag.to_string()),
        )
    }

    fn decode(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        bytes: &[u8],
        source: TextureSource,
        name: &str,
    ) -> Result<Self, TextureError> {
        let img = image::load_from_memory(bytes).map_err(|source| TextureError::Decode {
            name: name.to_string(),
            source,
        })?;
        let (width, height) = img.dimensions();
        let channels = img.color().channel_count();

        // 1 channel stays single-channel; 3 channels upload as RGBA with an
        // opaque alpha since devices have no 24-bit format.
        let (format, data, bytes_per_pixel) = match channels {
            1 => (
                wgpu::TextureFormat::R8Unorm,
                img.to_luma8().into_raw(),
                1u32,
            ),
            3 | 4 => (
                wgpu::TextureFormat::Rgba8UnormSrgb,
                img.to_rgba8().into_raw(),
                4u32,
            ),
            channels => {
                return Err(TextureError::UnsupportedChannels {
                    name: name.to_string(),
                    channels,
                })
            }
        };

        log::info!(
            "loaded texture {} ({}x{}, {} channels)",
            name,
            width,
            height,
            channels
        );
        Ok(Self::upload(
            device,
            queue,
            format,
            &data,
            width,
            height,
            bytes_per_pixel,
            source,
        ))
    }

    #[allow(clippy::too_many_arguments)]
    fn upload(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        format: wgpu::TextureFormat,
        data: &[u8],
        width: u32,
        height: u32,
        bytes_per_pixel: u32,
        source: TextureSource,
    ) -> Self {
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_pixel * width),
                rows_per_image: Some(height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Texture Sampler"),
            address_mode_u: wgpu::AddressMode::MirrorRepeat,
            address_mode_v: wgpu::AddressMode::MirrorRepeat,
            address_mode_w: wgpu::AddressMode::MirrorRepeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
            id: NEXT_TEXTURE_ID.fetch_add(1, Ordering::Relaxed),
            source,
        }
    }

    /// Process-unique id; clones share it.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn source(&self) -> &TextureSource {
        &self.source
    }
}
