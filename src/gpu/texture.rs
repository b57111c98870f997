//! The sprite texture drawn on every particle quad.
//!
//! Loaded from a PNG/JPEG file, or generated as a soft four-pointed star when
//! no file is given.

use crate::error::RenderError;
use std::path::Path;

/// RGBA8 pixels of the particle sprite.
#[derive(Debug, Clone)]
pub struct SpriteImage {
    /// Raw RGBA pixel data (width * height * 4 bytes).
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl SpriteImage {
    /// Load a sprite from an image file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, RenderError> {
        let img = image::open(path.as_ref())?.into_rgba8();
        let (width, height) = img.dimensions();
        log::info!("loaded sprite {} ({}x{})", path.as_ref().display(), width, height);
        Ok(Self {
            data: img.into_raw(),
            width,
            height,
        })
    }

    /// Procedural star: a radial glow with two thin cross-shaped rays.
    pub fn star(size: u32) -> Self {
        let size = size.max(2);
        let img = image::RgbaImage::from_fn(size, size, |x, y| {
            let half = (size - 1) as f32 / 2.0;
            let u = (x as f32 - half) / half;
            let v = (y as f32 - half) / half;
            let r = (u * u + v * v).sqrt();

            let glow = (1.0 - r).clamp(0.0, 1.0).powi(2);
            let rays = (1.0 - (u.abs() * v.abs()).sqrt() * 6.0).clamp(0.0, 1.0)
                * (1.0 - r).clamp(0.0, 1.0);
            let alpha = glow.max(rays);

            image::Rgba([255, 255, 255, (alpha * 255.0).round() as u8])
        });
        Self {
            width: size,
            height: size,
            data: img.into_raw(),
        }
    }
}

/// GPU-side sprite: texture view plus sampler.
pub struct SpriteTexture {
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

impl SpriteTexture {
    /// Upload an image to the GPU.
    pub fn upload(device: &wgpu::Device, queue: &wgpu::Queue, image: &SpriteImage) -> Self {
        let size = wgpu::Extent3d {
            width: image.width,
            height: image.height,
            depth_or_array_layers: 1,
        };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Sprite Texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
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
            &image.data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * image.width),
                rows_per_image: Some(image.height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Sprite Sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Self { view, sampler }
    }
}
