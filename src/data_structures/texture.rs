//! GPU textures for level surfaces.
//!
//! [`Texture`] wraps a WGPU texture with its view and sampler. Level textures are
//! uploaded from decoded images; flat-color and normal-debug surfaces get a 1x1
//! solid texture so every surface binds the same layout.

use image::RgbaImage;

#[derive(Clone, Debug)]
pub struct Texture {
    #[allow(unused)]
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

impl Texture {
    /// Neutral tangent-space normal, used when a surface has no normal map.
    pub const DEFAULT_NORMAL: [u8; 4] = [127, 127, 255, 255];

    /// Upload a decoded image.
    ///
    /// * `is_normal_map` toggles between sRGB (false) and linear (true) color space
    pub fn from_image(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        rgba: &RgbaImage,
        label: Option<&str>,
        is_normal_map: bool,
    ) -> anyhow::Result<Self> {
        let (width, height) = rgba.dimensions();
        if width == 0 || height == 0 {
            anyhow::bail!("Texture {} has no pixels", label.unwrap_or("<unnamed>"));
        }
        let format = if is_normal_map {
            wgpu::TextureFormat::Rgba8Unorm
        } else {
            wgpu::TextureFormat::Rgba8UnormSrgb
        };
        Ok(Self::from_rgba(device, queue, rgba.as_raw(), width, height, label, format))
    }

    /// A 1x1 texture filled with one color.
    pub fn solid_color(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        rgba: [u8; 4],
        label: &str,
    ) -> Self {
        Self::from_rgba(
            device,
            queue,
            &rgba,
            1,
            1,
            Some(label),
            wgpu::TextureFormat::Rgba8Unorm,
        )
    }

    pub fn create_default_normal_map(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        Self::solid_color(device, queue, Self::DEFAULT_NORMAL, "default normal map")
    }

    fn from_rgba(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        data: &[u8],
        width: u32,
        height: u32,
        label: Option<&str>,
        format: wgpu::TextureFormat,
    ) -> Self {
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label,
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
                aspect: wgpu::TextureAspect::All,
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
            },
            data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = create_default_sampler(device);
        Self {
            texture,
            view,
            sampler,
        }
    }
}

/// Convert a linear float color to 8-bit channels.
pub fn color_to_rgba8(color: [f32; 4]) -> [u8; 4] {
    color.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8)
}

pub fn create_default_sampler(device: &wgpu::Device) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        address_mode_u: wgpu::AddressMode::Repeat,
        address_mode_v: wgpu::AddressMode::Repeat,
        address_mode_w: wgpu::AddressMode::Repeat,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        ..Default::default()
    })
}
