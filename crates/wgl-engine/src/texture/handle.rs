use anyhow::{bail, Result};
use image::RgbaImage;

use super::decode::{mip_chain, ImageRequest, RequestState, TextureSource};
use super::policy::SamplingPolicy;

/// Opaque blue. Bound until (and unless) the real image arrives.
pub const PLACEHOLDER_PIXEL: [u8; 4] = [0, 0, 255, 255];

/// Storage format of every texture created here.
pub const TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct LoadOptions {
    /// Flip rows on decode so row 0 is the bottom of the image.
    pub flip_y: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self { flip_y: true }
    }
}

/// What a [`Texture`] currently holds.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TextureContents {
    Placeholder,
    Image {
        width: u32,
        height: u32,
        policy: SamplingPolicy,
    },
}

/// A sampled 2D texture that is always bindable.
///
/// Starts as a 1x1 [`PLACEHOLDER_PIXEL`]. When created through
/// [`load_texture`] it carries a pending image request; [`Texture::poll`]
/// swaps the decoded image in and bumps [`Texture::generation`] so holders of
/// bind groups know to rebuild them.
pub struct Texture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    sampler: wgpu::Sampler,
    contents: TextureContents,
    generation: u64,
    pending: Option<ImageRequest>,
}

impl Texture {
    /// A texture holding only the placeholder pixel.
    pub fn placeholder(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let texture = create_texture(device, 1, 1, 1);
        write_level(queue, &texture, 0, 1, 1, &PLACEHOLDER_PIXEL);

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&SamplingPolicy::for_dimensions(1, 1).sampler_descriptor());

        Self {
            texture,
            view,
            sampler,
            contents: TextureContents::Placeholder,
            generation: 0,
            pending: None,
        }
    }

    /// Checks the pending image request, uploading the image if it is ready.
    ///
    /// Returns `true` when the texture contents changed.
    pub fn poll(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) -> bool {
        let Some(request) = self.pending.as_mut() else {
            return false;
        };

        match request.poll() {
            RequestState::Pending => false,
            RequestState::Ready(image) => {
                self.pending = None;
                self.upload_or_keep(device, queue, &image)
            }
            RequestState::Failed => {
                self.pending = None;
                log::debug!("texture image never arrived; keeping placeholder");
                false
            }
        }
    }

    /// Blocks until the pending request (if any) completes, then uploads.
    ///
    /// Returns `true` when the texture contents changed.
    pub fn wait(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) -> bool {
        let Some(request) = self.pending.take() else {
            return false;
        };

        match request.wait() {
            Some(image) => self.upload_or_keep(device, queue, &image),
            None => false,
        }
    }

    /// Replaces the contents with `image`, choosing storage and sampling from
    /// its dimensions.
    pub fn upload(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        image: &RgbaImage,
    ) -> Result<()> {
        let (width, height) = image.dimensions();
        let max = device.limits().max_texture_dimension_2d;
        if width == 0 || height == 0 {
            bail!("image has no pixels ({width}x{height})");
        }
        if width > max || height > max {
            bail!("image is {width}x{height}, larger than the device limit of {max}");
        }

        let policy = SamplingPolicy::for_dimensions(width, height);
        let texture = create_texture(device, width, height, policy.mip_level_count(width, height));
        write_level(queue, &texture, 0, width, height, image.as_raw());

        if policy == SamplingPolicy::Mipmapped {
            for (level, mip) in (1..).zip(mip_chain(image)) {
                write_level(queue, &texture, level, mip.width(), mip.height(), mip.as_raw());
            }
        }

        self.view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        self.sampler = device.create_sampler(&policy.sampler_descriptor());
        self.texture = texture;
        self.contents = TextureContents::Image {
            width,
            height,
            policy,
        };
        self.generation += 1;

        log::info!("texture uploaded: {width}x{height} ({policy:?})");
        Ok(())
    }

    fn upload_or_keep(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, image: &RgbaImage) -> bool {
        match self.upload(device, queue, image) {
            Ok(()) => true,
            Err(err) => {
                log::warn!("texture upload failed, keeping previous contents: {err}");
                false
            }
        }
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn sampler(&self) -> &wgpu::Sampler {
        &self.sampler
    }

    /// Incremented every time the contents are replaced.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn contents(&self) -> TextureContents {
        self.contents
    }

    pub fn is_placeholder(&self) -> bool {
        self.contents == TextureContents::Placeholder
    }

    /// True while an image request is still outstanding.
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Reads one texel of the base level back from the GPU.
    #[cfg(test)]
    pub(crate) fn read_texel(&self, device: &wgpu::Device, queue: &wgpu::Queue, x: u32, y: u32) -> [u8; 4] {
        let bytes_per_row = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("texel readback"),
            size: u64::from(bytes_per_row),
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d { x, y, z: 0 },
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(bytes_per_row),
                    rows_per_image: None,
                },
            },
            wgpu::Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 1,
            },
        );
        queue.submit([encoder.finish()]);

        buffer.slice(..).map_async(wgpu::MapMode::Read, |result| {
            result.expect("readback buffer should map");
        });
        device.poll(wgpu::PollType::wait_indefinitely()).unwrap();

        let texel = {
            let mapped = buffer.slice(..).get_mapped_range();
            [mapped[0], mapped[1], mapped[2], mapped[3]]
        };
        buffer.unmap();
        texel
    }
}

/// Creates a placeholder texture and starts loading `source` in the background.
///
/// Never fails: a missing or undecodable image leaves the placeholder bound.
pub fn load_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    source: impl Into<TextureSource>,
    options: LoadOptions,
) -> Texture {
    let source = source.into();
    log::info!("loading texture from {source}");

    let mut texture = Texture::placeholder(device, queue);
    texture.pending = Some(ImageRequest::spawn(source, options.flip_y));
    texture
}

fn create_texture(device: &wgpu::Device, width: u32, height: u32, mip_level_count: u32) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some("wgl texture"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: TEXTURE_FORMAT,
        usage: texture_usage(),
        view_formats: &[],
    })
}

fn texture_usage() -> wgpu::TextureUsages {
    let usage = wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST;
    // Tests read texels back.
    if cfg!(test) {
        usage | wgpu::TextureUsages::COPY_SRC
    } else {
        usage
    }
}

fn write_level(queue: &wgpu::Queue, texture: &wgpu::Texture, mip_level: u32, width: u32, height: u32, rgba: &[u8]) {
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        rgba,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * width),
            rows_per_image: Some(height),
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::test_support;
    use std::io::Cursor;

    fn png_bytes(image: &RgbaImage) -> Vec<u8> {
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn load_options_flip_by_default() {
        assert!(LoadOptions::default().flip_y);
    }

    #[test]
    fn placeholder_is_bindable_immediately() {
        let Some(gpu) = test_support::device() else { return };
        let texture = Texture::placeholder(gpu.device(), gpu.queue());
        assert!(texture.is_placeholder());
        assert!(!texture.is_pending());
        assert_eq!(texture.generation(), 0);
    }

    #[test]
    fn missing_image_keeps_placeholder() {
        let Some(gpu) = test_support::device() else { return };
        let mut texture = load_texture(
            gpu.device(),
            gpu.queue(),
            "no/such/texture.png",
            LoadOptions::default(),
        );
        assert!(texture.is_pending());
        assert!(!texture.wait(gpu.device(), gpu.queue()));
        assert!(texture.is_placeholder());
        assert!(!texture.is_pending());
        assert!(!texture.poll(gpu.device(), gpu.queue()));
        assert_eq!(texture.read_texel(gpu.device(), gpu.queue(), 0, 0), PLACEHOLDER_PIXEL);
    }

    #[test]
    fn placeholder_pixel_is_opaque_blue() {
        assert_eq!(PLACEHOLDER_PIXEL, [0, 0, 255, 255]);
    }

    #[test]
    fn uploaded_texels_replace_the_placeholder() {
        let Some(gpu) = test_support::device() else { return };
        let mut pixels = RgbaImage::from_pixel(4, 4, image::Rgba([10, 20, 30, 255]));
        pixels.put_pixel(3, 2, image::Rgba([200, 100, 50, 255]));

        let mut texture = Texture::placeholder(gpu.device(), gpu.queue());
        assert_eq!(texture.read_texel(gpu.device(), gpu.queue(), 0, 0), PLACEHOLDER_PIXEL);

        texture.upload(gpu.device(), gpu.queue(), &pixels).unwrap();
        assert_eq!(texture.read_texel(gpu.device(), gpu.queue(), 0, 0), [10, 20, 30, 255]);
        assert_eq!(texture.read_texel(gpu.device(), gpu.queue(), 3, 2), [200, 100, 50, 255]);
    }

    #[test]
    fn power_of_two_image_is_mipmapped() {
        let Some(gpu) = test_support::device() else { return };
        let bytes = png_bytes(&RgbaImage::new(8, 4));
        let mut texture = load_texture(gpu.device(), gpu.queue(), bytes, LoadOptions::default());
        assert!(texture.wait(gpu.device(), gpu.queue()));
        assert_eq!(
            texture.contents(),
            TextureContents::Image {
                width: 8,
                height: 4,
                policy: SamplingPolicy::Mipmapped
            }
        );
        assert_eq!(texture.generation(), 1);
    }

    #[test]
    fn odd_sized_image_is_clamped() {
        let Some(gpu) = test_support::device() else { return };
        let mut texture = Texture::placeholder(gpu.device(), gpu.queue());
        texture
            .upload(gpu.device(), gpu.queue(), &RgbaImage::new(3, 5))
            .unwrap();
        assert!(matches!(
            texture.contents(),
            TextureContents::Image {
                policy: SamplingPolicy::ClampedLinear,
                ..
            }
        ));
    }

    #[test]
    fn empty_image_is_rejected() {
        let Some(gpu) = test_support::device() else { return };
        let mut texture = Texture::placeholder(gpu.device(), gpu.queue());
        assert!(texture.upload(gpu.device(), gpu.queue(), &RgbaImage::new(0, 0)).is_err());
        assert!(texture.is_placeholder());
    }
}
