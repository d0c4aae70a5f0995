/// True when `n` is an exact power of two. Zero is not.
#[inline]
pub fn is_power_of_two(n: u32) -> bool {
    n != 0 && n & (n - 1) == 0
}

/// How an uploaded image is stored and sampled.
///
/// Mirrors the baseline-profile rule: mipmaps and repeat wrapping only for
/// power-of-two images.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SamplingPolicy {
    /// Full mip chain, repeat wrapping, nearest-within-level / linear-between-levels
    /// minification, linear magnification.
    Mipmapped,
    /// Single level, clamp-to-edge wrapping, linear filtering.
    ClampedLinear,
}

impl SamplingPolicy {
    /// Picks the policy for an image of `width` x `height`.
    pub fn for_dimensions(width: u32, height: u32) -> Self {
        if is_power_of_two(width) && is_power_of_two(height) {
            SamplingPolicy::Mipmapped
        } else {
            SamplingPolicy::ClampedLinear
        }
    }

    /// Number of mip levels a texture of this size gets under this policy.
    pub fn mip_level_count(self, width: u32, height: u32) -> u32 {
        match self {
            SamplingPolicy::Mipmapped => 32 - width.max(height).max(1).leading_zeros(),
            SamplingPolicy::ClampedLinear => 1,
        }
    }

    pub fn address_mode(self) -> wgpu::AddressMode {
        match self {
            SamplingPolicy::Mipmapped => wgpu::AddressMode::Repeat,
            SamplingPolicy::ClampedLinear => wgpu::AddressMode::ClampToEdge,
        }
    }

    pub fn sampler_descriptor(self) -> wgpu::SamplerDescriptor<'static> {
        let address_mode = self.address_mode();
        let (min_filter, mipmap_filter) = match self {
            SamplingPolicy::Mipmapped => (wgpu::FilterMode::Nearest, wgpu::MipmapFilterMode::Linear),
            SamplingPolicy::ClampedLinear => (wgpu::FilterMode::Linear, wgpu::MipmapFilterMode::Nearest),
        };

        wgpu::SamplerDescriptor {
            label: Some("wgl texture sampler"),
            address_mode_u: address_mode,
            address_mode_v: address_mode,
            address_mode_w: address_mode,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter,
            mipmap_filter,
            ..Default::default()
        }
    }
}
