//! Textures loaded from images.
//!
//! `load_texture` hands back a texture that is bindable immediately: it holds a
//! single opaque-blue pixel until the image, decoded off-thread, is swapped in
//! by `Texture::poll`. Images whose sides are both powers of two get a full
//! mip chain; others are sampled clamped and unfiltered across levels.

mod decode;
mod handle;
mod policy;

pub use decode::{decode_image, mip_chain, ImageRequest, RequestState, TextureSource};
pub use policy::{is_power_of_two, SamplingPolicy};
pub use handle::{
    load_texture, LoadOptions, Texture, TextureContents, PLACEHOLDER_PIXEL, TEXTURE_FORMAT,
};
