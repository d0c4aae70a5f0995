use wgpu::{CompositeAlphaMode, SurfaceCapabilities, TextureFormat};

pub(crate) fn choose_surface_format(caps: &SurfaceCapabilities, prefer_srgb: bool) -> Option<TextureFormat> {
    choose_format(&caps.formats, prefer_srgb)
}

pub(crate) fn choose_alpha_mode(
    caps: &SurfaceCapabilities,
    requested: Option<CompositeAlphaMode>,
) -> CompositeAlphaMode {
    choose_alpha(&caps.alpha_modes, requested)
}

/// First format whose encoding matches `prefer_srgb`, else the surface's first.
///
/// Textures are stored as sRGB, so an sRGB target keeps sampled colors unchanged.
fn choose_format(formats: &[TextureFormat], prefer_srgb: bool) -> Option<TextureFormat> {
    formats
        .iter()
        .copied()
        .find(|f| f.is_srgb() == prefer_srgb)
        .or_else(|| formats.first().copied())
}

/// `requested` if supported, otherwise opaque, otherwise whatever comes first.
fn choose_alpha(modes: &[CompositeAlphaMode], requested: Option<CompositeAlphaMode>) -> CompositeAlphaMode {
    if let Some(mode) = requested {
        if modes.contains(&mode) {
            return mode;
        }
        log::warn!("alpha mode {mode:?} not supported by the surface");
    }

    if modes.contains(&CompositeAlphaMode::Opaque) {
        return CompositeAlphaMode::Opaque;
    }
    modes.first().copied().unwrap_or(CompositeAlphaMode::Auto)
}
