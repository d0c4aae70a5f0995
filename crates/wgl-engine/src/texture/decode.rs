use std::borrow::Cow;
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use futures::channel::oneshot;
use image::imageops::{self, FilterType};
use image::RgbaImage;

/// Where texture image data comes from.
#[derive(Debug, Clone)]
pub enum TextureSource {
    /// Encoded image file on disk, resolved relative to the working directory.
    Path(PathBuf),
    /// Encoded image bytes already in memory.
    Bytes(Vec<u8>),
}

impl TextureSource {
    fn read(&self) -> Result<Cow<'_, [u8]>> {
        match self {
            TextureSource::Path(path) => std::fs::read(path)
                .map(Cow::Owned)
                .with_context(|| format!("failed to read {}", path.display())),
            TextureSource::Bytes(bytes) => Ok(Cow::Borrowed(bytes)),
        }
    }
}

impl fmt::Display for TextureSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextureSource::Path(path) => write!(f, "{}", path.display()),
            TextureSource::Bytes(bytes) => write!(f, "<{} bytes>", bytes.len()),
        }
    }
}

impl From<&str> for TextureSource {
    fn from(path: &str) -> Self {
        TextureSource::Path(PathBuf::from(path))
    }
}

impl From<&Path> for TextureSource {
    fn from(path: &Path) -> Self {
        TextureSource::Path(path.to_path_buf())
    }
}

impl From<PathBuf> for TextureSource {
    fn from(path: PathBuf) -> Self {
        TextureSource::Path(path)
    }
}

impl From<Vec<u8>> for TextureSource {
    fn from(bytes: Vec<u8>) -> Self {
        TextureSource::Bytes(bytes)
    }
}

/// Decodes an encoded image into RGBA8.
///
/// With `flip_y` the rows are reversed so the first row is the bottom of the
/// image, matching texture coordinates with a bottom-left origin.
pub fn decode_image(bytes: &[u8], flip_y: bool) -> image::ImageResult<RgbaImage> {
    let mut decoded = image::load_from_memory(bytes)?.into_rgba8();
    if flip_y {
        imageops::flip_vertical_in_place(&mut decoded);
    }
    Ok(decoded)
}

/// Downsampled levels below `base`, halving each side (floor, min 1) down to 1x1.
///
/// `base` itself is not included.
pub fn mip_chain(base: &RgbaImage) -> Vec<RgbaImage> {
    let mut levels: Vec<RgbaImage> = Vec::new();
    let (mut width, mut height) = base.dimensions();

    while width > 1 || height > 1 {
        width = (width / 2).max(1);
        height = (height / 2).max(1);
        let previous = levels.last().unwrap_or(base);
        let next = imageops::resize(previous, width, height, FilterType::Triangle);
        levels.push(next);
    }

    levels
}

/// Outcome of polling an [`ImageRequest`].
#[derive(Debug)]
pub enum RequestState {
    Pending,
    Ready(RgbaImage),
    /// The image could not be read or decoded, or was already taken.
    Failed,
}

/// A one-shot background image load.
///
/// The reader thread sends the decoded image exactly once. Read and decode
/// failures are not reported to the requester; the sender is dropped and the
/// request reads as [`RequestState::Failed`].
#[derive(Debug)]
pub struct ImageRequest {
    receiver: Option<oneshot::Receiver<RgbaImage>>,
}

impl ImageRequest {
    /// Starts reading and decoding `source` on a background thread.
    pub fn spawn(source: TextureSource, flip_y: bool) -> Self {
        let (sender, receiver) = oneshot::channel();

        let spawned = std::thread::Builder::new()
            .name("wgl-image-load".to_string())
            .spawn(move || {
                let decoded = source
                    .read()
                    .and_then(|bytes| decode_image(&bytes, flip_y).context("failed to decode image"));
                match decoded {
                    Ok(image) => {
                        log::debug!("decoded {source}: {}x{}", image.width(), image.height());
                        // The requester may have gone away; nothing to do then.
                        let _ = sender.send(image);
                    }
                    Err(err) => log::debug!("image load for {source} abandoned: {err:#}"),
                }
            });

        if let Err(err) = spawned {
            log::debug!("failed to start image loader thread: {err}");
        }

        Self {
            receiver: Some(receiver),
        }
    }

    /// Non-blocking check for completion. `Ready` is returned at most once.
    pub fn poll(&mut self) -> RequestState {
        let Some(receiver) = self.receiver.as_mut() else {
            return RequestState::Failed;
        };

        match receiver.try_recv() {
            Ok(Some(image)) => {
                self.receiver = None;
                RequestState::Ready(image)
            }
            Ok(None) => RequestState::Pending,
            Err(oneshot::Canceled) => {
                self.receiver = None;
                RequestState::Failed
            }
        }
    }

    /// Blocks until the request completes.
    pub fn wait(mut self) -> Option<RgbaImage> {
        let receiver = self.receiver.take()?;
        futures::executor::block_on(receiver).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use std::io::Cursor;
    use std::time::{Duration, Instant};

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const GREEN: Rgba<u8> = Rgba([0, 255, 0, 255]);

    fn png_bytes(image: &RgbaImage) -> Vec<u8> {
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    /// 1 wide, 2 tall: red on top, green below.
    fn two_rows() -> RgbaImage {
        let mut img = RgbaImage::new(1, 2);
        img.put_pixel(0, 0, RED);
        img.put_pixel(0, 1, GREEN);
        img
    }

    // ── decode ────────────────────────────────────────────────────────────

    #[test]
    fn decode_keeps_row_order_without_flip() {
        let decoded = decode_image(&png_bytes(&two_rows()), false).unwrap();
        assert_eq!(*decoded.get_pixel(0, 0), RED);
    }

    #[test]
    fn decode_flips_rows() {
        let decoded = decode_image(&png_bytes(&two_rows()), true).unwrap();
        assert_eq!(*decoded.get_pixel(0, 0), GREEN);
        assert_eq!(*decoded.get_pixel(0, 1), RED);
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(decode_image(b"definitely not an image", false).is_err());
    }

    // ── mip chain ─────────────────────────────────────────────────────────

    #[test]
    fn mip_chain_halves_to_one_pixel() {
        let levels = mip_chain(&RgbaImage::new(8, 2));
        let dims: Vec<_> = levels.iter().map(|l| l.dimensions()).collect();
        assert_eq!(dims, vec![(4, 1), (2, 1), (1, 1)]);
    }

    #[test]
    fn single_pixel_has_no_extra_levels() {
        assert!(mip_chain(&RgbaImage::new(1, 1)).is_empty());
    }

    #[test]
    fn uniform_color_survives_downsampling() {
        let base = RgbaImage::from_pixel(16, 16, GREEN);
        let levels = mip_chain(&base);
        assert_eq!(levels.len(), 4);
        assert_eq!(*levels[3].get_pixel(0, 0), GREEN);
    }

    // ── requests ──────────────────────────────────────────────────────────

    fn poll_until_done(request: &mut ImageRequest) -> RequestState {
        let deadline = Instant::now() + Duration::from_secs(10);
        loop {
            match request.poll() {
                RequestState::Pending if Instant::now() < deadline => {
                    std::thread::sleep(Duration::from_millis(5));
                }
                state => return state,
            }
        }
    }

    #[test]
    fn request_from_bytes_delivers_once() {
        let mut request = ImageRequest::spawn(png_bytes(&two_rows()).into(), true);
        match poll_until_done(&mut request) {
            RequestState::Ready(image) => {
                assert_eq!(image.dimensions(), (1, 2));
                assert_eq!(*image.get_pixel(0, 0), GREEN);
            }
            other => panic!("expected an image, got {other:?}"),
        }
        assert!(matches!(request.poll(), RequestState::Failed));
    }

    #[test]
    fn missing_file_fails_quietly() {
        let mut request = ImageRequest::spawn("does/not/exist/sb1_x1024.png".into(), true);
        assert!(matches!(poll_until_done(&mut request), RequestState::Failed));
    }

    #[test]
    fn wait_on_undecodable_bytes_is_none() {
        let request = ImageRequest::spawn(b"garbage".to_vec().into(), false);
        assert!(request.wait().is_none());
    }

    #[test]
    fn wait_on_good_bytes_is_the_image() {
        let request = ImageRequest::spawn(png_bytes(&RgbaImage::new(3, 5)).into(), false);
        assert_eq!(request.wait().map(|i| i.dimensions()), Some((3, 5)));
    }

    #[test]
    fn source_display() {
        assert_eq!(TextureSource::from("a/b.png").to_string(), "a/b.png");
        assert_eq!(TextureSource::from(vec![0u8; 4]).to_string(), "<4 bytes>");
    }
}
