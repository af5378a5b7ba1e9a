//! Frame compositing: scale an avatar into the frame's window and layer the frame on top.

use std::io::Cursor;
use std::path::Path;

use image::imageops::{self, FilterType};
use image::{ImageFormat, RgbaImage};

use crate::error::BotError;

/// Fraction of the frame width the avatar is scaled to.
pub const AVATAR_SCALE: f64 = 0.84;

/// Filename the composite is delivered under.
pub const OUTPUT_FILENAME: &str = "pfp_with_frame.png";

/// Decorative frame loaded once at startup and shared read-only between requests.
#[derive(Debug, Clone)]
pub struct FrameAsset {
    image: RgbaImage,
}

impl FrameAsset {
    /// Load and decode the frame at `path`, normalizing it to RGBA.
    ///
    /// # Errors
    ///
    /// Returns [`BotError::FrameLoad`] if the file cannot be read or decoded,
    /// or if it has no pixels.
    pub fn load(path: &Path) -> Result<Self, BotError> {
        let frame_error = |message: String| BotError::FrameLoad { path: path.to_path_buf(), message };
        let decoded = image::open(path).map_err(|e| frame_error(e.to_string()))?;
        Self::from_rgba(decoded.to_rgba8()).map_err(frame_error)
    }

    /// Wrap an already decoded RGBA image.
    ///
    /// # Errors
    ///
    /// Returns an error message if the image has a zero dimension.
    pub fn from_rgba(image: RgbaImage) -> Result<Self, String> {
        if image.width() == 0 || image.height() == 0 {
            return Err(format!("frame has no pixels ({}x{})", image.width(), image.height()));
        }
        Ok(Self { image })
    }

    /// Pixel dimensions of the frame.
    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Geometry of the avatar window for this frame.
    #[must_use]
    pub fn layout(&self) -> FrameLayout {
        FrameLayout::for_frame(self.image.width(), self.image.height())
    }
}

/// Where and how large the avatar is drawn inside a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameLayout {
    /// Frame (and output) width.
    pub frame_width: u32,
    /// Frame (and output) height.
    pub frame_height: u32,
    /// Width the avatar is resized to.
    pub target_width: u32,
    /// Height the avatar is resized to.
    pub target_height: u32,
    /// Left edge of the avatar on the canvas.
    pub offset_x: u32,
    /// Top edge of the avatar on the canvas.
    pub offset_y: u32,
}

impl FrameLayout {
    /// Compute the layout for a frame of the given size.
    ///
    /// The avatar takes [`AVATAR_SCALE`] of the frame width and the frame's own
    /// aspect ratio, so non-square avatars are stretched. It is centered with
    /// integer division on both axes.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn for_frame(frame_width: u32, frame_height: u32) -> Self {
        let width = f64::from(frame_width);
        let ratio = width / f64::from(frame_height.max(1));
        let target_width = ((width * AVATAR_SCALE).round() as u32).clamp(1, frame_width.max(1));
        let target_height = ((f64::from(target_width) / ratio).round() as u32).max(1);

        Self {
            frame_width,
            frame_height,
            target_width,
            target_height,
            offset_x: frame_width.saturating_sub(target_width) / 2,
            offset_y: frame_height.saturating_sub(target_height) / 2,
        }
    }
}

/// Composite `source` (raw image bytes of any supported format) into `frame`
/// and return the result encoded as PNG.
///
/// This is CPU-bound; async callers should run it on the blocking pool.
///
/// # Errors
///
/// Returns [`BotError::Decode`] if `source` is not a decodable image and
/// [`BotError::Encode`] if the PNG cannot be written.
pub fn composite(source: &[u8], frame: &FrameAsset) -> Result<Vec<u8>, BotError> {
    let decoded = image::load_from_memory(source).map_err(|e| BotError::Decode(e.to_string()))?;
    let canvas = compose(&decoded.to_rgba8(), frame);
    encode_png(&canvas)
}

/// Build the composite canvas from a decoded avatar.
#[must_use]
pub fn compose(avatar: &RgbaImage, frame: &FrameAsset) -> RgbaImage {
    let layout = frame.layout();
    let scaled = resize_premultiplied(avatar, layout.target_width, layout.target_height);

    let mut canvas = RgbaImage::new(layout.frame_width, layout.frame_height);
    paste_masked(&mut canvas, &scaled, layout.offset_x, layout.offset_y);
    paste_masked(&mut canvas, &frame.image, 0, 0);
    canvas
}

/// Lanczos resize in premultiplied-alpha space, so colour hidden under
/// transparent pixels does not bleed into visible edges.
#[must_use]
pub fn resize_premultiplied(image: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    let mut scaled = imageops::resize(&premultiply(image), width, height, FilterType::Lanczos3);
    unpremultiply(&mut scaled);
    scaled
}

#[allow(clippy::cast_possible_truncation)]
fn premultiply(image: &RgbaImage) -> RgbaImage {
    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        let alpha = u32::from(pixel[3]);
        for c in &mut pixel.0[..3] {
            *c = ((u32::from(*c) * alpha + 127) / 255) as u8;
        }
    }
    out
}

#[allow(clippy::cast_possible_truncation)]
fn unpremultiply(image: &mut RgbaImage) {
    for pixel in image.pixels_mut() {
        let alpha = u32::from(pixel[3]);
        if alpha == 0 || alpha == 255 {
            continue;
        }
        for c in &mut pixel.0[..3] {
            *c = ((u32::from(*c) * 255 + alpha / 2) / alpha).min(255) as u8;
        }
    }
}

/// Paste `top` onto `canvas` at `(x, y)`, using `top`'s alpha as the mask.
///
/// Every channel, alpha included, is interpolated between canvas and `top`
/// by the mask value. Pixels falling outside the canvas are clipped.
pub fn paste_masked(canvas: &mut RgbaImage, top: &RgbaImage, x: u32, y: u32) {
    for (px, py, pixel) in top.enumerate_pixels() {
        let (cx, cy) = (x + px, y + py);
        if cx >= canvas.width() || cy >= canvas.height() {
            continue;
        }
        let mask = u32::from(pixel[3]);
        match mask {
            0 => {}
            255 => canvas.put_pixel(cx, cy, *pixel),
            _ => {
                let under = canvas.get_pixel_mut(cx, cy);
                for (dst, &src) in under.0.iter_mut().zip(pixel.0.iter()) {
                    *dst = blend_channel(src, *dst, mask);
                }
            }
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn blend_channel(src: u8, dst: u8, mask: u32) -> u8 {
    // (0..=255 * 255 + 127) / 255 stays within u8.
    ((u32::from(src) * mask + u32::from(dst) * (255 - mask) + 127) / 255) as u8
}

fn encode_png(canvas: &RgbaImage) -> Result<Vec<u8>, BotError> {
    let mut buf = Cursor::new(Vec::new());
    canvas.write_to(&mut buf, ImageFormat::Png).map_err(|e| BotError::Encode(e.to_string()))?;
    Ok(buf.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ColorType, DynamicImage, Rgba};

    fn png_bytes(image: &RgbaImage) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        image.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    /// Opaque border with a fully transparent window in the middle.
    fn window_frame(width: u32, height: u32) -> FrameAsset {
        let image = RgbaImage::from_fn(width, height, |x, y| {
            let border = x < width / 10
                || y < height / 10
                || x >= width - width / 10
                || y >= height - height / 10;
            if border {
                Rgba([200, 30, 30, 255])
            } else {
                Rgba([0, 0, 0, 0])
            }
        });
        FrameAsset::from_rgba(image).unwrap()
    }

    #[test]
    fn layout_for_wide_frame() {
        let layout = FrameLayout::for_frame(1000, 500);
        assert_eq!((layout.target_width, layout.target_height), (840, 420));
        assert_eq!((layout.offset_x, layout.offset_y), (80, 40));
    }

    #[test]
    fn layout_rounds_to_nearest() {
        // 0.84 * 501 = 420.84, 421 / (501 / 333) = 279.8
        let layout = FrameLayout::for_frame(501, 333);
        assert_eq!((layout.target_width, layout.target_height), (421, 280));
        assert_eq!((layout.offset_x, layout.offset_y), (40, 26));
    }

    #[test]
    fn layout_offsets_center_the_avatar() {
        for (w, h) in [(512, 512), (300, 700), (1920, 1080), (7, 3), (1, 1)] {
            let layout = FrameLayout::for_frame(w, h);
            assert!(layout.target_width >= 1 && layout.target_width <= w);
            assert!(layout.target_height >= 1 && layout.target_height <= h);
            assert_eq!(layout.offset_x, (w - layout.target_width) / 2);
            assert_eq!(layout.offset_y, (h - layout.target_height) / 2);
        }
    }

    #[test]
    fn output_matches_frame_dimensions() {
        let frame = window_frame(200, 100);
        for (w, h) in [(64, 64), (10, 300), (400, 20), (1, 1)] {
            let avatar = RgbaImage::from_pixel(w, h, Rgba([10, 200, 10, 255]));
            let out = composite(&png_bytes(&avatar), &frame).unwrap();
            let decoded = image::load_from_memory(&out).unwrap();
            assert_eq!((decoded.width(), decoded.height()), (200, 100), "source {w}x{h}");
        }
    }

    #[test]
    fn output_is_png_with_alpha() {
        let frame = window_frame(50, 50);
        let avatar = RgbaImage::from_pixel(8, 8, Rgba([1, 2, 3, 255]));
        let out = composite(&png_bytes(&avatar), &frame).unwrap();
        assert_eq!(image::guess_format(&out).unwrap(), ImageFormat::Png);
        let decoded = image::load_from_memory(&out).unwrap();
        assert_eq!(decoded.color(), ColorType::Rgba8);
    }

    #[test]
    fn composite_is_deterministic() {
        let frame = window_frame(120, 90);
        let avatar = RgbaImage::from_fn(33, 47, |x, y| Rgba([(x * 7) as u8, (y * 5) as u8, 90, 255]));
        let bytes = png_bytes(&avatar);
        assert_eq!(composite(&bytes, &frame).unwrap(), composite(&bytes, &frame).unwrap());
    }

    #[test]
    fn avatar_shows_through_window_and_frame_covers_border() {
        let frame = window_frame(100, 100);
        let avatar = RgbaImage::from_pixel(16, 16, Rgba([0, 0, 255, 255]));
        let canvas = compose(&avatar, &frame);

        assert_eq!(*canvas.get_pixel(50, 50), Rgba([0, 0, 255, 255]));
        assert_eq!(*canvas.get_pixel(2, 2), Rgba([200, 30, 30, 255]));
    }

    #[test]
    fn avatar_region_starts_at_offset() {
        // Fully transparent frame so only the avatar lands on the canvas.
        let frame = FrameAsset::from_rgba(RgbaImage::new(1000, 500)).unwrap();
        let avatar = RgbaImage::from_pixel(4, 4, Rgba([255, 255, 255, 255]));
        let canvas = compose(&avatar, &frame);

        assert_eq!(canvas.get_pixel(79, 250)[3], 0);
        assert_eq!(canvas.get_pixel(80, 250)[3], 255);
        assert_eq!(canvas.get_pixel(250, 39)[3], 0);
        assert_eq!(canvas.get_pixel(250, 40)[3], 255);
        assert_eq!(canvas.get_pixel(919, 459)[3], 255);
        assert_eq!(canvas.get_pixel(920, 459)[3], 0);
        assert_eq!(canvas.get_pixel(919, 460)[3], 0);
    }

    #[test]
    fn transparent_edges_do_not_darken_when_resized() {
        let avatar = RgbaImage::from_fn(8, 8, |x, _| {
            if x < 4 {
                Rgba([255, 255, 255, 255])
            } else {
                Rgba([0, 0, 0, 0])
            }
        });

        let scaled = resize_premultiplied(&avatar, 84, 84);

        let edge: Vec<_> = scaled.pixels().filter(|p| p[3] > 0 && p[3] < 255).collect();
        assert!(!edge.is_empty());
        for pixel in edge {
            assert!(pixel[0] >= 250 && pixel[1] >= 250 && pixel[2] >= 250, "{pixel:?}");
        }
    }

    #[test]
    fn opaque_avatar_resize_is_unaffected_by_premultiply() {
        let avatar = RgbaImage::from_fn(16, 16, |x, y| Rgba([(x * 16) as u8, (y * 16) as u8, 77, 255]));
        let plain = imageops::resize(&avatar, 30, 30, FilterType::Lanczos3);
        assert_eq!(resize_premultiplied(&avatar, 30, 30), plain);
    }

    #[test]
    fn non_image_bytes_fail_to_decode() {
        let frame = window_frame(20, 20);
        assert!(matches!(composite(&[], &frame), Err(BotError::Decode(_))));
        assert!(matches!(
            composite(b"<html><body>not found</body></html>", &frame),
            Err(BotError::Decode(_))
        ));
    }

    #[test]
    fn decodes_non_png_sources() {
        let frame = window_frame(40, 40);
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::new_rgb8(12, 9).write_to(&mut buf, ImageFormat::Jpeg).unwrap();
        let out = composite(&buf.into_inner(), &frame).unwrap();
        let decoded = image::load_from_memory(&out).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (40, 40));
    }

    #[test]
    fn transparent_mask_leaves_canvas_untouched() {
        let mut canvas = RgbaImage::from_pixel(2, 2, Rgba([9, 9, 9, 9]));
        paste_masked(&mut canvas, &RgbaImage::from_pixel(2, 2, Rgba([255, 0, 0, 0])), 0, 0);
        assert!(canvas.pixels().all(|p| *p == Rgba([9, 9, 9, 9])));
    }

    #[test]
    fn partial_mask_interpolates_every_channel() {
        let mut canvas = RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 0]));
        paste_masked(&mut canvas, &RgbaImage::from_pixel(1, 1, Rgba([255, 100, 0, 128])), 0, 0);
        // 255 * 128 / 255 = 128, 100 * 128 / 255 = 50.2, alpha 128 * 128 / 255 = 64.25
        assert_eq!(*canvas.get_pixel(0, 0), Rgba([128, 50, 0, 64]));
    }

    #[test]
    fn paste_clips_at_canvas_edge() {
        let mut canvas = RgbaImage::new(3, 3);
        paste_masked(&mut canvas, &RgbaImage::from_pixel(3, 3, Rgba([1, 1, 1, 255])), 2, 2);
        assert_eq!(canvas.get_pixel(2, 2)[3], 255);
        assert_eq!(canvas.get_pixel(1, 1)[3], 0);
    }

    #[test]
    fn zero_sized_frame_is_rejected() {
        assert!(FrameAsset::from_rgba(RgbaImage::new(0, 10)).is_err());
    }

    #[test]
    fn missing_frame_file_is_frame_load_error() {
        let err = FrameAsset::load(Path::new("/nonexistent/frame.png")).unwrap_err();
        assert!(matches!(err, BotError::FrameLoad { .. }));
        assert!(err.to_string().contains("/nonexistent/frame.png"));
    }

    #[test]
    fn frame_without_alpha_is_normalized() {
        let dir = std::env::temp_dir().join("pfp_framer_rgb_frame_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("frame.jpg");
        DynamicImage::new_rgb8(30, 20).save(&path).unwrap();

        let frame = FrameAsset::load(&path).unwrap();
        assert_eq!(frame.dimensions(), (30, 20));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
