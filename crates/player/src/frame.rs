//! Captured frames and the PNG screenshots built from them.

use std::io::Cursor;
use std::sync::Arc;

use base64::Engine as _;
use bd_common::{PlayerError, RenderTarget};
use image::{ImageBuffer, ImageFormat, Rgba};

/// Widest frame a backend renders for capture; larger targets are scaled down.
pub const MAX_CAPTURE_WIDTH: u32 = 480;

/// A raw RGBA8 frame (width * height * 4 bytes).
#[derive(Clone, Debug)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
    /// Presentation time of the frame in seconds.
    pub pts_secs: f64,
}

impl Frame {
    /// Solid-colour frame.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4], pts_secs: f64) -> Self {
        let pixels = (width as usize) * (height as usize);
        let mut data = Vec::with_capacity(pixels * 4);
        for _ in 0..pixels {
            data.extend_from_slice(&rgba);
        }
        Self {
            width,
            height,
            rgba: data,
            pts_secs,
        }
    }

    /// Scale every colour channel by `level`, leaving alpha untouched.
    pub fn dim(&mut self, level: f32) {
        let level = level.clamp(0.0, 1.0);
        if level >= 1.0 {
            return;
        }
        for px in self.rgba.chunks_exact_mut(4) {
            for c in &mut px[..3] {
                *c = (*c as f32 * level) as u8;
            }
        }
    }
}

/// Capture dimensions for `target`, keeping its aspect ratio.
pub fn capture_size(target: &RenderTarget, max_width: u32) -> (u32, u32) {
    let width = target.width.max(1);
    let height = target.height.max(1);
    if width <= max_width {
        return (width, height);
    }
    let scaled_h = (height as u64 * max_width as u64 / width as u64).max(1) as u32;
    (max_width, scaled_h)
}

/// A still frame shown in place of live video while a source is paused.
#[derive(Clone, Debug, PartialEq)]
pub struct Screenshot {
    png: Arc<Vec<u8>>,
    pub width: u32,
    pub height: u32,
    /// Playback position the frame was taken at.
    pub position_secs: f64,
}

impl Screenshot {
    /// Encode `frame` as PNG.
    pub fn encode(frame: &Frame) -> Result<Self, PlayerError> {
        let img: ImageBuffer<Rgba<u8>, _> =
            ImageBuffer::from_raw(frame.width, frame.height, frame.rgba.as_slice())
                .ok_or_else(|| {
                    PlayerError::Encode(format!(
                        "buffer of {} bytes does not hold a {}x{} RGBA frame",
                        frame.rgba.len(),
                        frame.width,
                        frame.height
                    ))
                })?;

        let mut png = Vec::new();
        img.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|e| PlayerError::Encode(e.to_string()))?;

        Ok(Self {
            png: Arc::new(png),
            width: frame.width,
            height: frame.height,
            position_secs: frame.pts_secs,
        })
    }

    pub fn png_bytes(&self) -> &[u8] {
        &self.png
    }

    pub fn is_empty(&self) -> bool {
        self.png.is_empty()
    }

    /// `data:image/png;base64,...` form for hosts that render image URIs.
    pub fn data_uri(&self) -> String {
        let encoded = base64::engine::general_purpose::STANDARD.encode(self.png.as_slice());
        format!("data:image/png;base64,{encoded}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bd_common::Viewport;

    const PNG_MAGIC: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    #[test]
    fn encode_produces_png() {
        let frame = Frame::filled(16, 9, [10, 20, 30, 255], 4.5);
        let shot = Screenshot::encode(&frame).unwrap();
        assert!(!shot.is_empty());
        assert_eq!(&shot.png_bytes()[..8], &PNG_MAGIC);
        assert_eq!((shot.width, shot.height), (16, 9));
        assert_eq!(shot.position_secs, 4.5);
    }

    #[test]
    fn encode_rejects_short_buffer() {
        let frame = Frame {
            width: 4,
            height: 4,
            rgba: vec![0u8; 10],
            pts_secs: 0.0,
        };
        assert!(matches!(
            Screenshot::encode(&frame),
            Err(PlayerError::Encode(_))
        ));
    }

    #[test]
    fn data_uri_has_png_prefix() {
        let frame = Frame::filled(2, 2, [0, 0, 0, 255], 0.0);
        let shot = Screenshot::encode(&frame).unwrap();
        assert!(shot.data_uri().starts_with("data:image/png;base64,iVBOR"));
    }

    #[test]
    fn dim_scales_colour_not_alpha() {
        let mut frame = Frame::filled(1, 1, [200, 100, 50, 255], 0.0);
        frame.dim(0.5);
        assert_eq!(frame.rgba, vec![100, 50, 25, 255]);
    }

    #[test]
    fn capture_size_keeps_aspect() {
        let target = RenderTarget::cover(Viewport::new(1920, 1080));
        assert_eq!(capture_size(&target, 480), (480, 270));
        let small = RenderTarget::cover(Viewport::new(320, 200));
        assert_eq!(capture_size(&small, 480), (320, 200));
    }
}
