// ---------------------------------------------------------------------------
// Synthetic test pattern
// ---------------------------------------------------------------------------

use crate::frame::Frame;

/// Animated colour sweep with a moving bar, tinted per source.
///
/// `hue_offset` shifts the palette so different sources are told apart in
/// screenshots.
pub(crate) fn synthetic_frame(width: u32, height: u32, pts_secs: f64, hue_offset: f32) -> Frame {
    let w = width as usize;
    let h = height as usize;
    let mut rgba = vec![0u8; w * h * 4];
    let phase = pts_secs as f32;
    let bar_pos = (phase * 0.2) % 1.0;

    for y in 0..h {
        let ny = y as f32 / h as f32;
        for x in 0..w {
            let offset = (y * w + x) * 4;
            let nx = x as f32 / w as f32;

            let hue = ((nx * 180.0 + phase * 60.0 + hue_offset) % 360.0 + 360.0) % 360.0;
            let (r, g, b) = hsv_to_rgb(hue, 0.6, 0.7 + 0.3 * ny);

            let bar = (1.0 - (nx - bar_pos).abs() * 10.0).clamp(0.0, 0.3);

            rgba[offset] = ((r + bar).clamp(0.0, 1.0) * 255.0) as u8;
            rgba[offset + 1] = ((g + bar).clamp(0.0, 1.0) * 255.0) as u8;
            rgba[offset + 2] = ((b + bar).clamp(0.0, 1.0) * 255.0) as u8;
            rgba[offset + 3] = 255;
        }
    }

    Frame {
        width,
        height,
        rgba,
        pts_secs,
    }
}

/// Stable hue offset in `[0, 360)` derived from a URL.
pub(crate) fn hue_for(url: &str) -> f32 {
    // FNV-1a
    let mut hash: u32 = 0x811c_9dc5;
    for b in url.bytes() {
        hash ^= b as u32;
        hash = hash.wrapping_mul(0x0100_0193);
    }
    (hash % 360) as f32
}

/// H in [0, 360], S and V in [0, 1]. Returns (r, g, b) in [0, 1].
fn hsv_to_rgb(h: f32, s: f32, v: f32) -> (f32, f32, f32) {
    let c = v * s;
    let h_prime = h / 60.0;
    let x = c * (1.0 - (h_prime % 2.0 - 1.0).abs());
    let m = v - c;

    let (r1, g1, b1) = match h_prime as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    (r1 + m, g1 + m, b1 + m)
}
