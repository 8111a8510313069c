// src/images/png.rs

use anyhow::{anyhow, Result};

/// Lossless recompression at an oxipng preset (0-6).
///
/// Never returns something larger than the input.
pub fn optimize(data: &[u8], level: u8) -> Result<Vec<u8>> {
    let options = oxipng::Options::from_preset(level);
    let out = oxipng::optimize_from_memory(data, &options).map_err(|e| anyhow!("png: {e}"))?;

    if out.len() < data.len() {
        Ok(out)
    } else {
        Ok(data.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_png() -> Vec<u8> {
        // 16x16 opaque image, written by oxipng with no optimization.
        let pixels: Vec<u8> = (0..16 * 16).flat_map(|i| [(i % 16) as u8 * 16, 0, 0, 255]).collect();
        let raw = oxipng::RawImage::new(16, 16, oxipng::ColorType::RGBA, oxipng::BitDepth::Eight, pixels)
            .unwrap();
        raw.create_optimized_png(&oxipng::Options::from_preset(0)).unwrap()
    }

    #[test]
    fn output_is_a_png_no_larger_than_input() {
        let input = sample_png();
        let out = optimize(&input, 5).unwrap();
        assert!(out.starts_with(b"\x89PNG\r\n\x1a\n"));
        assert!(out.len() <= input.len());
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(optimize(b"not a png", 2).is_err());
    }
}
