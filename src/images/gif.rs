// src/images/gif.rs

use std::borrow::Cow;

use anyhow::Result;

/// Reorder natural-order rows into GIF interlace order
/// (every 8th row from 0, every 8th from 4, every 4th from 2, every 2nd from 1).
pub fn interlace_rows(pixels: &[u8], width: usize, height: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(pixels.len());
    for (start, step) in [(0, 8), (4, 8), (2, 4), (1, 2)] {
        for row in (start..height).step_by(step) {
            out.extend_from_slice(&pixels[row * width..(row + 1) * width]);
        }
    }
    out
}

/// Re-encode every frame interlaced, keeping palettes, timing and loop count.
pub fn interlace(data: &[u8]) -> Result<Vec<u8>> {
    let mut options = gif::DecodeOptions::new();
    options.set_color_output(gif::ColorOutput::Indexed);
    let mut decoder = options.read_info(data)?;

    let width = decoder.width();
    let height = decoder.height();
    let palette = decoder.global_palette().map(<[u8]>::to_vec).unwrap_or_default();
    let repeat = decoder.repeat();

    let mut frames = Vec::new();
    while let Some(frame) = decoder.read_next_frame()? {
        frames.push(frame.clone());
    }

    let mut out = Vec::new();
    {
        let mut encoder = gif::Encoder::new(&mut out, width, height, &palette)?;
        if frames.len() > 1 {
            encoder.set_repeat(repeat)?;
        }
        for mut frame in frames {
            // The decoder always hands out rows in natural order.
            let rows = interlace_rows(&frame.buffer, frame.width as usize, frame.height as usize);
            frame.buffer = Cow::Owned(rows);
            frame.interlaced = true;
            encoder.write_frame(&frame)?;
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PALETTE: [u8; 12] = [0, 0, 0, 255, 255, 255, 255, 0, 0, 0, 0, 255];

    fn sample_gif(frames: usize) -> (Vec<u8>, Vec<u8>) {
        let pixels: Vec<u8> = (0..4 * 10).map(|i| (i / 4 % 4) as u8).collect();
        let mut out = Vec::new();
        {
            let mut encoder = gif::Encoder::new(&mut out, 4, 10, &PALETTE).unwrap();
            if frames > 1 {
                encoder.set_repeat(gif::Repeat::Infinite).unwrap();
            }
            for _ in 0..frames {
                let frame = gif::Frame {
                    width: 4,
                    height: 10,
                    buffer: Cow::Owned(pixels.clone()),
                    ..gif::Frame::default()
                };
                encoder.write_frame(&frame).unwrap();
            }
        }
        (out, pixels)
    }

    #[test]
    fn row_order_follows_the_four_passes() {
        let pixels: Vec<u8> = (0..10).collect();
        assert_eq!(interlace_rows(&pixels, 1, 10), vec![0, 8, 4, 2, 6, 1, 3, 5, 7, 9]);
    }

    #[test]
    fn interlaced_output_decodes_to_the_same_pixels() {
        let (input, pixels) = sample_gif(1);
        let out = interlace(&input).unwrap();

        let mut options = gif::DecodeOptions::new();
        options.set_color_output(gif::ColorOutput::Indexed);
        let mut decoder = options.read_info(&out[..]).unwrap();
        let frame = decoder.read_next_frame().unwrap().unwrap();

        assert!(frame.interlaced);
        assert_eq!(&frame.buffer[..], &pixels[..]);
    }

    #[test]
    fn animations_keep_every_frame_and_loop() {
        let (input, _) = sample_gif(3);
        let out = interlace(&input).unwrap();

        let mut decoder = gif::DecodeOptions::new().read_info(&out[..]).unwrap();
        let mut count = 0;
        while decoder.read_next_frame().unwrap().is_some() {
            count += 1;
        }
        assert_eq!(count, 3);
        assert_eq!(decoder.repeat(), gif::Repeat::Infinite);
    }
}
