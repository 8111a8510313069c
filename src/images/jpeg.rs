// src/images/jpeg.rs

use anyhow::{anyhow, bail, Result};
use jpeg_decoder::PixelFormat;
use jpeg_encoder::{ColorType, Encoder};
use tracing::debug;

const SOI: u8 = 0xD8;
const SOS: u8 = 0xDA;
const SOF2: u8 = 0xC2;
const APP2: u8 = 0xE2;
const APP14: u8 = 0xEE;

/// Segments dropped by the lossless strip: comments, EXIF/XMP (APP1) and
/// the vendor APP3..APP13 / APP15 blocks. JFIF (APP0), ICC (APP2) and Adobe
/// (APP14) stay since they affect decoding.
fn is_strippable(marker: u8) -> bool {
    matches!(marker, 0xFE | 0xE1 | 0xE3..=0xED | 0xEF)
}

/// Markers that carry no length field.
fn is_standalone(marker: u8) -> bool {
    matches!(marker, 0x01 | 0xD0..=0xD7 | SOI)
}

/// Remove metadata segments without touching the entropy-coded data.
pub fn strip_metadata(data: &[u8]) -> Result<Vec<u8>> {
    if data.len() < 4 || data[0] != 0xFF || data[1] != SOI {
        bail!("jpeg: missing SOI marker");
    }

    let mut out = Vec::with_capacity(data.len());
    out.extend_from_slice(&data[..2]);
    let mut pos = 2;

    while pos < data.len() {
        if data[pos] != 0xFF {
            bail!("jpeg: expected marker at offset {pos}");
        }
        // Fill bytes before a marker are legal.
        while pos + 1 < data.len() && data[pos + 1] == 0xFF {
            pos += 1;
        }
        if pos + 1 >= data.len() {
            bail!("jpeg: truncated marker");
        }
        let marker = data[pos + 1];

        if is_standalone(marker) {
            out.extend_from_slice(&data[pos..pos + 2]);
            pos += 2;
            continue;
        }

        if pos + 4 > data.len() {
            bail!("jpeg: truncated segment header");
        }
        let len = u16::from_be_bytes([data[pos + 2], data[pos + 3]]) as usize;
        let end = pos + 2 + len;
        if len < 2 || end > data.len() {
            bail!("jpeg: segment length out of bounds");
        }

        if marker == SOS {
            // Scan data (and everything after it) is copied verbatim.
            out.extend_from_slice(&data[pos..]);
            return Ok(out);
        }

        if !is_strippable(marker) {
            out.extend_from_slice(&data[pos..end]);
        }
        pos = end;
    }

    Ok(out)
}

/// Whether the frame header is progressive (SOF2).
pub fn is_progressive(data: &[u8]) -> bool {
    let mut pos = 2;
    while pos + 4 <= data.len() && data[pos] == 0xFF {
        let marker = data[pos + 1];
        match marker {
            SOF2 => return true,
            SOS | 0xC0 | 0xC1 | 0xC3 => return false,
            0xFF => pos += 1,
            m if is_standalone(m) => pos += 2,
            _ => pos += 2 + u16::from_be_bytes([data[pos + 2], data[pos + 3]]) as usize,
        }
    }
    false
}

/// Header segments before the first scan as `(marker, payload)`, payload
/// without the length field.
fn header_segments(data: &[u8]) -> Vec<(u8, &[u8])> {
    let mut found = Vec::new();
    let mut pos = 2;
    while pos + 4 <= data.len() && data[pos] == 0xFF {
        let marker = data[pos + 1];
        if marker == 0xFF {
            pos += 1;
            continue;
        }
        if is_standalone(marker) {
            pos += 2;
            continue;
        }
        if marker == SOS {
            break;
        }
        let len = u16::from_be_bytes([data[pos + 2], data[pos + 3]]) as usize;
        let end = pos + 2 + len;
        if len < 2 || end > data.len() {
            break;
        }
        found.push((marker, &data[pos + 4..end]));
        pos = end;
    }
    found
}

/// Decode and re-encode as a progressive JPEG at `quality`.
///
/// ICC profile segments (APP2) are carried over verbatim.
pub fn reencode_progressive(data: &[u8], quality: u8) -> Result<Vec<u8>> {
    let mut decoder = jpeg_decoder::Decoder::new(data);
    let pixels = decoder.decode()?;
    let info = decoder
        .info()
        .ok_or_else(|| anyhow!("jpeg: missing image info after decode"))?;

    let color = match info.pixel_format {
        PixelFormat::L8 => ColorType::Luma,
        PixelFormat::RGB24 => ColorType::Rgb,
        other => bail!("jpeg: cannot re-encode pixel format {other:?}"),
    };

    let mut out = Vec::new();
    let mut encoder = Encoder::new(&mut out, quality);
    encoder.set_progressive(true);
    for (_, payload) in header_segments(data).into_iter().filter(|(m, _)| *m == APP2) {
        encoder.add_app_segment(APP2 - 0xE0, payload)?;
    }
    encoder.encode(&pixels, info.width, info.height, color)?;
    Ok(out)
}

/// Strip metadata and, when asked, try a progressive re-encode; the smaller
/// result wins.
///
/// An Adobe (APP14) segment pins the colour transform of the stored data,
/// which the encoder would not reproduce, so such files stay baseline.
pub fn optimize(data: &[u8], progressive: bool, quality: u8) -> Result<Vec<u8>> {
    let stripped = strip_metadata(data)?;
    if !progressive || is_progressive(&stripped) {
        return Ok(stripped);
    }
    if header_segments(&stripped).iter().any(|(m, _)| *m == APP14) {
        debug!("keeping baseline jpeg with Adobe transform segment");
        return Ok(stripped);
    }

    match reencode_progressive(&stripped, quality) {
        Ok(reencoded) if reencoded.len() < stripped.len() => Ok(reencoded),
        Ok(_) => Ok(stripped),
        Err(err) => {
            debug!("keeping stripped baseline jpeg: {err:#}");
            Ok(stripped)
        }
    }
}
