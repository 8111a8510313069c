// src/images/mod.rs

//! Image optimization stages.
//!
//! [`Newer`] is the freshness check that keeps unchanged images out of the
//! stream; [`OptimizeImage`] dispatches on the file extension to the
//! per-format optimizers. Unknown formats pass through untouched.

pub mod gif;
pub mod jpeg;
pub mod png;
pub mod svg;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tracing::debug;

use crate::config::ImagesSection;
use crate::fs::FileSystem;
use crate::pipeline::{Asset, Transform};

/// Image formats with a dedicated optimizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
    Svg,
}

impl ImageFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(ImageFormat::Png),
            "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
            "gif" => Some(ImageFormat::Gif),
            "svg" => Some(ImageFormat::Svg),
            _ => None,
        }
    }
}

/// `newer` stage: keep a source only when its destination is missing or
/// older than the source.
#[derive(Debug)]
pub struct Newer {
    fs: Arc<dyn FileSystem>,
    dest_dir: PathBuf,
}

impl Newer {
    pub fn new(fs: Arc<dyn FileSystem>, dest_dir: PathBuf) -> Self {
        Self { fs, dest_dir }
    }

    pub fn is_stale(&self, asset: &Asset) -> Result<bool> {
        let dest = self.dest_dir.join(&asset.path);
        if !self.fs.exists(&dest) {
            return Ok(true);
        }
        let src_time = self.fs.modified(&asset.origin)?;
        let dest_time = self.fs.modified(&dest)?;
        Ok(src_time > dest_time)
    }
}

impl Transform for Newer {
    fn name(&self) -> &'static str {
        "newer"
    }

    fn apply(&self, asset: Asset) -> Result<Option<Asset>> {
        if self.is_stale(&asset)? {
            Ok(Some(asset))
        } else {
            debug!(path = %asset.path.display(), "up to date");
            Ok(None)
        }
    }
}

/// `optimize` stage.
#[derive(Debug, Clone)]
pub struct OptimizeImage {
    options: ImagesSection,
}

impl OptimizeImage {
    pub fn new(options: ImagesSection) -> Self {
        Self { options }
    }
}

impl Transform for OptimizeImage {
    fn name(&self) -> &'static str {
        "optimize"
    }

    fn apply(&self, mut asset: Asset) -> Result<Option<Asset>> {
        let Some(format) = asset.extension().as_deref().and_then(ImageFormat::from_extension) else {
            return Ok(Some(asset));
        };

        let before = asset.contents.len();
        asset.contents = match format {
            ImageFormat::Png => png::optimize(&asset.contents, self.options.optimization_level)?,
            ImageFormat::Jpeg => jpeg::optimize(
                &asset.contents,
                self.options.jpeg.progressive,
                self.options.jpeg.quality,
            )?,
            ImageFormat::Gif if self.options.gif.interlaced => gif::interlace(&asset.contents)?,
            ImageFormat::Gif => return Ok(Some(asset)),
            ImageFormat::Svg => svg::minify(asset.text()?, &self.options.svg)?.into_bytes(),
        };

        debug!(
            path = %asset.path.display(),
            before,
            after = asset.contents.len(),
            "optimized image"
        );
        Ok(Some(asset))
    }
}
