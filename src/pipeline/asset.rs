// src/pipeline/asset.rs

use std::path::PathBuf;

use anyhow::Result;

use crate::fs::FileSystem;
use crate::watch::SourceFile;

/// One file flowing through a pipeline.
///
/// `path` is relative to the source glob base and becomes the path under the
/// destination directory. `origin` is where the file was read from and is
/// only used for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub path: PathBuf,
    pub origin: PathBuf,
    pub contents: Vec<u8>,
    /// Source map (JSON) describing `contents`, once a stage produced one.
    pub source_map: Option<String>,
    /// Set by the sourcemaps-init stage; stages only emit maps when true.
    pub track_maps: bool,
}

impl Asset {
    pub fn new(path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) -> Self {
        let path = path.into();
        Self {
            origin: path.clone(),
            path,
            contents: contents.into(),
            source_map: None,
            track_maps: false,
        }
    }

    /// Read a collected source file into an asset.
    pub fn read(fs: &dyn FileSystem, file: &SourceFile) -> Result<Self> {
        let contents = fs.read(&file.path)?;
        Ok(Self {
            path: file.rel.clone(),
            origin: file.path.clone(),
            contents,
            source_map: None,
            track_maps: false,
        })
    }

    pub fn text(&self) -> Result<&str> {
        std::str::from_utf8(&self.contents)
            .map_err(|e| anyhow::anyhow!("{} is not valid UTF-8: {e}", self.origin.display()))
    }

    pub fn set_text(&mut self, text: String) {
        self.contents = text.into_bytes();
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn extension(&self) -> Option<String> {
        self.path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
    }

    /// Replace the extension of `path`, keeping its directory.
    pub fn with_extension(mut self, ext: &str) -> Self {
        self.path.set_extension(ext);
        self
    }
}
