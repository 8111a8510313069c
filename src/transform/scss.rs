// src/transform/scss.rs

use std::io;
use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use tracing::debug;

use crate::fs::FileSystem;
use crate::pipeline::{Asset, Transform};

/// Whether a SCSS file is a partial (`_name.scss`), only reachable through
/// `@use` / `@import`.
pub fn is_partial(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('_'))
}

/// Lets grass resolve imports through our filesystem abstraction.
#[derive(Debug)]
struct GrassFs<'a>(&'a dyn FileSystem);

impl grass::Fs for GrassFs<'_> {
    fn is_dir(&self, path: &Path) -> bool {
        self.0.is_dir(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.0.is_file(path)
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.0
            .read(path)
            .map_err(|e| io::Error::new(io::ErrorKind::NotFound, e.to_string()))
    }
}

/// Compile a SCSS source string with expanded output.
///
/// Imports are resolved relative to `load_dir`.
pub fn compile(fs: &dyn FileSystem, source: &str, load_dir: &Path) -> Result<String> {
    let grass_fs = GrassFs(fs);
    let options = grass::Options::default()
        .style(grass::OutputStyle::Expanded)
        .input_syntax(grass::InputSyntax::Scss)
        .load_path(load_dir)
        .fs(&grass_fs);

    grass::from_string(source.to_string(), &options).map_err(|e| anyhow!("{e}"))
}

/// `scss` stage: compile each top-level file to `.css`; partials are dropped.
#[derive(Debug)]
pub struct CompileScss {
    fs: Arc<dyn FileSystem>,
}

impl CompileScss {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }
}

impl Transform for CompileScss {
    fn name(&self) -> &'static str {
        "scss"
    }

    fn apply(&self, asset: Asset) -> Result<Option<Asset>> {
        if is_partial(&asset.path) {
            debug!(path = %asset.path.display(), "skipping partial");
            return Ok(None);
        }

        let load_dir = asset
            .origin
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let css = compile(self.fs.as_ref(), asset.text()?, &load_dir)?;

        let mut out = asset.with_extension("css");
        out.set_text(css);
        Ok(Some(out))
    }
}
