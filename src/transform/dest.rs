// src/transform/dest.rs

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tracing::debug;

use crate::fs::FileSystem;
use crate::pipeline::{Asset, Collect};

/// `dest` stage: write each asset under `dir`, mirroring its relative path.
///
/// Any write error fails the stage; a half-written output is never
/// reported as success.
#[derive(Debug)]
pub struct Dest {
    fs: Arc<dyn FileSystem>,
    dir: PathBuf,
}

impl Dest {
    pub fn new(fs: Arc<dyn FileSystem>, dir: PathBuf) -> Self {
        Self { fs, dir }
    }
}

impl Collect for Dest {
    fn name(&self) -> &'static str {
        "dest"
    }

    fn apply(&self, assets: Vec<Asset>) -> Result<Vec<Asset>> {
        for asset in &assets {
            let target = self.dir.join(&asset.path);
            debug!(path = %target.display(), bytes = asset.contents.len(), "writing");
            self.fs.write(&target, &asset.contents)?;
        }
        Ok(assets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;
    use std::path::Path;

    #[test]
    fn mirrors_relative_paths() {
        let fs = MockFileSystem::new();
        let stage = Dest::new(Arc::new(fs.clone()), PathBuf::from("out/images"));
        stage
            .apply(vec![Asset::new("icons/a.svg", "<svg/>")])
            .unwrap();
        assert_eq!(fs.read(Path::new("out/images/icons/a.svg")).unwrap(), b"<svg/>");
    }
}
