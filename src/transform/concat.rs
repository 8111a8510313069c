// src/transform/concat.rs

use anyhow::Result;

use crate::pipeline::{Asset, Collect};
use crate::transform::sourcemap::index_map;

/// Join every asset (in path order) into a single file named `file_name`.
///
/// Used as `concat` for scripts and as `rename` for styles. A single input
/// keeps its own map; several inputs get an index map. An empty stream stays
/// empty.
#[derive(Debug, Clone)]
pub struct Concat {
    stage: &'static str,
    file_name: String,
    separator: String,
}

impl Concat {
    pub fn new(stage: &'static str, file_name: impl Into<String>) -> Self {
        Self {
            stage,
            file_name: file_name.into(),
            separator: "\n".to_string(),
        }
    }
}

impl Collect for Concat {
    fn name(&self) -> &'static str {
        self.stage
    }

    fn apply(&self, mut assets: Vec<Asset>) -> Result<Vec<Asset>> {
        if assets.is_empty() {
            return Ok(assets);
        }
        assets.sort_by(|a, b| a.path.cmp(&b.path));

        let track_maps = assets.iter().any(|a| a.track_maps);

        if assets.len() == 1 {
            let mut only = assets.remove(0);
            only.path = self.file_name.clone().into();
            return Ok(vec![only]);
        }

        let mut contents = Vec::new();
        let mut parts: Vec<(u32, &str)> = Vec::new();
        let mut line: u32 = 0;

        for (i, asset) in assets.iter().enumerate() {
            if i > 0 {
                contents.extend_from_slice(self.separator.as_bytes());
                line += count_lines(self.separator.as_bytes());
            }
            if let Some(map) = asset.source_map.as_deref() {
                parts.push((line, map));
            }
            contents.extend_from_slice(&asset.contents);
            line += count_lines(&asset.contents);
        }

        let source_map = if track_maps && !parts.is_empty() {
            Some(index_map(&self.file_name, &parts)?)
        } else {
            None
        };

        let mut joined = Asset::new(self.file_name.clone(), contents);
        joined.origin = assets[0].origin.clone();
        joined.source_map = source_map;
        joined.track_maps = track_maps;
        Ok(vec![joined])
    }
}

fn count_lines(bytes: &[u8]) -> u32 {
    bytes.iter().filter(|&&b| b == b'\n').count() as u32
}
