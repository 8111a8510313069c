// src/transform/sourcemap.rs

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::{json, Value};

use crate::fs::FileSystem;
use crate::pipeline::{Asset, Collect, Transform};

/// `sourcemaps-init` stage: start tracking maps for every asset.
#[derive(Debug, Clone, Copy, Default)]
pub struct SourcemapsInit;

impl Transform for SourcemapsInit {
    fn name(&self) -> &'static str {
        "sourcemaps-init"
    }

    fn apply(&self, mut asset: Asset) -> Result<Option<Asset>> {
        asset.track_maps = true;
        Ok(Some(asset))
    }
}

/// Build an index map (`sections`) stitching per-file maps together.
///
/// `parts` pairs each file's starting line in the joined output with its map.
pub fn index_map(file: &str, parts: &[(u32, &str)]) -> Result<String> {
    let mut sections = Vec::with_capacity(parts.len());
    for (line, map) in parts {
        let map: Value = serde_json::from_str(map).context("parsing source map")?;
        sections.push(json!({
            "offset": { "line": line, "column": 0 },
            "map": map,
        }));
    }

    let index = json!({
        "version": 3,
        "file": file,
        "sections": sections,
    });
    Ok(index.to_string())
}

/// Path of `to` relative to the directory `from_dir`, with `/` separators.
///
/// Both paths are expected to share the same anchor (the project root).
pub fn relative_url(from_dir: &Path, to: &Path) -> String {
    let from: Vec<Component<'_>> = from_dir
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();
    let target: Vec<Component<'_>> = to
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();

    let common = from
        .iter()
        .zip(target.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut rel = PathBuf::new();
    for _ in common..from.len() {
        rel.push("..");
    }
    for component in &target[common..] {
        rel.push(component.as_os_str());
    }
    rel.to_string_lossy().replace('\\', "/")
}

/// The trailing comment pointing a browser at a map file.
fn mapping_comment(extension: Option<&str>, url: &str) -> String {
    match extension {
        Some("css") => format!("\n/*# sourceMappingURL={url} */\n"),
        _ => format!("\n//# sourceMappingURL={url}\n"),
    }
}

/// `sourcemaps-write` stage: write each asset's map to `maps_dir` as
/// `<name>.map` and append a `sourceMappingURL` comment relative to the
/// asset's destination directory.
#[derive(Debug)]
pub struct WriteMaps {
    fs: Arc<dyn FileSystem>,
    maps_dir: PathBuf,
    dest_dir: PathBuf,
}

impl WriteMaps {
    pub fn new(fs: Arc<dyn FileSystem>, maps_dir: PathBuf, dest_dir: PathBuf) -> Self {
        Self {
            fs,
            maps_dir,
            dest_dir,
        }
    }
}

impl Collect for WriteMaps {
    fn name(&self) -> &'static str {
        "sourcemaps-write"
    }

    fn apply(&self, assets: Vec<Asset>) -> Result<Vec<Asset>> {
        let mut out = Vec::with_capacity(assets.len());

        for mut asset in assets {
            let Some(map) = asset.source_map.take().filter(|_| asset.track_maps) else {
                out.push(asset);
                continue;
            };

            let mut map: Value = serde_json::from_str(&map).context("parsing source map")?;
            map["file"] = json!(asset.file_name());

            let map_rel = PathBuf::from(format!("{}.map", asset.path.to_string_lossy()));
            let map_path = self.maps_dir.join(&map_rel);
            self.fs.write(&map_path, map.to_string().as_bytes())?;

            let written_at = self.dest_dir.join(&asset.path);
            let from_dir = written_at.parent().unwrap_or(&self.dest_dir);
            let url = relative_url(from_dir, &map_path);

            let mut text = asset.text()?.trim_end().to_string();
            text.push_str(&mapping_comment(asset.extension().as_deref(), &url));
            asset.set_text(text);
            out.push(asset);
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    #[test]
    fn relative_url_climbs_out_of_the_dest_dir() {
        assert_eq!(
            relative_url(
                Path::new("proj/public_html/css"),
                Path::new("proj/public_html/maps/styles.min.css.map")
            ),
            "../maps/styles.min.css.map"
        );
        assert_eq!(relative_url(Path::new("a"), Path::new("a/b.map")), "b.map");
    }

    #[test]
    fn index_map_offsets_each_section() {
        let m = r#"{"version":3,"sources":["a.js"],"names":[],"mappings":"AAAA"}"#;
        let json: Value = serde_json::from_str(&index_map("out.js", &[(0, m), (3, m)]).unwrap()).unwrap();

        assert_eq!(json["file"], "out.js");
        assert_eq!(json["sections"][1]["offset"]["line"], 3);
        assert_eq!(json["sections"][0]["map"]["sources"][0], "a.js");
    }

    #[test]
    fn write_maps_writes_file_and_appends_comment() {
        let fs = MockFileSystem::new();
        let mut asset = Asset::new("scripts.min.js", "var a=1;");
        asset.track_maps = true;
        asset.source_map = Some(r#"{"version":3,"sources":[],"names":[],"mappings":""}"#.into());

        let stage = WriteMaps::new(
            Arc::new(fs.clone()),
            PathBuf::from("out/maps"),
            PathBuf::from("out/js"),
        );
        let out = stage.apply(vec![asset]).unwrap();

        assert_eq!(
            out[0].text().unwrap(),
            "var a=1;\n//# sourceMappingURL=../maps/scripts.min.js.map\n"
        );
        let map = fs.read_to_string(Path::new("out/maps/scripts.min.js.map")).unwrap();
        assert!(map.contains("\"file\":\"scripts.min.js\""));
        assert!(out[0].source_map.is_none());
    }

    #[test]
    fn assets_without_maps_pass_through() {
        let fs = MockFileSystem::new();
        let stage = WriteMaps::new(Arc::new(fs.clone()), "m".into(), "d".into());
        let out = stage.apply(vec![Asset::new("a.css", "a{}")]).unwrap();
        assert_eq!(out[0].text().unwrap(), "a{}");
        assert!(fs.files().is_empty());
    }
}
