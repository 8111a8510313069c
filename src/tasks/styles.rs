// src/tasks/styles.rs

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::pipeline::{Pipeline, StagePolicy};
use crate::tasks::{blocking, log_outcome, TaskContext};
use crate::transform::css::{combine_targets, targets_from_query};
use crate::transform::{Autoprefix, CompileScss, Concat, Dest, MinifyCss, SourcemapsInit, WriteMaps};
use crate::types::AssetGroup;
use crate::watch::slash_path;

/// Compile, prefix, minify and write the stylesheet, then ask connected
/// browsers to swap it in.
pub async fn run(ctx: &Arc<TaskContext>) -> Result<()> {
    let inner = ctx.clone();
    let written = blocking(move || build(&inner)).await?;

    let server_root = ctx.config.server_root();
    for path in written {
        let url = match path.strip_prefix(&server_root) {
            Ok(rel) => slash_path(rel),
            Err(_) => slash_path(&path),
        };
        ctx.live_reload.inject_css(url);
    }
    Ok(())
}

pub fn pipeline(ctx: &TaskContext) -> Result<Pipeline> {
    let cfg = &ctx.config;
    let dest = ctx.dest_dir(AssetGroup::Styles)?;
    let prefix_targets =
        targets_from_query(&cfg.styles.browsers).context("resolving [styles].browsers")?;
    let compat_targets =
        targets_from_query(&cfg.styles.compatibility).context("resolving [styles].compatibility")?;

    let mut pipeline = Pipeline::new("styles");
    if cfg.styles.source_maps {
        pipeline = pipeline.each(SourcemapsInit, StagePolicy::Abort);
    }
    pipeline = pipeline
        .guarded(CompileScss::new(ctx.fs.clone()))
        .guarded(Autoprefix::new(prefix_targets.clone()))
        .guarded(MinifyCss::new(combine_targets(&prefix_targets, &compat_targets)))
        .collect(Concat::new("rename", cfg.styles.output_name()));
    if cfg.styles.source_maps {
        pipeline = pipeline.collect(WriteMaps::new(ctx.fs.clone(), cfg.maps_dir(), dest.clone()));
    }
    Ok(pipeline.collect(Dest::new(ctx.fs.clone(), dest)))
}

/// Returns the paths written.
fn build(ctx: &TaskContext) -> Result<Vec<PathBuf>> {
    let dest = ctx.dest_dir(AssetGroup::Styles)?;
    let assets = ctx.read_assets(AssetGroup::Styles)?;
    let output = pipeline(ctx)?.run(assets)?;
    log_outcome(AssetGroup::Styles, &dest, &output);
    Ok(output.assets.iter().map(|a| dest.join(&a.path)).collect())
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::config::{ConfigFile, RawConfigFile};
    use crate::fs::mock::MockFileSystem;
    use crate::fs::FileSystem;
    use crate::server::ReloadMessage;

    fn context(fs: &MockFileSystem, source_maps: bool) -> Arc<TaskContext> {
        let mut raw = RawConfigFile::default();
        raw.styles.source_maps = source_maps;
        let cfg = ConfigFile::try_from(raw).unwrap().with_root(".");
        Arc::new(TaskContext::new(cfg, Arc::new(fs.clone())))
    }

    #[test]
    fn stage_order() {
        let fs = MockFileSystem::new();
        let names = pipeline(&context(&fs, true)).unwrap().stage_names();
        assert_eq!(
            names,
            vec!["sourcemaps-init", "scss", "autoprefix", "minify", "rename", "sourcemaps-write", "dest"]
        );
        let names = pipeline(&context(&fs, false)).unwrap().stage_names();
        assert_eq!(names, vec!["scss", "autoprefix", "minify", "rename", "dest"]);
    }

    #[tokio::test]
    async fn writes_minified_css_with_map_and_pushes_injection() {
        let fs = MockFileSystem::new();
        fs.add_file("resources/scss/_vars.scss", "$brand: red;\n");
        fs.add_file(
            "resources/scss/main.scss",
            "@import 'vars';\nbody {\n  color: $brand;\n}\n",
        );

        let ctx = context(&fs, true);
        let mut rx = ctx.live_reload.subscribe();
        run(&ctx).await.unwrap();

        let css = fs.read_to_string(Path::new("public_html/css/styles.min.css")).unwrap();
        assert!(css.starts_with("body{color:red}"), "{css}");
        assert!(css.contains("sourceMappingURL=../maps/styles.min.css.map"));
        assert!(fs.exists(Path::new("public_html/maps/styles.min.css.map")));

        assert_eq!(
            rx.recv().await.unwrap(),
            ReloadMessage::Css {
                path: "css/styles.min.css".into()
            }
        );
    }

    #[tokio::test]
    async fn a_broken_file_is_skipped_not_fatal() {
        let fs = MockFileSystem::new();
        fs.add_file("resources/scss/a.scss", "a { color: blue; }\n");
        fs.add_file("resources/scss/b.scss", "b { color: \n");

        run(&context(&fs, false)).await.unwrap();

        let css = fs.read_to_string(Path::new("public_html/css/styles.min.css")).unwrap();
        assert!(css.contains("a{color:"), "{css}");
        assert!(!css.contains("b{"));
    }
}
