// src/tasks/scripts.rs

use std::sync::Arc;

use anyhow::{anyhow, Result};

use crate::pipeline::{Pipeline, StagePolicy};
use crate::tasks::{blocking, log_outcome, TaskContext};
use crate::transform::js::parse_target;
use crate::transform::{Concat, Dest, MinifyJs, SourcemapsInit, Transpile, WriteMaps};
use crate::types::AssetGroup;

/// Transpile, minify and bundle every script into the single bundle.
pub async fn run(ctx: &Arc<TaskContext>) -> Result<()> {
    let inner = ctx.clone();
    blocking(move || build(&inner)).await
}

pub fn pipeline(ctx: &TaskContext) -> Result<Pipeline> {
    let cfg = &ctx.config;
    let dest = ctx.dest_dir(AssetGroup::Scripts)?;
    let target = parse_target(&cfg.scripts.target)
        .ok_or_else(|| anyhow!("unknown script target '{}'", cfg.scripts.target))?;

    let mut pipeline = Pipeline::new("scripts");
    if cfg.scripts.source_maps {
        pipeline = pipeline.each(SourcemapsInit, StagePolicy::Abort);
    }
    pipeline = pipeline
        .guarded(Transpile::new(target))
        .guarded(MinifyJs)
        .collect(Concat::new("concat", cfg.scripts.bundle.clone()));
    if cfg.scripts.source_maps {
        pipeline = pipeline.collect(WriteMaps::new(ctx.fs.clone(), cfg.maps_dir(), dest.clone()));
    }
    Ok(pipeline.collect(Dest::new(ctx.fs.clone(), dest)))
}

fn build(ctx: &TaskContext) -> Result<()> {
    let dest = ctx.dest_dir(AssetGroup::Scripts)?;
    let assets = ctx.read_assets(AssetGroup::Scripts)?;
    let output = pipeline(ctx)?.run(assets)?;
    log_outcome(AssetGroup::Scripts, &dest, &output);
    Ok(())
}
