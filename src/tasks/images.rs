// src/tasks/images.rs

use std::sync::Arc;

use anyhow::Result;

use crate::images::{Newer, OptimizeImage};
use crate::pipeline::Pipeline;
use crate::tasks::{blocking, log_outcome, TaskContext};
use crate::transform::Dest;
use crate::types::AssetGroup;

/// Optimize images whose destination is missing or older than the source.
pub async fn run(ctx: &Arc<TaskContext>) -> Result<()> {
    let inner = ctx.clone();
    blocking(move || build(&inner)).await
}

pub fn pipeline(ctx: &TaskContext) -> Result<Pipeline> {
    let dest = ctx.dest_dir(AssetGroup::Images)?;
    Ok(Pipeline::new("images")
        .guarded(Newer::new(ctx.fs.clone(), dest.clone()))
        .guarded(OptimizeImage::new(ctx.config.images.clone()))
        .collect(Dest::new(ctx.fs.clone(), dest)))
}

fn build(ctx: &TaskContext) -> Result<()> {
    let dest = ctx.dest_dir(AssetGroup::Images)?;
    let assets = ctx.read_assets(AssetGroup::Images)?;
    let output = pipeline(ctx)?.run(assets)?;
    log_outcome(AssetGroup::Images, &dest, &output);
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::config::{ConfigFile, RawConfigFile};
    use crate::fs::mock::MockFileSystem;
    use crate::fs::FileSystem;

    fn context(fs: &MockFileSystem) -> Arc<TaskContext> {
        let cfg = ConfigFile::try_from(RawConfigFile::default())
            .unwrap()
            .with_root(".");
        Arc::new(TaskContext::new(cfg, Arc::new(fs.clone())))
    }

    #[tokio::test]
    async fn only_stale_images_are_rewritten() {
        let fs = MockFileSystem::new();
        fs.add_file("resources/images/icons/logo.svg", "<svg><!-- x --><g><rect/></g></svg>");
        fs.add_file("resources/images/notes.txt", "plain");
        let ctx = context(&fs);

        run(&ctx).await.unwrap();
        let dest = Path::new("public_html/images/icons/logo.svg");
        assert_eq!(fs.read_to_string(dest).unwrap(), "<svg><rect/></svg>");
        assert_eq!(
            fs.read_to_string(Path::new("public_html/images/notes.txt")).unwrap(),
            "plain"
        );

        let first = fs.modified(dest).unwrap();
        run(&ctx).await.unwrap();
        assert_eq!(fs.modified(dest).unwrap(), first);

        fs.add_file("resources/images/icons/logo.svg", "<svg><circle/></svg>");
        run(&ctx).await.unwrap();
        assert_eq!(fs.read_to_string(dest).unwrap(), "<svg><circle/></svg>");
        assert!(fs.modified(dest).unwrap() > first);
    }
}
