// src/tasks/clean.rs

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info};

use crate::fs::FileSystem;
use crate::tasks::{blocking, TaskContext};
use crate::watch::{slash_path, SourceGlob};

/// Files under the output root matching this survive a clean.
pub const KEEP_PATTERN: &str = "**/*.html";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanReport {
    pub removed_files: usize,
    pub removed_dirs: usize,
}

pub async fn run(ctx: &Arc<TaskContext>) -> Result<()> {
    let fs = ctx.fs.clone();
    let out = ctx.config.output_dir();
    let report = blocking(move || clean_output(&*fs, &out)).await?;
    info!(
        removed_files = report.removed_files,
        removed_dirs = report.removed_dirs,
        "output cleaned"
    );
    Ok(())
}

/// Delete everything under `out` except HTML, then prune directories left
/// empty. The output root itself is kept; a missing root is a no-op.
pub fn clean_output(fs: &dyn FileSystem, out: &Path) -> Result<CleanReport> {
    let mut report = CleanReport::default();
    if !fs.is_dir(out) {
        debug!(path = %out.display(), "output dir missing; nothing to clean");
        return Ok(report);
    }

    let keep = SourceGlob::new(KEEP_PATTERN)?;
    sweep(fs, out, out, &keep, &mut report)?;
    Ok(report)
}

/// Returns whether `dir` is empty afterwards.
fn sweep(
    fs: &dyn FileSystem,
    dir: &Path,
    root: &Path,
    keep: &SourceGlob,
    report: &mut CleanReport,
) -> Result<bool> {
    let mut kept_any = false;

    for entry in fs.read_dir(dir)? {
        if fs.is_dir(&entry) {
            if sweep(fs, &entry, root, keep, report)? {
                fs.remove_dir(&entry)?;
                report.removed_dirs += 1;
            } else {
                kept_any = true;
            }
            continue;
        }

        let rel = slash_path(entry.strip_prefix(root).unwrap_or(&entry));
        if keep.matches(&rel) {
            kept_any = true;
        } else {
            debug!(path = %rel, "removing");
            fs.remove_file(&entry)?;
            report.removed_files += 1;
        }
    }

    Ok(!kept_any)
}
