// src/pipeline/mod.rs

//! File-stream pipelines.
//!
//! A [`Pipeline`] is an ordered list of [`Stage`]s folded over a stream of
//! [`Asset`]s. Per-file stages carry an explicit [`StagePolicy`]; a failing
//! file under `SkipAndLog` is dropped and reported in
//! [`PipelineOutput::skipped`] while the rest of the stream continues.

pub mod asset;
pub mod stage;

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{debug, warn};

pub use asset::Asset;
pub use stage::{Collect, FnTransform, Stage, StagePolicy, Transform};

/// A file dropped from the stream because a stage failed on it.
#[derive(Debug, Clone)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub stage: &'static str,
    pub error: String,
}

#[derive(Debug, Default)]
pub struct PipelineOutput {
    pub assets: Vec<Asset>,
    pub skipped: Vec<SkippedFile>,
}

#[derive(Debug)]
pub struct Pipeline {
    name: &'static str,
    stages: Vec<Stage>,
}

impl Pipeline {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            stages: Vec::new(),
        }
    }

    pub fn each(mut self, transform: impl Transform + 'static, policy: StagePolicy) -> Self {
        self.stages.push(Stage::Each {
            transform: Box::new(transform),
            policy,
        });
        self
    }

    /// Per-file stage whose failures drop only the failing file.
    pub fn guarded(self, transform: impl Transform + 'static) -> Self {
        self.each(transform, StagePolicy::SkipAndLog)
    }

    pub fn collect(mut self, collect: impl Collect + 'static) -> Self {
        self.stages.push(Stage::All(Box::new(collect)));
        self
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(Stage::name).collect()
    }

    /// Fold every stage over `assets` in order.
    pub fn run(&self, assets: Vec<Asset>) -> Result<PipelineOutput> {
        let mut stream = assets;
        let mut skipped = Vec::new();

        for stage in &self.stages {
            debug!(pipeline = self.name, stage = stage.name(), files = stream.len(), "running stage");
            stream = match stage {
                Stage::Each { transform, policy } => {
                    let mut next = Vec::with_capacity(stream.len());
                    for asset in stream {
                        let path = asset.origin.clone();
                        match transform.apply(asset) {
                            Ok(Some(out)) => next.push(out),
                            Ok(None) => {}
                            Err(err) => match policy {
                                StagePolicy::SkipAndLog => {
                                    warn!(
                                        pipeline = self.name,
                                        stage = transform.name(),
                                        path = %path.display(),
                                        "{err:#}"
                                    );
                                    skipped.push(SkippedFile {
                                        path,
                                        stage: transform.name(),
                                        error: format!("{err:#}"),
                                    });
                                }
                                StagePolicy::Abort => {
                                    return Err(err).with_context(|| {
                                        format!(
                                            "stage '{}' failed on {}",
                                            transform.name(),
                                            path.display()
                                        )
                                    });
                                }
                            },
                        }
                    }
                    next
                }
                Stage::All(collect) => collect
                    .apply(stream)
                    .with_context(|| format!("stage '{}' failed", collect.name()))?,
            };
        }

        Ok(PipelineOutput {
            assets: stream,
            skipped,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upper() -> FnTransform<impl Fn(Asset) -> Result<Option<Asset>> + Send + Sync> {
        FnTransform::new("upper", |mut a: Asset| {
            if a.contents.is_empty() {
                anyhow::bail!("empty input");
            }
            let text = a.text()?.to_uppercase();
            a.set_text(text);
            Ok(Some(a))
        })
    }

    fn assets() -> Vec<Asset> {
        vec![
            Asset::new("a.txt", "a"),
            Asset::new("broken.txt", ""),
            Asset::new("c.txt", "c"),
        ]
    }

    #[test]
    fn skip_and_log_drops_only_the_failing_file() {
        let out = Pipeline::new("test").guarded(upper()).run(assets()).unwrap();

        let contents: Vec<_> = out.assets.iter().map(|a| a.contents.clone()).collect();
        assert_eq!(contents, vec![b"A".to_vec(), b"C".to_vec()]);
        assert_eq!(out.skipped.len(), 1);
        assert_eq!(out.skipped[0].path, PathBuf::from("broken.txt"));
        assert_eq!(out.skipped[0].stage, "upper");
    }

    #[test]
    fn abort_fails_the_pipeline() {
        let err = Pipeline::new("test")
            .each(upper(), StagePolicy::Abort)
            .run(assets())
            .unwrap_err();
        assert!(format!("{err:#}").contains("empty input"));
    }

    #[test]
    fn returning_none_filters_without_error() {
        let drop_b = FnTransform::new("drop-b", |a: Asset| {
            Ok((a.file_name() != "broken.txt").then_some(a))
        });
        let out = Pipeline::new("test").guarded(drop_b).run(assets()).unwrap();
        assert_eq!(out.assets.len(), 2);
        assert!(out.skipped.is_empty());
    }
}
