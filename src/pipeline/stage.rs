// src/pipeline/stage.rs

use std::fmt;

use anyhow::Result;

use crate::pipeline::Asset;

/// A per-file stage: one asset in, zero or one asset out.
///
/// Returning `Ok(None)` drops the asset from the stream without it being an
/// error (e.g. SCSS partials, up-to-date images).
pub trait Transform: Send + Sync {
    fn name(&self) -> &'static str;
    fn apply(&self, asset: Asset) -> Result<Option<Asset>>;
}

/// A whole-stream stage (concatenation, writing to disk).
pub trait Collect: Send + Sync {
    fn name(&self) -> &'static str;
    fn apply(&self, assets: Vec<Asset>) -> Result<Vec<Asset>>;
}

/// What a per-file stage does when it errors on one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StagePolicy {
    /// Log the error, drop the file, and continue with the rest.
    SkipAndLog,
    /// Fail the whole pipeline.
    Abort,
}

pub enum Stage {
    Each {
        transform: Box<dyn Transform>,
        policy: StagePolicy,
    },
    All(Box<dyn Collect>),
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Each { transform, .. } => transform.name(),
            Stage::All(collect) => collect.name(),
        }
    }
}

impl fmt::Debug for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Each { transform, policy } => f
                .debug_struct("Each")
                .field("name", &transform.name())
                .field("policy", policy)
                .finish(),
            Stage::All(collect) => f.debug_tuple("All").field(&collect.name()).finish(),
        }
    }
}

/// Adapter so plain functions can be used as per-file stages.
pub struct FnTransform<F> {
    name: &'static str,
    f: F,
}

impl<F> FnTransform<F>
where
    F: Fn(Asset) -> Result<Option<Asset>> + Send + Sync,
{
    pub fn new(name: &'static str, f: F) -> Self {
        Self { name, f }
    }
}

impl<F> Transform for FnTransform<F>
where
    F: Fn(Asset) -> Result<Option<Asset>> + Send + Sync,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn apply(&self, asset: Asset) -> Result<Option<Asset>> {
        (self.f)(asset)
    }
}
