// src/watch/patterns.rs

use std::fmt;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use globset::{GlobBuilder, GlobMatcher};

use crate::config::ConfigFile;
use crate::fs::FileSystem;
use crate::types::AssetGroup;

const GLOB_META: [char; 4] = ['*', '?', '[', '{'];

/// A compiled source glob such as `resources/scss/**/*.scss`.
///
/// The *base* is the run of leading directory components that contain no
/// glob metacharacters (`resources/scss`). Collection walks only the base
/// directory, and every collected file carries its path relative to the
/// base so destinations can mirror the source tree.
#[derive(Clone)]
pub struct SourceGlob {
    pattern: String,
    base: PathBuf,
    matcher: GlobMatcher,
}

impl fmt::Debug for SourceGlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceGlob")
            .field("pattern", &self.pattern)
            .field("base", &self.base)
            .finish_non_exhaustive()
    }
}

/// A file matched by a [`SourceGlob`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SourceFile {
    /// Path relative to the glob base, e.g. `icons/logo.png`.
    pub rel: PathBuf,
    /// Full path (project root joined with base and `rel`).
    pub path: PathBuf,
}

impl SourceGlob {
    pub fn new(pattern: &str) -> Result<Self> {
        let matcher = GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .with_context(|| format!("invalid glob pattern: {pattern}"))?
            .compile_matcher();

        Ok(Self {
            pattern: pattern.to_string(),
            base: glob_base(pattern),
            matcher,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Match a path relative to the project root, using `/` separators.
    pub fn matches(&self, rel_path: &str) -> bool {
        self.matcher.is_match(rel_path)
    }

    /// Collect every matching file under `root`, sorted by relative path.
    ///
    /// A base directory that does not exist yields no files.
    pub fn collect(&self, fs: &dyn FileSystem, root: &Path) -> Result<Vec<SourceFile>> {
        let base_dir = root.join(&self.base);
        if !fs.is_dir(&base_dir) {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        let mut stack = vec![base_dir.clone()];

        while let Some(dir) = stack.pop() {
            for path in fs.read_dir(&dir)? {
                if fs.is_dir(&path) {
                    stack.push(path);
                } else if fs.is_file(&path) {
                    let Ok(from_root) = path.strip_prefix(root) else {
                        continue;
                    };
                    if !self.matches(&slash_path(from_root)) {
                        continue;
                    }
                    if let Ok(rel) = path.strip_prefix(&base_dir) {
                        files.push(SourceFile {
                            rel: rel.to_path_buf(),
                            path: path.clone(),
                        });
                    }
                }
            }
        }

        files.sort();
        Ok(files)
    }
}

/// Leading directory components of `pattern` without glob metacharacters.
///
/// The last component is always the file part, so a literal pattern like
/// `resources/js/app.js` has base `resources/js`.
pub fn glob_base(pattern: &str) -> PathBuf {
    let components: Vec<Component<'_>> = Path::new(pattern).components().collect();
    let mut base = PathBuf::new();

    for component in components.iter().take(components.len().saturating_sub(1)) {
        let text = component.as_os_str().to_string_lossy();
        if text.contains(GLOB_META) {
            break;
        }
        base.push(component.as_os_str());
    }

    base
}

/// Render a relative path with forward slashes for glob matching.
pub fn slash_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// `path` relative to `root`, slash-separated.
///
/// Watcher events may report a different absolute prefix for the same
/// directory (symlinked temp dirs on macOS), so a failed prefix match is
/// retried on the canonical forms.
pub fn project_relative(root: &Path, path: &Path) -> Option<String> {
    if let Ok(rel) = path.strip_prefix(root) {
        return Some(slash_path(rel));
    }
    let root = root.canonicalize().ok()?;
    let path = path.canonicalize().ok()?;
    path.strip_prefix(&root).ok().map(slash_path)
}

/// The watch route of a single asset group.
#[derive(Debug, Clone)]
pub struct GroupWatchProfile {
    group: AssetGroup,
    glob: SourceGlob,
}

impl GroupWatchProfile {
    pub fn group(&self) -> AssetGroup {
        self.group
    }

    pub fn glob(&self) -> &SourceGlob {
        &self.glob
    }

    /// Whether a changed path (relative to the project root) belongs to this group.
    pub fn matches(&self, rel_path: &str) -> bool {
        self.glob.matches(rel_path)
    }
}

/// Build one profile per asset group from the configured source globs.
pub fn build_group_profiles(cfg: &ConfigFile) -> Result<Vec<GroupWatchProfile>> {
    AssetGroup::ALL
        .iter()
        .map(|&group| {
            let glob = SourceGlob::new(cfg.source_glob(group))
                .with_context(|| format!("building watch glob for group {group}"))?;
            Ok(GroupWatchProfile { group, glob })
        })
        .collect()
}
