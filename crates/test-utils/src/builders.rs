#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assetdag::config::{ConfigFile, RawConfigFile};
use assetdag::types::{AssetGroup, LintPolicy, Severity, TriggerWhileRunningBehaviour};
use tempfile::TempDir;

/// Builder for `ConfigFile` to simplify test setup.
///
/// Starts from the stock layout; the dev server binds an ephemeral port so
/// tests never collide.
pub struct ConfigBuilder {
    config: RawConfigFile,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        let mut config = RawConfigFile::default();
        config.server.port = 0;
        Self { config }
    }

    pub fn styles_lint(mut self, policy: LintPolicy) -> Self {
        self.config.styles.lint = policy;
        self
    }

    pub fn scripts_lint(mut self, policy: LintPolicy) -> Self {
        self.config.scripts.lint = policy;
        self
    }

    pub fn source_maps(mut self, enabled: bool) -> Self {
        self.config.styles.source_maps = enabled;
        self.config.scripts.source_maps = enabled;
        self
    }

    pub fn rule(mut self, group: AssetGroup, rule: &str, severity: Severity) -> Self {
        let rules = match group {
            AssetGroup::Styles => &mut self.config.styles.rules,
            _ => &mut self.config.scripts.rules,
        };
        rules.insert(rule.to_string(), severity);
        self
    }

    pub fn queue(mut self, behaviour: TriggerWhileRunningBehaviour, length: usize) -> Self {
        self.config.watch.triggered_while_running_behaviour = behaviour;
        self.config.watch.queue_length = length;
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }

    pub fn build_rooted(self, root: impl Into<PathBuf>) -> ConfigFile {
        self.build().with_root(root)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A project laid out in a temporary directory.
pub struct TempProject {
    dir: TempDir,
}

impl TempProject {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn join(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    pub fn write(&self, rel: &str, contents: impl AsRef<[u8]>) -> &Self {
        let path = self.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        fs::write(&path, contents).expect("write project file");
        self
    }

    /// Replace `rel` in one step (write a staging file, then rename), so a
    /// watcher never sees it half-written.
    pub fn save(&self, rel: &str, contents: impl AsRef<[u8]>) -> &Self {
        let path = self.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        let staging = self.join(".staging");
        fs::write(&staging, contents).expect("write staging file");
        fs::rename(&staging, &path).expect("move staging file into place");
        self
    }

    pub fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.join(rel)).unwrap_or_else(|e| panic!("reading {rel}: {e}"))
    }

    pub fn read_bytes(&self, rel: &str) -> Vec<u8> {
        fs::read(self.join(rel)).unwrap_or_else(|e| panic!("reading {rel}: {e}"))
    }

    pub fn exists(&self, rel: &str) -> bool {
        self.join(rel).exists()
    }

    /// Every file below `rel`, as sorted `/`-separated paths relative to the
    /// project root.
    pub fn files_under(&self, rel: &str) -> Vec<String> {
        let mut out = Vec::new();
        let mut stack = vec![self.join(rel)];
        while let Some(dir) = stack.pop() {
            let Ok(entries) = fs::read_dir(&dir) else {
                continue;
            };
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_dir() {
                    stack.push(path);
                } else if let Ok(rel) = path.strip_prefix(self.path()) {
                    out.push(rel.to_string_lossy().replace('\\', "/"));
                }
            }
        }
        out.sort();
        out
    }

    /// Config anchored on this project.
    pub fn config(&self, builder: ConfigBuilder) -> ConfigFile {
        builder.build_rooted(self.path())
    }
}

impl Default for TempProject {
    fn default() -> Self {
        Self::new()
    }
}
