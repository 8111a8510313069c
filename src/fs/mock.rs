// src/fs/mock.rs

use super::FileSystem;
use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone)]
pub enum MockEntry {
    /// Contents plus a logical modification time in seconds.
    File(Vec<u8>, u64),
    Dir(Vec<String>), // List of child names
}

#[derive(Debug, Default)]
struct MockState {
    entries: HashMap<PathBuf, MockEntry>,
    /// Logical clock; every write ticks it so later writes are newer.
    clock: u64,
}

/// In-memory filesystem for tests.
///
/// Modification times come from a logical clock instead of the wall clock,
/// so freshness checks are deterministic.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    state: Arc<Mutex<MockState>>,
}

/// Drop `.` components so `./a/b` and `a/b` name the same entry.
fn normalize(path: &Path) -> PathBuf {
    let out: PathBuf = path
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();
    if out.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        out
    }
}

fn parent_of(path: &Path) -> Option<&Path> {
    let parent = path.parent()?;
    if parent.as_os_str().is_empty() {
        Some(Path::new("."))
    } else {
        Some(parent)
    }
}

impl MockFileSystem {
    pub fn new() -> Self {
        let mut state = MockState::default();
        // Ensure root exists
        state
            .entries
            .insert(PathBuf::from("."), MockEntry::Dir(Vec::new()));

        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        // A poisoned mock only happens after a test already panicked.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let path = normalize(path.as_ref());
        let mut state = self.lock();
        state.clock += 1;
        let mtime = state.clock;
        state
            .entries
            .insert(path.clone(), MockEntry::File(content.into(), mtime));
        Self::link_into_parent(&mut state.entries, &path);
    }

    /// Override the logical mtime of an existing file.
    pub fn set_modified(&self, path: impl AsRef<Path>, secs: u64) {
        let mut state = self.lock();
        if let Some(MockEntry::File(_, mtime)) = state.entries.get_mut(&normalize(path.as_ref())) {
            *mtime = secs;
        }
        state.clock = state.clock.max(secs);
    }

    /// All file paths currently stored, sorted.
    pub fn files(&self) -> Vec<PathBuf> {
        let state = self.lock();
        let mut out: Vec<PathBuf> = state
            .entries
            .iter()
            .filter(|(_, e)| matches!(e, MockEntry::File(..)))
            .map(|(p, _)| p.clone())
            .collect();
        out.sort();
        out
    }

    fn link_into_parent(entries: &mut HashMap<PathBuf, MockEntry>, path: &Path) {
        let Some(parent) = parent_of(path) else {
            return;
        };
        if parent == path {
            return;
        }
        if !entries.contains_key(parent) {
            entries.insert(parent.to_path_buf(), MockEntry::Dir(Vec::new()));
            Self::link_into_parent(entries, parent);
        }
        if let Some(MockEntry::Dir(children)) = entries.get_mut(parent) {
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                if !children.iter().any(|c| c == name) {
                    children.push(name.to_string());
                }
            }
        }
    }

    fn unlink_from_parent(entries: &mut HashMap<PathBuf, MockEntry>, path: &Path) {
        let (Some(parent), Some(name)) = (parent_of(path), path.file_name()) else {
            return;
        };
        if let Some(MockEntry::Dir(children)) = entries.get_mut(parent) {
            children.retain(|c| std::ffi::OsStr::new(c) != name);
        }
    }
}

impl FileSystem for MockFileSystem {
    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let path = normalize(path);
        let path = path.as_path();
        let state = self.lock();
        match state.entries.get(path) {
            Some(MockEntry::File(content, _)) => Ok(content.clone()),
            Some(MockEntry::Dir(_)) => Err(anyhow!("Is a directory: {:?}", path)),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        let bytes = self.read(path)?;
        String::from_utf8(bytes).map_err(|e| anyhow!("Invalid UTF-8: {}", e))
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        self.add_file(path, contents);
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        let path = normalize(path);
        let path = path.as_path();
        self.lock().entries.contains_key(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        let path = normalize(path);
        let path = path.as_path();
        matches!(self.lock().entries.get(path), Some(MockEntry::File(..)))
    }

    fn is_dir(&self, path: &Path) -> bool {
        let path = normalize(path);
        let path = path.as_path();
        matches!(self.lock().entries.get(path), Some(MockEntry::Dir(_)))
    }

    fn modified(&self, path: &Path) -> Result<SystemTime> {
        let path = normalize(path);
        let path = path.as_path();
        match self.lock().entries.get(path) {
            Some(MockEntry::File(_, mtime)) => Ok(UNIX_EPOCH + Duration::from_secs(*mtime)),
            Some(MockEntry::Dir(_)) => Ok(UNIX_EPOCH),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf> {
        // In mock, we just return the path as is, assuming absolute paths are used in tests
        Ok(path.to_path_buf())
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        let path = normalize(path);
        let path = path.as_path();
        let mut state = self.lock();
        match state.entries.get(path) {
            Some(MockEntry::File(..)) => Err(anyhow!("Is a file: {:?}", path)),
            Some(MockEntry::Dir(_)) => Ok(()),
            None => {
                state
                    .entries
                    .insert(path.to_path_buf(), MockEntry::Dir(Vec::new()));
                Self::link_into_parent(&mut state.entries, path);
                Ok(())
            }
        }
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        let path = normalize(path);
        let path = path.as_path();
        let mut state = self.lock();
        match state.entries.get(path) {
            Some(MockEntry::File(..)) => {
                state.entries.remove(path);
                Self::unlink_from_parent(&mut state.entries, path);
                Ok(())
            }
            Some(MockEntry::Dir(_)) => Err(anyhow!("Is a directory: {:?}", path)),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn remove_dir(&self, path: &Path) -> Result<()> {
        let path = normalize(path);
        let path = path.as_path();
        let mut state = self.lock();
        match state.entries.get(path) {
            Some(MockEntry::Dir(children)) if children.is_empty() => {
                state.entries.remove(path);
                Self::unlink_from_parent(&mut state.entries, path);
                Ok(())
            }
            Some(MockEntry::Dir(_)) => Err(anyhow!("Directory not empty: {:?}", path)),
            Some(MockEntry::File(..)) => Err(anyhow!("Not a directory: {:?}", path)),
            None => Err(anyhow!("Directory not found: {:?}", path)),
        }
    }

    /// Entries are joined onto `path` as given, so `./dir` lists `./dir/x`.
    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let state = self.lock();
        match state.entries.get(&normalize(path)) {
            Some(MockEntry::Dir(children)) => {
                let mut out: Vec<PathBuf> = children.iter().map(|name| path.join(name)).collect();
                out.sort();
                Ok(out)
            }
            _ => Err(anyhow!("Not a directory or not found: {:?}", path)),
        }
    }
}
