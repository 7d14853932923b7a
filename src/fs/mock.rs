use super::FileSystem;
use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone)]
pub enum MockEntry {
    File { content: Vec<u8>, modified: u64 },
    Dir,
}

#[derive(Debug, Default)]
struct MockState {
    entries: HashMap<PathBuf, MockEntry>,
    /// Logical clock; every write advances it by one second.
    clock: u64,
}

/// In-memory filesystem with a logical modification clock.
///
/// Each write or [`touch`](MockFileSystem::touch) stamps the file with a
/// strictly newer time than anything written before, so staleness checks are
/// deterministic without sleeping.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    state: Arc<Mutex<MockState>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        let fs = Self::default();
        fs.lock().entries.insert(PathBuf::from("."), MockEntry::Dir);
        fs
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        // A poisoned mock only happens after a panicking test; keep going.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let path = path.as_ref().to_path_buf();
        let mut state = self.lock();
        state.clock += 1;
        let modified = state.clock;
        if let Some(parent) = path.parent() {
            Self::ensure_dirs(&mut state, parent);
        }
        state.entries.insert(
            path,
            MockEntry::File {
                content: content.into(),
                modified,
            },
        );
    }

    /// Bump a file's modification time to "now" (creating it empty if absent).
    pub fn touch(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        let existing = match self.lock().entries.get(path) {
            Some(MockEntry::File { content, .. }) => content.clone(),
            _ => Vec::new(),
        };
        self.add_file(path, existing);
    }

    /// Set an explicit logical timestamp (seconds since the epoch).
    pub fn set_modified(&self, path: impl AsRef<Path>, secs: u64) {
        let mut state = self.lock();
        if let Some(MockEntry::File { modified, .. }) = state.entries.get_mut(path.as_ref()) {
            *modified = secs;
        }
        state.clock = state.clock.max(secs);
    }

    fn ensure_dirs(state: &mut MockState, path: &Path) {
        let mut current = Some(path);
        while let Some(dir) = current {
            if dir.as_os_str().is_empty() {
                break;
            }
            state
                .entries
                .entry(dir.to_path_buf())
                .or_insert(MockEntry::Dir);
            current = dir.parent();
        }
    }
}

impl FileSystem for MockFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        match self.lock().entries.get(path) {
            Some(MockEntry::File { content, .. }) => {
                String::from_utf8(content.clone()).map_err(|e| anyhow!("Invalid UTF-8: {}", e))
            }
            Some(MockEntry::Dir) => Err(anyhow!("Is a directory: {:?}", path)),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        self.add_file(path, contents);
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.lock().entries.contains_key(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        matches!(self.lock().entries.get(path), Some(MockEntry::File { .. }))
    }

    fn is_dir(&self, path: &Path) -> bool {
        matches!(self.lock().entries.get(path), Some(MockEntry::Dir))
    }

    fn modified(&self, path: &Path) -> Result<SystemTime> {
        match self.lock().entries.get(path) {
            Some(MockEntry::File { modified, .. }) => Ok(UNIX_EPOCH + Duration::from_secs(*modified)),
            Some(MockEntry::Dir) => Ok(UNIX_EPOCH),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        Self::ensure_dirs(&mut self.lock(), path);
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        match self.lock().entries.remove(path) {
            Some(_) => Ok(()),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn remove_dir_all(&self, path: &Path) -> Result<()> {
        self.lock().entries.retain(|p, _| !p.starts_with(path));
        Ok(())
    }
}
