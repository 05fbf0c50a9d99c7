//! File-based locking for single-writer safety of the save file.
//!
//! Cross-platform (fs2) advisory lock held by a running node for its whole
//! lifetime, so two nodes never rewrite the same persisted file.
//!
//! Lock file path: <save_path>.lock
//! Lock is released on Drop.

use anyhow::{Context, Result};
use fs2::FileExt;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

pub struct SaveLock {
    file: std::fs::File,
    path: PathBuf,
}

impl SaveLock {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl std::fmt::Debug for SaveLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SaveLock").field("path", &self.path).finish()
    }
}

impl Drop for SaveLock {
    fn drop(&mut self) {
        // fs2 unlock errors on drop are ignored deliberately.
        let _ = self.file.unlock();
    }
}

pub fn lock_file_path(save_path: &Path) -> PathBuf {
    let mut s = save_path.as_os_str().to_os_string();
    s.push(".lock");
    PathBuf::from(s)
}

fn open_lock_file(save_path: &Path) -> Result<std::fs::File> {
    let path = lock_file_path(save_path);
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create directory {}", parent.display()))?;
        }
    }
    let f = OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .truncate(false)
        .open(&path)
        .with_context(|| format!("open lock file {}", path.display()))?;
    Ok(f)
}

/// Try to acquire the exclusive save lock. Returns Err if another node holds it.
pub fn try_acquire_save_lock(save_path: &Path) -> Result<SaveLock> {
    let file = open_lock_file(save_path)?;
    let path = lock_file_path(save_path);
    file.try_lock_exclusive().with_context(|| {
        format!(
            "save file is locked by another node: {}",
            path.display()
        )
    })?;
    Ok(SaveLock { file, path })
}
