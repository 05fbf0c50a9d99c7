//! Persistence writer: serialize the whole managed table to the save file.
//!
//! Политика:
//! - Atomic (default): запись в `<file>.tmp`, sync_all, rename поверх цели,
//!   затем fsync родительского каталога (best-effort на Windows).
//! - Direct: truncate + write + sync_all прямо в целевой файл. A crash
//!   mid-write can leave a truncated file; kept for parity with hosts that
//!   watch the inode of the save file.
//!
//! Either way, once `persist()` returns Ok the bytes are on the medium.

use anyhow::{Context, Result};
use log::debug;
use std::fs::{self, OpenOptions};
#[cfg(unix)]
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::metrics;
use crate::table::ParamTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    /// tmp + rename + dir fsync.
    #[default]
    Atomic,
    /// In-place rewrite + fsync.
    Direct,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PersistStats {
    pub entries: usize,
    pub bytes: usize,
    pub fsync_calls: u64,
}

#[inline]
fn tmp_path(path: &Path) -> PathBuf {
    let mut s = path.as_os_str().to_os_string();
    s.push(".tmp");
    PathBuf::from(s)
}

#[cfg(unix)]
fn fsync_dir(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            let dir = File::open(parent)?;
            dir.sync_all()?;
        }
    }
    Ok(())
}
#[cfg(not(unix))]
fn fsync_dir(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create directory {}", parent.display()))?;
        }
    }
    Ok(())
}

fn write_synced(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut f = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
        .with_context(|| format!("open {}", path.display()))?;
    f.write_all(bytes)
        .with_context(|| format!("write {}", path.display()))?;
    f.sync_all()
        .with_context(|| format!("fsync {}", path.display()))?;
    Ok(())
}

/// Serialize the entire table and durably write it to `path`.
pub fn persist(table: &ParamTable, path: &Path, mode: WriteMode) -> Result<PersistStats> {
    let text = table.to_yaml_string()?;
    ensure_parent(path)?;

    let mut stats = PersistStats {
        entries: table.len(),
        bytes: text.len(),
        fsync_calls: 1,
    };

    match mode {
        WriteMode::Direct => {
            write_synced(path, text.as_bytes())?;
        }
        WriteMode::Atomic => {
            let tmp = tmp_path(path);
            let _ = fs::remove_file(&tmp); // best-effort

            let replaced = write_synced(&tmp, text.as_bytes()).and_then(|()| {
                fs::rename(&tmp, path)
                    .with_context(|| format!("rename {} -> {}", tmp.display(), path.display()))
            });
            if let Err(e) = replaced {
                // tmp holds the rejected table
                let _ = fs::remove_file(&tmp);
                return Err(e);
            }
            if fsync_dir(path).is_ok() {
                stats.fsync_calls += 1;
            }
        }
    }

    metrics::record_persist(stats.bytes, stats.fsync_calls);
    debug!(
        "persisted {} parameter(s), {} B -> {} ({:?})",
        stats.entries,
        stats.bytes,
        path.display(),
        mode
    );
    Ok(stats)
}
