//! ParamNode: startup (load → merge → publish) and the save handler.
//!
//! Lifecycle:
//! - `ParamNode::start()` validates config, takes the save-file lock, loads
//!   defaults, merges persisted overrides on top and publishes the result to
//!   the registry. Any error here means the node never becomes ready.
//! - `handle_save()` is the only mutation path afterwards. The whole body
//!   (registry read → table upsert → persist) runs under the table mutex, so
//!   concurrent callers are serialized.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{anyhow, Context, Result};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};

use crate::config::NodeConfig;
use crate::error::LoadError;
use crate::loader::{load_defaults, load_persisted};
use crate::lock::{try_acquire_save_lock, SaveLock};
use crate::metrics;
use crate::name::normalize;
use crate::persist::{persist, WriteMode};
use crate::registry::{publish, ParamRegistry};
use crate::table::{merge, ParamTable};

/// Save request: `{ "param": "<name>" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveRequest {
    pub param: String,
}

impl SaveRequest {
    pub fn new<S: Into<String>>(param: S) -> Self {
        Self {
            param: param.into(),
        }
    }
}

/// Save response: `{ "success": bool }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveResponse {
    pub success: bool,
}

/// Result of the startup merge, before anything is published.
#[derive(Debug, Clone)]
pub struct StartupTable {
    pub table: ParamTable,
    pub defaults_count: usize,
    /// None if the save file was absent (first run) or tolerated as corrupt.
    pub persisted_count: Option<usize>,
}

/// Load defaults and persisted overrides and merge them (persisted wins).
///
/// - Malformed default source: fatal.
/// - Missing save file: warning, treated as empty.
/// - Malformed save file: fatal unless `tolerate_corrupt_save`.
pub fn load_table(cfg: &NodeConfig) -> Result<StartupTable> {
    let (defaults_path, save_path) = cfg.paths()?;

    let defaults = load_defaults(defaults_path, &cfg.extension)
        .with_context(|| format!("load defaults from {}", defaults_path.display()))?;
    let defaults_count = defaults.len();

    let (persisted, persisted_count) = match load_persisted(save_path) {
        Ok(t) => {
            let n = t.len();
            (t, Some(n))
        }
        Err(e) if e.is_not_found() => {
            warn!(
                "failed to load persisted file {}; ignoring and assuming first run",
                save_path.display()
            );
            (ParamTable::new(), None)
        }
        Err(e @ LoadError::Parse { .. }) if cfg.tolerate_corrupt_save => {
            warn!("{e}; ignoring persisted overrides");
            (ParamTable::new(), None)
        }
        Err(e) => {
            return Err(anyhow::Error::new(e)
                .context(format!("load persisted file {}", save_path.display())))
        }
    };

    Ok(StartupTable {
        table: merge(defaults, persisted),
        defaults_count,
        persisted_count,
    })
}

pub struct ParamNode {
    save_path: PathBuf,
    write_mode: WriteMode,
    registry: Arc<dyn ParamRegistry>,
    table: Mutex<ParamTable>,
    _lock: SaveLock, // держим дескриптор
}

impl ParamNode {
    /// Run the full startup sequence and return a ready node.
    pub fn start(cfg: &NodeConfig, registry: Arc<dyn ParamRegistry>) -> Result<Self> {
        let (_, save_path) = cfg.paths()?;
        let save_path = save_path.to_path_buf();

        let lock = try_acquire_save_lock(&save_path)?;

        let startup = load_table(cfg)?;
        let published = publish(&startup.table, &*registry)?;

        info!(
            "node ready: {} default(s), {} persisted, {} published, save file {}",
            startup.defaults_count,
            startup
                .persisted_count
                .map(|n| n.to_string())
                .unwrap_or_else(|| "none".to_string()),
            published,
            save_path.display()
        );

        Ok(Self {
            save_path,
            write_mode: cfg.write_mode,
            registry,
            table: Mutex::new(startup.table),
            _lock: lock,
        })
    }

    pub fn save_path(&self) -> &Path {
        &self.save_path
    }

    fn lock_table(&self) -> Result<MutexGuard<'_, ParamTable>> {
        self.table
            .lock()
            .map_err(|_| anyhow!("managed parameter table lock poisoned"))
    }

    /// Copy of the managed table.
    pub fn table_snapshot(&self) -> Result<ParamTable> {
        Ok(self.lock_table()?.clone())
    }

    /// Capture the registry's live value of `req.param` into the save file.
    ///
    /// Ok({success:false}) if the registry has no such parameter (nothing is
    /// written). Err if the registry read or persistence fails; in the latter
    /// case the table entry is rolled back to its previous value. With
    /// `WriteMode::Atomic` the save file is then untouched; with
    /// `WriteMode::Direct` a failed write may already have truncated it.
    pub fn handle_save(&self, req: &SaveRequest) -> Result<SaveResponse> {
        let name = normalize(&req.param);
        let mut table = self.lock_table()?;

        let value = match self
            .registry
            .get(&name)
            .with_context(|| format!("registry get {name}"))?
        {
            Some(v) => v,
            None => {
                error!("asked to save non-existing parameter {name:?}");
                metrics::record_save_missing();
                return Ok(SaveResponse { success: false });
            }
        };

        info!("saving {name:?} - {value:?}");
        let prev = table.upsert(&name, value);

        if let Err(e) = persist(&table, &self.save_path, self.write_mode) {
            match prev {
                Some(p) => {
                    table.upsert(&name, p);
                }
                None => {
                    table.remove(&name);
                }
            }
            return Err(e.context(format!("persist after saving {name}")));
        }

        metrics::record_save_ok();
        Ok(SaveResponse { success: true })
    }

    /// RPC-facing wrapper: every error becomes `{success:false}` (logged).
    pub fn serve_save(&self, req: &SaveRequest) -> SaveResponse {
        match self.handle_save(req) {
            Ok(resp) => resp,
            Err(e) => {
                error!("save {:?} failed: {:?}", req.param, e);
                metrics::record_save_failed();
                SaveResponse { success: false }
            }
        }
    }
}
