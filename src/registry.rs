//! External parameter registry seam + the startup publisher.
//!
//! The registry is process-wide shared state owned by the host middleware.
//! The node only needs `get`/`set`; everything else about it is out of scope.
//! `MemoryRegistry` is the in-process implementation used by the bundled host
//! bus and by tests.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use anyhow::{anyhow, Context, Result};
use log::{debug, info};

use crate::metrics;
use crate::name::normalize;
use crate::table::{ParamTable, ParamValue};

/// Live parameter store shared with other processes.
///
/// Names passed in are already normalized. Both operations are treated as
/// atomic and immediately consistent.
pub trait ParamRegistry: Send + Sync {
    /// Current live value, or None if the name does not exist.
    fn get(&self, name: &str) -> Result<Option<ParamValue>>;

    fn set(&self, name: &str, value: ParamValue) -> Result<()>;
}

impl<R: ParamRegistry + ?Sized> ParamRegistry for Arc<R> {
    fn get(&self, name: &str) -> Result<Option<ParamValue>> {
        (**self).get(name)
    }

    fn set(&self, name: &str, value: ParamValue) -> Result<()> {
        (**self).set(name, value)
    }
}

/// Push every table entry into the registry.
///
/// The first failing `set` aborts publication; the node must not become
/// ready with a partially seeded registry. Returns the number of entries
/// published.
pub fn publish(table: &ParamTable, registry: &dyn ParamRegistry) -> Result<usize> {
    let mut n = 0usize;
    for (name, value) in table {
        registry
            .set(name, value.clone())
            .with_context(|| format!("publish parameter {name}"))?;
        debug!("published {name}");
        n += 1;
    }
    metrics::record_published(n as u64);
    info!("published {n} parameter(s) to registry");
    Ok(n)
}

/// In-process registry (RwLock<BTreeMap>).
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    inner: RwLock<BTreeMap<String, ParamValue>>,
}

impl MemoryRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Point-in-time copy of every live entry.
    pub fn snapshot(&self) -> Result<BTreeMap<String, ParamValue>> {
        let g = self
            .inner
            .read()
            .map_err(|_| anyhow!("memory registry lock poisoned"))?;
        Ok(g.clone())
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|g| g.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ParamRegistry for MemoryRegistry {
    fn get(&self, name: &str) -> Result<Option<ParamValue>> {
        let g = self
            .inner
            .read()
            .map_err(|_| anyhow!("memory registry lock poisoned"))?;
        Ok(g.get(&normalize(name)).cloned())
    }

    fn set(&self, name: &str, value: ParamValue) -> Result<()> {
        let mut g = self
            .inner
            .write()
            .map_err(|_| anyhow!("memory registry lock poisoned"))?;
        g.insert(normalize(name), value);
        Ok(())
    }
}
