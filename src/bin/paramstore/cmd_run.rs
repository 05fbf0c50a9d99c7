use anyhow::Result;
use std::sync::Arc;

use paramstore::{HostBus, MemoryRegistry, ParamNode, ParamRegistry, WriteMode};

use super::cli::PathArgs;

pub fn exec(
    paths: PathArgs,
    addr: Option<String>,
    direct_write: bool,
    tolerate_corrupt_save: bool,
) -> Result<()> {
    let mut cfg = paths.into_config();
    if let Some(a) = addr {
        cfg = cfg.with_addr(a);
    }
    if direct_write {
        cfg = cfg.with_write_mode(WriteMode::Direct);
    }
    if tolerate_corrupt_save {
        cfg = cfg.with_tolerate_corrupt_save(true);
    }
    cfg.validate()?;
    log::debug!("{}", cfg);

    let registry = MemoryRegistry::new();
    let shared: Arc<dyn ParamRegistry> = registry.clone();
    let node = Arc::new(ParamNode::start(&cfg, shared)?);

    HostBus::new(node, registry).serve(&cfg.addr)
}
