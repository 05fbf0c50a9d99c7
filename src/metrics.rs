//! Lightweight global metrics for the parameter store.
//!
//! Потокобезопасные атомарные счётчики:
//! - Save requests (ok / missing parameter / failed)
//! - Startup publication
//! - Persistence writes (count, bytes, fsync calls)

use std::sync::atomic::{AtomicU64, Ordering};

// ----- Save requests -----
static SAVES_OK: AtomicU64 = AtomicU64::new(0);
static SAVES_MISSING: AtomicU64 = AtomicU64::new(0);
static SAVES_FAILED: AtomicU64 = AtomicU64::new(0);

// ----- Publication -----
static PARAMS_PUBLISHED: AtomicU64 = AtomicU64::new(0);

// ----- Persistence -----
static PERSIST_WRITES: AtomicU64 = AtomicU64::new(0);
static PERSIST_BYTES: AtomicU64 = AtomicU64::new(0);
static PERSIST_FSYNC_CALLS: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    pub saves_ok: u64,
    pub saves_missing: u64,
    pub saves_failed: u64,

    pub params_published: u64,

    pub persist_writes: u64,
    pub persist_bytes: u64,
    pub persist_fsync_calls: u64,
}

// ----- Recorders -----
pub fn record_save_ok() {
    SAVES_OK.fetch_add(1, Ordering::Relaxed);
}

pub fn record_save_missing() {
    SAVES_MISSING.fetch_add(1, Ordering::Relaxed);
}

pub fn record_save_failed() {
    SAVES_FAILED.fetch_add(1, Ordering::Relaxed);
}

pub fn record_published(n: u64) {
    PARAMS_PUBLISHED.fetch_add(n, Ordering::Relaxed);
}

pub fn record_persist(bytes: usize, fsync_calls: u64) {
    PERSIST_WRITES.fetch_add(1, Ordering::Relaxed);
    PERSIST_BYTES.fetch_add(bytes as u64, Ordering::Relaxed);
    PERSIST_FSYNC_CALLS.fetch_add(fsync_calls, Ordering::Relaxed);
}

// ----- Snapshot -----
pub fn snapshot() -> MetricsSnapshot {
    MetricsSnapshot {
        saves_ok: SAVES_OK.load(Ordering::Relaxed),
        saves_missing: SAVES_MISSING.load(Ordering::Relaxed),
        saves_failed: SAVES_FAILED.load(Ordering::Relaxed),

        params_published: PARAMS_PUBLISHED.load(Ordering::Relaxed),

        persist_writes: PERSIST_WRITES.load(Ordering::Relaxed),
        persist_bytes: PERSIST_BYTES.load(Ordering::Relaxed),
        persist_fsync_calls: PERSIST_FSYNC_CALLS.load(Ordering::Relaxed),
    }
}

/// Prometheus text exposition of the current counters.
pub fn render_prometheus() -> String {
    let m = snapshot();
    let mut out = String::new();

    let ver = env!("CARGO_PKG_VERSION");
    out.push_str("# HELP paramstore_build_info Build info.\n");
    out.push_str("# TYPE paramstore_build_info gauge\n");
    out.push_str(&format!("paramstore_build_info{{version=\"{}\"}} 1\n", ver));

    out.push_str("# HELP paramstore_saves_total Save requests by outcome.\n");
    out.push_str("# TYPE paramstore_saves_total counter\n");
    out.push_str(&format!("paramstore_saves_total{{outcome=\"ok\"}} {}\n", m.saves_ok));
    out.push_str(&format!("paramstore_saves_total{{outcome=\"missing\"}} {}\n", m.saves_missing));
    out.push_str(&format!("paramstore_saves_total{{outcome=\"failed\"}} {}\n", m.saves_failed));

    out.push_str("# HELP paramstore_params_published Parameters pushed to the registry at startup.\n");
    out.push_str("# TYPE paramstore_params_published counter\n");
    out.push_str(&format!("paramstore_params_published {}\n", m.params_published));

    out.push_str("# HELP paramstore_persist_writes_total Persisted file rewrites.\n");
    out.push_str("# TYPE paramstore_persist_writes_total counter\n");
    out.push_str(&format!("paramstore_persist_writes_total {}\n", m.persist_writes));

    out.push_str("# HELP paramstore_persist_bytes_total Bytes written to the persisted file.\n");
    out.push_str("# TYPE paramstore_persist_bytes_total counter\n");
    out.push_str(&format!("paramstore_persist_bytes_total {}\n", m.persist_bytes));

    out.push_str("# HELP paramstore_persist_fsync_calls_total fsync calls issued by persistence.\n");
    out.push_str("# TYPE paramstore_persist_fsync_calls_total counter\n");
    out.push_str(&format!("paramstore_persist_fsync_calls_total {}\n", m.persist_fsync_calls));

    out
}
