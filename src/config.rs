//! Centralized configuration and builder for the parameter store node.
//!
//! Goals:
//! - Single place to collect startup inputs instead of scattering env lookups.
//! - NodeConfig::from_env() reads PARAMSTORE_* variables; CLI flags override.
//! - `validate()` enforces the two required paths before anything is loaded.
//!
//! Env:
//! - PARAMSTORE_DEFAULTS_PATH          root of the default *.yaml tree (required)
//! - PARAMSTORE_SAVE_PATH              persisted overrides file (required)
//! - PARAMSTORE_EXTENSION              default source extension (default "yaml")
//! - PARAMSTORE_DIRECT_WRITE           1|true|on|yes => in-place rewrite instead of tmp+rename
//! - PARAMSTORE_TOLERATE_CORRUPT_SAVE  1|true|on|yes => malformed save file is treated as empty
//! - PARAMSTORE_ADDR                   listen address of the bundled host bus

use anyhow::{anyhow, Result};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::loader::DEFAULT_EXTENSION;
use crate::persist::WriteMode;

pub const DEFAULT_ADDR: &str = "127.0.0.1:11411";

#[derive(Clone, Debug)]
pub struct NodeConfig {
    /// Directory scanned recursively for default sources.
    pub defaults_path: Option<PathBuf>,

    /// File holding saved overrides; rewritten on every successful save.
    pub save_path: Option<PathBuf>,

    /// Extension (without dot) of default source files.
    pub extension: String,

    /// How the save file is rewritten.
    pub write_mode: WriteMode,

    /// Treat a malformed save file as empty (warn) instead of failing startup.
    pub tolerate_corrupt_save: bool,

    /// Listen address of the bundled host bus.
    pub addr: String,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            defaults_path: None,
            save_path: None,
            extension: DEFAULT_EXTENSION.to_string(),
            write_mode: WriteMode::Atomic,
            tolerate_corrupt_save: false,
            addr: DEFAULT_ADDR.to_string(),
        }
    }
}

fn env_flag(name: &str) -> Option<bool> {
    std::env::var(name).ok().map(|v| {
        let s = v.trim().to_ascii_lowercase();
        s == "1" || s == "true" || s == "on" || s == "yes"
    })
}

fn env_nonempty(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|s| !s.is_empty())
}

impl NodeConfig {
    /// Load configuration from PARAMSTORE_* environment variables.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Some(p) = env_nonempty("PARAMSTORE_DEFAULTS_PATH") {
            cfg.defaults_path = Some(PathBuf::from(p));
        }
        if let Some(p) = env_nonempty("PARAMSTORE_SAVE_PATH") {
            cfg.save_path = Some(PathBuf::from(p));
        }
        if let Some(ext) = env_nonempty("PARAMSTORE_EXTENSION") {
            cfg.extension = ext.trim_start_matches('.').to_string();
        }
        if let Some(on) = env_flag("PARAMSTORE_DIRECT_WRITE") {
            cfg.write_mode = if on { WriteMode::Direct } else { WriteMode::Atomic };
        }
        if let Some(on) = env_flag("PARAMSTORE_TOLERATE_CORRUPT_SAVE") {
            cfg.tolerate_corrupt_save = on;
        }
        if let Some(addr) = env_nonempty("PARAMSTORE_ADDR") {
            cfg.addr = addr;
        }

        cfg
    }

    /// Fluent setters (builder-style) to override specific fields.

    pub fn with_defaults_path<P: Into<PathBuf>>(mut self, p: P) -> Self {
        self.defaults_path = Some(p.into());
        self
    }

    pub fn with_save_path<P: Into<PathBuf>>(mut self, p: P) -> Self {
        self.save_path = Some(p.into());
        self
    }

    pub fn with_extension<S: Into<String>>(mut self, ext: S) -> Self {
        self.extension = ext.into().trim_start_matches('.').to_string();
        self
    }

    pub fn with_write_mode(mut self, mode: WriteMode) -> Self {
        self.write_mode = mode;
        self
    }

    pub fn with_tolerate_corrupt_save(mut self, on: bool) -> Self {
        self.tolerate_corrupt_save = on;
        self
    }

    pub fn with_addr<S: Into<String>>(mut self, addr: S) -> Self {
        self.addr = addr.into();
        self
    }

    /// Both paths must be set; the extension must be non-empty.
    pub fn validate(&self) -> Result<()> {
        if self.defaults_path.is_none() {
            return Err(anyhow!(
                "defaults path is required (--defaults-path or PARAMSTORE_DEFAULTS_PATH)"
            ));
        }
        if self.save_path.is_none() {
            return Err(anyhow!(
                "save path is required (--save-path or PARAMSTORE_SAVE_PATH)"
            ));
        }
        if self.extension.is_empty() {
            return Err(anyhow!("default source extension must not be empty"));
        }
        Ok(())
    }

    /// Required paths, validated.
    pub fn paths(&self) -> Result<(&Path, &Path)> {
        self.validate()?;
        match (&self.defaults_path, &self.save_path) {
            (Some(d), Some(s)) => Ok((d.as_path(), s.as_path())),
            _ => Err(anyhow!("required paths missing")),
        }
    }
}

impl fmt::Display for NodeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "NodeConfig {{ \
             defaults_path: {}, \
             save_path: {}, \
             extension: {}, \
             write_mode: {:?}, \
             tolerate_corrupt_save: {}, \
             addr: {} \
             }}",
            self.defaults_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "<unset>".to_string()),
            self.save_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "<unset>".to_string()),
            self.extension,
            self.write_mode,
            self.tolerate_corrupt_save,
            self.addr,
        )
    }
}

/// Lightweight builder that produces a NodeConfig.
#[derive(Clone, Debug)]
pub struct NodeConfigBuilder {
    cfg: NodeConfig,
}

impl Default for NodeConfigBuilder {
    fn default() -> Self {
        // Start from env, then allow overrides.
        Self {
            cfg: NodeConfig::from_env(),
        }
    }
}

impl NodeConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a clean default (without reading env).
    pub fn from_default() -> Self {
        Self {
            cfg: NodeConfig::default(),
        }
    }

    pub fn defaults_path<P: Into<PathBuf>>(mut self, p: P) -> Self {
        self.cfg.defaults_path = Some(p.into());
        self
    }

    pub fn save_path<P: Into<PathBuf>>(mut self, p: P) -> Self {
        self.cfg.save_path = Some(p.into());
        self
    }

    pub fn extension<S: Into<String>>(mut self, ext: S) -> Self {
        self.cfg = self.cfg.with_extension(ext);
        self
    }

    pub fn write_mode(mut self, mode: WriteMode) -> Self {
        self.cfg.write_mode = mode;
        self
    }

    pub fn tolerate_corrupt_save(mut self, on: bool) -> Self {
        self.cfg.tolerate_corrupt_save = on;
        self
    }

    pub fn addr<S: Into<String>>(mut self, addr: S) -> Self {
        self.cfg.addr = addr.into();
        self
    }

    /// Finish the builder; fails if a required path is missing.
    pub fn build(self) -> Result<NodeConfig> {
        self.cfg.validate()?;
        Ok(self.cfg)
    }
}
