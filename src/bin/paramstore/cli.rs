use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use paramstore::NodeConfig;

/// Parameter store node: seeds the registry from YAML defaults + saved
/// overrides and persists values on request.
#[derive(Parser, Debug)]
#[command(name = "paramstore", version, about = "Parameter persistence node")]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Cmd,
}

impl Cli {
    pub fn parse_args() -> Self {
        <Self as Parser>::parse()
    }
}

/// Startup paths. Flags override PARAMSTORE_DEFAULTS_PATH / PARAMSTORE_SAVE_PATH.
#[derive(Args, Debug)]
pub struct PathArgs {
    /// Directory scanned recursively for default *.yaml sources
    #[arg(long)]
    pub defaults_path: Option<PathBuf>,
    /// YAML file with saved overrides (rewritten on every save)
    #[arg(long)]
    pub save_path: Option<PathBuf>,
    /// Extension of default source files (without dot)
    #[arg(long)]
    pub extension: Option<String>,
}

impl PathArgs {
    /// Env-based config with CLI overrides applied.
    pub fn into_config(self) -> NodeConfig {
        let mut cfg = NodeConfig::from_env();
        if let Some(p) = self.defaults_path {
            cfg = cfg.with_defaults_path(p);
        }
        if let Some(p) = self.save_path {
            cfg = cfg.with_save_path(p);
        }
        if let Some(ext) = self.extension {
            cfg = cfg.with_extension(ext);
        }
        cfg
    }
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Start the node: load, merge, publish, then serve save requests
    ///
    /// Пример:
    ///   paramstore run --defaults-path ./config --save-path ./state/saved.yaml
    Run {
        #[command(flatten)]
        paths: PathArgs,
        /// Listen address of the bundled host bus
        #[arg(long)]
        addr: Option<String>,
        /// Rewrite the save file in place instead of tmp+rename
        #[arg(long, default_value_t = false)]
        direct_write: bool,
        /// Treat a malformed save file as empty instead of refusing to start
        #[arg(long, default_value_t = false)]
        tolerate_corrupt_save: bool,
    },
    /// Print the merged parameter table exactly as startup would build it
    Show {
        #[command(flatten)]
        paths: PathArgs,
        /// JSON output (single object)
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}
