use std::path::PathBuf;

use paramstore::config::DEFAULT_ADDR;
use paramstore::{NodeConfig, NodeConfigBuilder, WriteMode};

// Single test: it mutates process env, which other tests here never read.
#[test]
fn env_then_builder_overrides() {
    std::env::set_var("PARAMSTORE_DEFAULTS_PATH", "/opt/robot/config");
    std::env::set_var("PARAMSTORE_SAVE_PATH", " /var/lib/robot/saved.yaml ");
    std::env::set_var("PARAMSTORE_EXTENSION", ".yml");
    std::env::set_var("PARAMSTORE_DIRECT_WRITE", "on");
    std::env::set_var("PARAMSTORE_TOLERATE_CORRUPT_SAVE", "0");
    std::env::remove_var("PARAMSTORE_ADDR");

    let cfg = NodeConfig::from_env();
    assert_eq!(cfg.defaults_path, Some(PathBuf::from("/opt/robot/config")));
    assert_eq!(cfg.save_path, Some(PathBuf::from("/var/lib/robot/saved.yaml")));
    assert_eq!(cfg.extension, "yml");
    assert_eq!(cfg.write_mode, WriteMode::Direct);
    assert!(!cfg.tolerate_corrupt_save);
    assert_eq!(cfg.addr, DEFAULT_ADDR);
    assert!(cfg.validate().is_ok());

    let cfg = NodeConfigBuilder::new()
        .save_path("/tmp/other.yaml")
        .write_mode(WriteMode::Atomic)
        .addr("0.0.0.0:9000")
        .build()
        .expect("both paths set");
    assert_eq!(cfg.defaults_path, Some(PathBuf::from("/opt/robot/config")));
    assert_eq!(cfg.save_path, Some(PathBuf::from("/tmp/other.yaml")));
    assert_eq!(cfg.write_mode, WriteMode::Atomic);
    assert_eq!(cfg.addr, "0.0.0.0:9000");

    let shown = cfg.to_string();
    assert!(shown.contains("save_path: /tmp/other.yaml"), "{shown}");

    // from_default() ignores env entirely.
    assert!(NodeConfigBuilder::from_default().build().is_err());
    assert!(NodeConfigBuilder::from_default()
        .defaults_path("/a")
        .extension("")
        .save_path("/b")
        .build()
        .is_err());

    std::env::remove_var("PARAMSTORE_DEFAULTS_PATH");
    std::env::remove_var("PARAMSTORE_SAVE_PATH");
    std::env::remove_var("PARAMSTORE_EXTENSION");
    std::env::remove_var("PARAMSTORE_DIRECT_WRITE");
    std::env::remove_var("PARAMSTORE_TOLERATE_CORRUPT_SAVE");

    let cfg = NodeConfig::from_env();
    assert!(cfg.defaults_path.is_none());
    assert!(cfg.validate().is_err());
}
