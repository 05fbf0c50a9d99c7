use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_yaml::Value;

use paramstore::{
    load_defaults, load_table, LoadError, MemoryRegistry, NodeConfig, ParamNode, ParamRegistry,
};

fn unique_root(prefix: &str) -> PathBuf {
    let pid = std::process::id();
    let t = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("pstest-startup-{}-{}-{}", prefix, pid, t))
}

fn write(path: &Path, text: &str) -> Result<()> {
    if let Some(p) = path.parent() {
        fs::create_dir_all(p)?;
    }
    fs::write(path, text)?;
    Ok(())
}

fn config(root: &Path) -> NodeConfig {
    NodeConfig::default()
        .with_defaults_path(root.join("defaults"))
        .with_save_path(root.join("state").join("saved.yaml"))
}

#[test]
fn persisted_overrides_defaults() -> Result<()> {
    let root = unique_root("precedence");
    write(&root.join("defaults/base.yaml"), "speed: 1.5\nname: robot\n")?;
    write(&root.join("state/saved.yaml"), "/speed: 3.0\n/extra: true\n")?;

    let st = load_table(&config(&root))?;
    assert_eq!(st.defaults_count, 2);
    assert_eq!(st.persisted_count, Some(2));
    assert_eq!(st.table.len(), 3);
    assert_eq!(st.table.get("/speed"), Some(&Value::from(3.0)));
    assert_eq!(st.table.get("/name"), Some(&Value::from("robot")));
    assert_eq!(st.table.get("/extra"), Some(&Value::from(true)));
    Ok(())
}

#[test]
fn first_run_uses_defaults_only() -> Result<()> {
    let root = unique_root("first-run");
    write(&root.join("defaults/a.yaml"), "a: 1\n")?;
    write(&root.join("defaults/nested/deeper/b.yaml"), "/b: [1, 2, 3]\n")?;

    let cfg = config(&root);
    let st = load_table(&cfg)?;
    assert_eq!(st.persisted_count, None);

    let defaults = load_defaults(&root.join("defaults"), "yaml")?;
    assert_eq!(st.table, defaults);
    assert_eq!(st.table.len(), 2);

    // Full startup succeeds too and seeds the registry.
    let registry = MemoryRegistry::new();
    let shared: Arc<dyn ParamRegistry> = registry.clone();
    let node = ParamNode::start(&cfg, shared)?;
    assert_eq!(registry.get("/a")?, Some(Value::from(1)));
    assert_eq!(registry.len(), 2);
    assert_eq!(node.table_snapshot()?, defaults);
    Ok(())
}

#[test]
fn malformed_default_prevents_startup() -> Result<()> {
    let root = unique_root("bad-default");
    write(&root.join("defaults/good.yaml"), "ok: 1\n")?;
    write(&root.join("defaults/sub/bad.yaml"), "broken: [1, 2\n")?;

    let cfg = config(&root);
    assert!(load_table(&cfg).is_err());

    let registry = MemoryRegistry::new();
    let shared: Arc<dyn ParamRegistry> = registry.clone();
    assert!(ParamNode::start(&cfg, shared).is_err());
    assert!(registry.is_empty(), "nothing may be published on a failed startup");

    let err = load_defaults(&root.join("defaults"), "yaml").unwrap_err();
    assert!(matches!(err, LoadError::Parse { .. }));
    assert!(err.path().ends_with("sub/bad.yaml"));
    Ok(())
}

#[test]
fn colliding_defaults_resolve_in_path_order() -> Result<()> {
    let root = unique_root("collide");
    write(&root.join("defaults/10-base.yaml"), "shared: base\nonly_base: 1\n")?;
    write(&root.join("defaults/20-site.yaml"), "/shared: site\n")?;
    write(&root.join("defaults/30-robot/x.yaml"), "shared: robot\n")?;

    // Stable across repeated loads.
    for _ in 0..3 {
        let t = load_defaults(&root.join("defaults"), "yaml")?;
        assert_eq!(t.get("/shared"), Some(&Value::from("robot")));
        assert_eq!(t.get("/only_base"), Some(&Value::from(1)));
    }
    Ok(())
}

#[test]
fn file_next_to_same_named_directory_sorts_first() -> Result<()> {
    let root = unique_root("dir-vs-file");
    // "a.yaml" < "a/x.yaml" as paths, so the file inside the directory wins.
    write(&root.join("defaults/a.yaml"), "shared: from_a_yaml
")?;
    write(&root.join("defaults/a/x.yaml"), "shared: from_a_dir
")?;

    let t = load_defaults(&root.join("defaults"), "yaml")?;
    assert_eq!(t.get("/shared"), Some(&Value::from("from_a_dir")));
    Ok(())
}

#[test]
fn only_matching_extension_is_loaded() -> Result<()> {
    let root = unique_root("ext");
    write(&root.join("defaults/a.yaml"), "a: 1\n")?;
    write(&root.join("defaults/b.yml"), "b: 2\n")?;
    write(&root.join("defaults/notes.txt"), "not: yaml at all: [\n")?;
    write(&root.join("defaults/empty.yaml"), "")?;

    let t = load_defaults(&root.join("defaults"), "yaml")?;
    assert_eq!(t.names().collect::<Vec<_>>(), vec!["/a"]);

    let t = load_table(&config(&root).with_extension(".yml"))?.table;
    assert_eq!(t.names().collect::<Vec<_>>(), vec!["/b"]);
    Ok(())
}

#[test]
fn empty_defaults_root_gives_empty_table() -> Result<()> {
    let root = unique_root("empty");
    fs::create_dir_all(root.join("defaults"))?;
    let st = load_table(&config(&root))?;
    assert!(st.table.is_empty());
    assert_eq!(st.defaults_count, 0);
    Ok(())
}

#[test]
fn missing_defaults_root_is_fatal() -> Result<()> {
    let root = unique_root("no-root");
    let err = load_defaults(&root.join("defaults"), "yaml").unwrap_err();
    assert!(matches!(err, LoadError::Walk { .. }));
    assert!(load_table(&config(&root)).is_err());
    Ok(())
}

#[test]
fn malformed_save_file_is_fatal_unless_tolerated() -> Result<()> {
    let root = unique_root("bad-save");
    write(&root.join("defaults/a.yaml"), "a: 1\n")?;
    write(&root.join("state/saved.yaml"), "- not\n- a mapping\n")?;

    let cfg = config(&root);
    assert!(load_table(&cfg).is_err());

    let st = load_table(&cfg.with_tolerate_corrupt_save(true))?;
    assert_eq!(st.persisted_count, None);
    assert_eq!(st.table.get("/a"), Some(&Value::from(1)));
    Ok(())
}

#[test]
fn required_paths_are_enforced() {
    let cfg = NodeConfig::default().with_save_path("/tmp/x.yaml");
    assert!(cfg.validate().is_err());
    assert!(load_table(&cfg).is_err());

    let cfg = NodeConfig::default().with_defaults_path("/tmp");
    assert!(cfg.validate().is_err());

    let registry: Arc<dyn ParamRegistry> = MemoryRegistry::new();
    assert!(ParamNode::start(&NodeConfig::default(), registry).is_err());
}
