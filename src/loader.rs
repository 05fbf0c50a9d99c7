//! Loaders for the default source set (directory tree) and the persisted
//! source set (single file).
//!
//! Both return a `ParamTable` with normalized keys. Format of every file: one
//! YAML document whose top level is a mapping `name -> value`; an empty
//! document counts as an empty mapping.

use std::ffi::OsStr;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use log::debug;
use serde_yaml::Value;
use walkdir::WalkDir;

use crate::error::LoadError;
use crate::table::ParamTable;

/// Default file extension of parameter sources.
pub const DEFAULT_EXTENSION: &str = "yaml";

/// Parse one parameter file.
///
/// NotFound if the file cannot be opened, Parse if its content is not a
/// mapping with string keys.
pub fn load_file(path: &Path) -> Result<ParamTable, LoadError> {
    let mut f = File::open(path).map_err(|source| LoadError::NotFound {
        path: path.to_path_buf(),
        source,
    })?;
    let mut text = String::new();
    f.read_to_string(&mut text).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_table(&text, path)
}

/// Parse YAML text into a table. `origin` is only used in error messages.
pub fn parse_table(text: &str, origin: &Path) -> Result<ParamTable, LoadError> {
    let doc: Value = serde_yaml::from_str(text).map_err(|e| LoadError::Parse {
        path: origin.to_path_buf(),
        reason: e.to_string(),
    })?;

    let mapping = match doc {
        Value::Null => return Ok(ParamTable::new()),
        Value::Mapping(m) => m,
        other => {
            return Err(LoadError::Parse {
                path: origin.to_path_buf(),
                reason: format!("top-level document must be a mapping, got {}", kind_of(&other)),
            })
        }
    };

    let mut table = ParamTable::new();
    for (k, v) in mapping {
        match k {
            Value::String(name) => {
                table.upsert(&name, v);
            }
            other => {
                return Err(LoadError::Parse {
                    path: origin.to_path_buf(),
                    reason: format!("parameter names must be strings, got {}", kind_of(&other)),
                })
            }
        }
    }
    Ok(table)
}

/// Every file under `root` (recursively) whose extension is `extension`,
/// in lexicographic path order.
///
/// walkdir only orders siblings, so `a/x.yaml` would come before `a.yaml`;
/// the collected list is sorted as a whole.
pub fn discover_sources(root: &Path, extension: &str) -> Result<Vec<PathBuf>, LoadError> {
    let ext = OsStr::new(extension);
    let mut out = Vec::new();
    for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
        let entry = entry.map_err(|source| LoadError::Walk {
            root: root.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_file() && entry.path().extension() == Some(ext) {
            out.push(entry.into_path());
        }
    }
    out.sort();
    Ok(out)
}

/// Merge every default source under `root` into one table.
///
/// Files are folded in sorted path order with last-write-wins, so for a key
/// defined in several files the file that sorts last wins. Any malformed file
/// aborts the whole load.
pub fn load_defaults(root: &Path, extension: &str) -> Result<ParamTable, LoadError> {
    let mut acc = ParamTable::new();
    for path in discover_sources(root, extension)? {
        let part = load_file(&path)?;
        debug!("defaults: {} -> {} parameter(s)", path.display(), part.len());
        acc.extend_from(part);
    }
    Ok(acc)
}

/// Load previously saved overrides. A missing file comes back as
/// `LoadError::NotFound`; the caller decides whether that is fatal.
pub fn load_persisted(path: &Path) -> Result<ParamTable, LoadError> {
    load_file(path)
}

fn kind_of(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}
