use crate::error::{OpennessError, Result};
use crate::types::config::OpennessConfig;
use std::path::{Path, PathBuf};
use toml::map::Map;
use toml::Value;

pub const DEFAULT_CONFIG_FILE: &str = "openness.toml";
pub const DEFAULT_LOCAL_FILE: &str = ".openness/local.toml";
pub const DEFAULT_GLOBAL_CONFIG_FILE: &str = ".config/openness/config.toml";

/// Loads configuration for the dataset stored under `root`.
///
/// Returns `None` when `root` has no `openness.toml`; global and local files
/// only layer on top of a repo file.
pub fn load_config(root: &Path) -> Result<Option<OpennessConfig>> {
    let global = std::env::var_os("HOME")
        .map(PathBuf::from)
        .map(|home| home.join(DEFAULT_GLOBAL_CONFIG_FILE));
    load_config_with_global(root, global.as_deref())
}

pub(crate) fn load_config_with_global(
    root: &Path,
    global_path: Option<&Path>,
) -> Result<Option<OpennessConfig>> {
    let repo_path = root.join(DEFAULT_CONFIG_FILE);
    if !repo_path.exists() {
        return Ok(None);
    }

    let mut merged = Value::Table(Map::new());
    if let Some(path) = global_path {
        merge_file_if_exists(&mut merged, path)?;
    }
    merge_file_if_exists(&mut merged, &repo_path)?;
    merge_file_if_exists(&mut merged, &root.join(DEFAULT_LOCAL_FILE))?;

    let cfg: OpennessConfig = merged
        .try_into()
        .map_err(|e: toml::de::Error| OpennessError::ConfigParse(e.to_string()))?;
    cfg.validate()?;
    Ok(Some(cfg))
}

fn merge_file_if_exists(merged: &mut Value, path: &Path) -> Result<()> {
    if !path.exists() {
        return Ok(());
    }
    let value = read_toml_value(path)?;
    merge_toml(merged, value);
    Ok(())
}

fn read_toml_value(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content)
        .map_err(|e| OpennessError::ConfigParse(format!("{}: {}", path.display(), e)))
}

fn merge_toml(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Table(base_table), Value::Table(overlay_table)) => {
            for (key, value) in overlay_table {
                match base_table.get_mut(&key) {
                    Some(existing) => merge_toml(existing, value),
                    None => {
                        base_table.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => {
            *slot = value;
        }
    }
}
