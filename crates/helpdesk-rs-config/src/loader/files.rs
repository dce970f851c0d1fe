//! Locating and reading config files.

use super::schema;
use crate::ConfigError;
use directories::UserDirs;
use log::debug;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// Config file name, both in a project directory and under `.helpdesk/`.
pub(super) const CONFIG_FILE: &str = "helpdesk.json5";
/// Hidden directory holding per-user and per-project config.
pub(super) const CONFIG_DIR: &str = ".helpdesk";

/// `~/.helpdesk/helpdesk.json5`, when a home directory is known.
pub(super) fn user_config_path() -> Option<PathBuf> {
    UserDirs::new().map(|dirs| dirs.home_dir().join(CONFIG_DIR).join(CONFIG_FILE))
}

/// Nearest project config above `cwd`. Within one directory `helpdesk.json5`
/// wins over `.helpdesk/helpdesk.json5`. The user config is never treated as
/// a project config.
pub(super) fn find_project_config(cwd: &Path, user_config: Option<&Path>) -> Option<PathBuf> {
    let user_config = user_config.map(same_file_key);
    cwd.ancestors()
        .flat_map(|dir| [dir.join(CONFIG_FILE), dir.join(CONFIG_DIR).join(CONFIG_FILE)])
        .filter(|candidate| candidate.is_file())
        .find(|candidate| user_config.as_ref() != Some(&same_file_key(candidate)))
}

/// Parse a JSON5 file and check it against the schema. `label` names the layer
/// in errors.
pub(super) fn read_layer(path: &Path, label: &str) -> Result<Map<String, Value>, ConfigError> {
    debug!("reading config file (layer={label}, path={})", path.display());
    let contents = fs::read_to_string(path)?;
    let value: Value = json5::from_str(&contents)?;
    schema::validate_layer_schema(&value, label)?;
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(ConfigError::Invalid(format!("{label}: expected object"))),
    }
}

fn same_file_key(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}
