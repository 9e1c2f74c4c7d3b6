//! Read `$XDG_CONFIG_HOME/<app>/config.toml`: the `[env]` and `[settings]` tables.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::LoadError;

/// Path of the app's config file, whether or not it exists.
///
/// Uses `$XDG_CONFIG_HOME` when set, else `~/.config`.
pub fn config_path(app_name: &str) -> Result<PathBuf, LoadError> {
    let base = match std::env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
        Some(dir) => PathBuf::from(dir),
        None => dirs::home_dir()
            .map(|home| home.join(".config"))
            .ok_or_else(|| LoadError::XdgPath("home directory not found".to_string()))?,
    };
    Ok(base.join(app_name).join("config.toml"))
}

#[derive(serde::Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    env: HashMap<String, String>,
    #[serde(default)]
    settings: Option<toml::Table>,
}

fn read_config_file(app_name: &str) -> Result<Option<ConfigFile>, LoadError> {
    let path = config_path(app_name)?;
    if !path.is_file() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(&path).map_err(LoadError::XdgRead)?;
    Ok(Some(toml::from_str(&content)?))
}

/// `[env]` entries. Missing file or section returns an empty map.
pub fn load_env_map(app_name: &str) -> Result<HashMap<String, String>, LoadError> {
    Ok(read_config_file(app_name)?
        .map(|c| c.env)
        .unwrap_or_default())
}

/// `[settings]` table, if the file and the section exist.
pub fn load_settings_table(app_name: &str) -> Result<Option<toml::Table>, LoadError> {
    Ok(read_config_file(app_name)?.and_then(|c| c.settings))
}
