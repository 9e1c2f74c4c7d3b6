//! Load configuration from XDG `config.toml` and project `.env`.
//!
//! Two entry points:
//! - [`load_and_apply`]: copies `[env]` and `.env` entries into the process environment with
//!   priority **existing env > .env > XDG**.
//! - [`load_settings`]: deserializes the `[settings]` table of the same XDG file into a
//!   caller-defined type (missing file or table yields `T::default()`).

mod dotenv;
mod xdg_toml;

use std::path::Path;

use serde::de::DeserializeOwned;
use thiserror::Error;

pub use xdg_toml::config_path;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("xdg config path: {0}")]
    XdgPath(String),
    #[error("read xdg config: {0}")]
    XdgRead(std::io::Error),
    #[error("parse xdg toml: {0}")]
    XdgParse(#[from] toml::de::Error),
    #[error("read .env: {0}")]
    DotenvRead(std::io::Error),
}

/// Sets environment variables from `.env` and the XDG `[env]` table, only for keys that are
/// **not** already set.
///
/// * `app_name`: e.g. `"quickread"`, used for `$XDG_CONFIG_HOME/<app_name>/config.toml`.
/// * `override_dir`: if `Some`, look for `.env` there instead of the current directory.
pub fn load_and_apply(app_name: &str, override_dir: Option<&Path>) -> Result<(), LoadError> {
    let xdg_map = xdg_toml::load_env_map(app_name)?;
    let dotenv_map = dotenv::load_env_map(override_dir).map_err(LoadError::DotenvRead)?;

    let mut keys: std::collections::BTreeSet<&String> = xdg_map.keys().collect();
    keys.extend(dotenv_map.keys());

    for key in keys {
        if std::env::var_os(key).is_some() {
            continue;
        }
        if let Some(v) = dotenv_map.get(key).or_else(|| xdg_map.get(key)) {
            std::env::set_var(key, v);
        }
    }

    Ok(())
}

/// Reads the `[settings]` table of `$XDG_CONFIG_HOME/<app_name>/config.toml` into `T`.
pub fn load_settings<T>(app_name: &str) -> Result<T, LoadError>
where
    T: DeserializeOwned + Default,
{
    match xdg_toml::load_settings_table(app_name)? {
        Some(table) => Ok(T::deserialize(toml::Value::Table(table))?),
        None => Ok(T::default()),
    }
}

/// Serializes tests that mutate `XDG_CONFIG_HOME`.
#[cfg(test)]
pub(crate) static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
