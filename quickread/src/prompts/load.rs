//! Load prompt templates from `prompts.yaml` in a directory, falling back to the embedded copy.
//!
//! **Canonical source**: `quickread/prompts/prompts.yaml`, embedded at compile time. A
//! directory given explicitly or through `QUICKREAD_PROMPTS_DIR` may override any entry;
//! entries it leaves out keep the embedded text.

use std::path::{Path, PathBuf};

use super::{PromptError, PromptTemplates};

const EMBED_PROMPTS: &str = include_str!("../../prompts/prompts.yaml");

/// File name looked up inside the prompts directory.
pub const PROMPTS_FILE: &str = "prompts.yaml";

/// Env var naming the prompts directory.
pub const PROMPTS_DIR_ENV: &str = "QUICKREAD_PROMPTS_DIR";

fn prompts_dir(dir: Option<&Path>) -> Option<PathBuf> {
    dir.map(PathBuf::from).or_else(|| {
        std::env::var(PROMPTS_DIR_ENV)
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from)
    })
}

/// Templates parsed from the embedded YAML.
pub fn default_from_embedded() -> PromptTemplates {
    serde_yaml::from_str(EMBED_PROMPTS).unwrap_or_default()
}

/// Loads templates from `dir` (or `QUICKREAD_PROMPTS_DIR`), merged over the embedded ones.
///
/// No directory configured returns the embedded templates. A configured directory that does
/// not exist is an error; a directory without `prompts.yaml` is not.
pub fn load(dir: Option<&Path>) -> Result<PromptTemplates, PromptError> {
    let defaults = default_from_embedded();
    let Some(base) = prompts_dir(dir) else {
        return Ok(defaults);
    };
    if !base.is_dir() {
        return Err(PromptError::DirNotFound(base.display().to_string()));
    }
    let path = base.join(PROMPTS_FILE);
    let content = match std::fs::read_to_string(&path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(defaults),
        Err(e) => {
            return Err(PromptError::ReadFile {
                path: path.display().to_string(),
                message: e.to_string(),
            })
        }
    };
    let file: PromptTemplates =
        serde_yaml::from_str(&content).map_err(|e| PromptError::ParseYaml {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
    Ok(file.merged_over(defaults))
}
