use std::{
    path::{Path, PathBuf},
    sync::Mutex,
};

use tracing::{debug, warn};

use crate::{env_subst::substitute_env, schema::PorchConfig};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &["porch.toml", "porch.yaml", "porch.yml", "porch.json"];

static CONFIG_DIR_OVERRIDE: Mutex<Option<PathBuf>> = Mutex::new(None);

/// Use `dir` instead of the user-global config directory.
pub fn set_config_dir(dir: PathBuf) {
    if let Ok(mut guard) = CONFIG_DIR_OVERRIDE.lock() {
        *guard = Some(dir);
    }
}

/// Drop a previous [`set_config_dir`] override.
pub fn clear_config_dir() {
    if let Ok(mut guard) = CONFIG_DIR_OVERRIDE.lock() {
        *guard = None;
    }
}

fn config_dir_override() -> Option<PathBuf> {
    CONFIG_DIR_OVERRIDE.lock().ok().and_then(|g| g.clone())
}

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> anyhow::Result<PorchConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. the directory set with [`set_config_dir`], if any
/// 2. `./porch.{toml,yaml,yml,json}` (project-local)
/// 3. `~/.config/porch/porch.{toml,yaml,yml,json}` (user-global)
///
/// Returns `PorchConfig::default()` if no config file is found or it fails
/// to parse.
pub fn discover_and_load() -> PorchConfig {
    if let Some(path) = find_config_file() {
        debug!(path = %path.display(), "loading config");
        match load_config(&path) {
            Ok(cfg) => return cfg,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            },
        }
    } else {
        debug!("no config file found, using defaults");
    }
    PorchConfig::default()
}

/// Find the first config file in standard locations.
pub(crate) fn find_config_file() -> Option<PathBuf> {
    if let Some(dir) = config_dir_override() {
        return first_existing(&dir);
    }
    first_existing(Path::new(".")).or_else(|| config_dir().and_then(|d| first_existing(&d)))
}

fn first_existing(dir: &Path) -> Option<PathBuf> {
    CONFIG_FILENAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.exists())
}

/// Returns the active config directory: the override, else
/// `~/.config/porch/`.
pub fn config_dir() -> Option<PathBuf> {
    config_dir_override().or_else(|| {
        directories::ProjectDirs::from("", "", "porch").map(|d| d.config_dir().to_path_buf())
    })
}

/// Returns the path of an existing config file, or the default TOML path.
pub fn find_or_default_config_path() -> PathBuf {
    if let Some(path) = find_config_file() {
        return path;
    }
    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("porch.toml")
}

/// Serialize `config` to TOML at `path`, creating parent directories.
pub fn save_config_to(config: &PorchConfig, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str =
        toml::to_string_pretty(config).map_err(|e| anyhow::anyhow!("serialize config: {e}"))?;
    std::fs::write(path, toml_str)?;
    debug!(path = %path.display(), "saved config");
    Ok(())
}

pub(crate) fn parse_config(raw: &str, path: &Path) -> anyhow::Result<PorchConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => anyhow::bail!("unsupported config format: .{ext}"),
    }
}
