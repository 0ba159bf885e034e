use std::path::{Path, PathBuf};

use crate::error::ConfigError;

use super::types::AppConfig;

/// `~/.hopq`
pub fn hopq_data_dir() -> Option<PathBuf> {
    std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .ok()
        .map(|home| PathBuf::from(home).join(".hopq"))
}

pub fn load_from_path(path: &Path) -> Result<AppConfig, ConfigError> {
    let display = path.display().to_string();
    let s = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: display.clone(),
        source,
    })?;
    toml::from_str::<AppConfig>(&s).map_err(|source| ConfigError::Parse {
        path: display,
        source,
    })
}

/// Load `KEY=value` pairs from an env file into the process environment.
/// Variables already set are kept. `Ok(false)` when the file does not exist.
pub fn load_env_file(path: &Path) -> Result<bool, ConfigError> {
    if !path.exists() {
        return Ok(false);
    }
    dotenvy::from_path(path).map_err(|e| ConfigError::EnvFile {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    Ok(true)
}

/// Resolve configuration: explicit path, then `./hopq.toml`, then
/// `~/.hopq/config.toml`, then built-in defaults. Environment overrides are
/// applied last.
pub fn load_config(explicit: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut cfg = match explicit {
        Some(path) => load_from_path(path)?,
        None => {
            let local = Path::new("hopq.toml");
            let user = hopq_data_dir().map(|dir| dir.join("config.toml"));
            if local.exists() {
                load_from_path(local)?
            } else if let Some(user) = user.filter(|p| p.exists()) {
                load_from_path(&user)?
            } else {
                AppConfig::default()
            }
        }
    };

    apply_overrides(&mut cfg, |key| std::env::var(key).ok());
    Ok(cfg)
}

/// Apply `HOPQ_*` overrides. Blank values are ignored.
pub fn apply_overrides<F>(cfg: &mut AppConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(v) = get("HOPQ_BROKER_URL") {
        cfg.queue.broker = v;
    }
    if let Some(v) = get("HOPQ_BACKEND_URL") {
        cfg.queue.backend = v;
    }
    if let Some(v) = get("HOPQ_WORKERS") {
        match v.trim().parse::<usize>() {
            Ok(n) if n > 0 => cfg.queue.workers = n,
            _ => tracing::warn!("ignoring invalid HOPQ_WORKERS value: {}", v),
        }
    }
    if let Some(v) = get("HOPQ_EXECUTOR_SCRIPT") {
        cfg.executor.script = v;
    }
    if let Some(v) = get("HOPQ_UPLOAD_SCRIPT") {
        cfg.executor.upload_script = v;
    }
}
