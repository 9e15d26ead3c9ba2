//! Persistent detector options (JSON file in the user data directory).

use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;
use vadkit_core::VadOptions;

pub fn default_settings_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("vadkit")
            .join("options.json")
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                std::env::var_os("HOME")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("/tmp"))
                    .join(".config")
            })
            .join("vadkit")
            .join("options.json")
    }
}

/// Read options from `path`, falling back to defaults when the file is
/// missing or malformed. Validation happens later, when the detector is
/// built.
pub fn load_options(path: &Path) -> VadOptions {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return VadOptions::default(),
        Err(e) => {
            warn!("failed to read {}: {e}; using defaults", path.display());
            return VadOptions::default();
        }
    };
    serde_json::from_str::<VadOptions>(&raw).unwrap_or_else(|e| {
        warn!("failed to parse {}: {e}; using defaults", path.display());
        VadOptions::default()
    })
}

pub fn save_options(path: &Path, options: &VadOptions) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(options).map_err(std::io::Error::other)?;
    fs::write(path, json)
}
