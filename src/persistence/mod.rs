use std::{
    fs,
    path::{
        Path,
        PathBuf,
    },
};

use serde::{
    Deserialize,
    Serialize,
};
use tracing::{
    debug,
    warn,
};

use crate::{
    core::ImportError,
    import::ImportConfig,
};

const APP_NAME: &str = "jpdb-backfill";
const CONFIG_FILE: &str = "config.json";

pub fn get_app_data_dir() -> PathBuf {
    if let Some(data_dir) = dirs::data_local_dir() {
        let app_dir = data_dir.join(APP_NAME);
        let _ = fs::create_dir_all(&app_dir);
        app_dir
    } else {
        PathBuf::from(".")
    }
}

pub fn get_data_file_path(filename: &str) -> PathBuf {
    get_app_data_dir().join(filename)
}

pub fn save_json_to<T: Serialize>(data: &T, path: &Path) -> Result<(), ImportError> {
    let json = serde_json::to_string_pretty(data)?;
    fs::write(path, json)?;
    debug!("Data saved to: {}", path.display());
    Ok(())
}

/// Missing files load as `T::default()`; unreadable or invalid ones are errors.
pub fn load_json_from<T: for<'de> Deserialize<'de> + Default>(
    path: &Path,
) -> Result<T, ImportError> {
    if !path.exists() {
        return Ok(T::default());
    }

    let json = fs::read_to_string(path)?;
    let data: T =
        serde_json::from_str(&json).map_err(|e| ImportError::parse(path.display().to_string(), e))?;
    debug!("Data loaded from: {}", path.display());
    Ok(data)
}

pub fn save_json<T: Serialize>(data: &T, filename: &str) -> Result<(), ImportError> {
    save_json_to(data, &get_data_file_path(filename))
}

pub fn load_json<T: for<'de> Deserialize<'de> + Default>(filename: &str) -> Result<T, ImportError> {
    load_json_from(&get_data_file_path(filename))
}

pub fn load_json_or_default<T: for<'de> Deserialize<'de> + Default>(filename: &str) -> T {
    match load_json::<T>(filename) {
        Ok(data) => data,
        Err(e) => {
            warn!("Failed to load {}: {}. Using defaults.", filename, e);
            T::default()
        }
    }
}

pub fn load_config() -> ImportConfig {
    load_json_or_default(CONFIG_FILE)
}

pub fn save_config(config: &ImportConfig) -> Result<(), ImportError> {
    save_json(config, CONFIG_FILE)
}
