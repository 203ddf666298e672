// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright © 2024 Adrian <adrian.eddy at gmail>

use app_dirs2::{ AppDataType, AppInfo };
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{ Path, PathBuf };
use std::sync::{ Arc, OnceLock };

pub const SETTINGS_FILE_NAME: &str = "settings.json";

/// Overrides the data directory, mostly useful for scripted calibration runs.
pub const DATA_DIR_ENV: &str = "FOCUSCAL_DATA_DIR";

pub fn data_dir() -> PathBuf {
    let path = match std::env::var_os(DATA_DIR_ENV) {
        Some(dir) => PathBuf::from(dir),
        None => match app_dirs2::get_app_dir(AppDataType::UserData, &AppInfo { name: "FocusCal", author: "FocusCal" }, "") {
            Ok(mut path) => {
                if path.file_name().is_some() && path.file_name() == path.parent().and_then(|x| x.file_name()) {
                    if let Some(parent) = path.parent() { path = parent.to_path_buf(); }
                }
                path
            },
            Err(e) => {
                log::warn!("Failed to resolve the user data directory: {e:?}");
                PathBuf::from(".")
            }
        }
    };
    let _ = std::fs::create_dir_all(&path);
    path
}

/// Key/value settings persisted as a flat JSON object.
#[derive(Default, Debug, Clone)]
pub struct Settings {
    map: HashMap<String, serde_json::Value>,
    file: Option<PathBuf>,
}

impl Settings {
    /// Missing or unreadable files give empty settings.
    pub fn load(file: &Path) -> Self {
        let mut map = HashMap::new();
        log::info!("Settings file path: {}", file.display());

        if let Ok(data) = std::fs::read_to_string(file) {
            match serde_json::from_str::<HashMap<String, serde_json::Value>>(&data) {
                Ok(v) => map = v,
                Err(e) => log::warn!("Ignoring malformed settings file {}: {e}", file.display()),
            }
        }

        Self { map, file: Some(file.to_path_buf()) }
    }

    pub fn get(&self, key: &str, default: serde_json::Value) -> serde_json::Value { self.map.get(key).unwrap_or(&default).clone() }
    pub fn try_get(&self, key: &str) -> Option<serde_json::Value> { self.map.get(key).cloned() }
    pub fn get_u64(&self, key: &str, default: u64) -> u64 { self.map.get(key).and_then(|x| x.as_u64()).unwrap_or(default) }
    pub fn get_f64(&self, key: &str, default: f64) -> f64 { self.map.get(key).and_then(|x| x.as_f64()).unwrap_or(default) }
    pub fn get_bool(&self, key: &str, default: bool) -> bool { self.map.get(key).and_then(|x| x.as_bool()).unwrap_or(default) }
    pub fn get_str(&self, key: &str, default: &str) -> String { self.map.get(key).and_then(|x| x.as_str()).map(|x| x.to_owned()).unwrap_or_else(|| default.to_owned()) }
    pub fn contains(&self, key: &str) -> bool { self.map.contains_key(key) }
    pub fn all(&self) -> &HashMap<String, serde_json::Value> { &self.map }

    pub fn set(&mut self, key: &str, value: serde_json::Value) {
        self.map.insert(key.to_string(), value);
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }

    pub fn store(&self) -> std::io::Result<()> {
        let Some(file) = &self.file else { return Ok(()); };
        let json = serde_json::to_string_pretty(&self.map)?;
        std::fs::write(file, json)?;
        log::info!("Settings saved to {file:?}");
        Ok(())
    }
}

fn global() -> Arc<RwLock<Settings>> {
    static SETTINGS: OnceLock<Arc<RwLock<Settings>>> = OnceLock::new();
    SETTINGS.get_or_init(|| {
        Arc::new(RwLock::new(Settings::load(&data_dir().join(SETTINGS_FILE_NAME))))
    }).clone()
}

pub fn get_all() -> HashMap<String, serde_json::Value> { global().read().all().clone() }
pub fn get_u64(key: &str, default: u64) -> u64 { global().read().get_u64(key, default) }
pub fn get_f64(key: &str, default: f64) -> f64 { global().read().get_f64(key, default) }

/// Sets and immediately persists `key`.
pub fn set(key: &str, value: serde_json::Value) {
    let settings = global();
    let mut settings = settings.write();
    settings.set(key, value);
    if let Err(e) = settings.store() {
        log::error!("Failed to write the settings file: {e:?}");
    }
}

pub fn clear() {
    let settings = global();
    let mut settings = settings.write();
    settings.clear();
    if let Err(e) = settings.store() {
        log::error!("Failed to write the settings file: {e:?}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_getters_fall_back() {
        let mut s = Settings::default();
        s.set("focalLength", serde_json::json!(0.42));
        s.set("smoothingPeriod", serde_json::json!(7));
        s.set("name", serde_json::json!("iPhone"));

        assert_eq!(s.get_f64("focalLength", 0.4), 0.42);
        assert_eq!(s.get_f64("baseDistance", 10.0), 10.0);
        assert_eq!(s.get_u64("smoothingPeriod", 5), 7);
        assert_eq!(s.get_u64("name", 5), 5);
        assert_eq!(s.get_str("name", ""), "iPhone");
        assert!(!s.get_bool("missing", false));
        assert!(s.store().is_ok());
    }

    #[test]
    fn persists_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join(SETTINGS_FILE_NAME);

        let mut s = Settings::load(&file);
        assert!(s.all().is_empty());
        s.set("baseDistance", serde_json::json!(12.5));
        s.store().unwrap();

        let s = Settings::load(&file);
        assert_eq!(s.get_f64("baseDistance", 0.0), 12.5);

        std::fs::write(&file, "not json").unwrap();
        assert!(Settings::load(&file).all().is_empty());
    }
}
