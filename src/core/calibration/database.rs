// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright © 2021-2022 Adrian <adrian.eddy at gmail>

use std::collections::BTreeMap;
use std::path::Path;
use walkdir::WalkDir;
use crate::util::MapClosest;
use super::CalibParameters;

/// Lens positions are bucketed to hundredths.
pub fn lens_position_key(lens_position: f64) -> i64 {
    (lens_position * 100.0).round() as i64
}

/// Calibration parameters keyed by the lens position they were taken at.
#[derive(Default, Debug, Clone)]
pub struct CalibrationDatabase {
    map: BTreeMap<i64, CalibParameters>
}

impl CalibrationDatabase {
    /// Loads every `.json` file under `dir`. Files that don't parse are logged and skipped.
    pub fn load_all(&mut self, dir: &Path) -> usize {
        let _time = std::time::Instant::now();
        let mut loaded = 0;

        for entry in WalkDir::new(dir).into_iter().filter_map(|e| e.ok()) {
            let path = entry.path();
            if !entry.file_type().is_file() || path.extension().map_or(true, |x| x != "json") {
                continue;
            }
            match CalibParameters::load_from_file(path) {
                Ok(params) => {
                    if let Some(prev) = self.insert(params) {
                        log::warn!("{} replaces calibration at lens position {:.2}", path.display(), prev.f);
                    }
                    loaded += 1;
                },
                Err(e) => {
                    log::error!("Error parsing calibration parameters: {}: {:?}", path.display(), e);
                }
            }
        }

        log::info!("Loaded {} calibrations in {:.3}ms", loaded, _time.elapsed().as_micros() as f64 / 1000.0);
        loaded
    }

    pub fn insert(&mut self, params: CalibParameters) -> Option<CalibParameters> {
        self.map.insert(lens_position_key(params.f), params)
    }

    pub fn get(&self, lens_position: f64) -> Option<&CalibParameters> {
        self.map.get(&lens_position_key(lens_position))
    }

    /// Nearest calibration within `max_diff` (in lens position units).
    pub fn get_closest(&self, lens_position: f64, max_diff: f64) -> Option<&CalibParameters> {
        self.map.get_closest(&lens_position_key(lens_position), (max_diff * 100.0).round() as i64)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CalibParameters> { self.map.values() }
    pub fn len(&self) -> usize { self.map.len() }
    pub fn is_empty(&self) -> bool { self.map.is_empty() }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(f: f64) -> CalibParameters {
        CalibParameters { fx: 1000.0 + f, fy: 1000.0, cx: 640.0, cy: 360.0, f, ..Default::default() }
    }

    #[test]
    fn closest_lookup() {
        let mut db = CalibrationDatabase::default();
        db.insert(params(0.2));
        db.insert(params(0.5));

        assert_eq!(db.get(0.2).map(|p| p.f), Some(0.2));
        assert!(db.get(0.3).is_none());
        assert_eq!(db.get_closest(0.27, 0.1).map(|p| p.f), Some(0.2));
        assert_eq!(db.get_closest(0.44, 0.1).map(|p| p.f), Some(0.5));
        assert!(db.get_closest(0.35, 0.1).is_none());
    }

    #[test]
    fn loads_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        params(0.1).save_to_file(&dir.path().join("a.json")).unwrap();
        params(0.6).save_to_file(&dir.path().join("sub").join("b.json")).unwrap();
        std::fs::write(dir.path().join("broken.json"), "{ \"fx\": 1 }").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let mut db = CalibrationDatabase::default();
        assert_eq!(db.load_all(dir.path()), 2);
        assert_eq!(db.len(), 2);
        assert!(db.get(0.6).is_some());
    }
}
