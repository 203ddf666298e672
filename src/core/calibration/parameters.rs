// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright © 2021-2022 Adrian <adrian.eddy at gmail>

use serde::{ Serialize, Deserialize };
use std::path::{ Path, PathBuf };
use super::CalibrationError;

pub const PARAMETERS_FILE_NAME: &str = "camera_calib_params.json";

/// Intrinsics stored for one lens position. Every field is required in the file.
#[derive(Deserialize, Serialize, Default, Clone, Copy, Debug, PartialEq)]
pub struct CalibParameters {
    // Focal distance & principal point
    pub fx: f64,
    pub fy: f64,
    pub cx: f64,
    pub cy: f64,

    // Distortion
    pub k1: f64,
    pub k2: f64,
    pub r1: f64,
    pub r2: f64,

    /// Lens position [0.0, 1.0] at which the calibration was taken
    pub f: f64,
}

impl CalibParameters {
    pub fn from_json(json: &str) -> Result<Self, CalibrationError> {
        let params: Self = serde_json::from_str(json)?;
        params.validate()?;
        Ok(params)
    }

    pub fn to_json(&self) -> Result<String, CalibrationError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load_from_file(path: &Path) -> Result<Self, CalibrationError> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json(&data)
    }

    /// Writes to a sibling temporary file first so a crash never leaves a truncated file behind.
    pub fn save_to_file(&self, path: &Path) -> Result<(), CalibrationError> {
        let json = self.to_json()?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, path)?;
        log::info!("Calibration parameters saved to {}", path.display());
        Ok(())
    }

    pub fn default_path() -> PathBuf {
        crate::settings::data_dir().join(PARAMETERS_FILE_NAME)
    }

    fn validate(&self) -> Result<(), CalibrationError> {
        let fields = [self.fx, self.fy, self.cx, self.cy, self.k1, self.k2, self.r1, self.r2, self.f];
        if fields.iter().any(|x| !x.is_finite()) {
            return Err(CalibrationError::InvalidParameters("all values must be finite".into()));
        }
        if !(0.0..=1.0).contains(&self.f) {
            return Err(CalibrationError::InvalidLensPosition(self.f));
        }
        Ok(())
    }
}
