// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright © 2021-2022 Adrian <adrian.eddy at gmail>

//! Distance calibration: the user points the camera at targets placed at known distances,
//! the lens position the autofocus settles on is recorded for each,
//! and the focal length of the thin-lens model is fitted to those observations.

pub mod database;
pub mod distance;
pub mod fit;
pub mod parameters;

pub use database::CalibrationDatabase;
pub use distance::{ DistanceCalibration, DistanceObservations, DEFAULT_TARGETS };
pub use fit::{ fit_focal_length, validate, FitResult };
pub use parameters::CalibParameters;

use crate::optics::OpticsError;

#[derive(thiserror::Error, Debug)]
pub enum CalibrationError {
    #[error("IO error: {0:?}")]                       Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]                       Json(#[from] serde_json::Error),
    #[error("Optics error: {0}")]                     Optics(#[from] OpticsError),
    #[error("Invalid parameters: {0}")]               InvalidParameters(String),
    #[error("Lens position out of range [0, 1]: {0}")] InvalidLensPosition(f64),
    #[error("Calibration has not been started")]      NotStarted,
    #[error("All targets have already been recorded")] Complete,
    #[error("At least 2 observations are needed, got {0}")] NotEnoughObservations(usize),
}
