// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright © 2021-2022 Adrian <adrian.eddy at gmail>

pub mod moving_rms;
pub mod tracker;

pub use moving_rms::{ MovingRms, WriteIndexing, DEFAULT_PERIOD };
pub use tracker::{ LensPositionSample, LensPositionTracker, TrackedLensPosition };

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq)]
pub enum SmoothingError {
    #[error("Window period must be at least 1, got {0}")] InvalidPeriod(usize),
    #[error("Sample is not finite: {0}")]                 NonFinite(f64),
    #[error("Lens position out of range [0, 1]: {0}")]   OutOfRange(f64),
    #[error("Sample timestamp is older than the previous one")] OutOfOrder,
}
