// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright © 2021-2022 Adrian <adrian.eddy at gmail>

pub mod optics;
pub mod smoothing;
pub mod calibration;
pub mod focus_scan;
pub mod settings;
pub mod util;

pub use optics::{ lens_position_from_distance, distance_from_lens_position, OpticalParameters, OpticsError, Singularity };
pub use smoothing::{ MovingRms, WriteIndexing, LensPositionSample, LensPositionTracker, TrackedLensPosition, SmoothingError };
