// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright © 2021-2022 Adrian <adrian.eddy at gmail>

use crate::optics::OpticalParameters;
use super::{ CalibrationError, DistanceObservations };

const GRID_STEPS: usize = 256;
const MAX_ITERATIONS: usize = 200;
const TOLERANCE: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq)]
pub struct FitResult {
    pub focal_length: f64,
    pub rms_error: f64,
    /// (distance, observed - predicted lens position)
    pub residuals: Vec<(u32, f64)>,
}

impl FitResult {
    pub fn params(&self, base_distance: f64) -> OpticalParameters {
        OpticalParameters { focal_length: self.focal_length, base_distance }
    }
}

fn residuals(params: &OpticalParameters, observations: &DistanceObservations) -> Result<Vec<(u32, f64)>, CalibrationError> {
    observations.iter().map(|(&d, &lp)| {
        Ok((d, lp - params.lens_position(d as f64)?))
    }).collect()
}

fn rms(residuals: &[(u32, f64)]) -> f64 {
    if residuals.is_empty() { return 0.0; }
    (residuals.iter().map(|(_, r)| r * r).sum::<f64>() / residuals.len() as f64).sqrt()
}

/// RMS lens position error of `params` over the recorded observations.
pub fn validate(params: &OpticalParameters, observations: &DistanceObservations) -> Result<f64, CalibrationError> {
    params.validate()?;
    Ok(rms(&residuals(params, observations)?))
}

/// Search range used when none is given: well below the closest observed distance and the base distance.
pub fn default_search_range(observations: &DistanceObservations, base_distance: f64) -> (f64, f64) {
    let closest = observations.keys().next().map(|&d| d as f64).unwrap_or(base_distance).min(base_distance);
    (closest * 1e-4, closest / 3.0)
}

/// Finds the focal length that best explains the observed lens positions for a known base distance.
///
/// Coarse log-spaced scan over `search_range`, then golden-section refinement around the best cell.
pub fn fit_focal_length(observations: &DistanceObservations, base_distance: f64, search_range: Option<(f64, f64)>) -> Result<FitResult, CalibrationError> {
    if observations.len() < 2 {
        return Err(CalibrationError::NotEnoughObservations(observations.len()));
    }
    let (lo, hi) = search_range.unwrap_or_else(|| default_search_range(observations, base_distance));
    if !(lo.is_finite() && hi.is_finite() && lo > 0.0 && hi > lo) {
        return Err(CalibrationError::InvalidParameters(format!("invalid search range {lo}..{hi}")));
    }

    let cost = |f: f64| -> f64 {
        match residuals(&OpticalParameters { focal_length: f, base_distance }, observations) {
            Ok(r) => r.iter().map(|(_, x)| x * x).sum(),
            Err(_) => f64::INFINITY,
        }
    };

    let ratio = (hi / lo).powf(1.0 / (GRID_STEPS - 1) as f64);
    let grid: Vec<f64> = (0..GRID_STEPS).map(|i| lo * ratio.powi(i as i32)).collect();
    let (best, best_cost) = grid.iter().enumerate()
        .map(|(i, &f)| (i, cost(f)))
        .fold((0, f64::INFINITY), |acc, x| if x.1 < acc.1 { x } else { acc });
    if !best_cost.is_finite() {
        return Err(CalibrationError::InvalidParameters("no valid focal length in search range".into()));
    }

    let mut a = grid[best.saturating_sub(1)];
    let mut b = grid[(best + 1).min(GRID_STEPS - 1)];
    let inv_phi = (5f64.sqrt() - 1.0) / 2.0;
    let mut c = b - inv_phi * (b - a);
    let mut d = a + inv_phi * (b - a);
    let (mut fc, mut fd) = (cost(c), cost(d));
    for _ in 0..MAX_ITERATIONS {
        if (b - a).abs() <= TOLERANCE * (a.abs() + b.abs()) { break; }
        if fc < fd {
            b = d; d = c; fd = fc;
            c = b - inv_phi * (b - a);
            fc = cost(c);
        } else {
            a = c; c = d; fc = fd;
            d = a + inv_phi * (b - a);
            fd = cost(d);
        }
    }

    let focal_length = (a + b) / 2.0;
    let params = OpticalParameters::new(focal_length, base_distance)?;
    let residuals = residuals(&params, observations)?;
    let rms_error = rms(&residuals);
    log::info!("Fitted focal length {focal_length:.6} (base {base_distance}), RMS error {rms_error:.6}");

    Ok(FitResult { focal_length, rms_error, residuals })
}
