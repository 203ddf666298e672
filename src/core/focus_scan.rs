// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright © 2021-2022 Adrian <adrian.eddy at gmail>

pub const DEFAULT_START: f64 = 0.05;
pub const DEFAULT_RANGE: f64 = 0.45;
pub const DEFAULT_INCREMENT: f64 = 0.05;

/// Upper bound on the number of lens positions in one scan.
pub const MAX_STEPS: usize = 10_000;

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq)]
pub enum FocusScanError {
    #[error("Increment must be positive, got {0}")] InvalidIncrement(f64),
    #[error("Range must not be negative, got {0}")] InvalidRange(f64),
    #[error("Start is not finite: {0}")]           InvalidStart(f64),
    #[error("Scan would take {0} steps, at most {max} are allowed", max = MAX_STEPS)] TooManySteps(f64),
}

/// Lens positions stepped through for a static focus stack.
///
/// Starts one increment below `start` and ends with the first value reaching `start + range + increment`.
pub fn focus_scan_sequence(start: f64, range: f64, increment: f64) -> Result<Vec<f64>, FocusScanError> {
    if !start.is_finite() { return Err(FocusScanError::InvalidStart(start)); }
    if !(increment.is_finite() && increment > 0.0) { return Err(FocusScanError::InvalidIncrement(increment)); }
    if !(range.is_finite() && range >= 0.0) { return Err(FocusScanError::InvalidRange(range)); }

    let steps = (range + 2.0 * increment) / increment;
    if !(steps <= MAX_STEPS as f64) { return Err(FocusScanError::TooManySteps(steps.ceil())); }

    let first = start - increment;
    let after = start + range + increment;
    // Tolerate accumulated rounding so 0.55 computed two ways still counts as reached
    let eps = increment * 1e-9;

    let mut seq = Vec::with_capacity(steps as usize + 2);
    for i in 0..=MAX_STEPS + 1 {
        let v = first + i as f64 * increment;
        seq.push(v);
        if v >= after - eps { break; }
    }
    Ok(seq)
}

pub fn default_focus_scan() -> Vec<f64> {
    // Constants are valid by construction
    focus_scan_sequence(DEFAULT_START, DEFAULT_RANGE, DEFAULT_INCREMENT).unwrap_or_default()
}
