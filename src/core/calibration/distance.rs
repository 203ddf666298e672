// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright © 2021-2022 Adrian <adrian.eddy at gmail>

use std::collections::BTreeMap;
use super::CalibrationError;

/// Target distances (mm) the user is walked through during distance calibration.
pub const DEFAULT_TARGETS: [u32; 24] = [7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 23, 24, 26, 29, 32, 35, 38, 41, 46, 50];

/// Observed lens position per target distance.
pub type DistanceObservations = BTreeMap<u32, f64>;

/// Steps through a list of target distances and records the lens position the camera settled on for each.
#[derive(Debug, Clone)]
pub struct DistanceCalibration {
    targets: Vec<u32>,
    current: Option<usize>,
    observations: DistanceObservations,
}

impl Default for DistanceCalibration {
    fn default() -> Self {
        Self::new(DEFAULT_TARGETS.to_vec())
    }
}

impl DistanceCalibration {
    pub fn new(targets: Vec<u32>) -> Self {
        Self { targets, current: None, observations: BTreeMap::new() }
    }

    pub fn start(&mut self) {
        self.observations.clear();
        self.current = Some(0);
        log::info!("Distance calibration started: {} targets", self.targets.len());
    }

    pub fn current_target(&self) -> Option<u32> {
        self.current.and_then(|i| self.targets.get(i).copied())
    }

    pub fn is_started(&self) -> bool { self.current.is_some() }

    pub fn is_complete(&self) -> bool {
        matches!(self.current, Some(i) if i >= self.targets.len())
    }

    /// Records `lens_position` for the current target and moves on. Returns the next target, if any.
    pub fn record(&mut self, lens_position: f64) -> Result<Option<u32>, CalibrationError> {
        let idx = self.current.ok_or(CalibrationError::NotStarted)?;
        let target = *self.targets.get(idx).ok_or(CalibrationError::Complete)?;
        if !lens_position.is_finite() || !(0.0..=1.0).contains(&lens_position) {
            return Err(CalibrationError::InvalidLensPosition(lens_position));
        }

        self.observations.insert(target, lens_position);
        log::debug!("[{target:2}] = {lens_position:.2}");

        self.current = Some(idx + 1);
        if self.is_complete() {
            log::info!("Distance calibration complete: {} observations", self.observations.len());
        }
        Ok(self.current_target())
    }

    pub fn targets(&self) -> &[u32] { &self.targets }
    pub fn observations(&self) -> &DistanceObservations { &self.observations }

    pub fn to_json(&self) -> Result<String, CalibrationError> {
        observations_to_json(&self.observations)
    }
}

pub fn observations_to_json(observations: &DistanceObservations) -> Result<String, CalibrationError> {
    Ok(serde_json::to_string_pretty(observations)?)
}

pub fn observations_from_json(json: &str) -> Result<DistanceObservations, CalibrationError> {
    let observations: DistanceObservations = serde_json::from_str(json)?;
    if let Some((_, &lp)) = observations.iter().find(|(_, lp)| !lp.is_finite() || !(0.0..=1.0).contains(*lp)) {
        return Err(CalibrationError::InvalidLensPosition(lp));
    }
    Ok(observations)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walks_through_targets() {
        let mut cal = DistanceCalibration::new(vec![10, 20, 30]);
        assert!(matches!(cal.record(0.1), Err(CalibrationError::NotStarted)));

        cal.start();
        assert_eq!(cal.current_target(), Some(10));
        assert_eq!(cal.record(0.0).unwrap(), Some(20));
        assert!(matches!(cal.record(1.2), Err(CalibrationError::InvalidLensPosition(_))));
        assert_eq!(cal.current_target(), Some(20));
        assert_eq!(cal.record(0.51).unwrap(), Some(30));
        assert!(!cal.is_complete());
        assert_eq!(cal.record(0.67).unwrap(), None);
        assert!(cal.is_complete());
        assert!(matches!(cal.record(0.7), Err(CalibrationError::Complete)));

        assert_eq!(cal.observations().len(), 3);
        assert_eq!(cal.observations()[&20], 0.51);
    }

    #[test]
    fn default_targets() {
        let mut cal = DistanceCalibration::default();
        cal.start();
        assert_eq!(cal.targets().len(), 24);
        assert_eq!(cal.current_target(), Some(7));
    }

    #[test]
    fn json_keys_are_distances() {
        let mut cal = DistanceCalibration::new(vec![10, 20]);
        cal.start();
        cal.record(0.0).unwrap();
        cal.record(0.5).unwrap();

        let json = cal.to_json().unwrap();
        let v: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(v["20"], serde_json::json!(0.5));

        let back = observations_from_json(&json).unwrap();
        assert_eq!(&back, cal.observations());

        assert!(observations_from_json(r#"{ "10": 3.0 }"#).is_err());
    }
}
