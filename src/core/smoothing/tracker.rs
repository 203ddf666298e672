// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright © 2021-2022 Adrian <adrian.eddy at gmail>

use std::time::Instant;
use super::{ MovingRms, SmoothingError };

/// Lens movement between consecutive readings above which focus is considered to be adjusting.
pub const ADJUSTING_THRESHOLD: f64 = 0.01;

#[derive(Debug, Clone, Copy)]
pub struct LensPositionSample {
    pub value: f64,
    pub timestamp: Instant,
}

impl LensPositionSample {
    pub fn now(value: f64) -> Self {
        Self { value, timestamp: Instant::now() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackedLensPosition {
    pub raw: f64,
    pub smoothed: f64,
    pub adjusting: bool,
    pub timestamp: Instant,
}

/// Per-frame lens position readout: smoothed value plus a focus-motion flag.
#[derive(Debug, Clone)]
pub struct LensPositionTracker {
    window: MovingRms,
    last: Option<LensPositionSample>,
}

impl Default for LensPositionTracker {
    fn default() -> Self {
        Self { window: MovingRms::default(), last: None }
    }
}

impl LensPositionTracker {
    pub fn new(window: MovingRms) -> Self {
        Self { window, last: None }
    }

    pub fn push(&mut self, sample: LensPositionSample) -> Result<TrackedLensPosition, SmoothingError> {
        if !sample.value.is_finite() {
            return Err(SmoothingError::NonFinite(sample.value));
        }
        if !(0.0..=1.0).contains(&sample.value) {
            return Err(SmoothingError::OutOfRange(sample.value));
        }
        if let Some(last) = &self.last {
            if sample.timestamp < last.timestamp {
                return Err(SmoothingError::OutOfOrder);
            }
        }

        let smoothed = self.window.add_sample(sample.value)?;
        let adjusting = self.last.map_or(false, |last| (sample.value - last.value).abs() > ADJUSTING_THRESHOLD);
        self.last = Some(sample);

        Ok(TrackedLensPosition {
            raw: sample.value,
            smoothed,
            adjusting,
            timestamp: sample.timestamp,
        })
    }

    pub fn last(&self) -> Option<&LensPositionSample> { self.last.as_ref() }
    pub fn window(&self) -> &MovingRms { &self.window }

    pub fn reset(&mut self) {
        self.window.reset();
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn flags_focus_motion() {
        let t0 = Instant::now();
        let mut tracker = LensPositionTracker::default();

        let a = tracker.push(LensPositionSample { value: 0.50, timestamp: t0 }).unwrap();
        assert!(!a.adjusting);
        assert!((a.smoothed - 0.5).abs() < 1e-12);

        let b = tracker.push(LensPositionSample { value: 0.505, timestamp: t0 + Duration::from_millis(33) }).unwrap();
        assert!(!b.adjusting);

        let c = tracker.push(LensPositionSample { value: 0.60, timestamp: t0 + Duration::from_millis(66) }).unwrap();
        assert!(c.adjusting);
        assert_eq!(c.raw, 0.60);
        assert_eq!(tracker.window().sample_count(), 3);
    }

    #[test]
    fn rejects_bad_samples() {
        let t0 = Instant::now();
        let mut tracker = LensPositionTracker::default();
        tracker.push(LensPositionSample { value: 0.2, timestamp: t0 + Duration::from_millis(10) }).unwrap();

        assert_eq!(tracker.push(LensPositionSample { value: 0.2, timestamp: t0 }).unwrap_err(), SmoothingError::OutOfOrder);
        assert!(matches!(tracker.push(LensPositionSample { value: 1.5, timestamp: t0 + Duration::from_millis(20) }), Err(SmoothingError::OutOfRange(_))));
        assert!(matches!(tracker.push(LensPositionSample { value: f64::NAN, timestamp: t0 + Duration::from_millis(20) }), Err(SmoothingError::NonFinite(_))));
        assert_eq!(tracker.window().sample_count(), 1);

        tracker.reset();
        assert!(tracker.last().is_none());
        assert!(tracker.push(LensPositionSample { value: 0.2, timestamp: t0 }).is_ok());
    }
}
