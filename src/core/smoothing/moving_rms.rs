// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright © 2021-2022 Adrian <adrian.eddy at gmail>

use super::SmoothingError;

pub const DEFAULT_PERIOD: usize = 5;

/// How the total write count maps to a slot of the window.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum WriteIndexing {
    /// Slot `sample_count % period` with the count incremented before indexing.
    /// Slot 0 gets overwritten on the `period`-th sample, so for `period > 1` the window
    /// holds at most `period - 1` samples. Matches the values shown by the camera app.
    #[default]
    Legacy,
    /// Slot `(sample_count - 1) % period`, a plain window of the last `period` samples.
    Sequential,
}

/// Root mean square over a fixed window of the most recent samples.
#[derive(Debug, Clone)]
pub struct MovingRms {
    period: usize,
    indexing: WriteIndexing,
    samples: Vec<f64>,
    sample_count: u64,
}

impl Default for MovingRms {
    fn default() -> Self {
        Self {
            period: DEFAULT_PERIOD,
            indexing: WriteIndexing::Legacy,
            samples: Vec::with_capacity(DEFAULT_PERIOD),
            sample_count: 0,
        }
    }
}

impl MovingRms {
    pub fn new(period: usize) -> Result<Self, SmoothingError> {
        Self::with_indexing(period, WriteIndexing::Legacy)
    }

    pub fn with_indexing(period: usize, indexing: WriteIndexing) -> Result<Self, SmoothingError> {
        if period == 0 {
            return Err(SmoothingError::InvalidPeriod(period));
        }
        Ok(Self {
            period,
            indexing,
            samples: Vec::with_capacity(period),
            sample_count: 0,
        })
    }

    /// Adds `value` to the window and returns the RMS of the samples held afterwards.
    /// Non-finite values are rejected and leave the window untouched.
    pub fn add_sample(&mut self, value: f64) -> Result<f64, SmoothingError> {
        if !value.is_finite() {
            return Err(SmoothingError::NonFinite(value));
        }

        self.sample_count += 1;
        let pos = self.write_position();
        if pos >= self.samples.len() {
            self.samples.push(value);
        } else {
            self.samples[pos] = value;
        }
        debug_assert!(self.samples.len() <= self.period);

        Ok(self.compute_rms())
    }

    fn write_position(&self) -> usize {
        let period = self.period as u64;
        let pos = match self.indexing {
            WriteIndexing::Legacy     => self.sample_count % period,
            WriteIndexing::Sequential => (self.sample_count - 1) % period,
        };
        pos as usize
    }

    fn compute_rms(&self) -> f64 {
        let count = self.samples.len().min(self.period);
        let sum_sq: f64 = self.samples.iter().map(|x| x * x).sum();
        (sum_sq / count as f64).sqrt()
    }

    /// Current RMS, `None` until the first sample.
    pub fn rms(&self) -> Option<f64> {
        if self.samples.is_empty() { None } else { Some(self.compute_rms()) }
    }

    pub fn reset(&mut self) {
        self.samples.clear();
        self.sample_count = 0;
    }

    pub fn period(&self) -> usize { self.period }
    pub fn indexing(&self) -> WriteIndexing { self.indexing }
    pub fn sample_count(&self) -> u64 { self.sample_count }
    pub fn len(&self) -> usize { self.samples.len() }
    pub fn is_empty(&self) -> bool { self.samples.is_empty() }
    pub fn samples(&self) -> &[f64] { &self.samples }
}
