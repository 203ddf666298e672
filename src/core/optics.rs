// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright © 2021-2022 Adrian <adrian.eddy at gmail>

//! Thin-lens mapping between the normalized lens actuator position and the object distance.
//!
//! Lens position 0 corresponds to an object at `base_distance`, lens position 1 to an object at infinity.
//! All distances and the focal length must be given in the same units.
//! Algebraically the mapping reduces to `lp = (d - b) / (d - f)`; the expanded form is kept so results
//! match the calibration tables recorded on device.

use serde::{ Serialize, Deserialize };

/// Relative threshold below which a difference is treated as rounding noise.
const SINGULAR_EPS: f64 = 4.0 * f64::EPSILON;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Singularity {
    /// Denominator of the inverse mapping vanished, lens focused at infinity
    AtInfinity,
    /// Object sits on the focal plane of the model, normalized inverse distance is undefined
    FocalPlane,
}

impl std::fmt::Display for Singularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AtInfinity => write!(f, "distance at infinity"),
            Self::FocalPlane => write!(f, "object at focal plane"),
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq)]
pub enum OpticsError {
    #[error("Focal length must be positive, got {0}")]  InvalidFocalLength(f64),
    #[error("{name} is not finite: {value}")]          NonFinite { name: &'static str, value: f64 },
    #[error("Singular configuration: {0}")]            Singular(Singularity),
}

fn check_focal_length(focal_length: f64) -> Result<(), OpticsError> {
    if !focal_length.is_finite() {
        return Err(OpticsError::NonFinite { name: "focal_length", value: focal_length });
    }
    if focal_length <= 0.0 {
        return Err(OpticsError::InvalidFocalLength(focal_length));
    }
    Ok(())
}

fn check_finite(name: &'static str, value: f64) -> Result<(), OpticsError> {
    if value.is_finite() { Ok(()) } else { Err(OpticsError::NonFinite { name, value }) }
}

/// `1 / v`, where `v` is a difference of operands of magnitude up to `scale`.
fn checked_recip(v: f64, scale: f64, singularity: Singularity) -> Result<f64, OpticsError> {
    if v.abs() <= SINGULAR_EPS * scale {
        return Err(OpticsError::Singular(singularity));
    }
    Ok(1.0 / v)
}

/// `1 / (1/f - 1/(d + 2f))`, where `d` is the signed object distance and `f > 0`.
fn normalized_inverse_distance(focal_length: f64, object_distance_signed: f64) -> Result<f64, OpticsError> {
    let one_over_f = 1.0 / focal_length;
    let one_over_d = checked_recip(object_distance_signed + 2.0 * focal_length, object_distance_signed.abs().max(2.0 * focal_length), Singularity::FocalPlane)?;
    checked_recip(one_over_f - one_over_d, one_over_f.max(one_over_d.abs()), Singularity::FocalPlane)
}

/// Normalized lens position needed to focus an object at `object_distance`.
///
/// Returns 0 for `object_distance == base_distance` and approaches 1 as the object moves towards infinity.
pub fn lens_position_from_distance(focal_length: f64, object_distance: f64, base_distance: f64) -> Result<f64, OpticsError> {
    check_focal_length(focal_length)?;
    check_finite("object_distance", object_distance)?;
    check_finite("base_distance", base_distance)?;

    let norm_object = normalized_inverse_distance(focal_length, -object_distance)?;
    let norm_base   = normalized_inverse_distance(focal_length, -base_distance)?;

    let lp = (norm_object - norm_base) * checked_recip(focal_length - norm_base, focal_length.max(norm_base.abs()), Singularity::AtInfinity)?;
    if !lp.is_finite() {
        return Err(OpticsError::Singular(Singularity::AtInfinity));
    }
    Ok(lp)
}

/// Object distance in focus at the normalized `lens_position`. Inverse of [`lens_position_from_distance`].
pub fn distance_from_lens_position(focal_length: f64, lens_position: f64, base_distance: f64) -> Result<f64, OpticsError> {
    check_focal_length(focal_length)?;
    check_finite("lens_position", lens_position)?;
    check_finite("base_distance", base_distance)?;

    let norm_base_distance = normalized_inverse_distance(focal_length, -base_distance)?;
    let norm_base = lens_position * (focal_length - norm_base_distance) + norm_base_distance;

    let denom = focal_length - norm_base;
    if denom.abs() <= SINGULAR_EPS * focal_length.max(norm_base.abs()) {
        return Err(OpticsError::Singular(Singularity::AtInfinity));
    }
    let distance = -(-2.0 * focal_length * focal_length + norm_base * focal_length) / denom;
    if !distance.is_finite() {
        return Err(OpticsError::Singular(Singularity::AtInfinity));
    }
    Ok(distance)
}

#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq)]
pub struct OpticalParameters {
    pub focal_length: f64,
    pub base_distance: f64,
}

impl Default for OpticalParameters {
    fn default() -> Self { Self {
        focal_length: 0.4,
        base_distance: 10.0,
    } }
}

impl OpticalParameters {
    pub fn new(focal_length: f64, base_distance: f64) -> Result<Self, OpticsError> {
        let params = Self { focal_length, base_distance };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<(), OpticsError> {
        check_focal_length(self.focal_length)?;
        check_finite("base_distance", self.base_distance)?;
        normalized_inverse_distance(self.focal_length, -self.base_distance).map(|_| ())
    }

    pub fn lens_position(&self, object_distance: f64) -> Result<f64, OpticsError> {
        lens_position_from_distance(self.focal_length, object_distance, self.base_distance)
    }

    pub fn distance(&self, lens_position: f64) -> Result<f64, OpticsError> {
        distance_from_lens_position(self.focal_length, lens_position, self.base_distance)
    }
}

/// `(lens_position, distance)` rows for lens positions `i / steps`, `i` in `1..steps`.
pub fn distance_table(params: &OpticalParameters, steps: usize) -> Result<Vec<(f64, f64)>, OpticsError> {
    params.validate()?;
    let mut rows = Vec::with_capacity(steps.saturating_sub(1));
    for i in 1..steps {
        let lp = i as f64 / steps as f64;
        match params.distance(lp) {
            Ok(d) => rows.push((lp, d)),
            Err(OpticsError::Singular(s)) => log::warn!("Skipping lens position {lp:.4}: {s}"),
            Err(e) => return Err(e),
        }
    }
    Ok(rows)
}

/// `(distance, lens_position)` rows for each of `distances`.
pub fn lens_position_table(params: &OpticalParameters, distances: &[f64]) -> Result<Vec<(f64, f64)>, OpticsError> {
    params.validate()?;
    let mut rows = Vec::with_capacity(distances.len());
    for &d in distances {
        match params.lens_position(d) {
            Ok(lp) => rows.push((d, lp)),
            Err(OpticsError::Singular(s)) => log::warn!("Skipping distance {d}: {s}"),
            Err(e) => return Err(e),
        }
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    const F: f64 = 0.4;
    const B: f64 = 10.0;

    #[test_case(10.2)]
    #[test_case(12.4)]
    #[test_case(19.6)]
    #[test_case(48.4)]
    fn round_trip(d: f64) {
        let lp = lens_position_from_distance(F, d, B).unwrap();
        let back = distance_from_lens_position(F, lp, B).unwrap();
        assert!((back - d).abs() < 1e-2, "{d} -> {lp} -> {back}");
    }

    #[test]
    fn round_trip_random() {
        let mut rng = fastrand::Rng::with_seed(0x5eed);
        for _ in 0..500 {
            let f = 0.1 + rng.f64() * 10.0;
            let b = 3.0 * f + rng.f64() * 100.0;
            let d = b + rng.f64() * 1000.0;
            let lp = lens_position_from_distance(f, d, b).unwrap();
            let back = distance_from_lens_position(f, lp, b).unwrap();
            assert!(((back - d) / d).abs() < 1e-3, "f={f} b={b} d={d} lp={lp} back={back}");
        }
    }

    #[test_case(0.02, 10.1959)]
    #[test_case(0.04, 10.4)]
    #[test_case(0.2,  12.4)]
    #[test_case(0.5,  19.6)]
    #[test_case(0.8,  48.4)]
    #[test_case(0.9,  96.4)]
    #[test_case(0.98, 480.4)]
    fn reference_distances(lp: f64, expected: f64) {
        let d = distance_from_lens_position(F, lp, B).unwrap();
        assert!(((d - expected) / expected).abs() < 1e-4, "lp {lp}: {d} != {expected}");
    }

    #[test_case(10.0, 0.0)]
    #[test_case(11.0, 0.0943404)]
    #[test_case(20.0, 0.510204)]
    #[test_case(49.0, 0.802468)]
    fn reference_lens_positions(d: f64, expected: f64) {
        let lp = lens_position_from_distance(F, d, B).unwrap();
        assert!((lp - expected).abs() < 1e-5, "d {d}: {lp} != {expected}");
    }

    #[test]
    fn base_distance_is_zero() {
        assert!(lens_position_from_distance(F, B, B).unwrap().abs() < 1e-12);
        assert!((distance_from_lens_position(F, 0.0, B).unwrap() - B).abs() < 1e-9);
    }

    #[test]
    fn mappings_are_monotonic() {
        // Distance grows as the lens travels towards the infinity stop
        let mut prev = distance_from_lens_position(F, 0.0, B).unwrap();
        for i in 1..100 {
            let d = distance_from_lens_position(F, i as f64 / 100.0, B).unwrap();
            assert!(d > prev);
            prev = d;
        }
        let mut prev = lens_position_from_distance(F, B, B).unwrap();
        for d in (11..500).map(|x| x as f64) {
            let lp = lens_position_from_distance(F, d, B).unwrap();
            assert!(lp > prev);
            prev = lp;
        }
    }

    #[test]
    fn zero_focal_length_is_domain_error() {
        assert_eq!(lens_position_from_distance(0.0, 20.0, B), Err(OpticsError::InvalidFocalLength(0.0)));
        assert_eq!(distance_from_lens_position(-1.0, 0.5, B), Err(OpticsError::InvalidFocalLength(-1.0)));
        assert!(matches!(lens_position_from_distance(f64::NAN, 20.0, B), Err(OpticsError::NonFinite { name: "focal_length", .. })));
    }

    #[test]
    fn infinity_is_reported() {
        assert_eq!(distance_from_lens_position(F, 1.0, B), Err(OpticsError::Singular(Singularity::AtInfinity)));
        assert!(matches!(lens_position_from_distance(F, f64::INFINITY, B), Err(OpticsError::NonFinite { .. })));
    }

    #[test_case(1e-6,  1e-6)]
    #[test_case(1e-13, 0.2)]
    fn tiny_focal_length_is_not_singular(f: f64, tolerance: f64) {
        let lp = lens_position_from_distance(f, 20.0, B).unwrap();
        let expected = (20.0 - B) / (20.0 - f);
        assert!((lp - expected).abs() < tolerance, "f {f}: {lp} != {expected}");
    }

    #[test]
    fn focal_plane_is_reported() {
        // -d + 2f == 0
        assert_eq!(lens_position_from_distance(F, 2.0 * F, B), Err(OpticsError::Singular(Singularity::FocalPlane)));
        // 1/f == 1/(-d + 2f)
        assert_eq!(lens_position_from_distance(F, F, B), Err(OpticsError::Singular(Singularity::FocalPlane)));
    }

    #[test]
    fn tables() {
        let params = OpticalParameters::default();
        let rows = distance_table(&params, 50).unwrap();
        assert_eq!(rows.len(), 49);
        assert!((rows[24].0 - 0.5).abs() < 1e-12);
        assert!((rows[24].1 - 19.6).abs() < 1e-6);

        let rows = lens_position_table(&params, &[10.0, 20.0, 0.8]).unwrap();
        assert_eq!(rows.len(), 2);
        assert!((rows[1].1 - 0.510204).abs() < 1e-5);
    }

    #[test]
    fn parameters_validate() {
        assert!(OpticalParameters::new(0.4, 10.0).is_ok());
        assert!(OpticalParameters::new(0.0, 10.0).is_err());
        assert!(OpticalParameters::new(0.4, f64::NAN).is_err());
    }
}
