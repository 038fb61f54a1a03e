//! ESC calibration table
//!
//! The table is measured offline by stepping the ESC through its pulse-width
//! range and recording the acceleration each pulse produced. At runtime it
//! is loaded once and never mutated.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::path::Path;
use thiserror::Error;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// One measured calibration point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationPoint {
    /// The ESC pulse width that was commanded.
    pub pulse_width: u16,

    /// The acceleration that pulse produced.
    ///
    /// Units: meters/second^2
    pub accel_ms2: f64,
}

/// The measured pulse-width to acceleration mapping.
///
/// Non-empty by construction, immutable after load.
#[derive(Debug, Clone)]
pub struct CalibrationTable {
    points: Vec<CalibrationPoint>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors that can occur while loading the calibration table.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("Cannot read the calibration file: {0}")]
    ReadError(#[from] csv::Error),

    #[error("The calibration table is empty")]
    Empty,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl CalibrationTable {
    /// Load the table from a two-column headerless CSV file, column 1 being
    /// the pulse width and column 2 the measured acceleration.
    ///
    /// An empty or malformed file is an error, the system cannot compute
    /// actuator commands without a table.
    pub fn from_csv_file<P: AsRef<Path>>(path: P) -> Result<Self, TableError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .trim(csv::Trim::All)
            .from_path(path)?;

        let mut points = Vec::new();

        for record in reader.deserialize() {
            let (pulse_width, accel_ms2): (u16, f64) = record?;
            points.push(CalibrationPoint {
                pulse_width,
                accel_ms2,
            });
        }

        Self::from_points(points)
    }

    /// Build a table from in-memory points, rejecting an empty set.
    pub fn from_points(points: Vec<CalibrationPoint>) -> Result<Self, TableError> {
        if points.is_empty() {
            return Err(TableError::Empty);
        }

        Ok(Self { points })
    }

    /// Number of points in the table.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Find the pulse width whose measured acceleration is closest to the
    /// requested one.
    ///
    /// A linear scan, the table is small and rebuilt rarely. Only strictly
    /// better matches replace the running best, so an exact tie keeps the
    /// earliest-scanned point. If no point lies within `max_error_ms2` of
    /// the request there is no acceptable match and `None` is returned,
    /// never some default entry.
    pub fn nearest_pulse(&self, accel_ms2: f64, max_error_ms2: f64) -> Option<u16> {
        let mut best = None;
        let mut best_error = max_error_ms2;

        for point in &self.points {
            let error = (point.accel_ms2 - accel_ms2).abs();

            if error < best_error {
                best_error = error;
                best = Some(point.pulse_width);
            }
        }

        best
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn point(pulse_width: u16, accel_ms2: f64) -> CalibrationPoint {
        CalibrationPoint {
            pulse_width,
            accel_ms2,
        }
    }

    #[test]
    fn test_empty_table_rejected() {
        match CalibrationTable::from_points(vec![]) {
            Err(TableError::Empty) => (),
            other => panic!("Expected Empty, got {:?}", other),
        }
    }

    #[test]
    fn test_nearest_picks_closest() {
        let table =
            CalibrationTable::from_points(vec![point(90, 0.0), point(96, 0.5), point(100, 1.0)])
                .unwrap();

        assert_eq!(table.nearest_pulse(0.6, 10.0), Some(96));
        assert_eq!(table.nearest_pulse(0.9, 10.0), Some(100));
    }

    #[test]
    fn test_exact_tie_keeps_earliest_scanned() {
        // 0.01 is exactly half way between both points, so both have an
        // error of 0.01 and the earliest-scanned must win
        let table =
            CalibrationTable::from_points(vec![point(90, 0.0), point(96, 0.02)]).unwrap();
        assert_eq!(table.nearest_pulse(0.01, 10.0), Some(90));

        // Reversing the scan order flips the winner
        let table =
            CalibrationTable::from_points(vec![point(96, 0.02), point(90, 0.0)]).unwrap();
        assert_eq!(table.nearest_pulse(0.01, 10.0), Some(96));
    }

    #[test]
    fn test_no_match_outside_tolerance() {
        let table = CalibrationTable::from_points(vec![point(90, 0.0)]).unwrap();

        assert_eq!(table.nearest_pulse(5.0, 1.0), None);
    }
}
