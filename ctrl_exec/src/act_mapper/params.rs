//! Parameters structure for ActMapper

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the actuator mapper.
#[derive(Debug, Default, Deserialize)]
pub struct Params {
    /// Polynomial coefficients converting a steering angle in degrees
    /// (offset by `servo_angle_offset_deg`) to a servo pulse width.
    ///
    /// The order of these coefficients is highest power first, i.e. if there
    /// are 3 coefficients it's a 2nd order polynomial with c[0]*x^2 + c[1]*x
    /// + c[2].
    pub servo_poly_coeffs: Vec<f64>,

    /// Offset subtracted from the steering angle before the polynomial is
    /// applied. Comes from the servo fit, which was measured about the
    /// mechanical centre rather than zero.
    ///
    /// Units: degrees
    pub servo_angle_offset_deg: f64,

    /// Lowest pulse width which still drives the car forwards. Forward
    /// demands are floored here so lookup noise cannot push a forward
    /// command into the neutral/braking band.
    pub esc_min_fwd_pulse: u16,

    /// Neutral pulse width. Non-positive demands are capped here so lookup
    /// noise cannot push a braking command into the forward band.
    pub esc_neutral_pulse: u16,

    /// Largest acceleration error a calibration point may have and still be
    /// accepted by the lookup.
    ///
    /// Units: meters/second^2
    pub accel_match_tol_ms2: f64,

    /// Name of the ESC calibration CSV file, relative to the params
    /// directory.
    pub esc_cal_file: String,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Params {
    /// Determines if the parameters are valid.
    pub fn are_valid(&self) -> Result<(), String> {
        if self.servo_poly_coeffs.is_empty() {
            return Err("No servo polynomial coefficients given".into());
        }
        if self.accel_match_tol_ms2 <= 0.0 {
            return Err(format!(
                "Acceleration match tolerance must be positive, found {}",
                self.accel_match_tol_ms2
            ));
        }
        if self.esc_min_fwd_pulse <= self.esc_neutral_pulse {
            return Err("Minimum forward pulse must be above the neutral pulse".into());
        }

        Ok(())
    }
}
