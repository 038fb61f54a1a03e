//! # State Estimate Messages
//!
//! The state estimator publishes one of these messages per estimation cycle.
//! The controller only ever cares about the freshest one.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A pose and speed estimate for the vehicle.
#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq)]
pub struct StateEstimate {
    /// X position in the world frame.
    ///
    /// Units: meters
    pub x_m: f64,

    /// Y position in the world frame.
    ///
    /// Units: meters
    pub y_m: f64,

    /// Heading angle about the world frame Z+ axis.
    ///
    /// Units: radians
    pub psi_rad: f64,

    /// Body-frame longitudinal speed.
    ///
    /// Units: meters/second
    pub v_ms: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl StateEstimate {
    /// True if every element of the estimate is a finite number.
    ///
    /// Estimates failing this check must not be pushed into the optimiser.
    pub fn is_finite(&self) -> bool {
        self.x_m.is_finite()
            && self.y_m.is_finite()
            && self.psi_rad.is_finite()
            && self.v_ms.is_finite()
    }
}
