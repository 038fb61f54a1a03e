//! # Actuator Command Messages

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Command sent to the actuation board once per control cycle.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct ActCmd {
    /// ESC pulse width demand.
    ///
    /// Units: native ESC command units (integral)
    pub esc_pulse: u16,

    /// Steering servo pulse width demand.
    ///
    /// Units: native servo command units
    pub servo_pulse: f64,
}
