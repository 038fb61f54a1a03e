//! Actuator mapping module
//!
//! Converts the physical control demand (acceleration, steering angle) into
//! the calibrated pulse-width commands the ESC and steering servo
//! understand. Steering uses a measured polynomial fit, acceleration uses a
//! nearest-neighbour lookup into the measured calibration table followed by
//! a direction safety clamp.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;
mod table;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use params::*;
pub use state::*;
pub use table::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during ActMapper operation.
#[derive(Debug, thiserror::Error)]
pub enum ActMapperError {
    #[error("Could not load parameters: {0}")]
    ParamLoadError(#[from] util::params::LoadError),

    #[error("Loaded parameters are invalid: {0}")]
    ParamsInvalid(String),

    #[error("Could not load the ESC calibration table: {0}")]
    TableLoadError(#[from] TableError),

    #[error("The module has not been initialised")]
    NotInitialised,
}
