//! Receding-horizon control module
//!
//! Every control cycle this module solves a short-horizon optimal-control
//! problem over the kinematic bicycle model, starting from the freshest
//! state estimate, and hands the first step of the optimal input sequence
//! on to the actuator mapper. The rest of the planned trajectory is
//! discarded and re-planned on the next cycle.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod problem;
mod solver;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use params::*;
pub use problem::*;
pub use solver::SolveStats;
pub use state::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during MpcCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum MpcCtrlError {
    #[error("Could not load parameters: {0}")]
    ParamLoadError(#[from] util::params::LoadError),

    #[error("Loaded parameters are invalid: {0}")]
    ParamsInvalid(String),

    #[error("The module has not been initialised")]
    NotInitialised,

    #[error("Recieved a non-finite state estimate")]
    NonFiniteEstimate,

    #[error(transparent)]
    SolveError(#[from] SolveError),
}
