//! # Communications interface crate.
//!
//! Provides all common communications interfaces for the software.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Actuator command definitions
pub mod act;

/// State estimate definitions
pub mod est;

/// Network module
pub mod net;
