//! Parameters structure for MpcCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

use crate::vehicle_model::ModelParams;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the receding-horizon controller.
#[derive(Debug, Default, Deserialize)]
pub struct Params {
    // ---- MODEL ----
    /// Vehicle model constants.
    pub model: ModelParams,

    // ---- HORIZON ----
    /// Number of input steps in the horizon. The planned trajectory has one
    /// more state than this.
    pub horizon_n: usize,

    // ---- BOUNDS ----
    /// Minimum speed over the horizon (highest negative value).
    ///
    /// Units: meters/second
    pub v_min_ms: f64,

    /// Maximum speed over the horizon.
    ///
    /// Units: meters/second
    pub v_max_ms: f64,

    /// Minimum acceleration demand (highest negative value).
    ///
    /// Units: meters/second^2
    pub a_min_ms2: f64,

    /// Maximum acceleration demand.
    ///
    /// Units: meters/second^2
    pub a_max_ms2: f64,

    /// Minimum steering angle demand (highest negative value).
    ///
    /// Units: radians
    pub d_f_min_rad: f64,

    /// Maximum steering angle demand.
    ///
    /// Units: radians
    pub d_f_max_rad: f64,

    // ---- TARGET ----
    /// X position of the target pose in the world frame.
    ///
    /// Units: meters
    pub x_ref_m: f64,

    /// Y position of the target pose in the world frame.
    ///
    /// Units: meters
    pub y_ref_m: f64,

    // ---- SOLVER ----
    /// Solver tolerances and limits.
    pub solver: SolverParams,
}

/// Tolerances and limits for the solver core.
#[derive(Debug, Default, Deserialize, Clone, Copy)]
pub struct SolverParams {
    /// Maximum number of descent iterations per solve.
    pub max_iters: usize,

    /// Projected-gradient norm below which the solve is converged.
    pub grad_tol: f64,

    /// Relative cost improvement below which the solve is converged.
    pub cost_rel_tol: f64,

    /// Initial line search step length.
    pub step_init: f64,

    /// Maximum number of step halvings per line search.
    pub max_backtracks: usize,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Params {
    /// Determines if the parameters are valid.
    pub fn are_valid(&self) -> Result<(), String> {
        if self.horizon_n < 1 {
            return Err(format!("Horizon must be at least 1, found {}", self.horizon_n));
        }
        if self.model.dt_s <= 0.0 {
            return Err(format!("Time step must be positive, found {}", self.model.dt_s));
        }
        if self.model.l_a_m + self.model.l_b_m <= 0.0 || self.model.l_b_m <= 0.0 {
            return Err("Axle distances must be positive".into());
        }
        if self.v_min_ms >= self.v_max_ms
            || self.a_min_ms2 >= self.a_max_ms2
            || self.d_f_min_rad >= self.d_f_max_rad
        {
            return Err("Lower bounds must be below upper bounds".into());
        }
        if self.solver.max_iters < 1 {
            return Err("Solver must be allowed at least 1 iteration".into());
        }

        Ok(())
    }
}
