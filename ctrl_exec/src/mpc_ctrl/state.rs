//! Implementations for the MpcCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{info, trace, warn};
use serde::Serialize;

// Internal
use super::{HorizonProblem, MpcCtrlError, Params};
use crate::vehicle_model::ControlInput;
use comms_if::est::StateEstimate;
use util::{maths::clamp, module::State, params, session::Session};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Receding-horizon control module state
#[derive(Default)]
pub struct MpcCtrl {
    pub(crate) params: Params,

    pub(crate) report: StatusReport,

    /// The long-lived optimisation problem, built once at init.
    pub(crate) problem: Option<HorizonProblem>,
}

/// Input data to the MPC controller.
#[derive(Default)]
pub struct InputData {
    /// The freshest state estimate, or `None` if no estimate has arrived
    /// since the module last ran. With no new estimate the previous initial
    /// condition stands.
    pub est: Option<StateEstimate>,
}

/// Status report for MpcCtrl processing.
#[derive(Clone, Copy, Default, Serialize, Debug)]
pub struct StatusReport {
    /// Terminal cost of the accepted solution.
    pub terminal_cost: f64,

    /// Number of solver iterations used.
    pub solve_iters: usize,

    /// True if the first control had to be clamped back into its declared
    /// bounds before being passed on.
    pub control_clamped: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl State for MpcCtrl {
    type InitData = &'static str;
    type InitError = MpcCtrlError;

    type InputData = InputData;
    type OutputData = ControlInput;
    type StatusReport = StatusReport;
    type ProcError = MpcCtrlError;

    /// Initialise the MpcCtrl module.
    ///
    /// Expected init data is the path to the parameter file. Builds the
    /// horizon problem and runs the warm-up solve so that the first cyclic
    /// solve starts from a feasible point.
    fn init(&mut self, init_data: Self::InitData, _session: &Session)
        -> Result<(), Self::InitError>
    {
        // Load the parameters
        let loaded: Params = params::load(init_data)?;

        loaded.are_valid().map_err(MpcCtrlError::ParamsInvalid)?;

        self.params = loaded;
        self.problem = Some(HorizonProblem::new(&self.params));

        self.warm_up();

        Ok(())
    }

    /// Perform cyclic processing of the MPC controller.
    ///
    /// Pushes the freshest estimate into the problem, solves, and returns
    /// the first step of the plan. Solve failures propagate to the executive
    /// which applies the safe-command fallback.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>
    {
        // Clear the status report
        self.report = StatusReport::default();

        let problem = match self.problem {
            Some(ref mut p) => p,
            None => return Err(MpcCtrlError::NotInitialised),
        };

        // Take the private copy of the freshest estimate, if there is one
        if let Some(est) = input_data.est {
            if !est.is_finite() {
                return Err(MpcCtrlError::NonFiniteEstimate);
            }

            problem.set_initial_condition(&est.into());
        }

        let trajectory = problem.solve()?;
        let stats = problem.last_stats();

        // The bounds are already enforced inside the solve, this clamp is
        // the last line of defence before the actuator mapping
        let raw = trajectory.first_control();
        let control = ControlInput {
            a_ms2: clamp(&raw.a_ms2, &self.params.a_min_ms2, &self.params.a_max_ms2),
            d_f_rad: clamp(&raw.d_f_rad, &self.params.d_f_min_rad, &self.params.d_f_max_rad),
        };

        if control != raw {
            warn!("First control was out of bounds and has been clamped");
            self.report.control_clamped = true;
        }

        self.report.terminal_cost = stats.cost;
        self.report.solve_iters = stats.iters;

        trace!(
            "MpcCtrl output: a = {:.3} m/s^2, d_f = {:.3} rad (cost {:.4}, {} iters)",
            control.a_ms2,
            control.d_f_rad,
            stats.cost,
            stats.iters
        );

        Ok((control, self.report))
    }
}

impl MpcCtrl {
    /// Build the module directly from a parameter struct.
    pub fn with_params(params: Params) -> Self {
        let problem = HorizonProblem::new(&params);

        Self {
            params,
            report: StatusReport::default(),
            problem: Some(problem),
        }
    }

    /// Run the warm-up solve from the default (zero) initial condition.
    ///
    /// Failure here is logged but not fatal, the cyclic solves will simply
    /// start cold.
    pub fn warm_up(&mut self) {
        if let Some(ref mut problem) = self.problem {
            match problem.solve() {
                Ok(_) => {
                    let stats = problem.last_stats();
                    info!(
                        "Warm-up solve complete ({} iters, cost {:.4})",
                        stats.iters, stats.cost
                    );
                }
                Err(e) => warn!("Warm-up solve failed: {}", e),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::vehicle_model::ModelParams;
    use crate::mpc_ctrl::SolverParams;

    fn test_params() -> Params {
        Params {
            model: ModelParams {
                l_a_m: 0.125,
                l_b_m: 0.125,
                dt_s: 0.1,
            },
            horizon_n: 5,
            v_min_ms: -1.0,
            v_max_ms: 2.0,
            a_min_ms2: -1.0,
            a_max_ms2: 1.0,
            d_f_min_rad: -0.3,
            d_f_max_rad: 0.3,
            x_ref_m: 2.0,
            y_ref_m: 0.0,
            solver: SolverParams {
                max_iters: 200,
                grad_tol: 1e-6,
                cost_rel_tol: 1e-9,
                step_init: 1.0,
                max_backtracks: 40,
            },
        }
    }

    #[test]
    fn test_proc_produces_bounded_control() {
        let mut mpc = MpcCtrl::with_params(test_params());
        mpc.warm_up();

        let input = InputData {
            est: Some(StateEstimate::default()),
        };

        let (control, report) = mpc.proc(&input).unwrap();

        assert!(control.a_ms2 >= -1.0 && control.a_ms2 <= 1.0);
        assert!(control.d_f_rad >= -0.3 && control.d_f_rad <= 0.3);
        assert!(!report.control_clamped);
    }

    #[test]
    fn test_proc_rejects_non_finite_estimate() {
        let mut mpc = MpcCtrl::with_params(test_params());

        let input = InputData {
            est: Some(StateEstimate {
                v_ms: f64::NAN,
                ..Default::default()
            }),
        };

        match mpc.proc(&input) {
            Err(MpcCtrlError::NonFiniteEstimate) => (),
            other => panic!("Expected NonFiniteEstimate, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_proc_without_estimate_uses_previous_condition() {
        let mut mpc = MpcCtrl::with_params(test_params());

        let est = StateEstimate {
            x_m: 0.5,
            ..Default::default()
        };

        mpc.proc(&InputData { est: Some(est) }).unwrap();

        // No new estimate, the previous initial condition stands
        mpc.proc(&InputData { est: None }).unwrap();

        let problem = mpc.problem.as_ref().unwrap();
        assert_eq!(problem.initial_condition().x_m, 0.5);
    }
}
