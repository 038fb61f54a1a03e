//! The horizon problem
//!
//! A single long-lived optimisation problem. The structure (horizon length,
//! bounds, target, objective) is fixed at construction, only the four
//! initial-condition parameters are overwritten between solves. Each solve
//! is warm-started from the previous solution shifted one step forwards,
//! which keeps the iteration count low when the state moves smoothly.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::Vector2;

// Internal
use super::{solver, Params, SolveStats, SolverParams};
use crate::vehicle_model::{ControlInput, VehicleModel, VehicleState};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Numerical slack allowed on the speed bounds when checking a solution.
const SPEED_BOUND_TOL_MS: f64 = 1e-6;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The receding-horizon optimisation problem.
///
/// The decision variables are never exposed, callers interact only through
/// [`HorizonProblem::set_initial_condition`] and [`HorizonProblem::solve`].
pub struct HorizonProblem {
    model: VehicleModel,

    /// Number of input steps over the horizon.
    n: usize,

    /// Lower input bounds, `(a_min, d_f_min)`.
    u_min: Vector2<f64>,

    /// Upper input bounds, `(a_max, d_f_max)`.
    u_max: Vector2<f64>,

    /// Speed bounds over the horizon.
    v_min_ms: f64,
    v_max_ms: f64,

    /// Target pose.
    x_ref_m: f64,
    y_ref_m: f64,

    solver_params: SolverParams,

    /// The initial-condition parameter block, overwritten every cycle.
    x0: VehicleState,

    /// Warm-start input sequence, the previous solution shifted one step.
    u: Vec<Vector2<f64>>,

    /// Statistics of the most recent successful solve.
    last_stats: SolveStats,
}

/// One planned trajectory over the horizon.
///
/// Always holds exactly one more state than inputs, with the first state
/// equal to the initial condition the solve started from. Only the first
/// input is ever executed.
#[derive(Debug, Clone)]
pub struct HorizonTrajectory {
    pub states: Vec<VehicleState>,
    pub inputs: Vec<ControlInput>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// A failed solve. Never fatal to the control loop, the executive falls back
/// to the safe actuator command instead.
#[derive(Debug, thiserror::Error)]
pub enum SolveError {
    #[error("The initial condition is not finite")]
    NonFiniteInitialCondition,

    #[error("The cost became non-finite during the solve")]
    NonFiniteCost,

    #[error("No convergence within {0} iterations")]
    IterationLimit(usize),

    #[error("The solution violates the speed bounds")]
    SpeedBoundsViolated,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl HorizonProblem {
    /// Build the problem structure. Done once, at module initialisation.
    ///
    /// The warm start begins as an all-zero input sequence.
    pub fn new(params: &Params) -> Self {
        Self {
            model: VehicleModel::new(params.model),
            n: params.horizon_n,
            u_min: Vector2::new(params.a_min_ms2, params.d_f_min_rad),
            u_max: Vector2::new(params.a_max_ms2, params.d_f_max_rad),
            v_min_ms: params.v_min_ms,
            v_max_ms: params.v_max_ms,
            x_ref_m: params.x_ref_m,
            y_ref_m: params.y_ref_m,
            solver_params: params.solver,
            x0: VehicleState::default(),
            u: vec![Vector2::zeros(); params.horizon_n],
            last_stats: SolveStats::default(),
        }
    }

    /// Number of input steps over the horizon.
    pub fn horizon_len(&self) -> usize {
        self.n
    }

    /// Overwrite the initial-condition parameters in place.
    ///
    /// O(1), the problem structure is untouched so the next solve still
    /// benefits from the warm start.
    pub fn set_initial_condition(&mut self, state: &VehicleState) {
        self.x0 = *state;
    }

    /// The initial condition the next solve will start from.
    pub fn initial_condition(&self) -> &VehicleState {
        &self.x0
    }

    /// Statistics of the most recent successful solve.
    pub fn last_stats(&self) -> SolveStats {
        self.last_stats
    }

    /// Solve the problem from the current initial condition.
    ///
    /// On success the warm start is advanced for the next cycle and the full
    /// trajectory is returned. On failure the warm start is left untouched
    /// and a typed [`SolveError`] is returned for the executive to handle.
    pub fn solve(&mut self) -> Result<HorizonTrajectory, SolveError> {
        if !(self.x0.x_m.is_finite()
            && self.x0.y_m.is_finite()
            && self.x0.psi_rad.is_finite()
            && self.x0.v_ms.is_finite())
        {
            return Err(SolveError::NonFiniteInitialCondition);
        }

        let mut u = self.u.clone();

        self.last_stats = solver::minimise(
            &self.model,
            &self.x0,
            &mut u,
            &self.u_min,
            &self.u_max,
            self.x_ref_m,
            self.y_ref_m,
            &self.solver_params,
        )?;

        let states = solver::rollout(&self.model, &self.x0, &u);

        // The speed is a bounded state, a plan that leaves the bounds is
        // infeasible and must not reach the actuators
        for state in &states {
            if state.v_ms < self.v_min_ms - SPEED_BOUND_TOL_MS
                || state.v_ms > self.v_max_ms + SPEED_BOUND_TOL_MS
            {
                return Err(SolveError::SpeedBoundsViolated);
            }
        }

        // Advance the warm start: drop the executed step, repeat the last
        self.u.clear();
        self.u.extend_from_slice(&u[1..]);
        self.u.push(u[self.n - 1]);

        Ok(HorizonTrajectory {
            states,
            inputs: u
                .iter()
                .map(|u_k| ControlInput {
                    a_ms2: u_k[0],
                    d_f_rad: u_k[1],
                })
                .collect(),
        })
    }
}

impl HorizonTrajectory {
    /// The only part of the plan that is ever executed.
    pub fn first_control(&self) -> ControlInput {
        self.inputs[0]
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::vehicle_model::ModelParams;

    pub(crate) fn test_params() -> Params {
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
            solver: crate::mpc_ctrl::SolverParams {
                max_iters: 200,
                grad_tol: 1e-6,
                cost_rel_tol: 1e-9,
                step_init: 1.0,
                max_backtracks: 40,
            },
        }
    }

    #[test]
    fn test_solve_shape_and_bounds() {
        let params = test_params();
        let mut problem = HorizonProblem::new(&params);

        problem.set_initial_condition(&VehicleState::default());
        let traj = problem.solve().unwrap();

        // Exactly N+1 states and N inputs
        assert_eq!(traj.states.len(), 6);
        assert_eq!(traj.inputs.len(), 5);

        // The first state is the pushed initial condition
        assert_eq!(traj.states[0], VehicleState::default());

        // Every input respects the declared bounds
        for input in &traj.inputs {
            assert!(input.a_ms2 >= params.a_min_ms2 && input.a_ms2 <= params.a_max_ms2);
            assert!(
                input.d_f_rad >= params.d_f_min_rad && input.d_f_rad <= params.d_f_max_rad
            );
        }
    }

    #[test]
    fn test_set_initial_condition_overwrites() {
        let mut problem = HorizonProblem::new(&test_params());

        let first = VehicleState {
            x_m: 1.0,
            ..Default::default()
        };
        let second = VehicleState {
            x_m: -1.0,
            y_m: 0.5,
            ..Default::default()
        };

        // Two rapid updates before a solve, only the most recent one counts
        problem.set_initial_condition(&first);
        problem.set_initial_condition(&second);

        assert_eq!(*problem.initial_condition(), second);

        let traj = problem.solve().unwrap();
        assert_eq!(traj.states[0], second);
    }

    #[test]
    fn test_solve_rejects_non_finite_initial_condition() {
        let mut problem = HorizonProblem::new(&test_params());

        problem.set_initial_condition(&VehicleState {
            psi_rad: f64::NAN,
            ..Default::default()
        });

        match problem.solve() {
            Err(SolveError::NonFiniteInitialCondition) => (),
            other => panic!("Expected NonFiniteInitialCondition, got {:?}", other),
        }
    }

    #[test]
    fn test_warm_start_advances_on_success() {
        let mut problem = HorizonProblem::new(&test_params());

        problem.set_initial_condition(&VehicleState::default());
        let first = problem.solve().unwrap();

        // A second solve from the same state starts at the shifted previous
        // solution and stays feasible
        let second = problem.solve().unwrap();

        assert_eq!(second.states.len(), first.states.len());
        assert_eq!(second.inputs.len(), first.inputs.len());
    }
}
