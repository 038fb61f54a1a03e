//! Solver core for the horizon problem
//!
//! Projected-gradient descent over the input sequence. The dynamics
//! equalities are eliminated by forward substitution through the vehicle
//! model, gradients are propagated backwards through the model's
//! linearisation, and the input bounds are enforced by projection after
//! every step. A backtracking line search keeps the cost monotonically
//! decreasing.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::{Vector2, Vector4};

// Internal
use super::{SolveError, SolverParams};
use crate::vehicle_model::{ControlInput, VehicleModel, VehicleState};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Summary of one completed solve.
#[derive(Debug, Default, Clone, Copy)]
pub struct SolveStats {
    /// Number of descent iterations performed.
    pub iters: usize,

    /// Terminal cost of the accepted solution.
    pub cost: f64,
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Propagate the initial condition through the model under the given input
/// sequence, producing the full state trajectory (one more state than
/// inputs).
pub(super) fn rollout(
    model: &VehicleModel,
    x0: &VehicleState,
    u: &[Vector2<f64>],
) -> Vec<VehicleState> {
    let mut states = Vec::with_capacity(u.len() + 1);
    states.push(*x0);

    for u_k in u {
        let input = to_input(u_k);
        let next = model.step(states.last().unwrap(), &input);
        states.push(next);
    }

    states
}

/// Terminal tracking cost of a trajectory.
///
/// Squared distance to the target pose plus a terminal speed penalty, so
/// the plan arrives slow rather than at full tilt.
pub(super) fn terminal_cost(states: &[VehicleState], x_ref_m: f64, y_ref_m: f64) -> f64 {
    let term = states.last().unwrap();

    (term.x_m - x_ref_m).powi(2) + (term.y_m - y_ref_m).powi(2) + term.v_ms.powi(2)
}

/// Minimise the terminal cost over the input sequence, in place.
///
/// `u` is both the warm start and the output. Returns solve statistics on
/// convergence, or a [`SolveError`] if the iteration limit is reached or the
/// cost stops being finite.
pub(super) fn minimise(
    model: &VehicleModel,
    x0: &VehicleState,
    u: &mut Vec<Vector2<f64>>,
    u_min: &Vector2<f64>,
    u_max: &Vector2<f64>,
    x_ref_m: f64,
    y_ref_m: f64,
    params: &SolverParams,
) -> Result<SolveStats, SolveError> {
    // Ensure the warm start itself respects the bounds
    for u_k in u.iter_mut() {
        *u_k = project(u_k, u_min, u_max);
    }

    let mut states = rollout(model, x0, u);
    let mut cost = terminal_cost(&states, x_ref_m, y_ref_m);

    if !cost.is_finite() {
        return Err(SolveError::NonFiniteCost);
    }

    for iter in 0..params.max_iters {
        let grads = input_gradients(model, &states, u, x_ref_m, y_ref_m);

        // Convergence on the projected gradient: components pushing past an
        // active bound do not count
        let mut pg_norm_sq = 0.0;
        for (u_k, g_k) in u.iter().zip(grads.iter()) {
            let pg = u_k - project(&(u_k - g_k), u_min, u_max);
            pg_norm_sq += pg.norm_squared();
        }

        if pg_norm_sq.sqrt() < params.grad_tol {
            return Ok(SolveStats { iters: iter, cost });
        }

        // Backtracking line search along the projected gradient direction
        let mut alpha = params.step_init;
        let mut accepted = None;

        for _ in 0..params.max_backtracks {
            let u_trial: Vec<Vector2<f64>> = u
                .iter()
                .zip(grads.iter())
                .map(|(u_k, g_k)| project(&(u_k - alpha * g_k), u_min, u_max))
                .collect();

            let states_trial = rollout(model, x0, &u_trial);
            let cost_trial = terminal_cost(&states_trial, x_ref_m, y_ref_m);

            if cost_trial.is_finite() && cost_trial < cost {
                accepted = Some((u_trial, states_trial, cost_trial));
                break;
            }

            alpha *= 0.5;
        }

        match accepted {
            Some((u_new, states_new, cost_new)) => {
                let rel_drop = (cost - cost_new) / cost.max(f64::EPSILON);

                *u = u_new;
                states = states_new;
                cost = cost_new;

                if rel_drop < params.cost_rel_tol {
                    return Ok(SolveStats { iters: iter + 1, cost });
                }
            }
            // No improving step exists within numerical precision, the
            // current iterate is stationary
            None => return Ok(SolveStats { iters: iter + 1, cost }),
        }
    }

    Err(SolveError::IterationLimit(params.max_iters))
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Gradient of the terminal cost with respect to each input step, computed
/// by one backwards (adjoint) sweep through the linearised dynamics.
fn input_gradients(
    model: &VehicleModel,
    states: &[VehicleState],
    u: &[Vector2<f64>],
    x_ref_m: f64,
    y_ref_m: f64,
) -> Vec<Vector2<f64>> {
    let n = u.len();
    let term = states.last().unwrap();

    // d(cost)/d(x_N)
    let mut lambda = Vector4::new(
        2.0 * (term.x_m - x_ref_m),
        2.0 * (term.y_m - y_ref_m),
        0.0,
        2.0 * term.v_ms,
    );

    let mut grads = vec![Vector2::zeros(); n];

    for k in (0..n).rev() {
        let (a, b) = model.linearise(&states[k], &to_input(&u[k]));

        grads[k] = b.transpose() * lambda;
        lambda = a.transpose() * lambda;
    }

    grads
}

/// Project an input onto its box bounds.
fn project(u_k: &Vector2<f64>, u_min: &Vector2<f64>, u_max: &Vector2<f64>) -> Vector2<f64> {
    Vector2::new(
        u_k[0].max(u_min[0]).min(u_max[0]),
        u_k[1].max(u_min[1]).min(u_max[1]),
    )
}

/// View an input vector as a model input.
fn to_input(u_k: &Vector2<f64>) -> ControlInput {
    ControlInput {
        a_ms2: u_k[0],
        d_f_rad: u_k[1],
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::vehicle_model::ModelParams;

    fn test_model() -> VehicleModel {
        VehicleModel::new(ModelParams {
            l_a_m: 0.125,
            l_b_m: 0.125,
            dt_s: 0.1,
        })
    }

    #[test]
    fn test_rollout_shape() {
        let model = test_model();
        let u = vec![Vector2::new(0.5, 0.0); 5];

        let states = rollout(&model, &VehicleState::default(), &u);

        assert_eq!(states.len(), 6);
        assert_eq!(states[0], VehicleState::default());
    }

    #[test]
    fn test_minimise_reduces_cost() {
        let model = test_model();
        let params = SolverParams {
            max_iters: 100,
            grad_tol: 1e-6,
            cost_rel_tol: 1e-9,
            step_init: 1.0,
            max_backtracks: 30,
        };

        let mut u = vec![Vector2::zeros(); 5];
        let x0 = VehicleState::default();

        let initial_cost = terminal_cost(&rollout(&model, &x0, &u), 2.0, 0.0);

        let stats = minimise(
            &model,
            &x0,
            &mut u,
            &Vector2::new(-1.0, -0.3),
            &Vector2::new(1.0, 0.3),
            2.0,
            0.0,
            &params,
        )
        .unwrap();

        assert!(stats.cost < initial_cost);

        // Bounds hold on every accepted input
        for u_k in &u {
            assert!(u_k[0] >= -1.0 && u_k[0] <= 1.0);
            assert!(u_k[1] >= -0.3 && u_k[1] <= 0.3);
        }
    }

    #[test]
    fn test_minimise_rejects_non_finite_start() {
        let model = test_model();
        let params = SolverParams {
            max_iters: 10,
            grad_tol: 1e-6,
            cost_rel_tol: 1e-9,
            step_init: 1.0,
            max_backtracks: 10,
        };

        let mut u = vec![Vector2::zeros(); 3];
        let x0 = VehicleState {
            x_m: f64::NAN,
            ..Default::default()
        };

        match minimise(
            &model,
            &x0,
            &mut u,
            &Vector2::new(-1.0, -0.3),
            &Vector2::new(1.0, 0.3),
            2.0,
            0.0,
            &params,
        ) {
            Err(SolveError::NonFiniteCost) => (),
            other => panic!("Expected NonFiniteCost, got {:?}", other),
        }
    }
}
