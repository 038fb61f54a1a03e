//! # Horizon Solve Benchmark

use criterion::{criterion_group, criterion_main, Criterion};

use ctrl_lib::mpc_ctrl::{HorizonProblem, Params, SolverParams};
use ctrl_lib::vehicle_model::{ModelParams, VehicleState};

fn solve_benchmark(c: &mut Criterion) {
    // ---- Build the horizon problem ----

    let params = Params {
        model: ModelParams {
            l_a_m: 0.125,
            l_b_m: 0.125,
            dt_s: 0.1,
        },
        horizon_n: 10,
        v_min_ms: -1.0,
        v_max_ms: 2.0,
        a_min_ms2: -1.0,
        a_max_ms2: 1.0,
        d_f_min_rad: -0.3,
        d_f_max_rad: 0.3,
        x_ref_m: 2.0,
        y_ref_m: 0.5,
        solver: SolverParams {
            max_iters: 200,
            grad_tol: 1e-6,
            cost_rel_tol: 1e-9,
            step_init: 1.0,
            max_backtracks: 40,
        },
    };

    let mut problem = HorizonProblem::new(&params);

    // One solve to populate the warm start, the steady-state case is what
    // matters for the cycle budget
    problem.set_initial_condition(&VehicleState::default());
    problem.solve().unwrap();

    c.bench_function("HorizonProblem::solve", |b| {
        b.iter(|| {
            problem.set_initial_condition(&VehicleState {
                x_m: 0.1,
                y_m: 0.05,
                psi_rad: 0.1,
                v_ms: 0.4,
            });
            problem.solve().unwrap()
        })
    });
}

criterion_group!(benches, solve_benchmark);
criterion_main!(benches);
