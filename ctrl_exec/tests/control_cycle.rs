//! Integration tests for the sense -> optimize -> actuate cycle, run
//! offline with the messaging layer replaced by direct mailbox access.

use comms_if::est::StateEstimate;
use ctrl_lib::{
    act_mapper::{ActMapper, CalibrationPoint, CalibrationTable},
    est_client::LatestState,
    mpc_ctrl::{MpcCtrl, Params as MpcParams, SolverParams},
    vehicle_model::ModelParams,
};
use util::module::State;

fn mpc_params() -> MpcParams {
    MpcParams {
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

fn act_mapper() -> ActMapper {
    let params = ctrl_lib::act_mapper::Params {
        servo_poly_coeffs: vec![-0.0104, 1.8194, 92.0558],
        servo_angle_offset_deg: 2.0,
        esc_min_fwd_pulse: 96,
        esc_neutral_pulse: 90,
        accel_match_tol_ms2: 10.0,
        esc_cal_file: String::new(),
    };

    let table = CalibrationTable::from_points(vec![
        CalibrationPoint {
            pulse_width: 84,
            accel_ms2: -0.8,
        },
        CalibrationPoint {
            pulse_width: 90,
            accel_ms2: 0.0,
        },
        CalibrationPoint {
            pulse_width: 94,
            accel_ms2: 0.5,
        },
        CalibrationPoint {
            pulse_width: 100,
            accel_ms2: 1.2,
        },
    ])
    .unwrap();

    ActMapper::with_parts(params, table)
}

#[test]
fn nominal_cycle_emits_clamped_command() {
    let latest = LatestState::default();
    let mut mpc = MpcCtrl::with_params(mpc_params());
    let mut mapper = act_mapper();

    mpc.warm_up();

    // The estimator publishes twice before the tick fires, the tick must
    // only ever see the second estimate
    latest.set(StateEstimate {
        x_m: 5.0,
        ..Default::default()
    });
    latest.set(StateEstimate::default());

    let (control, _) = mpc
        .proc(&ctrl_lib::mpc_ctrl::InputData { est: latest.get() })
        .unwrap();

    // Towards a target ahead of the car the plan accelerates forwards
    assert!(control.a_ms2 > 0.0);

    let (cmd, report) = mapper
        .proc(&ctrl_lib::act_mapper::InputData {
            safe_mode: false,
            control,
        })
        .unwrap();

    assert!(!report.safe_cmd);

    // A forward demand can never reach below the minimum forward pulse
    assert!(cmd.esc_pulse >= 96);
}

#[test]
fn failed_solve_tick_emits_only_the_safe_command() {
    let mut mpc = MpcCtrl::with_params(mpc_params());
    let mut mapper = act_mapper();

    mpc.warm_up();

    // A nominal tick first, to give the mapper a held steering pulse
    let (control, _) = mpc
        .proc(&ctrl_lib::mpc_ctrl::InputData {
            est: Some(StateEstimate::default()),
        })
        .unwrap();
    let (nominal_cmd, _) = mapper
        .proc(&ctrl_lib::act_mapper::InputData {
            safe_mode: false,
            control,
        })
        .unwrap();

    // A corrupted estimate makes the solve fail
    let result = mpc.proc(&ctrl_lib::mpc_ctrl::InputData {
        est: Some(StateEstimate {
            psi_rad: f64::NAN,
            ..Default::default()
        }),
    });
    assert!(result.is_err());

    // The executive maps in safe mode for this tick, the emitted command is
    // the safe command and nothing else
    let (safe_cmd, report) = mapper
        .proc(&ctrl_lib::act_mapper::InputData {
            safe_mode: true,
            control: Default::default(),
        })
        .unwrap();

    assert!(report.safe_cmd);
    assert_eq!(safe_cmd.esc_pulse, 90);
    assert_eq!(safe_cmd.servo_pulse, nominal_cmd.servo_pulse);
}

#[test]
fn horizon_shape_holds_through_the_module() {
    let mut mpc = MpcCtrl::with_params(mpc_params());

    mpc.warm_up();

    let (control, report) = mpc
        .proc(&ctrl_lib::mpc_ctrl::InputData {
            est: Some(StateEstimate::default()),
        })
        .unwrap();

    // The module only ever surfaces the first input of the plan, bounded
    assert!(control.a_ms2 >= -1.0 && control.a_ms2 <= 1.0);
    assert!(control.d_f_rad >= -0.3 && control.d_f_rad <= 0.3);
    assert!(report.terminal_cost.is_finite());
}
