//! # Vehicle model
//!
//! Discrete-time kinematic bicycle model of the car. The model is shared
//! between the optimiser, which uses it to propagate candidate input
//! sequences over the horizon, and tests, which use it for rollouts.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::{Matrix4, Matrix4x2};
use serde::{Deserialize, Serialize};

// Internal
use comms_if::est::StateEstimate;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Geometric and temporal constants of the model.
#[derive(Debug, Default, Deserialize, Clone, Copy)]
pub struct ModelParams {
    /// Distance from the centre of gravity to the front axle.
    ///
    /// Units: meters
    pub l_a_m: f64,

    /// Distance from the centre of gravity to the rear axle.
    ///
    /// Units: meters
    pub l_b_m: f64,

    /// Discretisation time step.
    ///
    /// Units: seconds
    pub dt_s: f64,
}

/// State of the vehicle as used by the model and optimiser.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize)]
pub struct VehicleState {
    /// X position in the world frame (meters)
    pub x_m: f64,

    /// Y position in the world frame (meters)
    pub y_m: f64,

    /// Heading about the world frame Z+ axis (radians)
    pub psi_rad: f64,

    /// Body-frame longitudinal speed (meters/second)
    pub v_ms: f64,
}

/// Control input applied over one model step.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize)]
pub struct ControlInput {
    /// Longitudinal acceleration demand (meters/second^2)
    pub a_ms2: f64,

    /// Front steering angle demand (radians)
    pub d_f_rad: f64,
}

/// The kinematic bicycle model itself. Stateless, all methods are pure.
#[derive(Debug, Default, Clone, Copy)]
pub struct VehicleModel {
    params: ModelParams,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl VehicleModel {
    /// Create a new model from the given parameters.
    pub fn new(params: ModelParams) -> Self {
        Self { params }
    }

    /// The model's discretisation step in seconds.
    pub fn dt_s(&self) -> f64 {
        self.params.dt_s
    }

    /// Propagate the state one step forwards under the given input.
    ///
    /// The sideslip angle `beta` is derived from the steering angle and the
    /// axle geometry, the pose is advanced along the resulting velocity
    /// direction, and the speed is advanced by the commanded acceleration.
    pub fn step(&self, state: &VehicleState, input: &ControlInput) -> VehicleState {
        let p = &self.params;

        let beta = (p.l_b_m / (p.l_a_m + p.l_b_m) * input.d_f_rad.tan()).atan();

        VehicleState {
            x_m: state.x_m + p.dt_s * state.v_ms * (state.psi_rad + beta).cos(),
            y_m: state.y_m + p.dt_s * state.v_ms * (state.psi_rad + beta).sin(),
            psi_rad: state.psi_rad + p.dt_s * state.v_ms / p.l_b_m * beta.sin(),
            v_ms: state.v_ms + p.dt_s * input.a_ms2,
        }
    }

    /// Jacobians of [`VehicleModel::step`] with respect to the state and the
    /// input, evaluated at the given operating point.
    ///
    /// Used by the solver to propagate cost gradients backwards through the
    /// horizon.
    pub fn linearise(
        &self,
        state: &VehicleState,
        input: &ControlInput,
    ) -> (Matrix4<f64>, Matrix4x2<f64>) {
        let p = &self.params;

        let k = p.l_b_m / (p.l_a_m + p.l_b_m);
        let tan_d_f = input.d_f_rad.tan();
        let beta = (k * tan_d_f).atan();

        // d(beta)/d(d_f) by the chain rule through atan and tan
        let dbeta_dd_f = k * (1.0 + tan_d_f * tan_d_f) / (1.0 + (k * tan_d_f).powi(2));

        let course = state.psi_rad + beta;
        let (sin_course, cos_course) = (course.sin(), course.cos());

        let a = Matrix4::new(
            1.0, 0.0, -p.dt_s * state.v_ms * sin_course, p.dt_s * cos_course,
            0.0, 1.0, p.dt_s * state.v_ms * cos_course, p.dt_s * sin_course,
            0.0, 0.0, 1.0, p.dt_s * beta.sin() / p.l_b_m,
            0.0, 0.0, 0.0, 1.0,
        );

        let b = Matrix4x2::new(
            0.0, -p.dt_s * state.v_ms * sin_course * dbeta_dd_f,
            0.0, p.dt_s * state.v_ms * cos_course * dbeta_dd_f,
            0.0, p.dt_s * state.v_ms / p.l_b_m * beta.cos() * dbeta_dd_f,
            p.dt_s, 0.0,
        );

        (a, b)
    }
}

impl From<StateEstimate> for VehicleState {
    fn from(est: StateEstimate) -> Self {
        Self {
            x_m: est.x_m,
            y_m: est.y_m,
            psi_rad: est.psi_rad,
            v_ms: est.v_ms,
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
