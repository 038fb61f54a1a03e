//! Implementations for the ActMapper state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{trace, warn};
use serde::Serialize;

// Internal
use super::{ActMapperError, CalibrationTable, Params};
use crate::vehicle_model::ControlInput;
use comms_if::act::ActCmd;
use util::{maths::poly_val, module::State, params, session::Session};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Actuator mapping module state
#[derive(Default)]
pub struct ActMapper {
    pub(crate) params: Params,

    pub(crate) report: StatusReport,

    /// The measured ESC calibration table, loaded once at init.
    table: Option<CalibrationTable>,

    /// The last commanded servo pulse. Safe commands hold the steering here
    /// rather than snapping it somewhere new.
    current_servo_pulse: f64,
}

/// Input data to the actuator mapper.
#[derive(Default)]
pub struct InputData {
    /// If true the control demand is ignored and the safe command (neutral
    /// ESC, held steering) is emitted instead.
    pub safe_mode: bool,

    /// The control demand to map.
    pub control: ControlInput,
}

/// Status report for ActMapper processing.
#[derive(Clone, Copy, Default, Serialize, Debug)]
pub struct StatusReport {
    /// True if the direction clamp had to move the looked-up ESC pulse.
    pub esc_clamped: bool,

    /// True if no calibration point lay within the match tolerance.
    pub no_cal_match: bool,

    /// True if the emitted command was the safe command.
    pub safe_cmd: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl State for ActMapper {
    type InitData = &'static str;
    type InitError = ActMapperError;

    type InputData = InputData;
    type OutputData = ActCmd;
    type StatusReport = StatusReport;
    type ProcError = ActMapperError;

    /// Initialise the ActMapper module.
    ///
    /// Expected init data is the path to the parameter file. Loads and
    /// validates the calibration table, an empty or malformed table is fatal
    /// since no actuator command can be computed without it.
    fn init(&mut self, init_data: Self::InitData, _session: &Session)
        -> Result<(), Self::InitError>
    {
        // Load the parameters
        let loaded: Params = params::load(init_data)?;

        loaded.are_valid().map_err(ActMapperError::ParamsInvalid)?;

        let table_path = params::data_path(&loaded.esc_cal_file)?;
        let table = CalibrationTable::from_csv_file(table_path)?;

        self.params = loaded;
        self.table = Some(table);

        // Start with the steering centred
        self.current_servo_pulse = self.angle_to_servo_pulse(0.0);

        Ok(())
    }

    /// Perform cyclic processing of the actuator mapper.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>
    {
        // Clear the status report
        self.report = StatusReport::default();

        // Check we have a table before doing anything else
        if self.table.is_none() {
            return Err(ActMapperError::NotInitialised);
        }

        let cmd = if input_data.safe_mode {
            self.safe_cmd()
        } else {
            let accel = input_data.control.a_ms2;
            let servo_pulse =
                self.angle_to_servo_pulse(input_data.control.d_f_rad.to_degrees());

            let nearest = self
                .table
                .as_ref()
                .unwrap()
                .nearest_pulse(accel, self.params.accel_match_tol_ms2);

            match nearest {
                Some(pulse) => {
                    let esc_pulse = self.clamp_esc(pulse, accel);
                    self.current_servo_pulse = servo_pulse;

                    ActCmd {
                        esc_pulse,
                        servo_pulse,
                    }
                }
                None => {
                    warn!(
                        "No calibration point within {} m/s^2 of the demanded {:.3} m/s^2, \
                         commanding safe",
                        self.params.accel_match_tol_ms2, accel
                    );
                    self.report.no_cal_match = true;

                    self.safe_cmd()
                }
            }
        };

        trace!(
            "ActMapper output: esc = {}, servo = {:.2}",
            cmd.esc_pulse,
            cmd.servo_pulse
        );

        Ok((cmd, self.report))
    }
}

impl ActMapper {
    /// Build the module directly from a parameter struct and a table.
    pub fn with_parts(params: Params, table: CalibrationTable) -> Self {
        let mut mapper = Self {
            params,
            report: StatusReport::default(),
            table: Some(table),
            current_servo_pulse: 0.0,
        };
        mapper.current_servo_pulse = mapper.angle_to_servo_pulse(0.0);

        mapper
    }

    /// Convert a steering angle in degrees to a servo pulse width using the
    /// measured polynomial fit.
    pub fn angle_to_servo_pulse(&self, angle_deg: f64) -> f64 {
        poly_val(
            &(angle_deg - self.params.servo_angle_offset_deg),
            &self.params.servo_poly_coeffs,
        )
    }

    /// The safe command: ESC at neutral, steering held at its last pulse.
    fn safe_cmd(&mut self) -> ActCmd {
        self.report.safe_cmd = true;

        ActCmd {
            esc_pulse: self.params.esc_neutral_pulse,
            servo_pulse: self.current_servo_pulse,
        }
    }

    /// Clamp a looked-up ESC pulse so it cannot cross into the wrong
    /// actuation direction.
    ///
    /// Forward demands never fall below the minimum forward pulse, braking
    /// and neutral demands never rise above the neutral pulse. The two
    /// thresholds are device constants, not derived from the table.
    fn clamp_esc(&mut self, pulse: u16, accel_ms2: f64) -> u16 {
        let clamped = if accel_ms2 > 0.0 {
            pulse.max(self.params.esc_min_fwd_pulse)
        } else {
            pulse.min(self.params.esc_neutral_pulse)
        };

        if clamped != pulse {
            self.report.esc_clamped = true;
        }

        clamped
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::act_mapper::CalibrationPoint;

    fn test_params() -> Params {
        Params {
            servo_poly_coeffs: vec![-0.0104, 1.8194, 92.0558],
            servo_angle_offset_deg: 2.0,
            esc_min_fwd_pulse: 96,
            esc_neutral_pulse: 90,
            accel_match_tol_ms2: 10.0,
            esc_cal_file: String::new(),
        }
    }

    fn test_table() -> CalibrationTable {
        CalibrationTable::from_points(vec![
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
        .unwrap()
    }

    #[test]
    fn test_servo_fit_at_offset_angle() {
        let mapper = ActMapper::with_parts(test_params(), test_table());

        // At the offset angle only the constant term of the fit remains
        assert_eq!(mapper.angle_to_servo_pulse(2.0), 92.0558);
    }

    #[test]
    fn test_servo_fit_monotone_over_steering_range() {
        let mapper = ActMapper::with_parts(test_params(), test_table());

        let mut previous = mapper.angle_to_servo_pulse(-30.0);
        let mut angle = -29.0;
        while angle <= 30.0 {
            let pulse = mapper.angle_to_servo_pulse(angle);
            assert!(pulse > previous, "fit not monotone at {} deg", angle);
            previous = pulse;
            angle += 1.0;
        }
    }

    #[test]
    fn test_forward_demand_never_below_min_forward_pulse() {
        let mut mapper = ActMapper::with_parts(test_params(), test_table());

        // 0.5 m/s^2 matches the point at pulse 94, below the forward clamp
        let (cmd, report) = mapper
            .proc(&InputData {
                safe_mode: false,
                control: ControlInput {
                    a_ms2: 0.5,
                    d_f_rad: 0.0,
                },
            })
            .unwrap();

        assert!(cmd.esc_pulse >= 96);
        assert!(report.esc_clamped);
    }

    #[test]
    fn test_braking_demand_never_above_neutral() {
        let mut mapper = ActMapper::with_parts(test_params(), test_table());

        let (cmd, _) = mapper
            .proc(&InputData {
                safe_mode: false,
                control: ControlInput {
                    a_ms2: -0.8,
                    d_f_rad: 0.0,
                },
            })
            .unwrap();

        assert!(cmd.esc_pulse <= 90);
    }

    #[test]
    fn test_no_match_falls_back_to_safe_command() {
        let mut params = test_params();
        params.accel_match_tol_ms2 = 0.01;
        let mut mapper = ActMapper::with_parts(params, test_table());

        // Establish a steering pulse to hold
        let (normal, _) = mapper
            .proc(&InputData {
                safe_mode: false,
                control: ControlInput {
                    a_ms2: 0.0,
                    d_f_rad: 0.1,
                },
            })
            .unwrap();

        // 3.0 m/s^2 is nowhere near any table point under the tight
        // tolerance
        let (cmd, report) = mapper
            .proc(&InputData {
                safe_mode: false,
                control: ControlInput {
                    a_ms2: 3.0,
                    d_f_rad: 0.2,
                },
            })
            .unwrap();

        assert!(report.no_cal_match);
        assert!(report.safe_cmd);
        assert_eq!(cmd.esc_pulse, 90);
        assert_eq!(cmd.servo_pulse, normal.servo_pulse);
    }

    #[test]
    fn test_safe_mode_emits_neutral_and_holds_steering() {
        let mut mapper = ActMapper::with_parts(test_params(), test_table());

        let (normal, _) = mapper
            .proc(&InputData {
                safe_mode: false,
                control: ControlInput {
                    a_ms2: 1.2,
                    d_f_rad: -0.05,
                },
            })
            .unwrap();

        let (safe, report) = mapper
            .proc(&InputData {
                safe_mode: true,
                control: ControlInput {
                    a_ms2: 1.2,
                    d_f_rad: 0.3,
                },
            })
            .unwrap();

        assert!(report.safe_cmd);
        assert_eq!(safe.esc_pulse, 90);
        assert_eq!(safe.servo_pulse, normal.servo_pulse);
    }
}
