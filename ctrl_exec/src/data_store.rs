//! # Data Store

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::act::ActCmd;
use log::warn;

use crate::{act_mapper, mpc_ctrl, vehicle_model::ControlInput};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Global data store for the executable.
#[derive(Default)]
pub struct DataStore {
    // Cycle management
    /// Number of cycles already executed
    pub num_cycles: u128,

    /// True while solve failures force safe commands out of the mapper.
    pub safe: bool,

    // MpcCtrl
    pub mpc_ctrl: mpc_ctrl::MpcCtrl,
    pub mpc_ctrl_input: mpc_ctrl::InputData,
    pub mpc_ctrl_output: ControlInput,
    pub mpc_ctrl_status_rpt: mpc_ctrl::StatusReport,

    // ActMapper
    pub act_mapper: act_mapper::ActMapper,
    pub act_mapper_input: act_mapper::InputData,
    pub act_mapper_output: Option<ActCmd>,
    pub act_mapper_status_rpt: act_mapper::StatusReport,

    // Monitoring Counters
    /// Number of consecutive cycle overruns
    pub num_consec_cycle_overruns: u64,

    /// Number of consecutive failed solves
    pub num_consec_solve_failures: u64,

    /// Total number of failed solves this session
    pub num_solve_failures_total: u64,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl DataStore {
    /// Record a failed solve on this cycle.
    ///
    /// Puts the cycle into safe mode so the mapper emits the safe command
    /// rather than anything derived from stale decision variables.
    pub fn solve_failed(&mut self, consec_limit: u64) {
        self.num_consec_solve_failures += 1;
        self.num_solve_failures_total += 1;
        self.safe = true;

        if self.num_consec_solve_failures == consec_limit {
            warn!(
                "{} consecutive solve failures ({} total this session)",
                self.num_consec_solve_failures, self.num_solve_failures_total
            );
        }
    }

    /// Record a successful solve on this cycle.
    pub fn solve_succeeded(&mut self) {
        self.num_consec_solve_failures = 0;
        self.safe = false;
    }

    /// Perform actions required at the start of a cycle.
    ///
    /// Clears those items that need clearing at the start of a cycle.
    pub fn cycle_start(&mut self) {
        self.mpc_ctrl_input = mpc_ctrl::InputData::default();
        self.mpc_ctrl_output = ControlInput::default();
        self.mpc_ctrl_status_rpt = mpc_ctrl::StatusReport::default();

        self.act_mapper_input = act_mapper::InputData::default();
        self.act_mapper_output = None;
        self.act_mapper_status_rpt = act_mapper::StatusReport::default();
    }
}
