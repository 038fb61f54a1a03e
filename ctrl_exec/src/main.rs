//! Main control executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise all modules, including the warm-up solve
//!     - Main loop:
//!         - Read the freshest state estimate
//!         - Receding-horizon solve (MpcCtrl)
//!         - Actuator mapping (ActMapper)
//!         - Command output to the actuation board
//!
//! State estimates arrive asynchronously on the estimate client's listener
//! thread, the loop itself runs at a fixed cadence and always uses the
//! freshest estimate available. A failed solve never stops the loop, the
//! cycle falls back to the safe actuator command instead.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Report};
use log::{info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

// Internal
use comms_if::net::NetParams;
use ctrl_lib::{
    act_client::ActClient, act_mapper, data_store::DataStore, est_client::EstClient,
    params::CtrlExecParams,
};
use util::{
    logger::{logger_init, LevelFilter},
    module::State,
    session::Session,
};

// ---------------------------------------------------------------------------
// STATICS
// ---------------------------------------------------------------------------

/// Raised by the signal handler, observed by the main loop between cycles.
static SHUTDOWN: AtomicBool = AtomicBool::new(false);

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Number of consecutive solve failures after which the warning is escalated.
const MAX_CONSEC_SOLVE_FAILURE_LIMIT: u64 = 10;

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session =
        Session::new("ctrl_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Trace, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Apex Car Control Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let net_params: NetParams =
        util::params::load("net.toml").wrap_err("Could not load net params")?;

    let exec_params: CtrlExecParams =
        util::params::load("ctrl_exec.toml").wrap_err("Could not load exec params")?;

    info!("Exec parameters loaded");

    // ---- INITIALISE DATASTORE ----

    info!("Initialising modules...");

    let mut ds = DataStore::default();

    // ---- INITIALISE MODULES ----

    ds.mpc_ctrl
        .init("mpc_ctrl.toml", &session)
        .wrap_err("Failed to initialise MpcCtrl")?;
    info!("MpcCtrl init complete");

    ds.act_mapper
        .init("act_mapper.toml", &session)
        .wrap_err("Failed to initialise ActMapper")?;
    info!("ActMapper init complete");

    info!("Module initialisation complete\n");

    // ---- INITIALISE NETWORK ----

    info!("Initialising network");

    let zmq_ctx = comms_if::net::zmq::Context::new();

    let est_client = EstClient::new(&zmq_ctx, &net_params)
        .wrap_err("Failed to initialise the EstClient")?;
    info!("EstClient initialised");

    let mut act_client = ActClient::new(&zmq_ctx, &net_params)
        .wrap_err("Failed to initialise the ActClient")?;
    info!("ActClient initialised");

    info!("Network initialisation complete");

    // ---- SIGNAL HANDLER ----

    ctrlc::set_handler(|| SHUTDOWN.store(true, Ordering::Relaxed))
        .wrap_err("Failed to set the shutdown signal handler")?;

    // ---- MAIN LOOP ----

    info!("Begining main loop\n");

    loop {
        // Get cycle start time
        let cycle_start_instant = Instant::now();

        // Exit cleanly between cycles, never mid-solve
        if SHUTDOWN.load(Ordering::Relaxed) {
            info!("Shutdown signal observed, stopping");
            break;
        }

        // Clear items that need wiping at the start of the cycle
        ds.cycle_start();

        // ---- DATA INPUT ----

        // Private copy of the freshest estimate. Estimates arriving after
        // this point are picked up on the next cycle.
        ds.mpc_ctrl_input.est = est_client.latest();

        // ---- CONTROL ALGORITHM PROCESSING ----

        // MpcCtrl processing
        match ds.mpc_ctrl.proc(&ds.mpc_ctrl_input) {
            Ok((o, r)) => {
                ds.mpc_ctrl_output = o;
                ds.mpc_ctrl_status_rpt = r;
                ds.solve_succeeded();
            }
            Err(e) => {
                // A failed solve is not fatal, the mapper falls back to the
                // safe command for this cycle
                warn!("Error during MpcCtrl processing: {}", e);
                ds.solve_failed(MAX_CONSEC_SOLVE_FAILURE_LIMIT);
            }
        };

        // ---- ACTUATOR MAPPING ----

        ds.act_mapper_input = act_mapper::InputData {
            safe_mode: ds.safe,
            control: ds.mpc_ctrl_output,
        };

        match ds.act_mapper.proc(&ds.act_mapper_input) {
            Ok((cmd, r)) => {
                ds.act_mapper_output = Some(cmd);
                ds.act_mapper_status_rpt = r;
            }
            Err(e) => warn!("Error during ActMapper processing: {}", e),
        };

        // ---- COMMAND OUTPUT ----

        if let Some(ref cmd) = ds.act_mapper_output {
            match act_client.send_cmd(cmd) {
                Ok(_) => (),
                Err(e) => warn!("Could not send actuator command: {}", e),
            }
        }

        // ---- CYCLE MANAGEMENT ----

        let cycle_dur = Instant::now() - cycle_start_instant;

        // Get sleep duration
        match Duration::from_secs_f64(exec_params.cycle_period_s).checked_sub(cycle_dur) {
            Some(d) => {
                ds.num_consec_cycle_overruns = 0;
                thread::sleep(d);
            }
            None => {
                warn!(
                    "Cycle overran by {:.06} s",
                    cycle_dur.as_secs_f64() - exec_params.cycle_period_s
                );
                ds.num_consec_cycle_overruns += 1;
            }
        }

        // Increment cycle counter
        ds.num_cycles += 1;
    }

    // ---- SHUTDOWN ----

    est_client.stop();

    info!("End of execution");

    Ok(())
}
