//! # State Estimate Client
//!
//! Subscribes to the state estimator's publications and keeps the freshest
//! estimate available to the control cycle. Estimates arrive asynchronously
//! on a listener thread, the control cycle polls [`EstClient::latest`] at
//! its own cadence.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use log::warn;
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    thread,
};

// Internal
use comms_if::{
    est::StateEstimate,
    net::{zmq, MonitoredSocket, MonitoredSocketError, NetParams, SocketOptions},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Single-slot mailbox holding the freshest state estimate.
///
/// The listener thread is the only writer, the control cycle is the only
/// reader and always takes its own copy. Older estimates are simply
/// overwritten, only the freshest value ever matters.
#[derive(Clone, Default)]
pub struct LatestState {
    slot: Arc<Mutex<Option<StateEstimate>>>,
}

/// Client receiving state estimates from the estimator.
pub struct EstClient {
    latest: LatestState,

    stop: Arc<AtomicBool>,

    join_handle: Option<thread::JoinHandle<()>>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors which can occur in the [`EstClient`]
#[derive(thiserror::Error, Debug)]
pub enum EstClientError {
    #[error("Socket error: {0}")]
    SocketError(#[from] MonitoredSocketError),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl LatestState {
    /// Replace the held estimate with a fresher one.
    pub fn set(&self, est: StateEstimate) {
        match self.slot.lock() {
            Ok(mut slot) => *slot = Some(est),
            Err(_) => warn!("Couldn't lock the latest state slot"),
        }
    }

    /// Take a copy of the freshest estimate, or `None` if nothing has
    /// arrived yet.
    pub fn get(&self) -> Option<StateEstimate> {
        self.slot.lock().ok().and_then(|slot| *slot)
    }
}

impl EstClient {
    /// Create a new instance of the state estimate client.
    ///
    /// Spawns the listener thread. The thread never blocks indefinitely, it
    /// polls the socket with a receive timeout so it can observe the stop
    /// flag.
    pub fn new(ctx: &zmq::Context, params: &NetParams) -> Result<Self, EstClientError> {
        // Create the socket options
        let socket_options = SocketOptions {
            block_on_first_connect: false,
            recv_timeout: 200,
            ..Default::default()
        };

        // Create the socket
        let socket = MonitoredSocket::new(ctx, zmq::SUB, socket_options, &params.est_endpoint)?;

        let latest = LatestState::default();
        let stop = Arc::new(AtomicBool::new(false));

        // Spawn the listener thread
        let latest_clone = latest.clone();
        let stop_clone = stop.clone();
        let join_handle = thread::spawn(move || est_listener(socket, latest_clone, stop_clone));

        Ok(Self {
            latest,
            stop,
            join_handle: Some(join_handle),
        })
    }

    /// Take a copy of the freshest estimate, or `None` if nothing has
    /// arrived yet.
    pub fn latest(&self) -> Option<StateEstimate> {
        self.latest.get()
    }

    /// Stop the listener thread and wait for it to exit.
    pub fn stop(mut self) {
        self.stop.store(true, Ordering::Relaxed);

        if let Some(handle) = self.join_handle.take() {
            handle.join().ok();
        }
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Listener thread body, runs until the stop flag is raised.
fn est_listener(socket: MonitoredSocket, latest: LatestState, stop: Arc<AtomicBool>) {
    while !stop.load(Ordering::Relaxed) {
        // Read from the socket, timing out regularly so the stop flag is
        // observed
        let msg = match socket.recv_msg(0) {
            Ok(m) => m,
            Err(_) => continue,
        };

        match serde_json::from_str::<StateEstimate>(msg.as_str().unwrap_or("")) {
            Ok(est) => latest.set(est),
            Err(e) => warn!("Could not deserialize state estimate: {}", e),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
