//! # Actuator Command Client
//!
//! Publishes the actuator commands produced by each control cycle. The
//! actuation board subscribes to this endpoint, the controller never waits
//! on it.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// Internal
use comms_if::{
    act::ActCmd,
    net::{zmq, MonitoredSocket, MonitoredSocketError, NetParams, SocketOptions},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Client publishing actuator commands to the actuation board.
pub struct ActClient {
    cmd_socket: MonitoredSocket,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors which can occur in the [`ActClient`]
#[derive(thiserror::Error, Debug)]
pub enum ActClientError {
    #[error("Socket error: {0}")]
    SocketError(#[from] MonitoredSocketError),

    #[error("Could not serialize the command: {0}")]
    SerializationError(serde_json::Error),

    #[error("Could not send the command: {0}")]
    SendError(zmq::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ActClient {
    /// Create a new instance of the actuator command client.
    pub fn new(ctx: &zmq::Context, params: &NetParams) -> Result<Self, ActClientError> {
        // Create the socket options. Publishers bind, and never wait for a
        // subscriber to be present.
        let socket_options = SocketOptions {
            bind: true,
            block_on_first_connect: false,
            send_timeout: 10,
            ..Default::default()
        };

        // Create the socket
        let cmd_socket = MonitoredSocket::new(ctx, zmq::PUB, socket_options, &params.act_endpoint)?;

        Ok(Self { cmd_socket })
    }

    /// Publish a command to the actuation board.
    pub fn send_cmd(&mut self, cmd: &ActCmd) -> Result<(), ActClientError> {
        // Serialize the command
        let cmd_str =
            serde_json::to_string(cmd).map_err(ActClientError::SerializationError)?;

        // Send the command
        match self.cmd_socket.send(&cmd_str, 0) {
            Ok(_) => Ok(()),
            Err(e) => Err(ActClientError::SendError(e)),
        }
    }
}
