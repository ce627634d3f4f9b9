//! Error types for the IPC layer.

use std::io;
use thiserror::Error;

/// Result type for IPC operations.
pub type IpcResult<T> = Result<T, IpcError>;

/// Errors surfaced by the client facade.
///
/// `InvalidCommand` and `UnknownFile` are misuse, not transient conditions:
/// the facade kills the worker before returning them and every later call
/// fails with `Terminated`. Worker crashes never appear here; the
/// supervisor absorbs them by respawning.
#[derive(Error, Debug)]
pub enum IpcError {
    /// The command is outside the fixed set the worker supports.
    #[error("unknown command {0:?}; supported commands are autocomplete, replacements, highlight")]
    InvalidCommand(String),

    /// The operation referenced a file absent from the mirror.
    #[error("file {0:?} is not tracked; call update_file first")]
    UnknownFile(String),

    /// The client was terminated, explicitly or by a prior misuse, and
    /// cannot be reused.
    #[error("client has been terminated; construct a new one")]
    Terminated,

    /// The outstanding-id set grew too close to the id space bound for
    /// rejection sampling to stay cheap.
    #[error("identifier space exhausted: {outstanding} ids outstanding of {id_max}")]
    IdSpaceExhausted {
        /// Ids currently awaiting a response.
        outstanding: usize,
        /// Upper bound of the identifier space.
        id_max: u32,
    },

    /// Failed to spawn the worker process.
    #[error("failed to spawn worker process: {0}")]
    Spawn(#[source] io::Error),

    /// Failed to write a message to the worker.
    #[error("failed to write to worker: {0}")]
    Write(#[source] io::Error),

    /// Failed to serialize a message.
    #[error("failed to serialize message: {0}")]
    Serialize(#[source] serde_json::Error),
}

impl IpcError {
    /// Check if this error marks the client as permanently unusable.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::InvalidCommand(_) | Self::UnknownFile(_) | Self::Terminated
        )
    }
}
