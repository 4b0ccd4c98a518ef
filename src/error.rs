//! Error types for link orchestration.
//!
//! Every fallible hardware or configuration operation returns a [`RelayError`].
//! Errors never cross a lifecycle handler: handlers log them and leave the link
//! in a degraded but consistent state. Only configuration failures are fatal,
//! and only at start-up.
//!
//! ## Error Categories
//!
//! - **Transient hardware busy**: the transmit auxiliary FIFO is full; retried on
//!   the next natural trigger (the next vsync), never in a loop.
//! - **Capability mismatch**: a DVI sink was offered deep color or a non-RGB stream.
//! - **Configuration**: invalid or unreadable configuration, aborts start-up.
//! - **Clock / transceiver programming**: logged, the link runs degraded until the
//!   next disconnect/reconnect cycle.
//! - **Probe**: sink EDID or SCDC reads failed.
//!
//! ```rust
//! use hdmi_relay::RelayError;
//!
//! let error = RelayError::hardware_busy("transmit aux fifo");
//! assert!(error.is_retryable());
//! for suggestion in error.recovery_suggestions() {
//!     println!("  - {}", suggestion);
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for relay operations.
pub type Result<T, E = RelayError> = std::result::Result<T, E>;

/// Failure reported by the sink probe while reading EDID or SCDC.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    /// The sink did not acknowledge the DDC transaction.
    #[error("sink did not acknowledge the DDC read")]
    Nack,

    /// The DDC transaction did not complete in time.
    #[error("DDC read timed out")]
    Timeout,

    /// The read completed but the contents could not be interpreted.
    #[error("sink data could not be parsed: {0}")]
    Parse(String),

    /// The DDC controller itself failed.
    #[error("DDC controller fault: {0}")]
    Hardware(String),
}

impl ProbeError {
    /// Hardware faults end the capability check; everything else is retried.
    pub fn is_hardware_fault(&self) -> bool {
        matches!(self, ProbeError::Hardware(_))
    }
}

/// Main error type for relay operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum RelayError {
    #[error("{resource} is busy")]
    HardwareBusy { resource: String },

    #[error("Sink capability mismatch: {reason}")]
    CapabilityMismatch { reason: String },

    #[error("Invalid configuration: {reason}")]
    Config { reason: String },

    #[error("Configuration file error: {path}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error in {context}: {details}")]
    Parse { context: String, details: String },

    #[error("Failed to program {device}: {reason}")]
    ClockProgramming { device: String, reason: String },

    #[error("Transceiver operation '{operation}' failed: {reason}")]
    Transceiver { operation: String, reason: String },

    #[error("Sink probe failed")]
    Probe(#[from] ProbeError),

    #[error("Malformed auxiliary packet: {reason}")]
    Packet { reason: String },

    #[error("No source device detected")]
    NoSource,

    #[error("Link control task is no longer running")]
    ChannelClosed,
}

impl RelayError {
    /// Returns whether this error is potentially recoverable through retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            RelayError::HardwareBusy { .. } => true,
            RelayError::Probe(err) => !err.is_hardware_fault(),
            RelayError::NoSource => true,
            RelayError::CapabilityMismatch { .. } => false,
            RelayError::Config { .. } => false,
            RelayError::File { .. } => false,
            RelayError::Parse { .. } => false,
            RelayError::ClockProgramming { .. } => false,
            RelayError::Transceiver { .. } => false,
            RelayError::Packet { .. } => false,
            RelayError::ChannelClosed => false,
        }
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            RelayError::HardwareBusy { .. } => {
                vec!["Wait for the next vsync to drain the FIFO", "Reduce auxiliary packet rate"]
            }
            RelayError::CapabilityMismatch { .. } => vec![
                "Use an 8-bit RGB source for DVI sinks",
                "Connect an HDMI-capable sink",
            ],
            RelayError::Config { .. } => vec![
                "Check aux_queue_capacity is at least 3",
                "Check retry counts and intervals are non-zero",
            ],
            RelayError::File { .. } => {
                vec!["Check the configuration file exists and is readable", "Check permissions"]
            }
            RelayError::Parse { .. } => {
                vec!["Check the configuration is valid YAML", "Remove unknown keys"]
            }
            RelayError::ClockProgramming { .. } => vec![
                "Reconnect the transmit cable to restart the link",
                "Check the clock generator I2C bus",
            ],
            RelayError::Transceiver { .. } => vec![
                "Reconnect the source to renegotiate the stream",
                "Check transceiver reference clocks",
            ],
            RelayError::Probe(_) => vec![
                "Reconnect the sink to re-read its capabilities",
                "Check the DDC lines of the transmit cable",
            ],
            RelayError::Packet { .. } => vec!["Packet was dropped; no action required"],
            RelayError::NoSource => vec!["Connect a source device to the receive port"],
            RelayError::ChannelClosed => vec!["Respawn the relay"],
        }
    }

    /// Helper constructor for transient busy errors.
    pub fn hardware_busy(resource: impl Into<String>) -> Self {
        RelayError::HardwareBusy { resource: resource.into() }
    }

    /// Helper constructor for capability mismatches.
    pub fn capability_mismatch(reason: impl Into<String>) -> Self {
        RelayError::CapabilityMismatch { reason: reason.into() }
    }

    /// Helper constructor for configuration errors.
    pub fn config(reason: impl Into<String>) -> Self {
        RelayError::Config { reason: reason.into() }
    }

    /// Helper constructor for file errors with path context.
    pub fn file_error(path: PathBuf, source: std::io::Error) -> Self {
        RelayError::File { path, source }
    }

    /// Helper constructor for clock generator failures.
    pub fn clock_programming(device: impl Into<String>, reason: impl Into<String>) -> Self {
        RelayError::ClockProgramming { device: device.into(), reason: reason.into() }
    }

    /// Helper constructor for transceiver failures.
    pub fn transceiver(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        RelayError::Transceiver { operation: operation.into(), reason: reason.into() }
    }

    /// Helper constructor for malformed packets.
    pub fn packet(reason: impl Into<String>) -> Self {
        RelayError::Packet { reason: reason.into() }
    }
}
