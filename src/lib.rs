//! HDMI pass-through link orchestration.
//!
//! Maintains a video/audio pass-through link between one HDMI receiver and
//! one HDMI transmitter that share a transceiver. Hardware interrupts are
//! turned into [`Event`]s and applied in order by a single control task,
//! which re-derives transmit parameters from the received stream, restarts
//! the transmitter against the recovered clock and relays in-band metadata
//! packets downstream.
//!
//! # Features
//!
//! - **Link lifecycle**: connect, stream-up and stream-down handling for both
//!   endpoints, with a standalone colorbar stream when no source is present
//! - **Clock resynchronisation**: locked, free-running or bonded reprogramming
//!   of the external clock generator
//! - **Metadata relay**: bounded AVI/audio/vendor infoframe queue with
//!   color-space propagation
//! - **Sink checks**: EDID/SCDC capability tracking with bounded retries
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use hdmi_relay::{HdmiRelay, RelayConfig, ReceiveEvent, UpdateRate};
//! use futures::StreamExt;
//!
//! #[tokio::main]
//! async fn main() -> hdmi_relay::Result<()> {
//!     let hardware = board::hardware(); // platform glue
//!     let relay = HdmiRelay::spawn(hardware, RelayConfig::load("relay.yaml")?)?;
//!
//!     // From interrupt glue:
//!     relay.events().post(ReceiveEvent::Connect { connected: true })?;
//!
//!     let mut updates = relay.status_updates(UpdateRate::Max(2));
//!     while let Some(status) = updates.next().await {
//!         println!("{}", status);
//!     }
//!     Ok(())
//! }
//! ```

// Core types and error handling
mod config;
mod error;
pub mod event;
pub mod hal;
#[cfg(test)]
mod test_utils;
pub mod types;

// Orchestration
pub mod driver;
mod handle;
pub mod link;
pub mod relay_queue;
pub mod sink;
mod status;
pub mod stream;

pub use config::{MIN_AUX_QUEUE_CAPACITY, RelayConfig, SinkCheckConfig};
pub use error::*;
pub use event::{Event, ReceiveEvent, TransceiverEvent, TransmitEvent};
pub use hal::Hardware;
pub use handle::RelayHandle;
pub use link::{Link, LinkState};
pub use status::LinkStatus;
pub use types::UpdateRate;

use tracing::info;

use crate::driver::Driver;

/// Entry point that brings up a relay on a set of hardware collaborators.
pub struct HdmiRelay;

impl HdmiRelay {
    /// Validate `config`, perform start-up and spawn the control task.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Config`] if the configuration is invalid; start-up
    /// is aborted and no hardware is touched.
    pub fn spawn(hardware: Hardware, config: RelayConfig) -> Result<RelayHandle> {
        let poll_hz = config.poll_hz();
        let mut link = Link::new(hardware, config)?;
        link.start();
        let channels = Driver::spawn(link);
        info!("HDMI relay running ({:.0} Hz poll)", poll_hz);
        Ok(RelayHandle::new(channels, poll_hz))
    }
}
