//! Handle to a running relay

use futures::{Stream, StreamExt};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::driver::{Command, CommandRequest, DriverChannels, EventSender};
use crate::status::LinkStatus;
use crate::stream::ThrottleExt;
use crate::types::{OutputMode, UpdateRate};
use crate::{RelayError, Result};

/// Handle to the control task
///
/// Hardware interrupt glue posts events through [`RelayHandle::events`];
/// the operator surface uses the query and command methods. Dropping the
/// handle stops the control task.
pub struct RelayHandle {
    events: EventSender,
    commands: mpsc::UnboundedSender<CommandRequest>,
    status: watch::Receiver<Arc<LinkStatus>>,
    poll_hz: f64,
    cancel: CancellationToken,
}

impl RelayHandle {
    pub(crate) fn new(channels: DriverChannels, poll_hz: f64) -> Self {
        Self {
            events: channels.events,
            commands: channels.commands,
            status: channels.status,
            poll_hz,
            cancel: channels.cancel,
        }
    }

    /// Sender for hardware events
    pub fn events(&self) -> EventSender {
        self.events.clone()
    }

    /// Latest published status
    pub fn status(&self) -> Arc<LinkStatus> {
        self.status.borrow().clone()
    }

    pub fn is_pass_through(&self) -> bool {
        self.status.borrow().is_pass_through
    }

    pub fn transmit_busy(&self) -> bool {
        self.status.borrow().transmit_busy
    }

    /// Restart pass-through; a no-op while a restart is already under way.
    pub async fn force_restart(&self) -> Result<()> {
        self.execute(Command::ForceRestart).await
    }

    pub async fn set_output_mode(&self, mode: OutputMode) -> Result<()> {
        self.execute(Command::SetOutputMode(mode)).await
    }

    pub async fn toggle_receive_hpd(&self) -> Result<()> {
        self.execute(Command::ToggleReceiveHpd).await
    }

    pub async fn clone_sink_edid(&self) -> Result<()> {
        self.execute(Command::CloneSinkEdid).await
    }

    async fn execute(&self, command: Command) -> Result<()> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands.send((command, reply_tx)).map_err(|_| RelayError::ChannelClosed)?;
        reply_rx.await.map_err(|_| RelayError::ChannelClosed)?
    }

    /// Status snapshots as they change
    ///
    /// Yields the current status immediately, then every change, limited to
    /// `rate` with latest-wins semantics.
    pub fn status_updates(&self, rate: UpdateRate) -> impl Stream<Item = Arc<LinkStatus>> + 'static {
        let updates = WatchStream::new(self.status.clone());
        match rate.throttle_interval(self.poll_hz) {
            None => updates.boxed(),
            Some(interval) => updates.throttle(interval).boxed(),
        }
    }
}

impl Drop for RelayHandle {
    fn drop(&mut self) {
        debug!("Dropping relay handle");
        self.cancel.cancel();
    }
}
