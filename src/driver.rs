//! Driver spawns and runs the link control task

use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use crate::event::Event;
use crate::link::Link;
use crate::status::LinkStatus;
use crate::types::OutputMode;
use crate::{RelayError, Result};

/// Operator commands executed on the control task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    ForceRestart,
    SetOutputMode(OutputMode),
    ToggleReceiveHpd,
    CloneSinkEdid,
}

/// Command plus the channel its result is reported on.
pub(crate) type CommandRequest = (Command, oneshot::Sender<Result<()>>);

/// Posts hardware events to the control task; cheap to clone and never blocks.
#[derive(Debug, Clone)]
pub struct EventSender {
    inner: mpsc::UnboundedSender<Event>,
}

impl EventSender {
    pub fn post(&self, event: impl Into<Event>) -> Result<()> {
        self.inner.send(event.into()).map_err(|_| RelayError::ChannelClosed)
    }
}

/// Result of spawning the control task
pub struct DriverChannels {
    /// Sender for hardware events
    pub events: EventSender,
    /// Sender for operator commands
    pub(crate) commands: mpsc::UnboundedSender<CommandRequest>,
    /// Latest link status
    pub status: watch::Receiver<Arc<LinkStatus>>,
    /// Cancellation token for graceful shutdown
    pub cancel: CancellationToken,
}

/// Driver owns the [`Link`] on a single task
///
/// Events, commands and the poll tick are serviced one at a time, so every
/// handler runs to completion before the next one starts.
pub struct Driver;

impl Driver {
    /// Spawn the control task for an already started link
    pub fn spawn(link: Link) -> DriverChannels {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(Arc::new(link.status()));
        let cancel = CancellationToken::new();

        let cancel_task = cancel.clone();
        tokio::spawn(async move {
            Self::control_task(link, event_rx, command_rx, status_tx, cancel_task).await;
        });

        DriverChannels {
            events: EventSender { inner: event_tx },
            commands: command_tx,
            status: status_rx,
            cancel,
        }
    }

    async fn control_task(
        mut link: Link,
        mut events: mpsc::UnboundedReceiver<Event>,
        mut commands: mpsc::UnboundedReceiver<CommandRequest>,
        status: watch::Sender<Arc<LinkStatus>>,
        cancel: CancellationToken,
    ) {
        info!("Link control task started");
        let mut ticker = tokio::time::interval(link.config().poll_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut event_count = 0u64;

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    info!("Link control task cancelled");
                    break;
                }
                // Polled ahead of events so interrupt bursts cannot starve it.
                _ = ticker.tick() => link.poll(Instant::now()),
                Some((command, reply)) = commands.recv() => {
                    debug!("Executing {:?}", command);
                    let result = link.execute(command).await;
                    let _ = reply.send(result);
                }
                event = events.recv() => match event {
                    Some(event) => {
                        event_count += 1;
                        trace!("Event {}: {:?}", event_count, event);
                        link.handle_event(event).await;
                    }
                    None => {
                        debug!("All event senders dropped, shutting down");
                        break;
                    }
                },
            }

            let snapshot = link.status();
            status.send_if_modified(|current| {
                if **current == snapshot {
                    false
                } else {
                    *current = Arc::new(snapshot);
                    true
                }
            });
        }

        info!("Link control task ended ({} events handled)", event_count);
    }
}
