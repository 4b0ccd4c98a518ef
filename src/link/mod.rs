//! Link orchestration core
//!
//! [`Link`] owns every piece of mutable link state and the hardware
//! collaborators. Events are applied one at a time by [`Link::handle_event`];
//! [`Link::poll`] is the main-loop step that runs the deferred work the
//! handlers arm (the restart sequence and the one-shot clock enable).
//!
//! Handlers for each direction live in their own submodule:
//!
//! - `receive`: receive endpoint and transceiver events
//! - `transmit`: transmit endpoint events and metadata output
//! - `resync`: the restart-transmit-after-receive sequence

mod receive;
mod resync;
mod transmit;


use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::config::RelayConfig;
use crate::driver::Command;
use crate::event::Event;
use crate::hal::Hardware;
use crate::relay_queue::AuxQueue;
use crate::sink::{SinkCapabilityRecord, SinkCapabilityTracker, SinkState};
use crate::status::LinkStatus;
use crate::types::{
    AudioInfoFrame, AviInfoFrame, Direction, OutputMode, VendorInfoFrame,
};
use crate::Result;

/// Shared link flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkState {
    pub is_pass_through: bool,
    /// True whenever the transmitter has no valid stream.
    pub transmit_busy: bool,
    pub transmit_cable_connected: bool,
    pub receive_cable_connected: bool,
    /// Transmit stream-up confirmed; one-shot clock enable still to run.
    pub is_stream_up: bool,
    pub sink_ready: bool,
    pub restart_after_receive_pending: bool,
    /// Restart issued, waiting for the transmit stream-up that completes it.
    pub restart_in_flight: bool,
    pub transmit_line_rate: u64,
    pub transceiver_error_pending: bool,
    pub transceiver_error_count: u32,
    pub clock_fault_count: u32,
}

impl Default for LinkState {
    fn default() -> Self {
        Self {
            is_pass_through: false,
            transmit_busy: true,
            transmit_cable_connected: false,
            receive_cable_connected: false,
            is_stream_up: false,
            sink_ready: false,
            restart_after_receive_pending: false,
            restart_in_flight: false,
            transmit_line_rate: 0,
            transceiver_error_pending: false,
            transceiver_error_count: 0,
            clock_fault_count: 0,
        }
    }
}

/// Metadata templates used when composing transmit infoframes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct TxInfoFrames {
    pub avi: AviInfoFrame,
    pub audio: AudioInfoFrame,
    pub vendor: VendorInfoFrame,
}

pub struct Link {
    config: RelayConfig,
    hw: Hardware,
    state: LinkState,
    queue: AuxQueue,
    sink: SinkCapabilityTracker,
    infoframes: TxInfoFrames,
    rx_tmds_clock_ratio: u8,
    tx_tmds_clock_ratio: u8,
}

impl Link {
    /// Validates `config`; nothing is written to the hardware until [`Link::start`].
    pub fn new(hw: Hardware, config: RelayConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            queue: AuxQueue::new(config.aux_queue_capacity),
            sink: SinkCapabilityTracker::new(config.sink_check.clone()),
            config,
            hw,
            state: LinkState::default(),
            infoframes: TxInfoFrames::default(),
            rx_tmds_clock_ratio: 0,
            tx_tmds_clock_ratio: 0,
        })
    }

    /// Bring the board to its idle state: clock generator initialised,
    /// infoframe templates reset and the colorbar stream loaded.
    pub fn start(&mut self) {
        if let Err(e) = self.hw.clock.reinit_bonded() {
            error!("Clock generator initialisation failed: {}", e);
            self.state.clock_fault_count += 1;
        }
        self.reset_infoframes();
        self.hw.tx.set_video_stream(self.config.colorbar);
        info!("Link started, standalone stream {}", self.config.colorbar);
    }

    pub(crate) fn reset_infoframes(&mut self) {
        self.infoframes = TxInfoFrames::default();
        debug!("Transmit infoframe templates reset");
    }

    pub async fn handle_event(&mut self, event: Event) {
        match event {
            Event::Receive(event) => self.on_receive(event).await,
            Event::Transmit(event) => self.on_transmit(event),
            Event::Transceiver(event) => self.on_transceiver(event),
        }
    }

    /// One main-loop iteration.
    pub fn poll(&mut self, now: Instant) {
        self.poll_sink(now);

        if self.state.restart_after_receive_pending && self.state.sink_ready {
            self.start_transmit_after_receive();
        }

        if self.state.is_stream_up && self.state.sink_ready {
            self.state.is_stream_up = false;
            let line_rate = self.state.transmit_line_rate;
            if let Err(e) = self.hw.phy.configure_retimer(line_rate) {
                error!("Retimer programming failed at {} bps: {}", line_rate, e);
                self.state.clock_fault_count += 1;
            }
            self.hw.phy.set_clock_out_buffer(Direction::Transmit, true);
            debug!("Transmit clock enabled at {} bps", line_rate);
        }

        if self.state.transceiver_error_pending {
            self.state.transceiver_error_pending = false;
            self.state.transceiver_error_count += 1;
            error!("Transceiver error reported ({} total)", self.state.transceiver_error_count);
        }
    }

    pub(crate) fn poll_sink(&mut self, now: Instant) {
        if self.sink.poll(now, self.hw.sink.as_mut()) {
            self.state.sink_ready = self.sink.is_ready();
        }
    }

    /// Arm a pass-through restart. Ignored unless a receive stream is in
    /// pass-through and a sink is connected, or while a restart is already
    /// pending or running. Returns whether a restart was armed.
    pub fn force_restart(&mut self) -> bool {
        if !self.state.is_pass_through || !self.state.transmit_cable_connected {
            debug!("Restart ignored: no pass-through link");
            return false;
        }
        if self.state.restart_after_receive_pending || self.state.restart_in_flight {
            debug!("Restart ignored: already in progress");
            return false;
        }
        self.state.restart_after_receive_pending = true;
        info!("Pass-through restart requested");
        true
    }

    /// Drop and re-assert receive HPD so the source re-reads the EDID.
    pub async fn toggle_receive_hpd(&mut self) {
        self.hw.phy.power_down_rx_mmcm();
        self.hw.phy.set_clock_out_buffer(Direction::Receive, false);
        self.hw.phy.set_input_buffer(Direction::Receive, false);
        self.hw.rx.stop();
        debug!("Receive HPD low");

        tokio::time::sleep(self.config.hpd_toggle_delay()).await;

        self.hw.rx.start();
        self.hw.phy.set_input_buffer(Direction::Receive, true);
        debug!("Receive HPD high");
    }

    /// Present the connected sink's EDID to the upstream source.
    pub async fn clone_sink_edid(&mut self) -> Result<()> {
        let edid = self.hw.sink.read_edid()?;
        info!("Cloning {} byte sink EDID to receiver", edid.len());
        self.hw.rx.load_edid(&edid);
        self.toggle_receive_hpd().await;
        Ok(())
    }

    pub fn set_output_mode(&mut self, mode: OutputMode) {
        self.sink.set_output_mode(mode);
        self.hw.tx.set_mode(mode);
        self.hw.tx.mute_audio(mode == OutputMode::Dvi);
        info!("Output mode set to {:?}", mode);
    }

    pub async fn execute(&mut self, command: Command) -> Result<()> {
        match command {
            Command::ForceRestart => {
                self.force_restart();
            }
            Command::SetOutputMode(mode) => self.set_output_mode(mode),
            Command::ToggleReceiveHpd => self.toggle_receive_hpd().await,
            Command::CloneSinkEdid => {
                if let Err(e) = self.clone_sink_edid().await {
                    warn!("EDID clone failed: {}", e);
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    pub fn state(&self) -> &LinkState {
        &self.state
    }

    pub fn sink_state(&self) -> SinkState {
        self.sink.state()
    }

    pub fn sink_record(&self) -> &SinkCapabilityRecord {
        self.sink.record()
    }

    pub fn queue(&self) -> &AuxQueue {
        &self.queue
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    pub fn status(&self) -> LinkStatus {
        LinkStatus {
            is_pass_through: self.state.is_pass_through,
            transmit_busy: self.state.transmit_busy,
            transmit_cable_connected: self.state.transmit_cable_connected,
            receive_cable_connected: self.state.receive_cable_connected,
            restart_pending: self.state.restart_after_receive_pending,
            restart_in_flight: self.state.restart_in_flight,
            sink_state: self.sink.state(),
            sink: *self.sink.record(),
            receive_stream: self.hw.rx.get_video_stream(),
            transmit_stream: self.hw.tx.get_video_stream(),
            transmit_line_rate: self.state.transmit_line_rate,
            receive_tmds_clock_ratio: self.rx_tmds_clock_ratio,
            aux_pending: self.queue.len(),
            aux_overflow_count: self.queue.overflow_count(),
            aux_overflow_total: self.queue.total_overflow_count(),
            transceiver_error_count: self.state.transceiver_error_count,
            clock_fault_count: self.state.clock_fault_count,
        }
    }
}
