//! Receive endpoint and transceiver event handlers

use tracing::{debug, error, info, trace, warn};

use super::Link;
use crate::event::{ReceiveEvent, TransceiverEvent};
use crate::types::{
    AudioFormat, Direction, PacketKind, PllType, TransceiverChannel, TransceiverKind,
};

/// Channel whose PLL recovers the receive line rate.
pub(crate) fn rx_line_rate_channel(kind: TransceiverKind, pll: PllType) -> TransceiverChannel {
    match (kind, pll) {
        (TransceiverKind::Gtp, PllType::Pll0) => TransceiverChannel::Cmn0,
        (TransceiverKind::Gtp, _) => TransceiverChannel::Cmn1,
        (_, PllType::Cpll) => TransceiverChannel::Ch1,
        _ => TransceiverChannel::Cmn0,
    }
}

impl Link {
    pub(super) async fn on_receive(&mut self, event: ReceiveEvent) {
        match event {
            ReceiveEvent::Connect { connected } => self.on_receive_connect(connected),
            ReceiveEvent::Aux => self.on_receive_aux(),
            ReceiveEvent::Audio => self.on_receive_audio(),
            ReceiveEvent::LinkStatus => self.on_receive_link_status(),
            ReceiveEvent::StreamInit => self.on_receive_stream_init().await,
            ReceiveEvent::StreamUp => self.on_receive_stream_up(),
            ReceiveEvent::StreamDown => self.on_receive_stream_down(),
        }
    }

    fn on_receive_connect(&mut self, connected: bool) {
        self.state.receive_cable_connected = connected;
        if connected {
            self.hw.phy.set_input_buffer(Direction::Receive, true);
            info!("Receive cable connected");
            return;
        }

        info!("Receive cable disconnected");
        self.rx_tmds_clock_ratio = 0;
        if self.state.is_pass_through {
            self.state.is_pass_through = false;
            self.state.restart_after_receive_pending = false;
            self.state.restart_in_flight = false;
            self.queue.reset();
            self.hw.rx.set_video_bridge_reset(true);
            self.hw.tx.set_video_stream(self.config.colorbar);
            self.reset_infoframes();
            debug!("Pass-through torn down, reverting to colorbar");
        }
        self.state.transmit_busy = true;
        if self.state.transmit_cable_connected {
            self.hw.tx.start_stream();
        }
        self.hw.phy.set_input_buffer(Direction::Receive, false);
    }

    fn on_receive_aux(&mut self) {
        if !self.state.is_pass_through || !self.queue.is_accepting() {
            return;
        }
        let packet = self.hw.rx.get_auxiliary_packet();
        if packet.kind() == PacketKind::GeneralControl {
            return;
        }
        trace!("Queueing {:?} packet", packet.kind());
        self.queue.push(packet);
    }

    fn on_receive_audio(&mut self) {
        if !self.state.is_pass_through {
            return;
        }
        let channels = self.hw.rx.get_audio_channels();
        self.hw.tx.set_audio_channels(channels);

        let format = match self.hw.rx.get_audio_format() {
            AudioFormat::Unknown(code) => {
                warn!("Undefined audio format {:#04x}, using L-PCM", code);
                AudioFormat::Lpcm
            }
            known => known,
        };
        self.hw.tx.set_audio_format(format);
        debug!("Audio relayed: {} channels, {:?}", channels, format);
    }

    fn on_receive_link_status(&mut self) {
        if self.state.is_pass_through && self.hw.rx.is_link_error_max() && self.hw.phy.rx_pll_ready() {
            debug!("Receive link errors saturated, resetting clock detector");
            self.hw.phy.reset_rx_clock_detector();
        }
    }

    async fn on_receive_stream_init(&mut self) {
        let Some(stream) = self.hw.rx.get_video_stream() else {
            warn!("Receive stream init without decoded timing");
            return;
        };
        let depth = stream.transport_depth();
        if let Err(e) = self.hw.phy.configure_rx_mmcm(stream.pixels_per_clock, depth) {
            error!("Receive clock multiplier programming failed: {}", e);
            self.state.clock_fault_count += 1;
            return;
        }
        self.hw.phy.start_rx_mmcm();
        tokio::time::sleep(self.config.clock_settle_delay()).await;
        debug!("Receive clock ready for {} ({} bpc transport)", stream, depth.bits());
    }

    fn on_receive_stream_up(&mut self) {
        let Some(stream) = self.hw.rx.get_video_stream() else {
            warn!("Receive stream up without decoded timing");
            return;
        };
        self.hw.tx.set_video_stream(stream);
        self.hw.tx.set_video_id_code(self.hw.rx.get_video_id_code());

        let channel = rx_line_rate_channel(
            self.hw.phy.transceiver_kind(),
            self.hw.phy.pll_type(Direction::Receive),
        );
        let line_rate = self.hw.phy.line_rate_hz(channel);
        let rx_ref = self.hw.phy.rx_ref_clock_hz();
        if line_rate > self.config.hdmi20_line_rate_bps() {
            self.hw.phy.set_tx_ref_clock_hz(rx_ref * 4);
            self.tx_tmds_clock_ratio = 1;
            self.hw.tx.set_scrambling(true);
        } else {
            self.hw.phy.set_tx_ref_clock_hz(rx_ref);
            self.tx_tmds_clock_ratio = 0;
            self.hw.tx.set_scrambling(false);
        }
        self.hw.tx.set_tmds_clock_ratio(self.tx_tmds_clock_ratio);

        if let Err(e) =
            self.hw.phy.set_tx_params(stream.pixels_per_clock, stream.transport_depth(), stream.color_format)
        {
            error!("Transmit parameters rejected for {}: {}", stream, e);
            self.state.clock_fault_count += 1;
            return;
        }

        self.state.transmit_busy = true;
        self.hw.rx.set_video_bridge_reset(true);
        if self.state.transmit_cable_connected {
            self.state.restart_after_receive_pending = true;
        }
        self.state.is_pass_through = true;
        info!("Receive stream up: {} at {} Mbps", stream, line_rate / 1_000_000);
    }

    fn on_receive_stream_down(&mut self) {
        self.queue.reset();
        if self.state.is_pass_through {
            self.state.transmit_busy = true;
        }
        info!("Receive stream down");
    }

    pub(super) fn on_transceiver(&mut self, event: TransceiverEvent) {
        match event {
            TransceiverEvent::TxRefClockChanged => self.hw.tx.ref_clock_change_init(),
            TransceiverEvent::RxRefClockChanged => {
                self.hw.rx.ref_clock_change_init();
                self.rx_tmds_clock_ratio = self.hw.rx.tmds_clock_ratio();
                debug!("Receive reference clock changed, TMDS ratio {}", self.rx_tmds_clock_ratio);
            }
            TransceiverEvent::RxReady => {
                let channel = rx_line_rate_channel(
                    self.hw.phy.transceiver_kind(),
                    self.hw.phy.pll_type(Direction::Receive),
                );
                let line_rate_mhz = self.hw.phy.line_rate_hz(channel) / 1_000_000;
                let ref_clock = self.hw.phy.rx_ref_clock_hz();
                self.hw.rx.set_stream(ref_clock, line_rate_mhz);
                debug!("Receive PLL ready: ref {} Hz, {} Mbps", ref_clock, line_rate_mhz);
            }
            TransceiverEvent::Error => self.state.transceiver_error_pending = true,
        }
    }
}
