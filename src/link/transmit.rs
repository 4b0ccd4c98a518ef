//! Transmit endpoint event handlers and metadata output

use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::Link;
use crate::event::TransmitEvent;
use crate::types::{
    AcrSource, AudioInfoFrame, AviInfoFrame, Direction, OutputMode, PacketKind, PllType,
    SampleRate, TestPattern, TransceiverChannel, VendorInfoFrame,
};

/// Channel whose PLL drives the transmit line rate.
pub(crate) fn tx_line_rate_channel(pll: PllType) -> TransceiverChannel {
    match pll {
        PllType::Cpll => TransceiverChannel::Ch1,
        PllType::Qpll | PllType::Qpll0 | PllType::Pll0 => TransceiverChannel::Cmn0,
        PllType::Qpll1 | PllType::Pll1 => TransceiverChannel::Cmn1,
    }
}

impl Link {
    pub(super) fn on_transmit(&mut self, event: TransmitEvent) {
        match event {
            TransmitEvent::Connect { connected } => self.on_transmit_connect(connected),
            TransmitEvent::Toggle => {
                debug!("Transmit HPD toggle, restarting stream");
                self.hw.tx.start_stream();
            }
            TransmitEvent::Vsync => self.on_transmit_vsync(),
            TransmitEvent::StreamUp => self.on_transmit_stream_up(),
            TransmitEvent::StreamDown => self.on_transmit_stream_down(),
        }
    }

    fn on_transmit_connect(&mut self, connected: bool) {
        self.state.transmit_cable_connected = connected;
        if !connected {
            info!("Transmit cable disconnected");
            if self.state.is_pass_through {
                self.queue.reset();
                self.state.restart_after_receive_pending = false;
                self.state.restart_in_flight = false;
                self.hw.rx.set_video_bridge_reset(true);
            }
            self.state.transmit_busy = true;
            self.state.is_stream_up = false;
            self.hw.phy.set_input_buffer(Direction::Transmit, false);
            self.sink.reset();
            self.state.sink_ready = false;
            return;
        }

        info!("Transmit cable connected");
        self.hw.phy.set_input_buffer(Direction::Transmit, true);
        if self.state.is_pass_through {
            self.state.restart_after_receive_pending = true;
        } else {
            self.hw.tx.start_stream();
        }
        let now = Instant::now();
        self.sink.begin_check(now);
        self.poll_sink(now);
    }

    fn on_transmit_stream_up(&mut self) {
        if self.state.is_pass_through && self.state.restart_after_receive_pending {
            debug!("Transmit stream up ignored, restart pending");
            return;
        }
        // Any stream-up resolves the restart, including the refusals below.
        self.state.restart_in_flight = false;

        let candidate = if self.state.is_pass_through {
            match self.hw.rx.get_video_stream() {
                Some(stream) => stream,
                None => {
                    warn!("Pass-through stream up without receive parameters");
                    return;
                }
            }
        } else {
            self.hw.tx.get_video_stream()
        };

        let mode = self.sink.output_mode();
        if mode == OutputMode::Dvi && !candidate.is_dvi_compatible() {
            warn!(
                "DVI sink cannot display {}; only 8-bit RGB is supported, stream not started",
                candidate
            );
            self.state.transmit_busy = true;
            return;
        }

        if self.state.is_pass_through {
            self.hw.tx.set_video_stream(candidate);
        }

        match mode {
            OutputMode::Dvi => {
                self.hw.tx.mute_audio(true);
                self.hw.tx.set_mode(OutputMode::Dvi);
            }
            OutputMode::Hdmi => {
                self.hw.tx.set_mode(OutputMode::Hdmi);
                self.hw.tx.mute_audio(false);
            }
        }

        if self.state.is_pass_through {
            self.infoframes.avi = self.hw.rx.get_avi_infoframe();
        }

        let channel = tx_line_rate_channel(self.hw.phy.pll_type(Direction::Transmit));
        self.state.transmit_line_rate = self.hw.phy.line_rate_hz(channel);
        if !self.state.is_pass_through {
            self.tx_tmds_clock_ratio =
                u8::from(self.state.transmit_line_rate > self.config.hdmi20_line_rate_bps());
        }

        self.hw.tx.set_sampling_rate(self.hw.phy.tx_sample_rate());
        self.hw.audio.set_tmds_clock_ratio(self.tx_tmds_clock_ratio);

        if self.state.is_pass_through {
            self.hw.audio.start(false);
            self.hw.audio.select_acr(AcrSource::Receive);
            self.hw.tx.set_audio_channels(self.hw.rx.get_audio_channels());
            self.hw.audio.set_audio_clock(SampleRate::Khz192);
        } else {
            self.infoframes.audio = AudioInfoFrame::default();
            self.hw.audio.start(true);
            self.hw.audio.select_acr(AcrSource::Generator);
            self.hw.audio.set_channels(2);
            self.hw.audio.set_pattern(1, TestPattern::Ping);
            self.hw.audio.set_pattern(2, TestPattern::Ping);
            self.hw.audio.set_sample_rate(self.hw.tx.tmds_clock_hz(), SampleRate::Khz48);
            self.hw.tx.set_audio_channels(2);
        }

        info!(
            "Transmit stream up ({}, {:?}): {} at {} Mbps",
            if self.state.is_pass_through { "pass-through" } else { "colorbar" },
            mode,
            candidate,
            self.state.transmit_line_rate / 1_000_000
        );

        self.state.transmit_busy = false;
        self.state.is_stream_up = true;
        if self.state.is_pass_through {
            self.hw.rx.set_video_bridge_reset(false);
        }
    }

    fn on_transmit_stream_down(&mut self) {
        self.state.transmit_busy = true;
        self.state.is_stream_up = false;
        if self.state.is_pass_through {
            self.queue.reset();
            self.hw.rx.set_video_bridge_reset(true);
        }
        self.state.restart_in_flight = false;
        info!("Transmit stream down");
    }

    fn on_transmit_vsync(&mut self) {
        if self.state.is_pass_through {
            self.queue.start_accepting();
        }
        if self.sink.output_mode() != OutputMode::Hdmi {
            return;
        }
        if self.state.is_pass_through {
            self.relay_queued_packets();
        } else {
            self.send_composed_infoframes();
        }
    }

    fn relay_queued_packets(&mut self) {
        let Link { queue, hw, infoframes, .. } = self;
        queue.drain_and_relay(|kind, packet| match kind {
            PacketKind::AviInfo => {
                let avi = AviInfoFrame::decode(packet)?;
                let mut stream = hw.tx.get_video_stream();
                if stream.color_format != avi.color_space {
                    info!(
                        "Color space changed: {} -> {}",
                        stream.color_format.as_str(),
                        avi.color_space.as_str()
                    );
                    stream.color_format = avi.color_space;
                    hw.tx.set_video_stream(stream);
                }
                infoframes.avi = avi;
                // Forwarded as received; the transmit stream now matches its Y field.
                hw.tx.send_auxiliary_packet(packet)
            }
            PacketKind::AudioInfo => {
                if let Ok(audio) = AudioInfoFrame::decode(packet) {
                    infoframes.audio = audio;
                }
                hw.tx.send_auxiliary_packet(packet)
            }
            PacketKind::VendorSpecificInfo => {
                if let Ok(vendor) = VendorInfoFrame::decode(packet) {
                    infoframes.vendor = vendor;
                }
                hw.tx.send_auxiliary_packet(packet)
            }
            _ => hw.tx.send_auxiliary_packet(packet),
        });
    }

    fn send_composed_infoframes(&mut self) {
        let stream = self.hw.tx.get_video_stream();
        self.infoframes.avi.color_space = stream.color_format;
        self.infoframes.avi.pixel_repetition = stream.pixel_repetition;
        self.infoframes.vendor = VendorInfoFrame::for_stream(&stream);

        let packets = [
            self.infoframes.avi.encode(),
            self.infoframes.audio.encode(),
            self.infoframes.vendor.encode(),
        ];
        for packet in &packets {
            if let Err(e) = self.hw.tx.send_auxiliary_packet(packet) {
                debug!("{:?} not sent this frame: {}", packet.kind(), e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transmit_channel_follows_pll() {
        assert_eq!(tx_line_rate_channel(PllType::Cpll), TransceiverChannel::Ch1);
        assert_eq!(tx_line_rate_channel(PllType::Qpll), TransceiverChannel::Cmn0);
        assert_eq!(tx_line_rate_channel(PllType::Pll0), TransceiverChannel::Cmn0);
        assert_eq!(tx_line_rate_channel(PllType::Qpll1), TransceiverChannel::Cmn1);
    }
}
