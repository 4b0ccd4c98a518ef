//! Hardware collaborator traits
//!
//! The orchestration core drives the board only through these traits. Every
//! call is synchronous register access issued from the control task, so the
//! traits are plain `Send + 'static` objects rather than async.

use crate::Result;
use crate::error::ProbeError;
use crate::sink::SinkCapabilities;
use crate::types::{
    AcrSource, AudioFormat, AuxPacket, AviInfoFrame, ColorDepth, ColorFormat, Direction,
    OutputMode, PixelsPerClock, PllType, SampleRate, TestPattern, TransceiverChannel,
    TransceiverKind, VideoStreamParams,
};

/// Upstream (source-facing) receiver.
pub trait ReceiveEndpoint: Send + 'static {
    /// Decoded stream parameters, `None` until timing has been detected.
    fn get_video_stream(&self) -> Option<VideoStreamParams>;
    fn get_video_id_code(&self) -> u8;
    fn get_audio_channels(&self) -> u8;
    fn get_audio_format(&self) -> AudioFormat;
    /// Packet latched by the most recent `Aux` event.
    fn get_auxiliary_packet(&self) -> AuxPacket;
    /// AVI infoframe most recently received from the source.
    fn get_avi_infoframe(&self) -> AviInfoFrame;
    fn set_video_bridge_reset(&mut self, hold: bool);
    fn is_link_error_max(&self) -> bool;
    fn tmds_clock_ratio(&self) -> u8;
    fn ref_clock_change_init(&mut self);
    fn set_stream(&mut self, ref_clock_hz: u64, line_rate_mhz: u64);
    fn load_edid(&mut self, edid: &[u8]);
    /// Drive HPD high and enable the receiver core.
    fn start(&mut self);
    /// Drive HPD low and stop the receiver core.
    fn stop(&mut self);
}

/// Downstream (sink-facing) transmitter.
pub trait TransmitEndpoint: Send + 'static {
    fn get_video_stream(&self) -> VideoStreamParams;
    fn set_video_stream(&mut self, stream: VideoStreamParams);
    fn set_video_id_code(&mut self, vic: u8);
    fn set_tmds_clock_ratio(&mut self, ratio: u8);
    fn set_scrambling(&mut self, enable: bool);
    fn set_audio_channels(&mut self, channels: u8);
    fn set_audio_format(&mut self, format: AudioFormat);
    fn set_sampling_rate(&mut self, samples_per_clock: u8);
    /// Fails with [`crate::RelayError::HardwareBusy`] when the output FIFO is full.
    fn send_auxiliary_packet(&mut self, packet: &AuxPacket) -> Result<()>;
    fn set_mode(&mut self, mode: OutputMode);
    fn mute_audio(&mut self, mute: bool);
    /// (Re)start the transmit stream state machine; completion is reported
    /// by a later `StreamUp` event.
    fn start_stream(&mut self);
    fn tmds_clock_hz(&self) -> u64;
    fn ref_clock_change_init(&mut self);
}

/// Transceiver shared by both directions.
pub trait PhysicalTransceiver: Send + 'static {
    fn set_input_buffer(&mut self, direction: Direction, enable: bool);
    fn set_clock_out_buffer(&mut self, direction: Direction, enable: bool);
    fn transceiver_kind(&self) -> TransceiverKind;
    fn pll_type(&self, direction: Direction) -> PllType;
    fn line_rate_hz(&self, channel: TransceiverChannel) -> u64;
    /// Measured receive reference clock, 0 when no clock is present.
    fn rx_ref_clock_hz(&self) -> u64;
    fn tx_ref_clock_hz(&self) -> u64;
    fn set_tx_ref_clock_hz(&mut self, hz: u64);
    fn tx_sample_rate(&self) -> u8;
    /// Transmit and receive share a common synthesizer.
    fn is_bonded(&self) -> bool;
    fn configure_rx_mmcm(&mut self, ppc: PixelsPerClock, depth: ColorDepth) -> Result<()>;
    fn start_rx_mmcm(&mut self);
    fn power_down_rx_mmcm(&mut self);
    fn set_tx_params(&mut self, ppc: PixelsPerClock, depth: ColorDepth, format: ColorFormat) -> Result<()>;
    fn rx_pll_ready(&self) -> bool;
    fn reset_rx_clock_detector(&mut self);
    /// Program the TMDS retimer for the given transmit line rate.
    fn configure_retimer(&mut self, line_rate_hz: u64) -> Result<()>;
}

/// External clock generator feeding the transmit reference.
pub trait ExternalClockGenerator: Send + 'static {
    fn program_locked(&mut self, ref_hz: u64, out_hz: u64) -> Result<()>;
    fn program_free_running(&mut self, out_hz: u64) -> Result<()>;
    fn reinit_bonded(&mut self) -> Result<()>;
}

/// DDC access to the downstream sink.
pub trait SinkProbe: Send + 'static {
    /// Parse the capabilities advertised by the sink EDID.
    fn read_capabilities(&mut self) -> std::result::Result<SinkCapabilities, ProbeError>;
    /// Read the SCDC status registers; success means the sink answered.
    fn read_scdc(&mut self) -> std::result::Result<(), ProbeError>;
    fn read_edid(&mut self) -> std::result::Result<Vec<u8>, ProbeError>;
}

/// Local audio generator used when no source is passed through.
pub trait AudioGenerator: Send + 'static {
    fn start(&mut self, enable: bool);
    fn select_acr(&mut self, source: AcrSource);
    fn set_tmds_clock_ratio(&mut self, ratio: u8);
    fn set_channels(&mut self, channels: u8);
    fn set_pattern(&mut self, channel: u8, pattern: TestPattern);
    fn set_sample_rate(&mut self, tmds_clock_hz: u64, rate: SampleRate);
    fn set_audio_clock(&mut self, rate: SampleRate);
}

/// Every collaborator the link needs, owned by the control task.
pub struct Hardware {
    pub rx: Box<dyn ReceiveEndpoint>,
    pub tx: Box<dyn TransmitEndpoint>,
    pub phy: Box<dyn PhysicalTransceiver>,
    pub clock: Box<dyn ExternalClockGenerator>,
    pub sink: Box<dyn SinkProbe>,
    pub audio: Box<dyn AudioGenerator>,
}
