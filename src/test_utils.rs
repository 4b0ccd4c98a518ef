//! Test utilities: a scriptable mock board
//!
//! [`MockBoard`] implements every hardware trait over one shared state and
//! records each call, in order, so tests can assert on the exact sequence of
//! hardware operations a handler issued.

#![cfg(test)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::ProbeError;
use crate::hal::{
    AudioGenerator, ExternalClockGenerator, Hardware, PhysicalTransceiver, ReceiveEndpoint,
    SinkProbe, TransmitEndpoint,
};
use crate::sink::SinkCapabilities;
use crate::types::{
    AcrSource, AudioFormat, AuxPacket, AviInfoFrame, ColorDepth, ColorFormat, Direction,
    OutputMode, PixelsPerClock, PllType, SampleRate, TestPattern, TransceiverChannel,
    TransceiverKind, VideoStreamParams,
};
use crate::{RelayError, Result};

/// Install a fmt subscriber honouring `RUST_LOG`; repeated calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// One recorded hardware operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    RxBridgeReset(bool),
    RxRefClockInit,
    RxSetStream { ref_clock_hz: u64, line_rate_mhz: u64 },
    RxLoadEdid(usize),
    RxStart,
    RxStop,
    TxSetVideoStream(VideoStreamParams),
    TxSetVideoIdCode(u8),
    TxTmdsClockRatio(u8),
    TxScrambling(bool),
    TxAudioChannels(u8),
    TxAudioFormat(AudioFormat),
    TxSamplingRate(u8),
    TxSendAux(u8),
    TxSetMode(OutputMode),
    TxMuteAudio(bool),
    TxStartStream,
    TxRefClockInit,
    PhyInputBuffer(Direction, bool),
    PhyClockOutBuffer(Direction, bool),
    PhySetTxRefClock(u64),
    PhyConfigureRxMmcm(PixelsPerClock, ColorDepth),
    PhyStartRxMmcm,
    PhyPowerDownRxMmcm,
    PhySetTxParams(PixelsPerClock, ColorDepth, ColorFormat),
    PhyResetClockDetector,
    PhyConfigureRetimer(u64),
    ClockLocked { ref_hz: u64, out_hz: u64 },
    ClockFreeRunning(u64),
    ClockBonded,
    SinkReadCapabilities,
    SinkReadScdc,
    SinkReadEdid,
    AudioStart(bool),
    AudioSelectAcr(AcrSource),
    AudioTmdsClockRatio(u8),
    AudioChannels(u8),
    AudioPattern(u8, TestPattern),
    AudioSampleRate(u64, SampleRate),
    AudioClock(SampleRate),
}

pub const HDMI14_SINK: SinkCapabilities = SinkCapabilities {
    is_hdmi: true,
    max_tmds_clock_mhz: 297,
    has_hf_vsdb: false,
    supports_10bpc: true,
    supports_12bpc: true,
    supports_16bpc: false,
};

pub const DVI_SINK: SinkCapabilities = SinkCapabilities { is_hdmi: false, ..HDMI14_SINK };

/// Everything the mock hardware reports, plus the call log.
#[derive(Debug)]
pub struct BoardState {
    pub rx_stream: Option<VideoStreamParams>,
    pub rx_vic: u8,
    pub rx_audio_channels: u8,
    pub rx_audio_format: AudioFormat,
    pub rx_aux: AuxPacket,
    pub rx_avi: AviInfoFrame,
    pub rx_link_error_max: bool,
    pub rx_tmds_clock_ratio: u8,
    pub tx_stream: VideoStreamParams,
    pub tx_fifo_full: bool,
    pub sent_aux: Vec<AuxPacket>,
    pub tmds_clock_hz: u64,
    pub kind: TransceiverKind,
    pub rx_pll: PllType,
    pub tx_pll: PllType,
    pub line_rate_hz: u64,
    pub rx_ref_clock_hz: u64,
    pub tx_ref_clock_hz: u64,
    pub tx_sample_rate: u8,
    pub bonded: bool,
    pub rx_pll_ready: bool,
    pub mmcm_fails: bool,
    pub clock_fails: bool,
    /// Consumed one per read; `sink_default` once empty.
    pub sink_script: VecDeque<std::result::Result<SinkCapabilities, ProbeError>>,
    pub sink_default: std::result::Result<SinkCapabilities, ProbeError>,
    pub scdc: std::result::Result<(), ProbeError>,
    pub edid: std::result::Result<Vec<u8>, ProbeError>,
    pub calls: Vec<Call>,
}

impl Default for BoardState {
    fn default() -> Self {
        Self {
            rx_stream: None,
            rx_vic: 16,
            rx_audio_channels: 2,
            rx_audio_format: AudioFormat::Lpcm,
            rx_aux: AuxPacket::default(),
            rx_avi: AviInfoFrame::default(),
            rx_link_error_max: false,
            rx_tmds_clock_ratio: 0,
            tx_stream: VideoStreamParams::colorbar_default(),
            tx_fifo_full: false,
            sent_aux: Vec::new(),
            tmds_clock_hz: 148_500_000,
            kind: TransceiverKind::Gth,
            rx_pll: PllType::Cpll,
            tx_pll: PllType::Qpll0,
            line_rate_hz: 1_485_000_000,
            rx_ref_clock_hz: 148_500_000,
            tx_ref_clock_hz: 148_500_000,
            tx_sample_rate: 1,
            bonded: false,
            rx_pll_ready: true,
            mmcm_fails: false,
            clock_fails: false,
            sink_script: VecDeque::new(),
            sink_default: Ok(HDMI14_SINK),
            scdc: Err(ProbeError::Nack),
            edid: Ok(vec![0; 256]),
            calls: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MockBoard(Arc<Mutex<BoardState>>);

impl MockBoard {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BoardState> {
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&self, call: Call) {
        self.lock().calls.push(call);
    }

    /// Hand out every collaborator, all backed by this board.
    pub fn hardware(&self) -> Hardware {
        Hardware {
            rx: Box::new(self.clone()),
            tx: Box::new(self.clone()),
            phy: Box::new(self.clone()),
            clock: Box::new(self.clone()),
            sink: Box::new(self.clone()),
            audio: Box::new(self.clone()),
        }
    }

    /// Inspect or script the board state.
    pub fn with<R>(&self, f: impl FnOnce(&mut BoardState) -> R) -> R {
        f(&mut self.lock())
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.lock().calls.iter().filter(|call| predicate(call)).count()
    }

    pub fn position(&self, call: &Call) -> Option<usize> {
        self.lock().calls.iter().position(|c| c == call)
    }
}

impl ReceiveEndpoint for MockBoard {
    fn get_video_stream(&self) -> Option<VideoStreamParams> {
        self.lock().rx_stream
    }

    fn get_video_id_code(&self) -> u8 {
        self.lock().rx_vic
    }

    fn get_audio_channels(&self) -> u8 {
        self.lock().rx_audio_channels
    }

    fn get_audio_format(&self) -> AudioFormat {
        self.lock().rx_audio_format
    }

    fn get_auxiliary_packet(&self) -> AuxPacket {
        self.lock().rx_aux
    }

    fn get_avi_infoframe(&self) -> AviInfoFrame {
        self.lock().rx_avi
    }

    fn set_video_bridge_reset(&mut self, hold: bool) {
        self.record(Call::RxBridgeReset(hold));
    }

    fn is_link_error_max(&self) -> bool {
        self.lock().rx_link_error_max
    }

    fn tmds_clock_ratio(&self) -> u8 {
        self.lock().rx_tmds_clock_ratio
    }

    fn ref_clock_change_init(&mut self) {
        self.record(Call::RxRefClockInit);
    }

    fn set_stream(&mut self, ref_clock_hz: u64, line_rate_mhz: u64) {
        self.record(Call::RxSetStream { ref_clock_hz, line_rate_mhz });
    }

    fn load_edid(&mut self, edid: &[u8]) {
        self.record(Call::RxLoadEdid(edid.len()));
    }

    fn start(&mut self) {
        self.record(Call::RxStart);
    }

    fn stop(&mut self) {
        self.record(Call::RxStop);
    }
}

impl TransmitEndpoint for MockBoard {
    fn get_video_stream(&self) -> VideoStreamParams {
        self.lock().tx_stream
    }

    fn set_video_stream(&mut self, stream: VideoStreamParams) {
        let mut state = self.lock();
        state.tx_stream = stream;
        state.calls.push(Call::TxSetVideoStream(stream));
    }

    fn set_video_id_code(&mut self, vic: u8) {
        self.record(Call::TxSetVideoIdCode(vic));
    }

    fn set_tmds_clock_ratio(&mut self, ratio: u8) {
        self.record(Call::TxTmdsClockRatio(ratio));
    }

    fn set_scrambling(&mut self, enable: bool) {
        self.record(Call::TxScrambling(enable));
    }

    fn set_audio_channels(&mut self, channels: u8) {
        self.record(Call::TxAudioChannels(channels));
    }

    fn set_audio_format(&mut self, format: AudioFormat) {
        self.record(Call::TxAudioFormat(format));
    }

    fn set_sampling_rate(&mut self, samples_per_clock: u8) {
        self.record(Call::TxSamplingRate(samples_per_clock));
    }

    fn send_auxiliary_packet(&mut self, packet: &AuxPacket) -> Result<()> {
        let mut state = self.lock();
        state.calls.push(Call::TxSendAux(packet.type_byte()));
        if state.tx_fifo_full {
            return Err(RelayError::hardware_busy("transmit aux fifo"));
        }
        state.sent_aux.push(*packet);
        Ok(())
    }

    fn set_mode(&mut self, mode: OutputMode) {
        self.record(Call::TxSetMode(mode));
    }

    fn mute_audio(&mut self, mute: bool) {
        self.record(Call::TxMuteAudio(mute));
    }

    fn start_stream(&mut self) {
        self.record(Call::TxStartStream);
    }

    fn tmds_clock_hz(&self) -> u64 {
        self.lock().tmds_clock_hz
    }

    fn ref_clock_change_init(&mut self) {
        self.record(Call::TxRefClockInit);
    }
}

impl PhysicalTransceiver for MockBoard {
    fn set_input_buffer(&mut self, direction: Direction, enable: bool) {
        self.record(Call::PhyInputBuffer(direction, enable));
    }

    fn set_clock_out_buffer(&mut self, direction: Direction, enable: bool) {
        self.record(Call::PhyClockOutBuffer(direction, enable));
    }

    fn transceiver_kind(&self) -> TransceiverKind {
        self.lock().kind
    }

    fn pll_type(&self, direction: Direction) -> PllType {
        let state = self.lock();
        match direction {
            Direction::Receive => state.rx_pll,
            Direction::Transmit => state.tx_pll,
        }
    }

    fn line_rate_hz(&self, _channel: TransceiverChannel) -> u64 {
        self.lock().line_rate_hz
    }

    fn rx_ref_clock_hz(&self) -> u64 {
        self.lock().rx_ref_clock_hz
    }

    fn tx_ref_clock_hz(&self) -> u64 {
        self.lock().tx_ref_clock_hz
    }

    fn set_tx_ref_clock_hz(&mut self, hz: u64) {
        let mut state = self.lock();
        state.tx_ref_clock_hz = hz;
        state.calls.push(Call::PhySetTxRefClock(hz));
    }

    fn tx_sample_rate(&self) -> u8 {
        self.lock().tx_sample_rate
    }

    fn is_bonded(&self) -> bool {
        self.lock().bonded
    }

    fn configure_rx_mmcm(&mut self, ppc: PixelsPerClock, depth: ColorDepth) -> Result<()> {
        let mut state = self.lock();
        state.calls.push(Call::PhyConfigureRxMmcm(ppc, depth));
        if state.mmcm_fails {
            return Err(RelayError::transceiver("configure rx mmcm", "no valid divider"));
        }
        Ok(())
    }

    fn start_rx_mmcm(&mut self) {
        self.record(Call::PhyStartRxMmcm);
    }

    fn power_down_rx_mmcm(&mut self) {
        self.record(Call::PhyPowerDownRxMmcm);
    }

    fn set_tx_params(&mut self, ppc: PixelsPerClock, depth: ColorDepth, format: ColorFormat) -> Result<()> {
        self.record(Call::PhySetTxParams(ppc, depth, format));
        Ok(())
    }

    fn rx_pll_ready(&self) -> bool {
        self.lock().rx_pll_ready
    }

    fn reset_rx_clock_detector(&mut self) {
        self.record(Call::PhyResetClockDetector);
    }

    fn configure_retimer(&mut self, line_rate_hz: u64) -> Result<()> {
        self.record(Call::PhyConfigureRetimer(line_rate_hz));
        Ok(())
    }
}

impl MockBoard {
    fn clock_result(&self, call: Call) -> Result<()> {
        let mut state = self.lock();
        state.calls.push(call);
        if state.clock_fails {
            return Err(RelayError::clock_programming("si5324", "i2c nack"));
        }
        Ok(())
    }
}

impl ExternalClockGenerator for MockBoard {
    fn program_locked(&mut self, ref_hz: u64, out_hz: u64) -> Result<()> {
        self.clock_result(Call::ClockLocked { ref_hz, out_hz })
    }

    fn program_free_running(&mut self, out_hz: u64) -> Result<()> {
        self.clock_result(Call::ClockFreeRunning(out_hz))
    }

    fn reinit_bonded(&mut self) -> Result<()> {
        self.clock_result(Call::ClockBonded)
    }
}

impl SinkProbe for MockBoard {
    fn read_capabilities(&mut self) -> std::result::Result<SinkCapabilities, ProbeError> {
        let mut state = self.lock();
        state.calls.push(Call::SinkReadCapabilities);
        match state.sink_script.pop_front() {
            Some(result) => result,
            None => state.sink_default.clone(),
        }
    }

    fn read_scdc(&mut self) -> std::result::Result<(), ProbeError> {
        let mut state = self.lock();
        state.calls.push(Call::SinkReadScdc);
        state.scdc.clone()
    }

    fn read_edid(&mut self) -> std::result::Result<Vec<u8>, ProbeError> {
        let mut state = self.lock();
        state.calls.push(Call::SinkReadEdid);
        state.edid.clone()
    }
}

impl AudioGenerator for MockBoard {
    fn start(&mut self, enable: bool) {
        self.record(Call::AudioStart(enable));
    }

    fn select_acr(&mut self, source: AcrSource) {
        self.record(Call::AudioSelectAcr(source));
    }

    fn set_tmds_clock_ratio(&mut self, ratio: u8) {
        self.record(Call::AudioTmdsClockRatio(ratio));
    }

    fn set_channels(&mut self, channels: u8) {
        self.record(Call::AudioChannels(channels));
    }

    fn set_pattern(&mut self, channel: u8, pattern: TestPattern) {
        self.record(Call::AudioPattern(channel, pattern));
    }

    fn set_sample_rate(&mut self, tmds_clock_hz: u64, rate: SampleRate) {
        self.record(Call::AudioSampleRate(tmds_clock_hz, rate));
    }

    fn set_audio_clock(&mut self, rate: SampleRate) {
        self.record(Call::AudioClock(rate));
    }
}
