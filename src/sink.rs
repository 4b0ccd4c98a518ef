//! Downstream sink capability tracking
//!
//! A check starts when the transmit cable is connected. The EDID is read
//! first; HDMI sinks then have their SCDC registers probed to confirm
//! HDMI 2.0 support. Each stage retries at a fixed interval up to its
//! configured maximum, and the tracker only reports ready once a check has
//! finished.

use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::config::SinkCheckConfig;
use crate::hal::SinkProbe;
use crate::types::{OutputMode, SinkWarnings, sink_warning};

/// Highest TMDS character rate an HDMI 1.4 sink may advertise.
const HDMI14_MAX_TMDS_MHZ: u32 = 340;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SinkState {
    Unknown,
    Checking,
    Ready,
    Failed,
}

/// Capabilities parsed from the sink EDID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SinkCapabilities {
    /// HDMI vendor block present; DVI otherwise.
    pub is_hdmi: bool,
    pub max_tmds_clock_mhz: u32,
    /// HDMI Forum vendor-specific data block present.
    pub has_hf_vsdb: bool,
    pub supports_10bpc: bool,
    pub supports_12bpc: bool,
    pub supports_16bpc: bool,
}

impl SinkCapabilities {
    pub fn claims_hdmi20(&self) -> bool {
        self.max_tmds_clock_mhz > HDMI14_MAX_TMDS_MHZ
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SinkCapabilityRecord {
    pub output_mode: OutputMode,
    pub hdmi20_capable: bool,
    pub warnings: SinkWarnings,
    pub edid_retry: u8,
    pub scdc_retry: u8,
    /// No further automatic reads until the next connect.
    pub checked: bool,
}

impl Default for SinkCapabilityRecord {
    fn default() -> Self {
        Self {
            output_mode: OutputMode::Hdmi,
            hdmi20_capable: false,
            warnings: SinkWarnings::default(),
            edid_retry: 0,
            scdc_retry: 0,
            checked: false,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Stage {
    Edid,
    Scdc(SinkCapabilities),
}

#[derive(Debug)]
pub struct SinkCapabilityTracker {
    config: SinkCheckConfig,
    state: SinkState,
    record: SinkCapabilityRecord,
    stage: Stage,
    next_attempt: Option<Instant>,
}

impl SinkCapabilityTracker {
    pub fn new(config: SinkCheckConfig) -> Self {
        Self {
            config,
            state: SinkState::Unknown,
            record: SinkCapabilityRecord::default(),
            stage: Stage::Edid,
            next_attempt: None,
        }
    }

    pub fn state(&self) -> SinkState {
        self.state
    }

    pub fn record(&self) -> &SinkCapabilityRecord {
        &self.record
    }

    pub fn is_ready(&self) -> bool {
        self.state == SinkState::Ready
    }

    /// Signalling mode to use; HDMI until a check says otherwise.
    pub fn output_mode(&self) -> OutputMode {
        self.record.output_mode
    }

    /// Manual override from the operator.
    pub fn set_output_mode(&mut self, mode: OutputMode) {
        self.record.output_mode = mode;
    }

    /// Sink connected: forget the previous sink and start reading.
    pub fn begin_check(&mut self, now: Instant) {
        self.reset();
        self.state = SinkState::Checking;
        self.next_attempt = Some(now);
        debug!("Sink capability check started");
    }

    /// Sink disconnected.
    pub fn reset(&mut self) {
        self.state = SinkState::Unknown;
        self.record = SinkCapabilityRecord::default();
        self.stage = Stage::Edid;
        self.next_attempt = None;
    }

    /// Advance the check if a read is due. Returns true when the check
    /// finished during this call.
    pub fn poll(&mut self, now: Instant, probe: &mut dyn SinkProbe) -> bool {
        if self.state != SinkState::Checking {
            return false;
        }
        match self.next_attempt {
            Some(due) if now >= due => {}
            _ => return false,
        }

        if let Stage::Edid = self.stage {
            match probe.read_capabilities() {
                Ok(caps) => self.accept_edid(caps),
                Err(e) if e.is_hardware_fault() => return self.fail(&e.to_string()),
                Err(e) => {
                    if self.record.edid_retry < self.config.edid_retries {
                        self.record.edid_retry += 1;
                    }
                    debug!(
                        "Sink EDID read failed ({}/{}): {}",
                        self.record.edid_retry, self.config.edid_retries, e
                    );
                    if self.record.edid_retry >= self.config.edid_retries {
                        warn!("Sink EDID unreadable after {} attempts, assuming HDMI", self.record.edid_retry);
                        self.record.warnings.insert(sink_warning::READ_RETRIES_EXHAUSTED);
                        self.record.warnings.insert(sink_warning::NOT_20_CAPABLE);
                        return self.finish();
                    }
                    self.next_attempt = Some(now + self.config.retry_interval());
                    return false;
                }
            }
        }

        let Stage::Scdc(caps) = self.stage else {
            return self.finish();
        };
        match probe.read_scdc() {
            Ok(()) => {
                if caps.claims_hdmi20() {
                    self.record.hdmi20_capable = true;
                    if !caps.has_hf_vsdb {
                        self.record.warnings.insert(sink_warning::EDID_20_VSDB20_NA_SCDC_PASS);
                    }
                } else {
                    self.record.warnings.insert(sink_warning::EDID_14_SCDC_PASS);
                    self.record.warnings.insert(sink_warning::EDID_SCDC_MISMATCH);
                    self.record.warnings.insert(sink_warning::NOT_20_CAPABLE);
                }
                self.finish()
            }
            Err(e) if e.is_hardware_fault() => self.fail(&e.to_string()),
            Err(e) => {
                if !caps.claims_hdmi20() {
                    // An HDMI 1.4 sink is not expected to answer.
                    self.record.warnings.insert(sink_warning::NOT_20_CAPABLE);
                    return self.finish();
                }
                if self.record.scdc_retry < self.config.scdc_retries {
                    self.record.scdc_retry += 1;
                }
                debug!(
                    "Sink SCDC read failed ({}/{}): {}",
                    self.record.scdc_retry, self.config.scdc_retries, e
                );
                if self.record.scdc_retry >= self.config.scdc_retries {
                    if caps.has_hf_vsdb {
                        self.record.warnings.insert(sink_warning::EDID_20_VSDB20_ACC_SCDC_FAIL);
                    }
                    self.record.warnings.insert(sink_warning::EDID_SCDC_MISMATCH);
                    self.record.warnings.insert(sink_warning::NOT_20_CAPABLE);
                    return self.finish();
                }
                self.next_attempt = Some(now + self.config.retry_interval());
                false
            }
        }
    }

    fn accept_edid(&mut self, caps: SinkCapabilities) {
        if !caps.supports_10bpc {
            self.record.warnings.insert(sink_warning::DEEP_COLOR_10_NOT_SUPPORTED);
        }
        if !caps.supports_12bpc {
            self.record.warnings.insert(sink_warning::DEEP_COLOR_12_NOT_SUPPORTED);
        }
        if !caps.supports_16bpc {
            self.record.warnings.insert(sink_warning::DEEP_COLOR_16_NOT_SUPPORTED);
        }

        if caps.is_hdmi {
            self.record.output_mode = OutputMode::Hdmi;
            self.stage = Stage::Scdc(caps);
        } else {
            self.record.output_mode = OutputMode::Dvi;
            self.record.warnings.insert(sink_warning::NOT_HDMI);
            self.record.warnings.insert(sink_warning::NOT_20_CAPABLE);
        }
    }

    fn finish(&mut self) -> bool {
        self.state = SinkState::Ready;
        self.record.checked = true;
        self.next_attempt = None;
        info!(
            "Sink ready: {:?}, hdmi2.0={}, warnings: {}",
            self.record.output_mode, self.record.hdmi20_capable, self.record.warnings
        );
        true
    }

    fn fail(&mut self, reason: &str) -> bool {
        error!("Sink capability check failed: {}", reason);
        self.state = SinkState::Failed;
        self.record.checked = true;
        self.next_attempt = None;
        true
    }
}
