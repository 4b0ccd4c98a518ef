//! Warning bitfield raised while checking a sink's EDID and SCDC

use serde::{Deserialize, Serialize};
use std::fmt;

/// Sink warning flags.
pub mod sink_warning {
    /// EDID and SCDC disagree about HDMI 2.0 support.
    pub const EDID_SCDC_MISMATCH: u32 = 0x0001;
    /// EDID claims >340 MHz TMDS without an HF-VSDB, but SCDC answered.
    pub const EDID_20_VSDB20_NA_SCDC_PASS: u32 = 0x0002;
    /// EDID claims >340 MHz TMDS with an HF-VSDB, but SCDC did not answer.
    pub const EDID_20_VSDB20_ACC_SCDC_FAIL: u32 = 0x0004;
    /// EDID limits TMDS to 340 MHz, but SCDC answered.
    pub const EDID_14_SCDC_PASS: u32 = 0x0008;
    pub const NOT_20_CAPABLE: u32 = 0x0010;
    pub const DEEP_COLOR_10_NOT_SUPPORTED: u32 = 0x0020;
    pub const DEEP_COLOR_12_NOT_SUPPORTED: u32 = 0x0040;
    pub const DEEP_COLOR_16_NOT_SUPPORTED: u32 = 0x0080;
    pub const NOT_HDMI: u32 = 0x0100;
    /// Capability reads exhausted their retries; values are best-effort defaults.
    pub const READ_RETRIES_EXHAUSTED: u32 = 0x0200;
}

const NAMES: [(u32, &str); 10] = [
    (sink_warning::EDID_SCDC_MISMATCH, "edid/scdc mismatch"),
    (sink_warning::EDID_20_VSDB20_NA_SCDC_PASS, "hdmi2.0 edid without hf-vsdb, scdc pass"),
    (sink_warning::EDID_20_VSDB20_ACC_SCDC_FAIL, "hdmi2.0 edid with hf-vsdb, scdc fail"),
    (sink_warning::EDID_14_SCDC_PASS, "hdmi1.4 edid, scdc pass"),
    (sink_warning::NOT_20_CAPABLE, "not hdmi2.0 capable"),
    (sink_warning::DEEP_COLOR_10_NOT_SUPPORTED, "10bpc unsupported"),
    (sink_warning::DEEP_COLOR_12_NOT_SUPPORTED, "12bpc unsupported"),
    (sink_warning::DEEP_COLOR_16_NOT_SUPPORTED, "16bpc unsupported"),
    (sink_warning::NOT_HDMI, "not hdmi"),
    (sink_warning::READ_RETRIES_EXHAUSTED, "read retries exhausted"),
];

/// Set of [`sink_warning`] flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SinkWarnings(pub u32);

impl SinkWarnings {
    pub fn new(value: u32) -> Self {
        Self(value)
    }

    pub fn insert(&mut self, flag: u32) {
        self.0 |= flag;
    }

    pub fn contains(&self, flag: u32) -> bool {
        (self.0 & flag) == flag
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for SinkWarnings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        let mut first = true;
        for (flag, name) in NAMES {
            if self.contains(flag) {
                if !first {
                    f.write_str(", ")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}
