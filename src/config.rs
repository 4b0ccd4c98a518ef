//! Relay configuration
//!
//! Loaded from YAML; every field has a default so an empty document is a
//! valid configuration.
//!
//! ```rust
//! use hdmi_relay::RelayConfig;
//!
//! let config = RelayConfig::from_yaml("aux_queue_capacity: 16\nsink_check:\n  edid_retries: 3\n")?;
//! assert_eq!(config.aux_queue_capacity, 16);
//! assert_eq!(config.sink_check.edid_retries, 3);
//! assert_eq!(config.sink_check.scdc_retries, 5);
//! # Ok::<(), hdmi_relay::RelayError>(())
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::types::VideoStreamParams;
use crate::{RelayError, Result};

/// Smallest relay queue that can hold one AVI, audio and vendor frame.
pub const MIN_AUX_QUEUE_CAPACITY: usize = 3;

/// Sink EDID/SCDC read policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SinkCheckConfig {
    pub edid_retries: u8,
    pub scdc_retries: u8,
    pub retry_interval_ms: u64,
}

impl Default for SinkCheckConfig {
    fn default() -> Self {
        Self { edid_retries: 5, scdc_retries: 5, retry_interval_ms: 25 }
    }
}

impl SinkCheckConfig {
    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub aux_queue_capacity: usize,
    pub sink_check: SinkCheckConfig,
    /// Time HPD is held low when the receive side is re-plugged.
    pub hpd_toggle_delay_ms: u64,
    /// Settle time after the receive clock multiplier is started.
    pub clock_settle_delay_ms: u64,
    /// Control loop poll period.
    pub poll_interval_ms: u64,
    /// Line rate above which the transmit reference is multiplied by four.
    pub hdmi20_line_rate_mbps: u64,
    /// Transmit clock-out is hard-wired on channel 4 and never gated.
    pub transmit_clock_on_channel4: bool,
    /// Stream driven when nothing is passed through.
    pub colorbar: VideoStreamParams,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            aux_queue_capacity: 10,
            sink_check: SinkCheckConfig::default(),
            hpd_toggle_delay_ms: 500,
            clock_settle_delay_ms: 10,
            poll_interval_ms: 1,
            hdmi20_line_rate_mbps: 3400,
            transmit_clock_on_channel4: false,
            colorbar: VideoStreamParams::colorbar_default(),
        }
    }
}

impl RelayConfig {
    /// Parse and validate a YAML document.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml).map_err(|e| RelayError::Parse {
            context: "relay configuration".to_string(),
            details: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| RelayError::file_error(path.to_path_buf(), e))?;
        Self::from_yaml(&yaml)
    }

    pub fn validate(&self) -> Result<()> {
        if self.aux_queue_capacity < MIN_AUX_QUEUE_CAPACITY {
            return Err(RelayError::config(format!(
                "aux_queue_capacity must be at least {}, got {}",
                MIN_AUX_QUEUE_CAPACITY, self.aux_queue_capacity
            )));
        }
        if self.sink_check.edid_retries == 0 || self.sink_check.scdc_retries == 0 {
            return Err(RelayError::config("sink_check read limits must allow at least one read"));
        }
        if self.poll_interval_ms == 0 {
            return Err(RelayError::config("poll_interval_ms must be non-zero"));
        }
        if self.hdmi20_line_rate_mbps == 0 {
            return Err(RelayError::config("hdmi20_line_rate_mbps must be non-zero"));
        }
        if self.colorbar.pixel_repetition == 0 {
            return Err(RelayError::config("colorbar pixel_repetition must be at least 1"));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Control loop rate, used to normalize status update rates.
    pub fn poll_hz(&self) -> f64 {
        1000.0 / self.poll_interval_ms.max(1) as f64
    }

    pub fn hpd_toggle_delay(&self) -> Duration {
        Duration::from_millis(self.hpd_toggle_delay_ms)
    }

    pub fn clock_settle_delay(&self) -> Duration {
        Duration::from_millis(self.clock_settle_delay_ms)
    }

    pub fn hdmi20_line_rate_bps(&self) -> u64 {
        self.hdmi20_line_rate_mbps * 1_000_000
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ColorFormat, VideoTiming};

    #[test]
    fn empty_document_yields_defaults() {
        let config = RelayConfig::from_yaml("{}").unwrap();
        assert_eq!(config, RelayConfig::default());
        assert_eq!(config.sink_check.retry_interval(), Duration::from_millis(25));
        assert_eq!(config.hdmi20_line_rate_bps(), 3_400_000_000);
    }

    #[test]
    fn colorbar_stream_is_configurable() {
        let yaml = r#"
colorbar:
  timing: { width: 1280, height: 720, frame_rate_hz: 60, interlaced: false }
  color_format: YCbCr444
  color_depth: Bpc8
  pixel_repetition: 1
  pixels_per_clock: Two
  is_3d: false
"#;
        let config = RelayConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.colorbar.timing, VideoTiming::progressive(1280, 720, 60));
        assert_eq!(config.colorbar.color_format, ColorFormat::YCbCr444);
    }

    #[test]
    fn undersized_queue_is_rejected() {
        let err = RelayConfig::from_yaml("aux_queue_capacity: 2").unwrap_err();
        assert!(matches!(err, RelayError::Config { .. }));
        assert!(!err.is_retryable());
    }

    #[test]
    fn zero_sink_read_limit_is_rejected() {
        let err = RelayConfig::from_yaml("sink_check:\n  edid_retries: 0\n").unwrap_err();
        assert!(matches!(err, RelayError::Config { .. }));
        let err = RelayConfig::from_yaml("sink_check:\n  scdc_retries: 0\n").unwrap_err();
        assert!(matches!(err, RelayError::Config { .. }));
        assert!(RelayConfig::from_yaml("sink_check:\n  edid_retries: 1\n").is_ok());
    }

    #[test]
    fn malformed_yaml_is_a_parse_error() {
        let err = RelayConfig::from_yaml("aux_queue_capacity: [").unwrap_err();
        assert!(matches!(err, RelayError::Parse { .. }));
    }

    #[test]
    fn missing_file_is_a_file_error() {
        let err = RelayConfig::load("/nonexistent/relay.yaml").unwrap_err();
        assert!(matches!(err, RelayError::File { .. }));
    }
}
