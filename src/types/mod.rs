//! Value types shared by the receive and transmit endpoints.
//!
//! Video stream parameters are plain `Copy` values. The receive-side copy and
//! the transmit-side copy are always distinct values; pass-through copies the
//! receive parameters into the transmit endpoint at the moment the transmit
//! stream is (re)started, it never shares them.
//!
//! ## Usage Example
//!
//! ```rust
//! use hdmi_relay::types::{ColorDepth, ColorFormat, VideoStreamParams};
//!
//! let mut stream = VideoStreamParams::colorbar_default();
//! assert!(stream.is_dvi_compatible());
//!
//! stream.color_format = ColorFormat::YCbCr422;
//! stream.color_depth = ColorDepth::Bpc12;
//! // 4:2:2 is carried in 8-bit containers on the wire.
//! assert_eq!(stream.transport_depth(), ColorDepth::Bpc8);
//! ```

mod aux_packet;
mod infoframe;
mod sink_flags;
mod update_rate;

pub use aux_packet::{AUX_DATA_LEN, AUX_HEADER_LEN, AuxPacket, PacketKind, packet_type};
pub use infoframe::{AudioInfoFrame, AviInfoFrame, PictureAspect, VendorInfoFrame, VsifFormat};
pub use sink_flags::{SinkWarnings, sink_warning};
pub use update_rate::UpdateRate;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which side of the transceiver an operation applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Receive,
    Transmit,
}

/// Pixel encoding of a video stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColorFormat {
    Rgb,
    YCbCr444,
    YCbCr422,
    YCbCr420,
}

impl ColorFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            ColorFormat::Rgb => "RGB",
            ColorFormat::YCbCr444 => "YUV 4:4:4",
            ColorFormat::YCbCr422 => "YUV 4:2:2",
            ColorFormat::YCbCr420 => "YUV 4:2:0",
        }
    }
}

/// Bits per color component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColorDepth {
    Bpc8,
    Bpc10,
    Bpc12,
    Bpc16,
}

impl ColorDepth {
    pub fn bits(self) -> u8 {
        match self {
            ColorDepth::Bpc8 => 8,
            ColorDepth::Bpc10 => 10,
            ColorDepth::Bpc12 => 12,
            ColorDepth::Bpc16 => 16,
        }
    }
}

/// Number of pixels moved per video clock cycle by the fabric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PixelsPerClock {
    One,
    Two,
    Four,
}

impl PixelsPerClock {
    pub fn count(self) -> u8 {
        match self {
            PixelsPerClock::One => 1,
            PixelsPerClock::Two => 2,
            PixelsPerClock::Four => 4,
        }
    }
}

/// Active resolution and refresh of a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VideoTiming {
    pub width: u16,
    pub height: u16,
    pub frame_rate_hz: u16,
    pub interlaced: bool,
}

impl VideoTiming {
    pub const fn progressive(width: u16, height: u16, frame_rate_hz: u16) -> Self {
        Self { width, height, frame_rate_hz, interlaced: false }
    }
}

/// Video stream parameters as decoded by the receiver or programmed into the
/// transmitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VideoStreamParams {
    pub timing: VideoTiming,
    pub color_format: ColorFormat,
    pub color_depth: ColorDepth,
    /// Pixel replication factor (1 = none, 2 for 480i/576i, ...).
    pub pixel_repetition: u8,
    pub pixels_per_clock: PixelsPerClock,
    pub is_3d: bool,
}

impl VideoStreamParams {
    /// 1080p60 RGB 8bpc, the stream driven when no source is passed through.
    pub const fn colorbar_default() -> Self {
        Self {
            timing: VideoTiming::progressive(1920, 1080, 60),
            color_format: ColorFormat::Rgb,
            color_depth: ColorDepth::Bpc8,
            pixel_repetition: 1,
            pixels_per_clock: PixelsPerClock::Two,
            is_3d: false,
        }
    }

    /// DVI only carries 8-bit RGB.
    pub fn is_dvi_compatible(&self) -> bool {
        self.color_depth == ColorDepth::Bpc8 && self.color_format == ColorFormat::Rgb
    }

    /// Depth used for clock synthesis: 4:2:2 is always transported at 8 bits,
    /// whatever depth the application model carries.
    pub fn transport_depth(&self) -> ColorDepth {
        if self.color_format == ColorFormat::YCbCr422 { ColorDepth::Bpc8 } else { self.color_depth }
    }

    /// HDMI VIC advertised in the vendor-specific infoframe for extended
    /// resolutions that have no CEA VIC in HDMI 1.4.
    pub fn hdmi_vic(&self) -> Option<u8> {
        let t = self.timing;
        if t.interlaced {
            return None;
        }
        match (t.width, t.height, t.frame_rate_hz) {
            (3840, 2160, 30) => Some(1),
            (3840, 2160, 25) => Some(2),
            (3840, 2160, 24) => Some(3),
            (4096, 2160, 24) => Some(4),
            (1920, 1200, 60) => Some(5),
            _ => None,
        }
    }
}

impl Default for VideoStreamParams {
    fn default() -> Self {
        Self::colorbar_default()
    }
}

impl fmt::Display for VideoStreamParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let t = self.timing;
        write!(
            f,
            "{}x{}@{}{} {} {}bpc ppc={}",
            t.width,
            t.height,
            t.frame_rate_hz,
            if t.interlaced { "i" } else { "p" },
            self.color_format.as_str(),
            self.color_depth.bits(),
            self.pixels_per_clock.count()
        )?;
        if self.pixel_repetition > 1 {
            write!(f, " rep=x{}", self.pixel_repetition)?;
        }
        if self.is_3d {
            f.write_str(" 3D")?;
        }
        Ok(())
    }
}

/// Transmit signalling mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutputMode {
    Dvi,
    Hdmi,
}

/// Audio stream format as reported by the receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AudioFormat {
    /// Linear PCM.
    Lpcm,
    /// High-bit-rate compressed audio.
    Hbr,
    /// 3-D (multi-stream) audio.
    ThreeD,
    /// Raw format code the receiver could not classify.
    Unknown(u8),
}

/// Audio sample rates supported by the clock recovery path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SampleRate {
    Khz32,
    Khz44_1,
    Khz48,
    Khz88_2,
    Khz96,
    Khz176_4,
    Khz192,
}

impl SampleRate {
    pub fn hz(self) -> u32 {
        match self {
            SampleRate::Khz32 => 32_000,
            SampleRate::Khz44_1 => 44_100,
            SampleRate::Khz48 => 48_000,
            SampleRate::Khz88_2 => 88_200,
            SampleRate::Khz96 => 96_000,
            SampleRate::Khz176_4 => 176_400,
            SampleRate::Khz192 => 192_000,
        }
    }
}

/// Pattern produced by the local test audio generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TestPattern {
    Silence,
    Sine,
    Ping,
}

/// Source of the audio clock regeneration values sent downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AcrSource {
    /// Forwarded from the receiver (pass-through).
    Receive,
    /// Produced by the local audio generator (standalone).
    Generator,
}

/// PLL feeding a transceiver direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PllType {
    Cpll,
    Qpll,
    Qpll0,
    Qpll1,
    Pll0,
    Pll1,
}

/// Transceiver channel whose PLL line rate is queried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransceiverChannel {
    Ch1,
    Cmn0,
    Cmn1,
}

/// Transceiver family; GTP parts number their shared PLLs differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransceiverKind {
    Gtx,
    Gth,
    Gtp,
}
