//! AVI, audio and vendor-specific infoframe codecs
//!
//! Only the fields the link orchestration reads or rewrites are modelled;
//! reserved bits are written as zero.

use serde::{Deserialize, Serialize};

use super::aux_packet::{AuxPacket, PacketKind, packet_type};
use super::{ColorFormat, VideoStreamParams};
use crate::{RelayError, Result};

const AVI_LENGTH: usize = 13;
const AUDIO_LENGTH: usize = 10;
const HDMI_IEEE_OUI: u32 = 0x00_0C03;

fn checked_payload(packet: &AuxPacket, expected: PacketKind, min_len: usize) -> Result<&[u8]> {
    if packet.kind() != expected {
        return Err(RelayError::packet(format!(
            "expected {:?}, found type {:#04x}",
            expected,
            packet.type_byte()
        )));
    }
    if packet.length() < min_len {
        return Err(RelayError::packet(format!(
            "{:?} payload too short: {} < {}",
            expected,
            packet.length(),
            min_len
        )));
    }
    if !packet.checksum_valid() {
        return Err(RelayError::packet(format!("{:?} checksum mismatch", expected)));
    }
    Ok(packet.payload())
}

/// Picture aspect ratio signalled in the AVI infoframe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PictureAspect {
    NoData,
    Ratio4x3,
    Ratio16x9,
}

/// Auxiliary Video Information infoframe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AviInfoFrame {
    pub version: u8,
    pub color_space: ColorFormat,
    pub vic: u8,
    pub picture_aspect: PictureAspect,
    /// Replication factor, 1 = none.
    pub pixel_repetition: u8,
}

impl Default for AviInfoFrame {
    /// Template loaded into the transmitter at start-up.
    fn default() -> Self {
        Self {
            version: 2,
            color_space: ColorFormat::Rgb,
            vic: 16,
            picture_aspect: PictureAspect::Ratio16x9,
            pixel_repetition: 1,
        }
    }
}

impl AviInfoFrame {
    pub fn decode(packet: &AuxPacket) -> Result<Self> {
        let pb = checked_payload(packet, PacketKind::AviInfo, 5)?;
        let color_space = match (pb[0] >> 5) & 0x03 {
            0 => ColorFormat::Rgb,
            1 => ColorFormat::YCbCr422,
            2 => ColorFormat::YCbCr444,
            _ => ColorFormat::YCbCr420,
        };
        let picture_aspect = match (pb[1] >> 4) & 0x03 {
            1 => PictureAspect::Ratio4x3,
            2 => PictureAspect::Ratio16x9,
            _ => PictureAspect::NoData,
        };
        let vic = if packet.version() >= 3 { pb[3] } else { pb[3] & 0x7F };
        Ok(Self {
            version: packet.version(),
            color_space,
            vic,
            picture_aspect,
            pixel_repetition: (pb[4] & 0x0F) + 1,
        })
    }

    pub fn encode(&self) -> AuxPacket {
        let mut pb = [0u8; AVI_LENGTH];
        let y = match self.color_space {
            ColorFormat::Rgb => 0,
            ColorFormat::YCbCr422 => 1,
            ColorFormat::YCbCr444 => 2,
            ColorFormat::YCbCr420 => 3,
        };
        let aspect = match self.picture_aspect {
            PictureAspect::NoData => 0,
            PictureAspect::Ratio4x3 => 1,
            PictureAspect::Ratio16x9 => 2,
        };
        pb[0] = y << 5;
        // Active format: same as picture.
        pb[1] = (aspect << 4) | 0x08;
        pb[3] = if self.version >= 3 { self.vic } else { self.vic & 0x7F };
        pb[4] = self.pixel_repetition.saturating_sub(1) & 0x0F;
        AuxPacket::infoframe(packet_type::AVI_INFO, self.version, &pb)
    }
}

/// Audio infoframe; fields hold the raw CEA-861 codes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AudioInfoFrame {
    /// CC field: channel count minus one, 0 = refer to stream header.
    pub channel_count: u8,
    pub coding_type: u8,
    /// SF field, 0 = refer to stream header.
    pub sample_frequency: u8,
    pub sample_size: u8,
    pub channel_allocation: u8,
}

impl AudioInfoFrame {
    pub fn decode(packet: &AuxPacket) -> Result<Self> {
        let pb = checked_payload(packet, PacketKind::AudioInfo, 4)?;
        Ok(Self {
            channel_count: pb[0] & 0x07,
            coding_type: pb[0] >> 4,
            sample_frequency: (pb[1] >> 2) & 0x07,
            sample_size: pb[1] & 0x03,
            channel_allocation: pb[3],
        })
    }

    pub fn encode(&self) -> AuxPacket {
        let mut pb = [0u8; AUDIO_LENGTH];
        pb[0] = (self.coding_type << 4) | (self.channel_count & 0x07);
        pb[1] = ((self.sample_frequency & 0x07) << 2) | (self.sample_size & 0x03);
        pb[3] = self.channel_allocation;
        AuxPacket::infoframe(packet_type::AUDIO_INFO, 1, &pb)
    }
}

/// HDMI video format advertised in the vendor-specific infoframe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VsifFormat {
    #[default]
    NoInfo,
    ExtendedResolution {
        hdmi_vic: u8,
    },
    ThreeD {
        structure: u8,
    },
}

/// HDMI vendor-specific infoframe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VendorInfoFrame {
    pub ieee_id: u32,
    pub format: VsifFormat,
}

impl Default for VendorInfoFrame {
    fn default() -> Self {
        Self { ieee_id: HDMI_IEEE_OUI, format: VsifFormat::NoInfo }
    }
}

impl VendorInfoFrame {
    /// Compose the frame describing a locally generated stream.
    pub fn for_stream(stream: &VideoStreamParams) -> Self {
        let format = if stream.is_3d {
            // Frame packing.
            VsifFormat::ThreeD { structure: 0 }
        } else if let Some(hdmi_vic) = stream.hdmi_vic() {
            VsifFormat::ExtendedResolution { hdmi_vic }
        } else {
            VsifFormat::NoInfo
        };
        Self { ieee_id: HDMI_IEEE_OUI, format }
    }

    pub fn decode(packet: &AuxPacket) -> Result<Self> {
        let pb = checked_payload(packet, PacketKind::VendorSpecificInfo, 5)?;
        let ieee_id = u32::from(pb[0]) | (u32::from(pb[1]) << 8) | (u32::from(pb[2]) << 16);
        let format = match pb[3] >> 5 {
            1 => VsifFormat::ExtendedResolution { hdmi_vic: pb[4] },
            2 => VsifFormat::ThreeD { structure: pb[4] >> 4 },
            _ => VsifFormat::NoInfo,
        };
        Ok(Self { ieee_id, format })
    }

    pub fn encode(&self) -> AuxPacket {
        let [b0, b1, b2, _] = self.ieee_id.to_le_bytes();
        let (format, pb5) = match self.format {
            VsifFormat::NoInfo => (0u8, 0u8),
            VsifFormat::ExtendedResolution { hdmi_vic } => (1, hdmi_vic),
            VsifFormat::ThreeD { structure } => (2, structure << 4),
        };
        AuxPacket::infoframe(packet_type::VENDOR_SPECIFIC_INFO, 1, &[b0, b1, b2, format << 5, pb5])
    }
}
