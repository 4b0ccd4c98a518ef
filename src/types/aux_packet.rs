//! Auxiliary (data island) packets carried alongside the video stream

use serde::{Deserialize, Serialize};

/// Header bytes: type, version, length, ECC (filled in by hardware).
pub const AUX_HEADER_LEN: usize = 4;
/// Data bytes: checksum followed by up to 27 payload bytes, padded.
pub const AUX_DATA_LEN: usize = 36;

/// Packet type codes (header byte 0).
pub mod packet_type {
    pub const GENERAL_CONTROL: u8 = 0x03;
    pub const VENDOR_SPECIFIC_INFO: u8 = 0x81;
    pub const AVI_INFO: u8 = 0x82;
    pub const AUDIO_INFO: u8 = 0x84;
}

/// Classification of a packet by its type byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PacketKind {
    VendorSpecificInfo,
    AviInfo,
    AudioInfo,
    /// Owned by the transmit hardware; never relayed.
    GeneralControl,
    Other(u8),
}

impl PacketKind {
    pub fn classify(type_byte: u8) -> Self {
        match type_byte {
            packet_type::VENDOR_SPECIFIC_INFO => PacketKind::VendorSpecificInfo,
            packet_type::AVI_INFO => PacketKind::AviInfo,
            packet_type::AUDIO_INFO => PacketKind::AudioInfo,
            packet_type::GENERAL_CONTROL => PacketKind::GeneralControl,
            other => PacketKind::Other(other),
        }
    }
}

/// Fixed-size metadata packet as latched by the receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AuxPacket {
    pub header: [u8; AUX_HEADER_LEN],
    pub data: [u8; AUX_DATA_LEN],
}

impl Default for AuxPacket {
    fn default() -> Self {
        Self { header: [0; AUX_HEADER_LEN], data: [0; AUX_DATA_LEN] }
    }
}

impl AuxPacket {
    pub fn new(header: [u8; AUX_HEADER_LEN], data: [u8; AUX_DATA_LEN]) -> Self {
        Self { header, data }
    }

    /// Build an infoframe packet and fill in its checksum.
    ///
    /// `payload` holds PB1..PBn; payloads longer than the data area are truncated.
    pub fn infoframe(type_byte: u8, version: u8, payload: &[u8]) -> Self {
        let len = payload.len().min(AUX_DATA_LEN - 1);
        let mut packet = Self::default();
        packet.header = [type_byte, version, len as u8, 0];
        packet.data[1..=len].copy_from_slice(&payload[..len]);
        packet.data[0] = packet.expected_checksum();
        packet
    }

    pub fn type_byte(&self) -> u8 {
        self.header[0]
    }

    pub fn kind(&self) -> PacketKind {
        PacketKind::classify(self.type_byte())
    }

    pub fn version(&self) -> u8 {
        self.header[1]
    }

    /// Declared payload length, clamped to the data area.
    pub fn length(&self) -> usize {
        (self.header[2] as usize).min(AUX_DATA_LEN - 1)
    }

    /// Payload bytes PB1..PBn.
    pub fn payload(&self) -> &[u8] {
        &self.data[1..=self.length()]
    }

    /// Checksum byte making header + payload sum to zero.
    fn expected_checksum(&self) -> u8 {
        let sum = self.header[..3]
            .iter()
            .chain(self.payload())
            .fold(0u8, |acc, b| acc.wrapping_add(*b));
        0u8.wrapping_sub(sum)
    }

    pub fn checksum_valid(&self) -> bool {
        self.data[0] == self.expected_checksum()
    }
}
