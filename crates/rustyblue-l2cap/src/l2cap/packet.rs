//! L2CAP Packet handling
//!
//! This module provides structures and functions for handling L2CAP packets
//! as they arrive from, and leave for, the baseband transport.

use super::constants::*;
use super::types::ChannelId;
use byteorder::{ByteOrder, LittleEndian, ReadBytesExt};
use std::io::Cursor;

/// L2CAP Packet header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct L2capHeader {
    /// Length of the L2CAP payload in bytes
    pub length: u16,
    /// Channel Identifier
    pub channel_id: ChannelId,
}

impl L2capHeader {
    /// Create a new L2CAP header
    pub fn new(length: u16, channel_id: ChannelId) -> Self {
        Self { length, channel_id }
    }

    /// Parse an L2CAP header from raw bytes
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < L2CAP_BASIC_HEADER_SIZE {
            return None;
        }

        let mut cursor = Cursor::new(data);
        let length = cursor.read_u16::<LittleEndian>().ok()?;
        let channel_id = cursor.read_u16::<LittleEndian>().ok()?;

        Some(Self { length, channel_id })
    }

    /// Write the header into the first four bytes of `buf`
    ///
    /// Callers guarantee `buf` holds at least [`L2CAP_BASIC_HEADER_SIZE`] bytes.
    pub fn write_to(&self, buf: &mut [u8]) {
        LittleEndian::write_u16(&mut buf[0..2], self.length);
        LittleEndian::write_u16(&mut buf[2..4], self.channel_id);
    }

    /// Serialize the header to bytes
    pub fn to_bytes(&self) -> [u8; L2CAP_BASIC_HEADER_SIZE] {
        let mut result = [0u8; L2CAP_BASIC_HEADER_SIZE];
        self.write_to(&mut result);
        result
    }
}

/// Position of a baseband fragment within an L2CAP PDU
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketBoundary {
    /// Start of a new PDU
    First,
    /// Continuation of the PDU currently being reassembled
    Continuation,
}

impl PacketBoundary {
    /// Decode the packet boundary bits of the ACL flags handed up by the transport
    pub fn from_hci_flags(flags: u8) -> Self {
        if flags & HCI_PB_MASK == HCI_PB_CONTINUE {
            PacketBoundary::Continuation
        } else {
            PacketBoundary::First
        }
    }

    pub fn is_first(&self) -> bool {
        matches!(self, PacketBoundary::First)
    }
}

/// One transport fragment: basic header plus the bytes it carries
#[derive(Debug, Clone, Copy)]
pub struct Fragment<'a> {
    /// Declared total SDU length and channel id
    pub header: L2capHeader,
    /// Bytes following the header in this fragment
    pub payload: &'a [u8],
    /// First/continuation marker from the transport
    pub boundary: PacketBoundary,
}

impl<'a> Fragment<'a> {
    /// Parse a fragment from raw bytes. Returns `None` when the header is incomplete.
    pub fn parse(data: &'a [u8], boundary: PacketBoundary) -> Option<Self> {
        let header = L2capHeader::parse(data)?;

        Some(Self {
            header,
            payload: &data[L2CAP_BASIC_HEADER_SIZE..],
            boundary,
        })
    }
}

/// L2CAP Command header used in signaling packets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct L2capCommandHeader {
    /// Command code
    pub code: u8,
    /// Command identifier
    pub identifier: u8,
    /// Length of command parameters
    pub length: u16,
}

impl L2capCommandHeader {
    /// Create a new command header
    pub fn new(code: u8, identifier: u8, length: u16) -> Self {
        Self {
            code,
            identifier,
            length,
        }
    }

    /// Parse a command header from raw bytes
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < L2CAP_COMMAND_HEADER_SIZE {
            return None;
        }

        let code = data[0];
        let identifier = data[1];
        let length = LittleEndian::read_u16(&data[2..4]);

        Some(Self {
            code,
            identifier,
            length,
        })
    }

    /// Serialize the command header to bytes
    pub fn to_bytes(&self) -> [u8; L2CAP_COMMAND_HEADER_SIZE] {
        let mut result = [0u8; L2CAP_COMMAND_HEADER_SIZE];

        result[0] = self.code;
        result[1] = self.identifier;
        LittleEndian::write_u16(&mut result[2..4], self.length);

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_layout_is_little_endian() {
        let header = L2capHeader::new(0x0102, 0x0040);
        assert_eq!(header.to_bytes(), [0x02, 0x01, 0x40, 0x00]);
        assert_eq!(L2capHeader::parse(&[0x02, 0x01, 0x40, 0x00]), Some(header));
    }

    #[test]
    fn test_short_header_is_rejected() {
        assert!(L2capHeader::parse(&[0x01, 0x00, 0x01]).is_none());
        assert!(Fragment::parse(&[0x01, 0x00], PacketBoundary::First).is_none());
    }

    #[test]
    fn test_packet_boundary_from_hci_flags() {
        assert_eq!(PacketBoundary::from_hci_flags(HCI_PB_FIRST_NON_FLUSHABLE), PacketBoundary::First);
        assert_eq!(PacketBoundary::from_hci_flags(HCI_PB_FIRST_FLUSHABLE), PacketBoundary::First);
        assert_eq!(PacketBoundary::from_hci_flags(HCI_PB_CONTINUE), PacketBoundary::Continuation);
        // Broadcast bits above the boundary flag are ignored
        assert_eq!(PacketBoundary::from_hci_flags(0x04 | HCI_PB_CONTINUE), PacketBoundary::Continuation);
    }

    #[test]
    fn test_fragment_payload_follows_header() {
        let data = [0x03, 0x00, 0x41, 0x00, 0xAA, 0xBB];
        let fragment = Fragment::parse(&data, PacketBoundary::First).unwrap();
        assert_eq!(fragment.header.length, 3);
        assert_eq!(fragment.header.channel_id, 0x0041);
        assert_eq!(fragment.payload, &[0xAA, 0xBB]);
    }

    #[test]
    fn test_command_header() {
        let header = L2capCommandHeader::new(L2CAP_CONNECTION_REQUEST, 7, 4);
        let bytes = header.to_bytes();
        assert_eq!(bytes, [0x02, 0x07, 0x04, 0x00]);
        assert_eq!(L2capCommandHeader::parse(&bytes), Some(header));
    }
}
