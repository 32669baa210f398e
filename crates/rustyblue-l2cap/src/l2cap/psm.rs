//! Protocol/Service Multiplexer (PSM) handling for L2CAP
//!
//! This module maps PSM values found in connection requests onto the
//! protocols this stack can serve.

use std::fmt;

/// Protocol/Service Multiplexer (PSM) values used in L2CAP.
///
/// See Bluetooth Core Specification Vol 3, Part A, Section 4.
/// And assigned numbers: https://www.bluetooth.com/specifications/assigned-numbers/logical-link-control/
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PSM {
    /// Service Discovery Protocol
    SDP,
    /// RFCOMM protocol (serial port emulation)
    RFCOMM,
    /// ATT protocol (fixed channel on LE, only reachable as a PSM over BR/EDR)
    ATT,
    /// Any other value, kept verbatim so it can be rejected
    Other(u16),
}

impl PSM {
    /// Get the PSM value as u16
    pub fn value(&self) -> u16 {
        match self {
            PSM::SDP => 0x0001,
            PSM::RFCOMM => 0x0003,
            PSM::ATT => 0x001F,
            PSM::Other(value) => *value,
        }
    }

    /// Create a PSM from a u16 value
    pub fn from_value(value: u16) -> Self {
        match value {
            0x0001 => PSM::SDP,
            0x0003 => PSM::RFCOMM,
            0x001F => PSM::ATT,
            _ => PSM::Other(value),
        }
    }
}

impl fmt::Display for PSM {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PSM::SDP => write!(f, "SDP (0x0001)"),
            PSM::RFCOMM => write!(f, "RFCOMM (0x0003)"),
            PSM::ATT => write!(f, "ATT (0x001F)"),
            PSM::Other(value) => write!(f, "PSM (0x{:04X})", value),
        }
    }
}
