//! Type definitions for L2CAP operations
//!
//! This module contains core data structures used in L2CAP operations.

use super::channel::LogicalChannel;
use super::constants::{L2CAP_DEFAULT_MTU, L2CAP_MIN_MTU};
use crate::error::TransportError;
use std::fmt;
use thiserror::Error;

/// Channel Identifier
pub type ChannelId = u16;

/// Error types specific to L2CAP operations
#[derive(Debug, Error)]
pub enum L2capError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// A fragment would run past the declared SDU length or the buffer
    /// capacity. The partial SDU has been discarded.
    #[error(
        "Reassembly overflow: {incoming} bytes at offset {offset} \
         (expected {expected}, capacity {capacity})"
    )]
    ReassemblyOverflow {
        expected: usize,
        offset: usize,
        incoming: usize,
        capacity: usize,
    },

    #[error("No channel bound for {0}")]
    ChannelNotBound(LogicalChannel),

    #[error("Transmit buffer too small: need {needed} bytes, have {available}")]
    BufferTooSmall { needed: usize, available: usize },

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Result type for L2CAP operations
pub type L2capResult<T> = std::result::Result<T, L2capError>;

/// Connection types for L2CAP
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionType {
    /// Classic Bluetooth connection (BR/EDR ACL)
    Classic,
    /// Bluetooth Low Energy connection (LE)
    LE,
}

impl fmt::Display for ConnectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Classic => write!(f, "BR/EDR"),
            Self::LE => write!(f, "LE"),
        }
    }
}

/// Stack-wide L2CAP settings, fixed at initialization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct L2capConfig {
    /// MTU advertised in every configuration option this stack sends
    pub local_mtu: u16,
    /// Capacity of the shared reassembly buffer in bytes
    pub reassembly_capacity: usize,
}

impl Default for L2capConfig {
    fn default() -> Self {
        Self {
            local_mtu: L2CAP_DEFAULT_MTU,
            reassembly_capacity: L2CAP_DEFAULT_MTU as usize,
        }
    }
}

impl L2capConfig {
    /// Set the advertised MTU. The reassembly buffer grows with it if needed.
    pub fn with_local_mtu(mut self, mtu: u16) -> Self {
        self.local_mtu = mtu;
        if self.reassembly_capacity < mtu as usize {
            self.reassembly_capacity = mtu as usize;
        }
        self
    }

    /// Set the reassembly buffer capacity
    pub fn with_reassembly_capacity(mut self, capacity: usize) -> Self {
        self.reassembly_capacity = capacity;
        self
    }

    /// Check that the settings describe a usable BR/EDR stack
    pub fn validate(&self) -> L2capResult<()> {
        if self.local_mtu < L2CAP_MIN_MTU {
            return Err(L2capError::InvalidParameter(format!(
                "MTU {} is below the BR/EDR minimum of {}",
                self.local_mtu, L2CAP_MIN_MTU
            )));
        }

        if self.reassembly_capacity < self.local_mtu as usize {
            return Err(L2capError::InvalidParameter(format!(
                "Reassembly capacity {} cannot hold an SDU of MTU {}",
                self.reassembly_capacity, self.local_mtu
            )));
        }

        Ok(())
    }
}
