//! Error types for the rustyblue-l2cap library
//!
//! This module defines the errors reported by the transport that carries
//! L2CAP packets to and from the controller. Protocol-level errors live in
//! [`crate::l2cap::L2capError`].

use thiserror::Error;

/// Errors that can occur when handing packets to the baseband transport
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("No transmit buffer available")]
    BufferUnavailable,

    #[error("Failed to send packet: {0}")]
    SendFailed(String),

    #[error("Transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}
