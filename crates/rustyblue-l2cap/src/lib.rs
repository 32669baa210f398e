//! RustyBlue L2CAP - the Logical Link Control and Adaptation Protocol layer
//! of a Bluetooth host stack
//!
//! This library reassembles baseband fragments into L2CAP SDUs, multiplexes
//! the signaling, ATT, SDP and RFCOMM channels over one ACL link, and answers
//! the channel establishment signaling protocol. The baseband transport, the
//! scheduler and the upper-layer protocols are supplied by the caller through
//! the [`Transport`], [`Scheduler`] and [`UpperLayer`] traits.

pub mod error;
pub mod l2cap;

// Re-export common types for convenience
pub use error::TransportError;
pub use l2cap::{
    ConnectionType, EventFlags, L2cap, L2capConfig, L2capError, L2capEvent, L2capResult,
    LogicalChannel, PacketBoundary, Scheduler, Transport, UpperLayer, PSM,
};
