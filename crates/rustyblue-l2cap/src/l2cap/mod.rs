//! L2CAP (Logical Link Control and Adaptation Protocol) implementation
//!
//! This module provides the L2CAP implementation, which is responsible for:
//! - Multiplexing protocol channels over a single physical connection
//! - Segmentation and reassembly of packets
//! - Channel establishment signaling (connect, configure, disconnect, information)

pub mod constants;
pub mod types;
pub mod psm;
pub mod core;
pub mod channel;
pub mod event;
pub mod host;
pub mod reassembly;
pub mod signaling;
pub mod packet;

// Re-export the public API
pub use self::types::*;
pub use self::core::L2cap;
pub use self::channel::{ChannelBinding, ChannelRegistry, LogicalChannel};
pub use self::event::{EventFlags, L2capEvent, Scheduler};
pub use self::host::{Transport, UpperLayer};
pub use self::packet::{Fragment, L2capHeader, PacketBoundary};
pub use self::psm::PSM;
pub use self::reassembly::{ReassemblyBuffer, Sdu};
pub use self::signaling::{ConfigOptions, PendingRequest, SignalingMessage, SignalingState};
