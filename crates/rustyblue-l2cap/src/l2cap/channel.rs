//! L2CAP logical channels and the channel registry
//!
//! Two channels are fixed (signaling and the attribute protocol). The service
//! discovery and serial port emulation channels take whatever source CID the
//! peer offered in its connection request. Only one instance of each dynamic
//! channel exists at a time.

use super::constants::{L2CAP_ATTRIBUTE_PROTOCOL_CID, L2CAP_SIGNALING_CID};
use super::psm::PSM;
use super::types::ChannelId;
use log::info;
use std::fmt;

/// The logical channels this stack multiplexes over one ACL link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalChannel {
    /// Fixed signaling channel (CID 1)
    Signaling,
    /// Fixed Attribute Protocol channel (CID 4)
    AttributeProtocol,
    /// Service Discovery Protocol, bound on connection
    ServiceDiscovery,
    /// RFCOMM serial port emulation, bound on connection
    SerialPortEmulation,
}

impl LogicalChannel {
    /// The dynamic channel served for a PSM, if any
    pub fn for_psm(psm: PSM) -> Option<Self> {
        match psm {
            PSM::SDP => Some(Self::ServiceDiscovery),
            PSM::RFCOMM => Some(Self::SerialPortEmulation),
            _ => None,
        }
    }
}

impl fmt::Display for LogicalChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Signaling => write!(f, "Signaling"),
            Self::AttributeProtocol => write!(f, "ATT"),
            Self::ServiceDiscovery => write!(f, "SDP"),
            Self::SerialPortEmulation => write!(f, "RFCOMM"),
        }
    }
}

/// A dynamic channel committed during connection setup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelBinding {
    /// CID used in both directions
    pub cid: ChannelId,
    /// MTU the peer announced in its configuration request, if any
    pub peer_mtu: Option<u16>,
}

impl ChannelBinding {
    fn new(cid: ChannelId) -> Self {
        Self { cid, peer_mtu: None }
    }
}

/// Channel id to logical channel mapping
///
/// Bindings stay in place until they are overwritten by a new connection or
/// the registry is cleared; a disconnection does not remove them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelRegistry {
    service_discovery: Option<ChannelBinding>,
    serial_port: Option<ChannelBinding>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `cid` to the channel serving `psm`
    ///
    /// Returns the bound channel, or `None` when the PSM is not served here
    /// (the registry is left untouched).
    pub fn commit(&mut self, psm: PSM, cid: ChannelId) -> Option<LogicalChannel> {
        let channel = LogicalChannel::for_psm(psm)?;

        let slot = match channel {
            LogicalChannel::ServiceDiscovery => &mut self.service_discovery,
            LogicalChannel::SerialPortEmulation => &mut self.serial_port,
            _ => return None,
        };
        *slot = Some(ChannelBinding::new(cid));

        info!("{} channel bound to CID 0x{:04X}", channel, cid);
        Some(channel)
    }

    /// The channel id in use for a logical channel
    pub fn channel_id(&self, channel: LogicalChannel) -> Option<ChannelId> {
        match channel {
            LogicalChannel::Signaling => Some(L2CAP_SIGNALING_CID),
            LogicalChannel::AttributeProtocol => Some(L2CAP_ATTRIBUTE_PROTOCOL_CID),
            _ => self.binding(channel).map(|binding| binding.cid),
        }
    }

    /// Binding details for a dynamic channel
    pub fn binding(&self, channel: LogicalChannel) -> Option<&ChannelBinding> {
        match channel {
            LogicalChannel::ServiceDiscovery => self.service_discovery.as_ref(),
            LogicalChannel::SerialPortEmulation => self.serial_port.as_ref(),
            _ => None,
        }
    }

    /// Find the logical channel an inbound CID belongs to
    pub fn route(&self, cid: ChannelId) -> Option<LogicalChannel> {
        if cid == L2CAP_SIGNALING_CID {
            return Some(LogicalChannel::Signaling);
        }
        if cid == L2CAP_ATTRIBUTE_PROTOCOL_CID {
            return Some(LogicalChannel::AttributeProtocol);
        }

        [LogicalChannel::ServiceDiscovery, LogicalChannel::SerialPortEmulation]
            .into_iter()
            .find(|channel| self.binding(*channel).map(|b| b.cid) == Some(cid))
    }

    /// Remember the MTU the peer announced for `cid`. Returns whether a binding matched.
    pub fn record_peer_mtu(&mut self, cid: ChannelId, mtu: u16) -> bool {
        let binding = [&mut self.service_discovery, &mut self.serial_port]
            .into_iter()
            .flatten()
            .find(|binding| binding.cid == cid);

        match binding {
            Some(binding) => {
                binding.peer_mtu = Some(mtu);
                true
            }
            None => false,
        }
    }

    /// MTU the peer announced for a dynamic channel
    pub fn peer_mtu(&self, channel: LogicalChannel) -> Option<u16> {
        self.binding(channel).and_then(|binding| binding.peer_mtu)
    }

    /// Forget every dynamic binding
    pub fn clear(&mut self) {
        self.service_discovery = None;
        self.serial_port = None;
    }
}
