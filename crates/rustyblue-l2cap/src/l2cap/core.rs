//! L2CAP Core implementation
//!
//! This module provides the L2CAP context that handles:
//! - Reassembly of inbound fragments
//! - Routing of complete SDUs to the signaling engine or upper layers
//! - Framing and transmission of outbound packets when send events fire
//!
//! Inbound processing and event handling are two phases of one cooperative
//! loop and are never run concurrently, so the context needs no locking.

use super::channel::{ChannelRegistry, LogicalChannel};
use super::constants::*;
use super::event::{L2capEvent, Scheduler};
use super::host::{Transport, UpperLayer};
use super::packet::{Fragment, L2capHeader, PacketBoundary};
use super::reassembly::ReassemblyBuffer;
use super::signaling::{SignalingEngine, SignalingState};
use super::types::{ChannelId, ConnectionType, L2capConfig, L2capError, L2capResult};
use log::{debug, trace, warn};

/// L2CAP state for one ACL link
pub struct L2cap {
    config: L2capConfig,
    reassembly: ReassemblyBuffer,
    registry: ChannelRegistry,
    signaling: SignalingEngine,
}

impl L2cap {
    /// Create the L2CAP context with all state zeroed
    pub fn new(config: L2capConfig) -> L2capResult<Self> {
        config.validate()?;

        Ok(Self {
            config,
            reassembly: ReassemblyBuffer::new(config.reassembly_capacity),
            registry: ChannelRegistry::new(),
            signaling: SignalingEngine::new(config.local_mtu),
        })
    }

    /// Return to the freshly initialized state
    ///
    /// Events already handed to the scheduler still fire; with the engine idle
    /// a signaling event then sends nothing.
    pub fn reset(&mut self) {
        self.reassembly.reset();
        self.registry.clear();
        self.signaling.reset();
    }

    pub fn config(&self) -> &L2capConfig {
        &self.config
    }

    pub fn registry(&self) -> &ChannelRegistry {
        &self.registry
    }

    pub fn reassembly(&self) -> &ReassemblyBuffer {
        &self.reassembly
    }

    pub fn signaling_state(&self) -> SignalingState {
        self.signaling.state()
    }

    /// Handle one fragment delivered by the transport
    ///
    /// Attribute protocol fragments are passed straight up. Everything else is
    /// reassembled and the complete SDU is routed by channel id; SDUs for
    /// unbound channels are dropped. The only error is
    /// [`L2capError::ReassemblyOverflow`], after which reassembly restarts
    /// with the next first fragment.
    pub fn input<U: UpperLayer, S: Scheduler>(
        &mut self,
        data: &[u8],
        boundary: PacketBoundary,
        upper: &mut U,
        scheduler: &mut S,
    ) -> L2capResult<()> {
        trace!("L2IN {:?} {}", boundary, hex::encode(data));

        let Some(fragment) = Fragment::parse(data, boundary) else {
            warn!("Dropping fragment shorter than the L2CAP header ({} bytes)", data.len());
            return Ok(());
        };

        if fragment.header.channel_id == L2CAP_ATTRIBUTE_PROTOCOL_CID {
            upper.attribute_protocol_input(fragment.payload);
            return Ok(());
        }

        let Some(sdu) = self.reassembly.push(&fragment)? else {
            return Ok(());
        };

        match self.registry.route(sdu.channel_id) {
            Some(LogicalChannel::Signaling) => {
                self.signaling
                    .handle_input(sdu.payload, &mut self.registry, scheduler);
            }
            Some(LogicalChannel::ServiceDiscovery) => upper.service_discovery_input(sdu.payload),
            Some(LogicalChannel::SerialPortEmulation) => upper.serial_port_input(sdu.payload),
            Some(LogicalChannel::AttributeProtocol) => upper.attribute_protocol_input(sdu.payload),
            None => {
                debug!(
                    "Dropping {} byte SDU for unbound CID 0x{:04X}",
                    sdu.payload.len(),
                    sdu.channel_id
                );
            }
        }

        Ok(())
    }

    /// Produce and transmit the packet owed for a fired send event
    ///
    /// A signaling packet that cannot be built or transmitted is abandoned
    /// and the engine returns to idle; the event is not rescheduled.
    pub fn handle_event<T: Transport, U: UpperLayer, S: Scheduler>(
        &mut self,
        event: L2capEvent,
        transport: &mut T,
        upper: &mut U,
        scheduler: &mut S,
    ) -> L2capResult<()> {
        let (channel, link) = match event {
            L2capEvent::SendSignaling => (LogicalChannel::Signaling, ConnectionType::Classic),
            L2capEvent::SendSerialPort => (LogicalChannel::SerialPortEmulation, ConnectionType::Classic),
            L2capEvent::SendAttribute => (LogicalChannel::AttributeProtocol, ConnectionType::LE),
            L2capEvent::SendServiceDiscovery => (LogicalChannel::ServiceDiscovery, ConnectionType::Classic),
        };

        if channel == LogicalChannel::Signaling && self.signaling.state() == SignalingState::Idle {
            debug!("Signaling event fired with nothing pending");
            return Ok(());
        }

        let cid = self
            .registry
            .channel_id(channel)
            .ok_or(L2capError::ChannelNotBound(channel))?;

        let sent = self.transmit_packet(channel, link, cid, transport, upper);

        if channel == LogicalChannel::Signaling {
            match sent {
                Ok(true) => self.signaling.confirm_sent(&mut self.registry, scheduler),
                Ok(false) => {}
                Err(_) => self.signaling.abandon(),
            }
        }

        sent.map(|_| ())
    }

    /// Frame the channel's output and hand it to the transport. Returns
    /// whether a packet went out.
    fn transmit_packet<T: Transport, U: UpperLayer>(
        &mut self,
        channel: LogicalChannel,
        link: ConnectionType,
        cid: ChannelId,
        transport: &mut T,
        upper: &mut U,
    ) -> L2capResult<bool> {
        let mut buffer = transport.reserve_transmit_buffer()?;
        if buffer.len() < L2CAP_BASIC_HEADER_SIZE {
            return Err(L2capError::BufferTooSmall {
                needed: L2CAP_BASIC_HEADER_SIZE,
                available: buffer.len(),
            });
        }

        let payload = &mut buffer[L2CAP_BASIC_HEADER_SIZE..];
        let available = payload.len();
        let size = match channel {
            LogicalChannel::Signaling => match self.signaling.produce_output(payload)? {
                Some(size) => size,
                None => return Ok(false),
            },
            LogicalChannel::SerialPortEmulation => upper.serial_port_output(payload),
            LogicalChannel::AttributeProtocol => upper.attribute_protocol_output(payload),
            LogicalChannel::ServiceDiscovery => upper.service_discovery_output(payload),
        };

        if size > available {
            return Err(L2capError::InvalidParameter(format!(
                "{} produced {} bytes into a {} byte buffer",
                channel, size, available
            )));
        }
        let length = u16::try_from(size).map_err(|_| {
            L2capError::InvalidParameter(format!("{} payload of {} bytes exceeds u16", channel, size))
        })?;

        L2capHeader::new(length, cid).write_to(&mut buffer);
        let total = L2CAP_BASIC_HEADER_SIZE + size;

        trace!("L2OUT {} {}", link, hex::encode(&buffer[..total]));
        transport.transmit(buffer, total, link)?;

        Ok(true)
    }
}
