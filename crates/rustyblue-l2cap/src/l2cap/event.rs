//! Deferred send events
//!
//! Inbound processing never transmits directly. It schedules an event, and
//! the cooperative scheduler later hands the event back to
//! [`L2cap::handle_event`](super::core::L2cap::handle_event), which builds
//! and transmits the outbound packet.

use bitflags::bitflags;

/// An outbound packet waiting to be produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum L2capEvent {
    /// Signaling response or follow-up request
    SendSignaling,
    /// RFCOMM has data for the serial port channel
    SendSerialPort,
    /// ATT has data for the attribute protocol channel
    SendAttribute,
    /// SDP has data for the service discovery channel
    SendServiceDiscovery,
}

impl L2capEvent {
    pub const ALL: [L2capEvent; 4] = [
        L2capEvent::SendSignaling,
        L2capEvent::SendSerialPort,
        L2capEvent::SendAttribute,
        L2capEvent::SendServiceDiscovery,
    ];

    fn flag(self) -> EventFlags {
        match self {
            L2capEvent::SendSignaling => EventFlags::SEND_SIGNALING,
            L2capEvent::SendSerialPort => EventFlags::SEND_SERIAL_PORT,
            L2capEvent::SendAttribute => EventFlags::SEND_ATTRIBUTE,
            L2capEvent::SendServiceDiscovery => EventFlags::SEND_SERVICE_DISCOVERY,
        }
    }
}

/// Sink for deferred events
///
/// Events behave like flags: scheduling an event that is already pending does
/// nothing, so it fires once. There is no way to revoke a scheduled event.
pub trait Scheduler {
    fn schedule(&mut self, event: L2capEvent);
}

bitflags! {
    /// Pending event set for a single-threaded event loop
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct EventFlags: u8 {
        const SEND_SIGNALING = 0x01;
        const SEND_SERIAL_PORT = 0x02;
        const SEND_ATTRIBUTE = 0x04;
        const SEND_SERVICE_DISCOVERY = 0x08;
    }
}

impl EventFlags {
    /// Whether `event` is waiting to fire
    pub fn is_pending(&self, event: L2capEvent) -> bool {
        self.contains(event.flag())
    }

    /// Take the next pending event, signaling first
    pub fn next_event(&mut self) -> Option<L2capEvent> {
        let event = L2capEvent::ALL
            .into_iter()
            .find(|event| self.contains(event.flag()))?;
        self.remove(event.flag());
        Some(event)
    }
}

impl Scheduler for EventFlags {
    fn schedule(&mut self, event: L2capEvent) {
        self.insert(event.flag());
    }
}
