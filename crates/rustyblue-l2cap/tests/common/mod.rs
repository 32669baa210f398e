//! Shared mocks for the integration tests

#![allow(dead_code)]

use rustyblue_l2cap::l2cap::{L2capHeader, SignalingMessage};
use rustyblue_l2cap::{
    ConnectionType, EventFlags, L2cap, L2capConfig, PacketBoundary, Transport, TransportError,
    UpperLayer,
};

pub const SIGNALING_CID: u16 = 0x0001;

/// Transport that records every packet it is asked to send
#[derive(Default)]
pub struct RecordingTransport {
    pub sent: Vec<(Vec<u8>, ConnectionType)>,
}

impl Transport for RecordingTransport {
    fn reserve_transmit_buffer(&mut self) -> Result<Vec<u8>, TransportError> {
        Ok(vec![0u8; 1024])
    }

    fn transmit(
        &mut self,
        mut buffer: Vec<u8>,
        size: usize,
        link: ConnectionType,
    ) -> Result<(), TransportError> {
        buffer.truncate(size);
        self.sent.push((buffer, link));
        Ok(())
    }
}

impl RecordingTransport {
    /// Decode every packet sent on the signaling channel
    pub fn signaling(&self) -> Vec<SignalingMessage> {
        self.sent
            .iter()
            .filter_map(|(packet, _)| {
                let header = L2capHeader::parse(packet)?;
                if header.channel_id != SIGNALING_CID {
                    return None;
                }
                SignalingMessage::parse(&packet[4..]).ok().flatten()
            })
            .collect()
    }
}

/// Upper layers that record their input and echo it back on output
#[derive(Default)]
pub struct EchoUpper {
    pub att: Vec<Vec<u8>>,
    pub sdp: Vec<Vec<u8>>,
    pub rfcomm: Vec<Vec<u8>>,
}

fn echo(last: Option<&Vec<u8>>, buf: &mut [u8]) -> usize {
    match last {
        Some(data) => {
            buf[..data.len()].copy_from_slice(data);
            data.len()
        }
        None => 0,
    }
}

impl UpperLayer for EchoUpper {
    fn attribute_protocol_input(&mut self, sdu: &[u8]) {
        self.att.push(sdu.to_vec());
    }

    fn service_discovery_input(&mut self, sdu: &[u8]) {
        self.sdp.push(sdu.to_vec());
    }

    fn serial_port_input(&mut self, sdu: &[u8]) {
        self.rfcomm.push(sdu.to_vec());
    }

    fn attribute_protocol_output(&mut self, buf: &mut [u8]) -> usize {
        echo(self.att.last(), buf)
    }

    fn service_discovery_output(&mut self, buf: &mut [u8]) -> usize {
        echo(self.sdp.last(), buf)
    }

    fn serial_port_output(&mut self, buf: &mut [u8]) -> usize {
        echo(self.rfcomm.last(), buf)
    }
}

/// An L2CAP context wired to recording collaborators
pub struct Stack {
    pub l2cap: L2cap,
    pub transport: RecordingTransport,
    pub upper: EchoUpper,
    pub events: EventFlags,
}

impl Stack {
    pub fn new() -> Self {
        Self {
            l2cap: L2cap::new(L2capConfig::default()).expect("default config is valid"),
            transport: RecordingTransport::default(),
            upper: EchoUpper::default(),
            events: EventFlags::default(),
        }
    }

    /// Deliver one fragment carrying a basic header
    pub fn deliver(&mut self, length: u16, cid: u16, payload: &[u8], boundary: PacketBoundary) {
        let mut data = L2capHeader::new(length, cid).to_bytes().to_vec();
        data.extend_from_slice(payload);
        self.l2cap
            .input(&data, boundary, &mut self.upper, &mut self.events)
            .expect("fragment accepted");
    }

    pub fn signal(&mut self, message: SignalingMessage) {
        let bytes = message.serialize();
        self.deliver(bytes.len() as u16, SIGNALING_CID, &bytes, PacketBoundary::First);
    }

    /// Cooperative event loop: fire events until none are pending
    pub fn run(&mut self) {
        while let Some(event) = self.events.next_event() {
            self.l2cap
                .handle_event(event, &mut self.transport, &mut self.upper, &mut self.events)
                .expect("event handled");
        }
    }
}
