/// Example demonstrating the L2CAP layer answering a scripted peer
///
/// The peer connects to RFCOMM, configures the channel, sends one frame and
/// disconnects. Every packet the stack transmits is printed as hex.
use rustyblue_l2cap::l2cap::{ConfigOptions, L2capHeader, SignalingMessage};
use rustyblue_l2cap::*;

struct PrintTransport;

impl Transport for PrintTransport {
    fn reserve_transmit_buffer(&mut self) -> Result<Vec<u8>, TransportError> {
        Ok(vec![0u8; 1021])
    }

    fn transmit(
        &mut self,
        buffer: Vec<u8>,
        size: usize,
        link: ConnectionType,
    ) -> Result<(), TransportError> {
        println!("  -> [{}] {}", link, hex::encode(&buffer[..size]));
        Ok(())
    }
}

/// RFCOMM stand-in that echoes whatever it last received
#[derive(Default)]
struct EchoRfcomm {
    last: Vec<u8>,
}

impl UpperLayer for EchoRfcomm {
    fn attribute_protocol_input(&mut self, _sdu: &[u8]) {}

    fn service_discovery_input(&mut self, _sdu: &[u8]) {}

    fn serial_port_input(&mut self, sdu: &[u8]) {
        println!("  RFCOMM received: {:?}", sdu);
        self.last = sdu.to_vec();
    }

    fn attribute_protocol_output(&mut self, _buf: &mut [u8]) -> usize {
        0
    }

    fn service_discovery_output(&mut self, _buf: &mut [u8]) -> usize {
        0
    }

    fn serial_port_output(&mut self, buf: &mut [u8]) -> usize {
        buf[..self.last.len()].copy_from_slice(&self.last);
        self.last.len()
    }
}

fn frame(cid: u16, payload: &[u8]) -> Vec<u8> {
    let mut data = L2capHeader::new(payload.len() as u16, cid).to_bytes().to_vec();
    data.extend_from_slice(payload);
    data
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("L2CAP Server Example");
    println!("--------------------");

    let mut l2cap = L2cap::new(L2capConfig::default())?;
    let mut transport = PrintTransport;
    let mut rfcomm = EchoRfcomm::default();
    let mut events = EventFlags::default();

    let script = vec![
        frame(
            0x0001,
            &SignalingMessage::ConnectionRequest {
                identifier: 1,
                psm: PSM::RFCOMM,
                source_cid: 0x0040,
            }
            .serialize(),
        ),
        frame(
            0x0001,
            &SignalingMessage::ConfigureRequest {
                identifier: 2,
                destination_cid: 0x0040,
                flags: 0,
                options: ConfigOptions::with_mtu(512),
            }
            .serialize(),
        ),
        frame(0x0040, b"hello"),
        frame(
            0x0001,
            &SignalingMessage::DisconnectionRequest {
                identifier: 3,
                destination_cid: 0x0040,
                source_cid: 0x0040,
            }
            .serialize(),
        ),
    ];

    for packet in script {
        println!("<- {}", hex::encode(&packet));
        l2cap.input(&packet, PacketBoundary::First, &mut rfcomm, &mut events)?;

        if !rfcomm.last.is_empty() {
            events.schedule(L2capEvent::SendSerialPort);
        }

        while let Some(event) = events.next_event() {
            l2cap.handle_event(event, &mut transport, &mut rfcomm, &mut events)?;
        }
        rfcomm.last.clear();
    }

    println!("Signaling state: {}", l2cap.signaling_state());
    Ok(())
}
