//! End-to-end channel lifecycle driven through a cooperative event loop

mod common;

use common::{Stack, SIGNALING_CID};
use rustyblue_l2cap::l2cap::constants::*;
use rustyblue_l2cap::l2cap::{ConfigOptions, L2capHeader, SignalingMessage, SignalingState};
use rustyblue_l2cap::{ConnectionType, L2capEvent, LogicalChannel, PacketBoundary, Scheduler, PSM};

#[test]
fn sdp_session_connect_configure_exchange_disconnect() {
    let mut stack = Stack::new();

    stack.signal(SignalingMessage::ConnectionRequest {
        identifier: 1,
        psm: PSM::SDP,
        source_cid: 0x0040,
    });
    stack.run();

    stack.signal(SignalingMessage::ConfigureRequest {
        identifier: 2,
        destination_cid: 0x0040,
        flags: 0,
        options: ConfigOptions::with_mtu(672),
    });
    stack.run();

    // Peer accepts our configuration; nothing more is sent
    stack.signal(SignalingMessage::ConfigureResponse {
        identifier: 2,
        source_cid: 0x0040,
        flags: 0,
        result: L2CAP_CONFIGURE_SUCCESS,
        options: ConfigOptions::default(),
    });
    stack.run();

    let codes: Vec<u8> = stack
        .transport
        .signaling()
        .iter()
        .map(SignalingMessage::command_code)
        .collect();
    assert_eq!(
        codes,
        vec![
            L2CAP_CONNECTION_RESPONSE,
            L2CAP_CONFIGURE_RESPONSE,
            L2CAP_CONFIGURE_REQUEST,
        ]
    );
    assert_eq!(
        stack.l2cap.registry().peer_mtu(LogicalChannel::ServiceDiscovery),
        Some(672)
    );

    // SDP request split over two fragments, answered on the same channel
    let request = [0x06, 0x00, 0x01, 0x00, 0x05, 0x35, 0x03, 0x19, 0x11, 0x01];
    stack.deliver(request.len() as u16, 0x0040, &request[..4], PacketBoundary::First);
    stack.deliver(0, 0x0040, &request[4..], PacketBoundary::Continuation);
    assert_eq!(stack.upper.sdp, vec![request.to_vec()]);

    stack.events.schedule(L2capEvent::SendServiceDiscovery);
    stack.run();
    let (reply, link) = stack.transport.sent.last().unwrap();
    assert_eq!(*link, ConnectionType::Classic);
    assert_eq!(L2capHeader::parse(reply), Some(L2capHeader::new(request.len() as u16, 0x0040)));
    assert_eq!(&reply[4..], &request[..]);

    stack.signal(SignalingMessage::DisconnectionRequest {
        identifier: 3,
        destination_cid: 0x0040,
        source_cid: 0x0040,
    });
    stack.run();

    assert_eq!(
        stack.transport.signaling().last(),
        Some(&SignalingMessage::DisconnectionResponse {
            identifier: 3,
            destination_cid: 0x0040,
            source_cid: 0x0040,
        })
    );
    assert_eq!(stack.l2cap.signaling_state(), SignalingState::Idle);
}

#[test]
fn att_runs_alongside_classic_channels() {
    let mut stack = Stack::new();

    stack.signal(SignalingMessage::ConnectionRequest {
        identifier: 1,
        psm: PSM::RFCOMM,
        source_cid: 0x0041,
    });

    // ATT read request arrives while the signaling response is still pending
    stack.deliver(3, L2CAP_ATTRIBUTE_PROTOCOL_CID, &[0x0A, 0x03, 0x00], PacketBoundary::First);
    stack.events.schedule(L2capEvent::SendAttribute);
    stack.run();

    let links: Vec<(u16, ConnectionType)> = stack
        .transport
        .sent
        .iter()
        .map(|(packet, link)| (L2capHeader::parse(packet).unwrap().channel_id, *link))
        .collect();
    assert_eq!(
        links,
        vec![
            (SIGNALING_CID, ConnectionType::Classic),
            (L2CAP_ATTRIBUTE_PROTOCOL_CID, ConnectionType::LE),
        ]
    );

    stack.deliver(2, 0x0041, &[0x03, 0xEF], PacketBoundary::First);
    assert_eq!(stack.upper.rfcomm, vec![vec![0x03, 0xEF]]);
    assert_eq!(stack.upper.att, vec![vec![0x0A, 0x03, 0x00]]);
}
