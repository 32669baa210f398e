//! L2CAP protocol constants
//!
//! Channel identifiers, signaling command codes and the result codes this
//! stack puts on the wire.

// Fixed channel identifiers
pub const L2CAP_SIGNALING_CID: u16 = 0x0001;
pub const L2CAP_ATTRIBUTE_PROTOCOL_CID: u16 = 0x0004;

// Basic L2CAP header: length (u16) + channel id (u16)
pub const L2CAP_BASIC_HEADER_SIZE: usize = 4;
// Signaling command header: code (u8) + identifier (u8) + length (u16)
pub const L2CAP_COMMAND_HEADER_SIZE: usize = 4;

// Signaling command codes
pub const L2CAP_COMMAND_REJECT: u8 = 0x01;
pub const L2CAP_CONNECTION_REQUEST: u8 = 0x02;
pub const L2CAP_CONNECTION_RESPONSE: u8 = 0x03;
pub const L2CAP_CONFIGURE_REQUEST: u8 = 0x04;
pub const L2CAP_CONFIGURE_RESPONSE: u8 = 0x05;
pub const L2CAP_DISCONNECTION_REQUEST: u8 = 0x06;
pub const L2CAP_DISCONNECTION_RESPONSE: u8 = 0x07;
pub const L2CAP_INFORMATION_REQUEST: u8 = 0x0A;
pub const L2CAP_INFORMATION_RESPONSE: u8 = 0x0B;

// Connection response results
pub const L2CAP_CONNECTION_SUCCESSFUL: u16 = 0x0000;
pub const L2CAP_PSM_NOT_SUPPORTED: u16 = 0x0002;
pub const L2CAP_CONNECTION_STATUS_NONE: u16 = 0x0000;

// Configure response results
pub const L2CAP_CONFIGURE_SUCCESS: u16 = 0x0000;

// Configure request flags
pub const L2CAP_CONFIGURE_FLAG_CONTINUATION: u16 = 0x0001;

// Information response results
pub const L2CAP_INFORMATION_NOT_SUPPORTED: u16 = 0x0001;

// Configuration option types
pub const L2CAP_CONF_MTU: u8 = 0x01;
pub const L2CAP_CONF_MTU_LENGTH: u8 = 2;
pub const L2CAP_CONF_HINT_MASK: u8 = 0x80;

// HCI ACL packet boundary flag (bits 0-1 of the flags passed up by the transport)
pub const HCI_PB_MASK: u8 = 0x03;
pub const HCI_PB_FIRST_NON_FLUSHABLE: u8 = 0x00;
pub const HCI_PB_CONTINUE: u8 = 0x01;
pub const HCI_PB_FIRST_FLUSHABLE: u8 = 0x02;

// MTU values (BR/EDR)
pub const L2CAP_DEFAULT_MTU: u16 = 672;
pub const L2CAP_MIN_MTU: u16 = 48;
