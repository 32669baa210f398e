//! L2CAP Signaling channel implementation
//!
//! This module decodes commands arriving on the signaling channel and builds
//! the responses to them. The engine answers one request at a time: each
//! recognised request replaces whatever was pending and schedules a single
//! deferred send, so a request overtaken by a newer one before its send event
//! fires is never answered.

use super::channel::{ChannelRegistry, LogicalChannel};
use super::constants::*;
use super::event::{L2capEvent, Scheduler};
use super::packet::L2capCommandHeader;
use super::psm::PSM;
use super::types::{ChannelId, L2capError, L2capResult};
use byteorder::{LittleEndian, ReadBytesExt};
use log::{debug, warn};
use std::fmt;
use std::io::Cursor;

/// Handle for identifying signaling transactions
pub type SignalId = u8;

/// L2CAP Configuration Options understood by this stack
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOptions {
    /// Maximum Transmission Unit
    pub mtu: Option<u16>,
}

impl ConfigOptions {
    pub fn with_mtu(mtu: u16) -> Self {
        Self { mtu: Some(mtu) }
    }

    /// Parse configuration options from raw bytes
    ///
    /// Unknown options are skipped. A truncated trailing option ends parsing.
    fn parse(data: &[u8]) -> Self {
        let mut options = ConfigOptions::default();
        let mut offset = 0;

        while offset + 2 <= data.len() {
            let option_type = data[offset] & !L2CAP_CONF_HINT_MASK;
            let option_length = data[offset + 1] as usize;

            if offset + 2 + option_length > data.len() {
                break;
            }

            let option_data = &data[offset + 2..offset + 2 + option_length];

            if option_type == L2CAP_CONF_MTU && option_length == L2CAP_CONF_MTU_LENGTH as usize {
                let mut cursor = Cursor::new(option_data);
                if let Ok(mtu) = cursor.read_u16::<LittleEndian>() {
                    options.mtu = Some(mtu);
                }
            }

            offset += 2 + option_length;
        }

        options
    }

    /// Serialize configuration options to bytes
    fn serialize(&self, result: &mut Vec<u8>) {
        if let Some(mtu) = self.mtu {
            result.push(L2CAP_CONF_MTU);
            result.push(L2CAP_CONF_MTU_LENGTH);
            result.extend_from_slice(&mtu.to_le_bytes());
        }
    }

    fn encoded_len(&self) -> usize {
        if self.mtu.is_some() {
            2 + L2CAP_CONF_MTU_LENGTH as usize
        } else {
            0
        }
    }
}

/// L2CAP Signaling message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalingMessage {
    /// Command Reject
    CommandReject {
        identifier: SignalId,
        reason: u16,
        data: Vec<u8>,
    },

    /// Connection Request
    ConnectionRequest {
        identifier: SignalId,
        psm: PSM,
        source_cid: ChannelId,
    },

    /// Connection Response
    ConnectionResponse {
        identifier: SignalId,
        destination_cid: ChannelId,
        source_cid: ChannelId,
        result: u16,
        status: u16,
    },

    /// Configuration Request
    ConfigureRequest {
        identifier: SignalId,
        destination_cid: ChannelId,
        flags: u16,
        options: ConfigOptions,
    },

    /// Configuration Response
    ConfigureResponse {
        identifier: SignalId,
        source_cid: ChannelId,
        flags: u16,
        result: u16,
        options: ConfigOptions,
    },

    /// Disconnection Request
    DisconnectionRequest {
        identifier: SignalId,
        destination_cid: ChannelId,
        source_cid: ChannelId,
    },

    /// Disconnection Response
    DisconnectionResponse {
        identifier: SignalId,
        destination_cid: ChannelId,
        source_cid: ChannelId,
    },

    /// Information Request
    InformationRequest {
        identifier: SignalId,
        info_type: u16,
    },

    /// Information Response
    InformationResponse {
        identifier: SignalId,
        info_type: u16,
        result: u16,
        data: Vec<u8>,
    },
}

fn read_u16(cursor: &mut Cursor<&[u8]>, field: &str) -> L2capResult<u16> {
    cursor
        .read_u16::<LittleEndian>()
        .map_err(|_| L2capError::InvalidParameter(format!("Failed to read {}", field)))
}

fn require(params: &[u8], needed: usize, command: &str) -> L2capResult<()> {
    if params.len() < needed {
        return Err(L2capError::InvalidParameter(format!(
            "{} parameters too short",
            command
        )));
    }
    Ok(())
}

impl SignalingMessage {
    /// Get the command code for this signaling message
    pub fn command_code(&self) -> u8 {
        match self {
            Self::CommandReject { .. } => L2CAP_COMMAND_REJECT,
            Self::ConnectionRequest { .. } => L2CAP_CONNECTION_REQUEST,
            Self::ConnectionResponse { .. } => L2CAP_CONNECTION_RESPONSE,
            Self::ConfigureRequest { .. } => L2CAP_CONFIGURE_REQUEST,
            Self::ConfigureResponse { .. } => L2CAP_CONFIGURE_RESPONSE,
            Self::DisconnectionRequest { .. } => L2CAP_DISCONNECTION_REQUEST,
            Self::DisconnectionResponse { .. } => L2CAP_DISCONNECTION_RESPONSE,
            Self::InformationRequest { .. } => L2CAP_INFORMATION_REQUEST,
            Self::InformationResponse { .. } => L2CAP_INFORMATION_RESPONSE,
        }
    }

    /// Get the identifier for this signaling message
    pub fn identifier(&self) -> SignalId {
        match self {
            Self::CommandReject { identifier, .. }
            | Self::ConnectionRequest { identifier, .. }
            | Self::ConnectionResponse { identifier, .. }
            | Self::ConfigureRequest { identifier, .. }
            | Self::ConfigureResponse { identifier, .. }
            | Self::DisconnectionRequest { identifier, .. }
            | Self::DisconnectionResponse { identifier, .. }
            | Self::InformationRequest { identifier, .. }
            | Self::InformationResponse { identifier, .. } => *identifier,
        }
    }

    /// Parse a signaling message from raw bytes
    ///
    /// Returns `Ok(None)` for command codes this stack does not handle.
    pub fn parse(data: &[u8]) -> L2capResult<Option<Self>> {
        let cmd_header = L2capCommandHeader::parse(data)
            .ok_or_else(|| L2capError::InvalidParameter("Signaling data too short".into()))?;

        let params = &data[L2CAP_COMMAND_HEADER_SIZE..];
        if params.len() < cmd_header.length as usize {
            return Err(L2capError::InvalidParameter("Command parameters too short".into()));
        }
        let params = &params[..cmd_header.length as usize];
        let identifier = cmd_header.identifier;
        let mut cursor = Cursor::new(params);

        let message = match cmd_header.code {
            L2CAP_COMMAND_REJECT => {
                require(params, 2, "Command reject")?;
                let reason = read_u16(&mut cursor, "reason")?;
                Self::CommandReject {
                    identifier,
                    reason,
                    data: params[2..].to_vec(),
                }
            }

            L2CAP_CONNECTION_REQUEST => {
                require(params, 4, "Connection request")?;
                let psm = PSM::from_value(read_u16(&mut cursor, "PSM")?);
                let source_cid = read_u16(&mut cursor, "source CID")?;
                Self::ConnectionRequest {
                    identifier,
                    psm,
                    source_cid,
                }
            }

            L2CAP_CONNECTION_RESPONSE => {
                require(params, 8, "Connection response")?;
                Self::ConnectionResponse {
                    identifier,
                    destination_cid: read_u16(&mut cursor, "destination CID")?,
                    source_cid: read_u16(&mut cursor, "source CID")?,
                    result: read_u16(&mut cursor, "result")?,
                    status: read_u16(&mut cursor, "status")?,
                }
            }

            L2CAP_CONFIGURE_REQUEST => {
                require(params, 4, "Configure request")?;
                Self::ConfigureRequest {
                    identifier,
                    destination_cid: read_u16(&mut cursor, "destination CID")?,
                    flags: read_u16(&mut cursor, "flags")?,
                    options: ConfigOptions::parse(&params[4..]),
                }
            }

            L2CAP_CONFIGURE_RESPONSE => {
                require(params, 6, "Configure response")?;
                Self::ConfigureResponse {
                    identifier,
                    source_cid: read_u16(&mut cursor, "source CID")?,
                    flags: read_u16(&mut cursor, "flags")?,
                    result: read_u16(&mut cursor, "result")?,
                    options: ConfigOptions::parse(&params[6..]),
                }
            }

            L2CAP_DISCONNECTION_REQUEST => {
                require(params, 4, "Disconnection request")?;
                Self::DisconnectionRequest {
                    identifier,
                    destination_cid: read_u16(&mut cursor, "destination CID")?,
                    source_cid: read_u16(&mut cursor, "source CID")?,
                }
            }

            L2CAP_DISCONNECTION_RESPONSE => {
                require(params, 4, "Disconnection response")?;
                Self::DisconnectionResponse {
                    identifier,
                    destination_cid: read_u16(&mut cursor, "destination CID")?,
                    source_cid: read_u16(&mut cursor, "source CID")?,
                }
            }

            L2CAP_INFORMATION_REQUEST => {
                require(params, 2, "Information request")?;
                Self::InformationRequest {
                    identifier,
                    info_type: read_u16(&mut cursor, "info type")?,
                }
            }

            L2CAP_INFORMATION_RESPONSE => {
                require(params, 4, "Information response")?;
                Self::InformationResponse {
                    identifier,
                    info_type: read_u16(&mut cursor, "info type")?,
                    result: read_u16(&mut cursor, "result")?,
                    data: params[4..].to_vec(),
                }
            }

            _ => return Ok(None),
        };

        Ok(Some(message))
    }

    /// Length of the command parameters (the header's data length field)
    fn params_len(&self) -> usize {
        match self {
            Self::CommandReject { data, .. } => 2 + data.len(),
            Self::ConnectionRequest { .. } => 4,
            Self::ConnectionResponse { .. } => 8,
            Self::ConfigureRequest { options, .. } => 4 + options.encoded_len(),
            Self::ConfigureResponse { options, .. } => 6 + options.encoded_len(),
            Self::DisconnectionRequest { .. } | Self::DisconnectionResponse { .. } => 4,
            Self::InformationRequest { .. } => 2,
            Self::InformationResponse { data, .. } => 4 + data.len(),
        }
    }

    /// Total encoded size including the command header
    pub fn encoded_len(&self) -> usize {
        L2CAP_COMMAND_HEADER_SIZE + self.params_len()
    }

    /// Serialize the signaling message to bytes
    pub fn serialize(&self) -> Vec<u8> {
        let mut result = Vec::with_capacity(self.encoded_len());
        let header = L2capCommandHeader::new(
            self.command_code(),
            self.identifier(),
            self.params_len() as u16,
        );
        result.extend_from_slice(&header.to_bytes());

        match self {
            Self::CommandReject { reason, data, .. } => {
                result.extend_from_slice(&reason.to_le_bytes());
                result.extend_from_slice(data);
            }
            Self::ConnectionRequest { psm, source_cid, .. } => {
                result.extend_from_slice(&psm.value().to_le_bytes());
                result.extend_from_slice(&source_cid.to_le_bytes());
            }
            Self::ConnectionResponse {
                destination_cid,
                source_cid,
                result: conn_result,
                status,
                ..
            } => {
                result.extend_from_slice(&destination_cid.to_le_bytes());
                result.extend_from_slice(&source_cid.to_le_bytes());
                result.extend_from_slice(&conn_result.to_le_bytes());
                result.extend_from_slice(&status.to_le_bytes());
            }
            Self::ConfigureRequest {
                destination_cid,
                flags,
                options,
                ..
            } => {
                result.extend_from_slice(&destination_cid.to_le_bytes());
                result.extend_from_slice(&flags.to_le_bytes());
                options.serialize(&mut result);
            }
            Self::ConfigureResponse {
                source_cid,
                flags,
                result: conf_result,
                options,
                ..
            } => {
                result.extend_from_slice(&source_cid.to_le_bytes());
                result.extend_from_slice(&flags.to_le_bytes());
                result.extend_from_slice(&conf_result.to_le_bytes());
                options.serialize(&mut result);
            }
            Self::DisconnectionRequest {
                destination_cid,
                source_cid,
                ..
            }
            | Self::DisconnectionResponse {
                destination_cid,
                source_cid,
                ..
            } => {
                result.extend_from_slice(&destination_cid.to_le_bytes());
                result.extend_from_slice(&source_cid.to_le_bytes());
            }
            Self::InformationRequest { info_type, .. } => {
                result.extend_from_slice(&info_type.to_le_bytes());
            }
            Self::InformationResponse {
                info_type,
                result: info_result,
                data,
                ..
            } => {
                result.extend_from_slice(&info_type.to_le_bytes());
                result.extend_from_slice(&info_result.to_le_bytes());
                result.extend_from_slice(data);
            }
        }

        result
    }

    /// Serialize into a caller-supplied buffer, returning the bytes written
    pub fn write_to(&self, buf: &mut [u8]) -> L2capResult<usize> {
        let needed = self.encoded_len();
        if buf.len() < needed {
            return Err(L2capError::BufferTooSmall {
                needed,
                available: buf.len(),
            });
        }

        buf[..needed].copy_from_slice(&self.serialize());
        Ok(needed)
    }
}

/// A peer request waiting for its response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingRequest {
    Connection {
        identifier: SignalId,
        psm: PSM,
        source_cid: ChannelId,
    },
    Configure {
        identifier: SignalId,
        destination_cid: ChannelId,
    },
    Disconnection {
        identifier: SignalId,
        destination_cid: ChannelId,
        source_cid: ChannelId,
    },
    Information {
        identifier: SignalId,
        info_type: u16,
    },
}

impl PendingRequest {
    fn from_message(message: &SignalingMessage) -> Option<Self> {
        match *message {
            SignalingMessage::ConnectionRequest {
                identifier,
                psm,
                source_cid,
            } => Some(Self::Connection {
                identifier,
                psm,
                source_cid,
            }),
            SignalingMessage::ConfigureRequest {
                identifier,
                destination_cid,
                ..
            } => Some(Self::Configure {
                identifier,
                destination_cid,
            }),
            SignalingMessage::DisconnectionRequest {
                identifier,
                destination_cid,
                source_cid,
            } => Some(Self::Disconnection {
                identifier,
                destination_cid,
                source_cid,
            }),
            SignalingMessage::InformationRequest {
                identifier,
                info_type,
            } => Some(Self::Information {
                identifier,
                info_type,
            }),
            _ => None,
        }
    }
}

/// Where the signaling engine stands between send events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignalingState {
    /// Nothing to send
    #[default]
    Idle,
    /// A peer request is waiting for its response. For a configure request
    /// this is the awaiting-configure-reply phase.
    AwaitingReply(PendingRequest),
    /// Our configure response went out; our own configure request is next
    AwaitingOwnConfigureSend {
        identifier: SignalId,
        destination_cid: ChannelId,
    },
}

impl fmt::Display for SignalingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::AwaitingReply(PendingRequest::Configure { .. }) => {
                write!(f, "Awaiting configure reply")
            }
            Self::AwaitingReply(_) => write!(f, "Awaiting reply"),
            Self::AwaitingOwnConfigureSend { .. } => write!(f, "Awaiting own configure request"),
        }
    }
}

/// Single-slot signaling request/response engine
#[derive(Debug, Clone)]
pub struct SignalingEngine {
    state: SignalingState,
    local_mtu: u16,
}

impl SignalingEngine {
    pub fn new(local_mtu: u16) -> Self {
        Self {
            state: SignalingState::Idle,
            local_mtu,
        }
    }

    pub fn state(&self) -> SignalingState {
        self.state
    }

    pub fn reset(&mut self) {
        self.state = SignalingState::Idle;
    }

    /// Handle one complete signaling SDU from the peer
    ///
    /// Malformed commands are dropped without touching the pending state.
    /// Every other command takes the single pending slot: requests schedule
    /// one signaling send, while responses, rejects and unknown codes leave
    /// nothing to answer, cancelling whatever was still owed.
    pub fn handle_input<S: Scheduler>(
        &mut self,
        sdu: &[u8],
        registry: &mut ChannelRegistry,
        scheduler: &mut S,
    ) {
        let message = match SignalingMessage::parse(sdu) {
            Ok(Some(message)) => message,
            Ok(None) => {
                debug!("Ignoring unsupported signaling command 0x{:02X}", sdu[0]);
                self.cancel_pending();
                return;
            }
            Err(e) => {
                warn!("Dropping malformed signaling packet: {}", e);
                return;
            }
        };

        debug!("L2SIG-IN: {:?}", message);

        if let SignalingMessage::ConfigureRequest {
            destination_cid,
            flags,
            ref options,
            ..
        } = message
        {
            if flags & L2CAP_CONFIGURE_FLAG_CONTINUATION != 0 {
                debug!("Configure request for CID 0x{:04X} continues in a later packet", destination_cid);
            }
            if let Some(mtu) = options.mtu {
                if !registry.record_peer_mtu(destination_cid, mtu) {
                    debug!("Peer MTU {} for unbound CID 0x{:04X}", mtu, destination_cid);
                }
            }
        }

        // Responses and rejects need no answer: this stack only sends
        // requests as configure follow-ups and does not track them
        let Some(request) = PendingRequest::from_message(&message) else {
            self.cancel_pending();
            return;
        };

        if self.state != SignalingState::Idle {
            debug!("Signaling request replaces pending state: {}", self.state);
        }
        self.state = SignalingState::AwaitingReply(request);
        scheduler.schedule(L2capEvent::SendSignaling);
    }

    fn cancel_pending(&mut self) {
        if self.state != SignalingState::Idle {
            debug!("Signaling command cancels pending state: {}", self.state);
        }
        self.state = SignalingState::Idle;
    }

    /// Give up on whatever is pending
    ///
    /// Used when the owed packet could not be built or transmitted. The send
    /// event has already been consumed, so the peer is left to retry.
    pub fn abandon(&mut self) {
        if self.state != SignalingState::Idle {
            warn!("Abandoning signaling state: {}", self.state);
        }
        self.state = SignalingState::Idle;
    }

    /// Build the packet owed for the current state into `buf`
    ///
    /// Returns `Ok(None)` when nothing is pending. The state does not move
    /// until [`SignalingEngine::confirm_sent`] reports the packet went out.
    pub fn produce_output(&self, buf: &mut [u8]) -> L2capResult<Option<usize>> {
        let message = match self.state {
            SignalingState::Idle => return Ok(None),

            SignalingState::AwaitingReply(PendingRequest::Connection {
                identifier,
                psm,
                source_cid,
            }) => {
                let result = match LogicalChannel::for_psm(psm) {
                    Some(_) => L2CAP_CONNECTION_SUCCESSFUL,
                    None => {
                        debug!("Refusing connection for {} on CID 0x{:04X}", psm, source_cid);
                        L2CAP_PSM_NOT_SUPPORTED
                    }
                };
                SignalingMessage::ConnectionResponse {
                    identifier,
                    destination_cid: source_cid,
                    source_cid,
                    result,
                    status: L2CAP_CONNECTION_STATUS_NONE,
                }
            }

            SignalingState::AwaitingReply(PendingRequest::Configure {
                identifier,
                destination_cid,
            }) => SignalingMessage::ConfigureResponse {
                identifier,
                source_cid: destination_cid,
                flags: 0,
                result: L2CAP_CONFIGURE_SUCCESS,
                options: ConfigOptions::with_mtu(self.local_mtu),
            },

            SignalingState::AwaitingReply(PendingRequest::Disconnection {
                identifier,
                destination_cid,
                source_cid,
            }) => SignalingMessage::DisconnectionResponse {
                identifier,
                destination_cid,
                source_cid,
            },

            SignalingState::AwaitingReply(PendingRequest::Information {
                identifier,
                info_type,
            }) => SignalingMessage::InformationResponse {
                identifier,
                info_type,
                result: L2CAP_INFORMATION_NOT_SUPPORTED,
                data: Vec::new(),
            },

            SignalingState::AwaitingOwnConfigureSend {
                identifier,
                destination_cid,
            } => SignalingMessage::ConfigureRequest {
                identifier,
                destination_cid,
                flags: 0,
                options: ConfigOptions::with_mtu(self.local_mtu),
            },
        };

        let size = message.write_to(buf)?;
        debug!("L2SIG-OUT: {:?}", message);

        Ok(Some(size))
    }

    /// Advance past the packet [`SignalingEngine::produce_output`] built,
    /// once it has been handed to the transport
    pub fn confirm_sent<S: Scheduler>(&mut self, registry: &mut ChannelRegistry, scheduler: &mut S) {
        self.state = match self.state {
            SignalingState::AwaitingReply(PendingRequest::Connection { psm, source_cid, .. }) => {
                // The binding outlives any later disconnection of the channel
                registry.commit(psm, source_cid);
                SignalingState::Idle
            }
            SignalingState::AwaitingReply(PendingRequest::Configure {
                identifier,
                destination_cid,
            }) => {
                scheduler.schedule(L2capEvent::SendSignaling);
                SignalingState::AwaitingOwnConfigureSend {
                    identifier,
                    destination_cid,
                }
            }
            _ => SignalingState::Idle,
        };
    }
}
