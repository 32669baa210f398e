//! Interfaces to the rest of the host stack
//!
//! L2CAP sits between the baseband transport below and the protocols above
//! it (ATT, SDP and RFCOMM). Both sides are reached only through these traits.

use super::types::ConnectionType;
use crate::error::TransportError;

/// The baseband transport and its buffer pool
pub trait Transport {
    /// Take a fresh transmit buffer from the pool. Its length is its capacity.
    fn reserve_transmit_buffer(&mut self) -> Result<Vec<u8>, TransportError>;

    /// Send the first `size` bytes of `buffer` over the given link
    fn transmit(
        &mut self,
        buffer: Vec<u8>,
        size: usize,
        link: ConnectionType,
    ) -> Result<(), TransportError>;
}

/// Protocols carried over L2CAP channels
///
/// The `*_input` methods receive one complete SDU. The `*_output` methods
/// are called when the matching send event fires; they write their payload
/// into `buf` and return how many bytes they wrote.
pub trait UpperLayer {
    fn attribute_protocol_input(&mut self, sdu: &[u8]);

    fn service_discovery_input(&mut self, sdu: &[u8]);

    fn serial_port_input(&mut self, sdu: &[u8]);

    fn attribute_protocol_output(&mut self, buf: &mut [u8]) -> usize;

    fn service_discovery_output(&mut self, buf: &mut [u8]) -> usize;

    fn serial_port_output(&mut self, buf: &mut [u8]) -> usize;
}
