//! Reassembly of baseband fragments into complete L2CAP SDUs
//!
//! All dynamic and signaling channels share one buffer of fixed capacity.
//! A first fragment restarts reassembly; continuation fragments append at the
//! current offset until the declared length is reached.

use super::packet::Fragment;
use super::types::{ChannelId, L2capError, L2capResult};
use log::warn;

/// A completed SDU borrowed from the reassembly buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sdu<'a> {
    /// Channel the first fragment was addressed to
    pub channel_id: ChannelId,
    /// Reassembled payload, exactly the declared length
    pub payload: &'a [u8],
}

/// Shared reassembly buffer
///
/// Invariant: `offset <= expected_length <= capacity`. Any fragment that would
/// break it is rejected with [`L2capError::ReassemblyOverflow`] and the partial
/// SDU is discarded.
#[derive(Debug, Clone)]
pub struct ReassemblyBuffer {
    buffer: Vec<u8>,
    offset: usize,
    expected_length: usize,
    channel_id: ChannelId,
    in_progress: bool,
}

impl ReassemblyBuffer {
    /// Create an empty buffer able to hold SDUs of up to `capacity` bytes
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: vec![0u8; capacity],
            offset: 0,
            expected_length: 0,
            channel_id: 0,
            in_progress: false,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn expected_length(&self) -> usize {
        self.expected_length
    }

    /// Whether a partial SDU is waiting for continuation fragments
    pub fn in_progress(&self) -> bool {
        self.in_progress
    }

    /// Drop any partial SDU
    pub fn reset(&mut self) {
        self.offset = 0;
        self.expected_length = 0;
        self.channel_id = 0;
        self.in_progress = false;
    }

    /// Append one fragment, returning the SDU once it is complete
    pub fn push(&mut self, fragment: &Fragment<'_>) -> L2capResult<Option<Sdu<'_>>> {
        if fragment.boundary.is_first() {
            self.offset = 0;
            self.expected_length = fragment.header.length as usize;
            self.channel_id = fragment.header.channel_id;
            self.in_progress = true;

            if self.expected_length > self.capacity() {
                return Err(self.overflow(fragment.payload.len()));
            }
        } else if !self.in_progress {
            if fragment.payload.is_empty() {
                return Ok(None);
            }
            // Continuation bytes with no SDU open run past a declared length of zero
            return Err(self.overflow(fragment.payload.len()));
        }

        let end = self.offset + fragment.payload.len();
        if end > self.expected_length || end > self.capacity() {
            return Err(self.overflow(fragment.payload.len()));
        }

        self.buffer[self.offset..end].copy_from_slice(fragment.payload);
        self.offset = end;

        if self.offset < self.expected_length {
            return Ok(None);
        }

        self.in_progress = false;
        Ok(Some(Sdu {
            channel_id: self.channel_id,
            payload: &self.buffer[..self.expected_length],
        }))
    }

    fn overflow(&mut self, incoming: usize) -> L2capError {
        let err = L2capError::ReassemblyOverflow {
            expected: self.expected_length,
            offset: self.offset,
            incoming,
            capacity: self.capacity(),
        };
        warn!("Discarding partial SDU on CID 0x{:04X}: {}", self.channel_id, err);
        self.reset();
        err
    }
}
