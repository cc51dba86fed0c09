//! Datagram handshake fragmentation.
//!
//! Preparation always yields a message as a single fragment. Splitting it to
//! fit a datagram, and putting received fragments back together, happens here.

use std::collections::BTreeMap;

use nom::bytes::complete::take;
use nom::number::complete::{be_u16, be_u24};
use nom::IResult;

use super::handshake::DATAGRAM_HEADER_LEN;
use crate::error::PreparationError;
use crate::types::HandshakeType;
use crate::util::put_u24;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeFragment {
    pub msg_type: HandshakeType,
    pub length: u32,
    pub message_seq: u16,
    pub fragment_offset: u32,
    pub fragment_length: u32,
    pub body: Vec<u8>,
}

impl HandshakeFragment {
    pub fn parse(input: &[u8]) -> IResult<&[u8], HandshakeFragment> {
        let (input, msg_type) = HandshakeType::parse(input)?;
        let (input, length) = be_u24(input)?;
        let (input, message_seq) = be_u16(input)?;
        let (input, fragment_offset) = be_u24(input)?;
        let (input, fragment_length) = be_u24(input)?;
        let (input, body) = take(fragment_length as usize)(input)?;

        Ok((
            input,
            HandshakeFragment {
                msg_type,
                length,
                message_seq,
                fragment_offset,
                fragment_length,
                body: body.to_vec(),
            },
        ))
    }

    pub fn serialize(&self, output: &mut Vec<u8>) {
        output.push(self.msg_type.as_u8());
        put_u24(output, self.length);
        output.extend_from_slice(&self.message_seq.to_be_bytes());
        put_u24(output, self.fragment_offset);
        put_u24(output, self.fragment_length);
        output.extend_from_slice(&self.body);
    }
}

/// Split a prepared datagram handshake message into fragments of at most
/// `max_fragment_len` bytes, header included.
pub fn fragment_handshake(
    message: &[u8],
    max_fragment_len: usize,
) -> Result<Vec<Vec<u8>>, PreparationError> {
    if max_fragment_len <= DATAGRAM_HEADER_LEN {
        return Err(PreparationError::new(
            "fragment_length",
            format!("max fragment length {} leaves no room for a body", max_fragment_len),
        ));
    }

    let (rest, whole) = HandshakeFragment::parse(message).map_err(|_| {
        PreparationError::new("fragment_length", "not a datagram handshake message")
    })?;
    if !rest.is_empty() || whole.fragment_offset != 0 || whole.fragment_length != whole.length {
        return Err(PreparationError::new(
            "fragment_length",
            "message is not a single complete fragment",
        ));
    }

    if message.len() <= max_fragment_len {
        return Ok(vec![message.to_vec()]);
    }

    let chunk = max_fragment_len - DATAGRAM_HEADER_LEN;
    let fragments: Vec<Vec<u8>> = whole
        .body
        .chunks(chunk)
        .enumerate()
        .map(|(i, body)| {
            let fragment = HandshakeFragment {
                msg_type: whole.msg_type,
                length: whole.length,
                message_seq: whole.message_seq,
                fragment_offset: (i * chunk) as u32,
                fragment_length: body.len() as u32,
                body: body.to_vec(),
            };
            let mut out = Vec::with_capacity(DATAGRAM_HEADER_LEN + body.len());
            fragment.serialize(&mut out);
            out
        })
        .collect();

    debug!(
        "Split {} message_seq {} into {} fragments",
        whole.msg_type,
        whole.message_seq,
        fragments.len()
    );
    Ok(fragments)
}

struct Partial {
    msg_type: HandshakeType,
    body: Vec<u8>,
    received: Vec<bool>,
}

/// Incomplete messages held at once. A new message_seq beyond this evicts
/// the lowest one.
const MAX_PENDING: usize = 8;

/// Collects datagram handshake fragments into complete messages.
pub struct Reassembler {
    pending: BTreeMap<u16, Partial>,
    max_message_len: usize,
}

impl Reassembler {
    /// Fragments of messages declaring a body over `max_message_len` bytes
    /// are dropped.
    pub fn new(max_message_len: usize) -> Self {
        Reassembler {
            pending: BTreeMap::new(),
            max_message_len,
        }
    }

    /// Add every fragment in `data`, a handshake record payload.
    ///
    /// Returns the messages completed by this call, each as one fragment with
    /// offset zero. Unparseable trailing bytes are dropped.
    pub fn push_bytes(&mut self, mut data: &[u8]) -> Vec<Vec<u8>> {
        let mut complete = Vec::new();
        while !data.is_empty() {
            match HandshakeFragment::parse(data) {
                Ok((rest, fragment)) => {
                    if let Some(message) = self.push(fragment) {
                        complete.push(message);
                    }
                    data = rest;
                }
                Err(_) => {
                    warn!("Dropping {} bytes of unparseable handshake fragment", data.len());
                    break;
                }
            }
        }
        complete
    }

    pub fn push(&mut self, fragment: HandshakeFragment) -> Option<Vec<u8>> {
        let start = fragment.fragment_offset as usize;
        let end = start + fragment.body.len();
        let length = fragment.length as usize;
        if end > length {
            warn!(
                "Fragment {}..{} outside message length {}",
                start, end, length
            );
            return None;
        }
        if length > self.max_message_len {
            warn!(
                "Dropping message_seq {} fragment, length {} over {}",
                fragment.message_seq, length, self.max_message_len
            );
            return None;
        }

        if !self.pending.contains_key(&fragment.message_seq) && self.pending.len() >= MAX_PENDING {
            if let Some((seq, _)) = self.pending.pop_first() {
                debug!("Evicting incomplete message_seq {}", seq);
            }
        }

        let partial = self
            .pending
            .entry(fragment.message_seq)
            .or_insert_with(|| Partial {
                msg_type: fragment.msg_type,
                body: vec![0; length],
                received: vec![false; length],
            });

        if partial.msg_type != fragment.msg_type || partial.body.len() != length {
            warn!(
                "Fragment for message_seq {} disagrees with earlier fragments",
                fragment.message_seq
            );
            return None;
        }

        partial.body[start..end].copy_from_slice(&fragment.body);
        partial.received[start..end].iter_mut().for_each(|r| *r = true);

        if !partial.received.iter().all(|r| *r) {
            return None;
        }

        let partial = self.pending.remove(&fragment.message_seq)?;
        let whole = HandshakeFragment {
            msg_type: partial.msg_type,
            length: fragment.length,
            message_seq: fragment.message_seq,
            fragment_offset: 0,
            fragment_length: fragment.length,
            body: partial.body,
        };
        let mut out = Vec::with_capacity(DATAGRAM_HEADER_LEN + length);
        whole.serialize(&mut out);
        Some(out)
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Incomplete messages currently held.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}
