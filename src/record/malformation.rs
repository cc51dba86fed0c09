//! Opt-in invariant violations carried by a [`Record`](super::Record).
//!
//! A record with the default [`Malformation`] is always well formed. Each edit
//! touches exactly one field, and is applied at the point where that field is
//! computed:
//!
//! * `mac` after the MAC is calculated, before the padding length is chosen
//! * `padding` when the padding is built
//! * `ciphertext` on the encrypted body, after any explicit IV or nonce
//! * `declared_length` on the header length field only

use crate::error::PreparationError;

/// Byte position inside a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Position {
    /// Zero based offset from the first byte.
    FromStart(usize),
    /// One based offset from the end, `FromEnd(1)` is the last byte.
    FromEnd(usize),
    /// `len / 2`.
    Middle,
}

impl Position {
    /// Resolve to an index, or `None` when outside `len`.
    pub fn resolve(&self, len: usize) -> Option<usize> {
        let index = match self {
            Position::FromStart(i) => *i,
            Position::FromEnd(i) => len.checked_sub(*i)?,
            Position::Middle => len / 2,
        };
        if index < len {
            Some(index)
        } else {
            None
        }
    }
}

/// Edit of a byte field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ByteEdit {
    /// XOR one byte with `mask`.
    Xor { position: Position, mask: u8 },
    /// Remove one byte.
    Remove(Position),
    /// Drop `n` bytes from the end.
    Truncate(usize),
    /// Append bytes at the end.
    Append(Vec<u8>),
    /// Replace the whole field.
    Replace(Vec<u8>),
}

impl ByteEdit {
    pub fn apply(&self, bytes: &mut Vec<u8>, field: &'static str) -> Result<(), PreparationError> {
        let len = bytes.len();
        let out_of_range =
            |what: String| PreparationError::new(field, format!("{} outside {} bytes", what, len));

        match self {
            ByteEdit::Xor { position, mask } => {
                let index = position
                    .resolve(bytes.len())
                    .ok_or_else(|| out_of_range(format!("{:?}", position)))?;
                bytes[index] ^= mask;
            }
            ByteEdit::Remove(position) => {
                let index = position
                    .resolve(bytes.len())
                    .ok_or_else(|| out_of_range(format!("{:?}", position)))?;
                bytes.remove(index);
            }
            ByteEdit::Truncate(n) => {
                if *n > bytes.len() {
                    return Err(out_of_range(format!("Truncate({})", n)));
                }
                bytes.truncate(bytes.len() - n);
            }
            ByteEdit::Append(extra) => bytes.extend_from_slice(extra),
            ByteEdit::Replace(with) => {
                bytes.clear();
                bytes.extend_from_slice(with);
            }
        }

        trace!("Applied {:?} to {}", self, field);
        Ok(())
    }
}

/// Edit of the CBC padding.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PaddingEdit {
    /// Valid padding, `extra_blocks` blocks longer than needed.
    Extend { extra_blocks: usize },
    /// Extended padding with one byte XORed.
    Xor {
        extra_blocks: usize,
        position: Position,
        mask: u8,
    },
    /// Shortest padding length, every byte set to this value.
    Fill(u8),
    /// Exactly these bytes.
    Explicit(Vec<u8>),
}

/// Edit of the header length field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LengthEdit {
    Delta(i32),
    Exact(u16),
}

impl LengthEdit {
    pub fn apply(&self, actual: usize) -> u16 {
        match self {
            LengthEdit::Delta(d) => (actual as i64 + *d as i64).clamp(0, u16::MAX as i64) as u16,
            LengthEdit::Exact(v) => *v,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Malformation {
    pub mac: Option<ByteEdit>,
    pub padding: Option<PaddingEdit>,
    pub ciphertext: Option<ByteEdit>,
    pub declared_length: Option<LengthEdit>,
}

impl Malformation {
    pub fn is_empty(&self) -> bool {
        self.mac.is_none()
            && self.padding.is_none()
            && self.ciphertext.is_none()
            && self.declared_length.is_none()
    }
}
