use std::fmt;

use crate::record::{ByteEdit, LengthEdit, Malformation, PaddingEdit, Position, Record};

const BLOCK_LEN: usize = 16;

/// Extra padding blocks for the long padding vectors. With at most one block
/// of regular padding this stays within the 256 byte limit.
const LONG_PADDING_BLOCKS: usize = 15;

/// One malformed record variant.
///
/// Every vector touches exactly one [`Malformation`] field, see
/// [`PaddingVector::malformation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PaddingVector {
    // Record shape, edits `ciphertext` or `declared_length`.
    FlipFirstCiphertextByte,
    FlipPenultimateBlockLastByte,
    TruncateLastBlock,
    NotBlockAligned,
    AppendBlock,
    DeclaredLengthPlusOne,
    DeclaredLengthMinusOne,

    // Vector content, edits `mac` or `padding`.
    FlipMacFirstByte,
    FlipMacLastByte,
    DropMacFirstByte,
    DropMacLastByte,
    NoMac,
    LongPaddingFlipFirstByte,
    LongPaddingFlipMiddleByte,
    PaddingFilledWithFF,
    ValidLongPadding,
}

impl PaddingVector {
    pub const RECORD_SHAPE: &'static [PaddingVector] = &[
        PaddingVector::FlipFirstCiphertextByte,
        PaddingVector::FlipPenultimateBlockLastByte,
        PaddingVector::TruncateLastBlock,
        PaddingVector::NotBlockAligned,
        PaddingVector::AppendBlock,
        PaddingVector::DeclaredLengthPlusOne,
        PaddingVector::DeclaredLengthMinusOne,
    ];

    pub const VECTOR_CONTENT: &'static [PaddingVector] = &[
        PaddingVector::FlipMacFirstByte,
        PaddingVector::FlipMacLastByte,
        PaddingVector::DropMacFirstByte,
        PaddingVector::DropMacLastByte,
        PaddingVector::NoMac,
        PaddingVector::LongPaddingFlipFirstByte,
        PaddingVector::LongPaddingFlipMiddleByte,
        PaddingVector::PaddingFilledWithFF,
        PaddingVector::ValidLongPadding,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            PaddingVector::FlipFirstCiphertextByte => "flip_first_ciphertext_byte",
            PaddingVector::FlipPenultimateBlockLastByte => "flip_penultimate_block_last_byte",
            PaddingVector::TruncateLastBlock => "truncate_last_block",
            PaddingVector::NotBlockAligned => "not_block_aligned",
            PaddingVector::AppendBlock => "append_block",
            PaddingVector::DeclaredLengthPlusOne => "declared_length_plus_one",
            PaddingVector::DeclaredLengthMinusOne => "declared_length_minus_one",
            PaddingVector::FlipMacFirstByte => "flip_mac_first_byte",
            PaddingVector::FlipMacLastByte => "flip_mac_last_byte",
            PaddingVector::DropMacFirstByte => "drop_mac_first_byte",
            PaddingVector::DropMacLastByte => "drop_mac_last_byte",
            PaddingVector::NoMac => "no_mac",
            PaddingVector::LongPaddingFlipFirstByte => "long_padding_flip_first_byte",
            PaddingVector::LongPaddingFlipMiddleByte => "long_padding_flip_middle_byte",
            PaddingVector::PaddingFilledWithFF => "padding_filled_with_ff",
            PaddingVector::ValidLongPadding => "valid_long_padding",
        }
    }

    /// The single field edit this vector makes.
    ///
    /// * ciphertext byte flips XOR `0x01` into the encrypted body after the IV
    /// * the penultimate block's last byte is 17 from the end, and flipping it
    ///   flips the last padding byte after decryption
    /// * truncations drop a whole block or a single byte
    /// * declared length edits change the header only
    /// * MAC edits run on the computed MAC before padding is chosen, so the
    ///   padding stays valid for the altered length
    /// * long padding adds 15 blocks to the shortest valid padding
    pub fn malformation(&self) -> Malformation {
        let flip = |position| ByteEdit::Xor {
            position,
            mask: 0x01,
        };
        let mut m = Malformation::default();

        match self {
            PaddingVector::FlipFirstCiphertextByte => {
                m.ciphertext = Some(flip(Position::FromStart(0)));
            }
            PaddingVector::FlipPenultimateBlockLastByte => {
                m.ciphertext = Some(flip(Position::FromEnd(BLOCK_LEN + 1)));
            }
            PaddingVector::TruncateLastBlock => {
                m.ciphertext = Some(ByteEdit::Truncate(BLOCK_LEN));
            }
            PaddingVector::NotBlockAligned => {
                m.ciphertext = Some(ByteEdit::Truncate(1));
            }
            PaddingVector::AppendBlock => {
                m.ciphertext = Some(ByteEdit::Append(vec![0; BLOCK_LEN]));
            }
            PaddingVector::DeclaredLengthPlusOne => {
                m.declared_length = Some(LengthEdit::Delta(1));
            }
            PaddingVector::DeclaredLengthMinusOne => {
                m.declared_length = Some(LengthEdit::Delta(-1));
            }
            PaddingVector::FlipMacFirstByte => {
                m.mac = Some(flip(Position::FromStart(0)));
            }
            PaddingVector::FlipMacLastByte => {
                m.mac = Some(flip(Position::FromEnd(1)));
            }
            PaddingVector::DropMacFirstByte => {
                m.mac = Some(ByteEdit::Remove(Position::FromStart(0)));
            }
            PaddingVector::DropMacLastByte => {
                m.mac = Some(ByteEdit::Remove(Position::FromEnd(1)));
            }
            PaddingVector::NoMac => {
                m.mac = Some(ByteEdit::Replace(Vec::new()));
            }
            PaddingVector::LongPaddingFlipFirstByte => {
                m.padding = Some(PaddingEdit::Xor {
                    extra_blocks: LONG_PADDING_BLOCKS,
                    position: Position::FromStart(0),
                    mask: 0x01,
                });
            }
            PaddingVector::LongPaddingFlipMiddleByte => {
                m.padding = Some(PaddingEdit::Xor {
                    extra_blocks: LONG_PADDING_BLOCKS,
                    position: Position::Middle,
                    mask: 0x01,
                });
            }
            PaddingVector::PaddingFilledWithFF => {
                m.padding = Some(PaddingEdit::Fill(0xFF));
            }
            PaddingVector::ValidLongPadding => {
                m.padding = Some(PaddingEdit::Extend {
                    extra_blocks: LONG_PADDING_BLOCKS,
                });
            }
        }

        m
    }

    /// A copy of `template` carrying this vector's edit.
    ///
    /// Fields the vector does not touch keep the template's values,
    /// including any malformation already on it.
    pub fn apply(&self, template: &Record) -> Record {
        let mut record = template.clone();
        let edit = self.malformation();
        let target = &mut record.malformation;

        if edit.mac.is_some() {
            target.mac = edit.mac;
        }
        if edit.padding.is_some() {
            target.padding = edit.padding;
        }
        if edit.ciphertext.is_some() {
            target.ciphertext = edit.ciphertext;
        }
        if edit.declared_length.is_some() {
            target.declared_length = edit.declared_length;
        }

        record
    }
}

impl fmt::Display for PaddingVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
