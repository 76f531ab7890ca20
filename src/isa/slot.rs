//! Bit-range arithmetic over the 32-bit instruction word.
//!
//! A [`Slot`] is a contiguous `(offset, width)` range. Operands that do not fit a single range
//! are spread over several slots listed most-significant fragment first; [`fragments`] derives
//! the shift/mask pair that extracts each piece and [`recombine`] is its inverse.

use std::fmt;

use smallvec::SmallVec;
use thiserror::Error;

/// Width of every instruction word handled by the generator.
pub const WORD_BITS: u8 = 32;

/// One-letter names for the slot offsets used in canonical format names.
const SLOT_TAGS: [(char, u8); 5] = [('d', 0), ('j', 5), ('k', 10), ('a', 15), ('m', 16)];

pub fn mask_for_width(width: u8) -> u32 {
    if width == 0 {
        0
    } else if width >= WORD_BITS {
        u32::MAX
    } else {
        (1u32 << width) - 1
    }
}

pub fn tag_for_offset(offset: u8) -> Option<char> {
    SLOT_TAGS
        .iter()
        .find(|(_, slot_offset)| *slot_offset == offset)
        .map(|(tag, _)| *tag)
}

pub fn offset_for_tag(tag: char) -> Option<u8> {
    let tag = tag.to_ascii_lowercase();
    SLOT_TAGS
        .iter()
        .find(|(slot_tag, _)| *slot_tag == tag)
        .map(|(_, offset)| *offset)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Slot {
    offset: u8,
    width: u8,
    tag: char,
}

impl Slot {
    pub fn new(offset: u8, width: u8) -> Result<Self, SlotError> {
        if width == 0 {
            return Err(SlotError::ZeroWidth { offset });
        }
        if u16::from(offset) + u16::from(width) > u16::from(WORD_BITS) {
            return Err(SlotError::OutOfRange { offset, width });
        }
        let tag = tag_for_offset(offset).ok_or(SlotError::UntaggedOffset { offset })?;
        Ok(Self { offset, width, tag })
    }

    /// Builds a slot from its name letter (`d`, `j`, `k`, `a`, `m`).
    pub fn tagged(tag: char, width: u8) -> Result<Self, SlotError> {
        let offset = offset_for_tag(tag).ok_or(SlotError::UnknownTag { tag })?;
        Self::new(offset, width)
    }

    pub fn offset(&self) -> u8 {
        self.offset
    }

    pub fn width(&self) -> u8 {
        self.width
    }

    pub fn tag(&self) -> char {
        self.tag
    }

    /// Exclusive upper bound of the range.
    pub fn end(&self) -> u8 {
        self.offset + self.width
    }

    /// Mask of the bits this slot occupies inside the word.
    pub fn mask(&self) -> u32 {
        mask_for_width(self.width) << self.offset
    }

    pub fn overlaps(&self, other: &Slot) -> bool {
        self.offset < other.end() && other.offset < self.end()
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{} (bits {}..{})",
            self.tag,
            self.width,
            self.offset,
            self.end()
        )
    }
}

/// Fails on the first pair of overlapping slots, in offset order.
pub fn ensure_disjoint<'a, I>(slots: I) -> Result<(), SlotError>
where
    I: IntoIterator<Item = &'a Slot>,
{
    let mut sorted: SmallVec<[Slot; 8]> = slots.into_iter().copied().collect();
    sorted.sort();
    for pair in sorted.windows(2) {
        if pair[0].overlaps(&pair[1]) {
            return Err(SlotError::Overlap {
                first: pair[0],
                second: pair[1],
            });
        }
    }
    Ok(())
}

pub fn total_width(slots: &[Slot]) -> u8 {
    slots
        .iter()
        .fold(0u8, |acc, slot| acc.saturating_add(slot.width))
}

/// Extraction recipe for one slot of a split operand: `(value >> shift) & mask`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Fragment {
    pub slot: Slot,
    pub shift: u8,
    pub mask: u32,
}

impl Fragment {
    pub fn extract(&self, value: u32) -> u32 {
        (value >> self.shift) & self.mask
    }
}

/// Derives the extraction recipe for each slot of an operand. Slots must be listed MSB first;
/// the last fragment always has a zero shift.
pub fn fragments(slots: &[Slot]) -> SmallVec<[Fragment; 4]> {
    let mut remaining = total_width(slots);
    slots
        .iter()
        .map(|slot| {
            remaining -= slot.width;
            Fragment {
                slot: *slot,
                shift: remaining,
                mask: mask_for_width(slot.width),
            }
        })
        .collect()
}

pub fn split(value: u32, slots: &[Slot]) -> SmallVec<[(Slot, u32); 4]> {
    fragments(slots)
        .iter()
        .map(|fragment| (fragment.slot, fragment.extract(value)))
        .collect()
}

/// Concatenates fragments (MSB first) back into the logical operand value.
pub fn recombine(parts: &[(Slot, u32)]) -> u32 {
    let value = parts.iter().fold(0u64, |acc, (slot, part)| {
        (acc << slot.width) | u64::from(part & mask_for_width(slot.width))
    });
    value as u32
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SlotError {
    #[error("slot at offset {offset} has zero width")]
    ZeroWidth { offset: u8 },
    #[error("slot at offset {offset} width {width} exceeds the 32-bit word")]
    OutOfRange { offset: u8, width: u8 },
    #[error("no slot name is assigned to bit offset {offset}")]
    UntaggedOffset { offset: u8 },
    #[error("unknown slot name '{tag}'")]
    UnknownTag { tag: char },
    #[error("slot {first} overlaps slot {second}")]
    Overlap { first: Slot, second: Slot },
}
