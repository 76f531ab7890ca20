//! Shared bit-OR combinators keyed by the physical slot offsets a format uses.
//!
//! Formats that differ only in operand kind (say `DJK` and `FdFjFk`) fill the same bit
//! positions, so a single combinator per offset pattern serves both.

use std::collections::BTreeSet;

use ahash::AHashMap;
use smallvec::SmallVec;
use tracing::debug;

use crate::isa::InstructionFormat;
use crate::isa::slot::tag_for_offset;

use super::catalog::FormatCatalog;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotCombination {
    code: String,
    offsets: SmallVec<[u8; 6]>,
}

impl SlotCombination {
    /// `None` for the empty format, which has nothing to combine.
    pub fn for_format(format: &InstructionFormat) -> Option<Self> {
        let mut offsets: SmallVec<[u8; 6]> = format.slots().map(|slot| slot.offset()).collect();
        if offsets.is_empty() {
            return None;
        }
        offsets.sort_unstable();
        let code = offsets
            .iter()
            .filter_map(|offset| tag_for_offset(*offset))
            .map(|tag| tag.to_ascii_uppercase())
            .collect();
        Some(Self { code, offsets })
    }

    /// Upper-case slot names in offset order, e.g. `DJK`.
    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn offsets(&self) -> &[u8] {
        &self.offsets
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// ORs each fragment into `base` at the matching offset. `fragments` follows
    /// [`offsets`](Self::offsets) order and must already be masked to its slot width.
    pub fn combine(&self, base: u32, fragments: &[u32]) -> u32 {
        debug_assert_eq!(fragments.len(), self.offsets.len());
        self.offsets
            .iter()
            .zip(fragments)
            .fold(base, |acc, (offset, fragment)| acc | (fragment << offset))
    }
}

#[derive(Debug, Clone, Default)]
pub struct SlotCombinationRegistry {
    combinations: Vec<SlotCombination>,
    index: AHashMap<String, usize>,
}

impl SlotCombinationRegistry {
    pub fn derive(catalog: &FormatCatalog) -> Self {
        let unique: BTreeSet<SlotCombination> = catalog
            .iter()
            .filter_map(|format| SlotCombination::for_format(format))
            .collect();
        let combinations: Vec<SlotCombination> = unique.into_iter().collect();
        let index = combinations
            .iter()
            .enumerate()
            .map(|(position, combination)| (combination.code.clone(), position))
            .collect();
        debug!(
            formats = catalog.len(),
            combinations = combinations.len(),
            "slot combinations derived"
        );
        Self {
            combinations,
            index,
        }
    }

    pub fn get(&self, code: &str) -> Option<&SlotCombination> {
        self.index
            .get(code)
            .map(|position| &self.combinations[*position])
    }

    pub fn iter(&self) -> impl Iterator<Item = &SlotCombination> {
        self.combinations.iter()
    }

    pub fn len(&self) -> usize {
        self.combinations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.combinations.is_empty()
    }
}
