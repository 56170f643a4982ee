//! Fixed-capacity role bit set.
//!
//! A [`RoleMask`] is an ordered sequence of `N` unsigned 64-bit words. Role id
//! `r` lives in word `r / 64` at bit `r % 64`, so word 0 holds roles 0-63,
//! word 1 holds roles 64-127, and so on. The word count is fixed per
//! deployment; addressing a role beyond it is an error, never a silent no-op.

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// Numeric role identifier.
pub type RoleId = u32;

/// Word count used when a deployment does not configure one (640 roles).
pub const DEFAULT_MASK_WORDS: usize = 10;

const WORD_BITS: u32 = u64::BITS;

/// Set of granted role ids backed by a fixed number of `u64` words.
///
/// Serializes as a plain JSON array of integers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleMask(Vec<u64>);

impl Default for RoleMask {
    fn default() -> Self {
        Self::new(DEFAULT_MASK_WORDS)
    }
}

impl RoleMask {
    /// Creates an all-zero mask with `words` 64-bit words.
    #[must_use]
    pub fn new(words: usize) -> Self {
        Self(vec![0; words])
    }

    /// Wraps an existing word sequence (for example one read from storage).
    #[must_use]
    pub const fn from_words(words: Vec<u64>) -> Self {
        Self(words)
    }

    /// Returns the raw words.
    #[must_use]
    pub fn words(&self) -> &[u64] {
        &self.0
    }

    /// Returns the number of words.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns the number of addressable role ids.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.0.len() * WORD_BITS as usize
    }

    /// Returns true if no role is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|w| *w == 0)
    }

    /// Maps a role id to its (word index, bit offset) position.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::RoleOutOfRange`] if the word index is not below
    /// the mask length.
    pub fn locate(&self, role: RoleId) -> ModelResult<(usize, u32)> {
        let word = (role / WORD_BITS) as usize;
        if word >= self.0.len() {
            return Err(ModelError::RoleOutOfRange {
                role,
                capacity: self.capacity(),
            });
        }
        Ok((word, role % WORD_BITS))
    }

    /// Returns whether `role` is set.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::RoleOutOfRange`] for ids beyond the capacity.
    pub fn has_role(&self, role: RoleId) -> ModelResult<bool> {
        let (word, bit) = self.locate(role)?;
        Ok(self.0[word] & (1u64 << bit) != 0)
    }

    /// Sets `role` in place.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::RoleOutOfRange`] for ids beyond the capacity.
    pub fn set_role(&mut self, role: RoleId) -> ModelResult<()> {
        let (word, bit) = self.locate(role)?;
        self.0[word] |= 1u64 << bit;
        Ok(())
    }

    /// Clears `role` in place.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::RoleOutOfRange`] for ids beyond the capacity.
    pub fn clear_role(&mut self, role: RoleId) -> ModelResult<()> {
        let (word, bit) = self.locate(role)?;
        self.0[word] &= !(1u64 << bit);
        Ok(())
    }

    /// Zeroes every word, keeping the length.
    pub fn clear_all(&mut self) {
        self.0.iter_mut().for_each(|w| *w = 0);
    }

    /// Returns a copy with `role` set.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::RoleOutOfRange`] for ids beyond the capacity.
    pub fn with_role(&self, role: RoleId) -> ModelResult<Self> {
        let mut mask = self.clone();
        mask.set_role(role)?;
        Ok(mask)
    }

    /// Returns a copy with `role` cleared.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::RoleOutOfRange`] for ids beyond the capacity.
    pub fn without_role(&self, role: RoleId) -> ModelResult<Self> {
        let mut mask = self.clone();
        mask.clear_role(role)?;
        Ok(mask)
    }

    /// Returns an all-zero mask of the same length.
    #[must_use]
    pub fn cleared(&self) -> Self {
        Self::new(self.0.len())
    }

    /// ORs `other` into this mask word by word.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::MaskLengthMismatch`] if the lengths differ.
    pub fn merge(&mut self, other: &Self) -> ModelResult<()> {
        if other.0.len() != self.0.len() {
            return Err(ModelError::MaskLengthMismatch {
                expected: self.0.len(),
                actual: other.0.len(),
            });
        }
        for (mine, theirs) in self.0.iter_mut().zip(&other.0) {
            *mine |= *theirs;
        }
        Ok(())
    }

    /// Returns the word-by-word OR of both masks.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::MaskLengthMismatch`] if the lengths differ.
    pub fn union(&self, other: &Self) -> ModelResult<Self> {
        let mut mask = self.clone();
        mask.merge(other)?;
        Ok(mask)
    }

    /// Iterates over the set role ids in ascending order.
    pub fn roles(&self) -> impl Iterator<Item = RoleId> + '_ {
        self.0.iter().enumerate().flat_map(|(index, word)| {
            #[allow(clippy::cast_possible_truncation)]
            let base = index as RoleId * WORD_BITS;
            (0..WORD_BITS)
                .filter(move |bit| word & (1u64 << bit) != 0)
                .map(move |bit| base + bit)
        })
    }
}
