// SPDX-License-Identifier: GPL-2.0 OR MIT

use core::fmt;

#[cfg(feature = "std")]
use std::error;

/// [`crate::checksum::StripeSet`] and [`crate::checksum::StripeConfig`] error.
#[derive(Debug)]
pub enum ChecksumError {
    /// Block size rounds down to zero bytes.
    InvalidBlockSize {
        /// Requested block size in bytes.
        block_size: usize,
    },

    /// Stripe count is zero.
    InvalidStripeCount {
        /// Requested stripe count.
        stripes: usize,
    },

    /// Block size multiplied by stripe count exceeds `isize::MAX`.
    ChunkSizeOverflow {
        /// Block size in bytes.
        block_size: usize,
        /// Stripe count.
        stripes: usize,
    },

    /// Stripe accumulators could not be allocated.
    StripeAllocation {
        /// Stripe count.
        stripes: usize,
    },

    /// Update after a padded tail word was already folded in.
    StripeSetSealed {
        /// Length of the rejected chunk.
        size: usize,
    },
}

impl fmt::Display for ChecksumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChecksumError::InvalidBlockSize { block_size } => {
                write!(f, "Checksum invalid block size:{block_size}")
            }
            ChecksumError::InvalidStripeCount { stripes } => {
                write!(f, "Checksum invalid stripe count:{stripes}")
            }
            ChecksumError::ChunkSizeOverflow {
                block_size,
                stripes,
            } => {
                write!(
                    f,
                    "Checksum chunk size overflow block size:{block_size} stripes:{stripes}"
                )
            }
            ChecksumError::StripeAllocation { stripes } => {
                write!(f, "Checksum stripe allocation failed stripes:{stripes}")
            }
            ChecksumError::StripeSetSealed { size } => {
                write!(f, "Checksum update of {size} bytes after unaligned tail")
            }
        }
    }
}

#[cfg(feature = "std")]
impl error::Error for ChecksumError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        None
    }
}

/** Fletcher-64 result.
 *
 * Upper 32 bits are the running sum of sums, lower 32 bits the running sum
 * of words.
 */
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct Checksum64(u64);

impl Checksum64 {
    /// Pack `hi` and `lo` sums.
    pub fn new(hi: u32, lo: u32) -> Checksum64 {
        Checksum64((u64::from(hi) << 32) | u64::from(lo))
    }

    /// Sum of sums.
    pub fn hi(&self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Sum of words.
    pub fn lo(&self) -> u32 {
        self.0 as u32
    }

    /// Packed value.
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl From<u64> for Checksum64 {
    fn from(value: u64) -> Checksum64 {
        Checksum64(value)
    }
}

impl fmt::Display for Checksum64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Fletcher-128 result.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct Checksum128 {
    /// Sum of sums.
    pub hi: u64,

    /// Sum of words.
    pub lo: u64,
}

impl Checksum128 {
    /** Fold one word into the running sums.
     *
     * Both sums wrap on overflow.
     */
    #[inline]
    pub(crate) fn add_word(&mut self, word: u64) {
        self.lo = self.lo.wrapping_add(word);
        self.hi = self.hi.wrapping_add(self.lo);
    }
}

impl fmt::Display for Checksum128 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}{:016x}", self.hi, self.lo)
    }
}

/** Zero extend a partial trailing word of `N` bytes.
 *
 * The `tail` bytes keep their positions starting at the least significant
 * byte of the little endian word, and the missing high order bytes are zero.
 */
pub(crate) fn pad_tail<const N: usize>(tail: &[u8]) -> [u8; N] {
    debug_assert!(tail.len() < N);

    let mut word = [0; N];
    word[0..tail.len()].copy_from_slice(tail);

    word
}

/** Streaming checksum of little endian words.
 */
pub trait Checksum {
    /// Final checksum value.
    type Output;

    /// Reset the checksum to initial state.
    fn reset(&mut self);

    /** Update the checksum state with the given bytes.
     *
     * The state may buffer some bytes in an internal buffer, depending on
     * the checksum block size.
     */
    fn update(&mut self, data: &[u8]);

    /** Finalize the checksum and return the result.
     *
     * A trailing partial word is zero padded. The state is not modified, so
     * more data may still be added with [`Checksum::update`].
     */
    fn finalize(&self) -> Self::Output;

    /// Hash the bytes and return the result.
    fn hash(&mut self, data: &[u8]) -> Self::Output {
        self.reset();
        self.update(data);
        self.finalize()
    }
}
