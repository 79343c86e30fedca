// SPDX-License-Identifier: GPL-2.0 OR MIT

use crate::checksum::common::pad_tail;
use crate::checksum::fletcher128::{read_u64_le, FLETCHER_128_BLOCK_SIZE};
use crate::checksum::{Checksum128, ChecksumError};

use alloc::vec::Vec;

////////////////////////////////////////////////////////////////////////////////

/** Stripe geometry.
 *
 * A chunk of [`StripeConfig::chunk_size`] bytes holds one block per stripe.
 */
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct StripeConfig {
    /// Bytes per stripe per chunk, a multiple of the word size.
    block_size: usize,

    /// Number of stripes.
    stripes: usize,
}

impl StripeConfig {
    /** Create a new stripe configuration.
     *
     * `block_size` is rounded down to a multiple of eight bytes.
     *
     * # Errors
     *
     * Returns [`ChecksumError`] if the rounded block size or the stripe count
     * is zero, or if the chunk size does not fit in an allocation
     * (`isize::MAX` bytes).
     */
    pub fn new(block_size: usize, stripes: usize) -> Result<StripeConfig, ChecksumError> {
        let rounded = block_size - block_size % FLETCHER_128_BLOCK_SIZE;

        if rounded == 0 {
            return Err(ChecksumError::InvalidBlockSize { block_size });
        }

        if stripes == 0 {
            return Err(ChecksumError::InvalidStripeCount { stripes });
        }

        match rounded.checked_mul(stripes) {
            Some(chunk_size) if chunk_size <= isize::MAX as usize => (),
            _ => {
                return Err(ChecksumError::ChunkSizeOverflow {
                    block_size: rounded,
                    stripes,
                })
            }
        }

        Ok(StripeConfig {
            block_size: rounded,
            stripes,
        })
    }

    /// Bytes per stripe per chunk.
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Number of stripes.
    pub fn stripes(&self) -> usize {
        self.stripes
    }

    /// Bytes per chunk, one block for each stripe.
    pub fn chunk_size(&self) -> usize {
        self.block_size * self.stripes
    }
}

/** Striped Fletcher-128 state.
 *
 * Little endian [`u64`] words are dealt round robin to the stripes: word `w`
 * of the input is folded into stripe `w % stripes`. The next stripe index is
 * kept between updates, so chunks only need to be word aligned, except for
 * the last one. An unaligned last chunk is zero padded to a full word and
 * seals the set until [`StripeSet::reset`].
 */
#[derive(Clone, Debug)]
pub struct StripeSet {
    /// Geometry.
    config: StripeConfig,

    /// One accumulator per stripe.
    stripes: Vec<Checksum128>,

    /// Stripe that receives the next word.
    next_stripe: usize,

    /// A padded tail word was folded in.
    sealed: bool,
}

impl StripeSet {
    /// Create a zeroed stripe set.
    pub fn new(config: StripeConfig) -> StripeSet {
        StripeSet {
            config,
            stripes: alloc::vec![Checksum128::default(); config.stripes],
            next_stripe: 0,
            sealed: false,
        }
    }

    /** Create a zeroed stripe set, reporting allocation failure.
     *
     * # Errors
     *
     * Returns [`ChecksumError::StripeAllocation`] if the stripes cannot be
     * allocated.
     */
    pub fn try_new(config: StripeConfig) -> Result<StripeSet, ChecksumError> {
        let mut stripes = Vec::new();
        if stripes.try_reserve_exact(config.stripes).is_err() {
            return Err(ChecksumError::StripeAllocation {
                stripes: config.stripes,
            });
        }
        stripes.resize(config.stripes, Checksum128::default());

        Ok(StripeSet {
            config,
            stripes,
            next_stripe: 0,
            sealed: false,
        })
    }

    /// Zero all stripes before checksumming a new input.
    pub fn reset(&mut self) {
        self.stripes.fill(Checksum128::default());
        self.next_stripe = 0;
        self.sealed = false;
    }

    /** Fold the next chunk of the input into the stripes.
     *
     * Stripes that receive no words from `chunk` are left untouched.
     *
     * # Errors
     *
     * Returns [`ChecksumError::StripeSetSealed`] if a non empty chunk follows
     * an unaligned one.
     */
    pub fn update(&mut self, chunk: &[u8]) -> Result<(), ChecksumError> {
        if chunk.is_empty() {
            return Ok(());
        }

        if self.sealed {
            return Err(ChecksumError::StripeSetSealed { size: chunk.len() });
        }

        let count = self.stripes.len();
        let mut stripe = self.next_stripe;

        let remainder = chunk.len() % FLETCHER_128_BLOCK_SIZE;
        let (words, tail) = chunk.split_at(chunk.len() - remainder);

        // Word minor: consecutive words go to consecutive stripes.
        for word in words.chunks_exact(FLETCHER_128_BLOCK_SIZE) {
            self.stripes[stripe].add_word(read_u64_le(word));

            stripe += 1;
            if stripe == count {
                stripe = 0;
            }
        }

        if !tail.is_empty() {
            let word = pad_tail::<FLETCHER_128_BLOCK_SIZE>(tail);
            self.stripes[stripe].add_word(u64::from_le_bytes(word));

            stripe = (stripe + 1) % count;
            self.sealed = true;
        }

        self.next_stripe = stripe;

        Ok(())
    }

    /// Per stripe checksums, in stripe order.
    pub fn stripes(&self) -> &[Checksum128] {
        &self.stripes
    }

    /// Geometry.
    pub fn config(&self) -> &StripeConfig {
        &self.config
    }

    /// Has an unaligned chunk been folded in.
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }
}

/** Fold `chunk` into `set`.
 *
 * See [`StripeSet::update`].
 *
 * # Errors
 *
 * Returns [`ChecksumError`] in case of error.
 */
pub fn fletcher128_striped(set: &mut StripeSet, chunk: &[u8]) -> Result<(), ChecksumError> {
    set.update(chunk)
}
