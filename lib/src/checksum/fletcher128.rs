// SPDX-License-Identifier: GPL-2.0 OR MIT

use crate::checksum::common::pad_tail;
use crate::checksum::{Checksum, Checksum128};

use core::cmp;
use core::fmt;
use core::fmt::Display;

////////////////////////////////////////////////////////////////////////////////

/// Fletcher-128 block size in bytes.
pub(crate) const FLETCHER_128_BLOCK_SIZE: usize = 8;

/// Fletcher-128 in u64.
const FLETCHER_128_U64_COUNT: usize = 2;

/// Fletcher-128 maximum SIMD width.
const FLETCHER_128_MAX_SIMD_WIDTH: usize = 4;

/// Fletcher-128 implementation.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Fletcher128Implementation {
    /// Generic.
    Generic,

    /// Superscalar using two streams.
    SuperScalar2,

    /// Superscalar using four streams.
    SuperScalar4,
}

const ALL_FLETCHER_128_IMPLEMENTATIONS: [Fletcher128Implementation; 3] = [
    Fletcher128Implementation::Generic,
    Fletcher128Implementation::SuperScalar2,
    Fletcher128Implementation::SuperScalar4,
];

impl Fletcher128Implementation {
    /// Get a slice with all of the [`Fletcher128Implementation`].
    pub fn all() -> &'static [Fletcher128Implementation] {
        &ALL_FLETCHER_128_IMPLEMENTATIONS
    }

    /// Get the string name of the implementation.
    pub fn to_str(&self) -> &'static str {
        match self {
            Fletcher128Implementation::Generic => "generic",
            Fletcher128Implementation::SuperScalar2 => "superscalar2",
            Fletcher128Implementation::SuperScalar4 => "superscalar4",
        }
    }
}

impl Display for Fletcher128Implementation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

/// Update state. Data length is a multiple of the implementation's block size.
type Fletcher128UpdateBlock = fn(state: &mut [u64], data: &[u8]);

/// Compute the `[lo, hi]` sums from multiple streams.
type Fletcher128FinishBlocks = fn(state: &[u64]) -> [u64; FLETCHER_128_U64_COUNT];

/// Fletcher-128 implementation context.
struct Fletcher128ImplementationCtx {
    /// A multiple of [`FLETCHER_128_BLOCK_SIZE`].
    block_size: usize,

    /// Implementation of [`Fletcher128UpdateBlock`].
    update_blocks: Fletcher128UpdateBlock,

    /// Implementation of [`Fletcher128FinishBlocks`].
    finish_blocks: Fletcher128FinishBlocks,
}

/** Fletcher-128 over little endian [`u64`] words.
 *
 * The state layout is all `lo` stream sums followed by all `hi` stream sums.
 */
pub struct Fletcher128 {
    /// Number of bytes used in [`Fletcher128::buffer`].
    buffer_fill: usize,

    /// Partial block buffer.
    buffer: [u8; FLETCHER_128_BLOCK_SIZE * FLETCHER_128_MAX_SIMD_WIDTH],

    /// Ongoing checksum.
    state: [u64; FLETCHER_128_U64_COUNT * FLETCHER_128_MAX_SIMD_WIDTH],

    /// Implementation context.
    impl_ctx: Fletcher128ImplementationCtx,
}

/// Decode a little endian [`u64`] from the first eight bytes.
#[inline]
pub(crate) fn read_u64_le(bytes: &[u8]) -> u64 {
    u64::from_le_bytes([
        bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
    ])
}

impl Fletcher128ImplementationCtx {
    fn new(implementation: Fletcher128Implementation) -> Fletcher128ImplementationCtx {
        match implementation {
            Fletcher128Implementation::Generic => Fletcher128ImplementationCtx {
                block_size: FLETCHER_128_BLOCK_SIZE,
                update_blocks: Fletcher128::update_blocks_generic,
                finish_blocks: Fletcher128::finish_blocks_single_stream,
            },

            Fletcher128Implementation::SuperScalar2 => Fletcher128ImplementationCtx {
                block_size: 2 * FLETCHER_128_BLOCK_SIZE,
                update_blocks: Fletcher128::update_blocks_superscalar2,
                finish_blocks: Fletcher128::finish_blocks_dual_stream,
            },

            Fletcher128Implementation::SuperScalar4 => Fletcher128ImplementationCtx {
                block_size: 4 * FLETCHER_128_BLOCK_SIZE,
                update_blocks: Fletcher128::update_blocks_superscalar4,
                finish_blocks: Fletcher128::finish_blocks_quad_stream,
            },
        }
    }
}

impl Fletcher128 {
    /// Create a new Fletcher-128 instance.
    pub fn new(implementation: Fletcher128Implementation) -> Fletcher128 {
        Fletcher128 {
            buffer_fill: 0,
            buffer: [0; FLETCHER_128_BLOCK_SIZE * FLETCHER_128_MAX_SIMD_WIDTH],
            state: Default::default(),
            impl_ctx: Fletcher128ImplementationCtx::new(implementation),
        }
    }

    /** Finish a check that is one stream.
     *
     * For one stream, this is a NO-OP.
     */
    fn finish_blocks_single_stream(state: &[u64]) -> [u64; FLETCHER_128_U64_COUNT] {
        [state[0], state[1]]
    }

    /// Finish a checksum that is two streams wide.
    fn finish_blocks_dual_stream(state: &[u64]) -> [u64; FLETCHER_128_U64_COUNT] {
        let a0 = state[0];
        let a1 = state[1];

        let b0 = state[2];
        let b1 = state[3];

        let lo = a0.wrapping_add(a1);
        let hi = b0.wrapping_add(b1).wrapping_mul(2).wrapping_sub(a1);

        [lo, hi]
    }

    /// Finish a checksum that is four streams wide.
    fn finish_blocks_quad_stream(state: &[u64]) -> [u64; FLETCHER_128_U64_COUNT] {
        let a0 = state[0];
        let a1 = state[1];
        let a2 = state[2];
        let a3 = state[3];

        let b0 = state[4];
        let b1 = state[5];
        let b2 = state[6];
        let b3 = state[7];

        let lo = a0.wrapping_add(a1).wrapping_add(a2).wrapping_add(a3);

        let hi = b0
            .wrapping_add(b1)
            .wrapping_add(b2)
            .wrapping_add(b3)
            .wrapping_mul(4)
            .wrapping_sub(
                a1.wrapping_add(a2.wrapping_mul(2))
                    .wrapping_add(a3.wrapping_mul(3)),
            );

        [lo, hi]
    }

    /// Update blocks, reading one little endian [`u64`] at a time.
    fn update_blocks_generic(state: &mut [u64], data: &[u8]) {
        // Load state to local variables.
        let mut a = state[0];
        let mut b = state[1];

        // Iterate one block at a time.
        for block in data.chunks_exact(FLETCHER_128_BLOCK_SIZE) {
            // Decode value.
            let value = read_u64_le(block);

            // Update running checksum.
            a = a.wrapping_add(value);
            b = b.wrapping_add(a);
        }

        // Save state.
        state[0] = a;
        state[1] = b;
    }

    /// Update blocks, reading two little endian [`u64`] at a time.
    fn update_blocks_superscalar2(state: &mut [u64], data: &[u8]) {
        // Load state.
        let mut a0 = state[0];
        let mut a1 = state[1];

        let mut b0 = state[2];
        let mut b1 = state[3];

        // Iterate two blocks at a time.
        for block in data.chunks_exact(2 * FLETCHER_128_BLOCK_SIZE) {
            // Decode values.
            let v = read_u64_le(&block[0..FLETCHER_128_BLOCK_SIZE]);
            let w = read_u64_le(&block[FLETCHER_128_BLOCK_SIZE..]);

            // Update running checksum.
            a0 = a0.wrapping_add(v);
            a1 = a1.wrapping_add(w);

            b0 = b0.wrapping_add(a0);
            b1 = b1.wrapping_add(a1);
        }

        // Save state.
        state[0] = a0;
        state[1] = a1;

        state[2] = b0;
        state[3] = b1;
    }

    /// Update blocks, reading four little endian [`u64`] at a time.
    fn update_blocks_superscalar4(state: &mut [u64], data: &[u8]) {
        // Load state.
        let mut a0 = state[0];
        let mut a1 = state[1];
        let mut a2 = state[2];
        let mut a3 = state[3];

        let mut b0 = state[4];
        let mut b1 = state[5];
        let mut b2 = state[6];
        let mut b3 = state[7];

        // Iterate four blocks at a time.
        for block in data.chunks_exact(4 * FLETCHER_128_BLOCK_SIZE) {
            // Decode values.
            let v = read_u64_le(&block[0..]);
            let w = read_u64_le(&block[FLETCHER_128_BLOCK_SIZE..]);
            let x = read_u64_le(&block[2 * FLETCHER_128_BLOCK_SIZE..]);
            let y = read_u64_le(&block[3 * FLETCHER_128_BLOCK_SIZE..]);

            // Update running checksum.
            a0 = a0.wrapping_add(v);
            a1 = a1.wrapping_add(w);
            a2 = a2.wrapping_add(x);
            a3 = a3.wrapping_add(y);

            b0 = b0.wrapping_add(a0);
            b1 = b1.wrapping_add(a1);
            b2 = b2.wrapping_add(a2);
            b3 = b3.wrapping_add(a3);
        }

        // Save state.
        state[0] = a0;
        state[1] = a1;
        state[2] = a2;
        state[3] = a3;

        state[4] = b0;
        state[5] = b1;
        state[6] = b2;
        state[7] = b3;
    }

    /** Update single stream state with any number of bytes.
     *
     * A trailing partial word is zero padded, so this must only be called
     * with the final bytes of the input.
     */
    fn update_tail(state: &mut [u64], data: &[u8]) {
        let remainder = data.len() % FLETCHER_128_BLOCK_SIZE;
        let (words, tail) = data.split_at(data.len() - remainder);

        Fletcher128::update_blocks_generic(state, words);

        if !tail.is_empty() {
            let word = pad_tail::<FLETCHER_128_BLOCK_SIZE>(tail);
            Fletcher128::update_blocks_generic(state, &word);
        }
    }
}

impl Checksum for Fletcher128 {
    type Output = Checksum128;

    fn reset(&mut self) {
        self.buffer = [0; FLETCHER_128_BLOCK_SIZE * FLETCHER_128_MAX_SIMD_WIDTH];
        self.buffer_fill = 0;
        self.state = Default::default();
    }

    fn update(&mut self, data: &[u8]) {
        // Make data pointer mutable, in case of self.buffer_fill.
        let mut data = data;

        // If block has some data, fill that up first.
        if self.buffer_fill > 0 {
            // Todo is minimum of block fill needed, and input data.
            let todo = cmp::min(self.impl_ctx.block_size - self.buffer_fill, data.len());

            // Copy to block.
            self.buffer[self.buffer_fill..self.buffer_fill + todo].copy_from_slice(&data[0..todo]);
            self.buffer_fill += todo;

            // Update data to skip copied block.
            data = &data[todo..];

            // If block is full, consume it.
            if self.buffer_fill == self.impl_ctx.block_size {
                let full_blocks_data = &self.buffer[0..self.buffer_fill];
                (self.impl_ctx.update_blocks)(&mut self.state, full_blocks_data);
                self.buffer_fill = 0;
            }
        }

        // Calculate remainder.
        let remainder = data.len() % self.impl_ctx.block_size;

        // Update full blocks.
        let full_blocks_data = &data[0..data.len() - remainder];
        (self.impl_ctx.update_blocks)(&mut self.state, full_blocks_data);

        // Check if remainder exists, to prevent clobbering fill with 0.
        if remainder > 0 {
            self.buffer[0..remainder].copy_from_slice(&data[data.len() - remainder..]);
            self.buffer_fill = remainder;
        }
    }

    fn finalize(&self) -> Checksum128 {
        // Finish the state for parallel streams.
        let mut result = (self.impl_ctx.finish_blocks)(&self.state);

        // Buffered words and the padded tail continue as one stream.
        Fletcher128::update_tail(&mut result, &self.buffer[0..self.buffer_fill]);

        Checksum128 {
            hi: result[1],
            lo: result[0],
        }
    }
}

/** Compute the Fletcher-128 checksum of `data`.
 *
 * A length that is not a multiple of eight is zero padded to the next word.
 */
pub fn fletcher128(data: &[u8]) -> Checksum128 {
    let mut state = [0; FLETCHER_128_U64_COUNT];
    Fletcher128::update_tail(&mut state, data);

    Checksum128 {
        hi: state[1],
        lo: state[0],
    }
}
