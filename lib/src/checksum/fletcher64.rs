// SPDX-License-Identifier: GPL-2.0 OR MIT

use crate::checksum::common::pad_tail;
use crate::checksum::{Checksum, Checksum64};

use core::cmp;
use core::fmt;
use core::fmt::Display;

////////////////////////////////////////////////////////////////////////////////

/// Fletcher-64 block size in bytes.
const FLETCHER_64_BLOCK_SIZE: usize = 4;

/// Fletcher-64 in u32.
const FLETCHER_64_U32_COUNT: usize = 2;

/// Fletcher-64 maximum SIMD width.
const FLETCHER_64_MAX_SIMD_WIDTH: usize = 4;

/// Fletcher-64 implementation.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Fletcher64Implementation {
    /// Generic.
    Generic,

    /// Superscalar using two streams.
    SuperScalar2,

    /// Superscalar using four streams.
    SuperScalar4,
}

const ALL_FLETCHER_64_IMPLEMENTATIONS: [Fletcher64Implementation; 3] = [
    Fletcher64Implementation::Generic,
    Fletcher64Implementation::SuperScalar2,
    Fletcher64Implementation::SuperScalar4,
];

impl Fletcher64Implementation {
    /// Get a slice with all of the [`Fletcher64Implementation`].
    pub fn all() -> &'static [Fletcher64Implementation] {
        &ALL_FLETCHER_64_IMPLEMENTATIONS
    }

    /// Get the string name of the implementation.
    pub fn to_str(&self) -> &'static str {
        match self {
            Fletcher64Implementation::Generic => "generic",
            Fletcher64Implementation::SuperScalar2 => "superscalar2",
            Fletcher64Implementation::SuperScalar4 => "superscalar4",
        }
    }
}

impl Display for Fletcher64Implementation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

/// Update state. Data length is a multiple of the implementation's block size.
type Fletcher64UpdateBlock = fn(state: &mut [u32], data: &[u8]);

/// Compute the `[lo, hi]` sums from multiple streams.
type Fletcher64FinishBlocks = fn(state: &[u32]) -> [u32; FLETCHER_64_U32_COUNT];

/// Fletcher-64 implementation context.
struct Fletcher64ImplementationCtx {
    /// A multiple of [`FLETCHER_64_BLOCK_SIZE`].
    block_size: usize,

    /// Implementation of [`Fletcher64UpdateBlock`].
    update_blocks: Fletcher64UpdateBlock,

    /// Implementation of [`Fletcher64FinishBlocks`].
    finish_blocks: Fletcher64FinishBlocks,
}

/** Fletcher-64 over little endian [`u32`] words.
 *
 * The state layout is all `lo` stream sums followed by all `hi` stream sums.
 */
pub struct Fletcher64 {
    /// Number of bytes used in [`Fletcher64::buffer`].
    buffer_fill: usize,

    /// Partial block buffer.
    buffer: [u8; FLETCHER_64_BLOCK_SIZE * FLETCHER_64_MAX_SIMD_WIDTH],

    /// Ongoing checksum.
    state: [u32; FLETCHER_64_U32_COUNT * FLETCHER_64_MAX_SIMD_WIDTH],

    /// Implementation context.
    impl_ctx: Fletcher64ImplementationCtx,
}

/// Decode a little endian [`u32`] from the first four bytes.
#[inline]
fn read_u32_le(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

impl Fletcher64ImplementationCtx {
    fn new(implementation: Fletcher64Implementation) -> Fletcher64ImplementationCtx {
        match implementation {
            Fletcher64Implementation::Generic => Fletcher64ImplementationCtx {
                block_size: FLETCHER_64_BLOCK_SIZE,
                update_blocks: Fletcher64::update_blocks_generic,
                finish_blocks: Fletcher64::finish_blocks_single_stream,
            },

            Fletcher64Implementation::SuperScalar2 => Fletcher64ImplementationCtx {
                block_size: 2 * FLETCHER_64_BLOCK_SIZE,
                update_blocks: Fletcher64::update_blocks_superscalar2,
                finish_blocks: Fletcher64::finish_blocks_dual_stream,
            },

            Fletcher64Implementation::SuperScalar4 => Fletcher64ImplementationCtx {
                block_size: 4 * FLETCHER_64_BLOCK_SIZE,
                update_blocks: Fletcher64::update_blocks_superscalar4,
                finish_blocks: Fletcher64::finish_blocks_quad_stream,
            },
        }
    }
}

impl Fletcher64 {
    /// Create a new Fletcher-64 instance.
    pub fn new(implementation: Fletcher64Implementation) -> Fletcher64 {
        Fletcher64 {
            buffer_fill: 0,
            buffer: [0; FLETCHER_64_BLOCK_SIZE * FLETCHER_64_MAX_SIMD_WIDTH],
            state: Default::default(),
            impl_ctx: Fletcher64ImplementationCtx::new(implementation),
        }
    }

    /** Finish a check that is one stream.
     *
     * For one stream, this is a NO-OP.
     */
    fn finish_blocks_single_stream(state: &[u32]) -> [u32; FLETCHER_64_U32_COUNT] {
        [state[0], state[1]]
    }

    /** Finish a checksum that is two streams wide.
     *
     * Stream `i` saw every second word starting at word `i`, so its `lo`
     * contributed once less to `hi` per block for each stream before it.
     */
    fn finish_blocks_dual_stream(state: &[u32]) -> [u32; FLETCHER_64_U32_COUNT] {
        let a0 = state[0];
        let a1 = state[1];

        let b0 = state[2];
        let b1 = state[3];

        let lo = a0.wrapping_add(a1);
        let hi = b0.wrapping_add(b1).wrapping_mul(2).wrapping_sub(a1);

        [lo, hi]
    }

    /** Finish a checksum that is four streams wide.
     *
     * ```text
     * hi = 4 * (b0 + b1 + b2 + b3) - (a1 + 2 * a2 + 3 * a3)
     * ```
     */
    fn finish_blocks_quad_stream(state: &[u32]) -> [u32; FLETCHER_64_U32_COUNT] {
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

    /// Update blocks, reading one little endian [`u32`] at a time.
    fn update_blocks_generic(state: &mut [u32], data: &[u8]) {
        // Load state to local variables.
        let mut a = state[0];
        let mut b = state[1];

        // Iterate one block at a time.
        for block in data.chunks_exact(FLETCHER_64_BLOCK_SIZE) {
            // Decode value.
            let value = read_u32_le(block);

            // Update running checksum.
            a = a.wrapping_add(value);
            b = b.wrapping_add(a);
        }

        // Save state.
        state[0] = a;
        state[1] = b;
    }

    /// Update blocks, reading two little endian [`u32`] at a time.
    fn update_blocks_superscalar2(state: &mut [u32], data: &[u8]) {
        // Load state.
        let mut a0 = state[0];
        let mut a1 = state[1];

        let mut b0 = state[2];
        let mut b1 = state[3];

        // Iterate two blocks at a time.
        for block in data.chunks_exact(2 * FLETCHER_64_BLOCK_SIZE) {
            // Decode values.
            let v = read_u32_le(&block[0..FLETCHER_64_BLOCK_SIZE]);
            let w = read_u32_le(&block[FLETCHER_64_BLOCK_SIZE..]);

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

    /// Update blocks, reading four little endian [`u32`] at a time.
    fn update_blocks_superscalar4(state: &mut [u32], data: &[u8]) {
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
        for block in data.chunks_exact(4 * FLETCHER_64_BLOCK_SIZE) {
            // Decode values.
            let v = read_u32_le(&block[0..]);
            let w = read_u32_le(&block[FLETCHER_64_BLOCK_SIZE..]);
            let x = read_u32_le(&block[2 * FLETCHER_64_BLOCK_SIZE..]);
            let y = read_u32_le(&block[3 * FLETCHER_64_BLOCK_SIZE..]);

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
    fn update_tail(state: &mut [u32], data: &[u8]) {
        let remainder = data.len() % FLETCHER_64_BLOCK_SIZE;
        let (words, tail) = data.split_at(data.len() - remainder);

        Fletcher64::update_blocks_generic(state, words);

        if !tail.is_empty() {
            let word = pad_tail::<FLETCHER_64_BLOCK_SIZE>(tail);
            Fletcher64::update_blocks_generic(state, &word);
        }
    }
}

impl Checksum for Fletcher64 {
    type Output = Checksum64;

    fn reset(&mut self) {
        self.buffer = [0; FLETCHER_64_BLOCK_SIZE * FLETCHER_64_MAX_SIMD_WIDTH];
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

    fn finalize(&self) -> Checksum64 {
        // Finish the state for parallel streams.
        let mut result = (self.impl_ctx.finish_blocks)(&self.state);

        // Buffered words and the padded tail continue as one stream.
        Fletcher64::update_tail(&mut result, &self.buffer[0..self.buffer_fill]);

        Checksum64::new(result[1], result[0])
    }
}

/** Compute the Fletcher-64 checksum of `data`.
 *
 * A length that is not a multiple of four is zero padded to the next word.
 */
pub fn fletcher64(data: &[u8]) -> Checksum64 {
    let mut state = [0; FLETCHER_64_U32_COUNT];
    Fletcher64::update_tail(&mut state, data);

    Checksum64::new(state[1], state[0])
}
