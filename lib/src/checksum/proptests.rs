// SPDX-License-Identifier: GPL-2.0 OR MIT

//! Property tests for the checksum engines.
//!
//! Single word reference implementations serve as the oracle:
//!
//! 1. **Tail padding**: an unaligned input checksums like the same input
//!    with explicit zero bytes appended up to the next word.
//! 2. **Length**: zero words stored past the end of the input are never
//!    folded in, while each one folded in adds `lo` to `hi`.
//! 3. **Chunking**: any split across `update` calls, and any implementation,
//!    matches the one shot function.
//! 4. **Striping**: stripes match Fletcher-128 over each stripe's words.

use proptest::prelude::*;

use crate::checksum::{
    fletcher128, fletcher64, Checksum, Checksum128, Checksum64, Fletcher128, Fletcher128Implementation,
    Fletcher64, Fletcher64Implementation, StripeConfig, StripeSet,
};

/// Zero extend `data` to a multiple of `word` bytes.
fn zero_extend(data: &[u8], word: usize) -> Vec<u8> {
    let mut padded = data.to_vec();
    while padded.len() % word != 0 {
        padded.push(0);
    }
    padded
}

/// Fletcher-64 one word at a time.
fn fletcher64_reference(data: &[u8]) -> Checksum64 {
    let (mut hi, mut lo) = (0u32, 0u32);
    for word in zero_extend(data, 4).chunks_exact(4) {
        let mut bytes = [0; 4];
        bytes.copy_from_slice(word);
        lo = lo.wrapping_add(u32::from_le_bytes(bytes));
        hi = hi.wrapping_add(lo);
    }
    Checksum64::new(hi, lo)
}

/// Fletcher-128 one word at a time.
fn fletcher128_reference(data: &[u8]) -> Checksum128 {
    let mut c = Checksum128::default();
    for word in zero_extend(data, 8).chunks_exact(8) {
        let mut bytes = [0; 8];
        bytes.copy_from_slice(word);
        c.add_word(u64::from_le_bytes(bytes));
    }
    c
}

/// Split `data` at sorted cut points.
fn split_at_cuts<'a>(data: &'a [u8], cuts: &[usize]) -> Vec<&'a [u8]> {
    let mut cuts: Vec<usize> = cuts.iter().map(|c| c % (data.len() + 1)).collect();
    cuts.sort_unstable();

    let mut parts = Vec::new();
    let mut start = 0;
    for cut in cuts {
        parts.push(&data[start..cut]);
        start = cut;
    }
    parts.push(&data[start..]);
    parts
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn fletcher64_tail_padding(data in proptest::collection::vec(any::<u8>(), 0..=512)) {
        prop_assert_eq!(fletcher64(&data), fletcher64(&zero_extend(&data, 4)));
    }

    #[test]
    fn fletcher128_tail_padding(data in proptest::collection::vec(any::<u8>(), 0..=512)) {
        prop_assert_eq!(fletcher128(&data), fletcher128(&zero_extend(&data, 8)));
        prop_assert_eq!(fletcher128(&data), fletcher128_reference(&data));
    }

    #[test]
    fn checksum_stops_at_length(
        words in proptest::collection::vec(any::<u64>(), 0..=64),
        zero_words in 1usize..=8,
    ) {
        let data: Vec<u8> = words.iter().flat_map(|w| w.to_le_bytes()).collect();
        let len = data.len();

        // Zero words stored after the input.
        let mut backing = data.clone();
        backing.resize(len + 8 * zero_words, 0);
        let input = &backing[0..len];

        let c64 = fletcher64_reference(&data);
        prop_assert_eq!(fletcher64(input), c64);
        for implementation in Fletcher64Implementation::all() {
            let mut h = Fletcher64::new(*implementation);
            prop_assert_eq!(h.hash(input), c64, "{}", implementation);
        }

        let c128 = fletcher128_reference(&data);
        prop_assert_eq!(fletcher128(input), c128);
        for implementation in Fletcher128Implementation::all() {
            let mut h = Fletcher128::new(*implementation);
            prop_assert_eq!(h.hash(input), c128, "{}", implementation);
        }

        // Folding the zero words in is visible in hi.
        let u32_words = (2 * zero_words) as u32;
        prop_assert_eq!(
            fletcher64(&backing),
            Checksum64::new(c64.hi().wrapping_add(c64.lo().wrapping_mul(u32_words)), c64.lo())
        );
        prop_assert_eq!(
            fletcher128(&backing),
            Checksum128 {
                hi: c128.hi.wrapping_add(c128.lo.wrapping_mul(zero_words as u64)),
                lo: c128.lo,
            }
        );
    }

    #[test]
    fn fletcher64_chunking(
        data in proptest::collection::vec(any::<u8>(), 0..=1024),
        cuts in proptest::collection::vec(any::<usize>(), 0..8),
    ) {
        let expected = fletcher64(&data);

        for implementation in Fletcher64Implementation::all() {
            let mut h = Fletcher64::new(*implementation);
            for part in split_at_cuts(&data, &cuts) {
                h.update(part);
            }
            prop_assert_eq!(h.finalize(), expected, "{}", implementation);
        }
    }

    #[test]
    fn fletcher128_chunking(
        data in proptest::collection::vec(any::<u8>(), 0..=1024),
        cuts in proptest::collection::vec(any::<usize>(), 0..8),
    ) {
        let expected = fletcher128(&data);

        for implementation in Fletcher128Implementation::all() {
            let mut h = Fletcher128::new(*implementation);
            for part in split_at_cuts(&data, &cuts) {
                h.update(part);
            }
            prop_assert_eq!(h.finalize(), expected, "{}", implementation);
        }
    }

    #[test]
    fn striped_matches_per_stripe_fletcher128(
        data in proptest::collection::vec(any::<u8>(), 0..=2048),
        blocks in 1usize..8,
        stripes in 1usize..6,
    ) {
        let config = StripeConfig::new(blocks * 8, stripes).unwrap();
        let mut set = StripeSet::new(config);

        for chunk in data.chunks(config.chunk_size()) {
            set.update(chunk).unwrap();
        }

        // Deal the padded words out by hand.
        let padded = zero_extend(&data, 8);
        for (stripe, checksum) in set.stripes().iter().enumerate() {
            let lane: Vec<u8> = padded
                .chunks_exact(8)
                .skip(stripe)
                .step_by(stripes)
                .flatten()
                .copied()
                .collect();
            prop_assert_eq!(*checksum, fletcher128(&lane), "stripe {}", stripe);
        }
    }

    #[test]
    fn striped_chunk_boundaries(
        data in proptest::collection::vec(any::<u8>(), 0..=64),
        multiples in proptest::collection::vec(1usize..4, 1..6),
        stripes in 1usize..5,
    ) {
        // Input of exactly k * stripes * block_size bytes.
        let config = StripeConfig::new(16, stripes).unwrap();
        let total = config.chunk_size() * multiples.len();
        let input: Vec<u8> = match data.is_empty() {
            true => Vec::new(),
            false => data.iter().copied().cycle().take(total).collect(),
        };

        let mut whole = StripeSet::new(config);
        whole.update(&input).unwrap();

        let mut split = StripeSet::new(config);
        let mut offset = 0;
        for m in &multiples {
            let end = (offset + m * config.chunk_size()).min(input.len());
            split.update(&input[offset..end]).unwrap();
            offset = end;
        }
        split.update(&input[offset..]).unwrap();

        prop_assert_eq!(whole.stripes(), split.stripes());
    }
}
