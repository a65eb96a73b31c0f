//! Property tests over randomly generated power-of-two cache architectures.

use cachefmt::{CacheSpec, calculate, compute_fields, resolve};
use proptest::prelude::*;

/// (word, unit, block words, sets, ways, address width) as log2 exponents,
/// sized so the low fields always fit in the address.
fn architecture() -> impl Strategy<Value = (u32, u32, u32, u32, u32, u32)> {
    (0..4u32, 0..3u32, 0..5u32, 0..12u32, 0..4u32, 24..48u32)
        .prop_map(|(word, unit, words, sets, ways, width)| (word, unit.min(word), words, sets, ways, width))
}

/// A full spec: every group given, with the quantity the resolver derives left out.
fn full_spec(arch: (u32, u32, u32, u32, u32, u32)) -> CacheSpec {
    let (word, unit, words, sets, ways, width) = arch;
    let block_size = 1u64 << (word + words);
    let block_count = 1u64 << (sets + ways);
    CacheSpec {
        capacity: Some(block_size * block_count),
        block_size: Some(block_size),
        way_count: Some(1 << ways),
        memory_size: Some(1u128 << width),
        word_size: Some(1 << word),
        addressable_unit_size: Some(1 << unit),
        ..Default::default()
    }
}

proptest! {
    #[test]
    fn fields_fill_the_address(arch in architecture()) {
        let m = calculate(full_spec(arch)).unwrap();
        prop_assert_eq!(m.fields.total_width(), m.spec.address_width);
    }

    #[test]
    fn blocks_and_sets_multiply_out(arch in architecture()) {
        let r = resolve(full_spec(arch)).unwrap();
        prop_assert_eq!(r.block_count * r.block_size, r.capacity);
        prop_assert_eq!(r.set_count * r.way_count, r.block_count);
    }

    #[test]
    fn any_derivation_route_agrees(arch in architecture()) {
        let full = full_spec(arch);
        let reference = calculate(full.clone()).unwrap();

        let from_counts = CacheSpec {
            capacity: None,
            block_count: Some(reference.spec.block_count),
            ..full.clone()
        };
        let from_sets = CacheSpec {
            way_count: None,
            set_count: Some(reference.spec.set_count),
            ..full.clone()
        };
        let from_width = CacheSpec {
            memory_size: None,
            address_width: Some(reference.spec.address_width),
            ..full
        };
        for spec in [from_counts, from_sets, from_width] {
            prop_assert_eq!(calculate(spec).unwrap(), reference);
        }
    }

    #[test]
    fn calculation_is_idempotent(arch in architecture()) {
        let spec = full_spec(arch);
        let first = resolve(spec.clone()).unwrap();
        let second = resolve(spec).unwrap();
        prop_assert_eq!(first, second);
        prop_assert_eq!(compute_fields(&first).unwrap(), compute_fields(&second).unwrap());
    }

    #[test]
    fn dropping_a_group_is_insufficient(arch in architecture(), group in 0..5usize) {
        let mut spec = full_spec(arch);
        match group {
            0 => spec.block_size = None,
            1 => spec.way_count = None,
            2 => spec.word_size = None,
            3 => spec.memory_size = None,
            _ => spec.addressable_unit_size = None,
        }
        prop_assert!(resolve(spec).is_err());
    }
}
