use crate::error::ModelError;
use crate::model::{CacheSpec, ParameterGroup, ResolvedSpec};
use crate::utils::{ceil_log2, checked_mul, exact_div};
use log::{debug, warn};

/// Lists every parameter group `spec` leaves uncovered, in check order.
///
/// All groups are checked so the caller can report them together.
pub fn missing_groups(spec: &CacheSpec) -> Vec<ParameterGroup> {
    let capacity = spec.capacity.is_some();
    let blocks = spec.block_count.is_some();
    let block_size = spec.block_size.is_some();

    let checks = [
        (
            ParameterGroup::Blocks,
            capacity && (blocks || block_size) || (blocks && block_size),
        ),
        (
            ParameterGroup::Associativity,
            spec.set_count.is_some() || spec.way_count.is_some(),
        ),
        (ParameterGroup::WordSize, spec.word_size.is_some()),
        (
            ParameterGroup::AddressSizing,
            spec.address_width.is_some() || spec.memory_size.is_some(),
        ),
        (
            ParameterGroup::AddressableUnit,
            spec.addressable_unit_size.is_some(),
        ),
    ];

    checks
        .into_iter()
        .filter(|(_, covered)| !covered)
        .map(|(group, _)| group)
        .collect()
}

/// Checks that `spec` determines a cache, then derives every missing quantity.
///
/// Nothing is derived unless all groups are covered. Derived counts must come
/// out as exact positive integers.
pub fn resolve(spec: CacheSpec) -> Result<ResolvedSpec, ModelError> {
    let missing = missing_groups(&spec);
    let (true, Some(word_size), Some(addressable_unit_size)) =
        (missing.is_empty(), spec.word_size, spec.addressable_unit_size)
    else {
        return Err(ModelError::InsufficientInput { missing });
    };

    let counts = [
        spec.capacity,
        spec.block_count,
        spec.block_size,
        spec.way_count,
        spec.set_count,
    ];
    if word_size == 0
        || addressable_unit_size == 0
        || counts.contains(&Some(0))
        || spec.memory_size == Some(0)
    {
        return Err(ModelError::inconsistent("sizes and counts must be positive"));
    }

    let (capacity, block_count, block_size) = derive_blocks(&spec)?;
    let (way_count, set_count) = derive_sets(&spec, block_count)?;
    let (address_width, memory_size) = derive_address_width(&spec, addressable_unit_size)?;

    Ok(ResolvedSpec {
        capacity,
        block_count,
        block_size,
        way_count,
        set_count,
        memory_size,
        address_width,
        word_size,
        addressable_unit_size,
    })
}

/// `capacity = block_count * block_size`, solved for whichever side is absent.
///
/// With all three given, the block size is recomputed from the other two.
fn derive_blocks(spec: &CacheSpec) -> Result<(u64, u64, u64), ModelError> {
    match (spec.capacity, spec.block_count, spec.block_size) {
        (None, Some(blocks), Some(block_size)) => {
            let capacity = checked_mul(blocks, block_size, "capacity")?;
            debug!("capacity = {blocks} * {block_size} = {capacity}");
            Ok((capacity, blocks, block_size))
        }
        (Some(capacity), None, Some(block_size)) => {
            let blocks = exact_div(capacity, block_size, "block count")?;
            debug!("block count = {capacity} / {block_size} = {blocks}");
            Ok((capacity, blocks, block_size))
        }
        (Some(capacity), Some(blocks), given) => {
            let block_size = exact_div(capacity, blocks, "block size")?;
            if let Some(g) = given.filter(|&g| g != block_size) {
                warn!("block size {g} replaced by capacity / block count = {block_size}");
            }
            debug!("block size = {capacity} / {blocks} = {block_size}");
            Ok((capacity, blocks, block_size))
        }
        _ => Err(ModelError::InsufficientInput {
            missing: vec![ParameterGroup::Blocks],
        }),
    }
}

/// `block_count = set_count * way_count`; a given way count wins.
fn derive_sets(spec: &CacheSpec, block_count: u64) -> Result<(u64, u64), ModelError> {
    match (spec.way_count, spec.set_count) {
        (None, Some(sets)) => {
            let ways = exact_div(block_count, sets, "way count")?;
            debug!("way count = {block_count} / {sets} = {ways}");
            Ok((ways, sets))
        }
        (Some(ways), given) => {
            let sets = exact_div(block_count, ways, "set count")?;
            if let Some(g) = given.filter(|&g| g != sets) {
                warn!("set count {g} replaced by block count / way count = {sets}");
            }
            debug!("set count = {block_count} / {ways} = {sets}");
            Ok((ways, sets))
        }
        (None, None) => Err(ModelError::InsufficientInput {
            missing: vec![ParameterGroup::Associativity],
        }),
    }
}

/// Relates memory size and address width through the addressable unit:
/// `address_width = ceil_log2(memory_size / unit)` and
/// `memory_size = 2^address_width * unit`. A given width wins.
fn derive_address_width(spec: &CacheSpec, unit: u64) -> Result<(u32, u128), ModelError> {
    match (spec.address_width, spec.memory_size) {
        (Some(width), given) => {
            let memory_size = 1u128
                .checked_shl(width)
                .and_then(|m| m.checked_mul(u128::from(unit)))
                .ok_or_else(|| {
                    ModelError::inconsistent(format!(
                        "memory size for a {width}-bit address overflows"
                    ))
                })?;
            if let Some(g) = given.filter(|&g| g != memory_size) {
                warn!("memory size {g} replaced by 2^{width} * {unit} = {memory_size}");
            }
            debug!("memory size = 2^{width} * {unit} = {memory_size}");
            Ok((width, memory_size))
        }
        (None, Some(memory_size)) => {
            let unit = u128::from(unit);
            if memory_size % unit != 0 || memory_size < unit {
                return Err(ModelError::inconsistent(format!(
                    "memory size {memory_size} is not a whole number of {unit}-byte units"
                )));
            }
            let width = ceil_log2(memory_size / unit)
                .ok_or_else(|| ModelError::inconsistent("memory holds no addressable units"))?;
            debug!("address width = ceil_log2({memory_size} / {unit}) = {width}");
            Ok((width, memory_size))
        }
        (None, None) => Err(ModelError::InsufficientInput {
            missing: vec![ParameterGroup::AddressSizing],
        }),
    }
}
