use crate::error::RunError;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Granularity a single address value designates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressingMode {
    #[default]
    Byte,
    Halfword,
    Word,
}

impl AddressingMode {
    /// Size of one addressable unit in bytes for the given word size.
    pub fn unit_size(self, word_size: u64) -> Result<u64, RunError> {
        match self {
            AddressingMode::Byte => Ok(1),
            AddressingMode::Halfword if word_size % 2 != 0 => {
                Err(RunError::OddHalfword { word_size })
            }
            AddressingMode::Halfword => Ok(word_size / 2),
            AddressingMode::Word => Ok(word_size),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AddressingMode::Byte => "Byte",
            AddressingMode::Halfword => "Halfword",
            AddressingMode::Word => "Word",
        }
    }
}

/// The independent groups a spec must cover before anything can be derived.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParameterGroup {
    /// capacity plus block count or block size, or block count plus block size
    Blocks,
    /// set count or way count
    Associativity,
    WordSize,
    /// address width or memory size
    AddressSizing,
    AddressableUnit,
}

impl fmt::Display for ParameterGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParameterGroup::Blocks => "two of capacity, block count, block size",
            ParameterGroup::Associativity => "set count or way count",
            ParameterGroup::WordSize => "word size",
            ParameterGroup::AddressSizing => "address width or memory size",
            ParameterGroup::AddressableUnit => "addressable unit size",
        };
        f.write_str(name)
    }
}

/// Sparse description of a cache and its memory. `None` means "not given".
///
/// Sizes are in bytes, counts are plain counts, `address_width` is in bits.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheSpec {
    pub capacity: Option<u64>,
    pub block_count: Option<u64>,
    pub block_size: Option<u64>,
    pub way_count: Option<u64>,
    pub set_count: Option<u64>,
    pub memory_size: Option<u128>,
    pub address_width: Option<u32>,
    pub word_size: Option<u64>,
    pub addressable_unit_size: Option<u64>,
}

impl CacheSpec {
    /// Fills `addressable_unit_size` from the word size and an addressing mode.
    ///
    /// Leaves the spec untouched when the word size is unknown; the resolver
    /// will then report both groups as missing.
    pub fn with_addressing(mut self, mode: AddressingMode) -> Result<Self, RunError> {
        if let Some(word_size) = self.word_size {
            self.addressable_unit_size = Some(mode.unit_size(word_size)?);
        }
        Ok(self)
    }
}

/// A spec that passed the sufficiency gate and had every quantity derived.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ResolvedSpec {
    pub capacity: u64,
    pub block_count: u64,
    pub block_size: u64,
    pub way_count: u64,
    pub set_count: u64,
    pub memory_size: u128,
    pub address_width: u32,
    pub word_size: u64,
    pub addressable_unit_size: u64,
}
