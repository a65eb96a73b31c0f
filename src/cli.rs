use crate::error::RunError;
use crate::model::{AddressingMode, CacheSpec};
use crate::utils::{parse_address, parse_size};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "cachefmt",
    version = "0.1",
    author = "Y.Wu, ben, matthew",
    about = "Address format calculator for set-associative caches"
)]
pub struct Cli {
    /// Total cache data capacity, e.g. 32KB
    #[arg(short = 'c', long, value_parser = parse_size)]
    pub capacity: Option<u64>,

    /// Number of blocks in the cache
    #[arg(short = 'B', long)]
    pub block_count: Option<u64>,

    /// Bytes per block, e.g. 64
    #[arg(short = 'b', long, value_parser = parse_size)]
    pub block_size: Option<u64>,

    /// Associativity (ways per set); 1 is direct mapped
    #[arg(short = 'N', long)]
    pub ways: Option<u64>,

    /// Number of sets
    #[arg(short = 'S', long)]
    pub sets: Option<u64>,

    /// Main memory size, e.g. 4GB
    #[arg(short = 'm', long, value_parser = parse_size)]
    pub memory_size: Option<u64>,

    /// Address width in bits
    #[arg(short = 'A', long)]
    pub address_width: Option<u32>,

    /// Processor word size in bytes
    #[arg(short = 'w', long, value_parser = parse_size)]
    pub word_size: Option<u64>,

    /// Smallest unit one address designates
    #[arg(short = 'u', long, value_enum, default_value_t = AddressingMode::Byte)]
    pub addressing: AddressingMode,

    /// Split this address (decimal or 0x hex) into its fields
    #[arg(short = 'a', long, value_parser = parse_address)]
    pub address: Option<u128>,

    /// CSV file of cache specs to process in batch; .zst files are decompressed
    #[arg(short = 'i', long)]
    pub input: Option<String>,

    /// Where batch results go; stdout if omitted
    #[arg(short = 'o', long, requires = "input")]
    pub output: Option<String>,

    /// Output information about each derivation
    #[arg(short, long)]
    pub verbose: bool,

    /// Enable even more information about each derivation
    #[arg(short = 'd', long)]
    pub debug: bool,
}

impl Cli {
    /// The sparse spec described by the command line flags.
    pub fn spec(&self) -> Result<CacheSpec, RunError> {
        CacheSpec {
            capacity: self.capacity,
            block_count: self.block_count,
            block_size: self.block_size,
            way_count: self.ways,
            set_count: self.sets,
            memory_size: self.memory_size.map(u128::from),
            address_width: self.address_width,
            word_size: self.word_size,
            addressable_unit_size: None,
        }
        .with_addressing(self.addressing)
    }
}
