use crate::cli::Cli;
use crate::model::AddressingMode;
use log::info;

pub mod cli;
pub mod error;
/// Address field widths and their rendering
pub mod format;
/// Batch processing of CSV files of cache specs
pub mod io;
pub mod model;
/// Sufficiency check and derivation of missing parameters
pub mod resolve;
pub mod utils;

pub use error::{ModelError, RunError};
pub use format::{AddressFields, CacheModel, calculate, compute_fields};
pub use model::{CacheSpec, ResolvedSpec};
pub use resolve::resolve;

pub fn run(cli: Cli) -> Result<(), RunError> {
    if let Some(input) = &cli.input {
        io::run_batch(input, cli.output.as_deref(), cli.addressing)?;
        return Ok(());
    }

    let spec = cli.spec()?;
    info!("modelling {spec:?}");
    let m = calculate(spec)?;
    print!("{}", report(&m, cli.addressing, cli.address));
    Ok(())
}

/// Text report for a single cache, as printed by the binary.
pub fn report(m: &CacheModel, mode: AddressingMode, address: Option<u128>) -> String {
    let s = &m.spec;
    let mut out = format!(
        "capacity: {} B\nblocks: {}\nblock size: {} B\nsets: {}\nways: {}\n\
         word size: {} B\n{} addressable, memory size: {} B\n\
         address format length: {}\n{}\n",
        s.capacity,
        s.block_count,
        s.block_size,
        s.set_count,
        s.way_count,
        s.word_size,
        mode.label().to_lowercase(),
        s.memory_size,
        s.address_width,
        m.fields.describe(mode),
    );

    if let Some(address) = address {
        let parts = m.fields.split(address);
        out.push_str(&format!(
            "{address:#x}: tag {:#x}, index {}, block offset {}, {} offset {}\n",
            parts.tag,
            parts.index,
            parts.block_offset,
            mode.label().to_lowercase(),
            parts.unit_offset,
        ));
    }
    out
}
