use crate::error::RunError;
use crate::format::{CacheModel, calculate};
use crate::model::{AddressingMode, CacheSpec};
use crate::utils::parse_size;
use log::{info, warn};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::Path;

/// One row of a batch file. Empty cells are "not given".
#[derive(Debug, Default, Deserialize)]
pub struct SpecRecord {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "size_cell")]
    pub capacity: Option<u64>,
    #[serde(default, deserialize_with = "size_cell")]
    pub block_count: Option<u64>,
    #[serde(default, deserialize_with = "size_cell")]
    pub block_size: Option<u64>,
    #[serde(default)]
    pub ways: Option<u64>,
    #[serde(default)]
    pub sets: Option<u64>,
    #[serde(default, deserialize_with = "size_cell")]
    pub memory_size: Option<u64>,
    #[serde(default)]
    pub address_width: Option<u32>,
    #[serde(default, deserialize_with = "size_cell")]
    pub word_size: Option<u64>,
    #[serde(default)]
    pub addressing: Option<AddressingMode>,
}

fn size_cell<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u64>, D::Error> {
    let raw: Option<String> = Option::deserialize(d)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(cell) => parse_size(cell).map(Some).map_err(D::Error::custom),
    }
}

impl SpecRecord {
    pub fn mode(&self, default_mode: AddressingMode) -> AddressingMode {
        self.addressing.unwrap_or(default_mode)
    }

    pub fn to_spec(&self, default_mode: AddressingMode) -> Result<CacheSpec, RunError> {
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
        .with_addressing(self.mode(default_mode))
    }
}

/// One row of batch output: the resolved cache and its fields, or why it failed.
#[derive(Debug, Default, Serialize, PartialEq, Eq)]
pub struct ResultRecord {
    pub name: String,
    pub status: String,
    pub capacity: Option<u64>,
    pub block_count: Option<u64>,
    pub block_size: Option<u64>,
    pub ways: Option<u64>,
    pub sets: Option<u64>,
    pub memory_size: Option<u128>,
    pub address_width: Option<u32>,
    pub word_size: Option<u64>,
    pub unit_size: Option<u64>,
    pub tag_width: Option<u32>,
    pub index_width: Option<u32>,
    pub block_offset_width: Option<u32>,
    pub unit_offset_width: Option<u32>,
    pub layout: Option<String>,
}

impl ResultRecord {
    fn solved(name: String, m: &CacheModel, mode: AddressingMode) -> Self {
        let (s, f) = (&m.spec, &m.fields);
        ResultRecord {
            name,
            status: "ok".to_string(),
            capacity: Some(s.capacity),
            block_count: Some(s.block_count),
            block_size: Some(s.block_size),
            ways: Some(s.way_count),
            sets: Some(s.set_count),
            memory_size: Some(s.memory_size),
            address_width: Some(s.address_width),
            word_size: Some(s.word_size),
            unit_size: Some(s.addressable_unit_size),
            tag_width: Some(f.tag_width),
            index_width: Some(f.index_width),
            block_offset_width: Some(f.block_offset_width),
            unit_offset_width: Some(f.unit_offset_width),
            layout: Some(f.describe(mode)),
        }
    }

    fn failed(name: String, err: &RunError) -> Self {
        ResultRecord {
            name,
            status: err.to_string(),
            ..Default::default()
        }
    }
}

/// Resolves a single batch row. Errors become the row's status.
pub fn process_record(index: usize, record: &SpecRecord, default_mode: AddressingMode) -> ResultRecord {
    let name = record
        .name
        .clone()
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| format!("row{}", index + 1));
    let mode = record.mode(default_mode);

    let result = record
        .to_spec(default_mode)
        .and_then(|spec| calculate(spec).map_err(RunError::from));
    match result {
        Ok(m) => ResultRecord::solved(name, &m, mode),
        Err(e) => {
            warn!("{name}: {e}");
            ResultRecord::failed(name, &e)
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub solved: usize,
    pub failed: usize,
}

/// Opens `path` for reading, decompressing `.zst` files on the fly.
pub fn open_input(path: &str) -> Result<Box<dyn Read>, RunError> {
    let io_err = |source| RunError::Io {
        path: path.to_string(),
        source,
    };
    let file = BufReader::new(File::open(path).map_err(io_err)?);
    if Path::new(path).extension().is_some_and(|ext| ext == "zst") {
        let decoder = zstd::stream::read::Decoder::with_buffer(file).map_err(io_err)?;
        Ok(Box::new(decoder))
    } else {
        Ok(Box::new(file))
    }
}

fn open_output(path: Option<&str>) -> Result<Box<dyn Write>, RunError> {
    match path {
        None => Ok(Box::new(io::stdout().lock())),
        Some(p) => {
            let file = File::create(p).map_err(|source| RunError::Io {
                path: p.to_string(),
                source,
            })?;
            Ok(Box::new(io::BufWriter::new(file)))
        }
    }
}

/// Resolves every row of `reader` and writes one result row each to `writer`.
///
/// Malformed or unresolvable rows are reported in their own row and do not
/// stop the batch.
pub fn process_batch<R: Read, W: Write>(
    reader: R,
    writer: W,
    default_mode: AddressingMode,
) -> Result<BatchSummary, RunError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut wtr = csv::Writer::from_writer(writer);
    let mut summary = BatchSummary::default();

    for (index, row) in rdr.deserialize::<SpecRecord>().enumerate() {
        let result = match row {
            Ok(record) => process_record(index, &record, default_mode),
            Err(e) => {
                warn!("row{}: {e}", index + 1);
                ResultRecord::failed(format!("row{}", index + 1), &RunError::Csv(e))
            }
        };
        if result.status == "ok" {
            summary.solved += 1;
        } else {
            summary.failed += 1;
        }
        wtr.serialize(result)?;
    }
    wtr.flush().map_err(|source| RunError::Io {
        path: "output".to_string(),
        source,
    })?;

    info!(
        "batch done: {} solved, {} failed",
        summary.solved, summary.failed
    );
    Ok(summary)
}

pub fn run_batch(
    input: &str,
    output: Option<&str>,
    default_mode: AddressingMode,
) -> Result<BatchSummary, RunError> {
    info!("reading cache specs from {input}");
    process_batch(open_input(input)?, open_output(output)?, default_mode)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BATCH: &str = "\
name,capacity,block_count,block_size,ways,sets,memory_size,address_width,word_size,addressing
l1,32KB,,16,2,,4TB,,8,byte
mips,128,,16,1,,,32,4,
word,256,,32,1,,256MB,,8,word
short,64KB,,,,,,,4,
";

    fn run(input: &str) -> (BatchSummary, String) {
        let mut out = Vec::new();
        let summary = process_batch(input.as_bytes(), &mut out, AddressingMode::Byte).unwrap();
        (summary, String::from_utf8(out).unwrap())
    }

    #[test]
    fn batch_resolves_each_row() {
        let (summary, out) = run(BATCH);
        assert_eq!(summary, BatchSummary { solved: 3, failed: 1 });

        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with("name,status,capacity"));
        assert!(lines[1].starts_with("l1,ok,32768,2048,16,2,1024,4398046511104,42,8,1,28,10,1,3,"));
        assert!(lines[2].starts_with("mips,ok,128,8,16,1,8,4294967296,32,4,1,25,3,2,2,"));
        assert!(lines[3].starts_with("word,ok,256,8,32,1,8,268435456,25,8,8,20,3,2,0,"));
        assert!(lines[4].starts_with("short,\"insufficient parameters"));
    }

    #[test]
    fn bad_cell_fails_only_its_row() {
        let input = "\
name,capacity,block_size,ways,address_width,word_size
bad,lots,16,1,32,4
good,128,16,1,32,4
";
        let (summary, out) = run(input);
        assert_eq!(summary, BatchSummary { solved: 1, failed: 1 });
        assert!(out.lines().nth(2).unwrap().starts_with("good,ok,"));
    }

    #[test]
    fn unnamed_rows_are_numbered() {
        let record = SpecRecord::default();
        let result = process_record(6, &record, AddressingMode::Byte);
        assert_eq!(result.name, "row7");
        assert_ne!(result.status, "ok");
    }

    #[test]
    fn compressed_input_is_decoded() {
        let dir = std::env::temp_dir().join(format!("cachefmt-io-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("batch.csv.zst");
        let compressed = zstd::stream::encode_all(BATCH.as_bytes(), 3).unwrap();
        std::fs::write(&path, compressed).unwrap();

        let mut text = String::new();
        open_input(path.to_str().unwrap())
            .unwrap()
            .read_to_string(&mut text)
            .unwrap();
        assert_eq!(text, BATCH);
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
