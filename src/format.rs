//! Address format: how a memory address splits into tag, index, block offset
//! and unit offset for a resolved cache.

use crate::error::ModelError;
use crate::model::{AddressingMode, CacheSpec, ResolvedSpec};
use crate::resolve::resolve;
use crate::utils::{ceil_log2, exact_div};
use log::debug;
use serde::Serialize;
use std::fmt::Write;

/// Widths in bits of the four address fields, most significant last.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct AddressFields {
    pub unit_offset_width: u32,
    pub block_offset_width: u32,
    pub index_width: u32,
    pub tag_width: u32,
}

/// One address split along an [`AddressFields`] layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AddressParts {
    pub tag: u128,
    pub index: u128,
    pub block_offset: u128,
    pub unit_offset: u128,
}

/// A fully resolved cache together with its address format.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CacheModel {
    pub spec: ResolvedSpec,
    pub fields: AddressFields,
}

/// Computes the field widths for a resolved spec.
///
/// Every ratio fed to `ceil_log2` has to divide exactly, and the three low
/// fields must fit in the address width.
pub fn compute_fields(spec: &ResolvedSpec) -> Result<AddressFields, ModelError> {
    let units_per_word = exact_div(
        spec.word_size,
        spec.addressable_unit_size,
        "units per word",
    )?;
    let words_per_block = exact_div(spec.block_size, spec.word_size, "words per block")?;
    let sets = exact_div(spec.block_count, spec.way_count, "set count")?;

    let unit_offset_width = log2_width(units_per_word)?;
    let block_offset_width = log2_width(words_per_block)?;
    let index_width = log2_width(sets)?;

    let low = unit_offset_width + block_offset_width + index_width;
    let tag_width = spec.address_width.checked_sub(low).ok_or_else(|| {
        ModelError::inconsistent(format!(
            "offset and index need {low} bits but the address has only {}",
            spec.address_width
        ))
    })?;
    debug!(
        "fields: tag {tag_width}, index {index_width}, block offset {block_offset_width}, unit offset {unit_offset_width}"
    );

    Ok(AddressFields {
        unit_offset_width,
        block_offset_width,
        index_width,
        tag_width,
    })
}

fn log2_width(ratio: u64) -> Result<u32, ModelError> {
    ceil_log2(u128::from(ratio)).ok_or_else(|| ModelError::inconsistent("field ratio is zero"))
}

/// Resolves a sparse spec and computes its address format in one step.
pub fn calculate(spec: CacheSpec) -> Result<CacheModel, ModelError> {
    let spec = resolve(spec)?;
    let fields = compute_fields(&spec)?;
    Ok(CacheModel { spec, fields })
}

impl AddressFields {
    pub fn total_width(&self) -> u32 {
        self.unit_offset_width + self.block_offset_width + self.index_width + self.tag_width
    }

    /// Splits `address` into its fields. Bits above the tag are ignored.
    pub fn split(&self, address: u128) -> AddressParts {
        let mut rest = address;
        let mut take = |width: u32| {
            let field = rest & low_mask(width);
            rest = rest.checked_shr(width).unwrap_or(0);
            field
        };
        let unit_offset = take(self.unit_offset_width);
        let block_offset = take(self.block_offset_width);
        let index = take(self.index_width);
        let tag = take(self.tag_width);
        AddressParts {
            tag,
            index,
            block_offset,
            unit_offset,
        }
    }

    /// Human readable layout, most significant field first, e.g.
    /// `Tag: 25 bits | Index: 3 bits | Block Offset: 2 bits | Byte Offset: 2 bits`.
    ///
    /// Zero-width fields are left out.
    pub fn describe(&self, mode: AddressingMode) -> String {
        let unit_label = format!("{} Offset", mode.label());
        let fields = [
            ("Tag", self.tag_width),
            ("Index", self.index_width),
            ("Block Offset", self.block_offset_width),
            (unit_label.as_str(), self.unit_offset_width),
        ];

        let mut out = String::new();
        for (name, width) in fields.into_iter().filter(|(_, w)| *w > 0) {
            if !out.is_empty() {
                out.push_str(" | ");
            }
            let unit = if width == 1 { "bit" } else { "bits" };
            let _ = write!(out, "{name}: {width} {unit}");
        }
        out
    }
}

fn low_mask(width: u32) -> u128 {
    match width {
        0 => 0,
        w if w >= u128::BITS => u128::MAX,
        w => (1u128 << w) - 1,
    }
}
