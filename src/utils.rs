use crate::error::{ModelError, RunError};
use regex::Regex;
use std::sync::LazyLock;

static SIZE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(\d+)\s*(?:([kmgt])i?)?b?\s*$").expect("size pattern is valid")
});

/// Minimum number of bits needed to tell `x` values apart, `ceil(log2(x))`.
///
/// `None` for zero, which has no logarithm.
pub fn ceil_log2(x: u128) -> Option<u32> {
    match x {
        0 => None,
        x => Some(u128::BITS - (x - 1).leading_zeros()),
    }
}

/// `num / den`, failing unless the quotient is a positive integer.
pub fn exact_div(num: u64, den: u64, what: &str) -> Result<u64, ModelError> {
    if den == 0 || num % den != 0 || num < den {
        return Err(ModelError::inconsistent(format!(
            "{what} is {num}/{den}, not a positive integer"
        )));
    }
    Ok(num / den)
}

pub fn checked_mul(a: u64, b: u64, what: &str) -> Result<u64, ModelError> {
    a.checked_mul(b)
        .ok_or_else(|| ModelError::inconsistent(format!("{what} overflows ({a} * {b})")))
}

/// Parses a byte count such as `256`, `32KB`, `4 TiB` or `16m`.
///
/// Suffixes are binary multiples of 1024. Zero is rejected.
pub fn parse_size(input: &str) -> Result<u64, RunError> {
    let invalid = || RunError::InvalidSize {
        input: input.to_string(),
    };
    let cap = SIZE_RE.captures(input).ok_or_else(invalid)?;
    let value: u64 = cap[1].parse().map_err(|_| invalid())?;
    let shift = match cap.get(2).map(|m| m.as_str().to_ascii_lowercase()) {
        None => 0,
        Some(unit) => match unit.as_str() {
            "k" => 10,
            "m" => 20,
            "g" => 30,
            _ => 40,
        },
    };
    match value.checked_mul(1u64 << shift) {
        Some(0) | None => Err(invalid()),
        Some(bytes) => Ok(bytes),
    }
}

/// Parses an address in decimal or `0x`-prefixed hexadecimal.
pub fn parse_address(input: &str) -> Result<u128, RunError> {
    let trimmed = input.trim().replace('_', "");
    let parsed = match trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
        Some(hex) => u128::from_str_radix(hex, 16),
        None => trimmed.parse(),
    };
    parsed.map_err(|_| RunError::InvalidAddress {
        input: input.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ceil_log2_small_values() {
        assert_eq!(ceil_log2(0), None);
        assert_eq!(ceil_log2(1), Some(0));
        assert_eq!(ceil_log2(2), Some(1));
        assert_eq!(ceil_log2(3), Some(2));
        assert_eq!(ceil_log2(4), Some(2));
        assert_eq!(ceil_log2(5), Some(3));
        assert_eq!(ceil_log2(1 << 42), Some(42));
        assert_eq!(ceil_log2(u128::MAX), Some(128));
    }

    #[test]
    fn exact_div_rejects_fractions() {
        assert_eq!(exact_div(32768, 16, "block count").unwrap(), 2048);
        assert!(exact_div(100, 16, "block count").is_err());
        assert!(exact_div(8, 16, "block count").is_err());
        assert!(exact_div(8, 0, "block count").is_err());
    }

    #[test]
    fn sizes_with_suffixes() {
        assert_eq!(parse_size("256").unwrap(), 256);
        assert_eq!(parse_size("16B").unwrap(), 16);
        assert_eq!(parse_size("32KB").unwrap(), 32 * 1024);
        assert_eq!(parse_size("32 kb").unwrap(), 32 * 1024);
        assert_eq!(parse_size("256MiB").unwrap(), 256 << 20);
        assert_eq!(parse_size("1g").unwrap(), 1 << 30);
        assert_eq!(parse_size("4TB").unwrap(), 4 << 40);
    }

    #[test]
    fn sizes_rejected() {
        for bad in ["", "0", "0KB", "-4", "4PB", "1.5KB", "KB", "99999999999TB"] {
            assert!(
                matches!(parse_size(bad), Err(RunError::InvalidSize { .. })),
                "{bad} should not parse"
            );
        }
    }

    #[test]
    fn addresses() {
        assert_eq!(parse_address("4096").unwrap(), 4096);
        assert_eq!(parse_address("0x1F").unwrap(), 31);
        assert_eq!(parse_address("0xdead_beef").unwrap(), 0xdead_beef);
        assert!(parse_address("0xg").is_err());
        assert!(parse_address("-1").is_err());
    }
}
