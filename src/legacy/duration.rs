//! Prometheus-style duration strings (`1h30m`, `5s`, `250ms`)

use serde::{Deserialize, Deserializer};
use std::time::Duration;

const UNITS: [(&str, u64); 7] = [
    ("y", 365 * 24 * 60 * 60 * 1000),
    ("w", 7 * 24 * 60 * 60 * 1000),
    ("d", 24 * 60 * 60 * 1000),
    ("h", 60 * 60 * 1000),
    ("m", 60 * 1000),
    ("s", 1000),
    ("ms", 1),
];

/// Parse a duration such as `1h30m`.
///
/// Units must appear from largest to smallest, each at most once. A bare
/// `0` is accepted.
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let s = input.trim();
    if s == "0" {
        return Ok(Duration::ZERO);
    }
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    let mut rest = s;
    let mut total_ms: u64 = 0;
    // index into UNITS of the last unit seen; later units must be smaller
    let mut last_unit: Option<usize> = None;

    while !rest.is_empty() {
        let digits = rest.chars().take_while(|c| c.is_ascii_digit()).count();
        if digits == 0 {
            return Err(format!("not a valid duration string: {:?}", input));
        }
        let amount: u64 = rest[..digits]
            .parse()
            .map_err(|_| format!("duration out of range: {:?}", input))?;
        rest = &rest[digits..];

        let unit_len = rest.chars().take_while(|c| c.is_ascii_alphabetic()).count();
        let unit = &rest[..unit_len];
        let position = UNITS
            .iter()
            .position(|(name, _)| *name == unit)
            .ok_or_else(|| format!("unknown unit {:?} in duration {:?}", unit, input))?;
        if last_unit.is_some_and(|last| position <= last) {
            return Err(format!("not a valid duration string: {:?}", input));
        }
        last_unit = Some(position);
        rest = &rest[unit_len..];

        total_ms = amount
            .checked_mul(UNITS[position].1)
            .and_then(|ms| total_ms.checked_add(ms))
            .ok_or_else(|| format!("duration out of range: {:?}", input))?;
    }

    Ok(Duration::from_millis(total_ms))
}

/// Serde adapter for duration fields
pub(crate) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse_duration(&raw).map_err(serde::de::Error::custom)
}
