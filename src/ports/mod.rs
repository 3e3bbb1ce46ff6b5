//! Port reference data and port proximity filtering.
//!
//! Ports are loaded once per run and never change afterwards. Tracks are
//! kept when any position on them comes within the proximity buffer of at
//! least one port; see [`PortIndex::any_within`].

pub mod index;

pub use index::{IndexedPort, PortIndex};

use crate::Port;

/// Normalize a tonnage figure such as `"1,234,567"` to an integer.
///
/// Thousands separators (`,` `_` and spaces) are stripped. Returns `None` for
/// empty or non-numeric input.
pub fn parse_tonnage(raw: &str) -> Option<u64> {
    let digits: String = raw
        .chars()
        .filter(|c| !matches!(c, ',' | '_') && !c.is_whitespace())
        .collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

/// Ports ordered by tonnage, largest first. Ties keep rank order.
pub fn ports_by_tonnage(ports: &[Port]) -> Vec<&Port> {
    let mut sorted: Vec<&Port> = ports.iter().collect();
    sorted.sort_by(|a, b| b.tonnage.cmp(&a.tonnage).then(a.rank.cmp(&b.rank)));
    sorted
}
