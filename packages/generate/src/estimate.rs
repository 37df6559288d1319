//! Floor area estimation and the significance threshold.
//!
//! Both functions are pure and deterministic; missing or malformed tag
//! data is recovered locally with defaults rather than surfaced.

use building_map_models::Feature;

/// Derives the estimated usable area for a building.
///
/// The footprint area is multiplied by the vertical multiplier taken from
/// `levels_tag`, parsed as a non-negative integer. An absent or unparsable
/// tag defaults the multiplier to 1 — missing level data is common in map
/// extracts and never aborts a run. The product is truncated to whole
/// units.
#[must_use]
pub fn estimated_area(feature: &Feature, levels_tag: &str) -> i64 {
    let levels = feature
        .tag(levels_tag)
        .and_then(|v| v.trim().parse::<u32>().ok())
        .unwrap_or(1);

    truncate(feature.footprint_area() * f64::from(levels))
}

/// Strict significance cutoff: only areas strictly greater than `cutoff`
/// pass; a building exactly at the cutoff is excluded.
#[must_use]
pub const fn passes_threshold(estimated_area: i64, cutoff: i64) -> bool {
    estimated_area > cutoff
}

#[allow(clippy::cast_possible_truncation)]
fn truncate(value: f64) -> i64 {
    value as i64
}
