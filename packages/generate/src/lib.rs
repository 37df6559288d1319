#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Building extraction pipeline.
//!
//! Resolves a named administrative boundary from the feature store, streams
//! the building candidates intersecting it, derives an estimated usable
//! area from the footprint and level tags, applies the significance
//! cutoff, and serializes the survivors as a JavaScript array literal.
//!
//! The pipeline is lazy and single-pass end to end: no candidate set is
//! materialized between the store iterator and the output stream, so
//! memory use is independent of region size. It runs once per invocation
//! against a static snapshot; there is no retry on failure because a retry
//! would reproduce the identical result.

pub mod estimate;
pub mod progress;
pub mod serialize;

use std::io::Write;
use std::sync::Arc;

use building_map_models::{BuildingRecord, Feature};
use building_map_query::{Clause, FilterExpr, FilterParseError, TypeSelector};
use building_map_store::FeatureStore;

use crate::progress::ProgressCallback;
use crate::serialize::RecordWriter;

/// Default boundary category filter: city-level administrative areas with
/// a significant population.
pub const DEFAULT_BOUNDARY_FILTER: &str =
    "a[admin_level=8][population>50000][boundary=administrative]";

/// Default boundary name to resolve.
pub const DEFAULT_BOUNDARY_NAME: &str = "Warszawa";

/// Default building candidate filter.
pub const DEFAULT_BUILDING_FILTER: &str = "a[building=apartments]";

/// Tag holding the vertical multiplier for area estimation.
pub const DEFAULT_LEVELS_TAG: &str = "building:levels";

/// Minimum estimated area (exclusive) for a building to be emitted.
pub const DEFAULT_MIN_ESTIMATED_AREA: i64 = 100;

/// Name of the emitted JavaScript array.
pub const DEFAULT_ARRAY_NAME: &str = "buildings";

/// Configuration for one pipeline run.
///
/// The defaults reproduce the production extraction (Warsaw apartment
/// buildings above 100 estimated square meters).
#[derive(Debug, Clone)]
pub struct GenerateConfig {
    /// Filter selecting boundary candidates.
    pub boundary_filter: String,
    /// Exact name of the boundary to resolve among the candidates.
    pub boundary_name: String,
    /// Filter selecting building candidates.
    pub building_filter: String,
    /// Tag holding the vertical multiplier.
    pub levels_tag: String,
    /// Exclusive estimated-area cutoff.
    pub min_estimated_area: i64,
    /// Name of the emitted array literal.
    pub array_name: String,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            boundary_filter: DEFAULT_BOUNDARY_FILTER.to_string(),
            boundary_name: DEFAULT_BOUNDARY_NAME.to_string(),
            building_filter: DEFAULT_BUILDING_FILTER.to_string(),
            levels_tag: DEFAULT_LEVELS_TAG.to_string(),
            min_estimated_area: DEFAULT_MIN_ESTIMATED_AREA,
            array_name: DEFAULT_ARRAY_NAME.to_string(),
        }
    }
}

/// Errors from the extraction pipeline.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    /// No boundary candidate matched the configured name (or the match
    /// carries no area geometry to filter against).
    #[error("boundary `{name}` not found in the feature store")]
    BoundaryNotFound {
        /// The name that failed to resolve.
        name: String,
    },

    /// A configured filter expression failed to parse.
    #[error("invalid filter expression: {0}")]
    Filter(#[from] FilterParseError),

    /// Output stream failure.
    #[error("failed to write output: {0}")]
    Io(#[from] std::io::Error),
}

/// Runs the pipeline against `store`, writing the array literal to `out`.
///
/// Returns the number of records emitted. Boundary resolution happens
/// before anything is written, so a failed resolution leaves the output
/// stream untouched. Output record order follows the store's iteration
/// order for the filtered query; no sort is applied.
///
/// # Errors
///
/// Returns [`GenerateError::BoundaryNotFound`] if the boundary cannot be
/// resolved, [`GenerateError::Filter`] if a configured expression is
/// malformed, or [`GenerateError::Io`] on stream failure.
pub fn run<W: Write>(
    store: &FeatureStore,
    config: &GenerateConfig,
    out: W,
    progress: Option<Arc<dyn ProgressCallback>>,
) -> Result<u64, GenerateError> {
    let progress = progress.unwrap_or_else(progress::null_progress);

    let boundary = resolve_boundary(store, config)?;
    let Some(boundary_polygon) = boundary.area_polygon() else {
        // The default `a[...]` filter guarantees an area; an overridden
        // filter may resolve to a point feature, which cannot serve as a
        // containment reference.
        return Err(GenerateError::BoundaryNotFound {
            name: config.boundary_name.clone(),
        });
    };
    log::info!(
        "Resolved boundary `{}` (feature {})",
        config.boundary_name,
        boundary.id
    );

    let building_filter = FilterExpr::parse(&config.building_filter)?;
    progress.set_message(format!(
        "Scanning buildings within {}...",
        config.boundary_name
    ));

    let mut writer = RecordWriter::new(out, &config.array_name)?;
    let mut scanned: u64 = 0;

    for feature in store.query_within(&building_filter, boundary_polygon) {
        scanned += 1;
        let estimated_area = estimate::estimated_area(feature, &config.levels_tag);
        if estimate::passes_threshold(estimated_area, config.min_estimated_area) {
            let (lat, lon) = feature.position();
            writer.write_record(&BuildingRecord {
                lat,
                lon,
                estimated_area,
            })?;
        }
        progress.inc(1);
    }

    let emitted = writer.finish()?;
    progress.finish(format!("{emitted} buildings emitted"));
    log::info!("Emitted {emitted} of {scanned} candidate buildings");
    Ok(emitted)
}

/// Resolves the boundary reference.
///
/// Evaluates the category filter against the store, applies exact name
/// equality to the candidates, and takes the first match in store order.
/// When several candidates share the name the first wins (the snapshot
/// occasionally carries duplicate admin boundaries); the extras are
/// reported at debug level.
///
/// # Errors
///
/// Returns [`GenerateError::BoundaryNotFound`] if no candidate matches,
/// or [`GenerateError::Filter`] if the boundary filter is malformed.
pub fn resolve_boundary<'a>(
    store: &'a FeatureStore,
    config: &GenerateConfig,
) -> Result<&'a Feature, GenerateError> {
    let category = FilterExpr::parse(&config.boundary_filter)?;
    let by_name = FilterExpr {
        selector: TypeSelector::Any,
        clauses: vec![Clause::Equals {
            key: "name".to_string(),
            value: config.boundary_name.clone(),
        }],
    };

    let mut candidates = store.query(&category).filter(|f| by_name.matches(f));
    let Some(boundary) = candidates.next() else {
        return Err(GenerateError::BoundaryNotFound {
            name: config.boundary_name.clone(),
        });
    };

    let skipped = candidates.count();
    if skipped > 0 {
        log::debug!(
            "Boundary name `{}` matched {skipped} additional candidate(s); using feature {}",
            config.boundary_name,
            boundary.id
        );
    }

    Ok(boundary)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use building_map_models::Geometry;
    use geo::{LineString, MultiPolygon, Polygon};

    use super::*;

    fn rect(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Geometry {
        let exterior = LineString::from(vec![
            (min_x, min_y),
            (max_x, min_y),
            (max_x, max_y),
            (min_x, max_y),
            (min_x, min_y),
        ]);
        Geometry::Area(MultiPolygon(vec![Polygon::new(exterior, vec![])]))
    }

    fn feature(id: i64, pairs: &[(&str, &str)], geometry: Geometry) -> Feature {
        let tags: BTreeMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Feature::new(id, tags, geometry)
    }

    fn warsaw_boundary(id: i64) -> Feature {
        feature(
            id,
            &[
                ("admin_level", "8"),
                ("population", "1800000"),
                ("boundary", "administrative"),
                ("name", "Warszawa"),
            ],
            rect(0.0, 0.0, 20.0, 20.0),
        )
    }

    fn sample_store() -> FeatureStore {
        FeatureStore::from_features(vec![
            warsaw_boundary(10),
            // Inside the boundary: 8x10 footprint, two levels -> 160.
            feature(
                11,
                &[("building", "apartments"), ("building:levels", "2")],
                rect(2.0, 2.0, 10.0, 12.0),
            ),
            // Outside the boundary entirely: 10x50 footprint -> 500.
            feature(
                12,
                &[("building", "apartments")],
                rect(30.0, 30.0, 40.0, 80.0),
            ),
        ])
    }

    #[test]
    fn resolves_boundary_by_exact_name() {
        let store = sample_store();
        let config = GenerateConfig::default();
        let boundary = resolve_boundary(&store, &config).unwrap();
        assert_eq!(boundary.id, 10);
    }

    #[test]
    fn first_candidate_wins_on_duplicate_names() {
        let store = FeatureStore::from_features(vec![warsaw_boundary(10), warsaw_boundary(20)]);
        let config = GenerateConfig::default();
        let boundary = resolve_boundary(&store, &config).unwrap();
        assert_eq!(boundary.id, 10);
    }

    #[test]
    fn unknown_boundary_name_is_fatal() {
        let store = sample_store();
        let config = GenerateConfig {
            boundary_name: "Kraków".to_string(),
            ..GenerateConfig::default()
        };
        let err = resolve_boundary(&store, &config).unwrap_err();
        assert!(matches!(err, GenerateError::BoundaryNotFound { .. }));
    }

    #[test]
    fn failed_resolution_writes_nothing() {
        let store = sample_store();
        let config = GenerateConfig {
            boundary_name: "Kraków".to_string(),
            ..GenerateConfig::default()
        };
        let mut out = Vec::new();
        let err = run(&store, &config, &mut out, None).unwrap_err();
        assert!(matches!(err, GenerateError::BoundaryNotFound { .. }));
        assert!(out.is_empty());
    }

    #[test]
    fn emits_only_the_qualifying_inside_building() {
        let store = sample_store();
        let config = GenerateConfig::default();

        let mut out = Vec::new();
        let emitted = run(&store, &config, &mut out, None).unwrap();

        assert_eq!(emitted, 1);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "const buildings = [\n[7, 6, 160],\n];\n"
        );
    }

    #[test]
    fn cutoff_drops_insignificant_buildings() {
        let store = FeatureStore::from_features(vec![
            warsaw_boundary(10),
            // 10x10 footprint, single level -> exactly the cutoff of 100.
            feature(13, &[("building", "apartments")], rect(1.0, 1.0, 11.0, 11.0)),
        ]);
        let config = GenerateConfig::default();

        let mut out = Vec::new();
        let emitted = run(&store, &config, &mut out, None).unwrap();

        assert_eq!(emitted, 0);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "const buildings = [\n];\n"
        );
    }

    #[test]
    fn repeated_runs_are_byte_identical() {
        let store = sample_store();
        let config = GenerateConfig::default();

        let mut first = Vec::new();
        run(&store, &config, &mut first, None).unwrap();
        let mut second = Vec::new();
        run(&store, &config, &mut second, None).unwrap();

        assert_eq!(first, second);
    }
}
