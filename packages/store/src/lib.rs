#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! GeoJSON-backed feature store.
//!
//! Loads a `FeatureCollection` snapshot (optionally gzip-compressed,
//! detected by a `.gz` extension) into memory, coerces member properties
//! into tag maps, builds an R-tree index over the feature envelopes, and
//! serves lazy predicate and containment queries.
//!
//! The store is read-only for the duration of a run. Plain predicate
//! queries iterate in snapshot insertion order; containment queries iterate
//! in index traversal order. Both orders are deterministic for an unchanged
//! snapshot.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read as _;
use std::path::Path;

use building_map_models::{Feature, Geometry};
use building_map_query::FilterExpr;
use building_map_spatial::{FeatureIndex, polygon_envelope};
use flate2::read::GzDecoder;
use geo::MultiPolygon;
use geojson::GeoJson;

/// An indexed, immutable collection of geographic features.
#[derive(Debug)]
pub struct FeatureStore {
    features: Vec<Feature>,
    index: FeatureIndex,
}

impl FeatureStore {
    /// Opens a snapshot file and loads it into memory.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the file is missing, unreadable, not valid
    /// `GeoJSON`, or not a `FeatureCollection`.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            return Err(StoreError::FileNotFound(path.display().to_string()));
        }

        log::info!("Loading feature snapshot: {}", path.display());
        let contents = read_snapshot(path)?;

        let geojson: GeoJson = contents.parse().map_err(|e: geojson::Error| StoreError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let GeoJson::FeatureCollection(collection) = geojson else {
            return Err(StoreError::Parse {
                path: path.display().to_string(),
                message: "snapshot is not a FeatureCollection".to_string(),
            });
        };

        let store = Self::from_collection(collection);
        log::info!("Loaded {} features into store", store.len());
        Ok(store)
    }

    /// Builds a store from an already-parsed `FeatureCollection`.
    ///
    /// Members with unsupported geometry (lines, geometry collections) are
    /// skipped with a warning rather than failing the load.
    #[must_use]
    pub fn from_collection(collection: geojson::FeatureCollection) -> Self {
        let mut features = Vec::with_capacity(collection.features.len());
        for (slot, member) in collection.features.into_iter().enumerate() {
            if let Some(feature) = convert_member(member, slot) {
                features.push(feature);
            }
        }
        Self::from_features(features)
    }

    /// Builds a store directly from features (in-memory snapshots, tests).
    #[must_use]
    pub fn from_features(features: Vec<Feature>) -> Self {
        let index = FeatureIndex::build(&features);
        Self { features, index }
    }

    /// Number of features in the store.
    #[must_use]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Returns `true` if the store holds no features.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Lazily evaluates `filter` over the store in insertion order.
    ///
    /// The yielded references live as long as the store itself, not the
    /// filter borrow.
    pub fn query<'a>(&'a self, filter: &FilterExpr) -> impl Iterator<Item = &'a Feature> {
        self.features
            .iter()
            .filter(move |feature| filter.matches(feature))
    }

    /// Lazily evaluates `filter` restricted to features intersecting
    /// `boundary` (inclusive: edge-touching counts).
    ///
    /// Walks R-tree candidates inside the boundary's envelope, applies the
    /// tag predicate, then the precise intersection test, one feature at a
    /// time. Memory use is bounded by a single feature regardless of how
    /// many candidates qualify.
    pub fn query_within<'a>(
        &'a self,
        filter: &FilterExpr,
        boundary: &MultiPolygon<f64>,
    ) -> impl Iterator<Item = &'a Feature> {
        let envelope = polygon_envelope(boundary);
        self.index
            .candidates_in(envelope)
            .map(move |slot| &self.features[slot])
            .filter(move |feature| {
                filter.matches(feature)
                    && building_map_spatial::intersects(&feature.geometry, boundary)
            })
    }
}

/// Reads the snapshot file into a string, transparently decompressing
/// `.gz` inputs.
fn read_snapshot(path: &Path) -> Result<String, StoreError> {
    let mut contents = String::new();
    let file = File::open(path)?;

    if path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("gz"))
    {
        GzDecoder::new(file).read_to_string(&mut contents)?;
    } else {
        let mut file = file;
        file.read_to_string(&mut contents)?;
    }

    Ok(contents)
}

/// Converts one `GeoJSON` member into a [`Feature`].
///
/// Returns `None` (and warns) for members without a usable point or
/// polygon geometry. `slot` supplies the fallback identifier for members
/// without an `id`.
fn convert_member(member: geojson::Feature, slot: usize) -> Option<Feature> {
    let Some(geometry) = member.geometry else {
        log::warn!("Skipping snapshot member {slot} without geometry");
        return None;
    };

    let geo_geom: geo::Geometry<f64> = match geometry.try_into() {
        Ok(g) => g,
        Err(e) => {
            log::warn!("Skipping snapshot member {slot}: {e}");
            return None;
        }
    };

    let geometry = match geo_geom {
        geo::Geometry::Point(p) => Geometry::Point(p),
        geo::Geometry::Polygon(p) => Geometry::Area(MultiPolygon(vec![p])),
        geo::Geometry::MultiPolygon(mp) => Geometry::Area(mp),
        _ => {
            log::warn!("Skipping snapshot member {slot} with unsupported geometry kind");
            return None;
        }
    };

    let id = member.id.as_ref().map_or(slot_id(slot), feature_id);
    let tags = member.properties.map_or_else(BTreeMap::new, coerce_tags);

    Some(Feature::new(id, tags, geometry))
}

#[allow(clippy::cast_possible_wrap)]
const fn slot_id(slot: usize) -> i64 {
    slot as i64
}

/// Extracts a numeric feature identifier from a `GeoJSON` id.
fn feature_id(id: &geojson::feature::Id) -> i64 {
    match id {
        geojson::feature::Id::Number(n) => n.as_i64().unwrap_or_default(),
        geojson::feature::Id::String(s) => s.parse().unwrap_or_default(),
    }
}

/// Coerces `GeoJSON` property values into string tags.
///
/// Strings pass through; numbers and booleans are stringified; null,
/// array, and object values are dropped.
fn coerce_tags(properties: serde_json::Map<String, serde_json::Value>) -> BTreeMap<String, String> {
    let mut tags = BTreeMap::new();
    for (key, value) in properties {
        match value {
            serde_json::Value::String(s) => {
                tags.insert(key, s);
            }
            serde_json::Value::Number(n) => {
                tags.insert(key, n.to_string());
            }
            serde_json::Value::Bool(b) => {
                tags.insert(key, b.to_string());
            }
            serde_json::Value::Null
            | serde_json::Value::Array(_)
            | serde_json::Value::Object(_) => {
                log::debug!("Dropping non-scalar property `{key}`");
            }
        }
    }
    tags
}

/// Errors from snapshot loading.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Snapshot file not found.
    #[error("feature snapshot not found: {0}")]
    FileNotFound(String),

    /// I/O failure reading the snapshot.
    #[error("failed to read feature snapshot: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot is not a valid `GeoJSON` `FeatureCollection`.
    #[error("failed to parse snapshot {path}: {message}")]
    Parse {
        /// Path to the snapshot file.
        path: String,
        /// Error description.
        message: String,
    },
}
