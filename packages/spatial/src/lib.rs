#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! In-memory spatial index over snapshot features.
//!
//! Builds a bulk-loaded R-tree of feature bounding envelopes so that
//! containment queries against a boundary polygon only visit features whose
//! envelope overlaps the boundary's. The precise test is inclusive:
//! touching the boundary counts as intersecting.

use building_map_models::{Feature, Geometry};
use geo::{BoundingRect, Intersects, MultiPolygon};
use rstar::{AABB, RTree, RTreeObject};

/// One feature's store slot with its precomputed envelope.
#[derive(Debug)]
struct EnvelopeEntry {
    slot: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for EnvelopeEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Pre-built R-tree over every feature in a snapshot.
///
/// Constructed once at store load time. Candidate iteration order is the
/// tree's traversal order, which is deterministic for an unchanged snapshot
/// (the tree is bulk-loaded from the same input every time).
#[derive(Debug)]
pub struct FeatureIndex {
    tree: RTree<EnvelopeEntry>,
}

impl FeatureIndex {
    /// Builds the index from the store's feature slice.
    #[must_use]
    pub fn build(features: &[Feature]) -> Self {
        let entries = features
            .iter()
            .enumerate()
            .map(|(slot, feature)| EnvelopeEntry {
                slot,
                envelope: envelope_of(&feature.geometry),
            })
            .collect();

        Self {
            tree: RTree::bulk_load(entries),
        }
    }

    /// Lazily yields the store slots of features whose envelope overlaps
    /// the query envelope. Coarse pass only; callers still apply the
    /// precise geometry test.
    pub fn candidates_in(&self, envelope: AABB<[f64; 2]>) -> impl Iterator<Item = usize> + '_ {
        self.tree
            .locate_in_envelope_intersecting(&envelope)
            .map(|entry| entry.slot)
    }

    /// Number of indexed features.
    #[must_use]
    pub fn size(&self) -> usize {
        self.tree.size()
    }
}

/// Bounding envelope for a feature geometry.
#[must_use]
pub fn envelope_of(geometry: &Geometry) -> AABB<[f64; 2]> {
    match geometry {
        Geometry::Point(p) => AABB::from_point([p.x(), p.y()]),
        Geometry::Area(mp) => polygon_envelope(mp),
    }
}

/// Bounding envelope for a reference polygon.
/// A degenerate (empty) polygon collapses to a point envelope at the origin.
#[must_use]
pub fn polygon_envelope(polygon: &MultiPolygon<f64>) -> AABB<[f64; 2]> {
    polygon.bounding_rect().map_or_else(
        || AABB::from_point([0.0, 0.0]),
        |rect| AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]),
    )
}

/// Inclusive intersection test between a feature geometry and a reference
/// polygon.
///
/// A feature qualifies if any of its points lie inside or on the boundary,
/// so edge-touching footprints count.
#[must_use]
pub fn intersects(geometry: &Geometry, boundary: &MultiPolygon<f64>) -> bool {
    match geometry {
        Geometry::Point(p) => boundary.intersects(p),
        Geometry::Area(mp) => boundary.intersects(mp),
    }
}
