#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Core data types for the building map pipeline.
//!
//! Defines the immutable [`Feature`] snapshot (tags + geometry) produced by
//! the feature store, and the transient [`BuildingRecord`] tuple emitted by
//! the generation pipeline. Derived metrics (position, footprint area) are
//! computed on demand and never stored on the feature itself.

use std::collections::BTreeMap;

use geo::{Area, Centroid, MultiPolygon, Point};

/// Geometry of a [`Feature`]: either a single point or an area.
///
/// Areas are normalized to [`MultiPolygon`] so that single-ring and
/// multi-ring footprints flow through the same code paths.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    /// A point location (longitude = x, latitude = y).
    Point(Point<f64>),
    /// A polygonal footprint or boundary.
    Area(MultiPolygon<f64>),
}

impl Geometry {
    /// Returns `true` if this geometry is an area.
    #[must_use]
    pub const fn is_area(&self) -> bool {
        matches!(self, Self::Area(_))
    }

    /// Returns `true` if this geometry is a point.
    #[must_use]
    pub const fn is_point(&self) -> bool {
        matches!(self, Self::Point(_))
    }
}

/// Immutable snapshot of one geographic entity.
///
/// Produced by the feature store during snapshot loading and read-only
/// thereafter. Tag keys are unique; values are uninterpreted strings in the
/// usual OSM style (`"building" => "apartments"`,
/// `"building:levels" => "4"`).
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    /// Stable identifier within the snapshot.
    pub id: i64,
    /// Tag mapping (key -> value).
    pub tags: BTreeMap<String, String>,
    /// Point or area geometry.
    pub geometry: Geometry,
}

impl Feature {
    /// Creates a feature from its parts.
    #[must_use]
    pub const fn new(id: i64, tags: BTreeMap<String, String>, geometry: Geometry) -> Self {
        Self { id, tags, geometry }
    }

    /// Returns the value of `key`, if tagged.
    #[must_use]
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    /// Returns `true` if the feature carries `key` at all.
    #[must_use]
    pub fn has_tag(&self, key: &str) -> bool {
        self.tags.contains_key(key)
    }

    /// Representative position as `(latitude, longitude)`.
    ///
    /// Points return their own coordinates; areas return their centroid.
    /// A degenerate area (zero-area rings) falls back to its first exterior
    /// coordinate.
    #[must_use]
    pub fn position(&self) -> (f64, f64) {
        match &self.geometry {
            Geometry::Point(p) => (p.y(), p.x()),
            Geometry::Area(mp) => mp.centroid().map_or_else(
                || {
                    mp.0.first()
                        .and_then(|poly| poly.exterior().coords().next())
                        .map_or((0.0, 0.0), |c| (c.y, c.x))
                },
                |c| (c.y(), c.x()),
            ),
        }
    }

    /// Planar unsigned area of the footprint in snapshot-native units.
    ///
    /// Points have no footprint and return `0.0`.
    #[must_use]
    pub fn footprint_area(&self) -> f64 {
        match &self.geometry {
            Geometry::Point(_) => 0.0,
            Geometry::Area(mp) => mp.unsigned_area(),
        }
    }

    /// Returns the area geometry, or `None` for point features.
    #[must_use]
    pub const fn area_polygon(&self) -> Option<&MultiPolygon<f64>> {
        match &self.geometry {
            Geometry::Area(mp) => Some(mp),
            Geometry::Point(_) => None,
        }
    }
}

/// One emitted output record: a qualifying building's representative
/// position and its estimated usable area.
///
/// Exists only between estimation and serialization; written once to the
/// output stream and not retained.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuildingRecord {
    /// Latitude of the representative position.
    pub lat: f64,
    /// Longitude of the representative position.
    pub lon: f64,
    /// Estimated usable area, truncated to whole units.
    pub estimated_area: i64,
}

#[cfg(test)]
mod tests {
    use geo::{LineString, Polygon};

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

    fn tags(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn tag_lookup() {
        let feature = Feature::new(
            1,
            tags(&[("building", "apartments"), ("building:levels", "4")]),
            rect(0.0, 0.0, 1.0, 1.0),
        );
        assert_eq!(feature.tag("building"), Some("apartments"));
        assert_eq!(feature.tag("name"), None);
        assert!(feature.has_tag("building:levels"));
        assert!(!feature.has_tag("levels"));
    }

    #[test]
    fn point_position_is_own_coordinates() {
        let feature = Feature::new(
            2,
            BTreeMap::new(),
            Geometry::Point(Point::new(21.0122, 52.2297)),
        );
        let (lat, lon) = feature.position();
        assert!((lat - 52.2297).abs() < f64::EPSILON);
        assert!((lon - 21.0122).abs() < f64::EPSILON);
    }

    #[test]
    fn area_position_is_centroid() {
        let feature = Feature::new(3, BTreeMap::new(), rect(0.0, 0.0, 4.0, 2.0));
        let (lat, lon) = feature.position();
        assert!((lat - 1.0).abs() < f64::EPSILON);
        assert!((lon - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn footprint_area_of_rectangle() {
        let feature = Feature::new(4, BTreeMap::new(), rect(1.0, 1.0, 9.0, 11.0));
        assert!((feature.footprint_area() - 80.0).abs() < 1e-9);
    }

    #[test]
    fn point_has_zero_footprint() {
        let feature = Feature::new(5, BTreeMap::new(), Geometry::Point(Point::new(0.0, 0.0)));
        assert!(feature.footprint_area().abs() < f64::EPSILON);
        assert!(feature.area_polygon().is_none());
    }

    #[test]
    fn geometry_kind_predicates() {
        assert!(rect(0.0, 0.0, 1.0, 1.0).is_area());
        assert!(!rect(0.0, 0.0, 1.0, 1.0).is_point());
        assert!(Geometry::Point(Point::new(0.0, 0.0)).is_point());
    }
}
