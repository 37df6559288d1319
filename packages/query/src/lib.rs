#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Compact filter expression parser for feature store queries.
//!
//! Expressions consist of an optional geometry-kind selector followed by
//! bracketed tag clauses, e.g.
//! `a[admin_level=8][population>50000][boundary=administrative]`.
//! Clauses are implicitly conjunctive. Parsing happens once; the resulting
//! [`FilterExpr`] is a stateless predicate reusable across any number of
//! features.
//!
//! Evaluation is total: a missing tag, or a non-numeric value where a
//! number is expected, makes the clause false rather than raising.

use building_map_models::{Feature, Geometry};

/// Geometry-kind restriction at the head of a filter expression.
///
/// `a` selects area features, `n` point features, `*` (or nothing) any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeSelector {
    /// Match any geometry kind.
    Any,
    /// Match only point features.
    Node,
    /// Match only area features.
    Area,
}

impl TypeSelector {
    fn matches(self, geometry: &Geometry) -> bool {
        match self {
            Self::Any => true,
            Self::Node => geometry.is_point(),
            Self::Area => geometry.is_area(),
        }
    }
}

/// A single bracketed clause of a filter expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    /// `key=value` — exact string equality.
    Equals {
        /// Tag key.
        key: String,
        /// Required tag value.
        value: String,
    },
    /// `key>number` — numeric coercion of the tag value.
    GreaterThan {
        /// Tag key.
        key: String,
        /// Exclusive lower bound.
        threshold: f64,
    },
    /// Bare `key` — tag presence.
    Present {
        /// Tag key.
        key: String,
    },
}

impl Clause {
    fn matches(&self, feature: &Feature) -> bool {
        match self {
            Self::Equals { key, value } => feature.tag(key) == Some(value.as_str()),
            Self::GreaterThan { key, threshold } => feature
                .tag(key)
                .and_then(|v| v.trim().parse::<f64>().ok())
                .is_some_and(|v| v > *threshold),
            Self::Present { key } => feature.has_tag(key),
        }
    }
}

/// A parsed filter expression: a geometry selector plus conjunctive clauses.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterExpr {
    /// Geometry-kind restriction.
    pub selector: TypeSelector,
    /// Tag clauses; all must hold.
    pub clauses: Vec<Clause>,
}

impl FilterExpr {
    /// Parses a filter expression string.
    ///
    /// # Errors
    ///
    /// Returns [`FilterParseError`] on an unknown selector, an unterminated
    /// or empty clause, a non-numeric comparison threshold, or stray input
    /// between clauses.
    pub fn parse(input: &str) -> Result<Self, FilterParseError> {
        let input = input.trim();
        let bracket = input.find('[').unwrap_or(input.len());
        let (selector_str, mut rest) = input.split_at(bracket);

        let selector = match selector_str.trim() {
            "" | "*" => TypeSelector::Any,
            "n" => TypeSelector::Node,
            "a" => TypeSelector::Area,
            other => return Err(FilterParseError::UnknownSelector(other.to_string())),
        };

        let mut clauses = Vec::new();
        while !rest.is_empty() {
            let Some(stripped) = rest.strip_prefix('[') else {
                return Err(FilterParseError::TrailingInput(rest.to_string()));
            };
            let Some(end) = stripped.find(']') else {
                return Err(FilterParseError::UnterminatedClause(input.to_string()));
            };
            clauses.push(parse_clause(&stripped[..end])?);
            rest = &stripped[end + 1..];
        }

        Ok(Self { selector, clauses })
    }

    /// Evaluates the predicate against a feature.
    ///
    /// True iff the geometry kind matches the selector and every clause
    /// holds for the feature's tags. Never panics, regardless of input.
    #[must_use]
    pub fn matches(&self, feature: &Feature) -> bool {
        self.selector.matches(&feature.geometry)
            && self.clauses.iter().all(|clause| clause.matches(feature))
    }
}

/// Parses a single clause body (the text between `[` and `]`).
fn parse_clause(body: &str) -> Result<Clause, FilterParseError> {
    // `=` before `>` so that values containing `>` stay exact-match.
    if let Some((key, value)) = body.split_once('=') {
        let key = key.trim();
        if key.is_empty() {
            return Err(FilterParseError::EmptyClause);
        }
        return Ok(Clause::Equals {
            key: key.to_string(),
            value: value.trim().to_string(),
        });
    }

    if let Some((key, raw)) = body.split_once('>') {
        let key = key.trim();
        if key.is_empty() {
            return Err(FilterParseError::EmptyClause);
        }
        let threshold =
            raw.trim()
                .parse::<f64>()
                .map_err(|_| FilterParseError::InvalidThreshold {
                    key: key.to_string(),
                    value: raw.trim().to_string(),
                })?;
        return Ok(Clause::GreaterThan {
            key: key.to_string(),
            threshold,
        });
    }

    let key = body.trim();
    if key.is_empty() {
        return Err(FilterParseError::EmptyClause);
    }
    Ok(Clause::Present {
        key: key.to_string(),
    })
}

/// Errors from filter expression parsing.
#[derive(Debug, thiserror::Error)]
pub enum FilterParseError {
    /// The leading selector is not `a`, `n`, or `*`.
    #[error("unknown type selector `{0}` in filter expression")]
    UnknownSelector(String),

    /// A `[` clause is missing its closing `]`.
    #[error("unterminated clause in filter expression `{0}`")]
    UnterminatedClause(String),

    /// Stray text between or after clauses.
    #[error("unexpected input `{0}` after clause")]
    TrailingInput(String),

    /// A clause with no key.
    #[error("empty clause in filter expression")]
    EmptyClause,

    /// A `>` comparison whose right-hand side is not a number.
    #[error("comparison threshold for `{key}` is not numeric: `{value}`")]
    InvalidThreshold {
        /// Tag key of the offending clause.
        key: String,
        /// The non-numeric right-hand side.
        value: String,
    },
}
