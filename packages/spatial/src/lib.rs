#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Engine-agnostic spatial primitives for place search.
//!
//! Three concerns live here:
//!
//! - [`geodesy`] — great-circle math: kilometre/angular-degree conversion
//!   and haversine central angles.
//! - [`region`] — circular query regions with rectangle relation tests.
//! - [`grid`] — the geohash prefix grid: ancestor token chains for points
//!   and covering token sets for regions.
//!
//! Nothing in this crate knows about the index engine; the search crate
//! turns tokens into index terms.

pub mod geodesy;
pub mod grid;
pub mod region;

pub use grid::{CellCover, PrefixGrid};
pub use region::{Circle, SpatialRelation};

/// Errors from spatial computations.
#[derive(Debug, thiserror::Error)]
pub enum SpatialError {
    /// Query radius was zero, negative, or non-finite.
    #[error("Invalid radius: {0} degrees")]
    InvalidRadius(f64),

    /// Longitude or latitude outside the WGS84 value range.
    #[error("Coordinate out of range: ({lon}, {lat})")]
    CoordinateOutOfRange {
        /// Longitude in degrees.
        lon: f64,
        /// Latitude in degrees.
        lat: f64,
    },

    /// Grid precision outside the supported range.
    #[error("Invalid grid precision: {0}")]
    InvalidPrecision(usize),

    /// Geohash encoding/decoding error.
    #[error("Geohash error: {0}")]
    Geohash(#[from] geohash::GeohashError),
}
