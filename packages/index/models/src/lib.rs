#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Shared types for the place search index.
//!
//! This crate contains only data types and configuration structs. It has no
//! heavyweight dependencies (no tantivy, no I/O).

use serde::{Deserialize, Serialize};

/// A named point-of-interest record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchItem {
    /// Unique record identity; upserts replace by id.
    pub id: u64,
    /// Display name, tokenized for full-text search.
    pub name: String,
    /// Longitude in degrees (WGS84, [-180, 180]).
    pub longitude: f64,
    /// Latitude in degrees (WGS84, [-90, 90]).
    pub latitude: f64,
}

impl SearchItem {
    /// Convenience constructor.
    #[must_use]
    pub fn new(id: u64, name: impl Into<String>, longitude: f64, latitude: f64) -> Self {
        Self {
            id,
            name: name.into(),
            longitude,
            latitude,
        }
    }
}

/// Configuration for opening a place index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceIndexConfig {
    /// Directory where the tantivy index is stored.
    pub index_dir: String,

    /// Maximum prefix-tree depth. Eleven geohash characters give
    /// sub-metre cell resolution.
    #[serde(default = "default_max_levels")]
    pub max_levels: usize,

    /// Earth radius used for kilometre/degree conversion. Defaults to the
    /// IUGG mean radius.
    #[serde(default = "default_earth_radius_km")]
    pub earth_radius_km: f64,

    /// Memory budget for the tantivy `IndexWriter` in bytes.
    /// Defaults to 256 MB.
    #[serde(default = "default_writer_heap")]
    pub writer_heap_bytes: usize,

    /// Field name for the tokenized display name.
    #[serde(default = "default_name_field")]
    pub name_field: String,

    /// Field name for the spatial token terms. The stored coordinate
    /// composite lives at `"{location_field}_xy"`.
    #[serde(default = "default_location_field")]
    pub location_field: String,

    /// Field name for the record id.
    #[serde(default = "default_id_field")]
    pub id_field: String,
}

const fn default_max_levels() -> usize {
    11
}

const fn default_earth_radius_km() -> f64 {
    6_371.008_771_415_06
}

const fn default_writer_heap() -> usize {
    256 * 1024 * 1024 // 256 MB
}

fn default_name_field() -> String {
    "name".to_string()
}

fn default_location_field() -> String {
    "location".to_string()
}

fn default_id_field() -> String {
    "id".to_string()
}

impl PlaceIndexConfig {
    /// Configuration with defaults for everything but the directory.
    #[must_use]
    pub fn for_dir(index_dir: impl Into<String>) -> Self {
        Self {
            index_dir: index_dir.into(),
            max_levels: default_max_levels(),
            earth_radius_km: default_earth_radius_km(),
            writer_heap_bytes: default_writer_heap(),
            name_field: default_name_field(),
            location_field: default_location_field(),
            id_field: default_id_field(),
        }
    }
}

impl Default for PlaceIndexConfig {
    fn default() -> Self {
        Self::for_dir(String::new())
    }
}
