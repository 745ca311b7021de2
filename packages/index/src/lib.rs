#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Tantivy-based spatial-textual search index for named places.
//!
//! Indexes named point records and answers combined full-text + radius
//! queries: records whose name matches the query text and whose location
//! lies within a great-circle distance of the query point, ranked by a
//! blend of text relevance and proximity.
//!
//! # Architecture
//!
//! - **Index time**: each record stores its tokenized name, its
//!   coordinates, and one raw term per ancestor cell of its geohash
//!   prefix chain.
//! - **Query time**: the user text becomes an OR query over the name
//!   field; the radius becomes a term-overlap filter over the region's
//!   covering cells (a hard filter, contributing no score); ranking adds
//!   a reciprocal-distance score to the text score.
//!
//! # Usage
//!
//! ```rust,no_run
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! use place_search_index::PlaceIndex;
//! use place_search_index_models::{PlaceIndexConfig, SearchItem};
//!
//! let index = PlaceIndex::open(PlaceIndexConfig::for_dir("data/places"))?;
//! index.upsert(&SearchItem::new(1, "Berlin", 13.3833, 52.5167))?;
//! let hits = index
//!     .search_by_location("b*", 13.4, 52.5, 50.0, 10)
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod document;
pub mod query;
pub mod schema;
pub mod strategy;

use std::path::{Path, PathBuf};

use geo::Point;
use place_search_spatial::{Circle, PrefixGrid, SpatialError, geodesy, grid};
use tantivy::collector::TopDocs;
use tantivy::directory::{INDEX_WRITER_LOCK, MmapDirectory};
use tantivy::query::{BooleanQuery, ConstScoreQuery, Occur, Query};
use tantivy::{
    DocAddress, Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, Term,
};

pub use place_search_index_models::{PlaceIndexConfig, SearchItem};
use schema::PlaceFields;
use strategy::PrefixTreeStrategy;

/// Default number of hits returned by a location search.
pub const DEFAULT_MAX_HITS: usize = 10;

/// Errors from place index operations.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// Invalid configuration at open time.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The backing index cannot be opened or created.
    #[error("Index unavailable at {path}: {reason}")]
    IndexUnavailable {
        /// Index directory.
        path: String,
        /// Underlying failure.
        reason: String,
    },

    /// Free-text query unusable even after the escaped retry.
    #[error("Unparsable query: {0:?}")]
    QueryParse(String),

    /// Stored record missing or malformed on read.
    #[error("Record format error: {0}")]
    RecordFormat(String),

    /// Spatial computation error.
    #[error("Spatial error: {0}")]
    Spatial(#[from] SpatialError),

    /// Tantivy error.
    #[error("Tantivy error: {0}")]
    Tantivy(#[from] tantivy::TantivyError),

    /// Async task join error.
    #[error("Task join error: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A handle to an opened place index.
///
/// The index is backed by memory-mapped files. Searches run against
/// snapshot searchers and may run concurrently; writes acquire a scoped
/// exclusive writer per call and reload the shared reader on commit.
pub struct PlaceIndex {
    config: PlaceIndexConfig,
    index: Index,
    fields: PlaceFields,
    strategy: PrefixTreeStrategy,
    reader: IndexReader,
}

impl PlaceIndex {
    /// Opens (or creates) a place index in the configured directory.
    ///
    /// Recovery is part of opening: a writer lock file left behind by a
    /// crashed process is removed before any writer is acquired. Closing
    /// is `Drop`.
    ///
    /// # Errors
    ///
    /// [`SearchError::Configuration`] on an invalid configuration;
    /// [`SearchError::IndexUnavailable`] when the directory cannot be
    /// opened or the index cannot be loaded.
    pub fn open(config: PlaceIndexConfig) -> Result<Self, SearchError> {
        validate_config(&config)?;
        let index_dir = PathBuf::from(&config.index_dir);

        if !index_dir.exists() {
            std::fs::create_dir_all(&index_dir)?;
        }
        clear_stale_writer_lock(&index_dir)?;

        log::info!("Opening place index at {}", index_dir.display());

        let directory =
            MmapDirectory::open(&index_dir).map_err(|e| unavailable(&index_dir, &e))?;
        let index = Index::open_or_create(directory, schema::build_schema(&config))
            .map_err(|e| unavailable(&index_dir, &e))?;
        schema::register_tokenizers(&index);

        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::OnCommitWithDelay)
            .try_into()
            .map_err(|e: tantivy::TantivyError| unavailable(&index_dir, &e))?;

        let tantivy_schema = index.schema();
        let fields = PlaceFields::from_schema(&tantivy_schema, &config);
        let strategy = PrefixTreeStrategy::new(
            PrefixGrid::new(config.max_levels)?,
            config.location_field.clone(),
        );

        Ok(Self {
            config,
            index,
            fields,
            strategy,
            reader,
        })
    }

    /// Removes every record from the index.
    ///
    /// Subsequent searches return empty until records are re-inserted.
    ///
    /// # Errors
    ///
    /// Returns an error if the writer cannot be acquired or the commit
    /// fails.
    pub fn clear(&self) -> Result<(), SearchError> {
        let mut writer = self.writer()?;
        writer.delete_all_documents()?;
        writer.commit()?;
        self.reader.reload()?;
        log::info!("Cleared place index at {}", self.config.index_dir);
        Ok(())
    }

    /// Inserts a record, replacing any existing record with the same id.
    ///
    /// # Errors
    ///
    /// Out-of-range coordinates and writer failures surface; a failed call
    /// commits nothing.
    pub fn upsert(&self, item: &SearchItem) -> Result<(), SearchError> {
        let doc = document::to_document(item, &self.fields, &self.strategy)?;
        let mut writer = self.writer()?;
        writer.delete_term(Term::from_field_u64(self.fields.id, item.id));
        writer.add_document(doc)?;
        writer.commit()?;
        self.reader.reload()?;
        log::trace!("Upserted record {} ({:?})", item.id, item.name);
        Ok(())
    }

    /// Searches for records whose name matches `query_text` and whose
    /// location lies within `radius_km` of the center, ranked by combined
    /// text relevance and proximity.
    ///
    /// This is an async wrapper around sync tantivy search, dispatched to
    /// a blocking thread pool.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid radius or center, a blank query
    /// text, or an index failure.
    pub async fn search_by_location(
        &self,
        query_text: &str,
        longitude: f64,
        latitude: f64,
        radius_km: f64,
        max_hits: usize,
    ) -> Result<Vec<SearchItem>, SearchError> {
        let reader = self.reader.clone();
        let fields = self.fields.clone();
        let strategy = self.strategy.clone();
        let earth_radius_km = self.config.earth_radius_km;
        let query_text = query_text.to_string();

        tokio::task::spawn_blocking(move || {
            search_sync(&SearchRequest {
                reader: &reader,
                fields: &fields,
                strategy: &strategy,
                earth_radius_km,
                query_text: &query_text,
                longitude,
                latitude,
                radius_km,
                max_hits,
            })
        })
        .await?
    }

    /// Synchronous search (for use in non-async contexts).
    ///
    /// # Errors
    ///
    /// Same as [`Self::search_by_location`].
    pub fn search_by_location_sync(
        &self,
        query_text: &str,
        longitude: f64,
        latitude: f64,
        radius_km: f64,
        max_hits: usize,
    ) -> Result<Vec<SearchItem>, SearchError> {
        search_sync(&SearchRequest {
            reader: &self.reader,
            fields: &self.fields,
            strategy: &self.strategy,
            earth_radius_km: self.config.earth_radius_km,
            query_text,
            longitude,
            latitude,
            radius_km,
            max_hits,
        })
    }

    /// Total number of live records in the index.
    #[must_use]
    pub fn num_docs(&self) -> u64 {
        self.reader.searcher().num_docs()
    }

    fn writer(&self) -> Result<IndexWriter, SearchError> {
        self.index
            .writer(self.config.writer_heap_bytes)
            .map_err(|e| unavailable(Path::new(&self.config.index_dir), &e))
    }
}

/// Parameters for one search, shared by the async and sync entry points.
struct SearchRequest<'a> {
    reader: &'a IndexReader,
    fields: &'a PlaceFields,
    strategy: &'a PrefixTreeStrategy,
    earth_radius_km: f64,
    query_text: &'a str,
    longitude: f64,
    latitude: f64,
    radius_km: f64,
    max_hits: usize,
}

/// Internal sync search implementation.
fn search_sync(request: &SearchRequest<'_>) -> Result<Vec<SearchItem>, SearchError> {
    if request.max_hits == 0 {
        return Ok(Vec::new());
    }

    let radius_deg =
        geodesy::distance_to_degrees(request.radius_km, request.earth_radius_km);
    let circle = Circle::new(Point::new(request.longitude, request.latitude), radius_deg)?;

    let text_query = query::build_text_query(request.query_text, request.fields.name)?;
    let containment = request
        .strategy
        .containment_query(request.fields.location, &circle)?;

    // Text relevance drives the engine score; containment is a hard
    // filter contributing no score of its own.
    let filtered: Box<dyn Query> = Box::new(ConstScoreQuery::new(containment, 0.0));
    let combined = BooleanQuery::new(vec![
        (Occur::Must, text_query),
        (Occur::Must, filtered),
    ]);

    let searcher = request.reader.searcher();
    let top_docs = searcher.search(&combined, &TopDocs::with_limit(request.max_hits))?;

    let mut ranked: Vec<(f64, DocAddress, SearchItem)> = Vec::with_capacity(top_docs.len());
    for (text_score, doc_address) in top_docs {
        let doc: TantivyDocument = searcher.doc(doc_address)?;
        let item = match document::item_from_document(&doc, request.fields) {
            Ok(item) => item,
            Err(e) => {
                // Skip-and-continue: one malformed stored record never
                // fails the whole search.
                log::warn!("Skipping malformed record at {doc_address:?}: {e}");
                continue;
            }
        };

        // The covering filter is approximate at its detail level; verify
        // the true arc distance before ranking.
        if !circle.contains(item.longitude, item.latitude) {
            continue;
        }

        let score = f64::from(text_score)
            + request
                .strategy
                .distance_score(&circle, item.longitude, item.latitude);
        ranked.push((score, doc_address, item));
    }

    ranked.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.cmp(&b.1)));

    Ok(ranked.into_iter().map(|(_, _, item)| item).collect())
}

fn validate_config(config: &PlaceIndexConfig) -> Result<(), SearchError> {
    if config.index_dir.trim().is_empty() {
        return Err(SearchError::Configuration(
            "index_dir must not be empty".to_string(),
        ));
    }
    if config.max_levels == 0 || config.max_levels > grid::MAX_GRID_LEVELS {
        return Err(SearchError::Configuration(format!(
            "max_levels must be 1..={}, got {}",
            grid::MAX_GRID_LEVELS,
            config.max_levels
        )));
    }
    if !config.earth_radius_km.is_finite() || config.earth_radius_km <= 0.0 {
        return Err(SearchError::Configuration(format!(
            "earth_radius_km must be positive, got {}",
            config.earth_radius_km
        )));
    }
    for (label, name) in [
        ("name_field", &config.name_field),
        ("location_field", &config.location_field),
        ("id_field", &config.id_field),
    ] {
        if name.trim().is_empty() {
            return Err(SearchError::Configuration(format!(
                "{label} must not be empty"
            )));
        }
    }
    Ok(())
}

/// Removes a writer lock file left behind by a crashed process.
///
/// Only called from [`PlaceIndex::open`], before this process acquires
/// any writer.
fn clear_stale_writer_lock(index_dir: &Path) -> Result<(), SearchError> {
    let lock_path = index_dir.join(&INDEX_WRITER_LOCK.filepath);
    if lock_path.exists() {
        log::warn!("Removing stale writer lock: {}", lock_path.display());
        std::fs::remove_file(&lock_path)?;
    }
    Ok(())
}

fn unavailable(path: &Path, reason: &dyn std::fmt::Display) -> SearchError {
    SearchError::IndexUnavailable {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}
