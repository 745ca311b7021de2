//! Tantivy schema for the place index.
//!
//! Defines the stored-record contract: a tokenized name, raw spatial token
//! terms, stored numeric coordinates, and an exact-format composite for
//! round-trip retrieval. Field names come from configuration so embedders
//! can fit the index into an existing schema convention.

use place_search_index_models::PlaceIndexConfig;
use tantivy::Index;
use tantivy::schema::{
    self, Field, NumericOptions, STORED, STRING, Schema, TextFieldIndexing, TextOptions,
};
use tantivy::tokenizer::TextAnalyzer;

/// Default names of the fields in the place schema.
pub struct FieldNames;

impl FieldNames {
    /// Record id, exact match (the upsert delete target).
    pub const ID: &'static str = "id";
    /// Tokenized display name.
    pub const NAME: &'static str = "name";
    /// Longitude (WGS84), stored for inspection.
    pub const LONGITUDE: &'static str = "longitude";
    /// Latitude (WGS84), stored for inspection.
    pub const LATITUDE: &'static str = "latitude";
    /// Spatial prefix-tree tokens, one term per ancestor cell.
    pub const LOCATION: &'static str = "location";
    /// Suffix of the stored `"lon,lat"` composite field.
    pub const XY_SUFFIX: &'static str = "_xy";
}

/// Composite field name derived from a spatial field name.
#[must_use]
pub fn xy_field_name(location_field: &str) -> String {
    format!("{location_field}{}", FieldNames::XY_SUFFIX)
}

/// All resolved field handles for document construction and retrieval.
#[derive(Debug, Clone)]
pub struct PlaceFields {
    /// Record id.
    pub id: Field,
    /// Display name.
    pub name: Field,
    /// Longitude.
    pub longitude: Field,
    /// Latitude.
    pub latitude: Field,
    /// Spatial token terms.
    pub location: Field,
    /// Stored coordinate composite.
    pub location_xy: Field,
}

impl PlaceFields {
    /// Resolves field handles from a schema.
    ///
    /// # Panics
    ///
    /// Panics if the schema does not contain the configured fields (should
    /// only happen if the schema was not built by [`build_schema`] with the
    /// same configuration).
    #[must_use]
    pub fn from_schema(schema: &Schema, config: &PlaceIndexConfig) -> Self {
        Self {
            id: schema
                .get_field(&config.id_field)
                .expect("schema missing id field"),
            name: schema
                .get_field(&config.name_field)
                .expect("schema missing name field"),
            longitude: schema
                .get_field(FieldNames::LONGITUDE)
                .expect("schema missing longitude field"),
            latitude: schema
                .get_field(FieldNames::LATITUDE)
                .expect("schema missing latitude field"),
            location: schema
                .get_field(&config.location_field)
                .expect("schema missing location field"),
            location_xy: schema
                .get_field(&xy_field_name(&config.location_field))
                .expect("schema missing location composite field"),
        }
    }
}

/// Builds the tantivy schema for the place index.
///
/// Fields (names from configuration):
/// - id — u64, indexed + stored
/// - name — TEXT (tokenized + stored)
/// - `longitude` / `latitude` — f64, stored + fast
/// - location — STRING (raw terms, not stored): spatial prefix tokens
/// - `location_xy` — stored only: `"lon,lat"` at 7 decimal places
#[must_use]
pub fn build_schema(config: &PlaceIndexConfig) -> Schema {
    let mut builder = Schema::builder();

    let id_options = NumericOptions::default().set_indexed().set_stored();
    builder.add_u64_field(&config.id_field, id_options);

    let text_field_indexing = TextFieldIndexing::default()
        .set_tokenizer("default")
        .set_index_option(schema::IndexRecordOption::WithFreqsAndPositions);
    let text_stored = TextOptions::default()
        .set_indexing_options(text_field_indexing)
        .set_stored();
    builder.add_text_field(&config.name_field, text_stored);

    let f64_options = NumericOptions::default().set_stored().set_fast();
    builder.add_f64_field(FieldNames::LONGITUDE, f64_options.clone());
    builder.add_f64_field(FieldNames::LATITUDE, f64_options);

    builder.add_text_field(&config.location_field, STRING);
    builder.add_text_field(&xy_field_name(&config.location_field), STORED);

    builder.build()
}

/// Registers tokenizers on the given index.
///
/// The name field uses tantivy's simple tokenizer plus lowercasing; query
/// terms are lowercased the same way before matching, so matching stays
/// symmetric without a normalization pass.
pub fn register_tokenizers(index: &Index) {
    index.tokenizers().register(
        "default",
        TextAnalyzer::builder(tantivy::tokenizer::SimpleTokenizer::default())
            .filter(tantivy::tokenizer::LowerCaser)
            .build(),
    );
}
