//! Mapping between [`SearchItem`] records and tantivy documents.

use place_search_index_models::SearchItem;
use tantivy::TantivyDocument;
use tantivy::schema::Value;

use crate::SearchError;
use crate::schema::PlaceFields;
use crate::strategy::PrefixTreeStrategy;

/// Converts an item into an indexable document.
///
/// The name is tokenized by the index analyzer, the spatial field receives
/// one raw term per ancestor cell, and the composite field stores
/// `"lon,lat"` at 7 decimal places for lossless retrieval.
///
/// # Errors
///
/// Returns an error when the item's coordinates are out of range.
pub fn to_document(
    item: &SearchItem,
    fields: &PlaceFields,
    strategy: &PrefixTreeStrategy,
) -> Result<TantivyDocument, SearchError> {
    let mut doc = TantivyDocument::default();
    doc.add_u64(fields.id, item.id);
    doc.add_text(fields.name, &item.name);

    // Not needed for search; stored for inspection and future numeric
    // filtering.
    doc.add_f64(fields.longitude, item.longitude);
    doc.add_f64(fields.latitude, item.latitude);

    for token in strategy.index_tokens(item.longitude, item.latitude)? {
        doc.add_text(fields.location, &token);
    }

    doc.add_text(
        fields.location_xy,
        format_location(item.longitude, item.latitude),
    );

    Ok(doc)
}

/// `"lon,lat"` at 7 decimal places (~1 cm of longitude at the equator).
#[must_use]
pub fn format_location(longitude: f64, latitude: f64) -> String {
    format!("{longitude:.7},{latitude:.7}")
}

/// Recovers an item from a retrieved document.
///
/// # Errors
///
/// [`SearchError::RecordFormat`] when the stored composite or id field is
/// missing or malformed. Never defaults coordinates silently.
pub fn item_from_document(
    doc: &TantivyDocument,
    fields: &PlaceFields,
) -> Result<SearchItem, SearchError> {
    let composite = doc
        .get_first(fields.location_xy)
        .and_then(|value| value.as_str())
        .ok_or_else(|| SearchError::RecordFormat("missing location composite".to_string()))?;

    let (lon, lat) = composite.split_once(',').ok_or_else(|| {
        SearchError::RecordFormat(format!("malformed location composite: {composite:?}"))
    })?;
    let longitude: f64 = lon
        .parse()
        .map_err(|_| SearchError::RecordFormat(format!("malformed longitude: {lon:?}")))?;
    let latitude: f64 = lat
        .parse()
        .map_err(|_| SearchError::RecordFormat(format!("malformed latitude: {lat:?}")))?;

    let id = doc
        .get_first(fields.id)
        .and_then(|value| value.as_u64())
        .ok_or_else(|| SearchError::RecordFormat("missing id".to_string()))?;

    let name = doc
        .get_first(fields.name)
        .and_then(|value| value.as_str())
        .unwrap_or("")
        .to_string();

    Ok(SearchItem {
        id,
        name,
        longitude,
        latitude,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::build_schema;
    use place_search_index_models::PlaceIndexConfig;
    use place_search_spatial::PrefixGrid;

    fn fields_and_strategy() -> (PlaceFields, PrefixTreeStrategy) {
        let config = PlaceIndexConfig::default();
        let schema = build_schema(&config);
        let fields = PlaceFields::from_schema(&schema, &config);
        let strategy = PrefixTreeStrategy::new(
            PrefixGrid::new(config.max_levels).unwrap(),
            config.location_field,
        );
        (fields, strategy)
    }

    #[test]
    fn round_trips_coordinates_within_seven_decimals() {
        let (fields, strategy) = fields_and_strategy();
        let item = SearchItem::new(42, "Frankfurt", 8.683_312_3, 50.116_789_4);

        let doc = to_document(&item, &fields, &strategy).unwrap();
        let recovered = item_from_document(&doc, &fields).unwrap();

        assert_eq!(recovered.id, 42);
        assert_eq!(recovered.name, "Frankfurt");
        assert!((recovered.longitude - item.longitude).abs() < 1e-7);
        assert!((recovered.latitude - item.latitude).abs() < 1e-7);
    }

    #[test]
    fn formats_location_at_seven_decimals() {
        assert_eq!(format_location(8.6833, 50.1167), "8.6833000,50.1167000");
        assert_eq!(format_location(-0.5, -1.25), "-0.5000000,-1.2500000");
    }

    #[test]
    fn rejects_out_of_range_coordinates() {
        let (fields, strategy) = fields_and_strategy();
        let item = SearchItem::new(1, "Nowhere", 200.0, 0.0);
        assert!(to_document(&item, &fields, &strategy).is_err());
    }

    #[test]
    fn missing_composite_is_a_record_format_error() {
        let (fields, _) = fields_and_strategy();
        let doc = TantivyDocument::default();
        assert!(matches!(
            item_from_document(&doc, &fields),
            Err(SearchError::RecordFormat(_))
        ));
    }

    #[test]
    fn malformed_composite_is_a_record_format_error() {
        let (fields, _) = fields_and_strategy();
        let mut doc = TantivyDocument::default();
        doc.add_u64(fields.id, 1);
        doc.add_text(fields.location_xy, "not-a-location");
        assert!(matches!(
            item_from_document(&doc, &fields),
            Err(SearchError::RecordFormat(_))
        ));
    }
}
