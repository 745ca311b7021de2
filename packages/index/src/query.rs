//! Free-text query construction for the name field.
//!
//! User text parses as OR-combined terms with optional trailing `*` prefix
//! wildcards. Text that trips the structured grammar is retried with every
//! syntax character stripped — user punctuation must never fail a search.

use tantivy::Term;
use tantivy::query::{BooleanQuery, EmptyQuery, Occur, Query, RegexQuery, TermQuery};
use tantivy::schema::{Field, IndexRecordOption};

use crate::SearchError;

/// Characters with query syntax meaning. Outside the supported trailing
/// wildcard, their presence fails the structured parse.
const SPECIAL: &[char] = &[
    '*', '?', '(', ')', '"', '\'', '+', '-', '!', '^', '~', '[', ']', '{', '}', ':', '\\',
];

/// Builds the text query, falling back to escaped literal matching when
/// the structured parse fails.
///
/// # Errors
///
/// [`SearchError::QueryParse`] only for blank input; anything else either
/// parses, falls back to literal terms, or degrades to a match-nothing
/// query (mirroring what escaped syntax characters match after analysis).
pub fn build_text_query(raw: &str, field: Field) -> Result<Box<dyn Query>, SearchError> {
    if raw.trim().is_empty() {
        return Err(SearchError::QueryParse(raw.to_string()));
    }

    match parse_structured(raw, field) {
        Ok(query) => Ok(query),
        Err(reason) => {
            log::debug!("Structured parse failed ({reason}), retrying escaped: {raw:?}");
            Ok(parse_escaped(raw, field))
        }
    }
}

/// Structured grammar: whitespace-separated terms, optional trailing `*`.
fn parse_structured(raw: &str, field: Field) -> Result<Box<dyn Query>, String> {
    let mut clauses: Vec<(Occur, Box<dyn Query>)> = Vec::new();

    for token in raw.split_whitespace() {
        let (body, is_prefix) = token
            .strip_suffix('*')
            .map_or((token, false), |rest| (rest, true));

        if body.is_empty() {
            return Err(format!("bare wildcard {token:?}"));
        }
        if body.contains(SPECIAL) {
            return Err(format!("special syntax in {token:?}"));
        }

        let body = body.to_lowercase();
        let query: Box<dyn Query> = if is_prefix {
            let pattern = format!("{}.*", regex::escape(&body));
            Box::new(RegexQuery::from_pattern(&pattern, field).map_err(|e| e.to_string())?)
        } else {
            Box::new(TermQuery::new(
                Term::from_field_text(field, &body),
                IndexRecordOption::WithFreqsAndPositions,
            ))
        };
        clauses.push((Occur::Should, query));
    }

    if clauses.is_empty() {
        return Err("no terms".to_string());
    }
    Ok(Box::new(BooleanQuery::new(clauses)))
}

/// Escaped fallback: drop syntax characters and match the remaining terms
/// literally. The analyzer never emits punctuation, so dropping matches
/// exactly what an escaped term could have matched anyway.
fn parse_escaped(raw: &str, field: Field) -> Box<dyn Query> {
    let clauses: Vec<(Occur, Box<dyn Query>)> = raw
        .split_whitespace()
        .filter_map(|token| {
            let literal: String = token
                .chars()
                .filter(|c| c.is_alphanumeric())
                .collect::<String>()
                .to_lowercase();
            if literal.is_empty() {
                return None;
            }
            let query: Box<dyn Query> = Box::new(TermQuery::new(
                Term::from_field_text(field, &literal),
                IndexRecordOption::WithFreqsAndPositions,
            ));
            Some((Occur::Should, query))
        })
        .collect();

    if clauses.is_empty() {
        // All syntax, no terms: matches nothing, exactly like an escaped
        // wildcard after analysis.
        return Box::new(EmptyQuery);
    }
    Box::new(BooleanQuery::new(clauses))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{PlaceFields, build_schema};
    use place_search_index_models::PlaceIndexConfig;

    fn name_field() -> Field {
        let config = PlaceIndexConfig::default();
        let schema = build_schema(&config);
        PlaceFields::from_schema(&schema, &config).name
    }

    #[test]
    fn builds_or_query_for_plain_terms() {
        let query = build_text_query("munich frankfurt", name_field()).unwrap();
        let debug = format!("{query:?}");
        assert!(debug.contains("BooleanQuery"));
        assert!(debug.contains("munich"));
        assert!(debug.contains("frankfurt"));
    }

    #[test]
    fn builds_prefix_queries_for_trailing_wildcards() {
        let query = build_text_query("m* f*", name_field()).unwrap();
        let debug = format!("{query:?}");
        assert!(debug.contains("RegexQuery") || debug.contains("AutomatonQuery"));
    }

    #[test]
    fn lowercases_terms_to_match_the_analyzer() {
        let query = build_text_query("Munich", name_field()).unwrap();
        assert!(format!("{query:?}").contains("munich"));
    }

    #[test]
    fn falls_back_on_special_syntax() {
        // None of these may error; they degrade to literal matching.
        for raw in ["m* AND (f*", "\"unbalanced", "a+b", "colon:term"] {
            assert!(build_text_query(raw, name_field()).is_ok(), "{raw:?}");
        }
    }

    #[test]
    fn bare_wildcard_degrades_to_match_nothing() {
        let query = build_text_query("*", name_field()).unwrap();
        assert!(format!("{query:?}").contains("EmptyQuery"));
    }

    #[test]
    fn blank_input_is_a_parse_error() {
        assert!(matches!(
            build_text_query("   ", name_field()),
            Err(SearchError::QueryParse(_))
        ));
    }
}
