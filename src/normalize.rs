//! Maps each backend's raw output onto [`ResultRow`].
//!
//! This is the only place that knows backend field names. Row order is kept
//! as returned; both backends sort before returning.

use mongodb::bson::{Bson, Document};
use serde_json::Value;

use crate::backend::{RawPayload, RawResult, SqlRow};
use crate::core::{BackendTag, NormalizationError};
use crate::query::{QueryKind, ResultRow};

/// Raw field names feeding one canonical row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMap {
    pub id: &'static str,
    pub name: &'static str,
    pub score: &'static str,
    pub support: &'static str,
}

pub fn field_map(backend: BackendTag, kind: QueryKind) -> FieldMap {
    let (score, support) = match (backend, kind) {
        (_, QueryKind::TopRatedMovies) => ("avg_rating", "rating_count"),
        (_, QueryKind::SearchMovies) => ("popularity", "rating_count"),
        (BackendTag::Sql, QueryKind::TrendingMovies) => ("trending_score", "total_ratings"),
        (BackendTag::Nosql, QueryKind::TrendingMovies) => ("trending_score", "total_events"),
    };
    FieldMap {
        id: "movie_id",
        name: "title",
        score,
        support,
    }
}

pub fn normalize(
    backend: BackendTag,
    raw: RawResult,
) -> Result<Vec<ResultRow>, NormalizationError> {
    let fields = field_map(backend, raw.kind);
    match (backend, raw.payload) {
        (BackendTag::Sql, RawPayload::Rows(rows)) => rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let reader = RowReader { backend, row: i };
                Ok(ResultRow {
                    entity_id: reader.sql_int(row, fields.id)?,
                    display_name: reader.sql_str(row, fields.name)?,
                    score: reader.sql_float(row, fields.score)?,
                    support_count: reader.sql_int(row, fields.support)?,
                })
            })
            .collect(),
        (BackendTag::Nosql, RawPayload::Documents(docs)) => docs
            .iter()
            .enumerate()
            .map(|(i, doc)| {
                let reader = RowReader { backend, row: i };
                Ok(ResultRow {
                    entity_id: reader.doc_int(doc, fields.id)?,
                    display_name: reader.doc_str(doc, fields.name)?,
                    score: reader.doc_float(doc, fields.score)?,
                    support_count: reader.doc_int(doc, fields.support)?,
                })
            })
            .collect(),
        (backend, payload) => Err(NormalizationError::PayloadMismatch {
            backend,
            found: payload.shape(),
        }),
    }
}

struct RowReader {
    backend: BackendTag,
    row: usize,
}

impl RowReader {
    fn missing(&self, field: &'static str) -> NormalizationError {
        NormalizationError::MissingField {
            backend: self.backend,
            row: self.row,
            field,
        }
    }

    fn wrong_type(&self, field: &'static str, expected: &'static str) -> NormalizationError {
        NormalizationError::WrongType {
            backend: self.backend,
            row: self.row,
            field,
            expected,
        }
    }

    fn sql_field<'a>(
        &self,
        row: &'a SqlRow,
        field: &'static str,
    ) -> Result<&'a Value, NormalizationError> {
        match row.get(field) {
            None | Some(Value::Null) => Err(self.missing(field)),
            Some(value) => Ok(value),
        }
    }

    fn sql_int(&self, row: &SqlRow, field: &'static str) -> Result<i64, NormalizationError> {
        self.sql_field(row, field)?
            .as_i64()
            .ok_or_else(|| self.wrong_type(field, "an integer"))
    }

    fn sql_float(&self, row: &SqlRow, field: &'static str) -> Result<f64, NormalizationError> {
        self.sql_field(row, field)?
            .as_f64()
            .ok_or_else(|| self.wrong_type(field, "a number"))
    }

    fn sql_str(&self, row: &SqlRow, field: &'static str) -> Result<String, NormalizationError> {
        self.sql_field(row, field)?
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| self.wrong_type(field, "a string"))
    }

    fn doc_field<'a>(
        &self,
        doc: &'a Document,
        field: &'static str,
    ) -> Result<&'a Bson, NormalizationError> {
        match doc.get(field) {
            None | Some(Bson::Null) => Err(self.missing(field)),
            Some(value) => Ok(value),
        }
    }

    fn doc_int(&self, doc: &Document, field: &'static str) -> Result<i64, NormalizationError> {
        match self.doc_field(doc, field)? {
            Bson::Int32(v) => Ok(i64::from(*v)),
            Bson::Int64(v) => Ok(*v),
            // Imported ids sometimes land as whole doubles.
            Bson::Double(v) if v.fract() == 0.0 => Ok(*v as i64),
            _ => Err(self.wrong_type(field, "an integer")),
        }
    }

    fn doc_float(&self, doc: &Document, field: &'static str) -> Result<f64, NormalizationError> {
        match self.doc_field(doc, field)? {
            Bson::Double(v) => Ok(*v),
            Bson::Int32(v) => Ok(f64::from(*v)),
            Bson::Int64(v) => Ok(*v as f64),
            _ => Err(self.wrong_type(field, "a number")),
        }
    }

    fn doc_str(&self, doc: &Document, field: &'static str) -> Result<String, NormalizationError> {
        match self.doc_field(doc, field)? {
            Bson::String(v) => Ok(v.clone()),
            _ => Err(self.wrong_type(field, "a string")),
        }
    }
}

#[cfg(test)]
mod tests {
    use mongodb::bson::doc;
    use serde_json::json;

    use super::*;

    fn sql_rows(values: Vec<Value>) -> RawPayload {
        RawPayload::Rows(
            values
                .into_iter()
                .map(|v| v.as_object().unwrap().clone())
                .collect(),
        )
    }

    #[test]
    fn test_sql_top_rated() {
        let raw = RawResult {
            kind: QueryKind::TopRatedMovies,
            payload: sql_rows(vec![
                json!({
                    "movie_id": 550,
                    "title": "Fight Club",
                    "avg_rating": 4.2,
                    "rating_count": 1200,
                }),
                json!({
                    "movie_id": 13,
                    "title": "Forrest Gump",
                    "avg_rating": 4,
                    "rating_count": 0,
                }),
            ]),
        };
        let rows = normalize(BackendTag::Sql, raw).unwrap();
        assert_eq!(
            rows,
            vec![
                ResultRow {
                    entity_id: 550,
                    display_name: "Fight Club".to_string(),
                    score: 4.2,
                    support_count: 1200,
                },
                ResultRow {
                    entity_id: 13,
                    display_name: "Forrest Gump".to_string(),
                    score: 4.0,
                    support_count: 0,
                },
            ]
        );
    }

    #[test]
    fn test_document_trending_uses_event_count() {
        let raw = RawResult {
            kind: QueryKind::TrendingMovies,
            payload: RawPayload::Documents(vec![doc! {
                "movie_id": 550_i32,
                "title": "Fight Club",
                "trending_score": 12.5,
                "total_events": 1200_i64,
            }]),
        };
        let rows = normalize(BackendTag::Nosql, raw).unwrap();
        assert_eq!(rows[0].entity_id, 550);
        assert_eq!(rows[0].score, 12.5);
        assert_eq!(rows[0].support_count, 1200);
    }

    #[test]
    fn test_missing_score_is_an_error_not_zero() {
        let raw = RawResult {
            kind: QueryKind::TopRatedMovies,
            payload: sql_rows(vec![json!({"movie_id": 1, "title": "A", "rating_count": 7})]),
        };
        assert_eq!(
            normalize(BackendTag::Sql, raw),
            Err(NormalizationError::MissingField {
                backend: BackendTag::Sql,
                row: 0,
                field: "avg_rating",
            })
        );
    }

    #[test]
    fn test_null_score_is_missing() {
        let raw = RawResult {
            kind: QueryKind::SearchMovies,
            payload: RawPayload::Documents(vec![doc! {
                "movie_id": 1, "title": "A", "popularity": Bson::Null, "rating_count": 0,
            }]),
        };
        assert!(matches!(
            normalize(BackendTag::Nosql, raw),
            Err(NormalizationError::MissingField { field: "popularity", .. })
        ));
    }

    #[test]
    fn test_wrong_type() {
        let raw = RawResult {
            kind: QueryKind::SearchMovies,
            payload: RawPayload::Documents(vec![doc! {
                "movie_id": "550", "title": "A", "popularity": 1.0, "rating_count": 0,
            }]),
        };
        assert!(matches!(
            normalize(BackendTag::Nosql, raw),
            Err(NormalizationError::WrongType { field: "movie_id", .. })
        ));
    }

    #[test]
    fn test_payload_from_wrong_backend() {
        let raw = RawResult {
            kind: QueryKind::SearchMovies,
            payload: RawPayload::Documents(vec![]),
        };
        assert_eq!(
            normalize(BackendTag::Sql, raw),
            Err(NormalizationError::PayloadMismatch {
                backend: BackendTag::Sql,
                found: "documents",
            })
        );
    }

    #[test]
    fn test_order_is_preserved() {
        let raw = RawResult {
            kind: QueryKind::SearchMovies,
            payload: sql_rows(vec![
                json!({"movie_id": 3, "title": "C", "popularity": 1.0, "rating_count": 1}),
                json!({"movie_id": 1, "title": "A", "popularity": 9.0, "rating_count": 1}),
                json!({"movie_id": 2, "title": "B", "popularity": 5.0, "rating_count": 1}),
            ]),
        };
        let ids: Vec<i64> = normalize(BackendTag::Sql, raw)
            .unwrap()
            .iter()
            .map(|r| r.entity_id)
            .collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }
}
