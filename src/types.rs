use std::time::Duration;

use serde_json::Value as JsonValue;

use crate::{wire, QueryError};

/// Column descriptor taken from a result schema.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub field_type: Option<String>,
}

/// Outcome of one SQL statement.
///
/// `ok` is true only for an HTTP 200 response whose document carried no
/// `error` field. Every other outcome sets `error`.
#[derive(Clone, Debug, PartialEq)]
pub struct QueryResult {
    /// SQL text as submitted.
    pub sql: String,
    pub ok: bool,
    pub schema: Option<JsonValue>,
    pub data: Option<JsonValue>,
    pub warnings: Option<JsonValue>,
    /// Server-side execution time in microseconds.
    pub execution_time: u64,
    pub rows_affected: u64,
    pub error: Option<QueryError>,
    /// Response body as received, when one was received.
    pub raw_response: Option<String>,
}

impl QueryResult {
    pub(crate) fn failed(sql: String, error: QueryError) -> Self {
        Self::failed_with_body(sql, error, None)
    }

    pub(crate) fn failed_with_body(
        sql: String,
        error: QueryError,
        raw_response: Option<String>,
    ) -> Self {
        Self {
            sql,
            ok: false,
            schema: None,
            data: None,
            warnings: None,
            execution_time: 0,
            rows_affected: 0,
            error: Some(error),
            raw_response,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.ok
    }

    pub fn error(&self) -> Option<&QueryError> {
        self.error.as_ref()
    }

    pub fn execution_duration(&self) -> Duration {
        Duration::from_micros(self.execution_time)
    }

    /// Returns the schema fields when the schema has the
    /// `{"fields": [{"name": .., "type": ..}]}` shape.
    pub fn fields(&self) -> Option<Vec<Field>> {
        let schema = self.schema.as_ref()?;
        let schema: wire::Schema = serde_json::from_value(schema.clone()).ok()?;
        Some(
            schema
                .fields
                .into_iter()
                .map(|field| Field {
                    name: field.name,
                    field_type: field.kind,
                })
                .collect(),
        )
    }

    /// Returns the data rows when `data` is an array.
    pub fn rows(&self) -> Option<&[JsonValue]> {
        self.data.as_ref()?.as_array().map(Vec::as_slice)
    }
}

/// Execution mode for [`FeatureBaseClient::query_batch`](crate::FeatureBaseClient::query_batch).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchOptions {
    /// Run statements concurrently on a bounded worker pool.
    pub concurrent: bool,
    /// Sequential mode only: stop at the first failed statement.
    pub stop_on_first_error: bool,
}

impl BatchOptions {
    pub fn sequential() -> Self {
        Self::default()
    }

    pub fn concurrent() -> Self {
        Self {
            concurrent: true,
            ..Self::default()
        }
    }

    pub fn stop_on_first_error(mut self, stop: bool) -> Self {
        self.stop_on_first_error = stop;
        self
    }
}

/// Results of one batch call.
///
/// Sequential batches keep submission order; concurrent batches are in
/// completion order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BatchResults {
    results: Vec<QueryResult>,
}

impl BatchResults {
    pub(crate) fn new(results: Vec<QueryResult>) -> Self {
        Self { results }
    }

    /// True when every statement succeeded (vacuously true when empty).
    pub fn ok(&self) -> bool {
        self.results.iter().all(|result| result.ok)
    }

    pub fn errors(&self) -> Vec<&QueryError> {
        self.results
            .iter()
            .filter_map(|result| result.error.as_ref())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, QueryResult> {
        self.results.iter()
    }

    pub fn results(&self) -> &[QueryResult] {
        &self.results
    }

    pub fn into_results(self) -> Vec<QueryResult> {
        self.results
    }
}

impl IntoIterator for BatchResults {
    type Item = QueryResult;
    type IntoIter = std::vec::IntoIter<QueryResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.into_iter()
    }
}

impl<'a> IntoIterator for &'a BatchResults {
    type Item = &'a QueryResult;
    type IntoIter = std::slice::Iter<'a, QueryResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::{BatchOptions, BatchResults, Field, QueryError, QueryResult};

    fn success(sql: &str) -> QueryResult {
        QueryResult {
            sql: sql.to_owned(),
            ok: true,
            schema: None,
            data: None,
            warnings: None,
            execution_time: 0,
            rows_affected: 0,
            error: None,
            raw_response: None,
        }
    }

    #[test]
    fn aggregate_ok_requires_every_member() {
        let all_ok = BatchResults::new(vec![success("a"), success("b")]);
        assert!(all_ok.ok());
        assert!(all_ok.errors().is_empty());

        let mixed = BatchResults::new(vec![
            success("a"),
            QueryResult::failed("b".to_owned(), QueryError::Sql("boom".to_owned())),
            QueryResult::failed("c".to_owned(), QueryError::BatchTimeout),
        ]);
        assert!(!mixed.ok());
        assert_eq!(
            mixed.errors(),
            vec![&QueryError::Sql("boom".to_owned()), &QueryError::BatchTimeout]
        );
        assert_eq!(mixed.len(), 3);
    }

    #[test]
    fn empty_batch_is_ok() {
        let empty = BatchResults::default();
        assert!(empty.ok());
        assert!(empty.is_empty());
    }

    #[test]
    fn fields_and_rows_from_featurebase_shape() {
        let result = QueryResult {
            schema: Some(json!({
                "fields": [
                    { "name": "_id", "type": "id" },
                    { "name": "s1", "type": "string" }
                ]
            })),
            data: Some(json!([[1, "text1"], [2, "text2"]])),
            ..success("select _id, s1 from t")
        };

        assert_eq!(
            result.fields().expect("fields"),
            vec![
                Field {
                    name: "_id".to_owned(),
                    field_type: Some("id".to_owned())
                },
                Field {
                    name: "s1".to_owned(),
                    field_type: Some("string".to_owned())
                },
            ]
        );
        assert_eq!(result.rows().map(<[_]>::len), Some(2));
    }

    #[test]
    fn fields_absent_for_unexpected_schema_shape() {
        let result = QueryResult {
            schema: Some(json!({"k1": "v1"})),
            data: Some(json!({"k1": "v1"})),
            ..success("sql")
        };
        assert!(result.fields().is_none());
        assert!(result.rows().is_none());

        let result = QueryResult {
            schema: Some(json!("not an object")),
            ..success("sql")
        };
        assert!(result.fields().is_none());

        let result = QueryResult {
            schema: Some(json!({"fields": []})),
            ..success("sql")
        };
        assert_eq!(result.fields(), Some(vec![]));
    }

    #[test]
    fn batch_option_builders() {
        assert!(!BatchOptions::sequential().concurrent);
        assert!(BatchOptions::concurrent().concurrent);
        assert!(
            BatchOptions::sequential()
                .stop_on_first_error(true)
                .stop_on_first_error
        );
    }
}
