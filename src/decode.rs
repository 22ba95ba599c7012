use reqwest::StatusCode;
use serde_json::Value as JsonValue;

use crate::{wire::ResponseDocument, QueryError, QueryResult};

/// Turns one HTTP response into a [`QueryResult`].
pub(crate) fn decode_response(sql: String, status: StatusCode, body: String) -> QueryResult {
    if status != StatusCode::OK {
        let error = QueryError::Http {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("unknown").to_owned(),
        };
        return QueryResult::failed_with_body(sql, error, Some(body));
    }

    let document = match parse_document(&body) {
        Ok(document) => document,
        Err(err) => return QueryResult::failed_with_body(sql, err, Some(body)),
    };

    if let Some(error) = document.error {
        let message = match error {
            JsonValue::String(message) => message,
            other => other.to_string(),
        };
        return QueryResult::failed_with_body(sql, QueryError::Sql(message), Some(body));
    }

    QueryResult {
        sql,
        ok: true,
        schema: document.schema,
        data: document.data,
        warnings: document.warnings,
        execution_time: document.execution_time.unwrap_or(0),
        rows_affected: document.rows_affected.unwrap_or(0),
        error: None,
        raw_response: Some(body),
    }
}

fn parse_document(body: &str) -> Result<ResponseDocument, QueryError> {
    let value = serde_json::from_str::<JsonValue>(body)
        .map_err(|err| QueryError::Decode(format!("invalid response JSON: {err}")))?;
    if !value.is_object() {
        return Err(QueryError::Decode(
            "response document is not a JSON object".to_owned(),
        ));
    }
    serde_json::from_value(value)
        .map_err(|err| QueryError::Decode(format!("unexpected response shape: {err}")))
}
