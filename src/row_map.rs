//! Name-based access to positional result rows.
//!
//! Rows come back from the server as arrays aligned with `schema.fields`.
//! These helpers pair the two so values can be looked up by field name.

use serde_json::{Map, Value as JsonValue};

use crate::{Field, QueryResult};

/// Lightweight row view for name-based access helpers.
#[derive(Debug)]
pub struct RowRef<'a> {
    /// Schema fields aligned with `values`.
    pub fields: &'a [Field],
    /// Row values aligned with `fields`.
    pub values: &'a [JsonValue],
}

impl<'a> RowRef<'a> {
    /// Returns a value by case-insensitive field name.
    pub fn get(&self, name: &str) -> Option<&'a JsonValue> {
        let idx = self
            .fields
            .iter()
            .position(|field| field.name.eq_ignore_ascii_case(name))?;
        self.values.get(idx)
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name)?.as_i64()
    }

    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.get(name)?.as_f64()
    }

    pub fn get_str(&self, name: &str) -> Option<&'a str> {
        self.get(name)?.as_str()
    }
}

impl QueryResult {
    /// Pairs each row with the schema fields.
    ///
    /// Returns `None` unless the schema has fields and the data is an array
    /// of arrays.
    pub fn row_refs<'a>(&'a self, fields: &'a [Field]) -> Option<Vec<RowRef<'a>>> {
        self.rows()?
            .iter()
            .map(|row| {
                row.as_array().map(|values| RowRef {
                    fields,
                    values: values.as_slice(),
                })
            })
            .collect()
    }

    /// Converts the rows into `field name -> value` records.
    pub fn records(&self) -> Option<Vec<Map<String, JsonValue>>> {
        let fields = self.fields().filter(|fields| !fields.is_empty())?;
        let rows = self.row_refs(&fields)?;
        Some(
            rows.into_iter()
                .map(|row| {
                    row.fields
                        .iter()
                        .zip(row.values)
                        .map(|(field, value)| (field.name.clone(), value.clone()))
                        .collect()
                })
                .collect(),
        )
    }
}
