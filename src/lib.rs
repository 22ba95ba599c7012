//! `featurebase-http` is an async HTTP client for the FeatureBase SQL endpoint.
//!
//! Each statement is one `POST` of raw SQL text to `/sql` (or
//! `/databases/{id}/query/sql`):
//! - [`FeatureBaseClient::query`]
//! - [`FeatureBaseClient::query_batch`]
//!
//! Statement failures never surface as `Err`; inspect [`QueryResult::ok`] and
//! [`QueryResult::error`] instead.

mod client;
mod config;
mod decode;
mod error;
mod types;
mod wire;

pub mod row_map;

pub use client::FeatureBaseClient;
pub use config::{ClientConfig, DEFAULT_HOST};
pub use error::{FeatureBaseError, QueryError};
pub use types::{BatchOptions, BatchResults, Field, QueryResult};

pub type Result<T> = std::result::Result<T, FeatureBaseError>;
