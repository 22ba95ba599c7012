use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use reqwest::header::HeaderValue;

use crate::{FeatureBaseError, Result};

/// Host used when none is configured.
pub const DEFAULT_HOST: &str = "localhost:10101";

/// Connection settings for a [`FeatureBaseClient`](crate::FeatureBaseClient).
///
/// Setting an API key or any CA material switches the client to HTTPS.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ClientConfig {
    /// `host:port` of the server. Defaults to [`DEFAULT_HOST`].
    pub host: Option<String>,
    /// Database identifier, inserted into the endpoint path.
    pub database: Option<String>,
    /// API key sent as `X-API-Key`. Requires an explicit `host`.
    pub api_key: Option<String>,
    /// PEM file with additional trusted certificates.
    pub ca_file: Option<PathBuf>,
    /// Directory of PEM files with additional trusted certificates.
    pub ca_path: Option<PathBuf>,
    /// Value of the `Origin` request header.
    pub origin: Option<String>,
    /// Per-request timeout; also bounds the wait for a concurrent batch.
    pub timeout: Option<Duration>,
    /// Maximum number of statements in flight during a concurrent batch.
    pub max_concurrency: Option<usize>,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("host", &self.host)
            .field("database", &self.database)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("ca_file", &self.ca_file)
            .field("ca_path", &self.ca_path)
            .field("origin", &self.origin)
            .field("timeout", &self.timeout)
            .field("max_concurrency", &self.max_concurrency)
            .finish()
    }
}

impl ClientConfig {
    /// Creates a configuration pointing at `host` (`host:port`).
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: Some(host.into()),
            ..Self::default()
        }
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_ca_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.ca_file = Some(path.into());
        self
    }

    pub fn with_ca_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.ca_path = Some(path.into());
        self
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = Some(max_concurrency);
        self
    }

    /// Reads the configuration from environment variables.
    ///
    /// Reads:
    /// - `FEATUREBASE_HOSTPORT` — `host:port` of the server
    /// - `FEATUREBASE_DATABASE` — database identifier
    /// - `FEATUREBASE_API_KEY` — API key
    /// - `FEATUREBASE_CA_FILE` / `FEATUREBASE_CA_PATH` — extra trusted roots
    /// - `FEATUREBASE_ORIGIN` — `Origin` header value
    /// - `FEATUREBASE_TIMEOUT_SECS` — timeout in (fractional) seconds
    /// - `FEATUREBASE_MAX_CONCURRENCY` — concurrent batch worker bound
    ///
    /// Unset variables leave the corresponding field unset. The result is
    /// not validated until it is passed to
    /// [`FeatureBaseClient::new`](crate::FeatureBaseClient::new).
    pub fn from_env() -> Result<Self> {
        let timeout = env_var("FEATUREBASE_TIMEOUT_SECS")
            .map(|value| parse_timeout_secs(&value))
            .transpose()?;
        let max_concurrency = env_var("FEATUREBASE_MAX_CONCURRENCY")
            .map(|value| {
                value.trim().parse::<usize>().map_err(|err| {
                    FeatureBaseError::config(format!(
                        "FEATUREBASE_MAX_CONCURRENCY must be an integer, got '{value}': {err}"
                    ))
                })
            })
            .transpose()?;

        Ok(Self {
            host: env_var("FEATUREBASE_HOSTPORT"),
            database: env_var("FEATUREBASE_DATABASE"),
            api_key: env_var("FEATUREBASE_API_KEY"),
            ca_file: env_var("FEATUREBASE_CA_FILE").map(PathBuf::from),
            ca_path: env_var("FEATUREBASE_CA_PATH").map(PathBuf::from),
            origin: env_var("FEATUREBASE_ORIGIN"),
            timeout,
            max_concurrency,
        })
    }

    /// Checks the invariants between fields.
    pub fn validate(&self) -> Result<()> {
        if self.host.as_deref() == Some("") {
            return Err(FeatureBaseError::config("host, if set, must not be empty"));
        }
        if let Some(api_key) = &self.api_key {
            if self.host.is_none() {
                return Err(FeatureBaseError::config(
                    "when specifying an API key, host is not optional",
                ));
            }
            if api_key.is_empty() {
                return Err(FeatureBaseError::config("API key, if set, must not be empty"));
            }
            HeaderValue::from_str(api_key).map_err(|_| {
                FeatureBaseError::config("API key is not a valid header value")
            })?;
        }
        if self.database.as_deref() == Some("") {
            return Err(FeatureBaseError::config("database ID, if set, must not be empty"));
        }
        if let Some(origin) = &self.origin {
            HeaderValue::from_str(origin).map_err(|_| {
                FeatureBaseError::config(format!("origin '{origin}' is not a valid header value"))
            })?;
        }
        if self.max_concurrency == Some(0) {
            return Err(FeatureBaseError::config("max concurrency must be at least 1"));
        }
        Ok(())
    }

    /// Returns true when requests go over HTTPS.
    pub fn uses_tls(&self) -> bool {
        self.api_key.is_some() || self.ca_file.is_some() || self.ca_path.is_some()
    }

    pub fn scheme(&self) -> &'static str {
        if self.uses_tls() {
            "https"
        } else {
            "http"
        }
    }

    pub fn host_port(&self) -> &str {
        self.host.as_deref().unwrap_or(DEFAULT_HOST)
    }

    /// Builds the SQL endpoint URL.
    ///
    /// Example: `featurebase.com:2020` with database `db-1` →
    /// `http://featurebase.com:2020/databases/db-1/query/sql`
    pub fn endpoint_url(&self) -> String {
        match &self.database {
            Some(database) => self.url_for(&format!("/databases/{database}/query/sql")),
            None => self.url_for("/sql"),
        }
    }

    /// Builds a URL for an arbitrary path on the configured server.
    pub fn url_for(&self, path: &str) -> String {
        format!("{}://{}{}", self.scheme(), self.host_port(), path)
    }

    /// Worker bound for concurrent batches.
    ///
    /// Defaults to `min(32, available_parallelism + 4)`.
    pub fn effective_max_concurrency(&self) -> usize {
        self.max_concurrency.unwrap_or_else(|| {
            let cpus = std::thread::available_parallelism().map_or(1, |n| n.get());
            (cpus + 4).min(32)
        })
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn parse_timeout_secs(value: &str) -> Result<Duration> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
        .ok_or_else(|| {
            FeatureBaseError::config(format!(
                "FEATUREBASE_TIMEOUT_SECS must be a non-negative number of seconds, got '{value}'"
            ))
        })
}
