use std::error::Error as _;
use std::path::PathBuf;

/// Error returned while building a client.
///
/// Statement-level failures never surface here; they are carried by
/// [`QueryError`] inside the returned [`QueryResult`](crate::QueryResult).
#[derive(Debug, thiserror::Error)]
pub enum FeatureBaseError {
    /// Invalid or inconsistent connection configuration.
    #[error("configuration error: {0}")]
    Config(String),
    /// CA file or directory could not be read.
    #[error("could not read CA material at {}: {source}", path.display())]
    CaMaterial {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Certificate parsing or HTTP client construction failed.
    #[error("tls error: {0}")]
    Tls(reqwest::Error),
}

impl FeatureBaseError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

/// Failure detail attached to an unsuccessful [`QueryResult`](crate::QueryResult).
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    /// The request never produced an HTTP status (DNS, refused, TLS, timeout).
    #[error("transport error: {message}")]
    Transport { message: String, timed_out: bool },
    /// The server answered with a status other than 200.
    #[error("http error {status}: {reason}")]
    Http { status: u16, reason: String },
    /// HTTP 200, but the body is not a well-formed result document.
    #[error("decode error: {0}")]
    Decode(String),
    /// HTTP 200 with an `error` field supplied by the server.
    #[error("{0}")]
    Sql(String),
    /// The concurrent batch deadline passed before this statement finished.
    #[error("batch timed out before the statement completed")]
    BatchTimeout,
    /// The worker running this statement stopped without producing a result.
    #[error("statement task failed: {0}")]
    Task(String),
}

impl QueryError {
    pub(crate) fn transport(err: &reqwest::Error) -> Self {
        let mut message = err.to_string();
        let mut source = err.source();
        while let Some(inner) = source {
            message.push_str(": ");
            message.push_str(&inner.to_string());
            source = inner.source();
        }
        Self::Transport {
            message,
            timed_out: err.is_timeout(),
        }
    }

    /// Returns true for errors reported by the SQL engine itself.
    pub fn is_sql(&self) -> bool {
        matches!(self, Self::Sql(_))
    }

    /// Returns true when the request or the batch ran out of time.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::Transport {
                timed_out: true,
                ..
            } | Self::BatchTimeout
        )
    }
}
