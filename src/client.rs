use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use reqwest::{header, Certificate};
use tokio::{
    sync::Semaphore,
    task::{Id, JoinSet},
    time::Instant,
};

use crate::{
    decode::decode_response, BatchOptions, BatchResults, ClientConfig, FeatureBaseError,
    QueryError, QueryResult, Result,
};

const API_KEY_HEADER: &str = "X-API-Key";

#[derive(Clone)]
/// HTTP client for the FeatureBase SQL endpoint.
///
/// Cloning is cheap; clones share the HTTP connection pool and the
/// configuration.
pub struct FeatureBaseClient {
    http: reqwest::Client,
    config: Arc<ClientConfig>,
    url: String,
}

impl fmt::Debug for FeatureBaseClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeatureBaseClient")
            .field("url", &self.url)
            .field("config", &self.config)
            .finish()
    }
}

impl FeatureBaseClient {
    /// Validates `config` and builds a client.
    ///
    /// CA material is read here; a missing or unparsable certificate is a
    /// construction error rather than a per-request one.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use featurebase_http::{ClientConfig, FeatureBaseClient};
    ///
    /// let db = FeatureBaseClient::new(ClientConfig::new("localhost:10101"))?;
    /// # Ok::<(), featurebase_http::FeatureBaseError>(())
    /// ```
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        for certificate in load_ca_material(&config)? {
            builder = builder.add_root_certificate(certificate);
        }
        let http = builder.build().map_err(FeatureBaseError::Tls)?;

        let url = config.endpoint_url();
        Ok(Self {
            http,
            config: Arc::new(config),
            url,
        })
    }

    /// Creates a client from `FEATUREBASE_*` environment variables.
    ///
    /// See [`ClientConfig::from_env`] for the variables read.
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// SQL endpoint this client posts to.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Executes one SQL statement.
    ///
    /// Never fails: transport, HTTP, decode and SQL errors are reported
    /// through [`QueryResult::error`].
    pub async fn query(&self, sql: impl Into<String>) -> QueryResult {
        let sql = sql.into();

        #[cfg(feature = "tracing")]
        tracing::debug!(url = %self.url, "sending sql statement");

        let response = match self.request(&sql).send().await {
            Ok(response) => response,
            Err(err) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(error = %err, "sql request failed before a response");
                return QueryResult::failed(sql, QueryError::transport(&err));
            }
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(err) => return QueryResult::failed(sql, QueryError::transport(&err)),
        };

        let result = decode_response(sql, status, body);

        #[cfg(feature = "tracing")]
        if let Some(error) = &result.error {
            tracing::debug!(status = status.as_u16(), error = %error, "sql statement failed");
        }

        result
    }

    /// Executes several statements, sequentially or concurrently.
    ///
    /// In sequential mode results keep input order, and
    /// [`BatchOptions::stop_on_first_error`] leaves the statements after the
    /// first failure unsent. In concurrent mode every statement is sent,
    /// results arrive in completion order, and the configured timeout bounds
    /// the whole batch: statements still running at the deadline come back as
    /// failed results with [`QueryError::BatchTimeout`].
    pub async fn query_batch<I, S>(&self, sqls: I, options: BatchOptions) -> BatchResults
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let sqls: Vec<String> = sqls.into_iter().map(Into::into).collect();

        #[cfg(feature = "tracing")]
        tracing::debug!(
            statements = sqls.len(),
            concurrent = options.concurrent,
            "running sql batch"
        );

        if options.concurrent {
            self.run_concurrent(sqls).await
        } else {
            self.run_sequential(sqls, options.stop_on_first_error).await
        }
    }

    fn request(&self, sql: &str) -> reqwest::RequestBuilder {
        let mut request = self
            .http
            .post(&self.url)
            .header(header::CONTENT_TYPE, "text/plain")
            .header(header::ACCEPT, "application/json");
        if let Some(api_key) = &self.config.api_key {
            request = request.header(API_KEY_HEADER, api_key);
        }
        if let Some(origin) = &self.config.origin {
            request = request.header(header::ORIGIN, origin);
        }
        request.body(sql.to_owned())
    }

    async fn run_sequential(&self, sqls: Vec<String>, stop_on_first_error: bool) -> BatchResults {
        let mut results = Vec::with_capacity(sqls.len());
        for sql in sqls {
            let result = self.query(sql).await;
            let failed = !result.ok;
            results.push(result);
            if failed && stop_on_first_error {
                #[cfg(feature = "tracing")]
                tracing::debug!(executed = results.len(), "stopping batch at first error");
                break;
            }
        }
        BatchResults::new(results)
    }

    async fn run_concurrent(&self, sqls: Vec<String>) -> BatchResults {
        let permits = Arc::new(Semaphore::new(self.config.effective_max_concurrency()));
        let mut tasks = JoinSet::new();
        let mut indices = HashMap::with_capacity(sqls.len());
        for (index, sql) in sqls.iter().cloned().enumerate() {
            let client = self.clone();
            let permits = Arc::clone(&permits);
            let handle = tasks.spawn(async move {
                // The semaphore is never closed, so acquiring cannot fail.
                let _permit = permits.acquire_owned().await.ok();
                client.query(sql).await
            });
            indices.insert(handle.id(), index);
        }

        let deadline = self.config.timeout.map(|timeout| Instant::now() + timeout);
        collect_batch(tasks, indices, sqls, deadline).await
    }
}

/// Drains `tasks` until every task finished or `deadline` passed.
///
/// `indices` maps each task to its position in `sqls`. Every statement gets
/// exactly one result: its own, `Task` if its worker panicked, or
/// `BatchTimeout` if it was still outstanding at the deadline.
async fn collect_batch(
    mut tasks: JoinSet<QueryResult>,
    indices: HashMap<Id, usize>,
    sqls: Vec<String>,
    deadline: Option<Instant>,
) -> BatchResults {
    let mut pending = vec![true; sqls.len()];
    let mut results = Vec::with_capacity(sqls.len());

    loop {
        let next = match deadline {
            Some(deadline) => {
                match tokio::time::timeout_at(deadline, tasks.join_next_with_id()).await {
                    Ok(next) => next,
                    Err(_) => break,
                }
            }
            None => tasks.join_next_with_id().await,
        };
        match next {
            Some(Ok((id, result))) => {
                if let Some(&index) = indices.get(&id) {
                    pending[index] = false;
                }
                results.push(result);
            }
            Some(Err(err)) => {
                if let Some(&index) = indices.get(&err.id()) {
                    pending[index] = false;
                    results.push(QueryResult::failed(
                        sqls[index].clone(),
                        QueryError::Task(err.to_string()),
                    ));
                }
            }
            None => break,
        }
    }
    tasks.abort_all();

    #[cfg(feature = "tracing")]
    if pending.iter().any(|p| *p) {
        tracing::warn!(
            outstanding = pending.iter().filter(|p| **p).count(),
            "sql batch timed out"
        );
    }

    // Anything still pending was cut off by the deadline.
    for (sql, _) in sqls.into_iter().zip(pending).filter(|(_, pending)| *pending) {
        results.push(QueryResult::failed(sql, QueryError::BatchTimeout));
    }

    BatchResults::new(results)
}

fn load_ca_material(config: &ClientConfig) -> Result<Vec<Certificate>> {
    let mut certificates = Vec::new();
    if let Some(file) = &config.ca_file {
        certificates.push(read_certificate(file)?);
    }
    if let Some(dir) = &config.ca_path {
        let entries = fs::read_dir(dir).map_err(|source| FeatureBaseError::CaMaterial {
            path: dir.clone(),
            source,
        })?;
        let mut paths = entries
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .filter(|path| is_certificate_file(path))
            .collect::<Vec<_>>();
        paths.sort();
        for path in paths {
            certificates.push(read_certificate(&path)?);
        }
    }
    Ok(certificates)
}

fn read_certificate(path: &Path) -> Result<Certificate> {
    let pem = fs::read(path).map_err(|source| FeatureBaseError::CaMaterial {
        path: path.to_owned(),
        source,
    })?;
    Certificate::from_pem(&pem).map_err(FeatureBaseError::Tls)
}

fn is_certificate_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| matches!(ext, "pem" | "crt" | "cer"))
}
