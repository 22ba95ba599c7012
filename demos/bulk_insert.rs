//! Loads a million random rows with `BULK INSERT`, one chunk per statement.
//!
//! Reads the connection from `FEATUREBASE_*` variables (see
//! `ClientConfig::from_env`); set `RUST_LOG=featurebase_http=debug` and build
//! with `--features tracing` to see request logs.

use std::time::Instant;

use featurebase_http::FeatureBaseClient;
use tracing_subscriber::EnvFilter;

const TOTAL_ROWS: usize = 1_000_000;
const CHUNK_SIZE: usize = 10_000;

fn random_string(len: usize) -> String {
    (0..len).map(|_| fastrand::lowercase()).collect()
}

fn bulk_insert_sql(first_key: usize, count: usize) -> String {
    let records = (first_key..first_key + count)
        .map(|key| format!("{key}, {key}, \"{}\", \"{}\"", random_string(3), random_string(12)))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "BULK INSERT INTO demo_upload(_id, keycol, val1, val2) \
         MAP (0 ID, 1 INT, 2 STRING, 3 STRING) \
         FROM x'{records}' \
         WITH INPUT 'INLINE' FORMAT 'CSV' BATCHSIZE {}",
        count + 1
    )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let db = FeatureBaseClient::from_env()?;

    for sql in [
        "DROP TABLE IF EXISTS demo_upload",
        "CREATE TABLE demo_upload(_id ID, keycol INT, val1 STRING, val2 STRING)",
    ] {
        let result = db.query(sql).await;
        if let Some(error) = &result.error {
            eprintln!("{error}");
        }
    }

    // Rows past the last full chunk are not loaded.
    let mut next_key = 1;
    for _ in 0..TOTAL_ROWS / CHUNK_SIZE {
        let started = Instant::now();
        let result = db.query(bulk_insert_sql(next_key, CHUNK_SIZE)).await;
        match &result.error {
            None => println!(
                "inserted {} rows in {:.3} seconds",
                result.rows_affected,
                started.elapsed().as_secs_f64()
            ),
            Some(error) => {
                eprintln!("{error}");
                break;
            }
        }
        next_key += CHUNK_SIZE;
    }

    Ok(())
}
