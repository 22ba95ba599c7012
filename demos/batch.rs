use featurebase_http::{BatchOptions, FeatureBaseClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let db = FeatureBaseClient::from_env()?;

    let setup = db
        .query_batch(
            [
                "CREATE TABLE IF NOT EXISTS batch_users (_id ID, name STRING)",
                "INSERT INTO batch_users (_id, name) VALUES (1, 'Alice')",
                "INSERT INTO batch_users (_id, name) VALUES (2, 'Bob')",
            ],
            BatchOptions::sequential().stop_on_first_error(true),
        )
        .await;
    if !setup.ok() {
        for error in setup.errors() {
            eprintln!("setup error: {error}");
        }
        anyhow::bail!("setup failed");
    }

    let reads = db
        .query_batch(
            [
                "SELECT COUNT(*) FROM batch_users",
                "SELECT _id, name FROM batch_users",
                "SELECT name FROM no_such_table",
            ],
            BatchOptions::concurrent(),
        )
        .await;

    for result in &reads {
        match &result.error {
            None => println!(
                "{}: {} row(s) in {:?}",
                result.sql,
                result.rows().map_or(0, <[_]>::len),
                result.execution_duration()
            ),
            Some(error) => eprintln!("{}: {error}", result.sql),
        }
    }

    Ok(())
}
