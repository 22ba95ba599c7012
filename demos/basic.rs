use featurebase_http::FeatureBaseClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let db = FeatureBaseClient::from_env()?;

    for sql in [
        "CREATE TABLE IF NOT EXISTS users (_id ID, name STRING)",
        "INSERT INTO users (_id, name) VALUES (1, 'Kit')",
    ] {
        let result = db.query(sql).await;
        if let Some(error) = &result.error {
            anyhow::bail!("{sql}: {error}");
        }
    }

    let result = db.query("SELECT _id, name FROM users").await;
    if let Some(error) = &result.error {
        anyhow::bail!("select failed: {error}");
    }

    for record in result.records().unwrap_or_default() {
        println!("{record:?}");
    }

    Ok(())
}
