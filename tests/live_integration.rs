//! Scenarios against a running FeatureBase server.
//!
//! Skipped unless `FEATUREBASE_HOSTPORT` is set.

use std::{
    collections::HashMap,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use featurebase_http::{BatchOptions, ClientConfig, FeatureBaseClient, QueryResult};
use serde_json::json;

fn live_client() -> Option<FeatureBaseClient> {
    let host = match std::env::var("FEATUREBASE_HOSTPORT") {
        Ok(host) if !host.trim().is_empty() => host,
        _ => {
            eprintln!("skipping live test: FEATUREBASE_HOSTPORT is not set");
            return None;
        }
    };
    let client = FeatureBaseClient::new(
        ClientConfig::new(host).with_timeout(Duration::from_secs(30)),
    )
    .expect("live client must build");
    Some(client)
}

fn unique_suffix() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock must be after epoch")
        .as_millis()
}

fn first_cell(result: &QueryResult) -> Option<&serde_json::Value> {
    result.rows()?.first()?.as_array()?.first()
}

fn row_count(result: &QueryResult) -> Option<usize> {
    result.rows().map(<[_]>::len)
}

#[tokio::test]
async fn live_query_success_and_error() {
    let Some(client) = live_client() else {
        return;
    };

    let result = client.query("select toTimeStamp(0);").await;
    assert!(result.ok, "unexpected error: {:?}", result.error);
    assert_eq!(first_cell(&result), Some(&json!("1970-01-01T00:00:00Z")));

    let result = client
        .query("select non_existing_column from non_existing_table;")
        .await;
    assert!(!result.ok);
    assert!(result.error.as_ref().is_some_and(|err| err.is_sql()));
}

#[tokio::test]
async fn live_sequential_batch_in_order() {
    let Some(client) = live_client() else {
        return;
    };

    let table = format!("pclt_{}", unique_suffix());
    let sqls: Vec<String> = [
        "select * from {};",
        "create table {} (_id id, i1 int, s1 string);",
        "insert into {}(_id,i1,s1) values(1,1,'text1');",
        "insert into {}(_id,i1,s1) values(2,2,'text2');",
        "select count(*) from {};",
        "drop table {};",
    ]
    .iter()
    .map(|sql| sql.replace("{}", &table))
    .collect();

    // The table does not exist yet, so the first statement fails and
    // nothing else is sent.
    let results = client
        .query_batch(
            sqls.clone(),
            BatchOptions::sequential().stop_on_first_error(true),
        )
        .await;
    assert_eq!(results.len(), 1);
    assert!(!results.ok());

    let results = client
        .query_batch(sqls[1..].to_vec(), BatchOptions::sequential())
        .await;
    assert_eq!(results.len(), 5);
    assert!(results.ok(), "batch errors: {:?}", results.errors());
    assert_eq!(first_cell(&results.results()[3]), Some(&json!(2)));
}

#[tokio::test]
async fn live_concurrent_selects() {
    let Some(client) = live_client() else {
        return;
    };

    let suffix = unique_suffix();
    let t1 = format!("pclt_test_t1_{suffix}");
    let t2 = format!("pclt_test_t2_{suffix}");
    let mut setup = vec![
        format!("create table if not exists {t1}(_id id, i1 int, s1 string);"),
        format!("create table if not exists {t2}(_id id, i1 int, s1 string);"),
    ];
    for id in 1..=4 {
        setup.push(format!(
            "insert into {t1}(_id, i1, s1) values({id},{id},'text{id}');"
        ));
    }
    for id in 1..=2 {
        setup.push(format!(
            "insert into {t2}(_id, i1, s1) values({id},{id},'text{id}');"
        ));
    }
    let results = client.query_batch(setup, BatchOptions::sequential()).await;
    assert_eq!(results.len(), 8);
    assert!(results.ok(), "setup errors: {:?}", results.errors());

    let mut expected: HashMap<String, fn(&QueryResult) -> bool> = HashMap::new();
    expected.insert(format!("select * from {t1};"), |r| row_count(r) == Some(4));
    expected.insert(format!("select * from {t2};"), |r| row_count(r) == Some(2));
    expected.insert(format!("select count(*) from {t1};"), |r| {
        first_cell(r) == Some(&json!(4))
    });
    expected.insert(format!("select count(*) from {t2};"), |r| {
        first_cell(r) == Some(&json!(2))
    });

    let results = client
        .query_batch(expected.keys().cloned(), BatchOptions::concurrent())
        .await;
    assert_eq!(results.len(), 4);
    for result in &results {
        assert!(expected[&result.sql](result), "unexpected result: {result:?}");
    }

    let first = client.query(format!("select * from {t1};")).await;
    let second = client.query(format!("select * from {t1};")).await;
    assert_eq!(first.data, second.data);

    let results = client
        .query_batch(
            [format!("drop table {t1};"), format!("drop table {t2};")],
            BatchOptions::concurrent(),
        )
        .await;
    assert_eq!(results.len(), 2);
}

#[tokio::test]
async fn live_bad_host_fails_every_statement() {
    if live_client().is_none() {
        return;
    }

    let client = FeatureBaseClient::new(
        ClientConfig::new("bad-address").with_timeout(Duration::from_secs(5)),
    )
    .expect("client must build");
    let results = client
        .query_batch(["select 1;", "select 2;"], BatchOptions::concurrent())
        .await;

    assert_eq!(results.len(), 2);
    assert!(!results.ok());
}
