use anyhow::{Context, Result};
use bytes::Bytes;
use congregate_bucket::{BucketStore, S3BucketStore, S3Config};
use uuid::Uuid;

const REQUIRED_VARS: &[&str] = &[
    "CONGREGATE_TEST_S3_BUCKET",
    "CONGREGATE_TEST_S3_ENDPOINT",
    "CONGREGATE_TEST_S3_ACCESS_KEY_ID",
    "CONGREGATE_TEST_S3_SECRET_ACCESS_KEY",
];

fn config_from_env() -> Option<S3Config> {
    let values: Vec<String> = REQUIRED_VARS
        .iter()
        .map(|name| std::env::var(name).ok())
        .collect::<Option<_>>()?;

    Some(S3Config {
        bucket: values[0].clone(),
        region: std::env::var("CONGREGATE_TEST_S3_REGION").unwrap_or_else(|_| "us-east-1".into()),
        endpoint: Some(values[1].clone()),
        access_key_id: Some(values[2].clone()),
        secret_access_key: Some(values[3].clone()),
        session_token: None,
        force_path_style: true,
    })
}

#[tokio::test]
async fn s3_store_round_trip_and_glob() -> Result<()> {
    let Some(config) = config_from_env() else {
        eprintln!(
            "Skipping S3 store test; set {} to enable",
            REQUIRED_VARS.join(", ")
        );
        return Ok(());
    };

    let store = S3BucketStore::new(config)
        .await
        .context("failed to build S3 store")?;
    let prefix = format!("congregate-test/{}/", Uuid::new_v4());
    let source = format!("{prefix}part-r-00000");
    let copy = format!("{prefix}copied.csv");

    store
        .put_object(&source, Bytes::from_static(b"author,points\n"), "text/plain")
        .await
        .context("upload failed")?;
    store.copy_object(&source, &copy).await.context("copy failed")?;

    let matched = store.glob(&format!("{prefix}part-r-*")).await?;
    assert_eq!(matched, vec![source.clone()]);
    assert_eq!(
        store.get_object(&copy).await?,
        Bytes::from_static(b"author,points\n")
    );

    store.delete_object(&source).await.context("cleanup delete failed")?;
    store.delete_object(&copy).await.context("cleanup delete failed")?;
    Ok(())
}
