use std::sync::Arc;

use anyhow::Result;
use bytes::Bytes;
use congregate_bucket::{BucketStore, MemoryBucketStore};
use congregate_core::{
    parse_args, run, CongregateError, DefaultStores, EngineOptions, PipelineOptions, SharedStore,
    SinkOptions, HEADER,
};

async fn seed(store: &MemoryBucketStore, shards: &[(&str, &str)]) -> Result<()> {
    for (key, body) in shards {
        store
            .put_object(key, Bytes::copy_from_slice(body.as_bytes()), "text/plain")
            .await?;
    }
    Ok(())
}

fn options(input: &str, output: &str) -> PipelineOptions {
    PipelineOptions {
        input: input.to_string(),
        output: output.to_string(),
        sink: SinkOptions::default(),
        engine: EngineOptions::default(),
    }
}

async fn read(store: &MemoryBucketStore, key: &str) -> Result<String> {
    Ok(String::from_utf8(store.get_object(key).await?.to_vec())?)
}

#[tokio::test]
async fn congregates_shards_behind_a_single_header() -> Result<()> {
    let store = Arc::new(MemoryBucketStore::new());
    seed(
        &store,
        &[
            ("run/part-r-00000", "author,points\nalice,10\nbob,7\n"),
            ("run/part-r-00001", "author,points\ncarol,3\n"),
            ("run/part-r-00002", "author,points\n"),
            ("run/_SUCCESS", ""),
        ],
    )
    .await?;

    let report = run(
        &options("gs://bucket/run/part-r-*", "gs://bucket/results/output"),
        &SharedStore(store.clone()),
    )
    .await?;

    assert_eq!(report.outputs, vec!["gs://bucket/results/output-00000-of-00001.csv"]);
    assert_eq!(report.records_written, 3);
    assert_eq!(report.inputs.len(), 3);
    assert!(report.inputs.iter().all(|shard| shard.headers_stripped == 1));

    let body = read(&store, "results/output-00000-of-00001.csv").await?;
    let lines: Vec<&str> = body.lines().collect();
    assert_eq!(lines[0], HEADER);
    assert_eq!(lines.iter().filter(|line| **line == HEADER).count(), 1);

    let mut data = lines[1..].to_vec();
    data.sort_unstable();
    assert_eq!(data, vec!["alice,10", "bob,7", "carol,3"]);

    assert!(
        store.keys().iter().all(|key| !key.contains(".congregate-temp-")),
        "staging objects must be cleaned up: {:?}",
        store.keys()
    );
    Ok(())
}

#[tokio::test]
async fn every_output_shard_gets_the_header() -> Result<()> {
    let store = Arc::new(MemoryBucketStore::new());
    seed(
        &store,
        &[
            ("in/a.csv", "author,points\nalice,10\nbob,7\n"),
            ("in/b.csv", "author,points\r\ncarol,3\r\n"),
        ],
    )
    .await?;

    let mut opts = options("s3://bucket/in/*.csv", "s3://bucket/out/merged");
    opts.sink.num_shards = 2;
    opts.engine = EngineOptions::new(vec!["--direct_num_workers".into(), "2".into()]);

    let report = run(&opts, &SharedStore(store.clone())).await?;
    assert_eq!(
        report.outputs,
        vec![
            "s3://bucket/out/merged-00000-of-00002.csv",
            "s3://bucket/out/merged-00001-of-00002.csv"
        ]
    );

    assert_eq!(
        read(&store, "out/merged-00000-of-00002.csv").await?,
        "author,points\nalice,10\nbob,7\n"
    );
    assert_eq!(
        read(&store, "out/merged-00001-of-00002.csv").await?,
        "author,points\ncarol,3\n"
    );
    Ok(())
}

#[tokio::test]
async fn near_header_records_are_kept_and_counted() -> Result<()> {
    let store = Arc::new(MemoryBucketStore::new());
    seed(&store, &[("in/a", "author,points\nAuthor,Points\nalice,10\n")]).await?;

    let report = run(&options("s3://b/in/a", "s3://b/out"), &SharedStore(store.clone())).await?;

    assert_eq!(report.inputs[0].headers_stripped, 1);
    assert_eq!(report.inputs[0].near_headers, 1);
    assert_eq!(
        read(&store, "out-00000-of-00001.csv").await?,
        "author,points\nAuthor,Points\nalice,10\n"
    );
    Ok(())
}

#[tokio::test]
async fn template_with_directories_keeps_every_record() -> Result<()> {
    let store = Arc::new(MemoryBucketStore::new());
    seed(&store, &[("in/a", "author,points\nalice,10\nbob,7\n")]).await?;

    let mut opts = options("s3://b/in/a", "s3://b/out");
    opts.sink.num_shards = 2;
    opts.sink.shard_name_template = "-SS/part".to_string();

    let report = run(&opts, &SharedStore(store.clone())).await?;
    assert_eq!(
        report.outputs,
        vec!["s3://b/out-00/part.csv", "s3://b/out-01/part.csv"]
    );
    assert_eq!(read(&store, "out-00/part.csv").await?, "author,points\nalice,10\n");
    assert_eq!(read(&store, "out-01/part.csv").await?, "author,points\nbob,7\n");
    assert!(store.keys().iter().all(|key| !key.contains(".congregate-temp-")));
    Ok(())
}

#[tokio::test]
async fn lone_carriage_returns_do_not_split_records() -> Result<()> {
    let store = Arc::new(MemoryBucketStore::new());
    seed(&store, &[("in/a", "author,points\ralice,10\r")]).await?;

    let report = run(&options("s3://b/in/a", "s3://b/out"), &SharedStore(store.clone())).await?;

    assert_eq!(report.inputs[0].records_read, 1);
    assert_eq!(report.inputs[0].headers_stripped, 0);
    assert_eq!(
        read(&store, "out-00000-of-00001.csv").await?,
        "author,points\nauthor,points\ralice,10\r\n"
    );
    Ok(())
}

#[tokio::test]
async fn no_matching_input_is_an_error() {
    let store = Arc::new(MemoryBucketStore::new());
    let result = run(&options("gs://b/missing-*", "gs://b/out"), &SharedStore(store.clone())).await;

    assert!(matches!(result, Err(CongregateError::NoInputFiles(_))));
    assert!(store.keys().is_empty());
}

#[tokio::test]
async fn invalid_utf8_names_the_shard() -> Result<()> {
    let store = Arc::new(MemoryBucketStore::new());
    store
        .put_object("in/bad", Bytes::from_static(&[0xff, 0xfe, b'\n']), "text/plain")
        .await?;

    let result = run(&options("gs://b/in/*", "gs://b/out"), &SharedStore(store)).await;
    match result {
        Err(CongregateError::Encoding { path, .. }) => assert_eq!(path, "gs://b/in/bad"),
        other => panic!("expected encoding error, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn local_files_round_trip_through_default_stores() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let input_dir = dir.path().join("input");
    std::fs::create_dir_all(&input_dir)?;
    std::fs::write(input_dir.join("part-r-00000"), "author,points\nalice,10\n")?;
    std::fs::write(input_dir.join("part-r-00001"), "author,points\nbob,7\n")?;

    let input = format!("{}/part-r-*", input_dir.display());
    let output = format!("{}/results/output", dir.path().display());
    let opts = parse_args([
        "congregate",
        "--input",
        input.as_str(),
        "--output",
        output.as_str(),
        "--runner",
        "DirectRunner",
    ])?;

    let report = run(&opts, &DefaultStores).await?;
    let written = std::fs::read_to_string(&report.outputs[0])?;
    assert_eq!(written, "author,points\nalice,10\nbob,7\n");
    assert!(report.outputs[0].ends_with(".csv"));

    let leftovers: Vec<_> = std::fs::read_dir(dir.path().join("results"))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name())
        .collect();
    assert_eq!(leftovers.len(), 1, "unexpected files: {leftovers:?}");
    Ok(())
}
