use anyhow::{Context, Result};
use comfy_table::Table;
use congregate_core::{parse_args, pipeline, DefaultStores, PipelineReport};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn print_banner() {
    let title = format!("CSV Congregate v{}", env!("CARGO_PKG_VERSION"));
    let rule = format!("+{}+", "-".repeat(title.len() + 2));
    println!("{rule}");
    println!("| {title} |");
    println!("{rule}");
}

#[tokio::main]
async fn main() -> Result<()> {
    print_banner();

    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .json()
        .init();

    let options = match parse_args(std::env::args_os()) {
        Ok(options) => options,
        Err(err) => err.exit(),
    };

    let report = pipeline::run(&options, &DefaultStores)
        .await
        .with_context(|| {
            format!(
                "pipeline from '{}' to '{}' failed",
                options.input, options.output
            )
        })?;

    println!("{}", summary_table(&report));
    info!(outputs = ?report.outputs, "done");
    Ok(())
}

fn summary_table(report: &PipelineReport) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Shard", "Records", "Headers stripped", "Header look-alikes"]);
    for shard in &report.inputs {
        table.add_row(vec![
            shard.path.clone(),
            shard.records_read.to_string(),
            shard.headers_stripped.to_string(),
            shard.near_headers.to_string(),
        ]);
    }
    for output in &report.outputs {
        table.add_row(vec![
            output.clone(),
            String::new(),
            String::new(),
            String::new(),
        ]);
    }
    table.add_row(vec![
        "records written".to_string(),
        report.records_written.to_string(),
        String::new(),
        String::new(),
    ]);
    table
}
