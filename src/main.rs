// src/main.rs

use anyhow::Context;
use clap::Parser;
use plsdb_client::config::{parse_ids, Command, CommandLineInput};
use plsdb_client::{
    init_logging, write_table_tsv, ClientConfig, LoggingConfig, PlsdbClient, ResultTable,
    TableReport,
};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Runs the selected subcommand to completion.
async fn execute(client: &PlsdbClient, cli: &CommandLineInput) -> anyhow::Result<()> {
    let out = cli.out.as_deref();

    match &cli.command {
        Command::Summary { ids, fasta } => {
            let ids = parse_ids(ids)?;
            let report = client
                .summary(&ids, *fasta)
                .await
                .context("accession lookup failed")?;
            emit_report(&report, out)
        }
        Command::Fasta { ids } => {
            let ids = parse_ids(ids)?;
            let download = client
                .download_fasta(&ids)
                .await
                .context("fasta download failed")?;
            eprintln!(
                "✓ FASTA saved to {} ({} bytes)",
                download.path.display(),
                download.bytes_written
            );
            Ok(())
        }
        Command::Search(args) => {
            let request = args.to_request()?;
            let table = client
                .query_sequence(&request)
                .await
                .context("sequence search failed")?;
            emit_table(&table, out)
        }
        Command::Filter { filter } => {
            let (query, fasta) = filter.to_query()?;
            let report = client
                .filter(&query, fasta)
                .await
                .with_context(|| format!("filter {} failed", query))?;
            emit_report(&report, out)
        }
    }
}

/// Writes the table as TSV to `out`, or to stdout.
fn emit_table(table: &ResultTable, out: Option<&Path>) -> anyhow::Result<()> {
    match out {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("creating {}", path.display()))?;
            write_table_tsv(table, BufWriter::new(file))?;
            eprintln!("✓ {} row(s) saved to {}", table.len(), path.display());
        }
        None => write_table_tsv(table, std::io::stdout().lock())?,
    }
    Ok(())
}

fn emit_report(report: &TableReport, out: Option<&Path>) -> anyhow::Result<()> {
    emit_table(&report.table, out)?;

    if let Some(download) = &report.fasta {
        eprintln!("✓ FASTA saved to {}", download.path.display());
    }
    for failure in &report.partial_failures {
        eprintln!("⚠️  {}", failure);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CommandLineInput::parse();

    init_logging(&LoggingConfig::new(cli.verbose, cli.log_file.clone()))?;

    let config = ClientConfig::resolve(&cli)?;
    let client = PlsdbClient::new(&config)?;

    // First Ctrl-C cancels the running lookups or poll loop; a second one exits
    let cancel = client.cancellation_token();
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if cancel.is_cancelled() {
                log::warn!("second interrupt, exiting");
                std::process::exit(130);
            }
            log::warn!("interrupt received, cancelling (press Ctrl-C again to exit)");
            cancel.cancel();
        }
    });

    execute(&client, &cli).await
}
