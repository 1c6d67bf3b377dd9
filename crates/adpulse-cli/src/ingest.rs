//! `ingest` command: push a JSON file of raw records through batch ingestion.

use std::path::Path;

use sqlx::PgPool;

/// Reads a JSON array of raw records from `file` and ingests them as one
/// batch. Per-record failures are printed but do not abort the command;
/// the exit status reflects only whether the batch itself could run.
pub async fn ingest_file(pool: &PgPool, file: &Path, source: &str) -> anyhow::Result<()> {
    let contents = std::fs::read_to_string(file)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", file.display()))?;
    let records: Vec<serde_json::Value> = serde_json::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("{} is not a JSON array of records: {e}", file.display()))?;

    println!("Ingesting {} record(s) from {}", records.len(), file.display());

    let outcome = adpulse_ingest::ingest_batch(pool, &records, source).await;

    println!("Success: {}, failed: {}", outcome.success, outcome.failed);
    for error in &outcome.errors {
        println!("  failed record: {} ({})", error.data, error.error);
    }

    Ok(())
}
