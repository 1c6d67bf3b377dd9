//! Ingestion service: normalizes raw source records and writes them to the
//! upsert store.
//!
//! A single record is ingested as one transaction (campaign upsert, then
//! daily-metric upsert); any failure rolls the whole record back. Batches
//! process records strictly in input order with per-record isolation: one
//! record's failure never affects its siblings.

mod error;
mod service;

pub use error::IngestError;
pub use service::{ingest_batch, ingest_metric, BatchError, BatchOutcome, IngestReceipt};
