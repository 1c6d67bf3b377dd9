//! `seed` command: generate sample multi-source data and push it through the
//! real ingestion path.
//!
//! The generated payloads deliberately use each platform's native field
//! names (`campaign`/`spend` for Meta, `campaign_name`/`date_start`/`cost`/
//! `value`/`purchases` for GA4) so seeding exercises the normalizer's alias
//! resolution, not just the happy path.

use chrono::{Days, Utc};
use serde_json::{json, Value};
use sqlx::PgPool;

/// Generates `days` days of sample history for both sources and ingests it.
pub async fn seed_sample_data(pool: &PgPool, days: u64) -> anyhow::Result<()> {
    let meta_records = generate_meta_ads_data(days);
    println!("Ingesting {} Meta Ads record(s)", meta_records.len());
    let meta = adpulse_ingest::ingest_batch(pool, &meta_records, "meta_ads").await;
    println!("  success: {}, failed: {}", meta.success, meta.failed);

    let ga4_records = generate_ga4_data(days);
    println!("Ingesting {} GA4 record(s)", ga4_records.len());
    let ga4 = adpulse_ingest::ingest_batch(pool, &ga4_records, "ga4").await;
    println!("  success: {}, failed: {}", ga4.success, ga4.failed);

    for error in meta.errors.iter().chain(&ga4.errors) {
        println!("  failed record: {} ({})", error.data, error.error);
    }

    println!("Seeded {} record(s) total", meta.success + ga4.success);
    Ok(())
}

/// Sample Meta Ads payloads: native `campaign`/`spend`/`revenue` field names.
fn generate_meta_ads_data(days: u64) -> Vec<Value> {
    let campaigns = [
        ("meta_ads_123456", "Summer Sale Campaign", "active"),
        ("meta_ads_789012", "Product Launch", "active"),
        ("meta_ads_345678", "Retargeting Campaign", "paused"),
    ];

    let base_date = Utc::now()
        .date_naive()
        .checked_sub_days(Days::new(days))
        .unwrap_or_else(|| Utc::now().date_naive());

    let mut records = Vec::new();
    for i in 0..days {
        let Some(date) = base_date.checked_add_days(Days::new(i)) else {
            continue;
        };
        for (external_id, campaign, status) in campaigns {
            records.push(json!({
                "external_id": external_id,
                "campaign": campaign,
                "date": date.to_string(),
                "impressions": 10_000 + i * 500,
                "clicks": 300 + i * 10,
                "spend": 500.0 + i as f64 * 20.0,
                "conversions": 10 + i / 2,
                "revenue": 2_000.0 + i as f64 * 100.0,
                "status": status,
            }));
        }
    }
    records
}

/// Sample GA4 payloads: alias field names (`campaign_name`, `date_start`,
/// `cost`, `purchases`, `value`).
fn generate_ga4_data(days: u64) -> Vec<Value> {
    let campaigns = [
        ("ga4_source_1", "Organic Search", "active"),
        ("ga4_source_2", "Paid Search", "active"),
        ("ga4_source_3", "Social Media", "active"),
    ];

    let base_date = Utc::now()
        .date_naive()
        .checked_sub_days(Days::new(days))
        .unwrap_or_else(|| Utc::now().date_naive());

    let mut records = Vec::new();
    for i in 0..days {
        let Some(date) = base_date.checked_add_days(Days::new(i)) else {
            continue;
        };
        let sessions = 5_000 + i * 200;
        for (external_id, campaign, status) in campaigns {
            records.push(json!({
                "external_id": external_id,
                "campaign_name": campaign,
                "date_start": date.to_string(),
                "impressions": sessions * 2,
                "clicks": sessions,
                "cost": 300.0 + i as f64 * 15.0,
                "purchases": 8 + i / 2,
                "value": 1_500.0 + i as f64 * 80.0,
                "status": status,
            }));
        }
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meta_records_cover_each_campaign_per_day() {
        let records = generate_meta_ads_data(7);
        assert_eq!(records.len(), 21);
        assert!(records.iter().all(|r| r.get("campaign").is_some()));
        assert!(records.iter().all(|r| r.get("spend").is_some()));
    }

    #[test]
    fn ga4_records_use_alias_field_names() {
        let records = generate_ga4_data(3);
        assert_eq!(records.len(), 9);
        for record in &records {
            assert!(record.get("campaign_name").is_some());
            assert!(record.get("date_start").is_some());
            assert!(record.get("cost").is_some());
            assert!(record.get("value").is_some());
            assert!(record.get("purchases").is_some());
            assert!(record.get("campaign").is_none(), "no Meta-style aliases");
        }
    }

    #[test]
    fn generated_records_normalize_cleanly() {
        for record in generate_meta_ads_data(2) {
            adpulse_core::normalize_metric(&record, "meta_ads").expect("meta record normalizes");
        }
        for record in generate_ga4_data(2) {
            adpulse_core::normalize_metric(&record, "ga4").expect("ga4 record normalizes");
        }
    }
}
