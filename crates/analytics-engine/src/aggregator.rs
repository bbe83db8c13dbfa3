//! Composes the pipeline: dedup, categorize for revenue, resolve cities
//! sequentially, then roll everything up into overall metrics, per-city
//! metrics and a time series.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Months, Timelike, Utc};
use shared_types::{CityMetric, OverallMetrics, SaleDocument, SalesMetrics, Trend, TrendBucket};

use crate::dedup::deduplicate;
use crate::extractors::timestamp::parse_timestamp;
use crate::geo::lookup::{CepLookup, CnpjLookup};
use crate::geo::GeoResolver;
use crate::period::Period;
use crate::products::categorize;
use crate::text::normalize;

const TOP_CITIES: usize = 20;

/// Run the full aggregation over a raw batch. Total: every failure mode
/// downstream degrades a single record, never the batch.
pub async fn aggregate<C: CepLookup, J: CnpjLookup>(
    resolver: &GeoResolver<C, J>,
    records: &[SaleDocument],
    period: Period,
    now: DateTime<Utc>,
) -> SalesMetrics {
    let deduped = deduplicate(records);
    let prices: Vec<u64> = deduped
        .iter()
        .map(|doc| categorize(&doc.products).price())
        .collect();
    let timestamps: Vec<Option<DateTime<Utc>>> = deduped
        .iter()
        .map(|doc| parse_timestamp(&doc.created_at))
        .collect();

    // City resolution is strictly sequential: the resolver paces its own
    // external calls and must not be fanned out.
    let mut city_order: Vec<String> = Vec::new();
    let mut city_docs: HashMap<String, Vec<usize>> = HashMap::new();
    for (idx, doc) in deduped.iter().enumerate() {
        if let Some(location) = resolver.resolve(doc).await {
            if !city_docs.contains_key(&location.city) {
                city_order.push(location.city.clone());
            }
            city_docs.entry(location.city).or_default().push(idx);
        }
    }

    let overall = overall_metrics(&deduped, &prices, &timestamps, city_docs.len() as u64, now);
    let per_city = per_city_metrics(&city_order, &city_docs, &prices, &timestamps, now);
    let trends = trend_buckets(&prices, &timestamps, period, now);

    SalesMetrics {
        overall,
        per_city,
        trends,
    }
}

fn overall_metrics(
    deduped: &[SaleDocument],
    prices: &[u64],
    timestamps: &[Option<DateTime<Utc>>],
    distinct_cities: u64,
    now: DateTime<Utc>,
) -> OverallMetrics {
    let total = deduped.len() as u64;
    let revenue: u64 = prices.iter().sum();
    let average_ticket = if total == 0 {
        0.0
    } else {
        revenue as f64 / total as f64
    };

    let distinct_buyers = deduped
        .iter()
        .filter_map(buyer_identity)
        .collect::<HashSet<_>>()
        .len() as u64;

    let all: Vec<DateTime<Utc>> = timestamps.iter().flatten().copied().collect();
    let (recent, previous) = month_window_counts(&all, now);

    OverallMetrics {
        total_documents: total,
        revenue,
        average_ticket,
        growth_pct: growth(recent, previous),
        distinct_buyers,
        distinct_cities,
    }
}

/// Company name when present, otherwise buyer name; blank records carry no
/// buyer identity at all.
fn buyer_identity(doc: &SaleDocument) -> Option<String> {
    let company = normalize(&doc.company_name);
    if !company.is_empty() {
        return Some(company);
    }
    let buyer = normalize(&doc.buyer_name);
    (!buyer.is_empty()).then_some(buyer)
}

fn per_city_metrics(
    city_order: &[String],
    city_docs: &HashMap<String, Vec<usize>>,
    prices: &[u64],
    timestamps: &[Option<DateTime<Utc>>],
    now: DateTime<Utc>,
) -> Vec<CityMetric> {
    let mut metrics: Vec<CityMetric> = city_order
        .iter()
        .filter_map(|city| {
            let indices = city_docs.get(city)?;
            if indices.is_empty() {
                return None;
            }
            let document_count = indices.len() as u64;
            let revenue: u64 = indices.iter().map(|&i| prices[i]).sum();
            let stamps: Vec<DateTime<Utc>> =
                indices.iter().filter_map(|&i| timestamps[i]).collect();
            let (recent, previous) = month_window_counts(&stamps, now);

            Some(CityMetric {
                city: city.clone(),
                document_count,
                revenue,
                peak_hour: peak_hour(&stamps),
                trend: trend_direction(recent, previous),
                growth_pct: growth(recent, previous),
                marketing_potential: marketing_potential(document_count, revenue),
            })
        })
        .collect();

    metrics.sort_by(|a, b| b.revenue.cmp(&a.revenue));
    metrics.truncate(TOP_CITIES);
    metrics
}

fn trend_buckets(
    prices: &[u64],
    timestamps: &[Option<DateTime<Utc>>],
    period: Period,
    now: DateTime<Utc>,
) -> Vec<TrendBucket> {
    struct Acc {
        count: u64,
        revenue: u64,
        earliest: DateTime<Utc>,
    }

    let lower = period.lower_bound(now);
    let mut buckets: HashMap<String, Acc> = HashMap::new();
    for (idx, stamp) in timestamps.iter().enumerate() {
        // Unparsable timestamps stay out of the series, as do records
        // older than the requested window.
        let Some(ts) = stamp else { continue };
        if *ts < lower {
            continue;
        }
        let acc = buckets.entry(period.bucket_label(*ts)).or_insert(Acc {
            count: 0,
            revenue: 0,
            earliest: *ts,
        });
        acc.count += 1;
        acc.revenue += prices[idx];
        if *ts < acc.earliest {
            acc.earliest = *ts;
        }
    }

    // Labels like "dd/mm" are not lexicographically chronological, so the
    // series is ordered by the underlying timestamps.
    let mut series: Vec<(DateTime<Utc>, TrendBucket)> = buckets
        .into_iter()
        .map(|(label, acc)| {
            (
                acc.earliest,
                TrendBucket {
                    label,
                    document_count: acc.count,
                    revenue: acc.revenue,
                },
            )
        })
        .collect();
    series.sort_by_key(|(earliest, _)| *earliest);
    series.into_iter().map(|(_, bucket)| bucket).collect()
}

/// Documents in the trailing month and in the month before it.
fn month_window_counts(timestamps: &[DateTime<Utc>], now: DateTime<Utc>) -> (u64, u64) {
    let one_month_ago = now.checked_sub_months(Months::new(1)).unwrap_or(now);
    let two_months_ago = now
        .checked_sub_months(Months::new(2))
        .unwrap_or(one_month_ago);

    // Upper bound at `now` keeps future-dated imports (clock skew, bad
    // migrations) out of the trailing window.
    let recent = timestamps
        .iter()
        .filter(|ts| **ts >= one_month_ago && **ts <= now)
        .count() as u64;
    let previous = timestamps
        .iter()
        .filter(|ts| **ts >= two_months_ago && **ts < one_month_ago)
        .count() as u64;
    (recent, previous)
}

/// Month-over-month growth. An empty preceding window reads as 100%.
fn growth(recent: u64, previous: u64) -> f64 {
    if previous == 0 {
        100.0
    } else {
        (recent as f64 - previous as f64) / previous as f64 * 100.0
    }
}

fn trend_direction(recent: u64, previous: u64) -> Trend {
    let r = recent as f64;
    let p = previous as f64;
    if r > p * 1.1 {
        Trend::Up
    } else if r < p * 0.9 {
        Trend::Down
    } else {
        Trend::Stable
    }
}

/// Most frequent hour-of-day, ties broken in favor of the later hour.
/// Cities whose documents all lack parseable timestamps report hour 0.
fn peak_hour(timestamps: &[DateTime<Utc>]) -> u32 {
    let mut histogram = [0u32; 24];
    for ts in timestamps {
        histogram[ts.hour() as usize] += 1;
    }
    let mut peak = 0;
    let mut best = 0;
    for (hour, &count) in histogram.iter().enumerate() {
        if count > 0 && count >= best {
            best = count;
            peak = hour as u32;
        }
    }
    peak
}

/// Bounded composite of volume and ticket size, clamped into [0, 100].
fn marketing_potential(documents: u64, revenue: u64) -> u32 {
    if documents == 0 {
        return 0;
    }
    let volume = (documents as f64 / 100.0 * 50.0).min(100.0);
    let ticket = (revenue as f64 / documents as f64 / 100.0 * 50.0).min(50.0);
    (volume + ticket).round().min(100.0) as u32
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// The marketing score stays within [0, 100] for any rollup.
        #[test]
        fn marketing_potential_is_bounded(documents in 0u64..100_000, price in 0u64..1_000) {
            let revenue = documents.saturating_mul(price);
            let score = marketing_potential(documents, revenue);
            prop_assert!(score <= 100);
        }
    }
}
