use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{CategoryField, CategoryValue, Metric, Record};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub label: &'static str,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSummary {
    pub metric: Metric,
    pub count: usize,
    pub mean: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// Returns the contiguous run of `records` dated within `[start, end]`.
///
/// `records` must be sorted by date. An inverted range yields an empty
/// slice rather than an error.
pub fn filter_by_date_range(records: &[Record], start: NaiveDate, end: NaiveDate) -> &[Record] {
    if start > end {
        return &[];
    }

    let lower = records.partition_point(|record| record.date < start);
    let upper = records.partition_point(|record| record.date <= end);
    records.get(lower..upper).unwrap_or(&[])
}

pub fn filter_by_category(records: &[Record], value: CategoryValue) -> Vec<Record> {
    records
        .iter()
        .filter(|record| value.matches(record))
        .cloned()
        .collect()
}

/// `None` when `records` is empty.
pub fn compute_mean(records: &[Record], metric: Metric) -> Option<f64> {
    summarize(records, metric).mean
}

pub fn summarize(records: &[Record], metric: Metric) -> MetricSummary {
    let mut total = 0.0;
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;

    for record in records {
        let value = metric.value(record);
        total += value;
        min = min.min(value);
        max = max.max(value);
    }

    if records.is_empty() {
        return MetricSummary {
            metric,
            count: 0,
            mean: None,
            min: None,
            max: None,
        };
    }

    // Rounding in the running total can push the quotient past the extremes.
    let mut mean = total / records.len() as f64;
    if min <= max {
        mean = mean.clamp(min, max);
    }

    MetricSummary {
        metric,
        count: records.len(),
        mean: Some(mean),
        min: Some(min),
        max: Some(max),
    }
}

pub fn count_by_category(records: &[Record], field: CategoryField) -> Vec<CategoryCount> {
    let mut counts: BTreeMap<&'static str, usize> = BTreeMap::new();

    for record in records {
        *counts.entry(field.label_of(record)).or_insert(0) += 1;
    }

    let mut values: Vec<CategoryCount> = counts
        .into_iter()
        .map(|(label, count)| CategoryCount { label, count })
        .collect();

    // BTreeMap already yields labels ascending and the sort is stable.
    values.sort_by(|a, b| b.count.cmp(&a.count));
    values
}

pub fn series(records: &[Record], metric: Metric) -> Vec<SeriesPoint> {
    records
        .iter()
        .map(|record| SeriesPoint {
            date: record.date,
            value: metric.value(record),
        })
        .collect()
}
