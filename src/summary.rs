//! Per-column statistics for datetime, numeric and categorical columns.

use crate::quality::round_to;
use crate::table::{Column, DataType, Table, Value, DATETIME_FORMAT};
use chrono::{Datelike, NaiveDateTime, TimeDelta};
use counter::Counter;
use serde_json::{json, Value as JsonValue};
use stats::{MinMax, OnlineStats};
use std::collections::BTreeMap;

const TOP_CATEGORIES: usize = 5;

fn columns_of(table: &Table, dtype: DataType) -> impl Iterator<Item = &Column> {
    table.columns().iter().filter(move |column| column.dtype() == dtype)
}

fn datetimes(column: &Column) -> impl Iterator<Item = NaiveDateTime> + '_ {
    column.values().iter().filter_map(Value::as_datetime)
}

#[derive(Debug, Clone, PartialEq)]
pub struct DatetimeSummary {
    pub column: String,
    pub min: Option<NaiveDateTime>,
    pub max: Option<NaiveDateTime>,
    pub span: Option<TimeDelta>,
}

impl DatetimeSummary {
    pub fn to_value(&self) -> JsonValue {
        let format = |datetime: Option<NaiveDateTime>| datetime.map(|datetime| datetime.format(DATETIME_FORMAT).to_string());
        json!({
            "column": self.column,
            "min": format(self.min),
            "max": format(self.max),
            "time_span_seconds": self.span.map(|span| span.num_seconds()),
        })
    }
}

pub fn summarize_datetime(table: &Table) -> Vec<DatetimeSummary> {
    columns_of(table, DataType::Datetime)
        .map(|column| {
            let mut minmax = MinMax::new();
            for datetime in datetimes(column) {
                minmax.add(datetime);
            }
            let min = minmax.min().copied();
            let max = minmax.max().copied();
            DatetimeSummary {
                column: column.name().to_owned(),
                min,
                max,
                span: min.zip(max).map(|(min, max)| max.signed_duration_since(min)),
            }
        })
        .collect()
}

/// Row counts of one datetime column grouped by a calendar field.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeCounts {
    pub column: String,
    pub counts: BTreeMap<u32, usize>,
}

impl TimeCounts {
    pub fn to_value(&self) -> JsonValue {
        let counts: serde_json::Map<String, JsonValue> = self
            .counts
            .iter()
            .map(|(bucket, count)| (bucket.to_string(), json!(count)))
            .collect();
        json!({"column": self.column, "counts": counts})
    }
}

fn count_by(table: &Table, bucket: impl Fn(&NaiveDateTime) -> u32) -> Vec<TimeCounts> {
    columns_of(table, DataType::Datetime)
        .map(|column| {
            let mut counts = BTreeMap::new();
            for datetime in datetimes(column) {
                *counts.entry(bucket(&datetime)).or_insert(0) += 1;
            }
            TimeCounts {
                column: column.name().to_owned(),
                counts,
            }
        })
        .collect()
}

/// Counts per month, 1 to 12.
pub fn count_by_month(table: &Table) -> Vec<TimeCounts> {
    count_by(table, |datetime| datetime.month())
}

/// Counts per day of the month, 1 to 31.
pub fn count_by_day(table: &Table) -> Vec<TimeCounts> {
    count_by(table, |datetime| datetime.day())
}

/// Counts per weekday, Monday is 0 and Sunday 6.
pub fn count_by_weekday(table: &Table) -> Vec<TimeCounts> {
    count_by(table, |datetime| datetime.weekday().num_days_from_monday())
}

#[derive(Debug, Clone, PartialEq)]
pub struct NumericSummary {
    pub column: String,
    pub min: f64,
    pub first_quartile: f64,
    pub median: f64,
    pub mean: f64,
    pub third_quartile: f64,
    pub max: f64,
    pub range: f64,
    /// Sample standard deviation, NaN with fewer than two values.
    pub std: f64,
}

impl NumericSummary {
    pub fn to_value(&self) -> JsonValue {
        json!({
            "column": self.column,
            "min": self.min,
            "1st_Qu": self.first_quartile,
            "median": self.median,
            "mean": self.mean,
            "3rd_Qu": self.third_quartile,
            "max": self.max,
            "range": self.range,
            "std": self.std,
        })
    }
}

/// Linear interpolation between the closest ranks of a sorted slice.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    sorted[lower] + (sorted[upper] - sorted[lower]) * (position - lower as f64)
}

fn summarize_numeric_column(column: &Column) -> NumericSummary {
    let mut values: Vec<f64> = column.values().iter().filter_map(Value::as_f64).collect();
    values.sort_by(f64::total_cmp);

    let (Some(min), Some(max)) = (values.first().copied(), values.last().copied()) else {
        return NumericSummary {
            column: column.name().to_owned(),
            min: f64::NAN,
            first_quartile: f64::NAN,
            median: f64::NAN,
            mean: f64::NAN,
            third_quartile: f64::NAN,
            max: f64::NAN,
            range: f64::NAN,
            std: f64::NAN,
        };
    };

    let online = OnlineStats::from_slice(values.as_slice());
    let n = values.len() as f64;
    let std = if values.len() > 1 {
        (online.variance() * n / (n - 1.0)).sqrt()
    } else {
        f64::NAN
    };

    NumericSummary {
        column: column.name().to_owned(),
        min,
        first_quartile: quantile(&values, 0.25),
        median: stats::median(values.iter().copied()).unwrap_or(f64::NAN),
        mean: online.mean(),
        third_quartile: quantile(&values, 0.75),
        max,
        range: max - min,
        std,
    }
}

/// Statistics for every integer and number column.
pub fn summarize_numeric(table: &Table) -> Vec<NumericSummary> {
    table
        .columns()
        .iter()
        .filter(|column| column.dtype().is_numeric())
        .map(summarize_numeric_column)
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoricalSummary {
    pub column: String,
    pub n_missing: usize,
    /// Share of non-missing values, rounded to two decimals.
    pub complete_rate: f64,
    /// Distinct labels, a missing value counting as one.
    pub n_unique: usize,
    /// Most frequent labels, most common first.
    pub top: Vec<(String, usize)>,
}

impl CategoricalSummary {
    pub fn to_value(&self) -> JsonValue {
        let top: Vec<JsonValue> = self
            .top
            .iter()
            .map(|(label, count)| json!({"label": label, "count": count}))
            .collect();
        json!({
            "column": self.column,
            "n_missing": self.n_missing,
            "complete_rate": self.complete_rate,
            "n_unique": self.n_unique,
            "top": top,
        })
    }
}

/// Statistics for every categorical column.
pub fn summarize_categorical(table: &Table) -> Vec<CategoricalSummary> {
    columns_of(table, DataType::Categorical)
        .map(|column| {
            let n_missing = column.null_count();
            let labels: Counter<&str> = column.values().iter().filter_map(Value::as_str).collect();
            let complete_rate = if column.is_empty() {
                f64::NAN
            } else {
                round_to(1.0 - n_missing as f64 / column.len() as f64, 2)
            };
            CategoricalSummary {
                column: column.name().to_owned(),
                n_missing,
                complete_rate,
                n_unique: labels.len() + usize::from(n_missing > 0),
                top: labels
                    .k_most_common_ordered(TOP_CATEGORIES)
                    .into_iter()
                    .map(|(label, count)| (label.to_owned(), count))
                    .collect(),
            }
        })
        .collect()
}
