use crate::convert::categorize;
use crate::quality::summarize_col_missing_values;
use crate::summary::{
    count_by_day, count_by_month, count_by_weekday, summarize_categorical, summarize_datetime,
    summarize_numeric, CategoricalSummary, DatetimeSummary, NumericSummary, TimeCounts,
};
use crate::table::{DataType, Table, DATETIME_FORMAT};
use crate::Error;
use serde_json::{json, Value as JsonValue};
use std::fmt;

const GLIMPSE_ROWS: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnOverview {
    pub column: String,
    pub dtype: DataType,
    pub n_missing: usize,
    pub perc_missing: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub n_rows: usize,
    pub n_cols: usize,
    pub glimpse: Table,
    pub columns: Vec<ColumnOverview>,
    pub datetime: Vec<DatetimeSummary>,
    pub by_month: Vec<TimeCounts>,
    pub by_day: Vec<TimeCounts>,
    pub by_weekday: Vec<TimeCounts>,
    pub numeric: Vec<NumericSummary>,
    pub categorical: Vec<CategoricalSummary>,
}

/// Builds the full summary of `table`. The `categorical` columns are
/// treated as categorical before any statistics are computed.
pub fn summary_report(table: &Table, categorical: &[&str]) -> Result<Report, Error> {
    let table = categorize(table, categorical)?;

    let columns = table
        .columns()
        .iter()
        .zip(summarize_col_missing_values(&table, true))
        .map(|(column, missing)| ColumnOverview {
            column: missing.column,
            dtype: column.dtype(),
            n_missing: missing.n_missing,
            perc_missing: missing.perc_missing,
        })
        .collect();

    log::info!("summarizing {} columns over {} rows", table.n_cols(), table.n_rows());

    Ok(Report {
        n_rows: table.n_rows(),
        n_cols: table.n_cols(),
        glimpse: table.head(GLIMPSE_ROWS),
        columns,
        datetime: summarize_datetime(&table),
        by_month: count_by_month(&table),
        by_day: count_by_day(&table),
        by_weekday: count_by_weekday(&table),
        numeric: summarize_numeric(&table),
        categorical: summarize_categorical(&table),
    })
}

impl Report {
    pub fn to_value(&self) -> JsonValue {
        let columns: Vec<JsonValue> = self
            .columns
            .iter()
            .map(|column| {
                json!({
                    "column": column.column,
                    "dtype": column.dtype.name(),
                    "n_missing": column.n_missing,
                    "perc_missing": column.perc_missing,
                })
            })
            .collect();
        let counts = |counts: &[TimeCounts]| counts.iter().map(TimeCounts::to_value).collect::<Vec<_>>();

        json!({
            "n_rows": self.n_rows,
            "n_cols": self.n_cols,
            "glimpse": self.glimpse.to_records(),
            "columns": columns,
            "datetime": {
                "summary": self.datetime.iter().map(DatetimeSummary::to_value).collect::<Vec<_>>(),
                "by_month": counts(&self.by_month),
                "by_day": counts(&self.by_day),
                "by_weekday": counts(&self.by_weekday),
            },
            "numeric": self.numeric.iter().map(NumericSummary::to_value).collect::<Vec<_>>(),
            "categorical": self.categorical.iter().map(CategoricalSummary::to_value).collect::<Vec<_>>(),
        })
    }
}

fn section(f: &mut fmt::Formatter<'_>, title: &str) -> fmt::Result {
    writeln!(f)?;
    writeln!(f, "___{title:_<60}")
}

fn write_counts(f: &mut fmt::Formatter<'_>, title: &str, counts: &[TimeCounts]) -> fmt::Result {
    writeln!(f, "{title}")?;
    for column in counts {
        let buckets: Vec<String> = column
            .counts
            .iter()
            .map(|(bucket, count)| format!("{bucket}: {count}"))
            .collect();
        writeln!(f, "  {}  {}", column.column, buckets.join(", "))?;
    }
    Ok(())
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "SUMMARY REPORT")?;
        writeln!(f)?;
        writeln!(f, "First rows:")?;
        writeln!(f, "{}", self.glimpse)?;

        section(f, "SHAPE AND TYPES")?;
        writeln!(f, "{} columns, {} rows", self.n_cols, self.n_rows)?;
        let width = self.columns.iter().map(|column| column.column.len()).max().unwrap_or(0);
        writeln!(f, "{:width$}  {:>11}  {:>9}  {:>12}", "", "dtype", "n_missing", "perc_missing")?;
        for column in &self.columns {
            writeln!(
                f,
                "{:width$}  {:>11}  {:>9}  {:>12}",
                column.column,
                column.dtype.name(),
                column.n_missing,
                column.perc_missing
            )?;
        }

        section(f, "DATETIME COLUMNS")?;
        for summary in &self.datetime {
            let format = |datetime: Option<chrono::NaiveDateTime>| {
                datetime
                    .map(|datetime| datetime.format(DATETIME_FORMAT).to_string())
                    .unwrap_or_else(|| "NaT".to_owned())
            };
            let span = summary
                .span
                .map(|span| format!("{} days {}s", span.num_days(), span.num_seconds() % 86_400))
                .unwrap_or_else(|| "NaT".to_owned());
            writeln!(
                f,
                "{}  min {}  max {}  span {}",
                summary.column,
                format(summary.min),
                format(summary.max),
                span
            )?;
        }
        write_counts(f, "Rows per month:", &self.by_month)?;
        write_counts(f, "Rows per day of the month:", &self.by_day)?;
        write_counts(f, "Rows per weekday (Monday=0, Sunday=6):", &self.by_weekday)?;

        section(f, "NUMERIC COLUMNS")?;
        writeln!(
            f,
            "{:width$}  {:>10}  {:>10}  {:>10}  {:>10}  {:>10}  {:>10}  {:>10}  {:>10}",
            "", "min", "1st_Qu", "median", "mean", "3rd_Qu", "max", "range", "std"
        )?;
        for summary in &self.numeric {
            writeln!(
                f,
                "{:width$}  {:>10.3}  {:>10.3}  {:>10.3}  {:>10.3}  {:>10.3}  {:>10.3}  {:>10.3}  {:>10.3}",
                summary.column,
                summary.min,
                summary.first_quartile,
                summary.median,
                summary.mean,
                summary.third_quartile,
                summary.max,
                summary.range,
                summary.std
            )?;
        }

        section(f, "CATEGORICAL COLUMNS")?;
        for (num, summary) in self.categorical.iter().enumerate() {
            writeln!(
                f,
                "[{num}] {}  n_missing {}  complete_rate {}  n_unique {}",
                summary.column, summary.n_missing, summary.complete_rate, summary.n_unique
            )?;
            for (label, count) in &summary.top {
                writeln!(f, "    {label}  {count}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::datetime_autoconvert;
    use crate::loader::{load_dir, read_table, Options};
    use crate::merge::concatenate;
    use assert_json_diff::assert_json_include;

    fn sales() -> Table {
        let collection = load_dir("fixtures/sales", &Options::builder().build()).unwrap();
        datetime_autoconvert(&concatenate(&collection, None).unwrap())
    }

    #[test]
    fn sections_follow_column_types() {
        let report = summary_report(&sales(), &["region"]).unwrap();

        assert_eq!(report.n_rows, 8);
        assert_eq!(report.n_cols, 5);
        assert_eq!(report.glimpse.n_rows(), 5);
        assert_eq!(
            report.columns.iter().map(|column| column.dtype).collect::<Vec<_>>(),
            vec![
                DataType::Integer,
                DataType::Datetime,
                DataType::Categorical,
                DataType::Float,
                DataType::Integer
            ]
        );
        assert_eq!(report.columns[3].n_missing, 1);
        assert_eq!(report.columns[3].perc_missing, 12.5);

        assert_eq!(report.datetime.len(), 1);
        assert_eq!(report.by_weekday[0].counts[&0], 4);
        assert_eq!(
            report.numeric.iter().map(|summary| summary.column.as_str()).collect::<Vec<_>>(),
            vec!["order_id", "amount", "quantity"]
        );
        assert_eq!(report.categorical.len(), 1);
        assert_eq!(report.categorical[0].n_unique, 4);
        assert_eq!(report.categorical[0].top[0], ("north".to_owned(), 3));
    }

    #[test]
    fn input_keeps_its_types() {
        let table = sales();
        summary_report(&table, &["region"]).unwrap();
        assert_eq!(table.column("region").unwrap().dtype(), DataType::String);
    }

    #[test]
    fn unknown_categorical_column() {
        let result = summary_report(&sales(), &["nope"]);
        assert!(matches!(result, Err(Error::ColumnNotFound { .. })));
    }

    #[test]
    fn json_rendering() {
        let table = read_table(csv::Reader::from_reader("x,c\n1,a\n2,a\n3,\n4,b\n".as_bytes())).unwrap();
        let report = summary_report(&table, &["c"]).unwrap();
        assert_json_include!(
            actual: report.to_value(),
            expected: json!({
                "n_rows": 4,
                "columns": [
                    {"column": "x", "dtype": "integer", "n_missing": 0},
                    {"column": "c", "dtype": "categorical", "n_missing": 1, "perc_missing": 25.0},
                ],
                "numeric": [{"column": "x", "min": 1.0, "median": 2.5, "max": 4.0, "range": 3.0}],
                "categorical": [{
                    "column": "c",
                    "n_unique": 3,
                    "complete_rate": 0.75,
                    "top": [{"label": "a", "count": 2}, {"label": "b", "count": 1}],
                }],
            })
        );
    }

    #[test]
    fn display_has_every_section() {
        let text = summary_report(&sales(), &["region"]).unwrap().to_string();
        for heading in ["SHAPE AND TYPES", "DATETIME COLUMNS", "NUMERIC COLUMNS", "CATEGORICAL COLUMNS"] {
            assert!(text.contains(heading), "missing {heading}");
        }
        assert!(text.contains("8 rows"));
        assert!(text.contains("min 2021-01-04 09:15:00"));
    }
}
