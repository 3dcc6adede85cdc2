mod convert;
mod describer;
mod loader;
mod merge;
mod quality;
mod report;
mod schema;
mod summary;
mod table;

use snafu::prelude::*;
use std::path::Path;

pub use convert::{categorize, datetime_autoconvert, datetime_autoconvert_lite};
pub use describer::Describer;
pub use loader::{get_csv_reader, load_dir, load_file, read_table, ErrorPolicy, LoadError, Options};
pub use merge::concatenate;
pub use quality::{
    check_index_duplicates, count_missing_values, find_duplicate_rows, find_row_missing_values,
    summarize_col_missing_values, ColumnMissing,
};
pub use report::{summary_report, ColumnOverview, Report};
pub use schema::{check_names, check_types, column_names, column_types, SchemaDescriptor, SlotMismatch};
pub use summary::{
    count_by_day, count_by_month, count_by_weekday, summarize_categorical, summarize_datetime,
    summarize_numeric, CategoricalSummary, DatetimeSummary, NumericSummary, TimeCounts,
};
pub use table::{Column, DataType, Table, TableCollection, Value};

#[non_exhaustive]
#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("{}", source))]
    LoadError { source: LoadError },

    #[snafu(display("Need at least one table to concatenate"))]
    EmptyCollection,

    #[snafu(display("Column {} does not exist", column))]
    ColumnNotFound { column: String },

    #[snafu(display("Column {} has {} values, expected {}", column, found, expected))]
    ColumnLength {
        column: String,
        expected: usize,
        found: usize,
    },

    #[snafu(display("Index has {} labels, expected {}", found, expected))]
    IndexLength { expected: usize, found: usize },

    #[snafu(display("Could not convert \"{}\" in column {} to a datetime", value, column))]
    DatetimeConversion { column: String, value: String },
}

/// Loads every CSV in `dir`, stacks them, converts datetime columns and
/// builds the summary report.
pub fn report_dir(
    dir: impl AsRef<Path>,
    options: &Options,
    index_column: Option<&str>,
    categorical: &[&str],
) -> Result<Report, Error> {
    let collection = load_dir(dir, options).context(LoadSnafu)?;

    if let Some(names) = column_names(&collection) {
        check_names(&names);
    }
    if let Some(types) = column_types(&collection) {
        check_types(&types);
    }

    let table = concatenate(&collection, index_column)?;
    let table = datetime_autoconvert(&table);
    summary_report(&table, categorical)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_sales_dir() {
        let options = Options::builder().build();
        let report = report_dir("fixtures/sales", &options, Some("order_id"), &["region"]).unwrap();
        assert_eq!(report.n_rows, 8);
        assert_eq!(report.n_cols, 4);
        assert_eq!(report.datetime.len(), 1);
        assert_eq!(report.numeric.len(), 2);
        assert_eq!(report.categorical.len(), 1);
    }

    #[test]
    fn report_missing_dir() {
        let options = Options::builder().build();
        let result = report_dir("fixtures/nowhere", &options, None, &[]);
        assert!(matches!(result, Err(Error::LoadError { .. })));
    }
}
