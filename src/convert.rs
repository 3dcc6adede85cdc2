use crate::table::{Column, DataType, Table, Value};
use crate::{ColumnNotFoundSnafu, DatetimeConversionSnafu, Error};
use chrono::NaiveDateTime;
use snafu::prelude::*;

lazy_static::lazy_static! {
    static ref DATETIME_PATTERN: regex::Regex = regex::Regex::new(r"^\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}")
        .expect("we know the regex is fine");
}

fn looks_like_datetime(value: &Value) -> bool {
    matches!(value, Value::String(string) if DATETIME_PATTERN.is_match(string))
}

fn parse_datetime(string: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(string, "%Y-%m-%d %H:%M:%S%.f").ok()
}

fn strict_conversion(column: &Column) -> Option<Vec<Value>> {
    if column.dtype() != DataType::String || column.null_count() == column.len() {
        return None;
    }
    column
        .values()
        .iter()
        .map(|value| match value {
            Value::Null => Some(Value::Null),
            Value::String(string) if looks_like_datetime(value) => parse_datetime(string).map(Value::Datetime),
            _ => None,
        })
        .collect()
}

/// Converts every string column whose values all look like
/// `YYYY-MM-DD HH:MM:SS` into a datetime column. A single value that does
/// not match or parse leaves its column untouched.
pub fn datetime_autoconvert(table: &Table) -> Table {
    let columns = table
        .columns()
        .iter()
        .map(|column| match strict_conversion(column) {
            Some(values) => {
                log::debug!("converted {} to datetime", column.name());
                Column::new(column.name(), DataType::Datetime, values)
            }
            None => column.clone(),
        })
        .collect();
    table.with_columns(columns)
}

/// Like [`datetime_autoconvert`] but only the first non-null value of each
/// column decides whether it is converted.
///
/// Later values are not checked up front, so a column that starts with a
/// datetime and then holds something else fails with
/// [`Error::DatetimeConversion`].
pub fn datetime_autoconvert_lite(table: &Table) -> Result<Table, Error> {
    let mut columns = Vec::with_capacity(table.n_cols());

    for column in table.columns() {
        let first = column.values().iter().find(|value| !value.is_null());
        if !first.is_some_and(looks_like_datetime) {
            columns.push(column.clone());
            continue;
        }

        let values = column
            .values()
            .iter()
            .map(|value| match value {
                Value::Null => Ok(Value::Null),
                Value::String(string) => parse_datetime(string).map(Value::Datetime).context(
                    DatetimeConversionSnafu {
                        column: column.name(),
                        value: string.as_str(),
                    },
                ),
                other => DatetimeConversionSnafu {
                    column: column.name(),
                    value: other.to_string(),
                }
                .fail(),
            })
            .collect::<Result<Vec<Value>, Error>>()?;

        columns.push(Column::new(column.name(), DataType::Datetime, values));
    }

    Ok(table.with_columns(columns))
}

/// Returns a copy of `table` with the named columns retyped as categorical.
pub fn categorize(table: &Table, names: &[&str]) -> Result<Table, Error> {
    for name in names {
        ensure!(table.column(name).is_some(), ColumnNotFoundSnafu { column: *name });
    }

    let columns = table
        .columns()
        .iter()
        .map(|column| {
            if !names.contains(&column.name()) {
                return column.clone();
            }
            let labels = column
                .values()
                .iter()
                .map(|value| match value {
                    Value::Null | Value::String(_) => value.clone(),
                    other => Value::String(other.to_string()),
                })
                .collect();
            Column::new(column.name(), DataType::Categorical, labels)
        })
        .collect();

    Ok(table.with_columns(columns))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::read_table;
    use chrono::NaiveDate;

    fn read(csv: &str) -> Table {
        read_table(csv::Reader::from_reader(csv.as_bytes())).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> Value {
        Value::Datetime(NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, min, s).unwrap())
    }

    #[test]
    fn strict_converts_matching_column() {
        let table = read("when,other\n2021-01-04 09:15:00,x\n,y\n2021-02-01 08:00:00.5,z\n");
        let converted = datetime_autoconvert(&table);

        let when = converted.column("when").unwrap();
        assert_eq!(when.dtype(), DataType::Datetime);
        assert_eq!(when.values()[0], at(2021, 1, 4, 9, 15, 0));
        assert_eq!(when.values()[1], Value::Null);
        assert_eq!(converted.column("other").unwrap().dtype(), DataType::String);
        assert_eq!(converted.index(), table.index());
    }

    #[test]
    fn strict_leaves_column_with_one_bad_value() {
        let table = read("when,also\n2021-01-04 09:15:00,2021-01-04 09:15:00\n04/01/2021,2021-01-05 10:00:00\n");
        let converted = datetime_autoconvert(&table);
        let when = converted.column("when").unwrap();
        assert_eq!(when.dtype(), DataType::String);
        assert_eq!(when, table.column("when").unwrap());
        assert_eq!(converted.column("also").unwrap().dtype(), DataType::Datetime);
    }

    #[test]
    fn strict_leaves_impossible_dates() {
        let table = read("when\n2021-13-04 09:15:00\n");
        assert_eq!(datetime_autoconvert(&table).column("when").unwrap().dtype(), DataType::String);
    }

    #[test]
    fn strict_skips_other_types() {
        let table = read("n,empty\n20210104,\n");
        let converted = datetime_autoconvert(&table);
        assert_eq!(converted, table);
    }

    #[test]
    fn lite_converts_from_first_value() {
        let table = read("when,n\n,1\n2021-01-04 09:15:00,2\n2021-01-05 10:00:00,3\n");
        let converted = datetime_autoconvert_lite(&table).unwrap();
        let when = converted.column("when").unwrap();
        assert_eq!(when.dtype(), DataType::Datetime);
        assert_eq!(when.values()[0], Value::Null);
        assert_eq!(when.values()[2], at(2021, 1, 5, 10, 0, 0));
        assert_eq!(converted.column("n").unwrap().dtype(), DataType::Integer);
    }

    #[test]
    fn lite_fails_on_later_mismatch() {
        let table = read("when\n2021-01-04 09:15:00\nyesterday\n");
        match datetime_autoconvert_lite(&table) {
            Err(Error::DatetimeConversion { column, value }) => {
                assert_eq!(column, "when");
                assert_eq!(value, "yesterday");
            }
            other => panic!("expected a conversion error, got {other:?}"),
        }
    }

    #[test]
    fn lite_ignores_first_non_match() {
        let table = read("when\nyesterday\n2021-01-04 09:15:00\n");
        let converted = datetime_autoconvert_lite(&table).unwrap();
        assert_eq!(converted, table);
    }

    #[test]
    fn categorize_returns_new_table() {
        let table = read("grade,score\n1,a\n2,\n1,c\n");
        let categorized = categorize(&table, &["grade", "score"]).unwrap();

        let grade = categorized.column("grade").unwrap();
        assert_eq!(grade.dtype(), DataType::Categorical);
        assert_eq!(grade.values()[0], Value::String("1".into()));
        assert_eq!(categorized.column("score").unwrap().values()[1], Value::Null);
        assert_eq!(table.column("grade").unwrap().dtype(), DataType::Integer);

        assert!(matches!(
            categorize(&table, &["nope"]),
            Err(Error::ColumnNotFound { .. })
        ));
    }
}
