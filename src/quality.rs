use crate::table::{Table, Value};
use serde_json::{json, Value as JsonValue};
use std::collections::HashSet;

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Rows equal, across every column, to an earlier row. The first
/// occurrence is not included.
pub fn find_duplicate_rows(table: &Table) -> Table {
    let mut seen = HashSet::new();
    let rows: Vec<usize> = (0..table.n_rows())
        .filter(|row| !seen.insert(table.row(*row)))
        .collect();

    let duplicates = table.take(&rows);
    if duplicates.is_empty() {
        log::info!("No duplicate rows detected.");
    } else {
        log::info!("{} duplicate rows detected:\n{duplicates}", duplicates.n_rows());
    }
    duplicates
}

/// Rows whose index label equals an earlier row's label.
pub fn check_index_duplicates(table: &Table) -> Table {
    let mut seen: HashSet<&Value> = HashSet::new();
    let rows: Vec<usize> = table
        .index()
        .iter()
        .enumerate()
        .filter(|(_, label)| !seen.insert(*label))
        .map(|(row, _)| row)
        .collect();

    let duplicates = table.take(&rows);
    if duplicates.is_empty() {
        log::info!("No rows with duplicate index were detected.");
    } else {
        log::info!("{} rows with duplicate index detected:\n{duplicates}", duplicates.n_rows());
    }
    duplicates
}

fn rows_with_missing(table: &Table) -> Vec<usize> {
    (0..table.n_rows())
        .filter(|row| table.columns().iter().any(|column| column.values()[*row].is_null()))
        .collect()
}

/// Fraction of rows with at least one missing value, `0.0` for an empty table.
pub fn count_missing_values(table: &Table) -> f64 {
    if table.is_empty() {
        return 0.0;
    }
    let missing_perc = rows_with_missing(table).len() as f64 / table.n_rows() as f64;
    log::info!(
        "{}% of rows have at least one missing value",
        round_to(missing_perc * 100.0, 1)
    );
    missing_perc
}

pub fn find_row_missing_values(table: &Table) -> Table {
    let missing = table.take(&rows_with_missing(table));
    if missing.is_empty() {
        log::debug!("No rows with missing values detected");
    }
    missing
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMissing {
    pub column: String,
    pub n_missing: usize,
    /// Percentage of rows, rounded to one decimal.
    pub perc_missing: f64,
}

impl ColumnMissing {
    pub fn to_value(&self) -> JsonValue {
        json!({
            "column": self.column,
            "n_missing": self.n_missing,
            "perc_missing": self.perc_missing,
        })
    }
}

/// Missing value count per column. Columns without missing values are left
/// out unless `show_all` is set.
pub fn summarize_col_missing_values(table: &Table, show_all: bool) -> Vec<ColumnMissing> {
    let n_values = table.n_rows();
    table
        .columns()
        .iter()
        .map(|column| (column, column.null_count()))
        .filter(|(_, n_missing)| *n_missing > 0 || show_all)
        .map(|(column, n_missing)| ColumnMissing {
            column: column.name().to_owned(),
            n_missing,
            perc_missing: if n_values == 0 {
                0.0
            } else {
                round_to(n_missing as f64 / n_values as f64 * 100.0, 1)
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::read_table;

    fn read(csv: &str) -> Table {
        read_table(csv::Reader::from_reader(csv.as_bytes())).unwrap()
    }

    #[test]
    fn no_duplicates() {
        let table = read("a,b\n1,x\n2,y\n3,x\n");
        assert!(find_duplicate_rows(&table).is_empty());
    }

    #[test]
    fn one_duplicate() {
        let table = read("a,b\n1,x\n2,y\n1,x\n3,z\n");
        let duplicates = find_duplicate_rows(&table);
        assert_eq!(duplicates.n_rows(), 1);
        assert_eq!(duplicates.index(), &[Value::Integer(2)]);
    }

    #[test]
    fn signed_zeros_are_duplicates() {
        let table = read("a,b\n0.0,x\n-0.0,x\n1.5,y\n");
        let duplicates = find_duplicate_rows(&table);
        assert_eq!(duplicates.index(), &[Value::Integer(1)]);
    }

    #[test]
    fn duplicates_with_missing_values() {
        let table = read("a,b\n1,\n1,\n1,\n");
        assert_eq!(find_duplicate_rows(&table).n_rows(), 2);
    }

    #[test]
    fn input_is_not_mutated() {
        let table = read("a,b\n1,x\n1,x\n,y\n");
        let before = table.clone();
        find_duplicate_rows(&table);
        check_index_duplicates(&table);
        count_missing_values(&table);
        find_row_missing_values(&table);
        summarize_col_missing_values(&table, true);
        assert_eq!(table, before);
    }

    #[test]
    fn index_duplicates() {
        let table = read("id,v\n1,a\n2,b\n1,c\n2,d\n3,e\n").set_index("id").unwrap();
        let duplicates = check_index_duplicates(&table);
        assert_eq!(duplicates.n_rows(), 2);
        assert_eq!(
            duplicates.column("v").unwrap().values(),
            &[Value::String("c".into()), Value::String("d".into())]
        );

        assert!(check_index_duplicates(&read("a\n1\n1\n")).is_empty());
    }

    #[test]
    fn missing_fraction() {
        let table = read("a,b,c\n1,,x\n2,3,\n4,5,y\n6,7,z\n");
        assert_eq!(count_missing_values(&table), 0.5);
        assert_eq!(find_row_missing_values(&table).index(), &[Value::Integer(0), Value::Integer(1)]);
        assert_eq!(count_missing_values(&read("a\n")), 0.0);
    }

    #[test]
    fn column_missing() {
        let table = read("a,b,c\n1,,x\n2,,\n4,5,y\n");
        let summary = summarize_col_missing_values(&table, false);
        assert_eq!(
            summary,
            vec![
                ColumnMissing {
                    column: "b".into(),
                    n_missing: 2,
                    perc_missing: 66.7
                },
                ColumnMissing {
                    column: "c".into(),
                    n_missing: 1,
                    perc_missing: 33.3
                },
            ]
        );

        let all = summarize_col_missing_values(&table, true);
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].n_missing, 0);
        assert_eq!(all[0].perc_missing, 0.0);
    }
}
