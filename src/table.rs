use chrono::NaiveDateTime;
use serde_json::{json, Map, Value as JsonValue};
use snafu::prelude::*;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::{ColumnLengthSnafu, ColumnNotFoundSnafu, Error, IndexLengthSnafu};

pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DataType {
    String,
    Integer,
    Float,
    Boolean,
    Datetime,
    Categorical,
}

impl DataType {
    pub fn name(&self) -> &'static str {
        match self {
            DataType::String => "string",
            DataType::Integer => "integer",
            DataType::Float => "number",
            DataType::Boolean => "boolean",
            DataType::Datetime => "datetime",
            DataType::Categorical => "categorical",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, DataType::Integer | DataType::Float)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single cell.
///
/// Floats compare and hash by their bit pattern, with both zeros equal, so
/// that rows can be used as set keys when looking for duplicates.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Datetime(NaiveDateTime),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(string) => Some(string),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(integer) => Some(*integer as f64),
            Value::Float(float) => Some(*float),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Value::Datetime(datetime) => Some(*datetime),
            _ => None,
        }
    }

    pub fn to_json(&self) -> JsonValue {
        match self {
            Value::Null => JsonValue::Null,
            Value::String(string) => json!(string),
            Value::Integer(integer) => json!(integer),
            Value::Float(float) => json!(float),
            Value::Boolean(boolean) => json!(boolean),
            Value::Datetime(datetime) => json!(datetime.format(DATETIME_FORMAT).to_string()),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => float_bits(*a) == float_bits(*b),
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Datetime(a), Value::Datetime(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::String(string) => string.hash(state),
            Value::Integer(integer) => integer.hash(state),
            Value::Float(float) => float_bits(*float).hash(state),
            Value::Boolean(boolean) => boolean.hash(state),
            Value::Datetime(datetime) => datetime.hash(state),
        }
    }
}

/// Bit pattern used for float equality, with `-0.0` folded into `0.0`.
fn float_bits(float: f64) -> u64 {
    if float == 0.0 {
        0f64.to_bits()
    } else {
        float.to_bits()
    }
}

fn format_float(float: f64) -> String {
    if float.is_finite() && float.fract() == 0.0 && float.abs() < 1e16 {
        format!("{float:.1}")
    } else {
        float.to_string()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NaN"),
            Value::String(string) => f.write_str(string),
            Value::Integer(integer) => write!(f, "{integer}"),
            Value::Float(float) => f.write_str(&format_float(*float)),
            Value::Boolean(true) => f.write_str("True"),
            Value::Boolean(false) => f.write_str("False"),
            Value::Datetime(datetime) => write!(f, "{}", datetime.format(DATETIME_FORMAT)),
        }
    }
}

/// A named column. Every value is either `Null` or of the column's type;
/// categorical labels are stored as strings.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    dtype: DataType,
    values: Vec<Value>,
}

impl Column {
    pub fn new(name: impl Into<String>, dtype: DataType, values: Vec<Value>) -> Column {
        Column {
            name: name.into(),
            dtype,
            values,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dtype(&self) -> DataType {
        self.dtype
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn null_count(&self) -> usize {
        self.values.iter().filter(|value| value.is_null()).count()
    }

    pub fn take(&self, rows: &[usize]) -> Column {
        Column {
            name: self.name.clone(),
            dtype: self.dtype,
            values: rows.iter().map(|row| self.values[*row].clone()).collect(),
        }
    }
}

/// Named, typed columns sharing one row count, plus a row index.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<Column>,
    index: Vec<Value>,
}

fn positional_index(n_rows: usize) -> Vec<Value> {
    (0..n_rows as i64).map(Value::Integer).collect()
}

impl Table {
    /// Builds a table with a positional index `0..n`.
    pub fn new(columns: Vec<Column>) -> Result<Table, Error> {
        let n_rows = columns.first().map(Column::len).unwrap_or_default();
        for column in &columns {
            ensure!(
                column.len() == n_rows,
                ColumnLengthSnafu {
                    column: column.name(),
                    expected: n_rows,
                    found: column.len()
                }
            );
        }
        Ok(Table {
            columns,
            index: positional_index(n_rows),
        })
    }

    /// Caller guarantees every column and the index have the same length.
    pub(crate) fn from_parts(columns: Vec<Column>, index: Vec<Value>) -> Table {
        debug_assert!(columns.iter().all(|column| column.len() == index.len()));
        Table { columns, index }
    }

    pub fn with_index(mut self, index: Vec<Value>) -> Result<Table, Error> {
        ensure!(
            index.len() == self.n_rows(),
            IndexLengthSnafu {
                expected: self.n_rows(),
                found: index.len()
            }
        );
        self.index = index;
        Ok(self)
    }

    /// Same index, new columns of the same length.
    pub(crate) fn with_columns(&self, columns: Vec<Column>) -> Table {
        Table::from_parts(columns, self.index.clone())
    }

    /// Moves `name` out of the columns and into the index.
    pub fn set_index(&self, name: &str) -> Result<Table, Error> {
        let position = self
            .columns
            .iter()
            .position(|column| column.name() == name)
            .context(ColumnNotFoundSnafu { column: name })?;
        let mut columns = self.columns.clone();
        let index_column = columns.remove(position);
        Ok(Table::from_parts(columns, index_column.values))
    }

    pub fn n_rows(&self) -> usize {
        self.index.len()
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.n_rows() == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name() == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    pub fn index(&self) -> &[Value] {
        &self.index
    }

    pub fn row(&self, row: usize) -> Vec<&Value> {
        self.columns.iter().map(|column| &column.values[row]).collect()
    }

    pub fn take(&self, rows: &[usize]) -> Table {
        Table {
            columns: self.columns.iter().map(|column| column.take(rows)).collect(),
            index: rows.iter().map(|row| self.index[*row].clone()).collect(),
        }
    }

    pub fn head(&self, n: usize) -> Table {
        let rows: Vec<usize> = (0..n.min(self.n_rows())).collect();
        self.take(&rows)
    }

    /// One JSON object per row, keyed by column name.
    pub fn to_records(&self) -> JsonValue {
        let records: Vec<JsonValue> = (0..self.n_rows())
            .map(|row| {
                let mut record = Map::new();
                for column in &self.columns {
                    record.insert(column.name().to_owned(), column.values[row].to_json());
                }
                JsonValue::Object(record)
            })
            .collect();
        JsonValue::Array(records)
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let index: Vec<String> = self.index.iter().map(Value::to_string).collect();
        let index_width = index.iter().map(|label| label.chars().count()).max().unwrap_or(0);

        let mut cells = vec![];
        let mut widths = vec![];
        for column in &self.columns {
            let rendered: Vec<String> = column.values.iter().map(Value::to_string).collect();
            let width = rendered
                .iter()
                .map(|cell| cell.chars().count())
                .chain(std::iter::once(column.name().chars().count()))
                .max()
                .unwrap_or(0);
            cells.push(rendered);
            widths.push(width);
        }

        write!(f, "{:index_width$}", "")?;
        for (column, width) in self.columns.iter().zip(&widths) {
            write!(f, "  {:>width$}", column.name())?;
        }
        for (row, label) in index.iter().enumerate() {
            writeln!(f)?;
            write!(f, "{label:<index_width$}")?;
            for (rendered, width) in cells.iter().zip(&widths) {
                write!(f, "  {:>width$}", rendered[row])?;
            }
        }
        Ok(())
    }
}

/// Tables keyed by source name, iterated in name order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TableCollection {
    tables: BTreeMap<String, Table>,
}

impl TableCollection {
    pub fn new() -> TableCollection {
        TableCollection::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, table: Table) -> Option<Table> {
        self.tables.insert(name.into(), table)
    }

    pub fn get(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tables.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Table)> {
        self.tables.iter().map(|(name, table)| (name.as_str(), table))
    }
}

impl<S: Into<String>> FromIterator<(S, Table)> for TableCollection {
    fn from_iter<I: IntoIterator<Item = (S, Table)>>(iter: I) -> Self {
        TableCollection {
            tables: iter.into_iter().map(|(name, table)| (name.into(), table)).collect(),
        }
    }
}
