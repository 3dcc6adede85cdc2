use crate::table::{Column, DataType, Table, TableCollection, Value};
use crate::{EmptyCollectionSnafu, Error};
use snafu::prelude::*;
use std::collections::HashMap;

fn reconcile(base: DataType, other: DataType) -> DataType {
    match (base, other) {
        (base, other) if base == other => base,
        (DataType::Integer, DataType::Float) | (DataType::Float, DataType::Integer) => DataType::Float,
        _ => DataType::String,
    }
}

fn cast(value: &Value, dtype: DataType) -> Value {
    match (value, dtype) {
        (Value::Null, _) => Value::Null,
        (Value::Integer(integer), DataType::Float) => Value::Float(*integer as f64),
        (Value::String(_), DataType::String) => value.clone(),
        (value, DataType::String) => Value::String(value.to_string()),
        (value, _) => value.clone(),
    }
}

/// Stacks every table of the collection, in collection order.
///
/// The output has the union of all columns in first-seen order and tables
/// missing a column contribute nulls. Each table keeps its own index labels,
/// unless `index_column` is given, which then becomes the index.
pub fn concatenate(collection: &TableCollection, index_column: Option<&str>) -> Result<Table, Error> {
    ensure!(!collection.is_empty(), EmptyCollectionSnafu);

    let mut names: Vec<&str> = vec![];
    let mut dtypes: HashMap<&str, DataType> = HashMap::new();

    for (_, table) in collection.iter() {
        for column in table.columns() {
            match dtypes.get_mut(column.name()) {
                Some(dtype) => *dtype = reconcile(*dtype, column.dtype()),
                None => {
                    names.push(column.name());
                    dtypes.insert(column.name(), column.dtype());
                }
            }
        }
    }

    let n_rows: usize = collection.iter().map(|(_, table)| table.n_rows()).sum();
    let mut values: Vec<Vec<Value>> = names.iter().map(|_| Vec::with_capacity(n_rows)).collect();
    let mut index = Vec::with_capacity(n_rows);

    for (source, table) in collection.iter() {
        log::debug!("stacking {} rows from {source}", table.n_rows());
        for (name, output) in names.iter().zip(values.iter_mut()) {
            match table.column(name) {
                Some(column) => {
                    let dtype = dtypes[name];
                    output.extend(column.values().iter().map(|value| cast(value, dtype)));
                }
                None => output.extend(std::iter::repeat(Value::Null).take(table.n_rows())),
            }
        }
        index.extend_from_slice(table.index());
    }

    let columns = names
        .iter()
        .zip(values)
        .map(|(name, values)| Column::new(*name, dtypes[name], values))
        .collect();

    let table = Table::from_parts(columns, index);

    match index_column {
        Some(name) => table.set_index(name),
        None => Ok(table),
    }
}
