use crate::table::{Column, TableCollection};
use serde_json::{json, Map, Value as JsonValue};

/// One row per source table, one slot (`col_0`, `col_1`, ...) per column
/// position, holding either the column's name or its type.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaDescriptor {
    sources: Vec<String>,
    slots: Vec<String>,
    cells: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SlotMismatch {
    pub slot: String,
    /// Distinct values found in the slot, in source order.
    pub values: Vec<String>,
}

impl SchemaDescriptor {
    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    pub fn slots(&self) -> &[String] {
        &self.slots
    }

    pub fn get(&self, source: &str, slot: usize) -> Option<&str> {
        let row = self.sources.iter().position(|name| name == source)?;
        self.cells[row].get(slot).map(String::as_str)
    }

    pub fn mismatches(&self) -> Vec<SlotMismatch> {
        let mut mismatches = vec![];
        for (num, slot) in self.slots.iter().enumerate() {
            let Some(first) = self.cells.first().map(|row| &row[num]) else {
                break;
            };
            if self.cells.iter().all(|row| &row[num] == first) {
                continue;
            }
            let mut values: Vec<String> = vec![];
            for row in &self.cells {
                if !values.contains(&row[num]) {
                    values.push(row[num].clone());
                }
            }
            mismatches.push(SlotMismatch {
                slot: slot.clone(),
                values,
            });
        }
        mismatches
    }

    pub fn to_value(&self) -> JsonValue {
        let mut output = Map::new();
        for (source, row) in self.sources.iter().zip(&self.cells) {
            let mut slots = Map::new();
            for (slot, cell) in self.slots.iter().zip(row) {
                slots.insert(slot.clone(), json!(cell));
            }
            output.insert(source.clone(), JsonValue::Object(slots));
        }
        JsonValue::Object(output)
    }
}

fn uniform_width(collection: &TableCollection) -> Option<usize> {
    let mut widths = collection.iter().map(|(_, table)| table.n_cols());
    let first = widths.next()?;
    widths.all(|width| width == first).then_some(first)
}

fn describe_schema(collection: &TableCollection, cell: impl Fn(&Column) -> String) -> Option<SchemaDescriptor> {
    if collection.is_empty() {
        log::warn!("No tables to compare");
        return None;
    }
    let Some(width) = uniform_width(collection) else {
        log::warn!("Tables do not have the same number of columns");
        return None;
    };

    let mut sources = vec![];
    let mut cells = vec![];
    for (name, table) in collection.iter() {
        sources.push(name.to_owned());
        cells.push(table.columns().iter().map(&cell).collect());
    }

    Some(SchemaDescriptor {
        sources,
        slots: (0..width).map(|num| format!("col_{num}")).collect(),
        cells,
    })
}

/// Column names by position, or `None` when the tables differ in width.
pub fn column_names(collection: &TableCollection) -> Option<SchemaDescriptor> {
    describe_schema(collection, |column| column.name().to_owned())
}

/// Column types by position, or `None` when the tables differ in width.
pub fn column_types(collection: &TableCollection) -> Option<SchemaDescriptor> {
    describe_schema(collection, |column| column.dtype().to_string())
}

/// Returns whether some slot holds different names across tables.
pub fn check_names(descriptor: &SchemaDescriptor) -> bool {
    let mismatches = descriptor.mismatches();
    for mismatch in &mismatches {
        log::warn!("{} has some mismatching column names: {}", mismatch.slot, mismatch.values.join(" "));
    }
    if mismatches.is_empty() {
        log::info!("All column names are matching");
    }
    !mismatches.is_empty()
}

/// Returns whether some slot holds different types across tables.
pub fn check_types(descriptor: &SchemaDescriptor) -> bool {
    let mismatches = descriptor.mismatches();
    for mismatch in &mismatches {
        log::warn!("{} has these data types: {}", mismatch.slot, mismatch.values.join(" "));
    }
    if mismatches.is_empty() {
        log::info!("All column data types are matching");
    }
    !mismatches.is_empty()
}
