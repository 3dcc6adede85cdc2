use crate::table::{DataType, Value};

/// Cells read as missing values.
const NA_VALUES: [&str; 19] = [
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

const BOOLEAN_VALUES: [(&str, bool); 6] = [
    ("True", true),
    ("TRUE", true),
    ("true", true),
    ("False", false),
    ("FALSE", false),
    ("false", false),
];

pub fn is_na(string: &str) -> bool {
    NA_VALUES.contains(&string)
}

fn descriptions() -> Vec<DataType> {
    vec![DataType::Boolean, DataType::Integer, DataType::Float]
}

/// Narrows down the type of a CSV column one cell at a time.
#[derive(Debug)]
pub struct Describer {
    count: usize,
    empty_count: usize,
    descriptions: Vec<DataType>,
}

impl Default for Describer {
    fn default() -> Self {
        Describer::new()
    }
}

impl Describer {
    pub fn new() -> Describer {
        Describer {
            count: 0,
            empty_count: 0,
            descriptions: descriptions(),
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn empty_count(&self) -> usize {
        self.empty_count
    }

    pub fn guess_type(&self) -> DataType {
        // nothing but missing values
        if self.count == self.empty_count {
            return DataType::Float;
        }

        for data_type in [DataType::Boolean, DataType::Integer, DataType::Float] {
            if self.descriptions.contains(&data_type) {
                return data_type;
            }
        }

        DataType::String
    }

    pub fn process(&mut self, string: &str) {
        self.count += 1;

        if is_na(string) {
            self.empty_count += 1;
            return;
        }

        self.descriptions.retain(|data_type| match data_type {
            DataType::Boolean => check_boolean(string),
            DataType::Integer => check_integer(string),
            DataType::Float => check_number(string),
            _ => false,
        });
    }
}

fn check_boolean(string: &str) -> bool {
    parse_boolean(string).is_some()
}

fn check_integer(string: &str) -> bool {
    string.parse::<i64>().is_ok()
}

fn check_number(string: &str) -> bool {
    string.parse::<f64>().is_ok()
}

fn parse_boolean(string: &str) -> Option<bool> {
    BOOLEAN_VALUES
        .iter()
        .find(|(text, _)| *text == string)
        .map(|(_, value)| *value)
}

/// Converts a raw cell to a value of `data_type`, `Null` for missing markers.
pub fn parse_cell(string: &str, data_type: DataType) -> Value {
    if is_na(string) {
        return Value::Null;
    }

    match data_type {
        DataType::Boolean => parse_boolean(string).map(Value::Boolean).unwrap_or(Value::Null),
        DataType::Integer => string.parse().map(Value::Integer).unwrap_or(Value::Null),
        DataType::Float => string.parse().map(Value::Float).unwrap_or(Value::Null),
        _ => Value::String(string.to_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guess_bool() {
        let mut describer = Describer::new();
        describer.process("True");
        assert_eq!(describer.guess_type(), DataType::Boolean);
        describer.process("false");
        assert_eq!(describer.guess_type(), DataType::Boolean);
        describer.process("yes");
        assert_eq!(describer.guess_type(), DataType::String);
    }

    #[test]
    fn guess_int() {
        let mut describer = Describer::new();
        describer.process("1");
        assert_eq!(describer.guess_type(), DataType::Integer);
        describer.process("12132323");
        assert_eq!(describer.guess_type(), DataType::Integer);
        describer.process("1.2");
        assert_eq!(describer.guess_type(), DataType::Float);
        describer.process("1.2.1");
        assert_eq!(describer.guess_type(), DataType::String);
    }

    #[test]
    fn guess_number() {
        let mut describer = Describer::new();
        describer.process("1.2");
        describer.process("0.32131322");
        describer.process("1.3232e4");
        assert_eq!(describer.guess_type(), DataType::Float);
        describer.process("1.3232a4");
        assert_eq!(describer.guess_type(), DataType::String);
    }

    #[test]
    fn missing_markers_are_skipped() {
        let mut describer = Describer::new();
        describer.process("");
        describer.process("NA");
        describer.process("nan");
        describer.process("3");
        assert_eq!(describer.guess_type(), DataType::Integer);
        assert_eq!(describer.empty_count(), 3);
        assert_eq!(describer.count(), 4);
    }

    #[test]
    fn all_missing_is_number() {
        let mut describer = Describer::new();
        describer.process("");
        describer.process("");
        assert_eq!(describer.guess_type(), DataType::Float);
    }

    #[test]
    fn parse() {
        assert_eq!(parse_cell("NULL", DataType::String), Value::Null);
        assert_eq!(parse_cell("7", DataType::Float), Value::Float(7.0));
        assert_eq!(parse_cell("7", DataType::Integer), Value::Integer(7));
        assert_eq!(parse_cell("TRUE", DataType::Boolean), Value::Boolean(true));
        assert_eq!(parse_cell("north", DataType::String), Value::String("north".into()));
    }
}
