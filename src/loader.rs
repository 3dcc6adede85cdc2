use crate::describer::{parse_cell, Describer};
use crate::table::{Column, Table, TableCollection};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;
use typed_builder::TypedBuilder;
use walkdir::WalkDir;

const TABULAR_EXTENSIONS: [&str; 1] = ["csv"];

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Directory {0} does not exist")]
    DirNotExist(String),
    #[error("File {0} does not exist")]
    FileNotExist(String),
    #[error("Error reading file {filename}: {source}")]
    Io {
        source: std::io::Error,
        filename: String,
    },
    #[error("Error reading CSV file {filename}: {source}")]
    CSVRead { source: csv::Error, filename: String },
    #[error("Error listing directory")]
    Walk(#[from] walkdir::Error),
}

/// What to do with a file that cannot be read while loading a directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorPolicy {
    #[default]
    Abort,
    Skip,
}

#[derive(Default, Debug, Clone, TypedBuilder)]
pub struct Options {
    /// Defaults to `,`, or to the sniffed delimiter when `sniff` is set.
    #[builder(default)]
    pub delimiter: Option<u8>,
    #[builder(default)]
    pub quote: Option<u8>,
    /// Guess the delimiter from the header line when none is given.
    #[builder(default)]
    pub sniff: bool,
    #[builder(default)]
    pub on_error: ErrorPolicy,
}

/// First of `, \t | ;` in the header line, `,` when there is none.
fn simple_sniff(file: &Path) -> Result<u8, std::io::Error> {
    let file = File::open(file)?;
    let mut reader = BufReader::new(file);

    let mut header = String::new();
    reader.read_line(&mut header)?;

    let found = header
        .bytes()
        .find(|char| [b',', b'\t', b'|', b';'].contains(char))
        .unwrap_or(b',');
    Ok(found)
}

pub fn get_csv_reader(file: &Path, options: &Options) -> Result<csv::Reader<File>, std::io::Error> {
    let delimiter = match options.delimiter {
        Some(delimiter) => delimiter,
        None if options.sniff => simple_sniff(file)?,
        None => b',',
    };
    let quote = options.quote.unwrap_or(b'"');

    let mut reader_builder = csv::ReaderBuilder::new();

    reader_builder.delimiter(delimiter).quote(quote);

    Ok(reader_builder.from_reader(File::open(file)?))
}

/// Repeated header names get a `.1`, `.2`, ... suffix.
fn dedupe_headers(headers: &csv::StringRecord) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut output = Vec::with_capacity(headers.len());
    for header in headers {
        let mut name = header.to_owned();
        let mut suffix = 1;
        while seen.contains(&name) {
            name = format!("{header}.{suffix}");
            suffix += 1;
        }
        seen.insert(name.clone());
        output.push(name);
    }
    output
}

/// Reads a whole CSV source into a table, using the first row as header.
pub fn read_table<R: Read>(mut reader: csv::Reader<R>) -> Result<Table, csv::Error> {
    let headers = dedupe_headers(reader.headers()?);

    let mut describers: Vec<Describer> = headers.iter().map(|_| Describer::new()).collect();
    let mut cells: Vec<Vec<String>> = vec![vec![]; headers.len()];

    let mut row_count: usize = 0;

    for row in reader.records() {
        let record = row?;
        for (index, cell) in record.iter().enumerate() {
            describers[index].process(cell);
            cells[index].push(cell.to_owned());
        }
        row_count += 1;
    }

    let mut columns = Vec::with_capacity(headers.len());
    for ((name, describer), cells) in headers.into_iter().zip(describers).zip(cells) {
        let dtype = describer.guess_type();
        log::debug!("column {name} read as {dtype}");
        let values = cells.iter().map(|cell| parse_cell(cell, dtype)).collect();
        columns.push(Column::new(name, dtype, values));
    }

    let index = (0..row_count as i64).map(crate::table::Value::Integer).collect();
    Ok(Table::from_parts(columns, index))
}

pub fn load_file(file: impl AsRef<Path>, options: &Options) -> Result<Table, LoadError> {
    let file = file.as_ref();
    let filename: String = file.to_string_lossy().into();

    if !file.is_file() {
        return Err(LoadError::FileNotExist(filename));
    }

    let reader = get_csv_reader(file, options).map_err(|source| LoadError::Io {
        source,
        filename: filename.clone(),
    })?;

    read_table(reader).map_err(|source| LoadError::CSVRead { source, filename })
}

fn is_tabular(path: &Path) -> bool {
    path.extension()
        .map(|extension| extension.to_string_lossy().to_lowercase())
        .is_some_and(|extension| TABULAR_EXTENSIONS.contains(&extension.as_str()))
}

fn tabular_files(dir: &Path) -> Result<Vec<PathBuf>, LoadError> {
    let mut files = vec![];
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = entry?;
        if entry.file_type().is_file() && is_tabular(entry.path()) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Loads every CSV file directly inside `dir`, keyed by file name.
pub fn load_dir(dir: impl AsRef<Path>, options: &Options) -> Result<TableCollection, LoadError> {
    let dir = dir.as_ref();

    if !dir.is_dir() {
        return Err(LoadError::DirNotExist(dir.to_string_lossy().into()));
    }

    let mut collection = TableCollection::new();

    for file in tabular_files(dir)? {
        let name: String = file
            .file_name()
            .map(|name| name.to_string_lossy().into())
            .unwrap_or_default();

        match load_file(&file, options) {
            Ok(table) => {
                log::info!("Imported {name}");
                collection.insert(name, table);
            }
            Err(error) if options.on_error == ErrorPolicy::Skip => {
                log::warn!("Skipping {name}: {error}");
            }
            Err(error) => return Err(error),
        }
    }

    log::info!("[ Imported {} files ]", collection.len());
    Ok(collection)
}
