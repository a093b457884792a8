//! CSV reading and writing.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

use super::{RawColumn, RawData};
use crate::error::FileError;
use crate::table::{ColumnData, Table, format_timestamp, parse_number};

/// Reads a CSV file with a header row.
///
/// # Errors
///
/// Returns [`FileError::Io`] if the file cannot be opened and
/// [`FileError::Csv`] for malformed content such as ragged rows.
pub fn read_path(path: &Path) -> Result<Vec<RawColumn>, FileError> {
    let file = File::open(path).map_err(|source| FileError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_csv(io::BufReader::new(file)).map_err(|source| FileError::Csv {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads CSV from any reader.
///
/// Header names are kept verbatim. Empty cells are missing. A column is
/// numeric when every non-empty cell parses as a float; otherwise it is text.
///
/// # Errors
///
/// Returns a `csv::Error` for unreadable or ragged input.
pub fn read_csv(reader: impl Read) -> Result<Vec<RawColumn>, csv::Error> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(reader);

    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    let mut cells: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];

    for record in rdr.records() {
        let record = record?;
        for (i, column) in cells.iter_mut().enumerate() {
            let cell = record.get(i).map(str::trim).filter(|s| !s.is_empty());
            column.push(cell.map(str::to_string));
        }
    }

    Ok(headers
        .into_iter()
        .zip(cells)
        .map(|(name, cells)| RawColumn {
            name,
            data: RawData::Cells(infer_column(cells)),
        })
        .collect())
}

fn infer_column(cells: Vec<Option<String>>) -> ColumnData {
    let numeric = cells
        .iter()
        .flatten()
        .all(|c| c.parse::<f64>().is_ok());
    if numeric {
        ColumnData::Numeric(
            cells
                .iter()
                .map(|c| c.as_deref().and_then(parse_number))
                .collect(),
        )
    } else {
        ColumnData::Text(cells)
    }
}

/// Writes `table` as CSV to `path`.
///
/// # Errors
///
/// Returns [`FileError::Io`] if the file cannot be created and
/// [`FileError::Csv`] if writing fails.
pub fn write_path(table: &Table, path: &Path, write_index: bool) -> Result<(), FileError> {
    let file = File::create(path).map_err(|source| FileError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    write_csv(table, io::BufWriter::new(file), write_index).map_err(|source| FileError::Csv {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes `table` as CSV to any writer.
///
/// The index (when written) comes first. Timestamps use
/// [`crate::table::time::TIMESTAMP_FORMAT`]; floats use their shortest
/// round-trip form; missing cells are empty.
///
/// # Errors
///
/// Returns a `csv::Error` if writing fails.
pub fn write_csv(table: &Table, writer: impl Write, write_index: bool) -> Result<(), csv::Error> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    let index = table.time_index().filter(|_| write_index);

    let mut header: Vec<&str> = Vec::with_capacity(table.columns().len() + 1);
    if let Some(idx) = index {
        header.push(&idx.name);
    }
    header.extend(table.field_names());
    wtr.write_record(&header)?;

    let mut row: Vec<String> = Vec::with_capacity(header.len());
    for r in 0..table.len() {
        row.clear();
        if let Some(idx) = index {
            row.push(
                idx.values
                    .get(r)
                    .copied()
                    .flatten()
                    .map(|ts| format_timestamp(&ts))
                    .unwrap_or_default(),
            );
        }
        for column in table.columns() {
            let cell = match &column.data {
                ColumnData::Numeric(v) => v
                    .get(r)
                    .copied()
                    .flatten()
                    .map(|x| x.to_string())
                    .unwrap_or_default(),
                ColumnData::Text(v) => v.get(r).cloned().flatten().unwrap_or_default(),
            };
            row.push(cell);
        }
        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    Ok(())
}
