//! Parquet reading and writing through Arrow record batches.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, Float64Array, StringArray, TimestampMicrosecondArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::error::ArrowError;
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::file::properties::WriterProperties;

use super::{RawColumn, RawData};
use crate::error::FileError;
use crate::table::time::{epoch_micros, from_epoch_micros};
use crate::table::{ColumnData, Table};

const TIMESTAMP_TYPE: DataType = DataType::Timestamp(TimeUnit::Microsecond, None);

/// How an Arrow column maps onto table storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Timestamp,
    Numeric,
    Text,
}

impl Kind {
    fn of(data_type: &DataType) -> Self {
        match data_type {
            DataType::Timestamp(_, _) | DataType::Date32 | DataType::Date64 => Self::Timestamp,
            dt if dt.is_numeric() => Self::Numeric,
            _ => Self::Text,
        }
    }

    fn empty(self) -> RawData {
        match self {
            Self::Timestamp => RawData::Timestamps(Vec::new()),
            Self::Numeric => RawData::Cells(ColumnData::Numeric(Vec::new())),
            Self::Text => RawData::Cells(ColumnData::Text(Vec::new())),
        }
    }
}

/// Reads every column of a Parquet file.
///
/// Timestamp and date columns keep their type; other numeric columns are
/// widened to `f64`; everything else is read as text.
///
/// # Errors
///
/// Returns [`FileError::Io`], [`FileError::Parquet`] or [`FileError::Arrow`]
/// if the file cannot be opened, decoded, or converted.
pub fn read_path(path: &Path) -> Result<Vec<RawColumn>, FileError> {
    let parquet_err = |source| FileError::Parquet {
        path: path.to_path_buf(),
        source,
    };
    let arrow_err = |source| FileError::Arrow {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(|source| FileError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file).map_err(parquet_err)?;
    let schema = builder.schema().clone();
    let reader = builder.build().map_err(parquet_err)?;

    let kinds: Vec<Kind> = schema.fields().iter().map(|f| Kind::of(f.data_type())).collect();
    let mut columns: Vec<RawColumn> = schema
        .fields()
        .iter()
        .zip(&kinds)
        .map(|(f, kind)| RawColumn {
            name: f.name().clone(),
            data: kind.empty(),
        })
        .collect();

    for batch in reader {
        let batch = batch.map_err(arrow_err)?;
        for (column, array) in columns.iter_mut().zip(batch.columns()) {
            append(&mut column.data, array).map_err(arrow_err)?;
        }
    }
    Ok(columns)
}

fn append(target: &mut RawData, array: &ArrayRef) -> Result<(), ArrowError> {
    match target {
        RawData::Timestamps(values) => {
            let converted = cast(array, &TIMESTAMP_TYPE)?;
            let arr = downcast::<TimestampMicrosecondArray>(&converted)?;
            values.extend(arr.iter().map(|v| v.and_then(from_epoch_micros)));
        }
        RawData::Cells(ColumnData::Numeric(values)) => {
            let converted = cast(array, &DataType::Float64)?;
            let arr = downcast::<Float64Array>(&converted)?;
            values.extend(arr.iter().map(|v| v.filter(|x| x.is_finite())));
        }
        RawData::Cells(ColumnData::Text(values)) => {
            let converted = cast(array, &DataType::Utf8)?;
            let arr = downcast::<StringArray>(&converted)?;
            values.extend(arr.iter().map(|v| v.map(str::to_string)));
        }
    }
    Ok(())
}

fn downcast<T: 'static>(array: &ArrayRef) -> Result<&T, ArrowError> {
    array.as_any().downcast_ref::<T>().ok_or_else(|| {
        ArrowError::CastError(format!("unexpected array type {}", array.data_type()))
    })
}

/// Writes `table` to a Parquet file.
///
/// The index becomes a microsecond `Timestamp` column, numeric fields are
/// nullable `Float64`, text fields nullable `Utf8`.
///
/// # Errors
///
/// Returns [`FileError::Io`], [`FileError::Arrow`] or [`FileError::Parquet`]
/// if the batch cannot be built or written.
pub fn write_path(table: &Table, path: &Path, write_index: bool) -> Result<(), FileError> {
    let batch = to_record_batch(table, write_index).map_err(|source| FileError::Arrow {
        path: path.to_path_buf(),
        source,
    })?;
    let parquet_err = |source| FileError::Parquet {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(|source| FileError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let props = WriterProperties::builder().build();
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props)).map_err(parquet_err)?;
    writer.write(&batch).map_err(parquet_err)?;
    writer.close().map_err(parquet_err)?;
    Ok(())
}

/// Converts a table into one Arrow record batch.
///
/// # Errors
///
/// Returns an `ArrowError` if the columns cannot form a batch.
pub fn to_record_batch(table: &Table, write_index: bool) -> Result<RecordBatch, ArrowError> {
    let mut fields = Vec::with_capacity(table.columns().len() + 1);
    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(table.columns().len() + 1);

    if let Some(idx) = table.time_index().filter(|_| write_index) {
        fields.push(Field::new(&idx.name, TIMESTAMP_TYPE, true));
        let micros: Vec<Option<i64>> = idx.values.iter().map(|v| v.as_ref().map(epoch_micros)).collect();
        arrays.push(Arc::new(TimestampMicrosecondArray::from(micros)));
    }

    for column in table.columns() {
        match &column.data {
            ColumnData::Numeric(values) => {
                fields.push(Field::new(&column.name, DataType::Float64, true));
                arrays.push(Arc::new(Float64Array::from(values.clone())));
            }
            ColumnData::Text(values) => {
                fields.push(Field::new(&column.name, DataType::Utf8, true));
                let cells: Vec<Option<&str>> = values.iter().map(Option::as_deref).collect();
                arrays.push(Arc::new(StringArray::from(cells)));
            }
        }
    }

    let options = RecordBatchOptions::new().with_row_count(Some(table.len()));
    RecordBatch::try_new_with_options(Arc::new(Schema::new(fields)), arrays, &options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{TimeIndex, parse_timestamp};

    fn sample() -> Table {
        Table::new()
            .with_index(TimeIndex::new(
                "timestamp",
                vec![parse_timestamp("2023-01-01 12:00:00"), parse_timestamp("2023-01-01 13:00:00")],
            ))
            .unwrap()
            .with_column("consumption", ColumnData::numeric([Some(10.75), Some(12.75)]))
            .unwrap()
            .with_column("site", ColumnData::text([Some("north"), None]))
            .unwrap()
    }

    #[test]
    fn record_batch_has_expected_schema() {
        let batch = to_record_batch(&sample(), true).unwrap();
        let types: Vec<DataType> = batch
            .schema()
            .fields()
            .iter()
            .map(|f| f.data_type().clone())
            .collect();
        assert_eq!(types, vec![TIMESTAMP_TYPE, DataType::Float64, DataType::Utf8]);
        assert_eq!(batch.num_rows(), 2);
    }

    #[test]
    fn index_can_be_skipped() {
        let batch = to_record_batch(&sample(), false).unwrap();
        assert_eq!(batch.num_columns(), 2);
    }

    #[test]
    fn kinds_follow_arrow_types() {
        assert_eq!(Kind::of(&DataType::Int64), Kind::Numeric);
        assert_eq!(Kind::of(&DataType::Float32), Kind::Numeric);
        assert_eq!(Kind::of(&DataType::Date32), Kind::Timestamp);
        assert_eq!(
            Kind::of(&DataType::Timestamp(TimeUnit::Nanosecond, None)),
            Kind::Timestamp
        );
        assert_eq!(Kind::of(&DataType::Boolean), Kind::Text);
    }

    #[test]
    fn append_widens_integers() {
        let mut target = Kind::Numeric.empty();
        let ints: ArrayRef = Arc::new(arrow::array::Int32Array::from(vec![Some(1), None, Some(3)]));
        assert!(append(&mut target, &ints).is_ok());
        assert_eq!(
            target,
            RawData::Cells(ColumnData::Numeric(vec![Some(1.0), None, Some(3.0)]))
        );
    }
}
