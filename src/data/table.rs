use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{
    Array, ArrayRef, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array,
    LargeStringArray, StringArray, UInt32Array, UInt64Array,
};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::model::{AnnotationRecord, File, FileId, Membership, Pair};
use super::protocol::Fold;

// ---------------------------------------------------------------------------
// TableRow – one row type of the on-disk catalog
// ---------------------------------------------------------------------------

/// A catalog table stored as `<TABLE>.csv` or `<TABLE>.parquet`.
///
/// CSV goes through serde; Parquet through the Arrow column helpers below.
pub trait TableRow: Sized + Serialize + DeserializeOwned {
    const TABLE: &'static str;
    /// Column names, in storage order.
    const COLUMNS: &'static [&'static str];

    /// Read row `row` from `columns`, ordered as [`Self::COLUMNS`].
    fn from_columns(columns: &[&ArrayRef], row: usize) -> Result<Self>;

    /// Arrow type of each column, ordered as [`Self::COLUMNS`].
    fn column_types() -> Vec<DataType>;

    /// Build one Arrow array per column from `rows`.
    fn to_columns(rows: &[Self]) -> Vec<ArrayRef>;

    fn schema() -> Arc<Schema> {
        let fields: Vec<Field> = Self::COLUMNS
            .iter()
            .zip(Self::column_types())
            .map(|(name, data_type)| Field::new(*name, data_type, false))
            .collect();
        Arc::new(Schema::new(fields))
    }

    fn to_batch(rows: &[Self]) -> Result<RecordBatch> {
        RecordBatch::try_new(Self::schema(), Self::to_columns(rows))
            .with_context(|| format!("building {} record batch", Self::TABLE))
    }
}

impl TableRow for File {
    const TABLE: &'static str = "files";
    const COLUMNS: &'static [&'static str] = &["id", "client_id", "path"];

    fn from_columns(columns: &[&ArrayRef], row: usize) -> Result<Self> {
        Ok(File {
            id: file_id_at(columns[0], row)?,
            client_id: string_at(columns[1], row)?,
            path: string_at(columns[2], row)?,
        })
    }

    fn column_types() -> Vec<DataType> {
        vec![DataType::UInt32, DataType::Utf8, DataType::Utf8]
    }

    fn to_columns(rows: &[Self]) -> Vec<ArrayRef> {
        vec![
            Arc::new(UInt32Array::from_iter_values(rows.iter().map(|r| r.id))),
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| &r.client_id))),
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| &r.path))),
        ]
    }
}

impl TableRow for Membership {
    const TABLE: &'static str = "memberships";
    const COLUMNS: &'static [&'static str] = &["fold", "client_id"];

    fn from_columns(columns: &[&ArrayRef], row: usize) -> Result<Self> {
        Ok(Membership {
            fold: fold_at(columns[0], row)?,
            client_id: string_at(columns[1], row)?,
        })
    }

    fn column_types() -> Vec<DataType> {
        vec![DataType::Utf8, DataType::Utf8]
    }

    fn to_columns(rows: &[Self]) -> Vec<ArrayRef> {
        vec![
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.fold.to_string()))),
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| &r.client_id))),
        ]
    }
}

impl TableRow for Pair {
    const TABLE: &'static str = "pairs";
    const COLUMNS: &'static [&'static str] = &["fold", "enrol_file", "probe_file", "is_match"];

    fn from_columns(columns: &[&ArrayRef], row: usize) -> Result<Self> {
        Ok(Pair {
            fold: fold_at(columns[0], row)?,
            enrol_file: file_id_at(columns[1], row)?,
            probe_file: file_id_at(columns[2], row)?,
            is_match: bool_at(columns[3], row)?,
        })
    }

    fn column_types() -> Vec<DataType> {
        vec![DataType::Utf8, DataType::UInt32, DataType::UInt32, DataType::Boolean]
    }

    fn to_columns(rows: &[Self]) -> Vec<ArrayRef> {
        vec![
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.fold.to_string()))),
            Arc::new(UInt32Array::from_iter_values(rows.iter().map(|r| r.enrol_file))),
            Arc::new(UInt32Array::from_iter_values(rows.iter().map(|r| r.probe_file))),
            Arc::new(BooleanArray::from(
                rows.iter().map(|r| r.is_match).collect::<Vec<bool>>(),
            )),
        ]
    }
}

impl TableRow for AnnotationRecord {
    const TABLE: &'static str = "annotations";
    const COLUMNS: &'static [&'static str] = &["file_id", "annotation_type", "landmark", "y", "x"];

    fn from_columns(columns: &[&ArrayRef], row: usize) -> Result<Self> {
        Ok(AnnotationRecord {
            file_id: file_id_at(columns[0], row)?,
            annotation_type: string_at(columns[1], row)?,
            landmark: string_at(columns[2], row)?,
            y: float_at(columns[3], row)?,
            x: float_at(columns[4], row)?,
        })
    }

    fn column_types() -> Vec<DataType> {
        vec![
            DataType::UInt32,
            DataType::Utf8,
            DataType::Utf8,
            DataType::Float64,
            DataType::Float64,
        ]
    }

    fn to_columns(rows: &[Self]) -> Vec<ArrayRef> {
        vec![
            Arc::new(UInt32Array::from_iter_values(rows.iter().map(|r| r.file_id))),
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| &r.annotation_type))),
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| &r.landmark))),
            Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.y))),
            Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.x))),
        ]
    }
}

// ---------------------------------------------------------------------------
// Arrow cell helpers
// ---------------------------------------------------------------------------

fn downcast<'a, T: 'static>(col: &'a ArrayRef) -> Result<&'a T> {
    col.as_any()
        .downcast_ref::<T>()
        .with_context(|| format!("unexpected array layout for {:?}", col.data_type()))
}

fn ensure_present(col: &ArrayRef, row: usize) -> Result<()> {
    if col.is_null(row) {
        bail!("null value");
    }
    Ok(())
}

/// Extract a string from a Utf8 or LargeUtf8 column.
fn string_at(col: &ArrayRef, row: usize) -> Result<String> {
    ensure_present(col, row)?;
    match col.data_type() {
        DataType::Utf8 => Ok(downcast::<StringArray>(col)?.value(row).to_string()),
        DataType::LargeUtf8 => Ok(downcast::<LargeStringArray>(col)?.value(row).to_string()),
        other => bail!("expected a string column, got {other:?}"),
    }
}

/// Extract an integer from any signed or unsigned 32/64-bit column.
fn int_at(col: &ArrayRef, row: usize) -> Result<i64> {
    ensure_present(col, row)?;
    match col.data_type() {
        DataType::Int32 => Ok(i64::from(downcast::<Int32Array>(col)?.value(row))),
        DataType::Int64 => Ok(downcast::<Int64Array>(col)?.value(row)),
        DataType::UInt32 => Ok(i64::from(downcast::<UInt32Array>(col)?.value(row))),
        DataType::UInt64 => {
            let value = downcast::<UInt64Array>(col)?.value(row);
            i64::try_from(value).with_context(|| format!("{value} does not fit an i64"))
        }
        other => bail!("expected an integer column, got {other:?}"),
    }
}

fn file_id_at(col: &ArrayRef, row: usize) -> Result<FileId> {
    let value = int_at(col, row)?;
    FileId::try_from(value).with_context(|| format!("{value} is not a valid file id"))
}

fn float_at(col: &ArrayRef, row: usize) -> Result<f64> {
    ensure_present(col, row)?;
    match col.data_type() {
        DataType::Float32 => Ok(f64::from(downcast::<Float32Array>(col)?.value(row))),
        DataType::Float64 => Ok(downcast::<Float64Array>(col)?.value(row)),
        _ => int_at(col, row).map(|v| v as f64),
    }
}

fn bool_at(col: &ArrayRef, row: usize) -> Result<bool> {
    ensure_present(col, row)?;
    match col.data_type() {
        DataType::Boolean => Ok(downcast::<BooleanArray>(col)?.value(row)),
        _ => int_at(col, row).map(|v| v != 0),
    }
}

fn fold_at(col: &ArrayRef, row: usize) -> Result<Fold> {
    let name = string_at(col, row)?;
    name.parse::<Fold>().context("parsing fold name")
}
