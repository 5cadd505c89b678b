use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use arrow::array::ArrayRef;
use log::{debug, info};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use super::model::{AnnotationRecord, Catalog, File, Membership, Pair};
use super::table::TableRow;

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a catalog.  Dispatch by path kind and extension.
///
/// Supported layouts:
/// * `*.json` – one document `{ "files": [...], "memberships": [...], "pairs": [...], "annotations": [...] }`
/// * directory – one file per table, each either `<table>.csv` or `<table>.parquet`;
///   `annotations` may be missing
pub fn load_catalog(path: &Path) -> Result<Catalog> {
    if path.is_dir() {
        return load_directory(path);
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "json" => load_json(path),
        "" if !path.exists() => bail!("catalog not found: {}", path.display()),
        other => bail!("Unsupported catalog extension: .{other}"),
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

fn load_json(path: &Path) -> Result<Catalog> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading JSON catalog {}", path.display()))?;
    let catalog: Catalog = serde_json::from_str(&text).context("parsing JSON catalog")?;
    log_sizes(path, &catalog);
    Ok(catalog)
}

// ---------------------------------------------------------------------------
// Directory loader
// ---------------------------------------------------------------------------

fn load_directory(dir: &Path) -> Result<Catalog> {
    let catalog = Catalog {
        files: require_table::<File>(dir)?,
        memberships: require_table::<Membership>(dir)?,
        pairs: require_table::<Pair>(dir)?,
        annotations: read_table::<AnnotationRecord>(dir)?.unwrap_or_default(),
    };
    log_sizes(dir, &catalog);
    Ok(catalog)
}

fn log_sizes(path: &Path, catalog: &Catalog) {
    info!(
        "read catalog {}: {} files, {} memberships, {} pairs, {} annotation rows",
        path.display(),
        catalog.files.len(),
        catalog.memberships.len(),
        catalog.pairs.len(),
        catalog.annotations.len()
    );
}

/// Locate `<table>.csv` or `<table>.parquet` inside `dir`.
fn table_path(dir: &Path, table: &str) -> Option<PathBuf> {
    ["csv", "parquet", "pq"]
        .iter()
        .map(|ext| dir.join(format!("{table}.{ext}")))
        .find(|p| p.is_file())
}

fn require_table<T: TableRow>(dir: &Path) -> Result<Vec<T>> {
    read_table::<T>(dir)?.with_context(|| {
        format!(
            "catalog directory {} has no {}.csv or {}.parquet",
            dir.display(),
            T::TABLE,
            T::TABLE
        )
    })
}

fn read_table<T: TableRow>(dir: &Path) -> Result<Option<Vec<T>>> {
    let Some(path) = table_path(dir, T::TABLE) else {
        return Ok(None);
    };
    debug!("reading table {}", path.display());
    let rows = match path.extension().and_then(|e| e.to_str()) {
        Some("csv") => load_csv::<T>(&path)?,
        _ => load_parquet::<T>(&path)?,
    };
    Ok(Some(rows))
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with the table's column names, one record per row.
fn load_csv<T: TableRow>(path: &Path) -> Result<Vec<T>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("opening CSV {}", path.display()))?;
    let headers = reader.headers().context("reading CSV headers")?.clone();
    for column in T::COLUMNS {
        if !headers.iter().any(|h| h == *column) {
            bail!("{} is missing the '{column}' column", path.display());
        }
    }

    reader
        .deserialize()
        .enumerate()
        .map(|(row_no, record)| {
            record.with_context(|| format!("{}: CSV row {row_no}", path.display()))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet table.
///
/// Columns are looked up by name, so column order does not matter and extra
/// columns are ignored. Integer ids may be stored with any signed or unsigned
/// width.
fn load_parquet<T: TableRow>(path: &Path) -> Result<Vec<T>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("opening parquet file {}", path.display()))?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        let columns: Vec<&ArrayRef> = T::COLUMNS
            .iter()
            .map(|name| {
                schema
                    .index_of(name)
                    .map(|i| batch.column(i))
                    .map_err(|_| anyhow::anyhow!("{} is missing the '{name}' column", path.display()))
            })
            .collect::<Result<_>>()?;

        for row in 0..batch.num_rows() {
            let record = T::from_columns(&columns, row)
                .with_context(|| format!("{}: row {row}", path.display()))?;
            rows.push(record);
        }
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn unsupported_extensions_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.yaml");
        fs::write(&path, "files: []").unwrap();
        let err = load_catalog(&path).unwrap_err();
        assert!(err.to_string().contains("Unsupported catalog extension"));
    }

    #[test]
    fn csv_directory_needs_required_tables() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("files.csv"), "id,client_id,path\n1,Ann,Ann/Ann_0001\n").unwrap();
        let err = load_catalog(dir.path()).unwrap_err();
        assert!(err.to_string().contains("memberships"));
    }

    #[test]
    fn csv_tables_are_parsed() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("files.csv"),
            "id,client_id,path\n1,Ann,Ann/Ann_0001\n2,Ann,Ann/Ann_0002\n",
        )
        .unwrap();
        fs::write(dir.path().join("memberships.csv"), "fold,client_id\nfold3,Ann\n").unwrap();
        fs::write(
            dir.path().join("pairs.csv"),
            "fold,enrol_file,probe_file,is_match\nfold3,1,2,true\n",
        )
        .unwrap();

        let catalog = load_catalog(dir.path()).unwrap();
        assert_eq!(catalog.files.len(), 2);
        assert_eq!(catalog.memberships[0].fold.to_string(), "fold3");
        assert!(catalog.pairs[0].is_match);
        assert!(catalog.annotations.is_empty());
    }

    #[test]
    fn csv_errors_name_the_row() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("files.csv"), "id,client_id,path\nx,Ann,Ann/Ann_0001\n").unwrap();
        fs::write(dir.path().join("memberships.csv"), "fold,client_id\n").unwrap();
        fs::write(dir.path().join("pairs.csv"), "fold,enrol_file,probe_file,is_match\n").unwrap();
        let err = load_catalog(dir.path()).unwrap_err();
        assert!(format!("{err:#}").contains("CSV row 0"));
    }
}
