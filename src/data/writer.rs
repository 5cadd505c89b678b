use std::fs;
use std::path::Path;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use log::info;
use parquet::arrow::ArrowWriter;

use super::model::Catalog;
use super::table::TableRow;

/// On-disk layouts a catalog can be written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogFormat {
    /// A single JSON document.
    Json,
    /// A directory of CSV tables.
    Csv,
    /// A directory of Parquet tables.
    Parquet,
}

impl FromStr for CatalogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(CatalogFormat::Json),
            "csv" => Ok(CatalogFormat::Csv),
            "parquet" | "pq" => Ok(CatalogFormat::Parquet),
            other => bail!("unknown catalog format '{other}' (expected json, csv or parquet)"),
        }
    }
}

/// Write `catalog` to `path` in `format`.
///
/// `path` is the JSON file for [`CatalogFormat::Json`] and the table directory
/// otherwise; the directory is created when missing.
pub fn write_catalog(catalog: &Catalog, path: &Path, format: CatalogFormat) -> Result<()> {
    match format {
        CatalogFormat::Json => {
            let file = fs::File::create(path)
                .with_context(|| format!("creating {}", path.display()))?;
            serde_json::to_writer_pretty(file, catalog).context("writing JSON catalog")?;
        }
        CatalogFormat::Csv | CatalogFormat::Parquet => {
            fs::create_dir_all(path)
                .with_context(|| format!("creating directory {}", path.display()))?;
            write_table(path, &catalog.files, format)?;
            write_table(path, &catalog.memberships, format)?;
            write_table(path, &catalog.pairs, format)?;
            write_table(path, &catalog.annotations, format)?;
        }
    }
    info!(
        "wrote catalog {} ({} files, {} pairs)",
        path.display(),
        catalog.files.len(),
        catalog.pairs.len()
    );
    Ok(())
}

fn write_table<T: TableRow>(dir: &Path, rows: &[T], format: CatalogFormat) -> Result<()> {
    match format {
        CatalogFormat::Csv => {
            let path = dir.join(format!("{}.csv", T::TABLE));
            let mut writer = csv::Writer::from_path(&path)
                .with_context(|| format!("creating {}", path.display()))?;
            if rows.is_empty() {
                writer.write_record(T::COLUMNS)?;
            }
            for row in rows {
                writer
                    .serialize(row)
                    .with_context(|| format!("writing {}", path.display()))?;
            }
            writer.flush()?;
        }
        CatalogFormat::Parquet => {
            let path = dir.join(format!("{}.parquet", T::TABLE));
            let batch = T::to_batch(rows)?;
            let file = fs::File::create(&path)
                .with_context(|| format!("creating {}", path.display()))?;
            let mut writer = ArrowWriter::try_new(file, T::schema(), None)
                .context("creating parquet writer")?;
            writer.write(&batch).context("writing parquet batch")?;
            writer.close().context("closing parquet writer")?;
        }
        CatalogFormat::Json => bail!("JSON catalogs are written as a single document"),
    }
    Ok(())
}
