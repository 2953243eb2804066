use std::borrow::Cow;
use std::collections::BTreeSet;
use std::path::Path;

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{
    DataType, Float32Type, Float64Type, Int16Type, Int32Type, Int64Type, Int8Type, UInt16Type,
    UInt32Type, UInt64Type,
};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::{Deserialize, Serialize};

use super::model::{Category, NameDataset, Record};
use crate::error::LoadError;

// ---------------------------------------------------------------------------
// Load options
// ---------------------------------------------------------------------------

/// Source column names. Defaults follow the INSEE national file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    pub label: String,
    pub year: String,
    pub count: String,
    /// Optional: without it every record is [`Category::Any`].
    pub sex: Option<String>,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            label: "preusuel".to_string(),
            year: "annais".to_string(),
            count: "nombre".to_string(),
            sex: Some("sexe".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    pub columns: ColumnNames,
    /// Field delimiter for text files.
    pub delimiter: u8,
    /// Labels dropped at load time (e.g. INSEE's rare-name bucket).
    pub exclude_labels: BTreeSet<String>,
    /// Undo UTF-8-read-as-Latin-1 damage in labels.
    pub repair_encoding: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            columns: ColumnNames::default(),
            delimiter: b',',
            exclude_labels: BTreeSet::from(["_PRENOMS_RARES".to_string()]),
            repair_encoding: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a name table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv` / `.txt` / `.tsv` – delimited text with a header row
/// * `.parquet` / `.pq`       – Parquet with the same columns
pub fn load_file(path: &Path, options: &LoadOptions) -> Result<NameDataset, LoadError> {
    if !path.exists() {
        return Err(LoadError::NotFound(path.to_path_buf()));
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let mut coercer = RowCoercer::new(options);
    match ext.as_str() {
        "csv" | "txt" => load_delimited(path, options.delimiter, options, &mut coercer)?,
        "tsv" => load_delimited(path, b'\t', options, &mut coercer)?,
        "parquet" | "pq" => load_parquet(path, options, &mut coercer)?,
        other => return Err(LoadError::UnsupportedFormat(other.to_string())),
    }

    let RowCoercer {
        records,
        dropped,
        excluded,
        repaired,
        ..
    } = coercer;

    if records.is_empty() {
        return Err(LoadError::Empty(path.to_path_buf()));
    }

    let dataset = NameDataset::from_records(records);
    log::info!(
        "Loaded {} records ({} names) from {}",
        dataset.len(),
        dataset.label_count(),
        path.display()
    );
    log::debug!(
        "{dropped} rows dropped by coercion, {excluded} excluded, {repaired} labels re-decoded, {} duplicates collapsed",
        dataset.duplicates_collapsed()
    );
    Ok(dataset)
}

// ---------------------------------------------------------------------------
// Row coercion (shared by every format)
// ---------------------------------------------------------------------------

struct RowCoercer<'a> {
    options: &'a LoadOptions,
    records: Vec<Record>,
    dropped: usize,
    excluded: usize,
    repaired: usize,
}

impl<'a> RowCoercer<'a> {
    fn new(options: &'a LoadOptions) -> Self {
        Self {
            options,
            records: Vec::new(),
            dropped: 0,
            excluded: 0,
            repaired: 0,
        }
    }

    fn push(
        &mut self,
        label: Option<&str>,
        year: Option<&str>,
        count: Option<&str>,
        sex: Option<&str>,
    ) {
        let (Some(year), Some(count)) = (year.and_then(parse_year), count.and_then(parse_count))
        else {
            self.dropped += 1;
            return;
        };

        let raw = label.unwrap_or("").trim();
        let label = if self.options.repair_encoding {
            let fixed = repair_mojibake(raw);
            if matches!(fixed, Cow::Owned(_)) {
                self.repaired += 1;
            }
            fixed.into_owned()
        } else {
            raw.to_string()
        };

        if self.options.exclude_labels.contains(&label) {
            self.excluded += 1;
            return;
        }

        let category = sex.map(Category::from_sex_code).unwrap_or(Category::Any);
        self.records.push(Record {
            category,
            label,
            year,
            count,
        });
    }
}

/// A year cell must be all ASCII digits; INSEE writes `XXXX` for unknown years.
pub fn parse_year(cell: &str) -> Option<u32> {
    let cell = cell.trim();
    if cell.is_empty() || !cell.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    cell.parse().ok()
}

/// Largest count a single row may carry (2^53, exact as an `f64`).
pub const MAX_COUNT: u64 = 1 << 53;

/// Numeric coercion of a count cell. Integer or float text is accepted;
/// empty, NaN, negative, infinite and values above [`MAX_COUNT`] are not.
pub fn parse_count(cell: &str) -> Option<u64> {
    let cell = cell.trim();
    if let Ok(n) = cell.parse::<u64>() {
        return (n <= MAX_COUNT).then_some(n);
    }
    let v = cell.parse::<f64>().ok()?;
    (v.is_finite() && v >= 0.0 && v.round() <= MAX_COUNT as f64).then(|| v.round() as u64)
}

/// Re-decode a label that was UTF-8 read as Latin-1 (`"LÃ©a"` → `"Léa"`).
/// Returns the input untouched when it has no marker or does not round-trip.
pub fn repair_mojibake(s: &str) -> Cow<'_, str> {
    if !s.contains('Ã') {
        return Cow::Borrowed(s);
    }
    let bytes: Option<Vec<u8>> = s
        .chars()
        .map(|c| u8::try_from(u32::from(c)).ok())
        .collect();
    match bytes.map(String::from_utf8) {
        Some(Ok(fixed)) => Cow::Owned(fixed),
        _ => Cow::Borrowed(s),
    }
}

// ---------------------------------------------------------------------------
// Delimited text loader
// ---------------------------------------------------------------------------

/// Header row with column names; extra columns are ignored.
fn load_delimited(
    path: &Path,
    delimiter: u8,
    options: &LoadOptions,
    coercer: &mut RowCoercer<'_>,
) -> Result<(), LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_path(path)?;
    let headers = reader.headers()?.clone();

    let find = |name: &str| headers.iter().position(|h| h.trim() == name);
    let cols = &options.columns;
    let missing = |name: &String| LoadError::MissingColumn(name.clone());
    let label_idx = find(cols.label.as_str()).ok_or_else(|| missing(&cols.label))?;
    let year_idx = find(cols.year.as_str()).ok_or_else(|| missing(&cols.year))?;
    let count_idx = find(cols.count.as_str()).ok_or_else(|| missing(&cols.count))?;
    let sex_idx = cols.sex.as_deref().and_then(find);

    for result in reader.records() {
        let record = result?;
        coercer.push(
            record.get(label_idx),
            record.get(year_idx),
            record.get(count_idx),
            sex_idx.and_then(|i| record.get(i)),
        );
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Parquet file with the configured columns. Year, count and sex may be
/// stored as integers, floats or strings.
fn load_parquet(
    path: &Path,
    options: &LoadOptions,
    coercer: &mut RowCoercer<'_>,
) -> Result<(), LoadError> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;
    let cols = &options.columns;

    for batch_result in reader {
        let batch = batch_result?;
        let column = |name: &str| batch.column_by_name(name).cloned();

        let missing = |name: &String| LoadError::MissingColumn(name.clone());
        let label_col = column(cols.label.as_str()).ok_or_else(|| missing(&cols.label))?;
        let year_col = column(cols.year.as_str()).ok_or_else(|| missing(&cols.year))?;
        let count_col = column(cols.count.as_str()).ok_or_else(|| missing(&cols.count))?;
        let sex_col = cols.sex.as_deref().and_then(column);

        for row in 0..batch.num_rows() {
            let label = cell_text(&label_col, row);
            let year = cell_text(&year_col, row);
            let count = cell_text(&count_col, row);
            let sex = sex_col.as_ref().and_then(|c| cell_text(c, row));
            coercer.push(label.as_deref(), year.as_deref(), count.as_deref(), sex.as_deref());
        }
    }
    Ok(())
}

/// Render one Arrow cell as text so every format shares the same coercion.
/// Nulls and unsupported types come back as `None`.
fn cell_text(col: &ArrayRef, row: usize) -> Option<String> {
    if col.is_null(row) {
        return None;
    }
    let text = match col.data_type() {
        DataType::Utf8 => col.as_string::<i32>().value(row).to_string(),
        DataType::LargeUtf8 => col.as_string::<i64>().value(row).to_string(),
        DataType::Int8 => col.as_primitive::<Int8Type>().value(row).to_string(),
        DataType::Int16 => col.as_primitive::<Int16Type>().value(row).to_string(),
        DataType::Int32 => col.as_primitive::<Int32Type>().value(row).to_string(),
        DataType::Int64 => col.as_primitive::<Int64Type>().value(row).to_string(),
        DataType::UInt16 => col.as_primitive::<UInt16Type>().value(row).to_string(),
        DataType::UInt32 => col.as_primitive::<UInt32Type>().value(row).to_string(),
        DataType::UInt64 => col.as_primitive::<UInt64Type>().value(row).to_string(),
        DataType::Float32 => col.as_primitive::<Float32Type>().value(row).to_string(),
        DataType::Float64 => col.as_primitive::<Float64Type>().value(row).to_string(),
        other => {
            log::warn!("Unsupported column type {other:?}, treating cell as missing");
            return None;
        }
    };
    Some(text)
}
