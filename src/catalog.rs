use std::fs;

use camino::Utf8Path;
use csv::{QuoteStyle, ReaderBuilder, WriterBuilder};

use crate::domain::Library;
use crate::error::OptlibError;
use crate::query::Predicate;
use crate::table::Table;

/// The persisted metadata table of one library.
#[derive(Debug, Clone)]
pub struct Catalog {
    library: Library,
    table: Table,
}

impl Catalog {
    pub fn from_table(library: Library, table: Table) -> Self {
        Self { library, table }
    }

    /// Reads a catalog CSV. Every field is kept as text; empty fields are
    /// missing values.
    pub fn load(library: Library, path: &Utf8Path) -> Result<Self, OptlibError> {
        if !path.as_std_path().is_file() {
            return Err(OptlibError::CatalogMissing(path.to_string()));
        }
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .from_path(path.as_std_path())
            .map_err(|err| OptlibError::CatalogParse(format!("open {path}: {err}")))?;
        let columns = reader
            .headers()
            .map_err(|err| OptlibError::CatalogParse(err.to_string()))?
            .iter()
            .map(|header| header.to_string())
            .collect::<Vec<_>>();

        let mut table = Table::new(columns);
        for (row_no, record) in reader.records().enumerate() {
            let record = record
                .map_err(|err| OptlibError::CatalogParse(format!("row {row_no}: {err}")))?;
            table.rows.push(
                record
                    .iter()
                    .map(|field| (!field.is_empty()).then(|| field.to_string()))
                    .collect(),
            );
        }
        Ok(Self { library, table })
    }

    /// Writes `table` as CSV. Header names, every cell of `text_columns`
    /// and any other non-numeric cell are quoted, so a text column stays
    /// text even when its values look like numbers (QPLIB names such as
    /// `0018`). Missing cells are left empty. The file is replaced
    /// atomically.
    pub fn write_csv(
        table: &Table,
        text_columns: &[&str],
        path: &Utf8Path,
    ) -> Result<(), OptlibError> {
        let parent = path
            .parent()
            .ok_or_else(|| OptlibError::Filesystem("invalid catalog path".to_string()))?;
        fs::create_dir_all(parent.as_std_path())
            .map_err(|err| OptlibError::Filesystem(err.to_string()))?;
        let mut temp = tempfile::Builder::new()
            .prefix(".catalog")
            .tempfile_in(parent.as_std_path())
            .map_err(|err| OptlibError::Filesystem(err.to_string()))?;

        let is_text = table
            .columns
            .iter()
            .map(|column| text_columns.contains(&column.as_str()))
            .collect::<Vec<_>>();
        {
            // Fields arrive already quoted; the writer only joins them.
            let mut writer = WriterBuilder::new()
                .quote_style(QuoteStyle::Never)
                .from_writer(temp.as_file_mut());
            writer
                .write_record(table.columns.iter().map(|column| quote(column)))
                .map_err(|err| OptlibError::Filesystem(err.to_string()))?;
            for row in &table.rows {
                let fields = row.iter().zip(&is_text).map(|(cell, text)| match cell {
                    None => String::new(),
                    Some(value) if *text || value.trim().parse::<f64>().is_err() => quote(value),
                    Some(value) => value.clone(),
                });
                writer
                    .write_record(fields)
                    .map_err(|err| OptlibError::Filesystem(err.to_string()))?;
            }
            writer
                .flush()
                .map_err(|err| OptlibError::Filesystem(err.to_string()))?;
        }
        temp.persist(path.as_std_path())
            .map_err(|err| OptlibError::Filesystem(err.to_string()))?;
        Ok(())
    }

    pub fn library(&self) -> Library {
        self.library
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = CatalogRow<'_>> {
        self.table.rows.iter().map(|cells| CatalogRow {
            columns: &self.table.columns,
            cells,
        })
    }

    /// Rows matching every predicate, in catalog order.
    pub fn select(&self, predicates: &[Predicate]) -> Vec<CatalogRow<'_>> {
        self.rows()
            .filter(|row| predicates.iter().all(|predicate| predicate.matches(row)))
            .collect()
    }
}

/// Borrowed view of one catalog row.
#[derive(Debug, Clone, Copy)]
pub struct CatalogRow<'a> {
    columns: &'a [String],
    cells: &'a [Option<String>],
}

impl<'a> CatalogRow<'a> {
    pub fn get(&self, column: &str) -> Option<&'a str> {
        let idx = self.columns.iter().position(|name| name == column)?;
        self.cells.get(idx)?.as_deref()
    }

    /// Name of the instance this row describes.
    pub fn name(&self) -> Result<&'a str, OptlibError> {
        self.text("Instance")
    }

    pub fn text(&self, column: &str) -> Result<&'a str, OptlibError> {
        self.get(column).ok_or_else(|| {
            OptlibError::CatalogParse(format!("missing value for column {column}"))
        })
    }

    /// Numeric value of a cell; `None` when missing or not a number.
    pub fn number(&self, column: &str) -> Option<f64> {
        self.get(column)?.trim().parse().ok()
    }

    /// Like [`CatalogRow::number`], but a present non-numeric value is an
    /// error.
    pub fn float(&self, column: &str) -> Result<Option<f64>, OptlibError> {
        match self.get(column) {
            None => Ok(None),
            Some(value) => value.trim().parse().map(Some).map_err(|_| {
                OptlibError::CatalogParse(format!("column {column}: not a number: {value}"))
            }),
        }
    }

    /// A required non-negative whole number. Accepts `12` as well as `12.0`.
    pub fn count(&self, column: &str) -> Result<u64, OptlibError> {
        let value = self.text(column)?;
        parse_count(value).ok_or_else(|| {
            OptlibError::CatalogParse(format!("column {column}: not a count: {value}"))
        })
    }
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

pub(crate) fn parse_count(value: &str) -> Option<u64> {
    let value = value.trim();
    if let Ok(count) = value.parse::<u64>() {
        return Some(count);
    }
    let float = value.parse::<f64>().ok()?;
    (float.is_finite() && float >= 0.0 && float.fract() == 0.0).then_some(float as u64)
}
