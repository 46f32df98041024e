//! Per-library catalog quirks.
//!
//! Each benchmark library publishes its metadata with its own column names,
//! symbols and file naming. A [`LibraryStrategy`] isolates those quirks
//! behind one interface; [`strategy_for`] picks the implementation once.

mod minlplib;
mod miplib;
mod qplib;

pub use minlplib::MinlplibStrategy;
pub use miplib::{MiplibStrategy, parse_mip_objective};
pub use qplib::{QplibStrategy, parse_best_known, split_instance_cell};

use tracing::warn;

use crate::catalog::{CatalogRow, parse_count};
use crate::domain::{FileLayout, Library, Status};
use crate::error::OptlibError;
use crate::instance::{Instance, SizeCounts};
use crate::query::FilterAttribute;
use crate::remote::RemoteSource;
use crate::table::Table;

const CHECK_MARKS: [&str; 2] = ["\u{2714}", "\u{2713}"];

pub trait LibraryStrategy: Send + Sync {
    fn library(&self) -> Library;

    /// Page holding the library's instance listing.
    fn catalog_url(&self) -> &str;

    fn layout(&self) -> &FileLayout;

    /// Turns the upstream listing into the canonical catalog table. May
    /// fetch auxiliary feeds through `remote`.
    fn normalize_catalog(
        &self,
        table: Table,
        remote: &dyn RemoteSource,
    ) -> Result<Table, OptlibError>;

    fn build_instance(&self, row: &CatalogRow<'_>) -> Result<Instance, OptlibError>;

    /// Catalog columns holding text, quoted in the CSV even when a value
    /// looks numeric.
    fn text_columns(&self) -> &'static [&'static str];

    fn status_vocabulary(&self) -> &'static [Status];

    fn supports(&self, attribute: FilterAttribute) -> bool;

    fn remote_url_for(&self, name: &str) -> String {
        self.layout().remote_url(name)
    }

    fn local_file_name(&self, name: &str) -> String {
        self.layout().local_file_name(name)
    }
}

/// Selects the strategy for `library`. A file extension override is only
/// accepted by MINLPLib and QPLIB.
pub fn strategy_for(
    library: Library,
    file_extension: Option<&str>,
) -> Result<Box<dyn LibraryStrategy>, OptlibError> {
    match library {
        Library::Miplib2017Benchmark | Library::Miplib2017Collection => {
            if file_extension.is_some() {
                return Err(OptlibError::Precondition(format!(
                    "{library} instances are only served as MPS; a file extension cannot be set"
                )));
            }
            Ok(Box::new(MiplibStrategy::new(library)))
        }
        Library::Minlplib => {
            let extension = file_extension.map(normalize_extension).transpose()?;
            Ok(Box::new(MinlplibStrategy::new(
                extension
                    .as_deref()
                    .unwrap_or(MinlplibStrategy::DEFAULT_EXTENSION),
            )))
        }
        Library::Qplib => {
            let extension = file_extension.map(normalize_extension).transpose()?;
            Ok(Box::new(QplibStrategy::new(
                extension.as_deref().unwrap_or(QplibStrategy::DEFAULT_EXTENSION),
            )))
        }
    }
}

fn normalize_extension(value: &str) -> Result<String, OptlibError> {
    let trimmed = value.trim().trim_start_matches('.');
    let valid = !trimmed.is_empty() && trimmed.chars().all(|ch| ch.is_ascii_alphanumeric());
    if !valid {
        return Err(OptlibError::Precondition(format!(
            "invalid file extension: {value}"
        )));
    }
    Ok(trimmed.to_string())
}

fn common_attribute(attribute: FilterAttribute) -> bool {
    matches!(
        attribute,
        FilterAttribute::Name
            | FilterAttribute::Variables
            | FilterAttribute::Binaries
            | FilterAttribute::Integers
            | FilterAttribute::Continuous
            | FilterAttribute::Constraints
            | FilterAttribute::Nonzeros
    )
}

fn require_instance_column(table: &Table, library: Library) -> Result<(), OptlibError> {
    if table.column_index("Instance").is_none() {
        return Err(OptlibError::CatalogParse(format!(
            "{library} listing has no Instance column"
        )));
    }
    Ok(())
}

/// Sets `Continuous = Variables - Binaries - Integers` on every row. Rows
/// without a variable count, or whose binaries and integers exceed it, get a
/// missing value.
fn derive_continuous(table: &mut Table) -> Result<(), OptlibError> {
    let names = table.column_values("Instance").unwrap_or_default();
    let variables = table.column_values("Variables")?;
    let binaries = table.column_values("Binaries")?;
    let integers = table.column_values("Integers")?;

    let mut continuous = Vec::with_capacity(variables.len());
    for (idx, ((variables, binaries), integers)) in
        variables.iter().zip(&binaries).zip(&integers).enumerate()
    {
        let counts = (
            variables.as_deref().and_then(parse_count),
            binaries.as_deref().and_then(parse_count),
            integers.as_deref().and_then(parse_count),
        );
        let value = match counts {
            (Some(vars), Some(bins), Some(ints)) => {
                let value = vars.checked_sub(bins).and_then(|rest| rest.checked_sub(ints));
                if value.is_none() {
                    let name = names.get(idx).cloned().flatten().unwrap_or_default();
                    warn!(
                        instance = %name,
                        "{bins} binaries and {ints} integers exceed {vars} variables"
                    );
                }
                value.map(|value| value.to_string())
            }
            _ => None,
        };
        continuous.push(value);
    }
    table.set_column("Continuous", continuous)
}

fn map_convex(table: &mut Table) -> Result<(), OptlibError> {
    table.replace_values(
        "Convex",
        &[("-", "No"), (CHECK_MARKS[0], "Yes"), (CHECK_MARKS[1], "Yes")],
    )
}

fn size_counts(row: &CatalogRow<'_>) -> Result<SizeCounts, OptlibError> {
    Ok(SizeCounts {
        variables: row.count("Variables")?,
        binaries: row.count("Binaries")?,
        integers: row.count("Integers")?,
        continuous: row
            .get("Continuous")
            .map(|_| row.count("Continuous"))
            .transpose()?,
        constraints: row.count("Constraints")?,
        nonzeros: row.count("Nonz.")?,
    })
}

fn row_status(row: &CatalogRow<'_>) -> Result<Option<Status>, OptlibError> {
    row.get("Status")
        .map(|value| value.parse::<Status>())
        .transpose()
}
