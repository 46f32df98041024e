use crate::catalog::CatalogRow;
use crate::domain::{FileLayout, Library, Status};
use crate::error::OptlibError;
use crate::instance::{Instance, Objective};
use crate::query::FilterAttribute;
use crate::remote::RemoteSource;
use crate::table::Table;

use super::{
    CHECK_MARKS, LibraryStrategy, common_attribute, derive_continuous, map_convex,
    require_instance_column, row_status, size_counts,
};

const MINLP_STATUSES: &[Status] = &[Status::Open, Status::Closed];

/// Canonical names of the MINLPLib listing columns, in page order. The
/// upstream headers are abbreviations with footnote markers, so they are
/// replaced by position.
const COLUMNS: [&str; 15] = [
    "Instance",
    "Formats",
    "Type",
    "Convex",
    "Variables",
    "Binaries",
    "Integers",
    "Constraints",
    "SOS",
    "Semi",
    "Nonz.",
    "Status",
    "Dual",
    "Primal",
    "Points",
];

/// Columns the listing must have; `Points` is optional.
const REQUIRED_COLUMNS: usize = 14;

#[derive(Debug, Clone)]
pub struct MinlplibStrategy {
    layout: FileLayout,
}

impl MinlplibStrategy {
    pub const DEFAULT_EXTENSION: &'static str = "gms";
    const CATALOG_URL: &'static str = "https://www.minlplib.org/instances.html";

    pub fn new(extension: &str) -> Self {
        Self {
            layout: FileLayout {
                remote_directory: format!("https://www.minlplib.org/{extension}/"),
                remote_file_ext: format!(".{extension}"),
                local_file_prefix: String::new(),
                local_file_ext: format!(".{extension}"),
                compressed: false,
            },
        }
    }
}

impl LibraryStrategy for MinlplibStrategy {
    fn library(&self) -> Library {
        Library::Minlplib
    }

    fn catalog_url(&self) -> &str {
        Self::CATALOG_URL
    }

    fn layout(&self) -> &FileLayout {
        &self.layout
    }

    fn normalize_catalog(
        &self,
        mut table: Table,
        _remote: &dyn RemoteSource,
    ) -> Result<Table, OptlibError> {
        if table.columns.len() < REQUIRED_COLUMNS {
            return Err(OptlibError::CatalogParse(format!(
                "MINLPLib listing has {} columns, expected at least {REQUIRED_COLUMNS}",
                table.columns.len()
            )));
        }
        table.rename_positional(&COLUMNS);
        require_instance_column(&table, Library::Minlplib)?;

        table.fill_missing("Convex", "-")?;
        table.fill_missing("Binaries", "0")?;
        table.fill_missing("Integers", "0")?;
        table.fill_missing("SOS", "0")?;
        table.fill_missing("Semi", "0")?;
        table.fill_missing("Status", "-")?;
        derive_continuous(&mut table)?;
        map_convex(&mut table)?;
        table.replace_values(
            "Status",
            &[
                ("-", "open"),
                (CHECK_MARKS[0], "closed"),
                (CHECK_MARKS[1], "closed"),
            ],
        )?;
        Ok(table)
    }

    fn build_instance(&self, row: &CatalogRow<'_>) -> Result<Instance, OptlibError> {
        let primal = row.float("Primal")?.filter(|value| !value.is_nan());
        let dual = row.float("Dual")?.filter(|value| !value.is_nan());
        let objective = match primal {
            Some(value) => Objective::Feasible(value),
            None if dual == Some(f64::INFINITY) => Objective::Infeasible,
            None => Objective::Unknown,
        };

        Ok(Instance {
            name: row.name()?.to_string(),
            library: Library::Minlplib,
            problem_type: row.get("Type").map(str::to_string),
            path: None,
            objective,
            dual,
            status: row_status(row)?,
            counts: size_counts(row)?,
            sos: Some(row.count("SOS")?),
            semi: Some(row.count("Semi")?),
            quadratic: None,
            formats: row.get("Formats").map(str::to_string),
        })
    }

    fn text_columns(&self) -> &'static [&'static str] {
        &["Instance", "Formats", "Type", "Convex", "Status"]
    }

    fn status_vocabulary(&self) -> &'static [Status] {
        MINLP_STATUSES
    }

    fn supports(&self, attribute: FilterAttribute) -> bool {
        common_attribute(attribute)
            || matches!(
                attribute,
                FilterAttribute::Status
                    | FilterAttribute::Sos
                    | FilterAttribute::Semi
                    | FilterAttribute::ProblemType
            )
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use assert_matches::assert_matches;

    use super::*;
    use crate::catalog::Catalog;
    use crate::remote::DownloadOutcome;

    struct Offline;

    impl RemoteSource for Offline {
        fn fetch_text(&self, url: &str) -> Result<String, OptlibError> {
            Err(OptlibError::Http(format!("offline: {url}")))
        }

        fn download(&self, url: &str, _destination: &Path) -> Result<DownloadOutcome, OptlibError> {
            Err(OptlibError::Http(format!("offline: {url}")))
        }
    }

    /// A raw listing with the given number of leading columns, upstream
    /// header names and one row.
    fn listing(width: usize) -> Table {
        let headers = [
            "Instance", "Formats", "Type 1", "C 2", "#Vars", "#Bin", "#Int", "#Cons", "#SOS",
            "#SC", "#NZ", "S 3", "Dual", "Primal", "#Pts",
        ];
        let cells = [
            "nvs01", "gms", "MINLP", "", "3", "0", "2", "3", "", "", "8", "-", "12.4697",
            "12.4697", "2",
        ];
        Table {
            columns: headers[..width].iter().map(|h| h.to_string()).collect(),
            rows: vec![
                cells[..width]
                    .iter()
                    .map(|c| (!c.is_empty()).then(|| c.to_string()))
                    .collect(),
            ],
        }
    }

    #[test]
    fn fourteen_column_listing_has_no_points() {
        let table = MinlplibStrategy::new("gms")
            .normalize_catalog(listing(14), &Offline)
            .unwrap();
        assert_eq!(table.columns.len(), 15);
        assert_eq!(table.column_index("Points"), None);
        assert_eq!(&table.columns[..14], &COLUMNS[..14]);
        assert_eq!(table.columns[14], "Continuous");
        assert_eq!(table.get(0, "Continuous"), Some("1"));
        assert_eq!(table.get(0, "Status"), Some("open"));
    }

    #[test]
    fn fifteen_column_listing_keeps_points() {
        let table = MinlplibStrategy::new("gms")
            .normalize_catalog(listing(15), &Offline)
            .unwrap();
        assert_eq!(table.get(0, "Points"), Some("2"));
    }

    #[test]
    fn narrow_listing_is_rejected() {
        let err = MinlplibStrategy::new("gms")
            .normalize_catalog(listing(13), &Offline)
            .unwrap_err();
        assert_matches!(err, OptlibError::CatalogParse(_));
    }

    fn row_table(primal: Option<&str>, dual: Option<&str>) -> Table {
        let mut columns = COLUMNS.iter().map(|c| c.to_string()).collect::<Vec<_>>();
        columns.push("Continuous".to_string());
        let cell = |value: &str| Some(value.to_string());
        Table {
            columns,
            rows: vec![vec![
                cell("ex1221"),
                cell("gms nl"),
                cell("MINLP"),
                cell("No"),
                cell("5"),
                cell("3"),
                cell("0"),
                cell("5"),
                cell("0"),
                cell("0"),
                cell("14"),
                cell("closed"),
                dual.map(str::to_string),
                primal.map(str::to_string),
                None,
                cell("2"),
            ]],
        }
    }

    fn build(primal: Option<&str>, dual: Option<&str>) -> Instance {
        let catalog = Catalog::from_table(Library::Minlplib, row_table(primal, dual));
        let row = catalog.rows().next().unwrap();
        MinlplibStrategy::new("gms").build_instance(&row).unwrap()
    }

    #[test]
    fn missing_primal_with_infinite_dual_is_infeasible() {
        let instance = build(None, Some("inf"));
        assert_eq!(instance.objective, Objective::Infeasible);
        assert_eq!(instance.feasible(), Some(false));
        assert_eq!(instance.primal(), None);
    }

    #[test]
    fn missing_primal_with_finite_dual_is_unknown() {
        let instance = build(None, Some("-3.2"));
        assert_eq!(instance.objective, Objective::Unknown);
        assert_eq!(instance.dual, Some(-3.2));
    }

    #[test]
    fn present_primal_is_feasible() {
        let instance = build(Some("7.6672"), Some("7.6672"));
        assert_eq!(instance.objective, Objective::Feasible(7.6672));
        assert_eq!(instance.status, Some(Status::Closed));
        assert_eq!(instance.sos, Some(0));
        assert_eq!(instance.counts.continuous, Some(2));
        assert_eq!(instance.problem_type.as_deref(), Some("MINLP"));
    }
}
