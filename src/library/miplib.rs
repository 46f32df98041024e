use crate::catalog::CatalogRow;
use crate::domain::{FileLayout, Library, Status};
use crate::error::OptlibError;
use crate::instance::{Instance, Objective};
use crate::query::FilterAttribute;
use crate::remote::RemoteSource;
use crate::table::Table;

use super::{LibraryStrategy, common_attribute, require_instance_column, row_status, size_counts};

const MIP_STATUSES: &[Status] = &[Status::Easy, Status::Hard, Status::Open];

/// MIPLIB 2017, benchmark or collection set. Both share the instance
/// store and only differ in the listing page.
#[derive(Debug, Clone)]
pub struct MiplibStrategy {
    library: Library,
    catalog_url: String,
    layout: FileLayout,
}

impl MiplibStrategy {
    pub fn new(library: Library) -> Self {
        let catalog_url = match library {
            Library::Miplib2017Collection => "https://miplib.zib.de/tag_collection.html",
            _ => "https://miplib.zib.de/tag_benchmark.html",
        };
        Self {
            library,
            catalog_url: catalog_url.to_string(),
            layout: FileLayout {
                remote_directory: "https://miplib.zib.de/WebData/instances/".to_string(),
                remote_file_ext: ".mps.gz".to_string(),
                local_file_prefix: String::new(),
                local_file_ext: ".mps".to_string(),
                compressed: true,
            },
        }
    }
}

impl LibraryStrategy for MiplibStrategy {
    fn library(&self) -> Library {
        self.library
    }

    fn catalog_url(&self) -> &str {
        &self.catalog_url
    }

    fn layout(&self) -> &FileLayout {
        &self.layout
    }

    fn normalize_catalog(
        &self,
        mut table: Table,
        _remote: &dyn RemoteSource,
    ) -> Result<Table, OptlibError> {
        require_instance_column(&table, self.library)?;
        table.rename_column("Objective", "Primal");
        Ok(table)
    }

    fn build_instance(&self, row: &CatalogRow<'_>) -> Result<Instance, OptlibError> {
        let status = row_status(row)?;
        Ok(Instance {
            name: row.name()?.to_string(),
            library: self.library,
            problem_type: Some("MILP".to_string()),
            path: None,
            objective: parse_mip_objective(row.get("Primal"), status)?,
            dual: None,
            status,
            counts: size_counts(row)?,
            sos: None,
            semi: None,
            quadratic: None,
            formats: row.get("Formats").map(str::to_string),
        })
    }

    fn text_columns(&self) -> &'static [&'static str] {
        &["Instance", "Status", "Primal", "Submitter", "Group", "Tags"]
    }

    fn status_vocabulary(&self) -> &'static [Status] {
        MIP_STATUSES
    }

    fn supports(&self, attribute: FilterAttribute) -> bool {
        common_attribute(attribute) || attribute == FilterAttribute::Status
    }
}

/// Reads the MIPLIB objective cell: `Infeasible`, a number, a number with a
/// trailing `*` for open instances, or nothing.
pub fn parse_mip_objective(
    raw: Option<&str>,
    status: Option<Status>,
) -> Result<Objective, OptlibError> {
    let Some(raw) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(Objective::Unknown);
    };
    if raw.eq_ignore_ascii_case("infeasible") {
        return Ok(Objective::Infeasible);
    }
    let numeric = if status == Some(Status::Open) {
        raw.trim_end_matches('*').trim_end()
    } else {
        raw
    };
    let value: f64 = numeric
        .parse()
        .map_err(|_| OptlibError::CatalogParse(format!("invalid objective value: {raw}")))?;
    if value.is_nan() {
        return Ok(Objective::Unknown);
    }
    Ok(Objective::Feasible(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn objective_cells() {
        assert_eq!(
            parse_mip_objective(Some("Infeasible"), Some(Status::Easy)).unwrap(),
            Objective::Infeasible
        );
        assert_eq!(
            parse_mip_objective(Some("123.45*"), Some(Status::Open)).unwrap(),
            Objective::Feasible(123.45)
        );
        assert_eq!(
            parse_mip_objective(Some("-26374"), Some(Status::Easy)).unwrap(),
            Objective::Feasible(-26374.0)
        );
        assert_eq!(
            parse_mip_objective(None, Some(Status::Open)).unwrap(),
            Objective::Unknown
        );
        assert_eq!(
            parse_mip_objective(Some("nan"), None).unwrap(),
            Objective::Unknown
        );
    }

    #[test]
    fn asterisk_only_stripped_for_open() {
        assert!(parse_mip_objective(Some("12*"), Some(Status::Hard)).is_err());
    }

    #[test]
    fn benchmark_and_collection_urls() {
        let benchmark = MiplibStrategy::new(Library::Miplib2017Benchmark);
        let collection = MiplibStrategy::new(Library::Miplib2017Collection);
        assert!(benchmark.catalog_url().ends_with("tag_benchmark.html"));
        assert!(collection.catalog_url().ends_with("tag_collection.html"));
        assert_eq!(
            collection.remote_url_for("air05"),
            "https://miplib.zib.de/WebData/instances/air05.mps.gz"
        );
        assert_eq!(collection.local_file_name("air05"), "air05.mps");
    }
}
