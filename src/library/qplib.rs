use tracing::debug;

use crate::catalog::CatalogRow;
use crate::domain::{FileLayout, Library, Status};
use crate::error::OptlibError;
use crate::instance::{Instance, Objective, QuadraticAttributes};
use crate::query::FilterAttribute;
use crate::remote::RemoteSource;
use crate::table::Table;

use super::{
    LibraryStrategy, common_attribute, derive_continuous, map_convex, require_instance_column,
    size_counts,
};

const RENAMES: [(&str, &str); 10] = [
    ("Cvx", "Convex"),
    ("O", "Objective type"),
    ("V", "Variables type"),
    ("C", "Constraints type"),
    ("TotalVars.", "Variables"),
    ("BinaryVars.", "Binaries"),
    ("IntegerVars.", "Integers"),
    ("TotalCons.", "Constraints"),
    ("Quad.Cons.", "Quadratic constraints"),
    ("Non-zeros", "Nonz."),
];

#[derive(Debug, Clone)]
pub struct QplibStrategy {
    layout: FileLayout,
}

impl QplibStrategy {
    pub const DEFAULT_EXTENSION: &'static str = "qplib";
    const CATALOG_URL: &'static str = "https://qplib.zib.de/instances.html";
    pub const SOLUTIONS_URL: &'static str = "https://qplib.zib.de/qplib.solu";

    pub fn new(extension: &str) -> Self {
        Self {
            layout: FileLayout {
                remote_directory: format!("https://qplib.zib.de/{extension}/QPLIB_"),
                remote_file_ext: format!(".{extension}"),
                local_file_prefix: "QPLIB_".to_string(),
                local_file_ext: format!(".{extension}"),
                compressed: false,
            },
        }
    }
}

impl LibraryStrategy for QplibStrategy {
    fn library(&self) -> Library {
        Library::Qplib
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
        remote: &dyn RemoteSource,
    ) -> Result<Table, OptlibError> {
        require_instance_column(&table, Library::Qplib)?;
        // The listing ends with a totals row.
        table.drop_last_row();

        let cells = table.column_values("Instance")?;
        let mut names = Vec::with_capacity(cells.len());
        let mut formats = Vec::with_capacity(cells.len());
        for cell in cells {
            let (name, format) = match cell.as_deref() {
                Some(cell) => split_instance_cell(cell),
                None => (None, None),
            };
            names.push(name);
            formats.push(format);
        }
        table.set_column("Format", formats)?;
        table.set_column("Instance", names)?;

        for (from, to) in RENAMES {
            table.rename_column(from, to);
        }
        table.fill_missing("Binaries", "0")?;
        table.fill_missing("Integers", "0")?;
        derive_continuous(&mut table)?;
        map_convex(&mut table)?;

        table.set_column("Primal", vec![None; table.len()])?;
        let feed = remote.fetch_text(Self::SOLUTIONS_URL)?;
        for (name, value) in parse_best_known(&feed)? {
            let updated = table.set_where("Instance", &name, "Primal", &value.to_string())?;
            if updated == 0 {
                debug!(instance = %name, "best known value for instance not in listing");
            }
        }
        Ok(table)
    }

    fn build_instance(&self, row: &CatalogRow<'_>) -> Result<Instance, OptlibError> {
        let objective = match row.float("Primal")?.filter(|value| !value.is_nan()) {
            Some(value) => Objective::Feasible(value),
            None => Objective::Unknown,
        };
        let quadratic = QuadraticAttributes {
            objective_density: row.float("Q0density")?,
            problematic_ev_density: row.float("Q0probl.ev")?,
            quadratic_constraints: row.count("Quadratic constraints")?,
            objective_type: row.text("Objective type")?.to_string(),
            variables_type: row.text("Variables type")?.to_string(),
            constraints_type: row.text("Constraints type")?.to_string(),
        };

        Ok(Instance {
            name: row.name()?.to_string(),
            library: Library::Qplib,
            problem_type: None,
            path: None,
            objective,
            dual: None,
            status: None,
            counts: size_counts(row)?,
            sos: None,
            semi: None,
            quadratic: Some(quadratic),
            formats: row.get("Format").map(str::to_string),
        })
    }

    fn text_columns(&self) -> &'static [&'static str] {
        &[
            "Instance",
            "Convex",
            "Objective type",
            "Variables type",
            "Constraints type",
            "Format",
        ]
    }

    fn status_vocabulary(&self) -> &'static [Status] {
        &[]
    }

    fn supports(&self, attribute: FilterAttribute) -> bool {
        common_attribute(attribute)
            || matches!(
                attribute,
                FilterAttribute::ObjectiveDensity
                    | FilterAttribute::ProblematicEvDensity
                    | FilterAttribute::QuadraticConstraints
                    | FilterAttribute::ObjectiveType
                    | FilterAttribute::VariablesType
                    | FilterAttribute::ConstraintsType
            )
    }
}

/// Splits a listing cell such as `0018 (gms, lp, qplib)` into the instance
/// name and the space-separated formats.
pub fn split_instance_cell(cell: &str) -> (Option<String>, Option<String>) {
    let name = cell
        .split_whitespace()
        .next()
        .map(str::to_string);
    let formats = cell.split_once('(').map(|(_, rest)| {
        rest.replace(',', "")
            .replace(')', "")
            .trim()
            .to_string()
    });
    (name, formats.filter(|formats| !formats.is_empty()))
}

/// Parses `=best= QPLIB_<name> <value>` lines of the QPLIB solution feed.
/// Other lines are ignored; a malformed `=best=` line is an error.
pub fn parse_best_known(feed: &str) -> Result<Vec<(String, f64)>, OptlibError> {
    let mut values = Vec::new();
    for line in feed.lines() {
        let mut pieces = line.split_whitespace();
        if pieces.next() != Some("=best=") {
            continue;
        }
        let malformed = || OptlibError::CatalogParse(format!("malformed solution line: {line}"));
        let label = pieces.next().ok_or_else(malformed)?;
        let name = label.split('_').nth(1).ok_or_else(malformed)?;
        let value = pieces
            .next()
            .and_then(|value| value.parse::<f64>().ok())
            .ok_or_else(malformed)?;
        values.push((name.to_string(), value));
    }
    Ok(values)
}
