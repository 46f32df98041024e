use std::fmt;

use camino::Utf8PathBuf;
use serde::Serialize;

use crate::domain::{Library, Status};

/// What the catalog knows about an instance's best primal objective.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Objective {
    /// A feasible solution with this objective value is known.
    Feasible(f64),
    /// The instance is proven infeasible.
    Infeasible,
    /// Neither a solution nor an infeasibility proof is known.
    Unknown,
}

impl Objective {
    pub fn feasible(&self) -> Option<bool> {
        match self {
            Objective::Feasible(_) => Some(true),
            Objective::Infeasible => Some(false),
            Objective::Unknown => None,
        }
    }

    pub fn primal(&self) -> Option<f64> {
        match self {
            Objective::Feasible(value) => Some(*value),
            Objective::Infeasible | Objective::Unknown => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SizeCounts {
    pub variables: u64,
    pub binaries: u64,
    pub integers: u64,
    /// Missing when the listing's binary and integer counts exceed its
    /// variable count.
    pub continuous: Option<u64>,
    pub constraints: u64,
    pub nonzeros: u64,
}

/// QPLIB-specific structure of the objective and constraints.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuadraticAttributes {
    /// Percentage of nonzero entries in the objective's quadratic matrix.
    pub objective_density: Option<f64>,
    /// Percentage of eigenvalues with the "wrong" sign for convexity.
    pub problematic_ev_density: Option<f64>,
    pub quadratic_constraints: u64,
    pub objective_type: String,
    pub variables_type: String,
    pub constraints_type: String,
}

/// A catalog entry resolved into typed fields, plus where its problem file
/// lives locally once fetched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Instance {
    pub name: String,
    pub library: Library,
    pub problem_type: Option<String>,
    pub path: Option<Utf8PathBuf>,
    pub objective: Objective,
    pub dual: Option<f64>,
    pub status: Option<Status>,
    pub counts: SizeCounts,
    pub sos: Option<u64>,
    pub semi: Option<u64>,
    pub quadratic: Option<QuadraticAttributes>,
    /// Other file formats the catalog lists for this instance.
    pub formats: Option<String>,
}

impl Instance {
    pub fn feasible(&self) -> Option<bool> {
        self.objective.feasible()
    }

    pub fn primal(&self) -> Option<f64> {
        self.objective.primal()
    }
}

fn yes_no(value: Option<bool>) -> &'static str {
    match value {
        Some(true) => "Yes",
        Some(false) => "No",
        None => "Unknown",
    }
}

fn or_none<T: fmt::Display>(value: Option<T>) -> String {
    value
        .map(|value| value.to_string())
        .unwrap_or_else(|| "None".to_string())
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Instance:              \t{}", self.name)?;
        match &self.quadratic {
            Some(quadratic) => {
                writeln!(
                    f,
                    "Objective Density:     \t{}%",
                    or_none(quadratic.objective_density)
                )?;
                writeln!(
                    f,
                    "Problematic EV Density:\t{}%",
                    or_none(quadratic.problematic_ev_density)
                )?;
                writeln!(f, "Objective Type:        \t{}", quadratic.objective_type)?;
                writeln!(f, "Variables Type:        \t{}", quadratic.variables_type)?;
                writeln!(f, "Constraints Type:      \t{}", quadratic.constraints_type)?;
            }
            None => {
                writeln!(
                    f,
                    "Type:                  \t{}",
                    or_none(self.problem_type.as_deref())
                )?;
            }
        }
        writeln!(f, "Local path:            \t{}", or_none(self.path.as_ref()))?;
        writeln!(f, "Feasible:              \t{}", yes_no(self.feasible()))?;
        writeln!(f, "Primal Bound:          \t{}", or_none(self.primal()))?;
        writeln!(f, "Dual Bound:            \t{}", or_none(self.dual))?;
        writeln!(f, "Status:                \t{}", or_none(self.status))?;
        writeln!(
            f,
            "Variables:             \t{}\t({} binary)\t ({} integer)\t ({} continuous)",
            self.counts.variables,
            self.counts.binaries,
            self.counts.integers,
            or_none(self.counts.continuous)
        )?;
        write!(f, "Constraints:           \t{}", self.counts.constraints)?;
        if let Some(quadratic) = &self.quadratic {
            write!(f, "\t({} quadratic)", quadratic.quadratic_constraints)?;
        } else if self.sos.is_some() || self.semi.is_some() {
            write!(
                f,
                "\t({} SOS)\t ({} semi)",
                or_none(self.sos),
                or_none(self.semi)
            )?;
        }
        writeln!(f)?;
        writeln!(f, "Non-zeroes:            \t{}", self.counts.nonzeros)
    }
}
