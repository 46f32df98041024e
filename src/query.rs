use serde::{Deserialize, Serialize};

use crate::catalog::CatalogRow;
use crate::domain::Status;
use crate::error::OptlibError;
use crate::library::LibraryStrategy;

/// Catalog attributes a query can filter on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterAttribute {
    Name,
    Variables,
    Binaries,
    Integers,
    Continuous,
    Constraints,
    Nonzeros,
    Status,
    Sos,
    Semi,
    ProblemType,
    ObjectiveDensity,
    ProblematicEvDensity,
    QuadraticConstraints,
    ObjectiveType,
    VariablesType,
    ConstraintsType,
}

impl FilterAttribute {
    pub fn column(&self) -> &'static str {
        match self {
            FilterAttribute::Name => "Instance",
            FilterAttribute::Variables => "Variables",
            FilterAttribute::Binaries => "Binaries",
            FilterAttribute::Integers => "Integers",
            FilterAttribute::Continuous => "Continuous",
            FilterAttribute::Constraints => "Constraints",
            FilterAttribute::Nonzeros => "Nonz.",
            FilterAttribute::Status => "Status",
            FilterAttribute::Sos => "SOS",
            FilterAttribute::Semi => "Semi",
            FilterAttribute::ProblemType => "Type",
            FilterAttribute::ObjectiveDensity => "Q0density",
            FilterAttribute::ProblematicEvDensity => "Q0probl.ev",
            FilterAttribute::QuadraticConstraints => "Quadratic constraints",
            FilterAttribute::ObjectiveType => "Objective type",
            FilterAttribute::VariablesType => "Variables type",
            FilterAttribute::ConstraintsType => "Constraints type",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FilterAttribute::Name => "instance name",
            FilterAttribute::Variables => "variables",
            FilterAttribute::Binaries => "binaries",
            FilterAttribute::Integers => "integers",
            FilterAttribute::Continuous => "continuous variables",
            FilterAttribute::Constraints => "constraints",
            FilterAttribute::Nonzeros => "non-zeroes",
            FilterAttribute::Status => "status",
            FilterAttribute::Sos => "SOS constraints",
            FilterAttribute::Semi => "semi-continuous variables",
            FilterAttribute::ProblemType => "problem type",
            FilterAttribute::ObjectiveDensity => "objective density",
            FilterAttribute::ProblematicEvDensity => "problematic eigenvalue density",
            FilterAttribute::QuadraticConstraints => "quadratic constraints",
            FilterAttribute::ObjectiveType => "objective type",
            FilterAttribute::VariablesType => "variables type",
            FilterAttribute::ConstraintsType => "constraints type",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    AtLeast,
    AtMost,
    Equals,
    NotEquals,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Number(f64),
    Text(String),
}

/// A single column test. A row matches a query when it matches every
/// predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub column: &'static str,
    pub comparison: Comparison,
    pub value: FilterValue,
}

impl Predicate {
    pub fn new(attribute: FilterAttribute, comparison: Comparison, value: FilterValue) -> Self {
        Self {
            column: attribute.column(),
            comparison,
            value,
        }
    }

    /// Numeric tests never match a missing or non-numeric cell; `NotEquals`
    /// matches a missing cell.
    pub fn matches(&self, row: &CatalogRow<'_>) -> bool {
        match &self.value {
            FilterValue::Number(expected) => match row.number(self.column) {
                Some(actual) => match self.comparison {
                    Comparison::AtLeast => actual >= *expected,
                    Comparison::AtMost => actual <= *expected,
                    Comparison::Equals => actual == *expected,
                    Comparison::NotEquals => actual != *expected,
                },
                None => self.comparison == Comparison::NotEquals,
            },
            FilterValue::Text(expected) => match row.get(self.column) {
                Some(actual) => match self.comparison {
                    Comparison::AtLeast => actual >= expected.as_str(),
                    Comparison::AtMost => actual <= expected.as_str(),
                    Comparison::Equals => actual == expected,
                    Comparison::NotEquals => actual != expected,
                },
                None => self.comparison == Comparison::NotEquals,
            },
        }
    }
}

/// Filters accepted by an instance query. Unset fields do not filter.
///
/// Each field is only meaningful for some libraries; see
/// [`InstanceQuery::predicates`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstanceQuery {
    pub instance_name: Option<String>,
    pub min_var: Option<u64>,
    pub max_var: Option<u64>,
    pub min_bin: Option<u64>,
    pub max_bin: Option<u64>,
    pub min_int: Option<u64>,
    pub max_int: Option<u64>,
    pub min_cont: Option<u64>,
    pub max_cont: Option<u64>,
    pub min_cons: Option<u64>,
    pub max_cons: Option<u64>,
    pub min_nz: Option<u64>,
    pub max_nz: Option<u64>,
    pub with_status: Option<Status>,
    pub without_status: Option<Status>,
    pub min_sos: Option<u64>,
    pub max_sos: Option<u64>,
    pub min_semi: Option<u64>,
    pub max_semi: Option<u64>,
    pub problem_type: Option<String>,
    pub min_obj_density: Option<f64>,
    pub max_obj_density: Option<f64>,
    pub min_problematic_ev_density: Option<f64>,
    pub max_problematic_ev_density: Option<f64>,
    pub min_quadratic_cons: Option<u64>,
    pub max_quadratic_cons: Option<u64>,
    pub objective_type: Option<String>,
    pub variables_type: Option<String>,
    pub constraints_type: Option<String>,
}

impl InstanceQuery {
    /// Turns the set fields into predicates, rejecting any filter the
    /// library does not support.
    pub fn predicates(
        &self,
        strategy: &dyn LibraryStrategy,
    ) -> Result<Vec<Predicate>, OptlibError> {
        let mut out = PredicateSet {
            strategy,
            predicates: Vec::new(),
        };

        if let Some(name) = &self.instance_name {
            out.text(FilterAttribute::Name, Comparison::Equals, name)?;
        }

        out.counts(FilterAttribute::Variables, self.min_var, self.max_var)?;
        out.counts(FilterAttribute::Binaries, self.min_bin, self.max_bin)?;
        out.counts(FilterAttribute::Integers, self.min_int, self.max_int)?;
        out.counts(FilterAttribute::Continuous, self.min_cont, self.max_cont)?;
        out.counts(FilterAttribute::Constraints, self.min_cons, self.max_cons)?;
        out.counts(FilterAttribute::Nonzeros, self.min_nz, self.max_nz)?;

        if let Some(status) = self.with_status {
            out.status(status, Comparison::Equals)?;
        }
        if let Some(status) = self.without_status {
            out.status(status, Comparison::NotEquals)?;
        }

        out.counts(FilterAttribute::Sos, self.min_sos, self.max_sos)?;
        out.counts(FilterAttribute::Semi, self.min_semi, self.max_semi)?;
        if let Some(problem_type) = &self.problem_type {
            out.text(FilterAttribute::ProblemType, Comparison::Equals, problem_type)?;
        }

        out.range(
            FilterAttribute::ObjectiveDensity,
            self.min_obj_density,
            self.max_obj_density,
        )?;
        out.range(
            FilterAttribute::ProblematicEvDensity,
            self.min_problematic_ev_density,
            self.max_problematic_ev_density,
        )?;
        out.counts(
            FilterAttribute::QuadraticConstraints,
            self.min_quadratic_cons,
            self.max_quadratic_cons,
        )?;
        if let Some(value) = &self.objective_type {
            out.text(FilterAttribute::ObjectiveType, Comparison::Equals, value)?;
        }
        if let Some(value) = &self.variables_type {
            out.text(FilterAttribute::VariablesType, Comparison::Equals, value)?;
        }
        if let Some(value) = &self.constraints_type {
            out.text(FilterAttribute::ConstraintsType, Comparison::Equals, value)?;
        }

        Ok(out.predicates)
    }
}

struct PredicateSet<'a> {
    strategy: &'a dyn LibraryStrategy,
    predicates: Vec<Predicate>,
}

impl PredicateSet<'_> {
    fn require(&self, attribute: FilterAttribute) -> Result<(), OptlibError> {
        if self.strategy.supports(attribute) {
            return Ok(());
        }
        Err(OptlibError::Precondition(format!(
            "cannot filter {} by {}",
            self.strategy.library(),
            attribute.label()
        )))
    }

    fn counts(
        &mut self,
        attribute: FilterAttribute,
        min: Option<u64>,
        max: Option<u64>,
    ) -> Result<(), OptlibError> {
        self.range(
            attribute,
            min.map(|value| value as f64),
            max.map(|value| value as f64),
        )
    }

    fn range(
        &mut self,
        attribute: FilterAttribute,
        min: Option<f64>,
        max: Option<f64>,
    ) -> Result<(), OptlibError> {
        if let Some(min) = min {
            self.require(attribute)?;
            self.predicates.push(Predicate::new(
                attribute,
                Comparison::AtLeast,
                FilterValue::Number(min),
            ));
        }
        if let Some(max) = max {
            self.require(attribute)?;
            self.predicates.push(Predicate::new(
                attribute,
                Comparison::AtMost,
                FilterValue::Number(max),
            ));
        }
        Ok(())
    }

    fn text(
        &mut self,
        attribute: FilterAttribute,
        comparison: Comparison,
        value: &str,
    ) -> Result<(), OptlibError> {
        self.require(attribute)?;
        self.predicates.push(Predicate::new(
            attribute,
            comparison,
            FilterValue::Text(value.to_string()),
        ));
        Ok(())
    }

    fn status(&mut self, status: Status, comparison: Comparison) -> Result<(), OptlibError> {
        self.require(FilterAttribute::Status)?;
        if !self.strategy.status_vocabulary().contains(&status) {
            return Err(OptlibError::Precondition(format!(
                "status {status} does not apply to {}",
                self.strategy.library()
            )));
        }
        self.text(FilterAttribute::Status, comparison, status.as_str())
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::catalog::Catalog;
    use crate::domain::Library;
    use crate::library::strategy_for;
    use crate::table::Table;

    fn catalog() -> Catalog {
        let cell = |value: &str| (!value.is_empty()).then(|| value.to_string());
        let table = Table {
            columns: vec!["Instance".to_string(), "Variables".to_string()],
            rows: vec![
                vec![cell("a"), cell("5")],
                vec![cell("b"), cell("25")],
                vec![cell("c"), cell("")],
            ],
        };
        Catalog::from_table(Library::Minlplib, table)
    }

    #[test]
    fn numeric_predicates_skip_missing_cells() {
        let catalog = catalog();
        let rows = catalog.rows().collect::<Vec<_>>();
        let at_least = Predicate::new(
            FilterAttribute::Variables,
            Comparison::AtLeast,
            FilterValue::Number(10.0),
        );
        let not_equal = Predicate::new(
            FilterAttribute::Variables,
            Comparison::NotEquals,
            FilterValue::Number(5.0),
        );
        assert!(!at_least.matches(&rows[0]));
        assert!(at_least.matches(&rows[1]));
        assert!(!at_least.matches(&rows[2]));
        assert!(not_equal.matches(&rows[2]));
    }

    #[test]
    fn query_builds_one_predicate_per_bound() {
        let strategy = strategy_for(Library::Minlplib, None).unwrap();
        let query = InstanceQuery {
            min_var: Some(10),
            max_var: Some(50),
            min_sos: Some(1),
            without_status: Some(Status::Open),
            ..InstanceQuery::default()
        };
        let predicates = query.predicates(strategy.as_ref()).unwrap();
        assert_eq!(predicates.len(), 4);
        assert_eq!(
            predicates[0],
            Predicate {
                column: "Variables",
                comparison: Comparison::AtLeast,
                value: FilterValue::Number(10.0),
            }
        );
        assert_eq!(
            predicates[2],
            Predicate {
                column: "Status",
                comparison: Comparison::NotEquals,
                value: FilterValue::Text("open".to_string()),
            }
        );
    }

    #[test]
    fn unsupported_filter_names_the_library() {
        let strategy = strategy_for(Library::Miplib2017Benchmark, None).unwrap();
        let query = InstanceQuery {
            min_obj_density: Some(0.5),
            ..InstanceQuery::default()
        };
        let err = query.predicates(strategy.as_ref()).unwrap_err();
        assert_matches!(err, OptlibError::Precondition(message)
            if message.contains("MIPLIB2017_Benchmark") && message.contains("objective density"));
    }

    #[test]
    fn query_deserializes_from_json() {
        let query: InstanceQuery =
            serde_json::from_str(r#"{"max_cons": 100, "with_status": "closed"}"#).unwrap();
        assert_eq!(query.max_cons, Some(100));
        assert_eq!(query.with_status, Some(Status::Closed));
        assert_eq!(query.min_var, None);
    }
}
