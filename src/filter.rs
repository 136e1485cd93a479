//! Active filters: templates with every value bound and a resolved column.

use std::fmt;

use tracing::debug;

use crate::error::{Result, TxtFilterError};
use crate::operator::{Operator, OperatorRegistry};
use crate::record::Row;
use crate::template::{Comparison, FilterTemplate, Locator, Slot, write_comparisons};
use crate::value::{Value, ValueType};

/// A fully bound comparison with its operator already looked up.
#[derive(Debug, Clone)]
struct Check {
    comparison: Comparison,
    operator: Operator,
}

impl Check {
    fn apply(&self, field: &Value) -> bool {
        match self.comparison.value() {
            Some(value) => self.operator.apply(field, value),
            None => false,
        }
    }
}

/// A filter ready for evaluation.
///
/// Built from a [`FilterTemplate`] plus activation values; holds its own copy
/// of every comparison, so neither the template nor other activations of it
/// are affected.
#[derive(Debug, Clone)]
pub struct ActiveFilter {
    name: String,
    column: Locator,
    index: Option<usize>,
    value_type: ValueType,
    checks: Vec<Check>,
}

impl ActiveFilter {
    /// Bind `values` to the template's open slots in declaration order.
    ///
    /// Fails if the number of values differs from the number of open slots,
    /// or if any comparison names an operator missing from `operators`.
    pub fn activate(
        template: &FilterTemplate,
        values: Vec<Value>,
        operators: &OperatorRegistry,
    ) -> Result<Self> {
        let expected = template.unbound_count();
        if values.len() != expected {
            return Err(TxtFilterError::Arity {
                name: template.name().to_string(),
                expected,
                supplied: values.len(),
            });
        }

        let mut supplied = values.into_iter();
        let mut checks = Vec::with_capacity(template.comparisons().len());
        for comparison in template.comparisons() {
            let operator = operators.lookup(comparison.operator())?.clone();
            let value = match comparison.slot() {
                Slot::Bound(v) => v.clone(),
                // Counts were checked above.
                Slot::Unbound => match supplied.next() {
                    Some(v) => v,
                    None => break,
                },
            };
            checks.push(Check {
                comparison: Comparison::bound(comparison.operator(), value),
                operator,
            });
        }

        debug!(filter = template.name(), comparisons = checks.len(), "activated filter");

        Ok(Self {
            name: template.name().to_string(),
            column: template.column().clone(),
            index: None,
            value_type: template.value_type().clone(),
            checks,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column(&self) -> &Locator {
        &self.column
    }

    /// The 0-based physical column, once resolved.
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    /// Bound comparisons in declaration order.
    pub fn comparisons(&self) -> impl Iterator<Item = &Comparison> {
        self.checks.iter().map(|c| &c.comparison)
    }

    /// Map the locator onto a physical index for the current file.
    ///
    /// Positions map to `n - 1`; header names to their place in `header`.
    /// Resolving again always starts from the locator, so repeated calls
    /// against the same header give the same index.
    pub fn resolve<S: AsRef<str>>(&mut self, header: Option<&[S]>) -> Result<usize> {
        let index = match &self.column {
            Locator::Position(n) => n
                .checked_sub(1)
                .ok_or_else(|| TxtFilterError::InvalidPosition {
                    name: self.name.clone(),
                })?,
            Locator::Header(name) => header
                .and_then(|h| h.iter().position(|field| field.as_ref() == name))
                .ok_or_else(|| TxtFilterError::UnknownColumn(name.clone()))?,
        };
        debug!(filter = %self.name, column = %self.column, index, "resolved column");
        self.index = Some(index);
        Ok(index)
    }

    /// Does a single raw field satisfy every comparison?
    ///
    /// A filter with no comparisons accepts anything without coercing.
    pub fn evaluate(&self, field: &str) -> Result<bool> {
        if self.checks.is_empty() {
            return Ok(true);
        }
        let value = self
            .value_type
            .coerce(field)
            .map_err(|reason| TxtFilterError::Coercion {
                filter: self.name.clone(),
                value: field.to_string(),
                reason,
            })?;
        Ok(self.checks.iter().all(|check| check.apply(&value)))
    }

    /// Evaluate against the field at the resolved index of `row`.
    pub fn matches<R: Row + ?Sized>(&self, row: &R) -> Result<bool> {
        let index = self
            .index
            .ok_or_else(|| TxtFilterError::Unresolved(self.name.clone()))?;
        let field = row
            .field(index)
            .ok_or_else(|| TxtFilterError::ColumnOutOfRange {
                filter: self.name.clone(),
                index,
                width: row.width(),
            })?;
        self.evaluate(field)
    }
}

impl fmt::Display for ActiveFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Filter '{}' on {}", self.name, self.column)?;
        if let Some(index) = self.index {
            write!(f, " at column {index}")?;
        }
        write!(f, " ({}):", self.value_type.name())?;
        let comparisons: Vec<Comparison> = self.comparisons().cloned().collect();
        write_comparisons(f, &comparisons)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> OperatorRegistry {
        let mut registry = OperatorRegistry::default();
        registry.register("!in", |container, item| !container.contains(item), true);
        registry
    }

    fn date_template() -> FilterTemplate {
        let mut template = FilterTemplate::new("date", "OBSERVATION DATE", ValueType::Text);
        template.add_comparison(">=", None).add_comparison("<=", None);
        template
    }

    #[test]
    fn test_activate_binds_in_declaration_order() {
        let filter = ActiveFilter::activate(
            &date_template(),
            vec!["2020-01-01".into(), "2020-12-31".into()],
            &registry(),
        )
        .unwrap();
        let bound: Vec<String> = filter
            .comparisons()
            .map(|c| format!("{} {}", c.operator(), c.value().unwrap()))
            .collect();
        assert_eq!(bound, vec![">= \"2020-01-01\"", "<= \"2020-12-31\""]);
        assert!(filter.evaluate("2020-06-15").unwrap());
        assert!(!filter.evaluate("2021-01-01").unwrap());
    }

    #[test]
    fn test_arity_mismatch() {
        let template = date_template();
        for values in [vec![Value::from("a")], vec!["a".into(), "b".into(), "c".into()]] {
            let err = ActiveFilter::activate(&template, values, &registry()).unwrap_err();
            assert!(matches!(
                err,
                TxtFilterError::Arity {
                    expected: 2,
                    ..
                }
            ));
        }
    }

    #[test]
    fn test_bound_slots_are_not_overwritten() {
        let mut template = FilterTemplate::new("n", 1usize, ValueType::Integer);
        template
            .add_comparison(">", Some(Value::Integer(10)))
            .add_comparison("<", None);
        let filter = ActiveFilter::activate(&template, vec![Value::Integer(20)], &registry()).unwrap();
        assert!(filter.evaluate("15").unwrap());
        assert!(!filter.evaluate("5").unwrap());
        assert!(!filter.evaluate("25").unwrap());
    }

    #[test]
    fn test_undefined_operator_aborts_activation() {
        let mut template = FilterTemplate::new("x", 1usize, ValueType::Text);
        template.add_comparison("~=", Some(Value::from("a")));
        let err = ActiveFilter::activate(&template, vec![], &registry()).unwrap_err();
        assert!(matches!(err, TxtFilterError::UndefinedOperator(ref op) if op == "~="));
    }

    #[test]
    fn test_in_and_not_in() {
        let codes = Value::from(vec!["a", "b"]);
        let mut member = FilterTemplate::new("member", 1usize, ValueType::Text);
        member.add_comparison("in", Some(codes.clone()));
        let mut excluded = FilterTemplate::new("excluded", 1usize, ValueType::Text);
        excluded.add_comparison("!in", Some(codes));

        let member = ActiveFilter::activate(&member, vec![], &registry()).unwrap();
        let excluded = ActiveFilter::activate(&excluded, vec![], &registry()).unwrap();

        assert!(member.evaluate("a").unwrap());
        assert!(!member.evaluate("c").unwrap());
        assert!(!excluded.evaluate("a").unwrap());
        assert!(excluded.evaluate("c").unwrap());
    }

    #[test]
    fn test_no_comparisons_is_vacuously_true() {
        let template = FilterTemplate::new("all", 1usize, ValueType::Integer);
        let filter = ActiveFilter::activate(&template, vec![], &registry()).unwrap();
        assert!(filter.evaluate("not a number").unwrap());
    }

    #[test]
    fn test_resolve_position() {
        let template = FilterTemplate::new("p", 5usize, ValueType::Text);
        let mut filter = ActiveFilter::activate(&template, vec![], &registry()).unwrap();
        assert_eq!(filter.resolve::<&str>(None).unwrap(), 4);
        assert_eq!(filter.index(), Some(4));
    }

    #[test]
    fn test_resolve_header_is_idempotent() {
        let header = ["A", "OBSERVATION DATE", "C"];
        let mut filter = ActiveFilter::activate(
            &date_template(),
            vec!["x".into(), "y".into()],
            &registry(),
        )
        .unwrap();
        assert_eq!(filter.resolve(Some(&header[..])).unwrap(), 1);
        assert_eq!(filter.resolve(Some(&header[..])).unwrap(), 1);
    }

    #[test]
    fn test_resolve_unknown_header() {
        let mut filter = ActiveFilter::activate(
            &date_template(),
            vec!["x".into(), "y".into()],
            &registry(),
        )
        .unwrap();
        let err = filter.resolve(Some(&["A", "B"][..])).unwrap_err();
        assert!(matches!(err, TxtFilterError::UnknownColumn(ref c) if c == "OBSERVATION DATE"));
    }

    #[test]
    fn test_matches_out_of_range() {
        let template = FilterTemplate::new("p", 5usize, ValueType::Text);
        let mut filter = ActiveFilter::activate(&template, vec![], &registry()).unwrap();
        filter.resolve::<&str>(None).unwrap();
        let err = filter.matches(&vec!["a", "b", "c", "d"]).unwrap_err();
        assert!(matches!(
            err,
            TxtFilterError::ColumnOutOfRange {
                index: 4,
                width: 4,
                ..
            }
        ));
    }

    #[test]
    fn test_matches_requires_resolution() {
        let template = FilterTemplate::new("p", 1usize, ValueType::Text);
        let filter = ActiveFilter::activate(&template, vec![], &registry()).unwrap();
        assert!(matches!(
            filter.matches(&vec!["a"]),
            Err(TxtFilterError::Unresolved(_))
        ));
    }

    #[test]
    fn test_coercion_failure_is_an_error() {
        let mut template = FilterTemplate::new("count", 1usize, ValueType::Integer);
        template.add_comparison(">", Some(Value::Integer(1)));
        let filter = ActiveFilter::activate(&template, vec![], &registry()).unwrap();
        assert!(matches!(
            filter.evaluate("X"),
            Err(TxtFilterError::Coercion { .. })
        ));
    }

    #[test]
    fn test_display_shows_resolved_index() {
        let mut template = FilterTemplate::new("species", "SCIENTIFIC NAME", ValueType::Text);
        template.add_comparison("==", None);
        let mut filter =
            ActiveFilter::activate(&template, vec!["Periparus ater".into()], &registry()).unwrap();
        filter.resolve(Some(&["SCIENTIFIC NAME"][..])).unwrap();
        assert_eq!(
            filter.to_string(),
            "Filter 'species' on \"SCIENTIFIC NAME\" at column 0 (text):\n[1]: * == \"Periparus ater\""
        );
    }
}
