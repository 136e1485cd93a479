//! Filter templates: named, reusable, partially-specified column filters.
//!
//! A template names one logical column and lists comparisons against it.
//! Comparisons may leave their value open; those slots are filled by
//! position when the template is activated (see [`crate::filter`]).

use std::fmt;

use crate::value::{Value, ValueType};

/// Identifies a logical column before it is resolved against a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// A header field name.
    Header(String),
    /// A 1-based column position.
    Position(usize),
}

impl From<&str> for Locator {
    fn from(s: &str) -> Self {
        Locator::Header(s.to_string())
    }
}

impl From<String> for Locator {
    fn from(s: String) -> Self {
        Locator::Header(s)
    }
}

impl From<usize> for Locator {
    fn from(n: usize) -> Self {
        Locator::Position(n)
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Header(name) => write!(f, "{name:?}"),
            Locator::Position(n) => write!(f, "#{n}"),
        }
    }
}

/// The value side of a comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
    Bound(Value),
    /// Supplied at activation time.
    Unbound,
}

/// One `(operator, value)` test within a template.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    operator: String,
    slot: Slot,
}

impl Comparison {
    pub fn bound(operator: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            operator: operator.into(),
            slot: Slot::Bound(value.into()),
        }
    }

    pub fn unbound(operator: impl Into<String>) -> Self {
        Self {
            operator: operator.into(),
            slot: Slot::Unbound,
        }
    }

    pub fn operator(&self) -> &str {
        &self.operator
    }

    pub fn slot(&self) -> &Slot {
        &self.slot
    }

    pub fn value(&self) -> Option<&Value> {
        match &self.slot {
            Slot::Bound(v) => Some(v),
            Slot::Unbound => None,
        }
    }

    pub fn is_bound(&self) -> bool {
        matches!(self.slot, Slot::Bound(_))
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.slot {
            Slot::Bound(v) => write!(f, "* {} {v}", self.operator),
            Slot::Unbound => write!(f, "* {} undefined", self.operator),
        }
    }
}

/// A named, durable filter definition against one logical column.
///
/// Templates are never modified by activation; every activation builds a
/// fresh [`ActiveFilter`](crate::filter::ActiveFilter) from the template and
/// the supplied values.
#[derive(Debug, Clone)]
pub struct FilterTemplate {
    name: String,
    column: Locator,
    value_type: ValueType,
    comparisons: Vec<Comparison>,
}

impl FilterTemplate {
    pub fn new(name: impl Into<String>, column: impl Into<Locator>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            column: column.into(),
            value_type,
            comparisons: Vec::new(),
        }
    }

    /// Append a comparison. `None` leaves the value open for activation.
    pub fn add_comparison(&mut self, operator: impl Into<String>, value: Option<Value>) -> &mut Self {
        let comparison = match value {
            Some(v) => Comparison::bound(operator, v),
            None => Comparison::unbound(operator),
        };
        self.comparisons.push(comparison);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column(&self) -> &Locator {
        &self.column
    }

    pub fn value_type(&self) -> &ValueType {
        &self.value_type
    }

    /// Comparisons in declaration order.
    pub fn comparisons(&self) -> &[Comparison] {
        &self.comparisons
    }

    /// Number of slots an activation has to fill.
    pub fn unbound_count(&self) -> usize {
        self.comparisons.iter().filter(|c| !c.is_bound()).count()
    }
}

/// Shared listing used by both templates and active filters.
pub(crate) fn write_comparisons(f: &mut fmt::Formatter<'_>, comparisons: &[Comparison]) -> fmt::Result {
    if comparisons.is_empty() {
        return write!(f, "\nNo comparisons defined");
    }
    for (i, comparison) in comparisons.iter().enumerate() {
        write!(f, "\n[{}]: {comparison}", i + 1)?;
    }
    Ok(())
}

impl fmt::Display for FilterTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Filter '{}' on {} ({}):",
            self.name,
            self.column,
            self.value_type.name()
        )?;
        write_comparisons(f, &self.comparisons)
    }
}
