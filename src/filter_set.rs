//! The ordered, name-keyed collection of active filters.

use crate::error::Result;
use crate::evaluator::Passing;
use crate::filter::ActiveFilter;
use crate::record::Row;

/// Active filters combined row-wise with logical AND.
///
/// Iteration follows first-activation order. Activating a name that is
/// already present replaces that filter in place.
#[derive(Debug, Clone, Default)]
pub struct FilterSet {
    filters: Vec<ActiveFilter>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `filter`, returning the filter it replaced, if any.
    pub fn insert(&mut self, filter: ActiveFilter) -> Option<ActiveFilter> {
        match self.filters.iter_mut().find(|f| f.name() == filter.name()) {
            Some(slot) => Some(std::mem::replace(slot, filter)),
            None => {
                self.filters.push(filter);
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&ActiveFilter> {
        self.filters.iter().find(|f| f.name() == name)
    }

    pub fn remove(&mut self, name: &str) -> Option<ActiveFilter> {
        let pos = self.filters.iter().position(|f| f.name() == name)?;
        Some(self.filters.remove(pos))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActiveFilter> {
        self.filters.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.filters.iter().map(ActiveFilter::name).collect()
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Resolve every filter's column against the header of a new file.
    pub fn resolve_columns<S: AsRef<str>>(&mut self, header: Option<&[S]>) -> Result<()> {
        for filter in &mut self.filters {
            filter.resolve(header)?;
        }
        Ok(())
    }

    /// Does `row` pass every filter? An empty set passes everything.
    pub fn passes<R: Row + ?Sized>(&self, row: &R) -> Result<bool> {
        for filter in &self.filters {
            if !filter.matches(row)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Lazily yield the rows of `rows` that pass, in input order.
    pub fn evaluate<I>(&self, rows: I) -> Passing<'_, I::IntoIter>
    where
        I: IntoIterator,
    {
        Passing::new(self, rows.into_iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operator::OperatorRegistry;
    use crate::template::FilterTemplate;
    use crate::value::{Value, ValueType};

    fn active(name: &str, column: usize, op: &str, value: &str) -> ActiveFilter {
        let mut template = FilterTemplate::new(name, column, ValueType::Text);
        template.add_comparison(op, Some(Value::from(value)));
        let mut filter =
            ActiveFilter::activate(&template, vec![], &OperatorRegistry::default()).unwrap();
        filter.resolve::<&str>(None).unwrap();
        filter
    }

    #[test]
    fn test_empty_set_passes_everything() {
        let set = FilterSet::new();
        assert!(set.passes(&vec!["anything"]).unwrap());
        assert!(set.passes(&Vec::<String>::new()).unwrap());
    }

    #[test]
    fn test_and_composition() {
        let mut set = FilterSet::new();
        set.insert(active("first", 1, "==", "a"));
        set.insert(active("second", 2, "!=", "x"));

        assert!(set.passes(&vec!["a", "y"]).unwrap());
        assert!(!set.passes(&vec!["a", "x"]).unwrap());
        assert!(!set.passes(&vec!["b", "y"]).unwrap());
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut set = FilterSet::new();
        set.insert(active("species", 1, "==", "Periparus ater"));
        set.insert(active("breeding", 2, "!=", ""));
        let old = set.insert(active("species", 1, "==", "Turdus merula"));

        assert!(old.is_some());
        assert_eq!(set.len(), 2);
        assert_eq!(set.names(), vec!["species", "breeding"]);
        assert!(set.passes(&vec!["Turdus merula", "C4"]).unwrap());
        assert!(!set.passes(&vec!["Periparus ater", "C4"]).unwrap());
    }

    #[test]
    fn test_remove() {
        let mut set = FilterSet::new();
        set.insert(active("a", 1, "==", "a"));
        assert!(set.remove("a").is_some());
        assert!(set.remove("a").is_none());
        assert!(set.is_empty());
    }
}
