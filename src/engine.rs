//! The filter engine: templates, active filters and per-file processing.
//!
//! ```
//! use txtfilter_rs::{Engine, Value, ValueType};
//!
//! let mut engine = Engine::new("ebird", true);
//! engine.define_operator("!in", |codes, code| !codes.contains(code), true);
//! engine
//!     .create_template("breeding", "BREEDING BIRD ATLAS CODE", ValueType::Text)?
//!     .add_comparison("!in", Some(Value::from(vec!["", "F"])));
//! engine
//!     .create_template("species", "SCIENTIFIC NAME", ValueType::Text)?
//!     .add_comparison("==", None);
//!
//! engine.activate("breeding", vec![])?;
//! engine.activate("species", vec!["Periparus ater".into()])?;
//!
//! let header = ["SCIENTIFIC NAME", "BREEDING BIRD ATLAS CODE"];
//! let rows = vec![
//!     vec!["Periparus ater", "C4"],
//!     vec!["Periparus ater", "F"],
//!     vec!["Turdus merula", "C4"],
//! ];
//! let passed = engine.process_rows(Some(&header[..]), rows)?;
//! assert_eq!(passed, vec![vec!["Periparus ater", "C4"]]);
//! # Ok::<(), txtfilter_rs::TxtFilterError>(())
//! ```

use std::collections::HashMap;
use std::convert::Infallible;
use std::io::{Read, Write};
use std::path::Path;

use tracing::{debug, info};

use crate::dialect::Dialect;
use crate::dsl;
use crate::error::{Result, TxtFilterError};
use crate::evaluator::Passing;
use crate::filter::ActiveFilter;
use crate::filter_set::FilterSet;
use crate::io::{RecordSink, RecordSource};
use crate::operator::OperatorRegistry;
use crate::record::Row;
use crate::template::{FilterTemplate, Locator};
use crate::value::{Value, ValueType};

/// Row counts of one processed file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProcessSummary {
    pub rows_read: usize,
    pub rows_written: usize,
}

/// Owns the operator registry, the templates and the active filter set.
#[derive(Debug)]
pub struct Engine {
    name: String,
    has_header: bool,
    dialect: Dialect,
    operators: OperatorRegistry,
    templates: HashMap<String, FilterTemplate>,
    filters: FilterSet,
}

impl Engine {
    pub fn new(name: impl Into<String>, has_header: bool) -> Self {
        Self {
            name: name.into(),
            has_header,
            dialect: Dialect::default(),
            operators: OperatorRegistry::with_builtins(),
            templates: HashMap::new(),
            filters: FilterSet::new(),
        }
    }

    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn has_header(&self) -> bool {
        self.has_header
    }

    pub fn dialect(&self) -> &Dialect {
        &self.dialect
    }

    pub fn operators(&self) -> &OperatorRegistry {
        &self.operators
    }

    /// Register or overwrite an operator for this engine only.
    pub fn define_operator<F>(&mut self, symbol: impl Into<String>, predicate: F, reversed: bool)
    where
        F: Fn(&Value, &Value) -> bool + Send + Sync + 'static,
    {
        self.operators.register(symbol, predicate, reversed);
    }

    /// Register a new template and return it for adding comparisons.
    pub fn create_template(
        &mut self,
        name: impl Into<String>,
        column: impl Into<Locator>,
        value_type: ValueType,
    ) -> Result<&mut FilterTemplate> {
        self.insert_template(FilterTemplate::new(name, column, value_type))
    }

    /// Register a template built elsewhere. Nothing is registered on error.
    pub fn insert_template(&mut self, template: FilterTemplate) -> Result<&mut FilterTemplate> {
        let name = template.name().to_string();
        if self.templates.contains_key(&name) {
            return Err(TxtFilterError::DuplicateTemplate(name));
        }
        match template.column() {
            Locator::Header(_) if !self.has_header => {
                return Err(TxtFilterError::HeaderRequired { name });
            }
            Locator::Position(0) => return Err(TxtFilterError::InvalidPosition { name }),
            _ => {}
        }
        debug!(engine = %self.name, template = %name, column = %template.column(), "created template");
        Ok(self.templates.entry(name).or_insert(template))
    }

    pub fn template(&self, name: &str) -> Result<&FilterTemplate> {
        self.templates
            .get(name)
            .ok_or_else(|| TxtFilterError::UnknownFilter(name.to_string()))
    }

    /// Build an active filter from template `name` and put it in the set,
    /// replacing any earlier activation of the same name.
    ///
    /// On error the filter set is left as it was.
    pub fn activate(&mut self, name: &str, values: Vec<Value>) -> Result<&ActiveFilter> {
        let template = self.template(name)?;
        let filter = ActiveFilter::activate(template, values, &self.operators)?;
        if self.filters.insert(filter).is_some() {
            debug!(engine = %self.name, filter = name, "replaced active filter");
        }
        self.active(name)
    }

    pub fn deactivate(&mut self, name: &str) -> Result<ActiveFilter> {
        self.filters
            .remove(name)
            .ok_or_else(|| TxtFilterError::UnknownFilter(name.to_string()))
    }

    pub fn active(&self, name: &str) -> Result<&ActiveFilter> {
        self.filters
            .get(name)
            .ok_or_else(|| TxtFilterError::UnknownFilter(name.to_string()))
    }

    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    /// Parse a definition text and apply its templates and activations.
    pub fn load_definitions(&mut self, text: &str) -> Result<()> {
        let statements = dsl::parse_definitions(text)?;
        dsl::apply(self, &statements)
    }

    /// Render a filter for inspection; the active filter if there is one,
    /// otherwise the template.
    pub fn describe(&self, name: &str) -> Result<String> {
        match self.filters.get(name) {
            Some(filter) => Ok(filter.to_string()),
            None => self.template(name).map(ToString::to_string),
        }
    }

    /// Numbered listing of the active filters.
    pub fn describe_filters(&self) -> String {
        if self.filters.is_empty() {
            return "No active filters".to_string();
        }
        self.filters
            .iter()
            .enumerate()
            .map(|(i, f)| format!("{}. {f}", i + 1))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Resolve every active filter against the header of a new file.
    pub fn resolve_columns<S: AsRef<str>>(&mut self, header: Option<&[S]>) -> Result<&FilterSet> {
        self.filters.resolve_columns(header)?;
        Ok(&self.filters)
    }

    /// Resolve columns, then lazily filter `rows`.
    ///
    /// Column resolution failures are returned before any row is read.
    pub fn process<S, I, R, E>(
        &mut self,
        header: Option<&[S]>,
        rows: I,
    ) -> Result<Passing<'_, I::IntoIter>>
    where
        S: AsRef<str>,
        I: IntoIterator<Item = std::result::Result<R, E>>,
        R: Row,
        E: Into<TxtFilterError>,
    {
        let filters = self.resolve_columns(header)?;
        Ok(filters.evaluate(rows))
    }

    /// Eager variant of [`process`](Self::process) for in-memory rows.
    pub fn process_rows<S, R>(
        &mut self,
        header: Option<&[S]>,
        rows: impl IntoIterator<Item = R>,
    ) -> Result<Vec<R>>
    where
        S: AsRef<str>,
        R: Row,
    {
        self.process(header, rows.into_iter().map(Ok::<R, Infallible>))?
            .collect()
    }

    /// Filter the file at `path` into `out`, echoing the header.
    pub fn process_file<W: Write>(&mut self, path: impl AsRef<Path>, out: W) -> Result<ProcessSummary> {
        let path = path.as_ref();
        let source = RecordSource::open(path, &self.dialect, self.has_header)?;
        let summary = self.run(source, out)?;
        info!(
            engine = %self.name,
            path = %path.display(),
            rows_read = summary.rows_read,
            rows_written = summary.rows_written,
            "processed file"
        );
        Ok(summary)
    }

    /// Like [`process_file`](Self::process_file) for an already open reader.
    pub fn process_reader<R: Read, W: Write>(&mut self, input: R, out: W) -> Result<ProcessSummary> {
        let source = RecordSource::from_reader(input, &self.dialect, self.has_header)?;
        self.run(source, out)
    }

    fn run<R: Read, W: Write>(&mut self, source: RecordSource<R>, out: W) -> Result<ProcessSummary> {
        let (header, records) = source.into_parts();
        let mut sink = RecordSink::new(out, &self.dialect);
        let filters = self.resolve_columns(header.as_deref())?;
        // an empty input has a zero-field header; nothing to echo
        if let Some(header) = &header
            && !header.is_empty()
        {
            sink.write_header(header)?;
        }

        let mut passing = filters.evaluate(records);
        for row in passing.by_ref() {
            sink.write_row(&row?)?;
        }
        let summary = ProcessSummary {
            rows_read: passing.rows_read(),
            rows_written: sink.rows_written(),
        };
        sink.flush()?;
        Ok(summary)
    }
}
