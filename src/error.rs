//! Error types for template definition, activation and row evaluation.

use std::convert::Infallible;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, TxtFilterError>;

/// Broad category of a [`TxtFilterError`].
///
/// Callers that only care about *what stage* failed can match on this
/// instead of the individual variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad template, comparison or definition-file content.
    Definition,
    /// Wrong number of values supplied to an activation.
    ActivationArity,
    /// No template registered under the requested name.
    UnknownFilter,
    /// A locator could not be mapped onto a physical column.
    ColumnResolution,
    /// The record source could not be opened or read.
    SourceUnavailable,
    /// A field could not be coerced to the filter's value type.
    RowEvaluation,
    /// The record sink failed to accept output.
    Output,
}

/// Errors produced by the filter engine and its record collaborators.
#[derive(Debug, Error)]
pub enum TxtFilterError {
    #[error("filter template '{0}' is already defined")]
    DuplicateTemplate(String),

    #[error("filter template '{name}': column must be a position when the input has no header")]
    HeaderRequired { name: String },

    #[error("filter template '{name}': column positions start at 1")]
    InvalidPosition { name: String },

    #[error("undefined operator: {0}")]
    UndefinedOperator(String),

    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error("invalid activation '{text}': {message}")]
    InvalidActivation { text: String, message: String },

    #[error("filter template '{filter}': invalid value {value:?}: {reason}")]
    InvalidValue {
        filter: String,
        value: String,
        reason: String,
    },

    #[error("filter '{name}' expects {expected} comparison value(s), got {supplied}")]
    Arity {
        name: String,
        expected: usize,
        supplied: usize,
    },

    #[error("no filter template named '{0}'")]
    UnknownFilter(String),

    #[error("can't find column header name: {0}")]
    UnknownColumn(String),

    #[error("filter '{0}' has not been resolved against a header")]
    Unresolved(String),

    #[error("filter '{filter}' reads column {index} but the row has {width} field(s)")]
    ColumnOutOfRange {
        filter: String,
        index: usize,
        width: usize,
    },

    #[error("filter '{filter}' can't coerce {value:?}: {reason}")]
    Coercion {
        filter: String,
        value: String,
        reason: String,
    },

    #[error("row {row}: {source}")]
    AtRow {
        row: usize,
        #[source]
        source: Box<TxtFilterError>,
    },

    #[error("can't open file '{}': {source}", .path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unsupported encoding: {0}")]
    UnsupportedEncoding(String),

    #[error("can't read record: {0}")]
    Read(#[source] csv::Error),

    #[error("can't write record: {0}")]
    Write(#[source] csv::Error),

    #[error("can't write output: {0}")]
    Io(#[from] io::Error),
}

impl TxtFilterError {
    /// The category this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DuplicateTemplate(_)
            | Self::HeaderRequired { .. }
            | Self::InvalidPosition { .. }
            | Self::UndefinedOperator(_)
            | Self::Syntax { .. }
            | Self::InvalidActivation { .. }
            | Self::InvalidValue { .. } => ErrorKind::Definition,
            Self::Arity { .. } => ErrorKind::ActivationArity,
            Self::UnknownFilter(_) => ErrorKind::UnknownFilter,
            Self::UnknownColumn(_) | Self::Unresolved(_) | Self::ColumnOutOfRange { .. } => {
                ErrorKind::ColumnResolution
            }
            Self::Coercion { .. } => ErrorKind::RowEvaluation,
            Self::AtRow { source, .. } => source.kind(),
            Self::SourceUnavailable { .. } | Self::UnsupportedEncoding(_) | Self::Read(_) => {
                ErrorKind::SourceUnavailable
            }
            Self::Write(_) | Self::Io(_) => ErrorKind::Output,
        }
    }

    /// Attach a 1-based data row number to a row-level error.
    pub(crate) fn at_row(self, row: usize) -> Self {
        Self::AtRow {
            row,
            source: Box::new(self),
        }
    }
}

impl From<Infallible> for TxtFilterError {
    fn from(never: Infallible) -> Self {
        match never {}
    }
}
