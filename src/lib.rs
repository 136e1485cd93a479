//! # txtfilter-rs
//!
//! Declarative row filters for delimited text files (CSV/TSV).
//!
//! ## Overview
//!
//! Filtering is set up in two steps:
//! - **Templates**: named filters against one column (header name or 1-based
//!   position), each with a list of comparisons. A comparison may leave its
//!   value open.
//! - **Activation**: a template is turned into an active filter by supplying
//!   the open values in declaration order. Templates stay untouched, so the
//!   same template can be activated again with other values.
//!
//! Rows pass when every comparison of every active filter holds for the
//! field in that filter's column.
//!
//! ## Example
//!
//! ```
//! use txtfilter_rs::{Engine, Value, ValueType};
//!
//! let mut engine = Engine::new("staff", true);
//! engine
//!     .create_template("salary", "SALARY", ValueType::Integer)?
//!     .add_comparison(">=", None)
//!     .add_comparison("<", None);
//! engine.activate("salary", vec![Value::Integer(50_000), Value::Integer(70_000)])?;
//!
//! let header = ["NAME", "SALARY"];
//! let rows = vec![
//!     vec!["SMITH", "50000"],
//!     vec!["JONES", "75000"],
//!     vec!["DOE", "60000"],
//! ];
//! let passed = engine.process_rows(Some(&header[..]), rows)?;
//! assert_eq!(passed.len(), 2);
//! # Ok::<(), txtfilter_rs::TxtFilterError>(())
//! ```

pub mod dialect;
pub mod dsl;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod filter;
pub mod filter_set;
pub mod io;
pub mod operator;
pub mod record;
pub mod template;
pub mod value;

pub use dialect::{Dialect, Quoting, Terminator};
pub use dsl::{Literal, Statement, parse_definitions, parse_use};
pub use engine::{Engine, ProcessSummary};
pub use error::{ErrorKind, Result, TxtFilterError};
pub use evaluator::Passing;
pub use filter::ActiveFilter;
pub use filter_set::FilterSet;
pub use io::{RecordSink, RecordSource};
pub use operator::{Operator, OperatorRegistry};
pub use record::Row;
pub use template::{Comparison, FilterTemplate, Locator, Slot};
pub use value::{Value, ValueType};
