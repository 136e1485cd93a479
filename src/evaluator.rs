//! Row-at-a-time evaluation of a filter set.
//!
//! Each input row is pushed through every active filter before the next
//! row is read. Rows that pass come out unchanged and in input order; the
//! first source or evaluation error ends the sequence.

use crate::error::TxtFilterError;
use crate::filter_set::FilterSet;
use crate::record::Row;

/// Lazy sequence of passing rows.
///
/// Produced by [`FilterSet::evaluate`]. The input items are `Result`s so
/// that read failures of a record source surface in the same stream; for
/// infallible input map rows through `Ok::<_, Infallible>`.
pub struct Passing<'a, I> {
    filters: &'a FilterSet,
    rows: I,
    rows_read: usize,
    done: bool,
}

impl<'a, I> Passing<'a, I> {
    pub(crate) fn new(filters: &'a FilterSet, rows: I) -> Self {
        Self {
            filters,
            rows,
            rows_read: 0,
            done: false,
        }
    }

    /// Number of input rows pulled so far, passing or not.
    pub fn rows_read(&self) -> usize {
        self.rows_read
    }
}

impl<I, R, E> Iterator for Passing<'_, I>
where
    I: Iterator<Item = Result<R, E>>,
    R: Row,
    E: Into<TxtFilterError>,
{
    type Item = Result<R, TxtFilterError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            let row = match self.rows.next()? {
                Ok(row) => row,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e.into()));
                }
            };
            self.rows_read += 1;
            match self.filters.passes(&row) {
                Ok(true) => return Some(Ok(row)),
                Ok(false) => continue,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e.at_row(self.rows_read)));
                }
            }
        }
    }
}
