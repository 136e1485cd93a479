//! Field access over the row shapes the engine accepts.

/// An ordered sequence of string fields.
pub trait Row {
    /// The field at a 0-based physical index.
    fn field(&self, index: usize) -> Option<&str>;

    /// Number of fields in the row.
    fn width(&self) -> usize;
}

impl<S: AsRef<str>> Row for [S] {
    fn field(&self, index: usize) -> Option<&str> {
        self.get(index).map(|s| s.as_ref())
    }

    fn width(&self) -> usize {
        self.len()
    }
}

impl<S: AsRef<str>> Row for Vec<S> {
    fn field(&self, index: usize) -> Option<&str> {
        self.as_slice().field(index)
    }

    fn width(&self) -> usize {
        self.len()
    }
}

impl Row for csv::StringRecord {
    fn field(&self, index: usize) -> Option<&str> {
        self.get(index)
    }

    fn width(&self) -> usize {
        self.len()
    }
}

impl<R: Row + ?Sized> Row for &R {
    fn field(&self, index: usize) -> Option<&str> {
        (**self).field(index)
    }

    fn width(&self) -> usize {
        (**self).width()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec_row() {
        let row = vec!["a".to_string(), "b".to_string()];
        assert_eq!(row.field(1), Some("b"));
        assert_eq!(row.field(2), None);
        assert_eq!(row.width(), 2);
    }

    #[test]
    fn test_string_record_row() {
        let record = csv::StringRecord::from(vec!["x", "y", "z"]);
        assert_eq!(record.field(0), Some("x"));
        assert_eq!(Row::width(&record), 3);
    }

    #[test]
    fn test_slice_of_str() {
        let fields: &[&str] = &["only"];
        assert_eq!(fields.field(0), Some("only"));
    }
}
