//! CSV-backed record source and sink.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use csv::StringRecord;

use crate::dialect::Dialect;
use crate::error::{Result, TxtFilterError};

/// Reads an optional header followed by data rows.
pub struct RecordSource<R: Read> {
    reader: csv::Reader<R>,
    header: Option<Vec<String>>,
}

impl RecordSource<File> {
    /// Open `path` for reading with `dialect`.
    pub fn open(path: impl AsRef<Path>, dialect: &Dialect, has_header: bool) -> Result<Self> {
        let path = path.as_ref();
        check_encoding(dialect)?;
        let file = File::open(path).map_err(|source| TxtFilterError::SourceUnavailable {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(file, dialect, has_header)
    }
}

impl<R: Read> RecordSource<R> {
    /// Wrap any reader. The header, if expected, is read immediately.
    pub fn from_reader(reader: R, dialect: &Dialect, has_header: bool) -> Result<Self> {
        check_encoding(dialect)?;
        let mut reader = dialect.reader_builder(has_header).from_reader(reader);
        let header = if has_header {
            let fields = reader.headers().map_err(TxtFilterError::Read)?;
            Some(fields.iter().map(str::to_string).collect())
        } else {
            None
        };
        Ok(Self { reader, header })
    }

    pub fn header(&self) -> Option<&[String]> {
        self.header.as_deref()
    }

    /// Data rows in file order.
    pub fn records(&mut self) -> impl Iterator<Item = Result<StringRecord>> + '_ {
        self.reader
            .records()
            .map(|r| r.map_err(TxtFilterError::Read))
    }

    /// Split into the header and an owning row iterator.
    pub fn into_parts(self) -> (Option<Vec<String>>, Records<R>) {
        (
            self.header,
            Records {
                inner: self.reader.into_records(),
            },
        )
    }
}

/// Owning iterator over the data rows of a [`RecordSource`].
pub struct Records<R: Read> {
    inner: csv::StringRecordsIntoIter<R>,
}

impl<R: Read> Iterator for Records<R> {
    type Item = Result<StringRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .next()
            .map(|r| r.map_err(TxtFilterError::Read))
    }
}

fn check_encoding(dialect: &Dialect) -> Result<()> {
    if dialect.is_utf8() {
        Ok(())
    } else {
        Err(TxtFilterError::UnsupportedEncoding(dialect.encoding.clone()))
    }
}

/// Writes a header and passing rows in the same dialect as the input.
pub struct RecordSink<W: Write> {
    writer: csv::Writer<W>,
    rows_written: usize,
}

impl<W: Write> RecordSink<W> {
    pub fn new(writer: W, dialect: &Dialect) -> Self {
        Self {
            writer: dialect.writer_builder().from_writer(writer),
            rows_written: 0,
        }
    }

    /// Echo the header unchanged.
    pub fn write_header<S: AsRef<str>>(&mut self, header: &[S]) -> Result<()> {
        self.writer
            .write_record(header.iter().map(|f| f.as_ref()))
            .map_err(TxtFilterError::Write)
    }

    pub fn write_row<I, T>(&mut self, row: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        self.writer.write_record(row).map_err(TxtFilterError::Write)?;
        self.rows_written += 1;
        Ok(())
    }

    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    /// Flush and return the underlying writer.
    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| TxtFilterError::Io(e.into_error()))
    }
}
