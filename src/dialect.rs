//! Delimited-text dialect parameters passed through to the record reader
//! and writer.

use std::fmt;
use std::str::FromStr;

/// When the writer quotes fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Quoting {
    #[default]
    Minimal,
    All,
    NonNumeric,
    Never,
}

/// Record terminator used on output. Input accepts either.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Terminator {
    #[default]
    Crlf,
    Lf,
}

/// Field delimiter, quoting and encoding of a delimited text file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dialect {
    pub delimiter: u8,
    pub quote: u8,
    pub escape: Option<u8>,
    pub double_quote: bool,
    pub quoting: Quoting,
    pub terminator: Terminator,
    pub encoding: String,
}

impl Default for Dialect {
    fn default() -> Self {
        Self::excel()
    }
}

impl Dialect {
    /// Comma separated, minimal quoting, CRLF.
    pub fn excel() -> Self {
        Self {
            delimiter: b',',
            quote: b'"',
            escape: None,
            double_quote: true,
            quoting: Quoting::Minimal,
            terminator: Terminator::Crlf,
            encoding: "utf-8".to_string(),
        }
    }

    /// Tab separated, otherwise like [`excel`](Self::excel).
    pub fn excel_tab() -> Self {
        Self {
            delimiter: b'\t',
            ..Self::excel()
        }
    }

    /// Comma separated, every field quoted, LF.
    pub fn unix() -> Self {
        Self {
            quoting: Quoting::All,
            terminator: Terminator::Lf,
            ..Self::excel()
        }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = encoding.into();
        self
    }

    /// Whether the bundled reader can decode this dialect's encoding.
    pub fn is_utf8(&self) -> bool {
        matches!(
            self.encoding.to_ascii_lowercase().as_str(),
            "utf-8" | "utf8" | "ascii" | "us-ascii"
        )
    }

    pub(crate) fn reader_builder(&self, has_header: bool) -> csv::ReaderBuilder {
        let mut builder = csv::ReaderBuilder::new();
        builder
            .delimiter(self.delimiter)
            .quote(self.quote)
            .escape(self.escape)
            .double_quote(self.double_quote)
            .quoting(self.quoting != Quoting::Never)
            .has_headers(has_header)
            .flexible(true);
        builder
    }

    pub(crate) fn writer_builder(&self) -> csv::WriterBuilder {
        let mut builder = csv::WriterBuilder::new();
        builder
            .delimiter(self.delimiter)
            .quote(self.quote)
            .double_quote(self.double_quote)
            .quote_style(match self.quoting {
                Quoting::Minimal => csv::QuoteStyle::Necessary,
                Quoting::All => csv::QuoteStyle::Always,
                Quoting::NonNumeric => csv::QuoteStyle::NonNumeric,
                Quoting::Never => csv::QuoteStyle::Never,
            })
            .terminator(match self.terminator {
                Terminator::Crlf => csv::Terminator::CRLF,
                Terminator::Lf => csv::Terminator::Any(b'\n'),
            })
            .has_headers(false)
            .flexible(true);
        if let Some(escape) = self.escape {
            builder.escape(escape);
        }
        builder
    }
}

impl FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "excel" | "csv" => Ok(Self::excel()),
            "excel-tab" | "tsv" | "tab" => Ok(Self::excel_tab()),
            "unix" => Ok(Self::unix()),
            other => Err(format!(
                "Unknown dialect: {other} (try excel, excel-tab or unix)"
            )),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "delimiter={:?} quote={:?} encoding={}",
            self.delimiter as char, self.quote as char, self.encoding
        )
    }
}
