//! CLI tool to filter a delimited text file with a definition file.
//!
//! Usage:
//!   txtfilter <filters.def> <input.tsv> --header --dialect excel-tab
//!   txtfilter <filters.def> <input.tsv> --use 'species "Periparus ater"' -o out.tsv
//!
//! If no output file is specified, writes to stdout.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process;

use clap::{Parser, ValueEnum};
use tracing::Level;
use txtfilter_rs::{Dialect, Engine, TxtFilterError, dsl};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

/// Filter rows of a CSV/TSV file by declarative column comparisons.
#[derive(Debug, Parser)]
#[command(name = "txtfilter", version)]
struct Args {
    /// Filter definition file
    definitions: PathBuf,

    /// Input file
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// The first row of the input is a header
    #[arg(long)]
    header: bool,

    /// Dialect preset: excel, excel-tab or unix
    #[arg(long, default_value = "excel")]
    dialect: Dialect,

    /// Override the dialect's field delimiter (a single byte, or `\t`)
    #[arg(long, value_parser = parse_delimiter)]
    delimiter: Option<u8>,

    /// Input encoding
    #[arg(long, default_value = "utf-8")]
    encoding: String,

    /// Activate a template: 'NAME [VALUE ...]' (repeatable)
    #[arg(long = "use", value_name = "ACTIVATION")]
    activations: Vec<String>,

    /// Print the active filters and exit
    #[arg(long)]
    list: bool,

    #[arg(long, value_enum, default_value = "warn")]
    log_level: LogLevel,
}

fn parse_delimiter(s: &str) -> Result<u8, String> {
    match s {
        "\\t" => Ok(b'\t'),
        _ => match s.as_bytes() {
            [byte] => Ok(*byte),
            _ => Err(format!("delimiter must be a single-byte character, got {s:?}")),
        },
    }
}

fn init_logging(level: LogLevel) {
    // stderr keeps stdout clean for filtered output
    tracing_subscriber::fmt()
        .with_max_level(Level::from(level))
        .with_writer(io::stderr)
        .init();
}

fn build_engine(args: &Args) -> Result<Engine, TxtFilterError> {
    let mut dialect = args.dialect.clone().with_encoding(&args.encoding);
    if let Some(delimiter) = args.delimiter {
        dialect = dialect.with_delimiter(delimiter);
    }

    let mut engine = Engine::new("txtfilter", args.header).with_dialect(dialect);
    engine.define_operator("!in", |container, item| !container.contains(item), true);

    let definitions = fs::read_to_string(&args.definitions).map_err(|source| {
        TxtFilterError::SourceUnavailable {
            path: args.definitions.clone(),
            source,
        }
    })?;
    engine.load_definitions(&definitions)?;

    for activation in &args.activations {
        let statement = dsl::parse_use(activation)?;
        dsl::apply(&mut engine, std::slice::from_ref(&statement))?;
    }

    Ok(engine)
}

fn run(args: &Args) -> Result<(), TxtFilterError> {
    let mut engine = build_engine(args)?;

    if args.list {
        println!("{}", engine.describe_filters());
        return Ok(());
    }

    let summary = match &args.output {
        Some(out_path) => {
            if let Some(parent) = out_path.parent()
                && !parent.as_os_str().is_empty()
            {
                fs::create_dir_all(parent)?;
            }
            let out = BufWriter::new(File::create(out_path)?);
            engine.process_file(&args.input, out)?
        }
        None => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            let summary = engine.process_file(&args.input, &mut out)?;
            out.flush()?;
            summary
        }
    };

    eprintln!(
        "Processed {} -> {} rows",
        summary.rows_read, summary.rows_written
    );
    Ok(())
}

fn main() {
    let args = Args::parse();
    init_logging(args.log_level);

    if let Err(e) = run(&args) {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
