use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use rowscope_model::RecordKind;
use rowscope_reader::source::{CsvSource, CsvSourceOptions};
use rowscope_reader::{
    Dataset, DatasetOptions, Filter, FilterExpr, ReadOptions, UniqueValuesOptions,
    DEFAULT_BUFFER_LENGTH,
};
use serde::Serialize;

#[derive(Debug, Parser)]
#[command(name = "rowscope")]
#[command(about = "Inspect, page through and summarize delimited datasets as JSON.")]
struct Cli {
    #[command(flatten)]
    source: SourceArgs,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct SourceArgs {
    /// Field delimiter (a single ASCII character).
    #[arg(long, default_value_t = ',', global = true)]
    delimiter: char,

    /// Text encoding label (e.g. `utf-8`, `latin1`).
    #[arg(long, default_value = "utf-8", global = true)]
    encoding: String,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print dataset metadata.
    Metadata {
        input: PathBuf,
    },
    /// Print a range of rows, optionally filtered.
    Data(DataArgs),
    /// Print distinct values per column.
    Unique(UniqueArgs),
}

#[derive(Debug, Args)]
struct DataArgs {
    input: PathBuf,

    #[arg(long, default_value_t = 0)]
    start: usize,

    /// Maximum rows to print. Omit for every remaining row.
    #[arg(long)]
    length: Option<usize>,

    /// Comma-separated column names (case-insensitive).
    #[arg(long, value_delimiter = ',')]
    columns: Vec<String>,

    /// Emit rows as objects keyed by column name.
    #[arg(long)]
    object: bool,

    /// Filter expression as JSON, e.g. `{"kind":"cmp","column":"AGE","op":"gt","value":13}`.
    #[arg(long)]
    filter: Option<String>,

    /// Grow the scan window from the observed match rate.
    #[arg(long)]
    dynamic_length: bool,
}

#[derive(Debug, Args)]
struct UniqueArgs {
    input: PathBuf,

    #[arg(long, value_delimiter = ',', required = true)]
    columns: Vec<String>,

    /// Distinct values kept per column; 0 keeps all.
    #[arg(long, default_value_t = 0)]
    limit: usize,

    /// Include occurrence counts.
    #[arg(long)]
    count: bool,

    /// Keep first-seen order.
    #[arg(long)]
    no_sort: bool,

    #[arg(long, default_value_t = DEFAULT_BUFFER_LENGTH)]
    buffer_length: usize,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(err) = run(cli) {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let source = csv_source(&cli.source)?;
    match cli.command {
        Command::Metadata { input } => {
            let dataset = open(&input, source)?;
            emit(&*dataset.metadata()?)
        }
        Command::Data(args) => {
            let dataset = open(&args.input, source)?;
            let mut options = ReadOptions::new()
                .with_start(args.start)
                .with_columns(args.columns)
                .with_dynamic_length(args.dynamic_length);
            if let Some(length) = args.length {
                options = options.with_length(length);
            }
            if args.object {
                options = options.with_kind(RecordKind::Object);
            }
            if let Some(json) = &args.filter {
                let expr: FilterExpr =
                    serde_json::from_str(json).context("failed to parse --filter")?;
                let metadata = dataset.metadata()?;
                options = options.with_filter(Filter::compile(&expr, &metadata)?);
            }
            log::debug!("reading {} with {options:?}", args.input.display());
            emit(&dataset.get_data(&options)?)
        }
        Command::Unique(args) => {
            let dataset = open(&args.input, source)?;
            let options = UniqueValuesOptions::new(args.columns)
                .with_limit(args.limit)
                .with_add_count(args.count)
                .with_sort(!args.no_sort)
                .with_buffer_length(args.buffer_length);
            emit(&dataset.get_unique_values(&options)?)
        }
    }
}

fn csv_source(args: &SourceArgs) -> Result<CsvSource> {
    if !args.delimiter.is_ascii() {
        bail!("delimiter must be a single ASCII character, got {:?}", args.delimiter);
    }
    let options = CsvSourceOptions {
        delimiter: args.delimiter as u8,
        ..CsvSourceOptions::default()
    }
    .with_encoding_label(&args.encoding)?;
    Ok(CsvSource::new(options))
}

fn open(path: &Path, source: CsvSource) -> Result<Dataset<CsvSource>> {
    Dataset::open(path, source, DatasetOptions { check_exists: true })
        .with_context(|| format!("failed to open {}", path.display()))
}

/// Pretty JSON on stdout. A closed pipe ends output quietly.
fn emit<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let written = serde_json::to_writer_pretty(&mut out, value)
        .map_err(io::Error::from)
        .and_then(|()| writeln!(out))
        .and_then(|()| out.flush());
    match written {
        Err(err) if err.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        other => Ok(other?),
    }
}
