//! `mysqldump2csv` command line tool.
//!
//! ```bash
//! # One table, to stdout
//! mysqldump2csv dump.sql > page.csv
//!
//! # Every table into its own file
//! mysqldump2csv --multi --output-dir out/ dump.sql.gz
//!
//! # Tab separated, no header, from stdin
//! mysqldump2csv --delimiter '\t' --no-header --table page - < dump.sql
//! ```

use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use clap::Parser;
use clap::builder::NonEmptyStringValueParser;
use flate2::read::MultiGzDecoder;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use mysqldump2csv::{
    Config, Converter, DirectorySinks, Error, OutputMode, SharedSink, SinkProvider,
};

/// Convert MySQL dump files into CSV.
#[derive(Parser, Debug)]
#[command(
    name = "mysqldump2csv",
    version,
    about = "Convert MySQL dump files into CSV, without a database",
    long_about = "Reads the CREATE TABLE and INSERT statements of MySQL dump files and \
                  writes one line per inserted row.\n\n\
                  Inputs ending in .gz are decompressed; '-' reads standard input."
)]
struct Args {
    /// Dump files to read, in order
    #[arg(value_name = "INPUT", required = true)]
    inputs: Vec<PathBuf>,

    /// Report skipped statements and enable debug logging
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Field delimiter (\t, \n, \r and \\ are interpreted)
    #[arg(long, default_value = ",")]
    delimiter: String,

    /// Line terminator (\t, \n, \r and \\ are interpreted)
    #[arg(long, default_value = "\\n")]
    newline: String,

    /// Only convert rows of this table
    #[arg(long, value_name = "NAME")]
    table: Option<String>,

    /// Do not write a header line
    #[arg(long)]
    no_header: bool,

    /// Write every table to its own <table>.csv file
    #[arg(long)]
    multi: bool,

    /// Directory for --multi output files
    #[arg(long, value_name = "DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Text written for NULL values (\t, \n, \r and \\ are interpreted)
    #[arg(long, default_value = "NULL", value_parser = NonEmptyStringValueParser::new())]
    null: String,
}

fn main() {
    let args = Args::parse();
    init_logging(&args);
    std::process::exit(run(&args));
}

fn init_logging(args: &Args) {
    let level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn config_from(args: &Args) -> Result<Config, Error> {
    let mut config = Config::default()
        .with_delimiter(interpret_escapes(&args.delimiter))
        .with_terminator(interpret_escapes(&args.newline))
        .with_header(!args.no_header)
        .with_verbose(args.verbose)
        .with_null_sentinel(interpret_escapes(&args.null))?;
    if let Some(table) = &args.table {
        config = config.with_table_filter(table.as_str());
    }
    if args.multi {
        config = config.with_mode(OutputMode::Multi);
    }
    Ok(config)
}

fn run(args: &Args) -> i32 {
    let config = match config_from(args) {
        Ok(config) => config,
        Err(err) => {
            error!("{err}");
            return 1;
        }
    };
    match config.mode() {
        OutputMode::Single => convert_all(args, config, SharedSink::new(io::stdout().lock())),
        OutputMode::Multi => {
            if let Err(err) = fs::create_dir_all(&args.output_dir) {
                error!(dir = %args.output_dir.display(), "Failed to create output directory: {err}");
                return 1;
            }
            convert_all(args, config, DirectorySinks::new(&args.output_dir))
        }
    }
}

/// Convert every input in order, stopping at the first failure. The outputs
/// are released either way.
fn convert_all<P: SinkProvider>(args: &Args, config: Config, provider: P) -> i32 {
    let mut converter = Converter::new(config, provider);
    let mut exit_code = 0;
    for path in &args.inputs {
        let input = match open_input(path) {
            Ok(input) => input,
            Err(err) => {
                error!(input = %path.display(), "Failed to open input: {err}");
                exit_code = 1;
                break;
            }
        };
        info!(input = %path.display(), "Processing input");
        if let Err(err) = converter.convert(input) {
            error!(input = %path.display(), "{err}");
            exit_code = 1;
            break;
        }
    }
    if let Err(err) = converter.finish() {
        error!("{err}");
        exit_code = 1;
    }
    exit_code
}

fn open_input(path: &Path) -> io::Result<Box<dyn Read>> {
    if path.as_os_str() == "-" {
        return Ok(Box::new(io::stdin().lock()));
    }
    let file = File::open(path)?;
    if path.extension().is_some_and(|ext| ext == "gz") {
        Ok(Box::new(MultiGzDecoder::new(BufReader::new(file))))
    } else {
        Ok(Box::new(file))
    }
}

/// Replace `\t`, `\n`, `\r` and `\\` with the characters they name.
fn interpret_escapes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
