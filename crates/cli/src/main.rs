// Tabmerge CLI - merge two spreadsheets on a common key column

mod exit_codes;
mod serve;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tabmerge_core::{merge, MergeError};
use tabmerge_io::xlsx;
use tracing_subscriber::EnvFilter;

use exit_codes::{EXIT_IO, EXIT_KEY_COLUMN, EXIT_NO_MATCH, EXIT_SUCCESS};

#[derive(Parser)]
#[command(name = "tabmerge")]
#[command(about = "Merge two spreadsheets on a normalized key column")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge two spreadsheet files on their key columns
    #[command(after_help = "\
Examples:
  tabmerge merge clientes.xlsx vendas.xlsx --key1 Cidade --key2 Cidade
  tabmerge merge a.xlsx b.xlsx --key1 City --key2 Town -o merged.xlsx --json")]
    Merge {
        /// First spreadsheet (xlsx, xls or ods)
        first: PathBuf,

        /// Second spreadsheet; its keys restrict both tables
        second: PathBuf,

        /// Key column name in the first file
        #[arg(long)]
        key1: String,

        /// Key column name in the second file
        #[arg(long)]
        key2: String,

        /// Output file
        #[arg(long, short = 'o', default_value = tabmerge_io::OUTPUT_FILE_NAME)]
        output: PathBuf,

        /// Print the run summary as JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Start the web upload front end
    #[command(after_help = "\
Examples:
  tabmerge serve
  tabmerge serve --listen 0.0.0.0:8080")]
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1:8080")]
        listen: String,
    },
}

pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_IO, message: msg.into(), hint: None }
    }

    /// Create error from a merge error with proper exit code.
    pub fn merge(err: MergeError) -> Self {
        let code = match &err {
            MergeError::MissingColumn { .. } | MergeError::ReservedColumn { .. } => EXIT_KEY_COLUMN,
            MergeError::EmptyResult => EXIT_NO_MATCH,
        };
        let hint = match &err {
            MergeError::MissingColumn { .. } => {
                Some("column names are matched exactly against the header row".to_string())
            }
            MergeError::EmptyResult => {
                Some("no key of the first file appears in the second file".to_string())
            }
            _ => None,
        };
        Self { code, message: err.to_string(), hint }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Merge { first, second, key1, key2, output, json } => {
            cmd_merge(first, second, &key1, &key2, output, json)
        }
        Commands::Serve { listen } => serve::cmd_serve(&listen),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(err) => {
            eprintln!("error: {}", err.message);
            if let Some(hint) = err.hint {
                eprintln!("hint: {hint}");
            }
            ExitCode::from(err.code)
        }
    }
}

fn cmd_merge(
    first: PathBuf,
    second: PathBuf,
    key1: &str,
    key2: &str,
    output: PathBuf,
    json: bool,
) -> Result<(), CliError> {
    let table1 = xlsx::read_table(&first).map_err(CliError::io)?;
    tracing::info!(file = %first.display(), rows = table1.row_count(), "loaded first table");
    let table2 = xlsx::read_table(&second).map_err(CliError::io)?;
    tracing::info!(file = %second.display(), rows = table2.row_count(), "loaded second table");

    let merged = merge(table1, table2, key1, key2).map_err(CliError::merge)?;
    xlsx::write_table(&merged.table, &output).map_err(CliError::io)?;

    let summary = &merged.summary;
    if json {
        let rendered = serde_json::to_string_pretty(summary).map_err(|e| CliError::io(e.to_string()))?;
        println!("{rendered}");
    } else {
        println!(
            "matched {} of {} rows from the first file against {} of {} rows from the second",
            summary.first_rows_matched, summary.first_rows,
            summary.second_rows_matched, summary.second_rows,
        );
        println!(
            "{} common keys, {} result rows -> {}",
            summary.common_keys, summary.result_rows, output.display(),
        );
    }
    Ok(())
}
