//! flatql: SQL over flat files and remote databases.
//!
//! # Commands
//!
//! - `query`: load CSV/TSV/LTSV files (local, HTTP or S3, optionally
//!   compressed) into an in-memory engine and run one statement.
//! - `remote`: run one statement on a connection from the config file.
//! - `tables`: list tables and their columns.
//! - `ddl`: describe the columns of one table.

use clap::{ArgGroup, Args, Parser, Subcommand};
use dotenv::dotenv;
use flatql_common::config::AppConfig;
use flatql_common::telemetry;
use owo_colors::OwoColorize;

mod commands;
mod exit_codes;
mod output;

use commands::Source;
use output::OutputFormat;

#[derive(Parser)]
#[command(name = "flatql", version)]
#[command(about = "Run SQL against CSV/TSV/LTSV files and remote databases", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (human, json, yaml)
    #[arg(long, global = true, value_enum, default_value = "human")]
    output: OutputFormat,

    /// Path to the configuration file
    #[arg(long, global = true, env = "FLATQL_CONFIG", default_value = "flatql.yaml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Load files into an in-memory database and run a statement
    Query {
        /// Source file (path, file://, http(s):// or s3:// URL); repeatable
        #[arg(long = "file", short = 'f', required = true)]
        files: Vec<String>,
        /// The SQL statement
        sql: String,
        /// Write the query result to this file instead of printing it
        #[arg(long)]
        export: Option<String>,
    },
    /// Run a statement on a configured connection
    Remote {
        /// Connection name from the configuration file
        #[arg(long, short = 'c')]
        connection: String,
        /// The SQL statement
        sql: String,
    },
    /// List tables and their columns
    Tables {
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Describe the columns of a table
    Ddl {
        /// The table name
        table: String,
        #[command(flatten)]
        source: SourceArgs,
    },
}

#[derive(Args)]
#[command(group(ArgGroup::new("source").required(true).args(["connection", "files"])))]
struct SourceArgs {
    /// Connection name from the configuration file
    #[arg(long, short = 'c')]
    connection: Option<String>,
    /// Source file to load; repeatable
    #[arg(long = "file", short = 'f')]
    files: Vec<String>,
}

impl SourceArgs {
    fn source(&self) -> Source<'_> {
        match &self.connection {
            Some(name) => Source::Connection(name),
            None => Source::Files(&self.files),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    dotenv().ok();

    let cli = Cli::parse();

    let result = match AppConfig::from_file(&cli.config) {
        Ok(config) => match telemetry::init_logging(&config.logging) {
            Ok(()) => run_cli(&cli, &config).await,
            Err(e) => Err(e),
        },
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        let exit_code = exit_codes::for_error(&e);
        if cli.output.is_machine_readable() {
            output::print_error(cli.output, &e, exit_code).ok();
        } else {
            eprintln!("{} {}", "Error:".red().bold(), e);
        }
        std::process::exit(exit_code);
    }

    Ok(())
}

async fn run_cli(cli: &Cli, config: &AppConfig) -> Result<(), anyhow::Error> {
    match &cli.command {
        Commands::Query { files, sql, export } => {
            commands::query(files, sql, export.as_deref(), cli.output, config).await?;
        }
        Commands::Remote { connection, sql } => {
            commands::remote(connection, sql, cli.output, config).await?;
        }
        Commands::Tables { source } => {
            commands::tables(source.source(), cli.output, config).await?;
        }
        Commands::Ddl { table, source } => {
            commands::ddl(source.source(), table, cli.output, config).await?;
        }
    }
    Ok(())
}
