use super::helpers::{open_connection, open_workspace, ExportResult};
use crate::output::{self, OutputFormat};
use anyhow::Result;
use flatql_common::config::AppConfig;
use flatql_runtime::{ExecutionOutput, ExecutionRouter};
use owo_colors::OwoColorize;

/// Runs `sql` against local files, optionally exporting the result.
pub async fn query(
    files: &[String],
    sql: &str,
    export: Option<&str>,
    format: OutputFormat,
    config: &AppConfig,
) -> Result<()> {
    let workspace = open_workspace(files, config).await?;

    if let Some(destination) = export {
        let records = workspace.export(sql, destination).await?;
        if format == OutputFormat::Human {
            println!(
                "{} {} to {}",
                "Exported".green().bold(),
                output::row_count(records),
                destination
            );
        }
        return output::print_success(
            format,
            ExportResult {
                destination: destination.to_string(),
                records,
            },
        );
    }

    let result = workspace.router().execute(sql).await?;
    report(&result, format)
}

/// Runs `sql` on a configured connection.
pub async fn remote(connection: &str, sql: &str, format: OutputFormat, config: &AppConfig) -> Result<()> {
    let adapter = open_connection(connection, config)?;
    let result = ExecutionRouter::remote(adapter).execute(sql).await?;
    report(&result, format)
}

fn report(result: &ExecutionOutput, format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Human {
        match result {
            ExecutionOutput::Table(table) => {
                print!("{}", output::render_table(table, true));
                println!("{}", output::row_count(table.records().len()).dimmed());
            }
            ExecutionOutput::RowsAffected(n) => {
                println!("{} {} row(s) affected", "OK".green().bold(), n)
            }
        }
        return Ok(());
    }
    output::print_success(format, result)
}
