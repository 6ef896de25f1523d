use super::helpers::{open_connection, open_workspace, DdlResult, Source, TablesResult};
use crate::output::{self, OutputFormat};
use anyhow::Result;
use flatql_common::config::AppConfig;
use owo_colors::OwoColorize;

pub async fn tables(source: Source<'_>, format: OutputFormat, config: &AppConfig) -> Result<()> {
    let tables = match source {
        Source::Files(files) => open_workspace(files, config).await?.bridge().get_tables().await?,
        Source::Connection(name) => open_connection(name, config)?.get_tables().await?,
    };

    if format == OutputFormat::Human {
        for table in &tables {
            println!("{}  {}", table.name().bold(), table.header().join(", ").dimmed());
        }
        return Ok(());
    }
    output::print_success(format, TablesResult { tables })
}

pub async fn ddl(source: Source<'_>, table: &str, format: OutputFormat, config: &AppConfig) -> Result<()> {
    let ddl = match source {
        Source::Files(files) => {
            open_workspace(files, config)
                .await?
                .bridge()
                .get_table_ddl(table)
                .await?
        }
        Source::Connection(name) => open_connection(name, config)?.get_table_ddl(table).await?,
    };

    if format == OutputFormat::Human {
        println!("{}", ddl.name().bold());
        print!("{}", output::render_table(&ddl, true));
        return Ok(());
    }
    output::print_success(format, DdlResult { ddl })
}
