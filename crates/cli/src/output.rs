//! Structured output handling for CLI commands.

use flatql_common::models::Table;
use owo_colors::OwoColorize;
use serde::Serialize;

#[derive(clap::ValueEnum, Clone, Debug, Default, PartialEq, Eq, Copy)]
pub enum OutputFormat {
    #[default]
    Human,
    Json,
    Yaml,
}

impl OutputFormat {
    /// Returns true if the output format is intended for machine consumption
    pub fn is_machine_readable(&self) -> bool {
        match self {
            OutputFormat::Human => false,
            OutputFormat::Json | OutputFormat::Yaml => true,
        }
    }
}

/// Envelope for JSON/YAML responses
#[derive(Serialize)]
pub struct CommandResponse<T> {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    #[serde(flatten)]
    pub data: T,
}

impl<T> CommandResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: "success".to_string(),
            message: None,
            exit_code: Some(0),
            data,
        }
    }

    pub fn error(message: String, exit_code: i32, data: T) -> Self {
        Self {
            status: "error".to_string(),
            message: Some(message),
            exit_code: Some(exit_code),
            data,
        }
    }
}

/// Machine-readable details of a failure.
#[derive(Serialize, Default)]
pub struct ErrorDetail {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl From<&anyhow::Error> for ErrorDetail {
    fn from(e: &anyhow::Error) -> Self {
        match e.downcast_ref::<flatql_error::FlatqlError>() {
            Some(err) => Self {
                code: Some(err.code.as_str()),
                hint: err.hint.clone(),
            },
            None => Self::default(),
        }
    }
}

pub fn render<T: Serialize>(format: OutputFormat, data: &T) -> anyhow::Result<String> {
    Ok(match format {
        OutputFormat::Human => String::new(),
        OutputFormat::Json => serde_json::to_string_pretty(data)?,
        OutputFormat::Yaml => serde_yaml::to_string(data)?,
    })
}

/// Print a structured success response for machine outputs
pub fn print_success<T: Serialize>(format: OutputFormat, data: T) -> anyhow::Result<()> {
    if format == OutputFormat::Human {
        return Ok(());
    }
    println!("{}", render(format, &CommandResponse::success(data))?);
    Ok(())
}

/// Print a structured error response for machine outputs.
/// In human mode `main` writes the error to stderr instead.
pub fn print_error(format: OutputFormat, e: &anyhow::Error, exit_code: i32) -> anyhow::Result<()> {
    if format == OutputFormat::Human {
        return Ok(());
    }
    let response = CommandResponse::error(e.to_string(), exit_code, ErrorDetail::from(e));
    println!("{}", render(format, &response)?);
    Ok(())
}

/// Lays out `table` as aligned columns under a heading row.
pub fn render_table(table: &Table, color: bool) -> String {
    let header = table.header();
    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for record in table.records() {
        for (i, value) in record.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(value.chars().count());
            }
        }
    }

    let line = |values: &[String]| -> String {
        values
            .iter()
            .zip(&widths)
            .map(|(v, w)| format!("{:<width$}", v, width = *w))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let heading = line(&header[..]);
    let mut out = String::new();
    if color {
        out.push_str(&heading.bold().cyan().to_string());
    } else {
        out.push_str(&heading);
    }
    out.push('\n');
    out.push_str(
        &widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("  "),
    );
    out.push('\n');
    for record in table.records() {
        out.push_str(&line(&record[..]));
        out.push('\n');
    }
    out
}

pub fn row_count(n: usize) -> String {
    format!("({} row{})", n, if n == 1 { "" } else { "s" })
}
