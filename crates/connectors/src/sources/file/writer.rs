//! Serializers for CSV, TSV and LTSV, with optional compression.

use super::codec::Encoder;
use flatql_common::file::{File, FileFormat};
use flatql_common::models::Table;
use flatql_error::{ErrorCode, FlatqlError, Result};
use std::io::Write;

fn delimited_writer<W: Write>(writer: W, delimiter: u8) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .has_headers(false)
        .delimiter(delimiter)
        .from_writer(writer)
}

fn finish_csv<W: Write>(writer: csv::Writer<W>) -> Result<W> {
    writer
        .into_inner()
        .map_err(|e| FlatqlError::from(e.into_error()))
}

/// Writes the header row followed by every record.
pub fn write_delimited<W: Write>(writer: W, table: &Table, delimiter: u8) -> Result<W> {
    let mut w = delimited_writer(writer, delimiter);
    w.write_record(table.header().iter())?;
    for record in table.records() {
        w.write_record(record.iter())?;
    }
    finish_csv(w)
}

/// Writes one line per record with every value prefixed by its column label.
pub fn write_ltsv<W: Write>(writer: W, table: &Table) -> Result<W> {
    let mut w = delimited_writer(writer, b'\t');
    for record in table.records() {
        let fields = table
            .header()
            .iter()
            .zip(record.iter())
            .map(|(label, value)| format!("{}:{}", label, value));
        w.write_record(fields)?;
    }
    finish_csv(w)
}

/// Writes `table` to a local file, picking format and codec from its suffix.
pub fn write_table(file: &File, table: &Table) -> Result<()> {
    let wrap = |e: FlatqlError| {
        let code = match e.code {
            ErrorCode::FileOpenFailed | ErrorCode::UnsupportedFileFormat | ErrorCode::UnsupportedProtocol => e.code,
            _ => ErrorCode::WriteFailed,
        };
        FlatqlError { code, ..e }.for_file("write", file.full_url())
    };

    let format = file.format().ok_or_else(|| {
        wrap(FlatqlError::new(
            ErrorCode::UnsupportedFileFormat,
            "file suffix is not .csv, .tsv or .ltsv",
        ))
    })?;
    if !file.is_local() {
        return Err(wrap(FlatqlError::new(
            ErrorCode::UnsupportedProtocol,
            format!("cannot write to '{}' sources", file.protocol()),
        )));
    }

    let out = std::fs::File::create(file.path()).map_err(|e| wrap(e.into()))?;
    let encoder = Encoder::new(file.codec(), std::io::BufWriter::new(out)).map_err(wrap)?;

    let encoder = match format {
        FileFormat::Csv | FileFormat::Tsv => write_delimited(encoder, table, format.delimiter()),
        FileFormat::Ltsv => write_ltsv(encoder, table),
    }
    .map_err(wrap)?;

    let mut buffered = encoder.finish().map_err(|e| wrap(e.into()))?;
    buffered.flush().map_err(|e| wrap(e.into()))?;

    tracing::info!(path = %file.full_url(), records = table.records().len(), "Wrote table");
    Ok(())
}
