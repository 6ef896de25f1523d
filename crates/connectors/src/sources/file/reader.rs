//! Parsers turning a decoded byte stream into a [`Table`].

use flatql_common::models::{Header, Record, Table};
use flatql_error::{ErrorCode, FlatqlError, Result};
use std::io::Read;

fn delimited_reader<R: Read>(reader: R, delimiter: u8) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(delimiter)
        .from_reader(reader)
}

/// Parses CSV or TSV: the first row is the header, the rest are records.
pub fn read_delimited<R: Read>(reader: R, delimiter: u8, name: &str) -> Result<Table> {
    let mut rows = delimited_reader(reader, delimiter).into_records();

    let header = match rows.next() {
        Some(row) => row?.iter().map(str::to_string).collect::<Vec<_>>(),
        None => Vec::new(),
    };

    let records = rows
        .map(|row| row.map(|r| Record::new(r.iter().map(str::to_string).collect())))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(Table::new(name, Header::new(header), records))
}

/// Parses LTSV: every field is `label:value`.
///
/// Labels of the first row become the header; every row contributes its
/// values as a record.
pub fn read_ltsv<R: Read>(reader: R, name: &str) -> Result<Table> {
    let mut header: Vec<String> = Vec::new();
    let mut records = Vec::new();

    for (line, row) in delimited_reader(reader, b'\t').into_records().enumerate() {
        let row = row?;
        let mut values = Vec::with_capacity(row.len());
        for field in row.iter() {
            let (label, value) = split_label(field).map_err(|e| e.at_line(line + 1))?;
            if line == 0 {
                header.push(label.to_string());
            }
            values.push(value.to_string());
        }
        records.push(Record::new(values));
    }

    Ok(Table::new(name, Header::new(header), records))
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
enum LabelError {
    #[error("field '{0}' has no ':' separator")]
    NoSeparator(String),
    #[error("field '{0}' has an empty label")]
    EmptyLabel(String),
}

impl LabelError {
    fn at_line(self, line: usize) -> FlatqlError {
        FlatqlError::new(ErrorCode::MissingLabel, format!("line {}: {}", line, self))
            .with_hint("LTSV fields look like label:value")
    }
}

/// Splits at the first colon.
fn split_label(field: &str) -> std::result::Result<(&str, &str), LabelError> {
    match field.find(':') {
        None => Err(LabelError::NoSeparator(field.to_string())),
        Some(0) => Err(LabelError::EmptyLabel(field.to_string())),
        Some(idx) => Ok((&field[..idx], &field[idx + 1..])),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_csv() {
        let data = "id,name\n1,Gina\n2,Yulia\n3,Ken\n";
        let table = read_delimited(data.as_bytes(), b',', "users").unwrap();

        assert_eq!(table.name(), "users");
        assert_eq!(&table.header()[..], ["id", "name"]);
        assert_eq!(table.records().len(), 3);
        assert_eq!(table.records()[2], Record::from(vec!["3", "Ken"]));
    }

    #[test]
    fn test_read_tsv_keeps_commas() {
        let data = "id\tnote\n1\ta, b\n";
        let table = read_delimited(data.as_bytes(), b'\t', "notes").unwrap();
        assert_eq!(table.records()[0], Record::from(vec!["1", "a, b"]));
    }

    #[test]
    fn test_read_header_only() {
        let table = read_delimited("id,name\n".as_bytes(), b',', "t").unwrap();
        assert_eq!(table.header().len(), 2);
        assert!(table.is_empty_records());
    }

    #[test]
    fn test_ragged_csv_is_malformed() {
        let err = read_delimited("a,b\n1\n".as_bytes(), b',', "t").unwrap_err();
        assert_eq!(err.code, ErrorCode::MalformedRecord);
    }

    #[test]
    fn test_read_ltsv() {
        let table = read_ltsv("id:1\tname:John\n".as_bytes(), "people").unwrap();
        assert_eq!(&table.header()[..], ["id", "name"]);
        assert_eq!(table.records(), &[Record::from(vec!["1", "John"])]);
    }

    #[test]
    fn test_ltsv_value_may_contain_colons() {
        let table = read_ltsv("url:http://example.com\n".as_bytes(), "t").unwrap();
        assert_eq!(table.records()[0], Record::from(vec!["http://example.com"]));
    }

    #[test]
    fn test_ltsv_missing_label() {
        for data in ["id:1\tJohn\n", "id:1\t:John\n", "id:1\tname:a\nid:2\tb\n"] {
            let err = read_ltsv(data.as_bytes(), "t").unwrap_err();
            assert_eq!(err.code, ErrorCode::MissingLabel, "input {:?}", data);
        }
    }

    #[test]
    fn test_split_label() {
        assert_eq!(split_label("a:b"), Ok(("a", "b")));
        assert_eq!(split_label("a:"), Ok(("a", "")));
        assert_eq!(split_label(":b"), Err(LabelError::EmptyLabel(":b".to_string())));
        assert_eq!(split_label("ab"), Err(LabelError::NoSeparator("ab".to_string())));

        let err = split_label("ab").unwrap_err().at_line(3);
        assert_eq!(err.message, "line 3: field 'ab' has no ':' separator");
    }
}
