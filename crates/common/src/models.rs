//! Tabular value types shared by every reader, engine and adapter.
//!
//! A [`Table`] is the single relational shape everything converges on: file
//! sources are parsed into one, query results are returned as one, and catalog
//! introspection is projected into one.

use flatql_error::{ErrorCode, FlatqlError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::ops::Deref;

/// Header of the DDL tables produced by every `get_table_ddl` implementation.
pub const DDL_HEADER: [&str; 6] = [
    "Column Name",
    "Type",
    "Precision",
    "Nullable",
    "DefaultValue",
    "PrimaryKey",
];

/// Ordered column names of a table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Header(Vec<String>);

impl Header {
    pub fn new(columns: Vec<String>) -> Self {
        Self(columns)
    }

    pub fn into_inner(self) -> Vec<String> {
        self.0
    }

    /// Returns the first column name that appears more than once.
    pub fn first_duplicate(&self) -> Option<&str> {
        let mut seen = HashSet::with_capacity(self.0.len());
        self.0
            .iter()
            .find(|column| !seen.insert(column.as_str()))
            .map(String::as_str)
    }
}

impl Deref for Header {
    type Target = [String];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<String>> for Header {
    fn from(columns: Vec<String>) -> Self {
        Self(columns)
    }
}

impl From<Vec<&str>> for Header {
    fn from(columns: Vec<&str>) -> Self {
        Self(columns.into_iter().map(str::to_string).collect())
    }
}

/// One row of cell values, positionally aligned to a [`Header`].
///
/// Every value is text; NULL is represented by the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Vec<String>);

impl Record {
    pub fn new(values: Vec<String>) -> Self {
        Self(values)
    }

    pub fn into_inner(self) -> Vec<String> {
        self.0
    }
}

impl Deref for Record {
    type Target = [String];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<String>> for Record {
    fn from(values: Vec<String>) -> Self {
        Self(values)
    }
}

impl From<Vec<&str>> for Record {
    fn from(values: Vec<&str>) -> Self {
        Self(values.into_iter().map(str::to_string).collect())
    }
}

/// In-memory relational data: a name, an ordered header and ordered records.
///
/// Equality is structural and order sensitive for both header and records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    name: String,
    header: Header,
    records: Vec<Record>,
}

impl Table {
    pub fn new(name: impl Into<String>, header: impl Into<Header>, records: Vec<Record>) -> Self {
        Self {
            name: name.into(),
            header: header.into(),
            records,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Same header and records under a different name.
    pub fn with_name(self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self
        }
    }

    pub fn into_parts(self) -> (String, Header, Vec<Record>) {
        (self.name, self.header, self.records)
    }

    pub fn is_empty_name(&self) -> bool {
        self.name.is_empty()
    }

    pub fn is_empty_header(&self) -> bool {
        self.header.is_empty()
    }

    pub fn is_empty_records(&self) -> bool {
        self.records.is_empty()
    }

    /// Checks the write-path invariants.
    ///
    /// Checks run in a fixed order (name, header, records, duplicate columns)
    /// and only the first violation is reported. Query results are not
    /// expected to pass this check: an empty result set is legitimate.
    pub fn valid(&self) -> Result<()> {
        if self.is_empty_name() {
            return Err(FlatqlError::new(
                ErrorCode::EmptyTableName,
                "table name is not set",
            ));
        }

        if self.is_empty_header() {
            return Err(FlatqlError::new(
                ErrorCode::EmptyHeader,
                "header value is empty",
            )
            .for_table("validate", &self.name));
        }

        if self.is_empty_records() {
            return Err(
                FlatqlError::new(ErrorCode::EmptyRecords, "records is empty")
                    .for_table("validate", &self.name),
            );
        }

        if let Some(column) = self.header.first_duplicate() {
            return Err(FlatqlError::new(
                ErrorCode::DuplicateHeaderColumn,
                format!("table has a header column with a duplicate name '{}'", column),
            )
            .for_table("validate", &self.name)
            .with_hint("column names must be unique within a table"));
        }

        Ok(())
    }
}

/// Catalog metadata of one column, as reported by any backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescription {
    pub name: String,
    pub data_type: String,
    pub precision: i64,
    pub nullable: bool,
    pub default_value: String,
    pub primary_key: bool,
}

impl ColumnDescription {
    /// Projects the description onto the [`DDL_HEADER`] columns.
    pub fn into_record(self) -> Record {
        Record::new(vec![
            self.name,
            self.data_type,
            self.precision.to_string(),
            if self.nullable { "YES" } else { "NO" }.to_string(),
            self.default_value,
            if self.primary_key { "PRI" } else { "" }.to_string(),
        ])
    }
}

/// Builds the display table describing the columns of `table_name`.
pub fn ddl_table(table_name: &str, columns: Vec<ColumnDescription>) -> Table {
    Table::new(
        table_name,
        Header::from(DDL_HEADER.to_vec()),
        columns
            .into_iter()
            .map(ColumnDescription::into_record)
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users() -> Table {
        Table::new(
            "users",
            vec!["id", "name"],
            vec![Record::from(vec!["1", "Gina"]), Record::from(vec!["2", "Yulia"])],
        )
    }

    #[test]
    fn test_equal_is_reflexive() {
        let t = users();
        assert_eq!(t, t.clone());
    }

    #[test]
    fn test_equal_is_sensitive_to_record_order() {
        let t = users();
        let (name, header, mut records) = t.clone().into_parts();
        records.reverse();
        assert_ne!(t, Table::new(name, header, records));
    }

    #[test]
    fn test_equal_is_sensitive_to_header_order() {
        let t = users();
        let swapped = Table::new("users", vec!["name", "id"], t.records().to_vec());
        assert_ne!(t, swapped);
    }

    #[test]
    fn test_equal_compares_name_and_record_count() {
        let t = users();
        assert_ne!(t, t.clone().with_name("people"));

        let shorter = Table::new("users", vec!["id", "name"], t.records()[..1].to_vec());
        assert_ne!(t, shorter);
    }

    #[test]
    fn test_valid_table() {
        assert!(users().valid().is_ok());
    }

    #[test]
    fn test_valid_precedence() {
        // Every check fails here; the name check wins.
        let t = Table::new("", Vec::<String>::new(), vec![]);
        assert_eq!(t.valid().unwrap_err().code, ErrorCode::EmptyTableName);

        let t = Table::new("t", Vec::<String>::new(), vec![]);
        assert_eq!(t.valid().unwrap_err().code, ErrorCode::EmptyHeader);

        let t = Table::new("t", vec!["a", "a"], vec![]);
        assert_eq!(t.valid().unwrap_err().code, ErrorCode::EmptyRecords);

        let t = Table::new("t", vec!["a", "b", "a"], vec![Record::from(vec!["1", "2", "3"])]);
        let err = t.valid().unwrap_err();
        assert_eq!(err.code, ErrorCode::DuplicateHeaderColumn);
        assert!(err.message.contains("'a'"));
    }

    #[test]
    fn test_column_description_projection() {
        let table = ddl_table(
            "users",
            vec![
                ColumnDescription {
                    name: "id".to_string(),
                    data_type: "INTEGER".to_string(),
                    precision: 0,
                    nullable: false,
                    default_value: String::new(),
                    primary_key: true,
                },
                ColumnDescription {
                    name: "name".to_string(),
                    data_type: "varchar".to_string(),
                    precision: 255,
                    nullable: true,
                    default_value: "'anon'".to_string(),
                    primary_key: false,
                },
            ],
        );

        assert_eq!(table.name(), "users");
        assert_eq!(&table.header()[..], &DDL_HEADER.map(String::from)[..]);
        assert_eq!(
            table.records()[0],
            Record::from(vec!["id", "INTEGER", "0", "NO", "", "PRI"])
        );
        assert_eq!(
            table.records()[1],
            Record::from(vec!["name", "varchar", "255", "YES", "'anon'", ""])
        );
    }
}
