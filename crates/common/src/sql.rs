//! Keyword-based SQL statement classification.
//!
//! Classification only looks at the first whitespace-delimited token of the
//! statement. Leading comments are not skipped: `-- note\nSELECT 1` is not a
//! SELECT as far as this module is concerned.

use flatql_error::{ErrorCode, FlatqlError, Result};
use std::fmt;

/// Data Definition Language keywords
pub const DDL: [&str; 4] = ["CREATE", "DROP", "ALTER", "REINDEX"];
/// Data Manipulation Language keywords
pub const DML: [&str; 6] = ["SELECT", "INSERT", "UPDATE", "DELETE", "EXPLAIN", "WITH"];
/// Transaction Control Language keywords
pub const TCL: [&str; 5] = ["BEGIN", "COMMIT", "ROLLBACK", "SAVEPOINT", "RELEASE"];
/// Data Control Language keywords
pub const DCL: [&str; 2] = ["GRANT", "REVOKE"];

/// A submitted SQL statement with its classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sql {
    query: String,
    first_word: String,
}

impl Sql {
    /// Wraps raw query text. Fails on empty text.
    pub fn new(query: impl Into<String>) -> Result<Self> {
        let query = query.into();
        if query.is_empty() {
            return Err(FlatqlError::new(ErrorCode::EmptyQuery, "query is empty"));
        }

        let first_word = trim_word_gaps(&query)
            .split(' ')
            .next()
            .unwrap_or_default()
            .to_uppercase();

        Ok(Self { query, first_word })
    }

    pub fn as_str(&self) -> &str {
        &self.query
    }

    /// First token of the statement, uppercased.
    pub fn first_word(&self) -> &str {
        &self.first_word
    }

    pub fn is_ddl(&self) -> bool {
        DDL.contains(&self.first_word.as_str())
    }

    pub fn is_dml(&self) -> bool {
        DML.contains(&self.first_word.as_str())
    }

    pub fn is_tcl(&self) -> bool {
        TCL.contains(&self.first_word.as_str())
    }

    pub fn is_dcl(&self) -> bool {
        DCL.contains(&self.first_word.as_str())
    }

    pub fn is_select(&self) -> bool {
        self.first_word == "SELECT"
    }

    pub fn is_insert(&self) -> bool {
        self.first_word == "INSERT"
    }

    pub fn is_update(&self) -> bool {
        self.first_word == "UPDATE"
    }

    pub fn is_delete(&self) -> bool {
        self.first_word == "DELETE"
    }

    pub fn is_explain(&self) -> bool {
        self.first_word == "EXPLAIN"
    }

    pub fn is_with(&self) -> bool {
        self.first_word == "WITH"
    }
}

impl fmt::Display for Sql {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.query)
    }
}

impl TryFrom<&str> for Sql {
    type Error = FlatqlError;

    fn try_from(query: &str) -> Result<Self> {
        Sql::new(query)
    }
}

/// Collapses whitespace runs to single spaces and trims both ends.
fn trim_word_gaps(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sql(q: &str) -> Sql {
        Sql::new(q).expect("non-empty query")
    }

    #[test]
    fn test_empty_query_is_rejected() {
        let err = Sql::new("").unwrap_err();
        assert_eq!(err.code, ErrorCode::EmptyQuery);
    }

    #[test]
    fn test_trim_word_gaps() {
        assert_eq!(trim_word_gaps("  a  b  c  "), "a b c");
        assert_eq!(trim_word_gaps("a b c"), "a b c");
        assert_eq!(trim_word_gaps("a\t\n b"), "a b");
    }

    #[test]
    fn test_ddl() {
        assert!(sql("CREATE TABLE x").is_ddl());
        assert!(sql("drop table test").is_ddl());
        assert!(sql("ALTER TABLE test ADD c TEXT").is_ddl());
        assert!(sql("REINDEX test").is_ddl());
        assert!(!sql("SELECT * FROM test").is_ddl());
    }

    #[test]
    fn test_dml() {
        let select = sql("SELECT * FROM t");
        assert!(select.is_dml());
        assert!(select.is_select());
        assert!(!select.is_with());

        let with = sql("WITH c AS (SELECT 1) SELECT * FROM c");
        assert!(with.is_dml());
        assert!(with.is_with());
        assert!(!with.is_select());

        assert!(sql("INSERT INTO test VALUES (1, 'test')").is_insert());
        assert!(sql("UPDATE test SET name = 'updated' WHERE id = 1").is_update());
        assert!(sql("DELETE FROM test WHERE id = 1").is_delete());
        assert!(sql("explain select 1").is_explain());
        assert!(!sql("CREATE TABLE test (id INT)").is_dml());
    }

    #[test]
    fn test_tcl_and_dcl() {
        for q in ["BEGIN", "COMMIT", "ROLLBACK", "SAVEPOINT a", "RELEASE a"] {
            assert!(sql(q).is_tcl(), "{} should be TCL", q);
        }
        assert!(sql("GRANT SELECT ON t TO u").is_dcl());
        assert!(sql("REVOKE SELECT ON t FROM u").is_dcl());
        assert!(!sql("GRANT SELECT ON t TO u").is_dml());
    }

    #[test]
    fn test_whitespace_is_normalized() {
        let padded = sql("  SELECT   *  FROM t  ");
        let plain = sql("SELECT * FROM t");
        assert_eq!(padded.first_word(), plain.first_word());
        assert!(padded.is_select());
        assert!(padded.is_dml());
    }

    #[test]
    fn test_leading_comment_is_not_skipped() {
        let commented = sql("-- fetch users\nSELECT * FROM users");
        assert!(!commented.is_select());
        assert!(!commented.is_dml());
    }

    #[test]
    fn test_display_returns_original_text() {
        let q = "SELECT  *  FROM table";
        assert_eq!(sql(q).to_string(), q);
        assert_eq!(sql(q).as_str(), q);
    }

    proptest! {
        #[test]
        fn prop_surrounding_whitespace_does_not_change_class(
            lead in "[ \t\n]{0,4}",
            gap in "[ \t]{1,4}",
            keyword in prop::sample::select(vec!["select", "INSERT", "Create", "with", "grant", "begin"]),
        ) {
            let padded = sql(&format!("{}{}{}x", lead, keyword, gap));
            let plain = sql(&format!("{} x", keyword));
            prop_assert_eq!(padded.is_ddl(), plain.is_ddl());
            prop_assert_eq!(padded.is_dml(), plain.is_dml());
            prop_assert_eq!(padded.is_tcl(), plain.is_tcl());
            prop_assert_eq!(padded.is_dcl(), plain.is_dcl());
            prop_assert_eq!(padded.first_word(), plain.first_word());
        }
    }
}
