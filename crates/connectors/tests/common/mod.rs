#![allow(dead_code)]

use flatql_common::models::{Record, Table};
use std::path::{Path, PathBuf};

pub const SAMPLE_CSV: &str = "id,name,email\n\
1,Gina,gina@example.com\n\
2,Yulia,yulia@example.com\n\
3,Hana,hana@example.com\n";

pub fn sample_table() -> Table {
    Table::new(
        "sample",
        vec!["id", "name", "email"],
        vec![
            Record::from(vec!["1", "Gina", "gina@example.com"]),
            Record::from(vec!["2", "Yulia", "yulia@example.com"]),
            Record::from(vec!["3", "Hana", "hana@example.com"]),
        ],
    )
}

/// Writes `contents` under `dir` and returns the full path as a string.
pub fn write_fixture(dir: &Path, name: &str, contents: &[u8]) -> String {
    let path: PathBuf = dir.join(name);
    std::fs::write(&path, contents).expect("failed to write fixture");
    path.to_string_lossy().into_owned()
}
