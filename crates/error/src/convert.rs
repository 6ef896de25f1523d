use crate::{ErrorCode, FlatqlError};

impl From<std::io::Error> for FlatqlError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => {
                FlatqlError::new(ErrorCode::FileOpenFailed, err.to_string())
            }
            _ => FlatqlError::new(ErrorCode::IoFailure, err.to_string()),
        }
    }
}

impl From<csv::Error> for FlatqlError {
    fn from(err: csv::Error) -> Self {
        match err.kind() {
            csv::ErrorKind::Io(_) => FlatqlError::new(ErrorCode::IoFailure, err.to_string()),
            _ => FlatqlError::new(ErrorCode::MalformedRecord, err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for FlatqlError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(_, _)
            | rusqlite::Error::ExecuteReturnedResults
            | rusqlite::Error::InvalidColumnIndex(_)
            | rusqlite::Error::InvalidColumnType(..) => {
                FlatqlError::new(ErrorCode::EngineFailure, err.to_string())
            }
            rusqlite::Error::InvalidPath(_) => {
                FlatqlError::new(ErrorCode::ConnectionFailed, err.to_string())
            }
            _ => FlatqlError::new(ErrorCode::EngineFailure, err.to_string()),
        }
    }
}

impl From<serde_json::Error> for FlatqlError {
    fn from(err: serde_json::Error) -> Self {
        FlatqlError::new(ErrorCode::SerializationFailed, err.to_string())
    }
}

impl From<serde_yaml::Error> for FlatqlError {
    fn from(err: serde_yaml::Error) -> Self {
        FlatqlError::new(ErrorCode::InvalidYaml, err.to_string())
    }
}

/// Levenshtein-based suggestion among known names, within a distance of 3.
pub fn find_closest_match(target: &str, options: &[String]) -> Option<String> {
    let mut best_match: Option<&str> = None;
    let mut min_distance = usize::MAX;

    for option in options {
        let distance = levenshtein(target, option);
        if distance < min_distance && distance <= 3 {
            min_distance = distance;
            best_match = Some(option.as_str());
        }
    }

    best_match.map(|s| s.to_string())
}

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut dp = vec![vec![0; b.len() + 1]; a.len() + 1];

    for (i, row) in dp.iter_mut().enumerate() {
        row[0] = i;
    }
    for (j, val) in dp[0].iter_mut().enumerate() {
        *val = j;
    }

    for i in 1..=a.len() {
        for j in 1..=b.len() {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            dp[i][j] = std::cmp::min(
                std::cmp::min(dp[i - 1][j] + 1, dp[i][j - 1] + 1),
                dp[i - 1][j - 1] + cost,
            );
        }
    }

    dp[a.len()][b.len()]
}
