//! File source descriptors.
//!
//! A [`File`] resolves, once and up front, how a path is reached (transport),
//! how its bytes are compressed (codec) and how they are laid out (format).
//! Detection is driven by the suffix tables below.

use flatql_error::{ErrorCode, FlatqlError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How the bytes of a file are fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    Local,
    Http,
    S3,
}

/// Compression applied on top of the file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Codec {
    Gzip,
    Bzip2,
    Xz,
    Zstd,
}

/// Record layout of the (decompressed) file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    Csv,
    Tsv,
    Ltsv,
}

pub const FILE_PROTOCOL: &str = "file://";

const PROTOCOL_MARKER: &str = "://";

const TRANSPORTS: [(&str, Transport); 4] = [
    ("file://", Transport::Local),
    ("http://", Transport::Http),
    ("https://", Transport::Http),
    ("s3://", Transport::S3),
];

const CODECS: [(&str, Codec); 4] = [
    (".gz", Codec::Gzip),
    (".bz2", Codec::Bzip2),
    (".xz", Codec::Xz),
    (".zst", Codec::Zstd),
];

const FORMATS: [(&str, FileFormat); 3] = [
    (".csv", FileFormat::Csv),
    (".tsv", FileFormat::Tsv),
    (".ltsv", FileFormat::Ltsv),
];

impl Codec {
    pub fn suffix(&self) -> &'static str {
        CODECS
            .iter()
            .find(|(_, codec)| codec == self)
            .map(|(suffix, _)| *suffix)
            .unwrap_or_default()
    }
}

impl FileFormat {
    pub fn suffix(&self) -> &'static str {
        FORMATS
            .iter()
            .find(|(_, format)| format == self)
            .map(|(suffix, _)| *suffix)
            .unwrap_or_default()
    }

    /// Field delimiter used by the delimited reader and writer.
    pub fn delimiter(&self) -> u8 {
        match self {
            FileFormat::Csv => b',',
            FileFormat::Tsv | FileFormat::Ltsv => b'\t',
        }
    }
}

/// A file source: where it lives and how to decode it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct File {
    path: String,
    protocol: String,
    transport: Option<Transport>,
    codec: Option<Codec>,
    format: Option<FileFormat>,
}

impl File {
    /// Parses a bare path or a `scheme://` URI.
    ///
    /// The text before the first `://` becomes the protocol; a path without a
    /// marker is local and gets the `file://` protocol.
    pub fn new(path: impl Into<String>) -> Result<Self> {
        let path = path.into();
        if path.is_empty() {
            return Err(FlatqlError::new(
                ErrorCode::InvalidConfig,
                "file path is empty",
            ));
        }

        let (protocol, path) = match path.split_once(PROTOCOL_MARKER) {
            Some((scheme, rest)) => (format!("{}{}", scheme, PROTOCOL_MARKER), rest.to_string()),
            None => (FILE_PROTOCOL.to_string(), path),
        };

        let transport = TRANSPORTS
            .iter()
            .find(|(p, _)| *p == protocol)
            .map(|(_, t)| *t);

        let (codec, stem) = match CODECS.iter().find(|(suffix, _)| path.ends_with(suffix)) {
            Some((suffix, codec)) => (Some(*codec), &path[..path.len() - suffix.len()]),
            None => (None, path.as_str()),
        };

        let format = FORMATS
            .iter()
            .find(|(suffix, _)| stem.ends_with(suffix))
            .map(|(_, f)| *f);

        Ok(Self {
            path,
            protocol,
            transport,
            codec,
            format,
        })
    }

    /// Path without the protocol prefix.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Protocol including the `://` marker, e.g. `https://`.
    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    pub fn transport(&self) -> Option<Transport> {
        self.transport
    }

    pub fn codec(&self) -> Option<Codec> {
        self.codec
    }

    pub fn format(&self) -> Option<FileFormat> {
        self.format
    }

    pub fn is_csv(&self) -> bool {
        self.format == Some(FileFormat::Csv)
    }

    pub fn is_tsv(&self) -> bool {
        self.format == Some(FileFormat::Tsv)
    }

    pub fn is_ltsv(&self) -> bool {
        self.format == Some(FileFormat::Ltsv)
    }

    pub fn is_local(&self) -> bool {
        self.transport == Some(Transport::Local)
    }

    pub fn is_http(&self) -> bool {
        self.transport == Some(Transport::Http)
    }

    pub fn is_s3(&self) -> bool {
        self.transport == Some(Transport::S3)
    }

    pub fn full_url(&self) -> String {
        format!("{}{}", self.protocol, self.path)
    }

    /// Splits an `s3://bucket/key` path at the first `/`.
    ///
    /// Returns empty strings for non-S3 files and an empty key when the path
    /// names only a bucket.
    pub fn bucket_and_key(&self) -> (&str, &str) {
        if !self.is_s3() {
            return ("", "");
        }
        self.path.split_once('/').unwrap_or((self.path.as_str(), ""))
    }

    /// Base name with every extension removed, including the compression suffix.
    ///
    /// Hidden files keep their leading dot: `.hidden` stays `.hidden` and
    /// `.hidden.csv` becomes `.hidden`.
    pub fn name_without_ext(&self) -> String {
        let base = self.path.rsplit('/').next().unwrap_or_default();
        let (prefix, rest) = match base.strip_prefix('.') {
            Some(rest) => (".", rest),
            None => ("", base),
        };
        let stem = rest.split('.').next().unwrap_or_default();
        format!("{}{}", prefix, stem)
    }
}

impl fmt::Display for File {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_url())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(path: &str) -> File {
        File::new(path).expect("valid path")
    }

    #[test]
    fn test_empty_path_is_rejected() {
        assert!(File::new("").is_err());
    }

    #[test]
    fn test_bare_path_is_local() {
        let f = file("path/to/sample.csv");
        assert_eq!(f.protocol(), "file://");
        assert_eq!(f.path(), "path/to/sample.csv");
        assert!(f.is_local());
        assert_eq!(f.full_url(), "file://path/to/sample.csv");
    }

    #[test]
    fn test_protocol_is_split_off() {
        let f = file("https://example.com/data/sample.tsv");
        assert_eq!(f.protocol(), "https://");
        assert_eq!(f.path(), "example.com/data/sample.tsv");
        assert!(f.is_http());

        let f = file("file:///tmp/sample.csv");
        assert!(f.is_local());
        assert_eq!(f.path(), "/tmp/sample.csv");

        let f = file("ftp://example.com/sample.csv");
        assert_eq!(f.protocol(), "ftp://");
        assert_eq!(f.transport(), None);
    }

    #[test]
    fn test_bucket_and_key() {
        let f = file("s3://my-bucket/dir/sample.csv");
        assert!(f.is_s3());
        assert_eq!(f.bucket_and_key(), ("my-bucket", "dir/sample.csv"));

        let f = file("s3://my-bucket");
        assert_eq!(f.bucket_and_key(), ("my-bucket", ""));

        let f = file("sample.csv");
        assert_eq!(f.bucket_and_key(), ("", ""));
    }

    #[test]
    fn test_format_detection_with_and_without_codec() {
        assert!(file("test.csv").is_csv());
        assert!(!file("test.tsv").is_csv());
        assert!(file("test.tsv").is_tsv());
        assert!(!file("test.ltsv").is_tsv());
        assert!(file("test.ltsv").is_ltsv());

        for (path, codec) in [
            ("test.csv.gz", Codec::Gzip),
            ("test.csv.bz2", Codec::Bzip2),
            ("test.csv.xz", Codec::Xz),
            ("test.csv.zst", Codec::Zstd),
        ] {
            let f = file(path);
            assert!(f.is_csv(), "{} should be csv", path);
            assert_eq!(f.codec(), Some(codec));
        }

        let f = file("test.ltsv.zst");
        assert!(f.is_ltsv());
        assert_eq!(f.codec(), Some(Codec::Zstd));

        let f = file("test.txt.gz");
        assert_eq!(f.format(), None);
        assert_eq!(f.codec(), Some(Codec::Gzip));

        assert_eq!(file("test.csv").codec(), None);
    }

    #[test]
    fn test_name_without_ext() {
        assert_eq!(file("sample.csv").name_without_ext(), "sample");
        assert_eq!(file("path/to/sample.csv.gz").name_without_ext(), "sample");
        assert_eq!(file("s3://bucket/dir/sample.tsv.zst").name_without_ext(), "sample");
        assert_eq!(file("https://example.com/a/users.ltsv").name_without_ext(), "users");
        assert_eq!(file(".hidden").name_without_ext(), ".hidden");
        assert_eq!(file(".hidden.csv").name_without_ext(), ".hidden");
        assert_eq!(file("noext").name_without_ext(), "noext");
    }

    #[test]
    fn test_suffixes() {
        assert_eq!(Codec::Zstd.suffix(), ".zst");
        assert_eq!(FileFormat::Ltsv.suffix(), ".ltsv");
        assert_eq!(FileFormat::Csv.delimiter(), b',');
        assert_eq!(FileFormat::Tsv.delimiter(), b'\t');
    }
}
