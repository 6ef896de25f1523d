//! Flat file sources (CSV, TSV, LTSV).
//!
//! Reading is a three-stage pipeline:
//!
//! | Stage | Module | Choices |
//! |-------|--------|---------|
//! | Transport | `transport` | local file, HTTP(S) GET, S3 object |
//! | Codec | `codec` | gzip, bzip2, xz, zstd, none |
//! | Format | `reader` | CSV, TSV, LTSV |
//!
//! Each stage is picked from the [`File`] descriptor. Parsing runs on the
//! blocking pool.

use flatql_common::config::HttpConfig;
use flatql_common::file::{File, FileFormat, Transport};
use flatql_common::models::Table;
use flatql_error::{ErrorCode, FlatqlError, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub mod codec;
pub mod object_store;
pub mod reader;
mod transport;
pub mod writer;

pub use object_store::{ObjectStoreClient, OpendalObjectStore};
pub use writer::write_table;

/// Reads file sources into [`Table`]s.
#[derive(Clone)]
pub struct FormatReader {
    http: reqwest::Client,
    object_store: Option<Arc<dyn ObjectStoreClient>>,
    cancel: CancellationToken,
}

impl FormatReader {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| {
                FlatqlError::new(
                    ErrorCode::InvalidConfig,
                    format!("failed to build HTTP client: {}", e),
                )
            })?;

        Ok(Self {
            http,
            object_store: None,
            cancel: CancellationToken::new(),
        })
    }

    pub fn with_object_store(mut self, store: Arc<dyn ObjectStoreClient>) -> Self {
        self.object_store = Some(store);
        self
    }

    /// Binds remote transfers to `token`.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Reads `file` into a table named after its base name.
    pub async fn read(&self, file: &File) -> Result<Table> {
        let format = file.format().ok_or_else(|| {
            FlatqlError::new(
                ErrorCode::UnsupportedFileFormat,
                "file suffix is not .csv, .tsv or .ltsv",
            )
            .for_file("read", file.full_url())
        })?;

        let stream = match file.transport() {
            Some(Transport::Local) => transport::open_local(file)?,
            Some(Transport::Http) => transport::fetch_http(&self.http, file, &self.cancel).await?,
            Some(Transport::S3) => {
                transport::fetch_s3(self.object_store.as_deref(), file, &self.cancel).await?
            }
            None => {
                return Err(FlatqlError::new(
                    ErrorCode::UnsupportedProtocol,
                    format!("no transport for protocol '{}'", file.protocol()),
                )
                .for_file("read", file.full_url()))
            }
        };

        let codec = file.codec();
        let name = file.name_without_ext();
        let url = file.full_url();

        let table = tokio::task::spawn_blocking(move || {
            let stream = codec::decoder(codec, stream)?;
            match format {
                FileFormat::Csv | FileFormat::Tsv => {
                    reader::read_delimited(stream, format.delimiter(), &name)
                }
                FileFormat::Ltsv => reader::read_ltsv(stream, &name),
            }
        })
        .await
        .map_err(|e| FlatqlError::new(ErrorCode::InternalPanic, e.to_string()))?
        .map_err(|e| {
            // Decoder failures surface as I/O errors from inside the parser.
            let code = if codec.is_some() && e.code == ErrorCode::IoFailure {
                ErrorCode::DecompressionFailed
            } else {
                e.code
            };
            FlatqlError { code, ..e }.for_file("read", &url)
        })?;

        tracing::info!(
            path = %url,
            table = table.name(),
            columns = table.header().len(),
            records = table.records().len(),
            "Loaded file"
        );
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unknown_format_is_rejected() {
        let reader = FormatReader::new(&HttpConfig::default()).unwrap();
        let err = reader.read(&File::new("data.json").unwrap()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::UnsupportedFileFormat);
    }

    #[tokio::test]
    async fn test_unknown_protocol_is_rejected() {
        let reader = FormatReader::new(&HttpConfig::default()).unwrap();
        let err = reader
            .read(&File::new("ftp://example.com/data.csv").unwrap())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::UnsupportedProtocol);
    }

    #[tokio::test]
    async fn test_missing_local_file() {
        let reader = FormatReader::new(&HttpConfig::default()).unwrap();
        let err = reader
            .read(&File::new("/definitely/not/here.csv").unwrap())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::FileOpenFailed);
    }

    #[tokio::test]
    async fn test_s3_without_client() {
        let reader = FormatReader::new(&HttpConfig::default()).unwrap();
        let err = reader
            .read(&File::new("s3://bucket/data.csv").unwrap())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidConfig);
    }
}
