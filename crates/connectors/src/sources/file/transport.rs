//! Byte stream acquisition, one strategy per transport.

use super::codec::ByteStream;
use super::object_store::ObjectStoreClient;
use flatql_common::file::File;
use flatql_error::{ErrorCode, FlatqlError, Result};
use std::io::Cursor;
use tokio_util::sync::CancellationToken;

pub(crate) fn open_local(file: &File) -> Result<ByteStream> {
    let handle = std::fs::File::open(file.path())
        .map_err(|e| FlatqlError::from(e).for_file("open", file.path()))?;
    Ok(Box::new(std::io::BufReader::new(handle)))
}

/// GETs the file body. Any non-success status is a hard failure; cancelling
/// `cancel` aborts the transfer and drops the connection.
pub(crate) async fn fetch_http(
    client: &reqwest::Client,
    file: &File,
    cancel: &CancellationToken,
) -> Result<ByteStream> {
    let url = file.full_url();

    let transfer = async {
        let response = client.get(&url).send().await.map_err(|e| {
            FlatqlError::new(ErrorCode::HttpRequestFailed, e.to_string()).for_file("fetch", &url)
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FlatqlError::new(
                ErrorCode::HttpStatus,
                format!("remote file request failed with status: {}", status),
            )
            .for_file("fetch", &url));
        }

        response.bytes().await.map_err(|e| {
            FlatqlError::new(ErrorCode::HttpRequestFailed, e.to_string()).for_file("fetch", &url)
        })
    };

    let body = tokio::select! {
        _ = cancel.cancelled() => {
            tracing::warn!(url = %url, "Transfer cancelled");
            return Err(FlatqlError::new(ErrorCode::TransferCancelled, "transfer cancelled")
                .for_file("fetch", &url));
        }
        result = transfer => result?,
    };

    tracing::debug!(url = %url, bytes = body.len(), "Fetched remote file");
    Ok(Box::new(Cursor::new(body)))
}

pub(crate) async fn fetch_s3(
    store: Option<&dyn ObjectStoreClient>,
    file: &File,
    cancel: &CancellationToken,
) -> Result<ByteStream> {
    let store = store.ok_or_else(|| {
        FlatqlError::new(ErrorCode::InvalidConfig, "no object store client configured")
            .for_file("fetch", file.full_url())
            .with_hint("configure the s3 section to read s3:// sources")
    })?;
    let (bucket, key) = file.bucket_and_key();

    tokio::select! {
        _ = cancel.cancelled() => Err(
            FlatqlError::new(ErrorCode::TransferCancelled, "transfer cancelled")
                .for_file("fetch", file.full_url()),
        ),
        result = store.get_object(bucket, key) => result,
    }
}
