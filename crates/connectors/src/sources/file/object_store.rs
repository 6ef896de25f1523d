//! Object store access for `s3://bucket/key` sources.

use async_trait::async_trait;
use flatql_common::config::S3Config;
use flatql_error::{ErrorCode, FlatqlError, Result};
use opendal::Operator;
use std::io::{Cursor, Read};

/// Fetches one object as a byte stream.
#[async_trait]
pub trait ObjectStoreClient: Send + Sync {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Box<dyn Read + Send>>;
}

/// S3 client backed by an OpenDAL operator built per bucket.
///
/// Credentials come from the standard AWS chain (environment, `AWS_PROFILE`,
/// shared config files).
#[derive(Debug, Clone)]
pub struct OpendalObjectStore {
    region: String,
    endpoint: Option<String>,
}

impl OpendalObjectStore {
    pub fn new(config: &S3Config) -> Self {
        Self {
            region: config.resolved_region(),
            endpoint: config.endpoint.clone(),
        }
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    fn operator(&self, bucket: &str) -> Result<Operator> {
        let mut builder = opendal::services::S3::default()
            .bucket(bucket)
            .region(&self.region);
        if let Some(endpoint) = &self.endpoint {
            builder = builder.endpoint(endpoint);
        }

        Operator::new(builder)
            .map(|op| op.finish())
            .map_err(|e| {
                FlatqlError::new(
                    ErrorCode::ObjectStoreFailed,
                    format!("failed to configure object store: {}", e),
                )
            })
    }
}

#[async_trait]
impl ObjectStoreClient for OpendalObjectStore {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Box<dyn Read + Send>> {
        let path = format!("s3://{}/{}", bucket, key);
        if key.is_empty() {
            return Err(
                FlatqlError::new(ErrorCode::ObjectStoreFailed, "object key is empty")
                    .for_file("get_object", path),
            );
        }

        tracing::info!(bucket, key, region = %self.region, "Fetching object");
        let buffer = self.operator(bucket)?.read(key).await.map_err(|e| {
            FlatqlError::new(ErrorCode::ObjectStoreFailed, e.to_string()).for_file("get_object", &path)
        })?;

        Ok(Box::new(Cursor::new(buffer.to_bytes())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_key_is_rejected_before_fetch() {
        let store = OpendalObjectStore::new(&S3Config {
            region: Some("eu-west-1".to_string()),
            endpoint: None,
        });
        assert_eq!(store.region(), "eu-west-1");

        let err = match store.get_object("bucket", "").await {
            Ok(_) => panic!("expected an error for an empty key"),
            Err(e) => e,
        };
        assert_eq!(err.code, ErrorCode::ObjectStoreFailed);
    }
}
