//! S3-backed `BlobStore`: the flat-namespace object store holding uploaded
//! file bytes and extracted-text blobs, keyed by the `blobKey` composed in
//! `services::files` (§4.5: `{orgId}/{companyId}/{userId}/{fileId}/{fileName}`).

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;

use crate::error::{Error, Result};

use super::BlobStore;

pub struct S3BlobStore {
    client: Client,
    bucket: String,
}

impl S3BlobStore {
    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(bytes))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| Error::StorageError(format!("s3 put_object: {e}")))?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let result = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await;

        let output = match result {
            Ok(output) => output,
            Err(e) => {
                let service_err = e.as_service_error();
                if service_err.map(|e| e.is_no_such_key()).unwrap_or(false) {
                    return Ok(None);
                }
                return Err(Error::StorageError(format!("s3 get_object: {e}")));
            }
        };

        let bytes = output
            .body
            .collect()
            .await
            .map_err(|e| Error::StorageError(format!("s3 body read: {e}")))?
            .into_bytes()
            .to_vec();
        Ok(Some(bytes))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| Error::StorageError(format!("s3 delete_object: {e}")))?;
        Ok(())
    }
}
