//! Live completion-token store on S3.

use object_store::aws::AmazonS3Builder;
use object_store::path::Path;
use object_store::{ObjectStore, PutPayload};
use tokio::runtime::{Builder, Runtime};

use crate::ports::TokenStore;

/// Stores `s3://bucket/key` tokens as zero-byte objects.
///
/// Credentials and region come from the standard `AWS_*` environment
/// variables.
pub struct S3TokenStore;

/// Splits `s3://bucket/key` into bucket and object key.
fn parse(token: &str) -> Result<(&str, Path), Box<dyn std::error::Error + Send + Sync>> {
    let rest = token
        .strip_prefix("s3://")
        .ok_or_else(|| format!("not an s3:// token: {token}"))?;
    match rest.split_once('/') {
        Some((bucket, key)) if !bucket.is_empty() && !key.trim_matches('/').is_empty() => {
            Ok((bucket, Path::from(key)))
        }
        _ => Err(format!("s3 token needs a bucket and a key: {token}").into()),
    }
}

fn connect(bucket: &str) -> Result<(Runtime, impl ObjectStore), Box<dyn std::error::Error + Send + Sync>> {
    let runtime = Builder::new_current_thread().enable_all().build()?;
    let store = AmazonS3Builder::from_env().with_bucket_name(bucket).build()?;
    Ok((runtime, store))
}

impl TokenStore for S3TokenStore {
    fn exists(&self, token: &str) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        let (bucket, key) = parse(token)?;
        let (runtime, store) = connect(bucket)?;
        match runtime.block_on(store.head(&key)) {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, token: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let (bucket, key) = parse(token)?;
        let (runtime, store) = connect(bucket)?;
        runtime.block_on(store.put(&key, PutPayload::new()))?;
        Ok(())
    }
}
