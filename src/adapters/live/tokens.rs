//! Live completion-token stores.

use std::fs::{self, OpenOptions};
use std::path::PathBuf;

use super::S3TokenStore;
use crate::ports::TokenStore;

/// Routes each token by scheme: `s3://` to [`S3TokenStore`], everything
/// else to [`LocalTokenStore`].
pub struct LiveTokenStore;

impl LiveTokenStore {
    fn route(token: &str) -> &'static dyn TokenStore {
        if token.starts_with("s3://") {
            &S3TokenStore
        } else {
            &LocalTokenStore
        }
    }
}

impl TokenStore for LiveTokenStore {
    fn exists(&self, token: &str) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        Self::route(token).exists(token)
    }

    fn write(&self, token: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Self::route(token).write(token)
    }
}

/// Stores tokens as zero-byte files. Accepts plain paths and `file://` URIs.
///
/// Any other scheme is rejected here; [`LiveTokenStore`] sends `s3://`
/// tokens elsewhere before they reach this store.
pub struct LocalTokenStore;

fn resolve(token: &str) -> Result<PathBuf, Box<dyn std::error::Error + Send + Sync>> {
    if let Some(path) = token.strip_prefix("file://") {
        return Ok(PathBuf::from(path));
    }
    if let Some((scheme, _)) = token.split_once("://") {
        return Err(format!(
            "unsupported token scheme {scheme}://, only local paths and file:// URIs are supported"
        )
        .into());
    }
    if token.trim().is_empty() {
        return Err("token path is empty".into());
    }
    Ok(PathBuf::from(token))
}

impl TokenStore for LocalTokenStore {
    fn exists(&self, token: &str) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        Ok(resolve(token)?.try_exists()?)
    }

    fn write(&self, token: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let path = resolve(token)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(())
    }
}
