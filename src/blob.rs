//! Image upload to blob storage.
//!
//! The rest of the service only knows `(bytes, filename, content type) ->
//! public URL`; it never looks at file contents. The production backend is a
//! Supabase Storage bucket: objects land under `uploads/` with a random
//! name, and the returned URL is the bucket's public object path.

use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use tracing::info;
use uuid::Uuid;

use crate::error::Error;

#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn upload(
        &self,
        data: Vec<u8>,
        filename: &str,
        content_type: &str,
    ) -> Result<String, Error>;
}

/// Supabase Storage bucket client.
#[derive(Clone)]
pub struct SupabaseBlobStore {
    client: Client,
    base_url: String,
    service_role_key: String,
    bucket: String,
}

impl SupabaseBlobStore {
    /// Create a new blob store from environment variables. The bucket
    /// defaults to `uploads` when `SUPABASE_STORAGE_BUCKET` is unset.
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("SUPABASE_URL").context("SUPABASE_URL not set")?;
        let service_role_key = std::env::var("SUPABASE_SERVICE_ROLE_KEY")
            .context("SUPABASE_SERVICE_ROLE_KEY not set")?;
        let bucket =
            std::env::var("SUPABASE_STORAGE_BUCKET").unwrap_or_else(|_| "uploads".to_string());

        Ok(Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            service_role_key,
            bucket,
        })
    }
}

/// `.ext` (lowercased) of an uploaded filename, or empty when there is none.
fn extension_of(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}

#[async_trait]
impl BlobStore for SupabaseBlobStore {
    async fn upload(
        &self,
        data: Vec<u8>,
        filename: &str,
        content_type: &str,
    ) -> Result<String, Error> {
        let object_path = format!(
            "uploads/{}{}",
            Uuid::new_v4().simple(),
            extension_of(filename)
        );
        let url = format!(
            "{}/storage/v1/object/{}/{}",
            self.base_url, self.bucket, object_path
        );

        let size = data.len();
        let resp = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.service_role_key))
            .header("Content-Type", content_type)
            .body(data)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(Error::Storage(format!(
                "upload of {object_path}: {status} - {text}"
            )));
        }

        info!("Uploaded {} ({} bytes) to bucket {}", object_path, size, self.bucket);
        Ok(format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url, self.bucket, object_path
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_is_kept_and_lowercased() {
        assert_eq!(extension_of("map.PNG"), ".png");
        assert_eq!(extension_of("tavern.scene.jpg"), ".jpg");
    }

    #[test]
    fn test_missing_extension_is_empty() {
        assert_eq!(extension_of("README"), "");
    }
}
