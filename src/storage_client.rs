// Object storage client (Supabase Storage REST API)

use async_trait::async_trait;
use reqwest::Client;

use crate::pipeline::services::{BoxError, ObjectStorage};

#[derive(Clone)]
pub struct StorageClient {
    client: Client,
    base_url: String,
    service_key: String,
    bucket: String,
}

impl StorageClient {
    pub fn new(base_url: &str, service_key: String, bucket: String) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key,
            bucket,
        }
    }

    fn object_path(&self, name: &str) -> String {
        format!("{}/{}", self.bucket, urlencoding::encode(name))
    }

    fn upload_url(&self, name: &str) -> String {
        format!("{}/storage/v1/object/{}", self.base_url, self.object_path(name))
    }
}

#[async_trait]
impl ObjectStorage for StorageClient {
    async fn upload(
        &self,
        name: &str,
        bytes: Vec<u8>,
        content_type: &str,
        upsert: bool,
    ) -> Result<(), BoxError> {
        let size = bytes.len();
        let response = self
            .client
            .post(self.upload_url(name))
            .bearer_auth(&self.service_key)
            .header("apikey", &self.service_key)
            .header("Content-Type", content_type)
            .header("x-upsert", if upsert { "true" } else { "false" })
            .body(bytes)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(format!("Storage upload error ({}): {}", status, error_text).into());
        }

        tracing::info!(bucket = %self.bucket, object = %name, bytes = size, "📦 Uploaded object");
        Ok(())
    }

    fn public_url(&self, name: &str) -> String {
        format!("{}/storage/v1/object/public/{}", self.base_url, self.object_path(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_urls() {
        let client = StorageClient::new("https://proj.supabase.co/", "key".to_string(), "videos".to_string());
        assert_eq!(
            client.upload_url("audio_42.mp3"),
            "https://proj.supabase.co/storage/v1/object/videos/audio_42.mp3"
        );
        assert_eq!(
            client.public_url("audio_42.mp3"),
            "https://proj.supabase.co/storage/v1/object/public/videos/audio_42.mp3"
        );
    }

    #[test]
    fn test_object_names_are_escaped() {
        let client = StorageClient::new("https://proj.supabase.co", "key".to_string(), "videos".to_string());
        assert!(client.public_url("a b.mp3").ends_with("/videos/a%20b.mp3"));
    }
}
