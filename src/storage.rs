//! Storage module for uploading flank images to the hosted blob bucket.

use anyhow::{ anyhow, Result };
use chrono::Utc;
use rand::Rng;
use std::path::Path;
use tracing::debug;

use crate::db_client::DatabaseConfig;

/// Bucket holding all tiger and elephant flank imagery.
pub const IMAGE_BUCKET: &str = "tiger-images";

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub storage_url: String,
    pub anon_key: String,
    pub bucket_name: String,
}

impl StorageConfig {
    pub fn from_database_config(config: &DatabaseConfig) -> Self {
        Self {
            storage_url: config.storage_url(),
            anon_key: config.anon_key.clone(),
            bucket_name: IMAGE_BUCKET.to_string(),
        }
    }
}

/// An image of one animal flank, as submitted from the field.
#[derive(Debug, Clone, PartialEq)]
pub struct FlankImage {
    pub file_name: String,
    pub data: Vec<u8>,
}

impl FlankImage {
    pub fn new(file_name: impl Into<String>, data: Vec<u8>) -> Self {
        Self { file_name: file_name.into(), data }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| anyhow!("Invalid image path: {}", path.display()))?
            .to_string();
        let data = std::fs::read(path)?;
        Ok(Self { file_name, data })
    }

    pub fn extension(&self) -> &str {
        self.file_name.rsplit('.').next().unwrap_or("jpg")
    }

    pub fn content_type(&self) -> &'static str {
        match self.extension().to_lowercase().as_str() {
            "png" => "image/png",
            "webp" => "image/webp",
            "gif" => "image/gif",
            _ => "image/jpeg",
        }
    }
}

/// Generates a per-upload object name: `{side}-{timestamp}-{random}.{ext}`.
pub fn object_name(side: &str, file_name: &str) -> String {
    let ext = file_name.rsplit('.').next().unwrap_or("jpg");
    let nonce: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("{}-{}-{}.{}", side, Utc::now().timestamp_millis(), nonce, ext)
}

pub struct StorageClient {
    config: StorageConfig,
    http_client: reqwest::Client,
}

impl StorageClient {
    pub fn new(config: StorageConfig) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::AUTHORIZATION,
            reqwest::header::HeaderValue
                ::from_str(&format!("Bearer {}", config.anon_key))
                .map_err(|e| anyhow!("Invalid auth header: {}", e))?,
        );
        headers.insert(
            "apikey",
            reqwest::header::HeaderValue
                ::from_str(&config.anon_key)
                .map_err(|e| anyhow!("Invalid apikey header: {}", e))?,
        );

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| anyhow!("Failed to build HTTP client: {}", e))?;

        Ok(Self { config, http_client })
    }

    /// Uploads an object into the image bucket and returns its public URL.
    pub async fn upload(&self, object_path: &str, image: &FlankImage) -> Result<String> {
        let upload_url = format!(
            "{}/object/{}/{}",
            self.config.storage_url,
            self.config.bucket_name,
            object_path
        );

        let response = self.http_client
            .post(&upload_url)
            .header("Content-Type", image.content_type())
            // Allow overwriting existing files (avoids 409 Conflict)
            .header("x-upsert", "true")
            .body(image.data.clone())
            .send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow!("Upload failed: HTTP {} - {}", status, error_text));
        }

        let public_url = self.public_url(object_path);
        debug!("Uploaded {} to {}", image.file_name, public_url);

        Ok(public_url)
    }

    /// Public URL accessor for a stored object.
    pub fn public_url(&self, object_path: &str) -> String {
        format!(
            "{}/object/public/{}/{}",
            self.config.storage_url,
            self.config.bucket_name,
            object_path
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_name_carries_side_and_extension() {
        let name = object_name("left", "flank.png");
        assert!(name.starts_with("left-"));
        assert!(name.ends_with(".png"));

        let name = object_name("right", "no_extension");
        assert!(name.starts_with("right-"));
        assert!(name.ends_with(".no_extension"));
    }

    #[test]
    fn object_names_are_unique_per_upload() {
        let a = object_name("left", "flank.jpg");
        let b = object_name("left", "flank.jpg");
        assert_ne!(a, b);
    }

    #[test]
    fn content_type_follows_extension() {
        assert_eq!(FlankImage::new("a.PNG", vec![]).content_type(), "image/png");
        assert_eq!(FlankImage::new("a.jpg", vec![]).content_type(), "image/jpeg");
        assert_eq!(FlankImage::new("noext", vec![]).content_type(), "image/jpeg");
    }

    #[test]
    fn public_url_points_into_the_bucket() {
        let config = StorageConfig {
            storage_url: "https://demo.supabase.co/storage/v1".to_string(),
            anon_key: "anon".to_string(),
            bucket_name: IMAGE_BUCKET.to_string(),
        };
        let client = StorageClient::new(config).unwrap();
        assert_eq!(
            client.public_url("tiger-identification/left-1-2.jpg"),
            "https://demo.supabase.co/storage/v1/object/public/tiger-images/tiger-identification/left-1-2.jpg"
        );
    }
}
