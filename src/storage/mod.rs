pub mod s3;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload to object store failed: {0}")]
    Upload(String),

    #[error("Delete from object store failed: {0}")]
    Delete(String),
}

/// Narrow put/delete surface over the blob store, held behind
/// `Arc<dyn ObjectStore>` so tests can substitute a fake.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Stores `bytes` under `key` and returns the object's public URL.
    async fn put_object(
        &self,
        key: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<String, StorageError>;

    async fn delete_object(&self, key: &str) -> Result<(), StorageError>;
}

/// One uploaded file, already decoded into memory by the multipart layer.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredObject {
    pub url: String,
    pub key: String,
}

/// Extracts the object key from a previously stored access URL.
/// Absent or unparseable input degrades to `None`, never an error.
pub fn key_from_url(url: Option<&str>) -> Option<String> {
    let parsed = Url::parse(url?).ok()?;
    let key = parsed.path().trim_start_matches('/');
    if key.is_empty() {
        None
    } else {
        Some(key.to_string())
    }
}

/// Builds a collision-resistant object key:
/// `{millis}_{name with whitespace replaced by underscores}{.ext}`.
pub fn storage_key(original_name: &str, timestamp_millis: i64) -> String {
    let (stem, extension) = match original_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, format!(".{ext}")),
        _ => (original_name, String::new()),
    };
    let stem: String = stem
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect();
    format!("{timestamp_millis}_{stem}{extension}")
}

/// The trailing `.ext` of a file name, dot included, or "" if there is none.
pub fn file_extension(name: &str) -> String {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!(".{ext}"),
        _ => String::new(),
    }
}

/// Uploads one file under a freshly derived key and reports where it landed.
/// Failures propagate untouched; there is no retry at this layer.
pub async fn upload_file(
    store: &dyn ObjectStore,
    file: &UploadedFile,
) -> Result<StoredObject, StorageError> {
    let key = storage_key(&file.file_name, Utc::now().timestamp_millis());
    let url = store
        .put_object(&key, file.bytes.clone(), &file.content_type)
        .await?;
    Ok(StoredObject { url, key })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_is_the_url_path_without_leading_slash() {
        assert_eq!(
            key_from_url(Some("https://host/bucket/key")),
            Some("bucket/key".to_string())
        );
        assert_eq!(
            key_from_url(Some(
                "https://my-bucket.s3.ap-southeast-1.amazonaws.com/1700000000000_notes.pdf"
            )),
            Some("1700000000000_notes.pdf".to_string())
        );
    }

    #[test]
    fn missing_or_malformed_urls_yield_no_key() {
        assert_eq!(key_from_url(None), None);
        assert_eq!(key_from_url(Some("not a url")), None);
        assert_eq!(key_from_url(Some("https://host")), None);
        assert_eq!(key_from_url(Some("https://host/")), None);
    }

    #[test]
    fn storage_key_replaces_whitespace_and_keeps_the_extension() {
        assert_eq!(
            storage_key("Report Final.pdf", 1700000000000),
            "1700000000000_Report_Final.pdf"
        );
        assert_eq!(
            storage_key("weekly\tplan 2.tar.gz", 42),
            "42_weekly_plan_2.tar.gz"
        );
    }

    #[test]
    fn storage_key_handles_names_without_extensions() {
        assert_eq!(storage_key("README", 7), "7_README");
        assert_eq!(storage_key(".env", 7), "7_.env");
    }

    #[test]
    fn file_extension_splits_on_the_final_dot() {
        assert_eq!(file_extension("notes.pdf"), ".pdf");
        assert_eq!(file_extension("archive.tar.gz"), ".gz");
        assert_eq!(file_extension("README"), "");
        assert_eq!(file_extension(".env"), "");
    }
}
