/// Attachment Storage
///
/// Trừu tượng hóa object storage cho attachments. Metadata nằm trong
/// Postgres, còn bytes nằm sau trait này, production có thể thay bằng
/// S3-compatible backend mà không đụng tới service layer.
use std::path::Path;
use uuid::Uuid;

use crate::api::error;
use crate::modules::attachment::model::StoredFile;

#[async_trait::async_trait]
pub trait AttachmentStorage {
    /// Store one file, returning the key used for later deletion and the
    /// public URL handed to clients.
    async fn save(&self, file_name: &str, bytes: &[u8]) -> Result<StoredFile, error::SystemError>;

    async fn delete(&self, key: &str) -> Result<(), error::SystemError>;
}

/// Disk-backed storage, serving files under a static route.
#[derive(Clone)]
pub struct LocalAttachmentStorage {
    upload_dir: String,
    base_url: String,
}

impl LocalAttachmentStorage {
    pub fn new(upload_dir: String, base_url: String) -> Self {
        Self { upload_dir, base_url }
    }

    /// Generate unique filename, keeping the original extension
    fn generate_filename(&self, original_filename: &str) -> String {
        let extension =
            Path::new(original_filename).extension().and_then(|ext| ext.to_str()).unwrap_or("");
        let uuid = Uuid::now_v7();
        if extension.is_empty() {
            uuid.to_string()
        } else {
            format!("{}.{}", uuid, extension)
        }
    }
}

#[async_trait::async_trait]
impl AttachmentStorage for LocalAttachmentStorage {
    async fn save(&self, file_name: &str, bytes: &[u8]) -> Result<StoredFile, error::SystemError> {
        tokio::fs::create_dir_all(&self.upload_dir).await?;

        let key = self.generate_filename(file_name);
        let file_path = format!("{}/{}", self.upload_dir, key);
        tokio::fs::write(&file_path, bytes).await?;

        let url = format!("{}/{}", self.base_url, key);
        Ok(StoredFile { key, url })
    }

    async fn delete(&self, key: &str) -> Result<(), error::SystemError> {
        let file_path = format!("{}/{}", self.upload_dir, key);
        tokio::fs::remove_file(&file_path).await?;
        Ok(())
    }
}
