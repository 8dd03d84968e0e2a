use uuid::Uuid;

/// New attachment metadata to insert into database
#[derive(Debug, Clone)]
pub struct NewAttachment {
    pub message_id: Uuid,
    pub uploaded_by: Uuid,
    pub url: String,
    pub file_name: String,
    pub mime_type: String,
    pub file_size: i64,
}

/// Raw file taken from the multipart request, before it reaches storage
#[derive(Debug, Clone)]
pub struct AttachmentUpload {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Kết quả lưu file vào storage: `key` dùng để xóa, `url` trả cho client
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub key: String,
    pub url: String,
}
