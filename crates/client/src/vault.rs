use bytes::Bytes;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;
use uuid::Uuid;
use veritas_scanner::image_content_type;
use veritas_supabase::{StorageClient, SupabaseError, VAULT_FILES};

#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{path} is not a file")]
    NotAFile { path: String },
    #[error("failed to store evidence: {0}")]
    Storage(#[from] SupabaseError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredEvidence {
    pub bucket: &'static str,
    pub object_path: String,
    pub content_type: String,
    pub size: u64,
}

/// Private evidence storage. Objects are never publicly readable.
pub struct Vault {
    storage: StorageClient,
    bucket_ready: AtomicBool,
}

impl Vault {
    pub fn new(storage: StorageClient) -> Self {
        Self {
            storage,
            bucket_ready: AtomicBool::new(false),
        }
    }

    pub async fn store(&self, path: &Path) -> Result<StoredEvidence, VaultError> {
        let read_error = |source| VaultError::Read {
            path: path.display().to_string(),
            source,
        };
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| VaultError::NotAFile {
                path: path.display().to_string(),
            })?;
        let bytes = tokio::fs::read(path).await.map_err(read_error)?;
        let content_type = evidence_content_type(path).to_string();

        if !self.bucket_ready.load(Ordering::Acquire) {
            self.storage.ensure_bucket(VAULT_FILES).await?;
            self.bucket_ready.store(true, Ordering::Release);
        }
        let object_path = evidence_path(Uuid::new_v4(), &file_name);
        let size = bytes.len() as u64;
        self.storage
            .upload(VAULT_FILES, &object_path, &content_type, Bytes::from(bytes))
            .await?;
        info!(path = %object_path, size, "evidence stored");
        Ok(StoredEvidence {
            bucket: VAULT_FILES.name,
            object_path,
            content_type,
            size,
        })
    }
}

fn evidence_path(id: Uuid, file_name: &str) -> String {
    format!("{id}/{file_name}")
}

/// Screenshots, exported chats, documents and recordings.
fn evidence_content_type(path: &Path) -> &'static str {
    if let Some(image) = image_content_type(path) {
        return image;
    }
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain",
        Some("mp4") => "video/mp4",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeBackend;
    use reqwest::Client;
    use serde_json::Value;
    use veritas_supabase::Credentials;

    #[test]
    fn evidence_goes_under_a_fresh_folder() {
        let id = Uuid::new_v4();
        assert_eq!(
            evidence_path(id, "chat log.txt"),
            format!("{id}/chat log.txt")
        );
        assert_ne!(
            evidence_path(Uuid::new_v4(), "a.png"),
            evidence_path(Uuid::new_v4(), "a.png")
        );
    }

    #[test]
    fn evidence_types_cover_documents_and_recordings() {
        assert_eq!(evidence_content_type(Path::new("shot.PNG")), "image/png");
        assert_eq!(evidence_content_type(Path::new("report.pdf")), "application/pdf");
        assert_eq!(evidence_content_type(Path::new("chat.txt")), "text/plain");
        assert_eq!(evidence_content_type(Path::new("call.mp4")), "video/mp4");
        assert_eq!(
            evidence_content_type(Path::new("archive.zip")),
            "application/octet-stream"
        );
    }

    #[tokio::test]
    async fn store_creates_private_bucket_once_then_uploads() {
        let dir = std::env::temp_dir().join(format!("veritas-vault-ok-{}", std::process::id()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let file = dir.join("chat log.txt");
        tokio::fs::write(&file, b"he asked for gift cards").await.unwrap();

        let backend = FakeBackend::answering(200, Value::Null);
        let base = backend.serve().await;
        let vault = Vault::new(StorageClient::new(Client::new(), Credentials::new(base, "anon")));

        let first = vault.store(&file).await.unwrap();
        assert_eq!(first.bucket, "vault-files");
        assert_eq!(first.content_type, "text/plain");
        assert_eq!(first.size, 23);
        assert!(first.object_path.ends_with("/chat log.txt"));
        let second = vault.store(&file).await.unwrap();
        assert_ne!(first.object_path, second.object_path);

        let entries = backend.entries();
        assert_eq!(entries.len(), 4, "{entries:?}");
        assert_eq!(entries[0], "list");
        assert_eq!(entries[1], "create vault-files public=false");
        let folder = first.object_path.trim_end_matches("/chat log.txt");
        assert_eq!(
            entries[2],
            format!("upload /storage/v1/object/vault-files/{folder}/chat%20log.txt key=anon bytes=23")
        );
        assert!(entries[3].starts_with("upload /storage/v1/object/vault-files/"));

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn missing_file_fails_before_any_request() {
        let vault = Vault::new(StorageClient::new(
            Client::new(),
            Credentials::new("http://127.0.0.1:9", "anon"),
        ));
        let err = vault
            .store(Path::new("/nonexistent/veritas/evidence.png"))
            .await
            .unwrap_err();
        assert!(matches!(err, VaultError::Read { .. }));
    }

    #[tokio::test]
    async fn storage_failure_is_reported() {
        let dir = std::env::temp_dir().join(format!("veritas-vault-{}", std::process::id()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let file = dir.join("screenshot.png");
        tokio::fs::write(&file, b"png").await.unwrap();

        let vault = Vault::new(StorageClient::new(
            Client::new(),
            Credentials::new("http://127.0.0.1:9", "anon"),
        ));
        let err = vault.store(&file).await.unwrap_err();
        assert!(matches!(err, VaultError::Storage(SupabaseError::Transport(_))));

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }
}
