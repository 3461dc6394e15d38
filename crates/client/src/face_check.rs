use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, StatusCode};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{info, warn};
use veritas_protocol::{
    ErrorBody, FacialRecognitionRequest, FacialRecognitionResponse, FACIAL_RECOGNITION_PATH,
};
use veritas_scanner::{image_content_type, validate_image, ImageRejection};
use veritas_supabase::{StorageClient, SupabaseError, PROFILE_IMAGES};

use crate::join_base_path;

#[derive(Debug, thiserror::Error)]
pub enum FaceCheckError {
    #[error(transparent)]
    Rejected(#[from] ImageRejection),
    #[error("no image selected")]
    NoImage,
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to upload image: {0}")]
    Storage(#[from] SupabaseError),
    #[error("Rate limit exceeded. Please try again in a moment.")]
    RateLimited,
    #[error("Service credits exhausted. Please try again later.")]
    CreditsExhausted,
    #[error("analysis failed: {0}")]
    Analysis(String),
    #[error("analysis request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedImage {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

/// Turns a selected image into a risk assessment.
#[async_trait]
pub trait ImageAnalyzer: Send + Sync {
    async fn analyze(
        &self,
        image: &SelectedImage,
    ) -> Result<FacialRecognitionResponse, FaceCheckError>;
}

/// Uploads to the public profile bucket and asks the facial-recognition
/// function about the resulting URL.
pub struct RemoteImageAnalyzer {
    storage: StorageClient,
    http: Client,
    endpoint: String,
    publishable_key: String,
    bucket_ready: AtomicBool,
}

impl RemoteImageAnalyzer {
    pub fn new(
        storage: StorageClient,
        http: Client,
        functions_url: &str,
        publishable_key: impl Into<String>,
    ) -> Self {
        Self {
            storage,
            http,
            endpoint: join_base_path(functions_url, FACIAL_RECOGNITION_PATH),
            publishable_key: publishable_key.into(),
            bucket_ready: AtomicBool::new(false),
        }
    }

    async fn upload(&self, image: &SelectedImage) -> Result<String, FaceCheckError> {
        if !self.bucket_ready.load(Ordering::Acquire) {
            self.storage.ensure_bucket(PROFILE_IMAGES).await?;
            self.bucket_ready.store(true, Ordering::Release);
        }
        let object_path = upload_path(unix_millis(), &image.file_name);
        self.storage
            .upload(
                PROFILE_IMAGES,
                &object_path,
                &image.content_type,
                image.bytes.clone(),
            )
            .await?;
        Ok(self.storage.public_url(PROFILE_IMAGES, &object_path))
    }
}

#[async_trait]
impl ImageAnalyzer for RemoteImageAnalyzer {
    async fn analyze(
        &self,
        image: &SelectedImage,
    ) -> Result<FacialRecognitionResponse, FaceCheckError> {
        let image_url = self.upload(image).await?;
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.publishable_key)
            .header("apikey", &self.publishable_key)
            .json(&FacialRecognitionRequest {
                image_url: image_url.clone(),
            })
            .send()
            .await?;
        match response.status() {
            StatusCode::TOO_MANY_REQUESTS => return Err(FaceCheckError::RateLimited),
            StatusCode::PAYMENT_REQUIRED => return Err(FaceCheckError::CreditsExhausted),
            status if !status.is_success() => {
                let message = match response.json::<ErrorBody>().await {
                    Ok(body) => body.error,
                    Err(_) => format!("status {status}"),
                };
                return Err(FaceCheckError::Analysis(message));
            }
            _ => {}
        }
        let result: FacialRecognitionResponse = response.json().await?;
        info!(
            image_url = %image_url,
            risk = %result.risk_level,
            fallback = result.is_fallback(),
            "face check completed"
        );
        Ok(result)
    }
}

/// State of one face check: the chosen image and the last result.
#[derive(Debug, Default)]
pub struct FaceCheckSession {
    selection: Option<SelectedImage>,
    result: Option<FacialRecognitionResponse>,
}

impl FaceCheckSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selection(&self) -> Option<&SelectedImage> {
        self.selection.as_ref()
    }

    pub fn result(&self) -> Option<&FacialRecognitionResponse> {
        self.result.as_ref()
    }

    /// Validates the image; on rejection the session is left untouched.
    pub fn select(
        &mut self,
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Bytes,
    ) -> Result<(), FaceCheckError> {
        let content_type = content_type.into();
        validate_image(&content_type, bytes.len() as u64)?;
        self.selection = Some(SelectedImage {
            file_name: file_name.into(),
            content_type,
            bytes,
        });
        self.result = None;
        Ok(())
    }

    /// Reads and selects a file. The size is checked before the file is read.
    pub async fn select_file(&mut self, path: &Path) -> Result<(), FaceCheckError> {
        let read_error = |source| FaceCheckError::Read {
            path: path.display().to_string(),
            source,
        };
        let content_type = image_content_type(path).unwrap_or("application/octet-stream");
        let size = tokio::fs::metadata(path).await.map_err(read_error)?.len();
        validate_image(content_type, size)?;
        let bytes = tokio::fs::read(path).await.map_err(read_error)?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        self.select(file_name, content_type, Bytes::from(bytes))
    }

    pub async fn analyze(
        &mut self,
        analyzer: &dyn ImageAnalyzer,
    ) -> Result<&FacialRecognitionResponse, FaceCheckError> {
        let image = self.selection.as_ref().ok_or(FaceCheckError::NoImage)?;
        let result = analyzer.analyze(image).await.map_err(|err| {
            warn!(error = %err, file = %image.file_name, "face check failed");
            err
        })?;
        Ok(&*self.result.insert(result))
    }
}

fn unix_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or_default()
}

fn upload_path(millis: u128, file_name: &str) -> String {
    let name = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name);
    format!("public/{millis}-{name}")
}
