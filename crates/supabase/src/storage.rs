use bytes::Bytes;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{Credentials, SupabaseError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketSpec {
    pub name: &'static str,
    pub public: bool,
}

/// Uploaded profile photos; public so the vision model can fetch them.
pub const PROFILE_IMAGES: BucketSpec = BucketSpec {
    name: "profile-images",
    public: true,
};

/// Evidence vault; objects are only reachable with credentials.
pub const VAULT_FILES: BucketSpec = BucketSpec {
    name: "vault-files",
    public: false,
};

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct BucketInfo {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub public: bool,
}

#[derive(Serialize)]
struct CreateBucket<'a> {
    id: &'a str,
    name: &'a str,
    public: bool,
}

#[derive(Debug, Clone)]
pub struct StorageClient {
    http: Client,
    credentials: Credentials,
}

impl StorageClient {
    pub fn new(http: Client, credentials: Credentials) -> Self {
        Self { http, credentials }
    }

    pub async fn list_buckets(&self) -> Result<Vec<BucketInfo>, SupabaseError> {
        let request = self.http.get(self.credentials.url("storage/v1/bucket"));
        let response = self.credentials.authorize(request).send().await?;
        if !response.status().is_success() {
            return Err(SupabaseError::from_response("list buckets", response).await);
        }
        Ok(response.json().await?)
    }

    pub async fn create_bucket(&self, spec: BucketSpec) -> Result<(), SupabaseError> {
        let request = self
            .http
            .post(self.credentials.url("storage/v1/bucket"))
            .json(&CreateBucket {
                id: spec.name,
                name: spec.name,
                public: spec.public,
            });
        let response = self.credentials.authorize(request).send().await?;
        if !response.status().is_success() {
            return Err(SupabaseError::from_response("create bucket", response).await);
        }
        Ok(())
    }

    /// Creates the bucket on first use. Returns whether it had to be created.
    pub async fn ensure_bucket(&self, spec: BucketSpec) -> Result<bool, SupabaseError> {
        let buckets = self.list_buckets().await?;
        if !needs_creation(&buckets, spec) {
            return Ok(false);
        }
        self.create_bucket(spec).await?;
        info!(bucket = spec.name, public = spec.public, "storage bucket created");
        Ok(true)
    }

    pub async fn upload(
        &self,
        bucket: BucketSpec,
        object_path: &str,
        content_type: &str,
        body: Bytes,
    ) -> Result<(), SupabaseError> {
        let size = body.len();
        let url = self.credentials.url(&format!(
            "storage/v1/object/{}/{}",
            bucket.name,
            encode_object_path(object_path)
        ));
        let request = self
            .http
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .header("x-upsert", "false")
            .body(body);
        let response = self.credentials.authorize(request).send().await?;
        if !response.status().is_success() {
            return Err(SupabaseError::from_response("upload object", response).await);
        }
        info!(bucket = bucket.name, path = object_path, size, "object uploaded");
        Ok(())
    }

    pub fn public_url(&self, bucket: BucketSpec, object_path: &str) -> String {
        self.credentials.url(&format!(
            "storage/v1/object/public/{}/{}",
            bucket.name,
            encode_object_path(object_path)
        ))
    }
}

fn needs_creation(buckets: &[BucketInfo], spec: BucketSpec) -> bool {
    !buckets
        .iter()
        .any(|bucket| bucket.name == spec.name || bucket.id == spec.name)
}

/// Percent-encodes each path segment, keeping the separators.
pub fn encode_object_path(path: &str) -> String {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
