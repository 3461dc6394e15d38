#[derive(Debug, thiserror::Error)]
pub enum SupabaseError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{operation} failed status={status} body={body}")]
    Status {
        operation: &'static str,
        status: u16,
        body: String,
    },
}

impl SupabaseError {
    pub(crate) async fn from_response(operation: &'static str, response: reqwest::Response) -> Self {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        SupabaseError::Status {
            operation,
            status,
            body,
        }
    }
}
