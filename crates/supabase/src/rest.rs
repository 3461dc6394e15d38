use reqwest::Client;
use serde::Serialize;

use crate::{Credentials, SupabaseError};

#[derive(Debug, Clone)]
pub struct RestClient {
    http: Client,
    credentials: Credentials,
}

impl RestClient {
    pub fn new(http: Client, credentials: Credentials) -> Self {
        Self { http, credentials }
    }

    pub fn table_url(&self, table: &str) -> String {
        self.credentials.url(&format!("rest/v1/{table}"))
    }

    /// Inserts one row without reading it back.
    pub async fn insert<T: Serialize + ?Sized>(
        &self,
        table: &str,
        row: &T,
    ) -> Result<(), SupabaseError> {
        let request = self
            .http
            .post(self.table_url(table))
            .header("Prefer", "return=minimal")
            .json(row);
        let response = self.credentials.authorize(request).send().await?;
        if !response.status().is_success() {
            return Err(SupabaseError::from_response("insert row", response).await);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_url_joins_base() {
        let client = RestClient::new(
            Client::new(),
            Credentials::new("http://localhost:54321", "service"),
        );
        assert_eq!(
            client.table_url("image_analyses"),
            "http://localhost:54321/rest/v1/image_analyses"
        );
    }

    #[tokio::test]
    async fn insert_reports_transport_failure() {
        let client = RestClient::new(
            Client::new(),
            Credentials::new("http://127.0.0.1:9", "service"),
        );
        let err = client
            .insert("image_analyses", &serde_json::json!({"risk_level": "low"}))
            .await
            .unwrap_err();
        assert!(matches!(err, SupabaseError::Transport(_)));
    }
}
