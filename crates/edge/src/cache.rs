use async_trait::async_trait;
use serde::Serialize;
use veritas_protocol::{FacialRecognitionResponse, RiskLevel};
use veritas_supabase::{RestClient, SupabaseError};

/// Remote record of image analyses. Failures never reach the caller.
#[async_trait]
pub(crate) trait AnalysisCache: Send + Sync {
    async fn record(
        &self,
        image_url: &str,
        result: &FacialRecognitionResponse,
    ) -> Result<(), SupabaseError>;
}

#[derive(Debug, Serialize, PartialEq)]
pub(crate) struct AnalysisRow<'a> {
    pub(crate) image_url: &'a str,
    pub(crate) analysis: &'a str,
    pub(crate) risk_level: RiskLevel,
    pub(crate) confidence_score: Option<u8>,
    pub(crate) is_fallback: bool,
}

impl<'a> AnalysisRow<'a> {
    pub(crate) fn new(image_url: &'a str, result: &'a FacialRecognitionResponse) -> Self {
        Self {
            image_url,
            analysis: &result.analysis,
            risk_level: result.risk_level,
            confidence_score: result.confidence_score,
            is_fallback: result.is_fallback(),
        }
    }
}

pub(crate) struct SupabaseAnalysisCache {
    rest: RestClient,
    table: String,
}

impl SupabaseAnalysisCache {
    pub(crate) fn new(rest: RestClient, table: impl Into<String>) -> Self {
        Self {
            rest,
            table: table.into(),
        }
    }
}

#[async_trait]
impl AnalysisCache for SupabaseAnalysisCache {
    async fn record(
        &self,
        image_url: &str,
        result: &FacialRecognitionResponse,
    ) -> Result<(), SupabaseError> {
        self.rest
            .insert(&self.table, &AnalysisRow::new(image_url, result))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_uses_snake_case_columns() {
        let result = FacialRecognitionResponse::fallback("n/a", "bad reply");
        let row = AnalysisRow::new("https://cdn.example/p.jpg", &result);
        let value = serde_json::to_value(&row).unwrap();
        assert_eq!(value["risk_level"], "medium");
        assert_eq!(value["is_fallback"], true);
        assert_eq!(value["image_url"], "https://cdn.example/p.jpg");
    }
}
