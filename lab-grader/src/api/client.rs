//! Authenticated Sheets v4 client

use async_trait::async_trait;
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;

use super::auth::TokenInfo;
use super::error::{ApiError, status_error};
use super::models::{BatchGetResponse, BatchUpdateRequest, BatchUpdateResponse, ValueRange};

pub const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// The subset of the Sheets `values` API the grader talks to
#[async_trait]
pub trait SheetsApi: Send + Sync {
    /// `spreadsheets.values.get`
    async fn get_values(&self, spreadsheet_id: &str, range: &str) -> Result<ValueRange, ApiError>;

    /// `spreadsheets.values.batchGet`; value ranges come back in request order
    async fn batch_get_values(
        &self,
        spreadsheet_id: &str,
        ranges: &[String],
    ) -> Result<Vec<ValueRange>, ApiError>;

    /// `spreadsheets.values.batchUpdate`
    async fn batch_update_values(
        &self,
        spreadsheet_id: &str,
        request: &BatchUpdateRequest,
    ) -> Result<BatchUpdateResponse, ApiError>;
}

/// HTTP client carrying a bearer token for the whole run
pub struct SheetsClient {
    http: reqwest::Client,
    token: TokenInfo,
}

impl SheetsClient {
    pub fn new(token: TokenInfo) -> Self {
        Self {
            http: reqwest::Client::new(),
            token,
        }
    }

    fn spreadsheet_url(&self, spreadsheet_id: &str) -> String {
        format!("{}/{}", SHEETS_API_BASE, urlencoding::encode(spreadsheet_id))
    }

    fn values_url(&self, spreadsheet_id: &str, range: &str) -> String {
        format!(
            "{}/values/{}",
            self.spreadsheet_url(spreadsheet_id),
            urlencoding::encode(range)
        )
    }

    async fn send<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        url: &str,
        request: RequestBuilder,
    ) -> Result<T, ApiError> {
        log::debug!("Sheets {} -> {}", operation, url);

        let response = request
            .bearer_auth(&self.token.token)
            .send()
            .await
            .map_err(|source| ApiError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|source| ApiError::Transport {
            url: url.to_string(),
            source,
        })?;

        if !status.is_success() {
            return Err(status_error(operation, status.as_u16(), &body));
        }

        serde_json::from_str(&body).map_err(|source| ApiError::Decode { operation, source })
    }
}

#[async_trait]
impl SheetsApi for SheetsClient {
    async fn get_values(&self, spreadsheet_id: &str, range: &str) -> Result<ValueRange, ApiError> {
        let url = self.values_url(spreadsheet_id, range);
        self.send("values.get", &url, self.http.get(&url)).await
    }

    async fn batch_get_values(
        &self,
        spreadsheet_id: &str,
        ranges: &[String],
    ) -> Result<Vec<ValueRange>, ApiError> {
        let url = format!("{}/values:batchGet", self.spreadsheet_url(spreadsheet_id));
        let query: Vec<(&str, &str)> = ranges.iter().map(|r| ("ranges", r.as_str())).collect();

        let response: BatchGetResponse = self
            .send("values.batchGet", &url, self.http.get(&url).query(&query))
            .await?;
        Ok(response.value_ranges)
    }

    async fn batch_update_values(
        &self,
        spreadsheet_id: &str,
        request: &BatchUpdateRequest,
    ) -> Result<BatchUpdateResponse, ApiError> {
        let url = format!("{}/values:batchUpdate", self.spreadsheet_url(spreadsheet_id));
        self.send("values.batchUpdate", &url, self.http.post(&url).json(request))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> SheetsClient {
        SheetsClient::new(TokenInfo {
            token: "ya29.test".to_string(),
            refresh_token: None,
            token_uri: "https://oauth2.googleapis.com/token".to_string(),
            client_id: "client".to_string(),
            client_secret: "secret".to_string(),
            scopes: vec![],
            expiry: None,
        })
    }

    #[test]
    fn test_values_url_encodes_range() {
        let url = client().values_url("1AbC", "'Lista de prezenta'!D2:E");
        assert_eq!(
            url,
            "https://sheets.googleapis.com/v4/spreadsheets/1AbC/values/%27Lista%20de%20prezenta%27%21D2%3AE"
        );
    }

    #[test]
    fn test_batch_urls() {
        let client = client();
        assert_eq!(
            format!("{}/values:batchGet", client.spreadsheet_url("abc")),
            "https://sheets.googleapis.com/v4/spreadsheets/abc/values:batchGet"
        );
    }
}
