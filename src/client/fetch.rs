use crate::error::{GSheetsError, Result};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use tracing::{debug, instrument};

/// Downloads the CSV export of a public spreadsheet.
#[async_trait]
pub trait CsvFetcher: Send + Sync {
    async fn fetch_csv(&self, url: &str) -> Result<Vec<u8>>;
}

#[derive(Debug, Clone, Default)]
pub struct HttpCsvFetcher {
    client: Client,
}

impl HttpCsvFetcher {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CsvFetcher for HttpCsvFetcher {
    #[instrument(name = "Downloading CSV export", skip_all)]
    async fn fetch_csv(&self, url: &str) -> Result<Vec<u8>> {
        debug!(url, "Requesting export");
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(GSheetsError::SpreadsheetNotFound(url.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GSheetsError::Export(format!(
                "Failed to export spreadsheet: {} - {}",
                status, body
            )));
        }

        // Private spreadsheets redirect to a sign-in page instead of failing.
        let is_html = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("text/html"));
        if is_html {
            return Err(GSheetsError::Export(
                "Spreadsheet is not shared publicly".to_string(),
            ));
        }

        let body = response.bytes().await?;
        debug!(bytes = body.len(), "Downloaded export");

        Ok(body.to_vec())
    }
}
