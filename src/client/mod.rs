mod fetch;
mod options;
mod public;
mod service_account;

pub use fetch::{CsvFetcher, HttpCsvFetcher};
pub use options::{ReadOptions, TargetOptions, WriteOptions};
pub use public::PublicSpreadsheetClient;
pub use service_account::ServiceAccountClient;

use crate::config::{ConnectionConfig, Mode};
use crate::error::{GSheetsError, Result};
use crate::models::{Frame, Worksheet};
use crate::sheets::{ClearResponse, SheetsClient, service_account_key};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Spreadsheet, worksheet and folder used when a call does not name them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Defaults {
    pub spreadsheet: Option<String>,
    pub worksheet: Option<Worksheet>,
    pub folder_id: Option<String>,
}

impl Defaults {
    pub fn from_config(config: &ConnectionConfig) -> Self {
        Self {
            spreadsheet: config.spreadsheet.clone(),
            worksheet: config.worksheet.clone(),
            folder_id: config.folder_id.clone(),
        }
    }

    /// The per-call spreadsheet, falling back to the default one.
    pub fn spreadsheet(&self, spreadsheet: Option<&str>) -> Result<String> {
        spreadsheet
            .filter(|s| !s.is_empty())
            .or(self.spreadsheet.as_deref())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .ok_or(GSheetsError::MissingSpreadsheet)
    }

    pub fn worksheet(&self, worksheet: Option<&Worksheet>) -> Option<Worksheet> {
        worksheet
            .filter(|w| !w.is_empty())
            .or(self.worksheet.as_ref())
            .filter(|w| !w.is_empty())
            .cloned()
    }

    pub fn folder_id(&self, folder_id: Option<&str>) -> Option<String> {
        folder_id
            .filter(|f| !f.is_empty())
            .or(self.folder_id.as_deref())
            .filter(|f| !f.is_empty())
            .map(str::to_string)
    }
}

/// Operations shared by public and service account connections.
#[async_trait]
pub trait GSheetsClient: Send + Sync {
    fn mode(&self) -> Mode;

    fn defaults(&self) -> &Defaults;

    /// Replace the default spreadsheet and worksheet.
    fn set_default(&mut self, spreadsheet: Option<String>, worksheet: Option<Worksheet>);

    /// Read a worksheet into a table.
    async fn read(&self, options: ReadOptions) -> Result<Frame>;

    /// Run SQL where each table name refers to a worksheet.
    async fn query(&self, sql: &str, options: ReadOptions) -> Result<Frame>;

    /// Add a worksheet, creating the spreadsheet if needed, and write `data`.
    async fn create(&self, options: WriteOptions) -> Result<Option<Frame>>;

    /// Replace the contents of a worksheet with `data`.
    async fn update(&self, options: WriteOptions) -> Result<Option<Frame>>;

    /// Clear all values of a worksheet.
    async fn clear(&self, options: TargetOptions) -> Result<ClearResponse>;
}

/// Build the client for a connection's configuration.
///
/// Service account credentials select the authenticated client, anything
/// else the public one.
#[instrument(name = "Connecting", skip_all)]
pub async fn connect(config: &ConnectionConfig) -> Result<Box<dyn GSheetsClient>> {
    let defaults = Defaults::from_config(config);
    let mode = config.mode();
    debug!(%mode, "Selected client");

    match mode {
        Mode::ServiceAccount => {
            let key = service_account_key(&config.credentials)?;
            let api = SheetsClient::new(key).await?;
            Ok(Box::new(ServiceAccountClient::new(api, defaults)))
        }
        Mode::Public => Ok(Box::new(PublicSpreadsheetClient::new(
            HttpCsvFetcher::new(),
            defaults,
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> Defaults {
        Defaults {
            spreadsheet: Some("configured".to_string()),
            worksheet: Some(Worksheet::from("Example 1")),
            folder_id: None,
        }
    }

    #[test]
    fn test_call_overrides_default_spreadsheet() {
        assert_eq!(defaults().spreadsheet(Some("call")).unwrap(), "call");
        assert_eq!(defaults().spreadsheet(None).unwrap(), "configured");
        assert_eq!(defaults().spreadsheet(Some("")).unwrap(), "configured");
    }

    #[test]
    fn test_missing_spreadsheet() {
        let err = Defaults::default().spreadsheet(None).unwrap_err();
        assert!(matches!(err, GSheetsError::MissingSpreadsheet));
        assert_eq!(err.to_string(), "Spreadsheet must be specified");
    }

    #[test]
    fn test_worksheet_fallback() {
        assert_eq!(
            defaults().worksheet(Some(&Worksheet::Id(0))),
            Some(Worksheet::Id(0))
        );
        assert_eq!(defaults().worksheet(None), Some(Worksheet::from("Example 1")));
        assert_eq!(Defaults::default().worksheet(None), None);
    }

    #[tokio::test]
    async fn test_connect_without_credentials_is_public() {
        let client = connect(&ConnectionConfig::default()).await.unwrap();

        assert_eq!(client.mode(), Mode::Public);
        assert_eq!(client.defaults(), &Defaults::default());
    }
}
