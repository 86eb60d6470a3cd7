use super::fetch::CsvFetcher;
use super::{Defaults, GSheetsClient, ReadOptions, TargetOptions, WriteOptions};
use crate::cache::ResultCache;
use crate::config::Mode;
use crate::error::{GSheetsError, Result};
use crate::locator::csv_export_url;
use crate::models::{CsvOptions, Frame, Worksheet};
use crate::sheets::ClearResponse;
use crate::sql;
use async_trait::async_trait;
use tracing::{debug, instrument};

const CREATE_UNSUPPORTED: &str =
    "Use Service Account authentication to enable CRUD methods on your Spreadsheets.";
const UPDATE_UNSUPPORTED: &str = "Public Spreadsheet cannot be written to, \
    use Service Account authentication to enable CRUD methods on your Spreadsheets.";
const CLEAR_UNSUPPORTED: &str = "Public Spreadsheet cannot be cleared, \
    use Service Account authentication to enable CRUD methods on your Spreadsheets.";

/// Read-only access to publicly shared spreadsheets through their CSV export.
pub struct PublicSpreadsheetClient<F: CsvFetcher> {
    fetcher: F,
    defaults: Defaults,
    cache: ResultCache,
}

impl<F: CsvFetcher> PublicSpreadsheetClient<F> {
    pub fn new(fetcher: F, defaults: Defaults) -> Self {
        Self {
            fetcher,
            defaults,
            cache: ResultCache::new(),
        }
    }

    fn export_url(&self, target: &TargetOptions) -> Result<String> {
        let spreadsheet = self.defaults.spreadsheet(target.spreadsheet.as_deref())?;
        let worksheet = self.defaults.worksheet(target.worksheet.as_ref());
        Ok(csv_export_url(&spreadsheet, worksheet.as_ref()))
    }

    async fn fetch_frame(&self, url: &str, csv: &CsvOptions) -> Result<Frame> {
        let data = self.fetcher.fetch_csv(url).await?;
        Frame::from_csv(&data, csv)
    }

    async fn run_query(&self, sql: &str, url: &str, csv: &CsvOptions) -> Result<Frame> {
        let references = sql::table_references(sql)?;
        if references.is_empty() {
            return sql::execute(sql, Vec::new()).await;
        }

        // Every table name refers to the one selected worksheet.
        let frame = self.fetch_frame(url, csv).await?;
        let tables = references
            .into_iter()
            .map(|reference| {
                debug!(table = %reference, "Binding table to worksheet");
                (reference, frame.clone())
            })
            .collect();

        sql::execute(sql, tables).await
    }
}

#[async_trait]
impl<F: CsvFetcher> GSheetsClient for PublicSpreadsheetClient<F> {
    fn mode(&self) -> Mode {
        Mode::Public
    }

    fn defaults(&self) -> &Defaults {
        &self.defaults
    }

    fn set_default(&mut self, spreadsheet: Option<String>, worksheet: Option<Worksheet>) {
        self.defaults.spreadsheet = spreadsheet;
        self.defaults.worksheet = worksheet;
    }

    #[instrument(name = "Reading public spreadsheet", skip_all)]
    async fn read(&self, options: ReadOptions) -> Result<Frame> {
        let url = self.export_url(&options.target)?;
        let key = format!("read|{}|{:?}", url, options.csv);

        self.cache
            .get_or_load(options.cache, key, self.fetch_frame(&url, &options.csv))
            .await
    }

    #[instrument(name = "Querying public spreadsheet", skip_all)]
    async fn query(&self, sql: &str, options: ReadOptions) -> Result<Frame> {
        let url = self.export_url(&options.target)?;
        let key = format!("query|{}|{}|{:?}", url, sql, options.csv);

        self.cache
            .get_or_load(options.cache, key, self.run_query(sql, &url, &options.csv))
            .await
    }

    async fn create(&self, _options: WriteOptions) -> Result<Option<Frame>> {
        Err(GSheetsError::UnsupportedOperation(CREATE_UNSUPPORTED.to_string()))
    }

    async fn update(&self, _options: WriteOptions) -> Result<Option<Frame>> {
        Err(GSheetsError::UnsupportedOperation(UPDATE_UNSUPPORTED.to_string()))
    }

    async fn clear(&self, _options: TargetOptions) -> Result<ClearResponse> {
        Err(GSheetsError::UnsupportedOperation(CLEAR_UNSUPPORTED.to_string()))
    }
}
