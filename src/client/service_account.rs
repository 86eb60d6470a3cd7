use super::{Defaults, GSheetsClient, ReadOptions, TargetOptions, WriteOptions};
use crate::cache::ResultCache;
use crate::config::Mode;
use crate::error::{GSheetsError, Result};
use crate::locator::SpreadsheetLocator;
use crate::models::{CsvOptions, Frame, Worksheet};
use crate::sheets::{ClearResponse, SheetOperations, SpreadsheetMeta, ValueRender, WorksheetMeta};
use crate::sql;
use async_trait::async_trait;
use indicatif::ProgressStyle;
use tracing::{Span, debug, info, instrument};
use tracing_indicatif::span_ext::IndicatifSpanExt;

/// A target with defaults applied.
#[derive(Debug, Clone)]
struct Target {
    spreadsheet: String,
    worksheet: Option<Worksheet>,
    folder_id: Option<String>,
}

/// Authenticated read and write access through the Sheets API.
pub struct ServiceAccountClient<A: SheetOperations> {
    api: A,
    defaults: Defaults,
    cache: ResultCache,
}

impl<A: SheetOperations> ServiceAccountClient<A> {
    pub fn new(api: A, defaults: Defaults) -> Self {
        Self {
            api,
            defaults,
            cache: ResultCache::new(),
        }
    }

    fn resolve(&self, target: &TargetOptions) -> Result<Target> {
        Ok(Target {
            spreadsheet: self.defaults.spreadsheet(target.spreadsheet.as_deref())?,
            worksheet: self.defaults.worksheet(target.worksheet.as_ref()),
            folder_id: self.defaults.folder_id(target.folder_id.as_deref()),
        })
    }

    async fn open(&self, target: &Target) -> Result<SpreadsheetMeta> {
        self.api
            .open_spreadsheet(&target.spreadsheet, target.folder_id.as_deref())
            .await
    }

    /// Select the target worksheet, the first one when none is given.
    fn select_worksheet(
        meta: &SpreadsheetMeta,
        worksheet: Option<&Worksheet>,
    ) -> Result<WorksheetMeta> {
        let worksheet = worksheet.cloned().unwrap_or(Worksheet::Id(0));
        meta.worksheet(&worksheet)
            .cloned()
            .ok_or_else(|| GSheetsError::WorksheetNotFound(worksheet.to_string()))
    }

    async fn read_worksheet(
        &self,
        target: &Target,
        render: ValueRender,
        csv: &CsvOptions,
    ) -> Result<Frame> {
        let meta = self.open(target).await?;
        let worksheet = Self::select_worksheet(&meta, target.worksheet.as_ref())?;
        let rows = self.api.read_values(&meta.id, &worksheet, render).await?;
        Frame::from_sheet_rows(&rows, csv)
    }

    #[instrument(name = "Loading worksheets", skip_all)]
    async fn run_query(
        &self,
        sql: &str,
        target: &Target,
        render: ValueRender,
        csv: &CsvOptions,
    ) -> Result<Frame> {
        let references = sql::table_references(sql)?;
        let mut tables = Vec::with_capacity(references.len());

        if !references.is_empty() {
            let span = Span::current();
            span.pb_set_style(
                &ProgressStyle::with_template("{spinner} {span_name} {pos}/{len} {msg}")
                    .map_err(|e| GSheetsError::Other(e.into()))?,
            );
            span.pb_set_message("Loading worksheets");
            span.pb_set_length(references.len() as u64);

            let meta = self.open(target).await?;
            for reference in references {
                let frame = match meta.worksheet_by_title(reference.table()) {
                    Some(worksheet) => {
                        let rows = self.api.read_values(&meta.id, worksheet, render).await?;
                        Frame::from_sheet_rows(&rows, csv)?
                    }
                    None => {
                        debug!(table = %reference, "No worksheet for table, using empty table");
                        Frame::empty()
                    }
                };
                tables.push((reference, frame));
                span.pb_inc(1);
            }
        }

        sql::execute(sql, tables).await
    }

    async fn write_frame(
        &self,
        spreadsheet_id: &str,
        worksheet: &WorksheetMeta,
        rows: &[Vec<String>],
        data: &Frame,
    ) -> Result<()> {
        self.api.write_values(spreadsheet_id, worksheet, rows).await?;
        self.api
            .format_worksheet(spreadsheet_id, worksheet, &data.schema())
            .await
    }
}

#[async_trait]
impl<A: SheetOperations> GSheetsClient for ServiceAccountClient<A> {
    fn mode(&self) -> Mode {
        Mode::ServiceAccount
    }

    fn defaults(&self) -> &Defaults {
        &self.defaults
    }

    fn set_default(&mut self, spreadsheet: Option<String>, worksheet: Option<Worksheet>) {
        self.defaults.spreadsheet = spreadsheet;
        self.defaults.worksheet = worksheet;
    }

    #[instrument(name = "Reading worksheet", skip_all)]
    async fn read(&self, options: ReadOptions) -> Result<Frame> {
        let target = self.resolve(&options.target)?;
        let render = ValueRender::from_evaluate_formulas(options.evaluate_formulas);
        let key = format!(
            "read|{}|{:?}|{:?}|{:?}|{:?}",
            target.spreadsheet, target.folder_id, target.worksheet, render, options.csv
        );

        self.cache
            .get_or_load(
                options.cache,
                key,
                self.read_worksheet(&target, render, &options.csv),
            )
            .await
    }

    #[instrument(name = "Querying worksheets", skip_all)]
    async fn query(&self, sql: &str, options: ReadOptions) -> Result<Frame> {
        let target = self.resolve(&options.target)?;
        let render = ValueRender::from_evaluate_formulas(options.evaluate_formulas);
        let key = format!(
            "query|{}|{:?}|{}|{:?}|{:?}",
            target.spreadsheet, target.folder_id, sql, render, options.csv
        );

        self.cache
            .get_or_load(
                options.cache,
                key,
                self.run_query(sql, &target, render, &options.csv),
            )
            .await
    }

    #[instrument(name = "Creating worksheet", skip_all)]
    async fn create(&self, options: WriteOptions) -> Result<Option<Frame>> {
        let target = self.resolve(&options.target)?;
        let title = options
            .target
            .worksheet
            .as_ref()
            .and_then(Worksheet::name)
            .filter(|title| !title.is_empty())
            .ok_or(GSheetsError::MissingWorksheet)?
            .to_string();

        let meta = match self.open(&target).await {
            Ok(meta) => meta,
            Err(GSheetsError::SpreadsheetNotFound(_))
                if matches!(
                    SpreadsheetLocator::parse(&target.spreadsheet),
                    SpreadsheetLocator::Plain(_)
                ) =>
            {
                info!(spreadsheet = %target.spreadsheet, "Spreadsheet not found, creating it");
                self.api
                    .create_spreadsheet(&target.spreadsheet, target.folder_id.as_deref())
                    .await?
            }
            Err(e) => return Err(e),
        };

        let Some(data) = options.data else {
            self.api.add_worksheet(&meta.id, &title, None).await?;
            self.cache.invalidate_all();
            return Ok(None);
        };

        let rows = data.to_sheet_rows()?;
        let size = (rows.len() as i32, data.num_columns().max(1) as i32);
        let worksheet = self.api.add_worksheet(&meta.id, &title, Some(size)).await?;
        self.write_frame(&meta.id, &worksheet, &rows, &data).await?;
        self.cache.invalidate_all();

        Ok(Some(data))
    }

    #[instrument(name = "Updating worksheet", skip_all)]
    async fn update(&self, options: WriteOptions) -> Result<Option<Frame>> {
        let target = self.resolve(&options.target)?;
        let meta = self.open(&target).await?;
        let worksheet = Self::select_worksheet(&meta, target.worksheet.as_ref())?;

        let Some(data) = options.data else {
            debug!("No data to write");
            return Ok(None);
        };

        let rows = data.to_sheet_rows()?;
        self.api.clear_values(&meta.id, &worksheet).await?;
        self.write_frame(&meta.id, &worksheet, &rows, &data).await?;
        self.cache.invalidate_all();

        Ok(Some(data))
    }

    #[instrument(name = "Clearing worksheet", skip_all)]
    async fn clear(&self, options: TargetOptions) -> Result<ClearResponse> {
        let target = self.resolve(&options)?;
        let meta = self.open(&target).await?;
        let worksheet = Self::select_worksheet(&meta, target.worksheet.as_ref())?;

        let response = self.api.clear_values(&meta.id, &worksheet).await?;
        self.cache.invalidate_all();

        Ok(response)
    }
}
