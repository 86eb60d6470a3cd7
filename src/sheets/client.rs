use super::auth::service_account_authenticator;
use super::{ClearResponse, SheetOperations, SpreadsheetMeta, ValueRender, WorksheetMeta};
use crate::error::{GSheetsError, Result};
use crate::locator::SpreadsheetLocator;
use crate::sheets::formatting::format_requests;
use async_trait::async_trait;
use datafusion::arrow::datatypes::Schema;
use google_drive3::api::{DriveHub, File};
use google_sheets4::api::{
    AddSheetRequest, BatchUpdateSpreadsheetRequest, ClearValuesRequest, GridProperties, Request,
    Scope, SheetProperties, Sheets, Spreadsheet, SpreadsheetProperties, ValueRange,
};
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use serde_json::Value;
use std::io::Cursor;
use tracing::{debug, instrument};
use yup_oauth2::ServiceAccountKey;

// Read and write spreadsheets shared with the service account
const SHEETS_SCOPE: Scope = Scope::Spreadsheet;

// Search and create spreadsheet files in Drive folders
const DRIVE_SCOPE: Scope = Scope::Drive;

const SPREADSHEET_MIME_TYPE: &str = "application/vnd.google-apps.spreadsheet";

type Connector = HttpsConnector<HttpConnector>;

/// Live implementation of [`SheetOperations`] over the Sheets and Drive APIs.
pub struct SheetsClient {
    hub: Sheets<Connector>,
    drive: DriveHub<Connector>,
}

impl SheetsClient {
    /// Create a client authenticated as the given service account.
    #[instrument(name = "Connecting to Google Sheets", skip_all)]
    pub async fn new(key: ServiceAccountKey) -> Result<Self> {
        debug!(client_email = %key.client_email, "Using service account");
        let auth = service_account_authenticator(key).await?;

        let connector = hyper_rustls::HttpsConnectorBuilder::new()
            .with_native_roots()
            .map_err(|e| GSheetsError::Sheets(format!("Failed to load native roots: {}", e)))?
            .https_or_http()
            .enable_http1()
            .build();

        let client = Client::builder(hyper_util::rt::TokioExecutor::new()).build(connector);

        let hub = Sheets::new(client.clone(), auth.clone());
        let drive = DriveHub::new(client, auth);

        Ok(Self { hub, drive })
    }

    #[instrument(name = "Finding spreadsheet", skip(self))]
    async fn search_spreadsheet_by_name(
        &self,
        name: &str,
        folder_id: Option<&str>,
    ) -> Result<Option<String>> {
        let mut query = format!(
            "name='{}' and mimeType='{}' and trashed=false",
            escape_query(name),
            SPREADSHEET_MIME_TYPE
        );
        if let Some(folder_id) = folder_id {
            query.push_str(&format!(" and '{}' in parents", escape_query(folder_id)));
        }

        let (_, file_list) = self
            .drive
            .files()
            .list()
            .q(&query)
            .spaces("drive")
            .page_size(1)
            .supports_all_drives(true)
            .include_items_from_all_drives(true)
            .add_scope(DRIVE_SCOPE)
            .doit()
            .await
            .map_err(|e| GSheetsError::Sheets(format!("Failed to search spreadsheet: {}", e)))?;

        let spreadsheet_id = file_list
            .files
            .and_then(|files| files.into_iter().next())
            .and_then(|file| file.id);

        Ok(spreadsheet_id)
    }

    async fn get_spreadsheet(&self, spreadsheet_id: &str) -> Result<SpreadsheetMeta> {
        let (_, spreadsheet) = self
            .hub
            .spreadsheets()
            .get(spreadsheet_id)
            .include_grid_data(false)
            .add_scope(SHEETS_SCOPE)
            .doit()
            .await
            .map_err(|e| api_error(e, spreadsheet_id, "Failed to get spreadsheet"))?;

        Ok(spreadsheet_meta(spreadsheet))
    }

    async fn batch_update(&self, spreadsheet_id: &str, requests: Vec<Request>) -> Result<()> {
        let batch_update = BatchUpdateSpreadsheetRequest {
            requests: Some(requests),
            ..Default::default()
        };

        self.hub
            .spreadsheets()
            .batch_update(batch_update, spreadsheet_id)
            .add_scope(SHEETS_SCOPE)
            .doit()
            .await
            .map_err(|e| api_error(e, spreadsheet_id, "Failed to update spreadsheet"))?;

        Ok(())
    }
}

#[async_trait]
impl SheetOperations for SheetsClient {
    #[instrument(name = "Opening spreadsheet", skip(self))]
    async fn open_spreadsheet(
        &self,
        spreadsheet: &str,
        folder_id: Option<&str>,
    ) -> Result<SpreadsheetMeta> {
        let spreadsheet_id = match SpreadsheetLocator::parse(spreadsheet) {
            SpreadsheetLocator::Url { key, .. } => key,
            SpreadsheetLocator::Plain(title) => self
                .search_spreadsheet_by_name(&title, folder_id)
                .await?
                .ok_or_else(|| GSheetsError::SpreadsheetNotFound(title.clone()))?,
        };

        let meta = self.get_spreadsheet(&spreadsheet_id).await?;
        debug!(id = %meta.id, worksheets = meta.worksheets.len(), "Opened spreadsheet");

        Ok(meta)
    }

    #[instrument(name = "Creating new spreadsheet", skip(self))]
    async fn create_spreadsheet(
        &self,
        title: &str,
        folder_id: Option<&str>,
    ) -> Result<SpreadsheetMeta> {
        if let Some(folder_id) = folder_id {
            // Drive converts the empty CSV upload into a blank spreadsheet
            let (_, created) = self
                .drive
                .files()
                .create(spreadsheet_file(title, folder_id))
                .supports_all_drives(true)
                .add_scope(DRIVE_SCOPE)
                .upload(Cursor::new(Vec::<u8>::new()), mime::TEXT_CSV)
                .await
                .map_err(|e| {
                    GSheetsError::Sheets(format!("Failed to create spreadsheet: {}", e))
                })?;

            let spreadsheet_id = created
                .id
                .ok_or_else(|| {
                    GSheetsError::Sheets("Created spreadsheet has empty ID".to_string())
                })?;

            return self.get_spreadsheet(&spreadsheet_id).await;
        }

        let spreadsheet = Spreadsheet {
            properties: Some(SpreadsheetProperties {
                title: Some(title.to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };

        let (_, result) = self
            .hub
            .spreadsheets()
            .create(spreadsheet)
            .add_scope(SHEETS_SCOPE)
            .doit()
            .await
            .map_err(|e| GSheetsError::Sheets(format!("Failed to create spreadsheet: {}", e)))?;

        Ok(spreadsheet_meta(result))
    }

    #[instrument(name = "Adding worksheet", skip(self))]
    async fn add_worksheet(
        &self,
        spreadsheet_id: &str,
        title: &str,
        size: Option<(i32, i32)>,
    ) -> Result<WorksheetMeta> {
        let request = Request {
            add_sheet: Some(AddSheetRequest {
                properties: Some(SheetProperties {
                    title: Some(title.to_string()),
                    sheet_type: Some("GRID".to_string()),
                    grid_properties: size.map(|(rows, columns)| GridProperties {
                        row_count: Some(rows),
                        column_count: Some(columns),
                        ..Default::default()
                    }),
                    ..Default::default()
                }),
            }),
            ..Default::default()
        };

        let batch_update = BatchUpdateSpreadsheetRequest {
            requests: Some(vec![request]),
            include_spreadsheet_in_response: Some(false),
            ..Default::default()
        };

        let (_, response) = self
            .hub
            .spreadsheets()
            .batch_update(batch_update, spreadsheet_id)
            .add_scope(SHEETS_SCOPE)
            .doit()
            .await
            .map_err(|e| api_error(e, spreadsheet_id, "Failed to add worksheet"))?;

        let properties = response
            .replies
            .and_then(|replies| replies.into_iter().next())
            .and_then(|reply| reply.add_sheet)
            .and_then(|add_sheet| add_sheet.properties)
            .ok_or_else(|| {
                GSheetsError::Sheets(
                    "Failed to get worksheet properties from create response".to_string(),
                )
            })?;

        Ok(WorksheetMeta::from(properties))
    }

    #[instrument(
        name = "Fetching worksheet",
        skip(self, worksheet),
        fields(worksheet = %worksheet.title)
    )]
    async fn read_values(
        &self,
        spreadsheet_id: &str,
        worksheet: &WorksheetMeta,
        render: ValueRender,
    ) -> Result<Vec<Vec<String>>> {
        let (_, response) = self
            .hub
            .spreadsheets()
            .values_get(spreadsheet_id, &a1_range(&worksheet.title))
            .date_time_render_option("FORMATTED_STRING")
            .major_dimension("ROWS")
            .value_render_option(render.as_api_str())
            .add_scope(SHEETS_SCOPE)
            .doit()
            .await
            .map_err(|e| {
                GSheetsError::Sheets(format!(
                    "Failed to read worksheet '{}': {}",
                    worksheet.title, e
                ))
            })?;

        let rows = response
            .values
            .unwrap_or_default()
            .into_iter()
            .map(|row| row.into_iter().map(cell_to_string).collect())
            .collect();

        Ok(rows)
    }

    #[instrument(
        name = "Writing worksheet",
        skip(self, worksheet, rows),
        fields(worksheet = %worksheet.title)
    )]
    async fn write_values(
        &self,
        spreadsheet_id: &str,
        worksheet: &WorksheetMeta,
        rows: &[Vec<String>],
    ) -> Result<()> {
        let data_range = format!("{}!A1", a1_range(&worksheet.title));
        let values = rows
            .iter()
            .map(|row| row.iter().cloned().map(Value::String).collect())
            .collect();
        let value_range = ValueRange {
            major_dimension: Some("ROWS".to_string()),
            range: Some(data_range.clone()),
            values: Some(values),
        };

        self.hub
            .spreadsheets()
            .values_update(value_range, spreadsheet_id, &data_range)
            .value_input_option("USER_ENTERED")
            .add_scope(SHEETS_SCOPE)
            .doit()
            .await
            .map_err(|e| GSheetsError::Sheets(format!("Failed to write worksheet: {}", e)))?;

        debug!(rows = rows.len(), "Wrote worksheet values");
        Ok(())
    }

    #[instrument(
        name = "Clearing worksheet",
        skip(self, worksheet),
        fields(worksheet = %worksheet.title)
    )]
    async fn clear_values(
        &self,
        spreadsheet_id: &str,
        worksheet: &WorksheetMeta,
    ) -> Result<ClearResponse> {
        let (_, response) = self
            .hub
            .spreadsheets()
            .values_clear(
                ClearValuesRequest::default(),
                spreadsheet_id,
                &a1_range(&worksheet.title),
            )
            .add_scope(SHEETS_SCOPE)
            .doit()
            .await
            .map_err(|e| GSheetsError::Sheets(format!("Failed to clear worksheet: {}", e)))?;

        Ok(ClearResponse {
            spreadsheet_id: response
                .spreadsheet_id
                .unwrap_or_else(|| spreadsheet_id.to_string()),
            cleared_range: response.cleared_range,
        })
    }

    #[instrument(name = "Formatting worksheet", skip_all)]
    async fn format_worksheet(
        &self,
        spreadsheet_id: &str,
        worksheet: &WorksheetMeta,
        schema: &Schema,
    ) -> Result<()> {
        self.batch_update(spreadsheet_id, format_requests(worksheet.sheet_id, schema))
            .await
    }
}

impl From<SheetProperties> for WorksheetMeta {
    fn from(properties: SheetProperties) -> Self {
        Self {
            sheet_id: properties.sheet_id.unwrap_or_default(),
            title: properties.title.unwrap_or_default(),
            index: properties.index.unwrap_or_default(),
        }
    }
}

fn spreadsheet_meta(spreadsheet: Spreadsheet) -> SpreadsheetMeta {
    let mut worksheets: Vec<WorksheetMeta> = spreadsheet
        .sheets
        .unwrap_or_default()
        .into_iter()
        .filter_map(|sheet| sheet.properties)
        .map(WorksheetMeta::from)
        .collect();
    worksheets.sort_by_key(|worksheet| worksheet.index);

    SpreadsheetMeta {
        id: spreadsheet.spreadsheet_id.unwrap_or_default(),
        title: spreadsheet
            .properties
            .and_then(|props| props.title)
            .unwrap_or_default(),
        url: spreadsheet.spreadsheet_url,
        worksheets,
    }
}

/// Quote a worksheet title for use as an A1 range.
fn spreadsheet_file(title: &str, folder_id: &str) -> File {
    File {
        name: Some(title.to_string()),
        mime_type: Some(SPREADSHEET_MIME_TYPE.to_string()),
        parents: Some(vec![folder_id.to_string()]),
        ..Default::default()
    }
}

fn a1_range(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

fn escape_query(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

fn cell_to_string(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    }
}

fn is_not_found(error: &google_sheets4::Error) -> bool {
    match error {
        google_sheets4::Error::Failure(response) => response.status().as_u16() == 404,
        google_sheets4::Error::BadRequest(value) => {
            value.pointer("/error/code").and_then(Value::as_u64) == Some(404)
        }
        _ => false,
    }
}

fn api_error(error: google_sheets4::Error, spreadsheet_id: &str, context: &str) -> GSheetsError {
    if is_not_found(&error) {
        return GSheetsError::SpreadsheetNotFound(spreadsheet_id.to_string());
    }
    GSheetsError::Sheets(format!("{}: {}", context, error))
}
