mod auth;
mod client;
pub mod formatting;

pub use auth::service_account_key;
pub use client::SheetsClient;

use crate::error::Result;
use crate::models::Worksheet;
use async_trait::async_trait;
use datafusion::arrow::datatypes::Schema;

/// Spreadsheet metadata needed to address its worksheets.
#[derive(Debug, Clone, PartialEq)]
pub struct SpreadsheetMeta {
    pub id: String,
    pub title: String,
    pub url: Option<String>,
    /// Worksheets ordered by their position in the spreadsheet.
    pub worksheets: Vec<WorksheetMeta>,
}

impl SpreadsheetMeta {
    /// Look up a worksheet by title or by zero-based position.
    pub fn worksheet(&self, worksheet: &Worksheet) -> Option<&WorksheetMeta> {
        match worksheet {
            Worksheet::Name(title) => self.worksheet_by_title(title),
            Worksheet::Id(index) => usize::try_from(*index)
                .ok()
                .and_then(|index| self.worksheets.get(index)),
        }
    }

    /// Exact title match first, then a case-insensitive one.
    pub fn worksheet_by_title(&self, title: &str) -> Option<&WorksheetMeta> {
        self.worksheets
            .iter()
            .find(|worksheet| worksheet.title == title)
            .or_else(|| {
                self.worksheets
                    .iter()
                    .find(|worksheet| worksheet.title.eq_ignore_ascii_case(title))
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorksheetMeta {
    pub sheet_id: i32,
    pub title: String,
    pub index: i32,
}

/// How cell values are rendered when read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueRender {
    /// Values after formula evaluation, as displayed.
    Formatted,
    /// Formulas instead of their results where present.
    Formula,
}

impl ValueRender {
    pub fn from_evaluate_formulas(evaluate_formulas: bool) -> Self {
        match evaluate_formulas {
            true => ValueRender::Formatted,
            false => ValueRender::Formula,
        }
    }

    pub fn as_api_str(&self) -> &'static str {
        match self {
            ValueRender::Formatted => "FORMATTED_VALUE",
            ValueRender::Formula => "FORMULA",
        }
    }
}

/// Result of clearing a worksheet's values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClearResponse {
    pub spreadsheet_id: String,
    pub cleared_range: Option<String>,
}

/// Operations on spreadsheets through the authenticated API.
#[async_trait]
pub trait SheetOperations: Send + Sync {
    /// Open a spreadsheet by URL, or by title within an optional folder.
    async fn open_spreadsheet(
        &self,
        spreadsheet: &str,
        folder_id: Option<&str>,
    ) -> Result<SpreadsheetMeta>;

    async fn create_spreadsheet(
        &self,
        title: &str,
        folder_id: Option<&str>,
    ) -> Result<SpreadsheetMeta>;

    /// Add a worksheet, optionally sized as `(rows, columns)`.
    async fn add_worksheet(
        &self,
        spreadsheet_id: &str,
        title: &str,
        size: Option<(i32, i32)>,
    ) -> Result<WorksheetMeta>;

    async fn read_values(
        &self,
        spreadsheet_id: &str,
        worksheet: &WorksheetMeta,
        render: ValueRender,
    ) -> Result<Vec<Vec<String>>>;

    /// Write rows starting at the top-left cell.
    async fn write_values(
        &self,
        spreadsheet_id: &str,
        worksheet: &WorksheetMeta,
        rows: &[Vec<String>],
    ) -> Result<()>;

    async fn clear_values(
        &self,
        spreadsheet_id: &str,
        worksheet: &WorksheetMeta,
    ) -> Result<ClearResponse>;

    /// Format the header row and columns after `schema`.
    async fn format_worksheet(
        &self,
        spreadsheet_id: &str,
        worksheet: &WorksheetMeta,
        schema: &Schema,
    ) -> Result<()>;
}
