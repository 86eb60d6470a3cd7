use datafusion::arrow::error::ArrowError;
use datafusion::error::DataFusionError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GSheetsError {
    #[error("Spreadsheet must be specified")]
    MissingSpreadsheet,

    #[error("Worksheet title must be specified")]
    MissingWorksheet,

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Spreadsheet not found: {0}")]
    SpreadsheetNotFound(String),

    #[error("Worksheet not found: {0}")]
    WorksheetNotFound(String),

    #[error("CSV export failed: {0}")]
    Export(String),

    #[error("Google Sheets API error: {0}")]
    Sheets(String),

    #[error("Service account authentication error: {0}")]
    Auth(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("SQL engine error: {0}")]
    DataFusion(#[from] DataFusionError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, GSheetsError>;
