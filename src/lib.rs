//! Read, query and write Google Sheets as tables.
//!
//! Public spreadsheets are read through their CSV export. Connections
//! configured with service account credentials can also create, update and
//! clear worksheets through the Sheets API.

pub mod cache;
pub mod client;
pub mod config;
pub mod connection;
pub mod error;
pub mod locator;
pub mod models;
pub mod sheets;
pub mod sql;

pub use cache::CachePolicy;
pub use client::{GSheetsClient, ReadOptions, TargetOptions, WriteOptions};
pub use config::{Config, ConnectionConfig, Mode};
pub use connection::GSheetsConnection;
pub use error::{GSheetsError, Result};
pub use models::{CsvOptions, Frame, Worksheet};
pub use sheets::ClearResponse;
