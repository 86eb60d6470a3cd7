use crate::cache::CachePolicy;
use crate::models::{CsvOptions, Frame, Worksheet};
use std::time::Duration;

/// Spreadsheet and worksheet a call targets. Unset fields fall back to the
/// connection's defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TargetOptions {
    pub spreadsheet: Option<String>,
    pub worksheet: Option<Worksheet>,
    /// Drive folder to search when the spreadsheet is given by title.
    pub folder_id: Option<String>,
}

impl TargetOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spreadsheet(mut self, spreadsheet: impl Into<String>) -> Self {
        self.spreadsheet = Some(spreadsheet.into());
        self
    }

    pub fn worksheet(mut self, worksheet: impl Into<Worksheet>) -> Self {
        self.worksheet = Some(worksheet.into());
        self
    }

    pub fn folder_id(mut self, folder_id: impl Into<String>) -> Self {
        self.folder_id = Some(folder_id.into());
        self
    }
}

/// Options for `read` and `query`.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadOptions {
    pub target: TargetOptions,
    /// Read formula results rather than the formulas themselves.
    /// Ignored for public spreadsheets.
    pub evaluate_formulas: bool,
    pub cache: CachePolicy,
    pub csv: CsvOptions,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            target: TargetOptions::default(),
            evaluate_formulas: true,
            cache: CachePolicy::default(),
            csv: CsvOptions::default(),
        }
    }
}

impl ReadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spreadsheet(mut self, spreadsheet: impl Into<String>) -> Self {
        self.target = self.target.spreadsheet(spreadsheet);
        self
    }

    pub fn worksheet(mut self, worksheet: impl Into<Worksheet>) -> Self {
        self.target = self.target.worksheet(worksheet);
        self
    }

    pub fn folder_id(mut self, folder_id: impl Into<String>) -> Self {
        self.target = self.target.folder_id(folder_id);
        self
    }

    pub fn evaluate_formulas(mut self, evaluate_formulas: bool) -> Self {
        self.evaluate_formulas = evaluate_formulas;
        self
    }

    /// Cache expiry. `None` never expires, zero disables caching.
    pub fn ttl(mut self, ttl: Option<Duration>) -> Self {
        self.cache = self.cache.with_ttl(ttl);
        self
    }

    pub fn max_entries(mut self, max_entries: Option<u64>) -> Self {
        self.cache = self.cache.with_max_entries(max_entries);
        self
    }

    pub fn csv(mut self, csv: CsvOptions) -> Self {
        self.csv = csv;
        self
    }
}

/// Options for `create` and `update`.
#[derive(Debug, Clone, Default)]
pub struct WriteOptions {
    pub target: TargetOptions,
    /// Rows to write below a header of column names. Nothing is written
    /// when `None`.
    pub data: Option<Frame>,
}

impl WriteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spreadsheet(mut self, spreadsheet: impl Into<String>) -> Self {
        self.target = self.target.spreadsheet(spreadsheet);
        self
    }

    pub fn worksheet(mut self, worksheet: impl Into<Worksheet>) -> Self {
        self.target = self.target.worksheet(worksheet);
        self
    }

    pub fn folder_id(mut self, folder_id: impl Into<String>) -> Self {
        self.target = self.target.folder_id(folder_id);
        self
    }

    pub fn data(mut self, data: Frame) -> Self {
        self.data = Some(data);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_options_defaults() {
        let options = ReadOptions::new();

        assert!(options.evaluate_formulas);
        assert_eq!(options.cache, CachePolicy::default());
        assert_eq!(options.target, TargetOptions::default());
    }

    #[test]
    fn test_read_options_builder() {
        let options = ReadOptions::new()
            .spreadsheet("abc")
            .worksheet(Worksheet::Id(1585633377))
            .evaluate_formulas(false)
            .ttl(None);

        assert_eq!(options.target.spreadsheet.as_deref(), Some("abc"));
        assert_eq!(options.target.worksheet, Some(Worksheet::Id(1585633377)));
        assert!(!options.evaluate_formulas);
        assert_eq!(options.cache.ttl, None);
    }
}
