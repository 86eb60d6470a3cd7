//! Spreadsheet URL parsing and CSV export URL resolution.

use crate::models::Worksheet;
use url::Url;

const EXPORT_BASE_URL: &str = "https://docs.google.com/spreadsheet/ccc";

/// Where a spreadsheet string points to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpreadsheetLocator {
    /// A spreadsheet URL with its document key and optional grid id.
    Url { key: String, gid: Option<String> },
    /// Anything that is not a spreadsheet URL: a bare key or a title.
    Plain(String),
}

impl SpreadsheetLocator {
    pub fn parse(spreadsheet: &str) -> Self {
        parse_spreadsheet_url(spreadsheet)
            .unwrap_or_else(|| SpreadsheetLocator::Plain(spreadsheet.to_string()))
    }
}

fn parse_spreadsheet_url(spreadsheet: &str) -> Option<SpreadsheetLocator> {
    let url = Url::parse(spreadsheet).ok()?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return None;
    }

    let mut segments = url.path_segments()?;
    segments.find(|segment| *segment == "d")?;
    let key = segments.next().filter(|key| !key.is_empty())?.to_string();

    let gid = url
        .fragment()
        .and_then(gid_from_pairs)
        .or_else(|| url.query().and_then(gid_from_pairs));

    Some(SpreadsheetLocator::Url { key, gid })
}

fn gid_from_pairs(pairs: &str) -> Option<String> {
    url::form_urlencoded::parse(pairs.as_bytes())
        .find(|(name, _)| name == "gid")
        .map(|(_, value)| {
            value
                .chars()
                .take_while(|c| c.is_alphanumeric() || *c == '_')
                .collect::<String>()
        })
        .filter(|gid| !gid.is_empty())
}

/// Build the CSV export URL for a public spreadsheet.
///
/// An explicit worksheet takes precedence over a `gid` found in the
/// spreadsheet URL. Strings that are not spreadsheet URLs are used as the
/// document key.
pub fn csv_export_url(spreadsheet: &str, worksheet: Option<&Worksheet>) -> String {
    let (key, url_gid) = match SpreadsheetLocator::parse(spreadsheet) {
        SpreadsheetLocator::Url { key, gid } => (key, gid),
        SpreadsheetLocator::Plain(key) => (key, None),
    };

    let gid = worksheet
        .filter(|worksheet| !worksheet.is_empty())
        .map(ToString::to_string)
        .or(url_gid);

    let mut query = url::form_urlencoded::Serializer::new(String::new());
    query.append_pair("key", &key).append_pair("output", "csv");
    if let Some(gid) = &gid {
        query.append_pair("gid", gid);
    }

    format!("{}?{}", EXPORT_BASE_URL, query.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHEET_URL: &str =
        "https://docs.google.com/spreadsheets/d/1JDy9md2VZPz4JbYtRPJLs81_3jUK47nx6GYQjgU8qNY/edit";
    const KEY: &str = "1JDy9md2VZPz4JbYtRPJLs81_3jUK47nx6GYQjgU8qNY";

    fn export(query: &str) -> String {
        format!("https://docs.google.com/spreadsheet/ccc?key={}&output=csv{}", KEY, query)
    }

    #[test]
    fn test_parse_url() {
        assert_eq!(
            SpreadsheetLocator::parse(SHEET_URL),
            SpreadsheetLocator::Url {
                key: KEY.to_string(),
                gid: None
            }
        );
    }

    #[test]
    fn test_parse_plain() {
        assert_eq!(
            SpreadsheetLocator::parse("My budget"),
            SpreadsheetLocator::Plain("My budget".to_string())
        );
        assert_eq!(
            SpreadsheetLocator::parse("https://example.com/no/key/here"),
            SpreadsheetLocator::Plain("https://example.com/no/key/here".to_string())
        );
    }

    #[test]
    fn test_export_url_without_gid() {
        assert_eq!(csv_export_url(SHEET_URL, None), export(""));
    }

    #[test]
    fn test_export_url_key_without_trailing_path() {
        let url = format!("https://docs.google.com/spreadsheets/d/{}", KEY);
        assert_eq!(csv_export_url(&url, None), export(""));
    }

    #[test]
    fn test_export_url_gid_from_fragment() {
        let url = format!("{}?usp=sharing#gid=1585633377", SHEET_URL);
        assert_eq!(csv_export_url(&url, None), export("&gid=1585633377"));
    }

    #[test]
    fn test_export_url_gid_from_query() {
        let url = format!("{}?gid=42", SHEET_URL);
        assert_eq!(csv_export_url(&url, None), export("&gid=42"));
    }

    #[test]
    fn test_export_url_fragment_wins_over_query() {
        let url = format!("{}?gid=42#gid=7", SHEET_URL);
        assert_eq!(csv_export_url(&url, None), export("&gid=7"));
    }

    #[test]
    fn test_export_url_gid_stops_at_non_word_character() {
        let url = format!("{}#gid=123;range=A1", SHEET_URL);
        assert_eq!(csv_export_url(&url, None), export("&gid=123"));
    }

    #[test]
    fn test_export_url_worksheet_overrides_url_gid() {
        let url = format!("{}#gid=7", SHEET_URL);
        let worksheet = Worksheet::Id(1585633377);
        assert_eq!(
            csv_export_url(&url, Some(&worksheet)),
            export("&gid=1585633377")
        );
    }

    #[test]
    fn test_export_url_named_worksheet_used_as_gid() {
        let worksheet = Worksheet::from("1585633377");
        assert_eq!(
            csv_export_url(SHEET_URL, Some(&worksheet)),
            export("&gid=1585633377")
        );
    }

    #[test]
    fn test_export_url_empty_worksheet_ignored() {
        let url = format!("{}#gid=7", SHEET_URL);
        let worksheet = Worksheet::from("");
        assert_eq!(csv_export_url(&url, Some(&worksheet)), export("&gid=7"));
    }

    #[test]
    fn test_export_url_bare_key() {
        assert_eq!(csv_export_url(KEY, None), export(""));
        assert_eq!(
            csv_export_url(KEY, Some(&Worksheet::Id(0))),
            export("&gid=0")
        );
    }
}
