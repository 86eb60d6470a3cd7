use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Reference to a worksheet within a spreadsheet.
///
/// How the value is interpreted depends on the connection mode. Public
/// spreadsheets are addressed by grid id (`gid`), so `Id` is the gid and a
/// `Name` is passed through verbatim. Service account connections address
/// worksheets by title (`Name`) or by zero-based position (`Id`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Worksheet {
    Id(i64),
    Name(String),
}

impl Worksheet {
    /// Empty names behave like an unset worksheet.
    pub fn is_empty(&self) -> bool {
        matches!(self, Worksheet::Name(name) if name.is_empty())
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Worksheet::Name(name) => Some(name),
            Worksheet::Id(_) => None,
        }
    }
}

impl fmt::Display for Worksheet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Worksheet::Id(id) => write!(f, "{}", id),
            Worksheet::Name(name) => f.write_str(name),
        }
    }
}

impl From<i64> for Worksheet {
    fn from(id: i64) -> Self {
        Worksheet::Id(id)
    }
}

impl From<&str> for Worksheet {
    fn from(name: &str) -> Self {
        Worksheet::Name(name.to_string())
    }
}

impl From<String> for Worksheet {
    fn from(name: String) -> Self {
        Worksheet::Name(name)
    }
}

/// Numeric strings parse as ids, anything else as a name.
impl FromStr for Worksheet {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.parse::<i64>() {
            Ok(id) => Worksheet::Id(id),
            Err(_) => Worksheet::Name(s.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Holder {
        worksheet: Worksheet,
    }

    #[test]
    fn test_deserialize_integer_as_id() {
        let holder: Holder = toml::from_str("worksheet = 1585633377").unwrap();
        assert_eq!(holder.worksheet, Worksheet::Id(1585633377));
    }

    #[test]
    fn test_deserialize_string_as_name() {
        let holder: Holder = toml::from_str("worksheet = \"Example 1\"").unwrap();
        assert_eq!(holder.worksheet, Worksheet::Name("Example 1".to_string()));
    }

    #[test]
    fn test_from_str() {
        assert_eq!("42".parse::<Worksheet>().unwrap(), Worksheet::Id(42));
        assert_eq!(
            "Sheet1".parse::<Worksheet>().unwrap(),
            Worksheet::Name("Sheet1".to_string())
        );
    }

    #[test]
    fn test_empty_name() {
        assert!(Worksheet::from("").is_empty());
        assert!(!Worksheet::from(0).is_empty());
    }
}
