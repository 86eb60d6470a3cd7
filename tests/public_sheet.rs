use gsheets_connection::{
    Config, CsvOptions, GSheetsClient, GSheetsConnection, GSheetsError, ReadOptions, Worksheet,
};

const SECRETS: &str = r#"
[connections.gsheets]
spreadsheet = "https://docs.google.com/spreadsheets/d/1JDy9md2VZPz4JbYtRPJLs81_3jUK47nx6GYQjgU8qNY/edit"
"#;

async fn connection() -> GSheetsConnection {
    let config = Config::from_toml(SECRETS).unwrap();
    GSheetsConnection::from_config("gsheets", &config).await.unwrap()
}

fn first_rows(rows: &[Vec<String>], n: usize) -> Vec<Vec<String>> {
    rows.iter().take(n).cloned().collect()
}

fn expected(values: &[[&str; 2]]) -> Vec<Vec<String>> {
    values
        .iter()
        .map(|row| row.iter().map(|value| value.to_string()).collect())
        .collect()
}

#[tokio::test]
#[ignore = "requires network access"]
async fn test_read_public_sheet() {
    let options = ReadOptions::new().csv(CsvOptions {
        usecols: Some(vec![0, 1]),
        ..Default::default()
    });
    let frame = connection().await.read(options).await.unwrap();

    assert_eq!(
        first_rows(&frame.to_sheet_rows().unwrap(), 6),
        expected(&[
            ["date", "births"],
            ["1/1/1975", "265775"],
            ["2/1/1975", "241045"],
            ["3/1/1975", "268849"],
            ["4/1/1975", "247455"],
            ["5/1/1975", "254545"],
        ])
    );
}

#[tokio::test]
#[ignore = "requires network access"]
async fn test_query_public_sheet() {
    let frame = connection()
        .await
        .query(
            "select date from my_table where births = 265775",
            ReadOptions::new(),
        )
        .await
        .unwrap();

    assert_eq!(
        frame.to_sheet_rows().unwrap(),
        vec![vec!["date".to_string()], vec!["1/1/1975".to_string()]]
    );
}

#[tokio::test]
#[ignore = "requires network access"]
async fn test_query_public_sheet_by_gid() {
    let options = ReadOptions::new().worksheet(Worksheet::Id(1585633377));
    let frame = connection()
        .await
        .query("select date from my_table where births = 1000000", options)
        .await
        .unwrap();

    assert_eq!(
        frame.to_sheet_rows().unwrap(),
        vec![vec!["date".to_string()], vec!["1/1/1975".to_string()]]
    );
}

#[tokio::test]
#[ignore = "requires network access"]
async fn test_read_public_sheet_by_gid() {
    let options = ReadOptions::new().worksheet(Worksheet::Id(1585633377));
    let frame = connection().await.read(options).await.unwrap();

    assert_eq!(
        first_rows(&frame.to_sheet_rows().unwrap(), 2),
        expected(&[["date", "births"], ["1/1/1975", "1000000"]])
    );
}

#[tokio::test]
async fn test_no_configuration_raises_on_read() {
    let connection = GSheetsConnection::from_config("gsheets", &Config::default())
        .await
        .unwrap();

    let err = connection.read(ReadOptions::new()).await.unwrap_err();

    assert!(matches!(err, GSheetsError::MissingSpreadsheet));
}
