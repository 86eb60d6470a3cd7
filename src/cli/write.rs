use super::{TargetArgs, open_connection};
use dialoguer::Confirm;
use gsheets_connection::{
    CsvOptions, Frame, GSheetsClient, GSheetsError, Result, TargetOptions, WriteOptions,
};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

fn load_data(path: Option<&Path>) -> Result<Option<Frame>> {
    path.map(|path| {
        let data = fs::read(path)?;
        Frame::from_csv(&data, &CsvOptions::default())
    })
    .transpose()
}

fn write_options(target: &TargetArgs, data: Option<Frame>) -> WriteOptions {
    WriteOptions {
        target: target.options(),
        data,
    }
}

pub async fn create(
    secrets: Option<&Path>,
    target: &TargetArgs,
    data: Option<&Path>,
) -> Result<()> {
    let data = load_data(data)?;
    let connection = open_connection(secrets, &target.connection).await?;

    match connection.create(write_options(target, data)).await? {
        Some(frame) => info!(rows = frame.num_rows(), "Created worksheet"),
        None => info!("Created empty worksheet"),
    }

    Ok(())
}

pub async fn update(
    secrets: Option<&Path>,
    target: &TargetArgs,
    data: Option<&Path>,
) -> Result<()> {
    let data = load_data(data)?;
    let connection = open_connection(secrets, &target.connection).await?;

    match connection.update(write_options(target, data)).await? {
        Some(frame) => info!(rows = frame.num_rows(), "Updated worksheet"),
        None => warn!("No data given, worksheet left unchanged"),
    }

    Ok(())
}

pub async fn clear(secrets: Option<&Path>, target: &TargetArgs, yes: bool) -> Result<()> {
    let options: TargetOptions = target.options();

    if !yes {
        let describe = options
            .worksheet
            .as_ref()
            .map(|worksheet| format!("worksheet '{}'", worksheet))
            .unwrap_or_else(|| "the default worksheet".to_string());
        let confirmed = Confirm::new()
            .with_prompt(format!("Clear all values of {}?", describe))
            .default(false)
            .interact()
            .map_err(|e| GSheetsError::Other(e.into()))?;
        if !confirmed {
            info!("Nothing cleared");
            return Ok(());
        }
    }

    let connection = open_connection(secrets, &target.connection).await?;
    let response = connection.clear(options).await?;
    info!(
        spreadsheet = %response.spreadsheet_id,
        range = ?response.cleared_range,
        "Cleared worksheet"
    );

    Ok(())
}
