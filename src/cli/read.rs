use super::{OutputFormat, ReadArgs, TargetArgs, open_connection};
use gsheets_connection::{Frame, GSheetsClient, Result};
use std::io;
use std::path::Path;
use tracing::info;

pub async fn read(
    secrets: Option<&Path>,
    target: &TargetArgs,
    args: &ReadArgs,
    format: OutputFormat,
) -> Result<()> {
    let connection = open_connection(secrets, &target.connection).await?;
    let frame = connection.read(args.options(target)).await?;

    print_frame(&frame, format)
}

pub async fn query(
    secrets: Option<&Path>,
    sql: &str,
    target: &TargetArgs,
    args: &ReadArgs,
    format: OutputFormat,
) -> Result<()> {
    let connection = open_connection(secrets, &target.connection).await?;
    let frame = connection.query(sql, args.options(target)).await?;

    print_frame(&frame, format)
}

fn print_frame(frame: &Frame, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", frame.pretty()?),
        OutputFormat::Csv => frame.write_csv(io::stdout().lock())?,
    }
    info!(rows = frame.num_rows(), columns = frame.num_columns(), "Done");

    Ok(())
}
