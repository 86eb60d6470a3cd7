use super::open_connection;
use clap::Subcommand;
use gsheets_connection::{Config, GSheetsClient, Result};
use std::path::Path;
use tracing::info;

#[derive(Subcommand, Debug)]
pub enum ShowResource {
    /// Show the secrets file path
    Paths,
    /// Show how a connection is configured
    Connection {
        /// Connection name in the secrets file
        #[arg(long, default_value = super::DEFAULT_CONNECTION)]
        connection: String,
    },
}

impl ShowResource {
    pub async fn execute(&self, secrets: Option<&Path>) -> Result<()> {
        match self {
            ShowResource::Paths => show_paths(secrets),
            ShowResource::Connection { connection } => show_connection(secrets, connection).await,
        }
    }
}

fn show_paths(secrets: Option<&Path>) -> Result<()> {
    let config_path = match secrets {
        Some(path) => path.to_path_buf(),
        None => Config::config_file()?,
    };

    info!(path = ?config_path, "Secrets path");

    Ok(())
}

async fn show_connection(secrets: Option<&Path>, name: &str) -> Result<()> {
    let connection = open_connection(secrets, name).await?;
    let defaults = connection.defaults();

    info!("{}", connection);
    info!(
        spreadsheet = ?defaults.spreadsheet,
        worksheet = ?defaults.worksheet,
        folder_id = ?defaults.folder_id,
        "Defaults"
    );

    Ok(())
}
