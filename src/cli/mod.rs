mod read;
mod show;
mod write;

use clap::{Args, Parser, Subcommand, ValueEnum};
use gsheets_connection::{
    CachePolicy, Config, CsvOptions, GSheetsConnection, ReadOptions, Result, TargetOptions,
    Worksheet,
};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub use show::ShowResource;

const DEFAULT_CONNECTION: &str = "gsheets";

#[derive(Parser, Debug)]
#[command(name = "gsheets")]
#[command(about = "Read, query and write Google Sheets as tables", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Secrets file to load connections from
    #[arg(long, global = true)]
    pub secrets: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub async fn run(&self) -> Result<()> {
        let secrets = self.secrets.as_deref();
        match &self.command {
            Commands::Read {
                target,
                read,
                format,
            } => read::read(secrets, target, read, *format).await,
            Commands::Query {
                sql,
                target,
                read,
                format,
            } => read::query(secrets, sql, target, read, *format).await,
            Commands::Create { target, data } => {
                write::create(secrets, target, data.as_deref()).await
            }
            Commands::Update { target, data } => {
                write::update(secrets, target, data.as_deref()).await
            }
            Commands::Clear { target, yes } => write::clear(secrets, target, *yes).await,
            Commands::Show { resource } => resource.execute(secrets).await,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Read a worksheet
    Read {
        #[command(flatten)]
        target: TargetArgs,
        #[command(flatten)]
        read: ReadArgs,
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// Run SQL where table names refer to worksheets
    Query {
        sql: String,
        #[command(flatten)]
        target: TargetArgs,
        #[command(flatten)]
        read: ReadArgs,
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// Add a worksheet, creating the spreadsheet if needed
    Create {
        #[command(flatten)]
        target: TargetArgs,
        /// CSV file with the rows to write
        #[arg(long)]
        data: Option<PathBuf>,
    },
    /// Replace the contents of a worksheet
    Update {
        #[command(flatten)]
        target: TargetArgs,
        /// CSV file with the rows to write
        #[arg(long)]
        data: Option<PathBuf>,
    },
    /// Clear all values of a worksheet
    Clear {
        #[command(flatten)]
        target: TargetArgs,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    Show {
        #[command(subcommand)]
        resource: ShowResource,
    },
}

#[derive(Args, Debug)]
pub struct TargetArgs {
    /// Connection name in the secrets file
    #[arg(long, default_value = DEFAULT_CONNECTION)]
    pub connection: String,
    /// Spreadsheet URL, key or title
    #[arg(long)]
    pub spreadsheet: Option<String>,
    /// Worksheet title, index or grid id
    #[arg(long)]
    pub worksheet: Option<Worksheet>,
    /// Drive folder to search for the spreadsheet
    #[arg(long)]
    pub folder_id: Option<String>,
}

impl TargetArgs {
    fn options(&self) -> TargetOptions {
        TargetOptions {
            spreadsheet: self.spreadsheet.clone(),
            worksheet: self.worksheet.clone(),
            folder_id: self.folder_id.clone(),
        }
    }
}

#[derive(Args, Debug)]
pub struct ReadArgs {
    /// Only keep these columns, by zero-based index
    #[arg(long, value_delimiter = ',')]
    pub usecols: Option<Vec<usize>>,
    /// Maximum number of rows
    #[arg(long)]
    pub nrows: Option<usize>,
    /// The first row holds data, not column names
    #[arg(long)]
    pub no_header: bool,
    /// Read formulas instead of their results
    #[arg(long)]
    pub formulas: bool,
    /// Seconds to cache results for, 0 to disable
    #[arg(long)]
    pub ttl: Option<u64>,
}

impl ReadArgs {
    fn options(&self, target: &TargetArgs) -> ReadOptions {
        let cache = match self.ttl {
            Some(seconds) => CachePolicy::default().with_ttl(Some(Duration::from_secs(seconds))),
            None => CachePolicy::default(),
        };

        ReadOptions {
            target: target.options(),
            evaluate_formulas: !self.formulas,
            cache,
            csv: CsvOptions {
                has_header: !self.no_header,
                usecols: self.usecols.clone(),
                nrows: self.nrows,
                infer_rows: None,
            },
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Csv,
}

async fn open_connection(
    secrets: Option<&Path>,
    name: &str,
) -> Result<GSheetsConnection> {
    let config = match secrets {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    GSheetsConnection::from_config(name, &config).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_read_args() {
        let cli = Cli::parse_from([
            "gsheets",
            "read",
            "--worksheet",
            "1585633377",
            "--usecols",
            "0,1",
            "--ttl",
            "0",
            "--format",
            "csv",
        ]);

        let Commands::Read {
            target,
            read,
            format,
        } = cli.command
        else {
            panic!("expected read command");
        };
        let options = read.options(&target);

        assert_eq!(target.connection, DEFAULT_CONNECTION);
        assert_eq!(options.target.worksheet, Some(Worksheet::Id(1585633377)));
        assert_eq!(options.csv.usecols, Some(vec![0, 1]));
        assert_eq!(options.cache, CachePolicy::disabled());
        assert!(options.evaluate_formulas);
        assert_eq!(format, OutputFormat::Csv);
    }

    #[test]
    fn test_parse_named_worksheet() {
        let cli = Cli::parse_from(["gsheets", "clear", "--worksheet", "Example 1", "--yes"]);

        let Commands::Clear { target, yes } = cli.command else {
            panic!("expected clear command");
        };

        assert!(yes);
        assert_eq!(target.options().worksheet, Some(Worksheet::from("Example 1")));
    }
}
