use crate::client::{
    Defaults, GSheetsClient, ReadOptions, TargetOptions, WriteOptions, connect,
};
use crate::config::{Config, ConnectionConfig, Mode};
use crate::error::Result;
use crate::models::{Frame, Worksheet};
use crate::sheets::ClearResponse;
use async_trait::async_trait;
use std::fmt;
use tracing::{debug, instrument};

/// A named connection to spreadsheets, configured from the secrets file.
///
/// All operations are delegated to the client selected by the
/// configuration.
pub struct GSheetsConnection {
    name: String,
    configured: bool,
    client: Box<dyn GSheetsClient>,
}

impl GSheetsConnection {
    /// Connect using the `[connections.<name>]` section of the secrets file.
    ///
    /// A missing file or section gives a public connection without defaults.
    #[instrument(name = "Opening connection", skip_all, fields(name = %name))]
    pub async fn connect(name: &str) -> Result<Self> {
        let config = Config::load()?;
        Self::from_config(name, &config).await
    }

    pub async fn from_config(name: &str, config: &Config) -> Result<Self> {
        let connection = config.connection(name);
        debug!(name, mode = %connection.mode(), "Loaded connection configuration");
        Self::from_connection_config(name, &connection).await
    }

    pub async fn from_connection_config(name: &str, config: &ConnectionConfig) -> Result<Self> {
        let client = connect(config).await?;
        Ok(Self::with_client(name, !config.is_empty(), client))
    }

    pub fn with_client(name: &str, configured: bool, client: Box<dyn GSheetsClient>) -> Self {
        Self {
            name: name.to_string(),
            configured,
            client,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn client(&self) -> &dyn GSheetsClient {
        self.client.as_ref()
    }
}

#[async_trait]
impl GSheetsClient for GSheetsConnection {
    fn mode(&self) -> Mode {
        self.client.mode()
    }

    fn defaults(&self) -> &Defaults {
        self.client.defaults()
    }

    fn set_default(&mut self, spreadsheet: Option<String>, worksheet: Option<Worksheet>) {
        self.client.set_default(spreadsheet, worksheet)
    }

    async fn read(&self, options: ReadOptions) -> Result<Frame> {
        self.client.read(options).await
    }

    async fn query(&self, sql: &str, options: ReadOptions) -> Result<Frame> {
        self.client.query(sql, options).await
    }

    async fn create(&self, options: WriteOptions) -> Result<Option<Frame>> {
        self.client.create(options).await
    }

    async fn update(&self, options: WriteOptions) -> Result<Option<Frame>> {
        self.client.update(options).await
    }

    async fn clear(&self, options: TargetOptions) -> Result<ClearResponse> {
        self.client.clear(options).await
    }
}

impl fmt::Display for GSheetsConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Connection `{}` ({})", self.name, self.client.mode())?;
        if self.configured {
            write!(f, ", configured from [connections.{}]", self.name)?;
        }
        Ok(())
    }
}
