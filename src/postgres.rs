use sqlx::Connection;
use sqlx::postgres::{PgConnectOptions, PgConnection};

use crate::config::Config;
use crate::error::Result;

/// Opens single PostgreSQL connections for the configured endpoint. Every
/// caller owns the connection it gets and closes it when done.
#[derive(Clone)]
pub struct PostgresManager {
    options: PgConnectOptions,
    endpoint: String,
}

impl PostgresManager {
    pub fn new_with_config(config: &Config) -> Self {
        let options = PgConnectOptions::new()
            .host(&config.database.host)
            .port(config.database.port)
            .database(&config.credentials.database)
            .username(&config.credentials.user)
            .password(&config.credentials.password)
            .application_name("beer-reports");

        Self {
            options,
            endpoint: config.database.host.clone(),
        }
    }

    /// Host the connections are made to, as shown to the user
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Open a new connection
    pub async fn connect(&self) -> Result<PgConnection> {
        tracing::debug!(
            "Connecting to PostgreSQL at {}:{} (db: {})",
            self.endpoint,
            self.options.get_port(),
            self.options.get_database().unwrap_or_default()
        );
        Ok(PgConnection::connect_with(&self.options).await?)
    }

    /// Open a connection and close it straight away
    pub async fn ping(&self) -> Result<()> {
        let conn = self.connect().await?;
        conn.close().await?;
        Ok(())
    }
}
