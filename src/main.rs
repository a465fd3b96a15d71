use std::net::SocketAddr;
use std::sync::Arc;

use config::{Config, Environment, File};
use serde::Deserialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use grantbook::persist::PersistenceMode;
use grantbook::schema::Database;
use grantbook::server;

#[derive(Debug, Deserialize)]
#[serde(default)]
struct Settings {
    /// Address the http listener binds to.
    listen: String,
    /// Path of the backing database file. Leave empty to run purely in memory.
    database_file: String,
}

impl Default for Settings {
    fn default() -> Settings {
        Settings {
            listen: String::from("127.0.0.1:8080"),
            database_file: String::from("grantbook.db"),
        }
    }
}

impl Settings {
    /// Reads `grantbook.toml` when present, then lets `GRANTBOOK_` prefixed
    /// environment variables override it.
    fn load() -> grantbook::error::Result<Settings> {
        let settings = Config::builder()
            .add_source(File::with_name("grantbook").required(false))
            .add_source(Environment::with_prefix("GRANTBOOK"))
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }

    fn mode(&self) -> PersistenceMode {
        if self.database_file.is_empty() {
            PersistenceMode::InMemory
        } else {
            PersistenceMode::File(self.database_file.clone())
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = Settings::load()?;
    let database = Arc::new(Database::new(settings.mode())?);
    let app = server::router(Arc::clone(&database));

    let addr: SocketAddr = settings.listen.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(listen = %addr, mode = ?settings.mode(), "grantbook listening");
    axum::serve(listener, app).await?;
    Ok(())
}
