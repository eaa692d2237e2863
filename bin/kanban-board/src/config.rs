//! Runtime settings, read from `KANBAN_*` environment variables after an
//! optional `.env` file has been loaded.

use secrecy::SecretString;
use serde::{Deserialize, Deserializer};

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    /// Used by the `db-sqlite` backend.
    pub database_url: String,
    /// Token signing key for `auth-simple`.
    #[serde(default, deserialize_with = "secret")]
    pub auth_secret: Option<SecretString>,
}

fn secret<'de, D: Deserializer<'de>>(d: D) -> Result<Option<SecretString>, D::Error> {
    Ok(Option::<String>::deserialize(d)?.map(SecretString::from))
}

impl Settings {
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let settings = config::Config::builder()
            .set_default("host", "127.0.0.1")?
            .set_default("port", 8080)?
            .set_default("database_url", "sqlite:kanban_board.db")?
            .add_source(config::Environment::with_prefix("KANBAN").try_parsing(true))
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }
}
