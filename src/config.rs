use std::{net::SocketAddr, path::PathBuf};

use anyhow::Context;

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub database_url: String,
    pub db_max_connections: u32,
    pub ui_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port: u16 =
            std::env::var("PORT").unwrap_or_else(|_| "8000".to_string()).parse().context("PORT")?;

        let database_url = match std::env::var("DATABASE_URL") {
            Ok(url) => url,
            Err(_) => default_database_url()?,
        };

        let db_max_connections: u32 = std::env::var("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "5".to_string())
            .parse()
            .context("DB_MAX_CONNECTIONS")?;

        let ui_dir = std::env::var("UI_DIR").unwrap_or_else(|_| "../ui/build".to_string()).into();

        Ok(Self {
            addr: format!("{host}:{port}").parse().context("HOST/PORT")?,
            database_url,
            db_max_connections,
            ui_dir,
        })
    }
}

/// `movies.db` next to the installed executable.
fn default_database_url() -> anyhow::Result<String> {
    let exe = std::env::current_exe().context("locating executable")?;
    let dir = exe.parent().context("executable has no parent directory")?;
    Ok(format!("sqlite://{}?mode=rwc", dir.join("movies.db").display()))
}
