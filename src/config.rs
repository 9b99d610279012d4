use anyhow::{Context, Result};
use clap::Parser;
use std::{env, path::PathBuf};

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// sqlx connection URL; carries host, user, password, database and port
    /// for networked engines.
    pub database_url: String,
    pub db_max_connections: u32,
    pub public_dir: PathBuf,
    pub images_dir: PathBuf,
    pub audio_dir: PathBuf,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Audiobook catalog HTTP backend")]
pub struct Args {
    /// Host to bind to (overrides AUDIOBOOK_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides AUDIOBOOK_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Database URL (overrides AUDIOBOOK_DATABASE_URL)
    #[arg(long)]
    pub database_url: Option<String>,

    /// Size of the database connection pool (overrides AUDIOBOOK_DB_MAX_CONNECTIONS)
    #[arg(long)]
    pub db_max_connections: Option<u32>,

    /// Directory of front-end assets (overrides AUDIOBOOK_PUBLIC_DIR)
    #[arg(long)]
    pub public_dir: Option<PathBuf>,

    /// Directory for uploaded cover images (overrides AUDIOBOOK_IMAGES_DIR)
    #[arg(long)]
    pub images_dir: Option<PathBuf>,

    /// Directory for uploaded chapter audio (overrides AUDIOBOOK_AUDIO_DIR)
    #[arg(long)]
    pub audio_dir: Option<PathBuf>,

    /// Apply the schema and exit
    #[arg(long)]
    pub migrate: bool,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and migrate flag.
    pub fn from_env_and_args() -> Result<(Self, bool)> {
        let args = Args::parse();
        let migrate = args.migrate;
        Ok((Self::merge(args, |key| env::var(key))?, migrate))
    }

    /// CLI values win over the environment, which wins over defaults.
    fn merge<F>(args: Args, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Result<String, env::VarError>,
    {
        let env_host = lookup("AUDIOBOOK_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let env_port = parse_var(&lookup, "AUDIOBOOK_PORT", 3000u16)?;
        let env_db = lookup("AUDIOBOOK_DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://./data/audiobook.db".into());
        let env_max_conn = parse_var(&lookup, "AUDIOBOOK_DB_MAX_CONNECTIONS", 10u32)?;
        let env_dir = |key: &str, default: &str| {
            lookup(key)
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(default))
        };

        Ok(Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            database_url: args.database_url.unwrap_or(env_db),
            db_max_connections: args.db_max_connections.unwrap_or(env_max_conn),
            public_dir: args
                .public_dir
                .unwrap_or_else(|| env_dir("AUDIOBOOK_PUBLIC_DIR", "./public")),
            images_dir: args
                .images_dir
                .unwrap_or_else(|| env_dir("AUDIOBOOK_IMAGES_DIR", "./images")),
            audio_dir: args
                .audio_dir
                .unwrap_or_else(|| env_dir("AUDIOBOOK_AUDIO_DIR", "./audio")),
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Result<String, env::VarError>,
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Ok(value) => value
            .parse::<T>()
            .with_context(|| format!("parsing {} value `{}`", key, value)),
        Err(env::VarError::NotPresent) => Ok(default),
        Err(err) => Err(err).with_context(|| format!("reading {}", key)),
    }
}
