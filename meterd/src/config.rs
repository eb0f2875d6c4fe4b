//! Configuration for meterd
//!
//! All settings come from the command line or environment; the Gemini API
//! key is the only required value.

use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for meterd
#[derive(Parser, Debug, Clone)]
#[command(name = "meterd")]
#[command(about = "Utility meter reading microservice")]
#[command(version)]
pub struct Config {
    /// Port to listen on
    #[arg(short, long, default_value = "3000", env = "METERD_PORT")]
    pub port: u16,

    /// SQLite database file
    #[arg(long, default_value = "meterd.db", env = "METERD_DB")]
    pub database: PathBuf,

    /// API key for the Gemini generative/file-hosting service
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: String,

    /// Gemini endpoint override (proxies, test servers)
    #[arg(long, env = "GEMINI_BASE_URL")]
    pub gemini_base_url: Option<String>,

    /// Model used for reading extraction
    #[arg(long, default_value = "gemini-1.5-flash", env = "GEMINI_MODEL")]
    pub gemini_model: String,

    /// Directory for staged image files
    #[arg(long, env = "METERD_STAGING_DIR")]
    pub staging_dir: Option<PathBuf>,
}

impl Config {
    /// Staging directory, defaulting to a subdirectory of the system temp dir
    pub fn staging_dir_or_default(&self) -> PathBuf {
        self.staging_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("meterd-staging"))
    }
}
