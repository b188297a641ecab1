use ahti_export_lib::{DatabaseConfig, ExportConfig, SchemaVariant};
use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

/// Directory under the home directory that exports land in by default
const DEFAULT_OUTPUT_DIR: &str = "ahti-pipeline/output";

#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
/// Ahti debug export - writes candidate features as GeoJSON and serves them for local preview
pub struct Settings {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Export candidate features from the staging database as a GeoJSON FeatureCollection
    Export(ExportArgs),
    /// Serve a directory over HTTP with permissive CORS headers
    Serve(ServeArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ExportArgs {
    /// Output schema
    #[arg(short, long, value_enum, default_value_t = SchemaVariant::V18Unified)]
    pub schema: SchemaVariant,

    /// Output file (default: ~/ahti-pipeline/output/<schema file name>)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub database: DatabaseArgs,
}

#[derive(Args, Debug, Clone)]
pub struct DatabaseArgs {
    /// Full connection URL, overrides the individual connection flags
    #[arg(long = "database-url", env = "DATABASE_URL", hide_env_values = true)]
    pub url: Option<String>,

    /// Database host
    #[arg(long = "db-host", env = "AHTI_DB_HOST", default_value = "localhost")]
    pub host: String,

    /// Database port
    #[arg(long = "db-port", env = "AHTI_DB_PORT", default_value_t = 5432)]
    pub port: u16,

    /// Database name
    #[arg(long = "db-name", env = "AHTI_DB_NAME", default_value = "ahti_staging")]
    pub database: String,

    /// Database user
    #[arg(long = "db-user", env = "AHTI_DB_USER", default_value = "ahti_builder")]
    pub user: String,

    /// Database password
    #[arg(long = "db-password", env = "AHTI_DB_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(default_value_t = 8080)]
    pub port: u16,

    /// Address to bind
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub bind: IpAddr,

    /// Directory to serve
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub root: PathBuf,
}

impl From<DatabaseArgs> for DatabaseConfig {
    fn from(args: DatabaseArgs) -> Self {
        Self {
            url: args.url,
            host: args.host,
            port: args.port,
            database: args.database,
            user: args.user,
            password: args.password,
        }
    }
}

impl ExportArgs {
    /// Resolve the arguments into an explicit export configuration
    pub fn into_config(self) -> anyhow::Result<ExportConfig> {
        let output = match self.output {
            Some(path) => path,
            None => dirs::home_dir()
                .context("Cannot determine the home directory, pass --output")?
                .join(DEFAULT_OUTPUT_DIR)
                .join(self.schema.default_file_name()),
        };

        Ok(ExportConfig {
            schema: self.schema,
            database: self.database.into(),
            output,
        })
    }
}

impl Settings {
    /// Parse the command line, exiting with usage on error
    pub fn from_cli() -> Self {
        match Settings::try_parse() {
            Ok(args) => args,
            Err(e) => e.exit(),
        }
    }
}
