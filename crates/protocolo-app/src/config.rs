//! Configuration management
//!
//! Read from the process environment; a `.env` file in the working directory
//! is loaded first when present.

use std::path::PathBuf;

use sqlx::postgres::PgConnectOptions;

use protocolo_domain::service::SharedSecretGate;
use protocolo_types::{ConfigError, OutputFormat, Result};

const DEFAULT_TEMPLATE: &str = "modelo_devolucao.xlsx";

fn default_port() -> u16 {
    5432
}

fn default_max_connections() -> u32 {
    1
}

/// Connection settings for the PostgreSQL store
#[derive(Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub name: String,
    pub user: String,
    pub password: String,
    pub port: u16,
    pub max_connections: u32,
}

impl DatabaseConfig {
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.name)
    }
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("name", &self.name)
            .field("user", &self.user)
            .field("password", &"********")
            .field("port", &self.port)
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

/// Application configuration
#[derive(Clone)]
pub struct Config {
    /// DB_HOST
    pub db_host: Option<String>,
    /// DB_NAME
    pub db_name: Option<String>,
    /// DB_USER
    pub db_user: Option<String>,
    /// DB_PASSWORD
    pub db_password: Option<String>,
    /// DB_PORT
    pub db_port: u16,
    /// DB_MAX_CONNECTIONS
    pub db_max_connections: u32,
    /// DELETE_PASSWORD, the secret guarding bulk deletion
    pub delete_secret: Option<String>,
    /// PROTOCOLO_TEMPLATE
    pub template_path: PathBuf,
    /// PROTOCOLO_EXPORT_DIR
    pub export_dir: PathBuf,
    /// PROTOCOLO_OUTPUT
    pub output_format: OutputFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_host: None,
            db_name: None,
            db_user: None,
            db_password: None,
            db_port: default_port(),
            db_max_connections: default_max_connections(),
            delete_secret: None,
            template_path: PathBuf::from(DEFAULT_TEMPLATE),
            export_dir: PathBuf::from("."),
            output_format: OutputFormat::default(),
        }
    }
}

impl Config {
    /// Load `.env` (if any) and read the environment
    pub fn load() -> Result<Self> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                return Err(ConfigError::ParseError(e.to_string()).into());
            }
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; blank values count as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Config::default();

        let db_port = match get("DB_PORT") {
            Some(v) => v.trim().parse().map_err(|_| ConfigError::Invalid {
                var: "DB_PORT",
                value: v.clone(),
            })?,
            None => defaults.db_port,
        };

        let db_max_connections = match get("DB_MAX_CONNECTIONS") {
            Some(v) => match v.trim().parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::Invalid {
                        var: "DB_MAX_CONNECTIONS",
                        value: v,
                    }
                    .into())
                }
            },
            None => defaults.db_max_connections,
        };

        let output_format = match get("PROTOCOLO_OUTPUT") {
            Some(v) => v.parse::<OutputFormat>().map_err(|_| ConfigError::Invalid {
                var: "PROTOCOLO_OUTPUT",
                value: v.clone(),
            })?,
            None => defaults.output_format,
        };

        Ok(Self {
            db_host: get("DB_HOST"),
            db_name: get("DB_NAME"),
            db_user: get("DB_USER"),
            db_password: lookup("DB_PASSWORD"),
            db_port,
            db_max_connections,
            delete_secret: get("DELETE_PASSWORD"),
            template_path: get("PROTOCOLO_TEMPLATE")
                .map(PathBuf::from)
                .unwrap_or(defaults.template_path),
            export_dir: get("PROTOCOLO_EXPORT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.export_dir),
            output_format,
        })
    }

    /// Database settings; fails on the first required variable that is missing
    pub fn database(&self) -> Result<DatabaseConfig> {
        fn required(value: &Option<String>, var: &'static str) -> Result<String> {
            value.clone().ok_or_else(|| ConfigError::Missing(var).into())
        }

        Ok(DatabaseConfig {
            host: required(&self.db_host, "DB_HOST")?,
            name: required(&self.db_name, "DB_NAME")?,
            user: required(&self.db_user, "DB_USER")?,
            password: required(&self.db_password, "DB_PASSWORD")?,
            port: self.db_port,
            max_connections: self.db_max_connections,
        })
    }

    /// Gate guarding bulk deletion
    pub fn purge_gate(&self) -> SharedSecretGate {
        SharedSecretGate::new(self.delete_secret.clone())
    }
}

fn mask(value: &Option<String>) -> &'static str {
    match value {
        Some(_) => "********",
        None => "(not set)",
    }
}

impl std::fmt::Display for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let unset = "(not set)";
        writeln!(f, "Protocolo Configuration")?;
        writeln!(f, "=======================")?;
        writeln!(f)?;
        writeln!(f, "DB host:         {}", self.db_host.as_deref().unwrap_or(unset))?;
        writeln!(f, "DB port:         {}", self.db_port)?;
        writeln!(f, "DB name:         {}", self.db_name.as_deref().unwrap_or(unset))?;
        writeln!(f, "DB user:         {}", self.db_user.as_deref().unwrap_or(unset))?;
        writeln!(f, "DB password:     {}", mask(&self.db_password))?;
        writeln!(f, "DB connections:  {}", self.db_max_connections)?;
        writeln!(f, "Delete password: {}", mask(&self.delete_secret))?;
        writeln!(f, "Template:        {}", self.template_path.display())?;
        writeln!(f, "Export dir:      {}", self.export_dir.display())?;
        writeln!(f, "Output format:   {}", self.output_format)?;
        Ok(())
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("db_host", &self.db_host)
            .field("db_name", &self.db_name)
            .field("db_user", &self.db_user)
            .field("db_password", &mask(&self.db_password))
            .field("db_port", &self.db_port)
            .field("db_max_connections", &self.db_max_connections)
            .field("delete_secret", &mask(&self.delete_secret))
            .field("template_path", &self.template_path)
            .field("export_dir", &self.export_dir)
            .field("output_format", &self.output_format)
            .finish()
    }
}
