use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct WebConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from_address: String,
    pub from_name: String,
    pub contact_recipient: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub web: WebConfig,
    pub database_path: String,
    pub allowed_origins: String,
    pub log_level: String,
    pub session_secret_key: String,
    pub use_secure_cookies: bool,
    pub smtp: SmtpConfig,
}

impl Config {
    pub fn from_env(env_path: &Path) -> Result<Self, config::ConfigError> {
        dotenvy::from_path(env_path).map_err(|e| {
            config::ConfigError::Message(format!(
                "FATAL: Failed to load .env file from '{}'. Error: {}",
                env_path.display(),
                e
            ))
        })?;

        let database_path = env::var("DATABASE_PATH").map_err(|_| {
            config::ConfigError::Message(
                "FATAL: Environment variable 'DATABASE_PATH' is not set in your .env file."
                    .to_string(),
            )
        })?;

        if Path::new(&database_path).is_relative() {
            return Err(config::ConfigError::Message(format!(
                "FATAL: The 'DATABASE_PATH' in your .env file is a relative path ('{}'). It MUST be an absolute path.",
                database_path
            )));
        }

        let session_secret_key = env::var("SESSION_SECRET_KEY").map_err(|_| {
            config::ConfigError::Message(
                "FATAL: Environment variable 'SESSION_SECRET_KEY' is not set in your .env file."
                    .to_string(),
            )
        })?;

        // The cookie key must be exactly 64 bytes, hex-encoded.
        if session_secret_key.len() != 128
            || !session_secret_key.chars().all(|c| c.is_ascii_hexdigit())
        {
            return Err(config::ConfigError::Message(
                "FATAL: 'SESSION_SECRET_KEY' must be 128 hexadecimal characters long (64 bytes)."
                    .to_string(),
            ));
        }

        let smtp_host = env::var("SMTP_HOST").map_err(|_| {
            config::ConfigError::Message(
                "FATAL: Environment variable 'SMTP_HOST' is not set in your .env file.".to_string(),
            )
        })?;

        let smtp_port = env::var("SMTP_PORT")
            .unwrap_or_else(|_| "587".to_string())
            .parse::<u16>()
            .map_err(|_| {
                config::ConfigError::Message(
                    "FATAL: 'SMTP_PORT' must be a valid port number.".to_string(),
                )
            })?;

        let smtp_from_address = env::var("SMTP_FROM_ADDRESS").map_err(|_| {
            config::ConfigError::Message(
                "FATAL: Environment variable 'SMTP_FROM_ADDRESS' is not set in your .env file."
                    .to_string(),
            )
        })?;

        let contact_recipient = env::var("CONTACT_RECIPIENT").map_err(|_| {
            config::ConfigError::Message(
                "FATAL: Environment variable 'CONTACT_RECIPIENT' is not set in your .env file."
                    .to_string(),
            )
        })?;

        let smtp_username = env::var("SMTP_USERNAME").ok();
        let smtp_password = env::var("SMTP_PASSWORD").ok();
        let smtp_from_name = env::var("SMTP_FROM_NAME").unwrap_or_else(|_| "Recette".to_string());

        let allowed_origins = env::var("ALLOWED_ORIGINS").unwrap_or_else(|_| "".to_string());
        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let use_secure_cookies = env::var("USE_SECURE_COOKIES")
            .unwrap_or_else(|_| "false".to_string())
            .parse::<bool>()
            .unwrap_or(false);

        let mut builder = config::Config::builder()
            // Base settings (web host/port) come from the TOML file.
            .add_source(config::File::new(
                "config/default.toml",
                config::FileFormat::Toml,
            ))
            .set_override("database_path", database_path)?
            .set_override("session_secret_key", session_secret_key)?
            .set_override("allowed_origins", allowed_origins)?
            .set_override("log_level", log_level)?
            .set_override("use_secure_cookies", use_secure_cookies)?
            .set_override("smtp.host", smtp_host)?
            .set_override("smtp.port", smtp_port)?
            .set_override("smtp.from_address", smtp_from_address)?
            .set_override("smtp.from_name", smtp_from_name)?
            .set_override("smtp.contact_recipient", contact_recipient)?;

        // Credentials are optional; a missing key deserializes to None.
        if let Some(username) = smtp_username {
            builder = builder.set_override("smtp.username", username)?;
        }
        if let Some(password) = smtp_password {
            builder = builder.set_override("smtp.password", password)?;
        }

        builder.build()?.try_deserialize()
    }

    /// Returns the full path to the users database file inside its own folder.
    pub fn users_db_path(&self) -> PathBuf {
        PathBuf::from(&self.database_path)
            .join("users")
            .join("users.db")
    }

    /// Returns the full path to the recipes database file inside its own folder.
    pub fn recipes_db_path(&self) -> PathBuf {
        PathBuf::from(&self.database_path)
            .join("recipes")
            .join("recipes.db")
    }
}
