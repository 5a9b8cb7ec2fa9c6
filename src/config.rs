use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::database::DB_FILENAME;

pub static CONFIG: OnceCell<Config> = OnceCell::new();

const ENV_PREFIX: &str = "OPENHOURS_";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub openhours: String,
}

impl LoggingConfig {
    const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];
    const OPENHOURS_LEVEL: &str = "info";

    fn default() -> Self {
        LoggingConfig {
            openhours: Self::OPENHOURS_LEVEL.to_string(),
        }
    }

    fn ensure_valid(&mut self) {
        let str_original = self.openhours.clone();
        self.openhours = self.openhours.trim().to_ascii_lowercase();
        if !Self::LOG_LEVELS.contains(&self.openhours.as_str()) {
            eprintln!(
                "Config error: openhours log level of '{}' is invalid - using default of '{}'",
                str_original,
                Self::OPENHOURS_LEVEL
            );
            self.openhours = Self::OPENHOURS_LEVEL.to_owned();
        }
    }

    /// Logger specification string for flexi_logger.
    pub fn log_spec(&self) -> String {
        format!("openhours={}", self.openhours)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// Database file. Relative paths are resolved against the data directory.
    pub path: String,
    pub pool_size: u32,
}

impl DatabaseConfig {
    const POOL_SIZE: u32 = 4;

    fn default() -> Self {
        DatabaseConfig {
            path: DB_FILENAME.to_owned(),
            pool_size: Self::POOL_SIZE,
        }
    }

    fn ensure_valid(&mut self) {
        if self.path.trim().is_empty() {
            eprintln!(
                "Config error: database path is empty - using default of '{}'",
                DB_FILENAME
            );
            self.path = DB_FILENAME.to_owned();
        }
        if self.pool_size == 0 {
            eprintln!(
                "Config error: database pool_size of 0 is invalid - using default of {}",
                Self::POOL_SIZE
            );
            self.pool_size = Self::POOL_SIZE;
        }
    }

    pub fn resolve_path(&self, data_dir: &Path) -> PathBuf {
        let path = Path::new(&self.path);
        if path.is_absolute() {
            path.to_owned()
        } else {
            data_dir.join(path)
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "127.0.0.1".to_owned(),
            port: 8080,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub logging: LoggingConfig,
    pub database: DatabaseConfig,
    pub server: ServerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            logging: LoggingConfig::default(),
            database: DatabaseConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl Config {
    /// Loads the configuration from a TOML file located in the app's data directory,
    /// with `OPENHOURS_`-prefixed environment variables layered on top
    /// (e.g. `OPENHOURS_SERVER__PORT=9000`).
    /// If the file is missing or fails to parse, defaults are used.
    /// Additionally, writes the default config to disk if no file exists.
    pub fn load_config(project_dirs: &ProjectDirs) -> Self {
        let config_path = project_dirs.data_local_dir().join("config.toml");
        let default_config = Config::default();

        if !config_path.exists() {
            Self::write_default(&config_path, &default_config);
        }

        Self::load_from(&config_path, default_config)
    }

    fn write_default(config_path: &Path, default_config: &Config) {
        if let Some(parent) = config_path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                eprintln!(
                    "Failed to create configuration directory {}: {}",
                    parent.display(),
                    e
                );
            }
        }
        match toml::to_string_pretty(default_config) {
            Ok(toml_string) => {
                if let Err(e) = fs::write(config_path, toml_string) {
                    eprintln!(
                        "Failed to write default config to {}: {}",
                        config_path.display(),
                        e
                    );
                }
            }
            Err(_) => eprintln!("Failed to serialize default config."),
        }
    }

    fn load_from(config_path: &Path, default_config: Config) -> Self {
        let figment = Figment::from(Serialized::defaults(default_config.clone()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        let mut config = figment.extract().unwrap_or_else(|err| {
            eprintln!(
                "Could not load config file {}: {}. Using default configuration.",
                config_path.display(),
                err
            );
            default_config
        });

        config.ensure_valid();

        config
    }

    fn ensure_valid(&mut self) {
        self.logging.ensure_valid();
        self.database.ensure_valid();
    }

    /// The loaded configuration, or defaults if none has been installed.
    pub fn get() -> Config {
        CONFIG.get().cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.logging.openhours, "info");
        assert_eq!(config.logging.log_spec(), "openhours=info");
        assert_eq!(config.database.path, DB_FILENAME);
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_toml_and_env_layering() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                [logging]
                openhours = " DEBUG "

                [server]
                host = "0.0.0.0"
                port = 9000
                "#,
            )?;
            jail.set_env("OPENHOURS_SERVER__PORT", "9100");

            let config = Config::load_from(Path::new("config.toml"), Config::default());
            assert_eq!(config.logging.openhours, "debug");
            assert_eq!(config.server.host, "0.0.0.0");
            assert_eq!(config.server.port, 9100);
            assert_eq!(config.database.pool_size, 4);
            Ok(())
        });
    }

    #[test]
    fn test_invalid_values_fall_back_to_defaults() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                [logging]
                openhours = "loud"

                [database]
                path = ""
                pool_size = 0
                "#,
            )?;

            let config = Config::load_from(Path::new("config.toml"), Config::default());
            assert_eq!(config.logging.openhours, "info");
            assert_eq!(config.database.path, DB_FILENAME);
            assert_eq!(config.database.pool_size, 4);
            Ok(())
        });
    }

    #[test]
    fn test_resolve_path() {
        let database = DatabaseConfig::default();
        let resolved = database.resolve_path(Path::new("/var/lib/openhours"));
        assert_eq!(resolved, Path::new("/var/lib/openhours").join(DB_FILENAME));
    }
}
