//! CLI configuration handling.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use rewind_migrate::DEFAULT_TABLE_NAME;

use crate::cli::GlobalArgs;
use crate::error::{CliError, CliResult};

/// Default config file name (looked up in the working directory)
pub const CONFIG_FILE_NAME: &str = "rewind.toml";

/// Default migrations directory
pub const MIGRATIONS_DIR: &str = "./migrations";

/// Default database URL
pub const DATABASE_URL: &str = ":memory:";

/// Contents of `rewind.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Database configuration
    pub database: DatabaseConfig,

    /// Migration configuration
    pub migrations: MigrationConfig,
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CliError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load the explicit config file, or `rewind.toml` in `cwd` if present.
    ///
    /// An explicit path that does not exist is an error; a missing default
    /// file is not.
    pub fn discover(explicit: Option<&Path>, cwd: &Path) -> CliResult<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let path = cwd.join(CONFIG_FILE_NAME);
                if path.is_file() {
                    Self::load(&path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database connection URL
    pub url: Option<String>,
}

/// Migration configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationConfig {
    /// Directory for migration files
    pub directory: Option<PathBuf>,

    /// Migration table name
    pub table_name: Option<String>,
}

/// Effective settings after merging flags, environment, and file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Database URL
    pub database_url: String,
    /// Migrations directory
    pub migrations_dir: PathBuf,
    /// Tracking table name
    pub table_name: String,
}

impl Settings {
    /// Merge with precedence flag/env > file > default.
    pub fn resolve(args: &GlobalArgs, config: Config) -> Self {
        Self {
            database_url: args
                .database
                .clone()
                .or(config.database.url)
                .unwrap_or_else(|| DATABASE_URL.to_string()),
            migrations_dir: args
                .dir
                .clone()
                .or(config.migrations.directory)
                .unwrap_or_else(|| PathBuf::from(MIGRATIONS_DIR)),
            table_name: args
                .table
                .clone()
                .or(config.migrations.table_name)
                .unwrap_or_else(|| DEFAULT_TABLE_NAME.to_string()),
        }
    }

    /// Load the config file and resolve against the given flags.
    pub fn load(args: &GlobalArgs) -> CliResult<Self> {
        let cwd = std::env::current_dir()?;
        let config = Config::discover(args.config.as_deref(), &cwd)?;
        Ok(Self::resolve(args, config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let settings = Settings::resolve(&GlobalArgs::default(), Config::default());
        assert_eq!(
            settings,
            Settings {
                database_url: ":memory:".to_string(),
                migrations_dir: PathBuf::from("./migrations"),
                table_name: "__migration".to_string(),
            }
        );
    }

    #[test]
    fn test_file_overrides_defaults_and_flags_override_file() {
        let config: Config = toml::from_str(
            r#"
            [database]
            url = "sqlite://app.db"

            [migrations]
            directory = "db/migrations"
            table_name = "schema_history"
            "#,
        )
        .unwrap();

        let args = GlobalArgs {
            table: Some("override".to_string()),
            ..Default::default()
        };
        let settings = Settings::resolve(&args, config);

        assert_eq!(settings.database_url, "sqlite://app.db");
        assert_eq!(settings.migrations_dir, PathBuf::from("db/migrations"));
        assert_eq!(settings.table_name, "override");
    }

    #[test]
    fn test_unknown_section_is_rejected() {
        assert!(toml::from_str::<Config>("[generator]\noutput = \"x\"\n").is_err());
    }

    #[test]
    fn test_discover() {
        let dir = TempDir::new().unwrap();
        let config = Config::discover(None, dir.path()).unwrap();
        assert!(config.database.url.is_none());

        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "[database]\nurl = \"file:x.db\"\n",
        )
        .unwrap();
        let config = Config::discover(None, dir.path()).unwrap();
        assert_eq!(config.database.url.as_deref(), Some("file:x.db"));

        let missing = dir.path().join("nope.toml");
        assert!(Config::discover(Some(&missing), dir.path()).is_err());
    }
}
