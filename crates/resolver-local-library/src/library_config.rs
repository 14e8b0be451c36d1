use config::{Config, Environment, File, FileFormat};
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Prefix of the environment variables overriding the settings file,
/// e.g. `RESOLVER__DATABASE__PATH`.
pub const ENV_PREFIX: &str = "RESOLVER";

/// Database backends
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "path")]
pub enum DatabaseBackend {
    Sqlite(PathBuf),
}

impl Default for DatabaseBackend {
    fn default() -> Self {
        DatabaseBackend::Sqlite("index.db".into())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Builder, PartialEq, Eq)]
#[builder(setter(into), default)]
#[serde(default)]
pub struct LibraryConfig {
    /// Descend into symlinked directories and index symlinked files.
    pub follow_symlinks: bool,
    pub database: DatabaseBackend,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        LibraryConfig {
            follow_symlinks: true,
            database: DatabaseBackend::default(),
        }
    }
}

impl LibraryConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_settings(&load_settings(path)?)
    }

    pub fn from_settings(settings: &Config) -> Result<Self, ConfigError> {
        let lc = settings.clone().try_deserialize::<LibraryConfig>()?;
        Ok(lc)
    }

    /// Writes this configuration as TOML, followed by a commented remote catalog section.
    pub fn write_default(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let mut body = toml::to_string_pretty(self)?;
        body.push_str(SUBSONIC_TEMPLATE);

        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, body)?;
        Ok(())
    }
}

const SUBSONIC_TEMPLATE: &str = r#"
# [subsonic]
# host = "http://localhost"
# port = 4533
# user = "me"
# password = "secret"
"#;

/// Reads the settings file (which may be missing) layered under `RESOLVER__*` variables.
pub fn load_settings(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let path = path.as_ref().to_string_lossy().into_owned();
    let cfg = Config::builder()
        .add_source(File::new(&path, FileFormat::Toml).required(false))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() {
        let tmp = tempdir().unwrap();
        let cfg = LibraryConfig::from_file(tmp.path().join("absent.toml")).unwrap();
        assert_eq!(cfg, LibraryConfig::default());
    }

    #[test]
    fn reads_database_section() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("settings.toml");
        std::fs::write(
            &path,
            "follow_symlinks = false\n[database]\ntype = \"Sqlite\"\npath = \"/var/lib/resolver/index.db\"\n",
        )
        .unwrap();

        let cfg = LibraryConfig::from_file(&path).unwrap();
        assert_eq!(
            cfg.database,
            DatabaseBackend::Sqlite("/var/lib/resolver/index.db".into())
        );
        assert!(!cfg.follow_symlinks);
    }

    #[test]
    fn default_file_round_trips_through_loader() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("config").join("settings.toml");

        let written = LibraryConfigBuilder::default()
            .database(DatabaseBackend::Sqlite(tmp.path().join("index.db")))
            .build()
            .unwrap();
        written.write_default(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("# [subsonic]"));
        assert_eq!(LibraryConfig::from_file(&path).unwrap(), written);
    }
}
