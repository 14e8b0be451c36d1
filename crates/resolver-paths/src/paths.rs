use std::{
    env,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;

use crate::{errors::Error, fs_utils};

/// Environment variable overriding the base directory ("portable" mode).
pub const ENV_BASE_DIR: &str = "RESOLVER_BASE_DIR";

/// Every directory and file location the resolver uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverPaths {
    // config_dir
    pub config_dir: PathBuf,
    pub settings_file: PathBuf,

    // data_dir
    pub data_dir: PathBuf,
    pub index_db: PathBuf,
}

impl ResolverPaths {
    /// Resolves the locations from `RESOLVER_BASE_DIR` or the platform
    /// project directories, then creates and validates the directories.
    pub fn new() -> Result<Self, Error> {
        let paths = match env::var_os(ENV_BASE_DIR) {
            Some(base) => Self::with_base(PathBuf::from(base)),
            None => {
                let proj = ProjectDirs::from("org", "MetaBrainz", "content-resolver").ok_or(Error::NoHome)?;
                Self::from_dirs(proj.config_dir(), proj.data_dir())
            }
        };

        paths.ensure_structure()?;
        paths.validate_structure()?;

        Ok(paths)
    }

    /// Lays every location out under `base`, without touching the disk.
    pub fn with_base(base: impl AsRef<Path>) -> Self {
        let base = base.as_ref();
        Self::from_dirs(&base.join("config"), &base.join("data"))
    }

    fn from_dirs(config_dir: &Path, data_dir: &Path) -> Self {
        ResolverPaths {
            config_dir: config_dir.to_path_buf(),
            settings_file: config_dir.join("settings.toml"),

            data_dir: data_dir.to_path_buf(),
            index_db: data_dir.join("index.db"),
        }
    }
}

impl ResolverPaths {
    /// Creates the config and data directories when missing.
    ///
    /// Files are left alone: the index is created by an explicit `create`,
    /// and a missing settings file means defaults.
    pub fn ensure_structure(&self) -> Result<(), Error> {
        fs_utils::ensure_dir(&self.config_dir)?;
        fs_utils::ensure_dir(&self.data_dir)?;
        Ok(())
    }

    /// Checks that every directory exists (recreating it if needed) and is writable.
    pub fn validate_structure(&self) -> Result<(), Error> {
        for dir in [&self.config_dir, &self.data_dir] {
            if !dir.exists() {
                fs_utils::ensure_dir(dir)?;
            }
            fs_utils::check_writable(dir)?;
        }
        Ok(())
    }
}
