use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use config::Config;
use indicatif::{ProgressBar, ProgressStyle};
use resolver_local_library::{
    DatabaseBackend, LibraryConfig, LibraryError, LibraryManager, library_config::load_settings,
};
use resolver_paths::ResolverPaths;
use resolver_subsonic::{Jspf, SubsonicClient, SubsonicConfig, SyncReconciler, upload_playlist};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "resolver")]
#[command(about = "Index a local music collection and match it against a Subsonic server", long_about = None)]
struct Cli {
    /// Settings file; defaults to the per-user configuration directory
    #[arg(long, global = true, env = "RESOLVER_CONFIG")]
    config: Option<PathBuf>,

    /// Index database, overriding the settings file
    #[arg(long, global = true, env = "RESOLVER_DB")]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the index database, or upgrade its schema
    Create,
    /// Scan a directory and index the audio files in it
    Scan {
        /// Root of the music collection
        dir: PathBuf,
    },
    /// Find recordings whose file is gone
    Cleanup {
        /// Actually remove the stale recordings
        #[arg(long)]
        delete: bool,
    },
    /// Check that the index carries enough enrichment data
    Audit {
        /// Also check the Subsonic matches
        #[arg(long)]
        remote: bool,
    },
    /// Match the local collection against the Subsonic server
    Subsonic,
    /// Upload a JSPF playlist to the Subsonic server
    Playlist {
        /// JSPF file to upload
        jspf: PathBuf,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if let Some(LibraryError::StoreUnavailable { path, .. }) = e.downcast_ref::<LibraryError>() {
                eprintln!("Cannot open database index file: '{}'", path.display());
            } else {
                eprintln!("Error: {e:#}");
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let settings_file = match cli.config {
        Some(path) => path,
        None => ResolverPaths::new()?.settings_file,
    };
    debug!("Using settings file {}", settings_file.display());

    let settings = load_settings(&settings_file)?;
    let mut lib_config = LibraryConfig::from_settings(&settings)?;
    lib_config.database = match cli.db {
        Some(db) => DatabaseBackend::Sqlite(db),
        None => resolve_database(lib_config.database, &ResolverPaths::new()?),
    };

    match cli.command {
        Commands::Create => {
            if !settings_file.exists() {
                lib_config.write_default(&settings_file)?;
                info!("Wrote default settings to {}", settings_file.display());
            }
            LibraryManager::create(lib_config)?;
            println!("Index database ready");
        }
        Commands::Scan { dir } => {
            let manager = LibraryManager::open(lib_config)?;
            let stats = manager.scan(&dir, scan_progress())?;
            println!("{stats}");
            if !stats.is_consistent() {
                println!("And for some reason these numbers don't add up to the total number of tracks. Hmmm.");
            }
        }
        Commands::Cleanup { delete } => {
            let manager = LibraryManager::open(lib_config)?;
            let report = manager.cleanup(!delete)?;
            for (_, path) in &report.missing {
                println!("RM {path}");
            }
            if report.missing.is_empty() {
                println!("No cleanup needed, all recordings found");
            } else if report.dry_run {
                println!("--delete not specified, no references removed");
            } else {
                println!("Stale references removed: {}", report.deleted);
            }
        }
        Commands::Audit { remote } => {
            let manager = LibraryManager::open(lib_config)?;
            let report = manager.audit(remote)?;
            for warning in &report.warnings {
                println!("{warning}");
            }
        }
        Commands::Subsonic => {
            let manager = LibraryManager::open(lib_config)?;
            let client = SubsonicClient::new(subsonic_config(&settings)?)?;
            println!("Connect to subsonic..");
            let stats = SyncReconciler::new(&client, manager.storage()).sync()?;
            println!("{stats}");
        }
        Commands::Playlist { jspf } => {
            let playlist = Jspf::from_path(&jspf).with_context(|| format!("reading {}", jspf.display()))?;
            let client = SubsonicClient::new(subsonic_config(&settings)?)?;
            let sent = upload_playlist(&client, &playlist)?;
            println!("Uploaded '{}' with {sent} tracks", playlist.playlist.title);
        }
    }

    Ok(())
}

/// The default database is the per-user index; other relative paths live in the data directory.
fn resolve_database(database: DatabaseBackend, paths: &ResolverPaths) -> DatabaseBackend {
    if database == DatabaseBackend::default() {
        return DatabaseBackend::Sqlite(paths.index_db.clone());
    }
    match database {
        DatabaseBackend::Sqlite(path) if path.is_relative() => DatabaseBackend::Sqlite(paths.data_dir.join(path)),
        other => other,
    }
}

fn subsonic_config(settings: &Config) -> Result<SubsonicConfig> {
    match SubsonicConfig::from_settings(settings)? {
        Some(cfg) => Ok(cfg),
        None => bail!("no [subsonic] section in the settings file"),
    }
}

fn scan_progress() -> ProgressBar {
    let pb = ProgressBar::new(0);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec}, ETA: {eta})")
    {
        pb.set_style(style.progress_chars("=> "));
    }
    pb
}
