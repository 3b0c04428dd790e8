use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use log::{info, LevelFilter};
use scene_dedupe_core::{logging, Config, DupeTagger, LogLevel, MemoryStore, PhashDistance};

#[derive(Parser)]
#[command(name = "scene-dedupe")]
#[command(about = "Pick the scene to keep in every duplicate group and tag the rest")]
#[command(version)]
struct Cli {
    /// Library snapshot (JSON) to read scenes, tags and duplicate groups from
    #[arg(short, long, global = true)]
    library: Option<PathBuf>,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log what would change without writing the library back
    #[arg(long, global = true)]
    dry_run: bool,

    /// Write logs to rotating files in this directory instead of stderr
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the duplicate tags under their parent tag
    CreateTags,

    /// Delete the duplicate tags
    RemoveTags,

    /// Strip audit markers from titles and detach the keep/remove tags
    CleanTitles,

    /// Resolve duplicate groups and tag keepers and removals
    Tag {
        /// How similar scenes must be to count as duplicates (exact, high or medium)
        #[arg(long, default_value = "exact")]
        distance: PhashDistance,
    },

    /// Generate default configuration file
    GenerateConfig {
        /// Path to save configuration file
        #[arg(default_value = "scene-dedupe.json")]
        path: PathBuf,
    },
}

fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::GenerateConfig { path } => {
            Config::default().save_to_file(path)?;
            println!("Configuration file generated at: {}", path.display());
        }
        Commands::CreateTags => {
            let mut session = Session::open(&cli)?;
            session.tagger.create_tags()?;
            session.finish()?;
        }
        Commands::RemoveTags => {
            let mut session = Session::open(&cli)?;
            let removed = session.tagger.remove_tags()?;
            info!("Removed {} tags", removed);
            session.finish()?;
        }
        Commands::CleanTitles => {
            let mut session = Session::open(&cli)?;
            let summary = session.tagger.clean_titles()?;
            info!(
                "Cleaned {} titles, untagged {} keep and {} remove",
                summary.titles, summary.keep_tags, summary.remove_tags
            );
            session.finish()?;
        }
        Commands::Tag { distance } => {
            let mut session = Session::open(&cli)?;
            let summary = session.tagger.tag_duplicates(*distance)?;
            info!(
                "{} groups: {} resolved, {} skipped, {} failed",
                summary.groups, summary.resolved, summary.skipped, summary.failed
            );
            session.finish()?;
        }
    }

    Ok(())
}

/// A loaded library and the tagger working on it
struct Session {
    tagger: DupeTagger<MemoryStore>,
    library_path: PathBuf,
}

impl Session {
    fn open(cli: &Cli) -> anyhow::Result<Self> {
        // Set up configuration
        let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
        let mut config = if config_path.exists() {
            Config::from_file(&config_path)
                .with_context(|| format!("loading config {}", config_path.display()))?
        } else {
            Config::default()
        };

        // Override config with command line arguments
        config.dry_run |= cli.dry_run;
        config.log_level = match cli.verbose {
            0 => config.log_level,
            1 => LogLevel::Debug,
            _ => LogLevel::Trace,
        };

        init_logging(cli, LevelFilter::from(config.log_level))?;

        let library_path = cli
            .library
            .clone()
            .context("a library snapshot is required (--library <FILE>)")?;
        let store = MemoryStore::from_file(&library_path)
            .with_context(|| format!("loading library {}", library_path.display()))?;

        Ok(Self {
            tagger: DupeTagger::new(config, store)?,
            library_path,
        })
    }

    /// Write the library back unless this is a dry run
    fn finish(self) -> anyhow::Result<()> {
        if self.tagger.config().dry_run {
            info!("Dry run, library not written");
            return Ok(());
        }

        self.tagger
            .store()
            .save_to_file(&self.library_path)
            .with_context(|| format!("saving library {}", self.library_path.display()))?;
        info!("Library written to {}", self.library_path.display());
        Ok(())
    }
}

fn init_logging(cli: &Cli, level: LevelFilter) -> anyhow::Result<()> {
    match &cli.log_dir {
        Some(dir) => logging::init_logger(dir, level)
            .map_err(|e| anyhow::anyhow!("initializing file logging: {}", e)),
        None => {
            env_logger::Builder::new()
                .filter_level(level)
                .parse_env("SCENE_DEDUPE_LOG")
                .init();
            Ok(())
        }
    }
}
