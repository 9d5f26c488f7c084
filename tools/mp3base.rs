mod config;

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use catalog::{check_tree, CatalogStats, CatalogStore, Ingestor, PromptChannel};
use clap::Parser;
use metadata::LoftyTagReader;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[clap(name = "mp3base", about = "Catalogue a collection of mp3 files")]
struct CliArgs {
    /// Only validate the tags of every file; the database is not opened.
    #[clap(short = 'c', long)]
    check: bool,

    /// Root directory of the collection.
    #[clap(short = 'm', long, default_value = ".")]
    music_dir: PathBuf,

    /// Catalog database file. Overrides the config file.
    #[clap(short = 'd', long)]
    db: Option<PathBuf>,

    /// YAML config file. Defaults to $MP3BASE_CONFIG or mp3base.yaml next to the binary.
    #[clap(long)]
    config: Option<PathBuf>,

    /// Log file every event is appended to. Overrides the config file.
    #[clap(long)]
    log_file: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(config::config_path_from_env);
    let config = config::load_config(&config_path)?;
    let log_path = args
        .log_file
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.log_path));
    init_logging(&log_path)?;
    if config_path.exists() {
        info!("Loaded configuration from {:?}", config_path);
    }

    let reader = LoftyTagReader;
    if args.check {
        info!("Checking tags below {:?}", args.music_dir);
        let summary = check_tree(&args.music_dir, &reader);
        println!("Checked {}", summary);
        return Ok(());
    }

    let db_path = args
        .db
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.db_path));
    let store = match CatalogStore::open(&db_path) {
        Ok(store) => store,
        Err(err) => {
            error!("Failed to open catalog {:?}: {}", db_path, err);
            return Err(err.into());
        }
    };
    info!("Using catalog {:?}", db_path);
    log_stats("before", &store.stats()?);

    let channel = PromptChannel::new(io::stdin().lock(), io::stdout());
    let mut ingestor = Ingestor::new(store, reader, channel, config.resolver.clone())?;
    let summary = match ingestor.ingest_tree(&args.music_dir) {
        Ok(summary) => summary,
        Err(err) => {
            error!("Run aborted: {}", err);
            return Err(err.into());
        }
    };
    log_stats("after", &ingestor.store().stats()?);

    println!("Done: {}", summary);
    Ok(())
}

fn init_logging(log_path: &Path) -> io::Result<()> {
    if let Some(parent) = log_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(log_file)),
        )
        .init();
    Ok(())
}

fn log_stats(when: &str, stats: &CatalogStats) {
    info!(
        "Catalog {} run: {} artists, {} albums, {} tracks, {} album links, {} track links",
        when, stats.artists, stats.albums, stats.tracks, stats.album_links, stats.track_links
    );
}
