use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use sparktab::assets::FallbackCatalog;
use sparktab::cache::{BlobCache, MetadataCache};
use sparktab::client::ProxyClient;
use sparktab::config::{CacheTier, Config};
use sparktab::constants::DEFAULT_HTTP_TIMEOUT_SECS;
use sparktab::keywords::KeywordPicker;
use sparktab::quotes::QuoteSource;
use sparktab::refresh::CacheRefresher;
use sparktab::store::{DiskBlobStore, FileKvStore};
use sparktab::tab::{Background, MemorySurface, TabInitializer};

/// Sparktab - new-tab background/quote engine
#[derive(Parser, Debug)]
#[command(name = "sparktab")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Test configuration and exit
    #[arg(long)]
    test: bool,

    /// Run a cache refresh without opening a tab
    #[arg(long)]
    refresh_only: bool,
}

#[tokio::main]
async fn main() {
    // Initialize logging subsystem
    sparktab::logging::init_subscriber().expect("Failed to initialize logging subsystem");

    // Parse command-line arguments
    let args = Args::parse();

    // Load configuration from file
    let config = Config::from_file(&args.config).unwrap_or_else(|e| {
        eprintln!("Failed to load configuration: {}", e);
        std::process::exit(1);
    });

    if args.test {
        println!("Configuration OK: {}", args.config.display());
        return;
    }

    tracing::info!(
        config_file = %args.config.display(),
        proxy_url = %config.proxy_url,
        tier = ?config.cache.tier,
        batch_size = config.cache.batch_size,
        "Configuration loaded successfully"
    );

    let ttl = config.ttl();
    let http_timeout = Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS);

    // Persisted stores and cache tiers
    let kv = FileKvStore::open(config.data_dir.join("kv.json")).unwrap_or_else(|e| {
        eprintln!("Failed to open metadata store: {}", e);
        std::process::exit(1);
    });
    let metadata = Arc::new(MetadataCache::new(Arc::new(kv), ttl));

    let blobs = match config.cache.tier {
        CacheTier::Blob => {
            let store = DiskBlobStore::open(config.data_dir.join("blobs"))
                .await
                .unwrap_or_else(|e| {
                    eprintln!("Failed to open blob store: {}", e);
                    std::process::exit(1);
                });
            Some(Arc::new(BlobCache::new(Arc::new(store), ttl)))
        }
        CacheTier::Metadata => None,
    };

    // Proxy client and refresher
    let client = ProxyClient::new(&config.proxy_url, http_timeout).unwrap_or_else(|e| {
        eprintln!("Failed to create proxy client: {}", e);
        std::process::exit(1);
    });
    let keywords = match &config.keywords {
        Some(catalog) => KeywordPicker::with_catalog(catalog.clone()),
        None => KeywordPicker::new(),
    };
    let refresher = Arc::new(CacheRefresher::new(
        Arc::new(client),
        keywords,
        metadata.clone(),
        blobs.clone(),
    ));

    if args.refresh_only {
        refresher.refresh_if_needed(config.cache.batch_size).await;
        return;
    }

    // Quote source and fallback assets
    let quotes = QuoteSource::new(&config.quotes_source, http_timeout).unwrap_or_else(|e| {
        eprintln!("Failed to create quote source: {}", e);
        std::process::exit(1);
    });
    let assets = match &config.fallback_assets {
        Some(ids) => FallbackCatalog::with_assets(ids.clone()),
        None => FallbackCatalog::new(),
    };

    // Open one tab against a recording surface and report what a
    // renderer would display
    let surface = Arc::new(MemorySurface::new());
    let tab = TabInitializer::new(
        surface.clone(),
        assets,
        metadata,
        blobs,
        refresher,
        Arc::new(quotes),
        config.cache.batch_size,
    );
    tab.open_tab().await;

    match surface.current_background() {
        Some(Background::Asset(id)) => {
            tracing::info!(asset = %id, "Background: bundled fallback asset")
        }
        Some(Background::Url(url)) => {
            tracing::info!(url = %url, "Background: cached image URL")
        }
        Some(Background::Bytes(payload)) => {
            tracing::info!(bytes = payload.len(), "Background: cached image payload")
        }
        None => {}
    }

    if let Some(attribution) = surface.attribution() {
        tracing::info!(
            photographer = %attribution.photographer,
            profile_url = %attribution.profile_url,
            "Attribution"
        );
    }

    if let Some((text, author_label)) = surface.quote() {
        println!("\"{}\"", text);
        if !author_label.is_empty() {
            println!("{}", author_label);
        }
    }
}
