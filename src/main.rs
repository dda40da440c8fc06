use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use csv::Writer;
use hearth_core::{
    create_record_table, BatchStore, SeedCounts, SeedKind, SeedPage, SeedPages, Settings,
};
use hearth_scrapers::{
    balanced_mix, parse_saved_details, DetailParser, ExtractConfig, LinkHarvester, PageFetcher,
};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new batch and seed its search pages
    #[command(about = "Create a new batch and seed its search pages")]
    Init(InitCommand),

    /// Fetch a balanced mix of seeded search pages
    #[command(about = "Fetch a balanced mix of seeded search pages")]
    FetchSearch(FetchSearchCommand),

    /// Extract listing detail URLs from saved search pages
    #[command(about = "Extract listing detail URLs from saved search pages")]
    Harvest(HarvestCommand),

    /// Fetch N listing detail pages into the batch
    #[command(about = "Fetch N listing detail pages into the batch")]
    FetchDetails(FetchDetailsCommand),

    /// Parse saved detail pages into structured records
    #[command(about = "Parse saved detail pages into structured records")]
    Parse(ParseCommand),

    /// Fetch N detail pages, then parse them
    #[command(about = "Fetch N detail pages, then parse them")]
    Run(RunCommand),

    /// List parsed records from a batch
    #[command(about = "List parsed records from a batch")]
    List(ListCommand),

    /// Export parsed records to CSV
    #[command(about = "Export parsed records to CSV")]
    Export(ExportCommand),
}

#[derive(Parser)]
struct InitCommand {
    /// Settings file path (-c, --config)
    #[arg(short = 'c', long, default_value = "config/listings.json")]
    config: PathBuf,

    /// Data directory (-d, --data-dir)
    #[arg(short = 'd', long, default_value = "data")]
    data_dir: PathBuf,
}

#[derive(Parser)]
struct FetchSearchCommand {
    /// Settings file path (-c, --config)
    #[arg(short = 'c', long, default_value = "config/listings.json")]
    config: PathBuf,

    /// Data directory (-d, --data-dir)
    #[arg(short = 'd', long, default_value = "data")]
    data_dir: PathBuf,

    /// Batch id; defaults to the latest batch (-b, --batch)
    #[arg(short = 'b', long)]
    batch: Option<String>,

    /// Maximum number of search pages to fetch (-l, --limit)
    #[arg(short = 'l', long, default_value_t = 10)]
    limit: usize,
}

#[derive(Parser)]
struct HarvestCommand {
    /// Data directory (-d, --data-dir)
    #[arg(short = 'd', long, default_value = "data")]
    data_dir: PathBuf,

    /// Batch id; defaults to the latest batch (-b, --batch)
    #[arg(short = 'b', long)]
    batch: Option<String>,

    /// Maximum number of saved search pages to scan (-m, --max-files)
    #[arg(short = 'm', long, default_value_t = 4)]
    max_files: usize,
}

#[derive(Parser)]
struct FetchDetailsCommand {
    /// Settings file path (-c, --config)
    #[arg(short = 'c', long, default_value = "config/listings.json")]
    config: PathBuf,

    /// Data directory (-d, --data-dir)
    #[arg(short = 'd', long, default_value = "data")]
    data_dir: PathBuf,

    /// Batch id; defaults to the latest batch (-b, --batch)
    #[arg(short = 'b', long)]
    batch: Option<String>,

    /// Number of detail pages to fetch (-n)
    #[arg(short = 'n', long, default_value_t = 10)]
    n: usize,
}

#[derive(Parser)]
struct ParseCommand {
    /// Data directory (-d, --data-dir)
    #[arg(short = 'd', long, default_value = "data")]
    data_dir: PathBuf,

    /// Batch id; defaults to the latest batch (-b, --batch)
    #[arg(short = 'b', long)]
    batch: Option<String>,

    /// Maximum number of detail pages to parse (-l, --limit)
    #[arg(short = 'l', long, default_value_t = 10)]
    limit: usize,
}

#[derive(Parser)]
struct RunCommand {
    /// Settings file path (-c, --config)
    #[arg(short = 'c', long, default_value = "config/listings.json")]
    config: PathBuf,

    /// Data directory (-d, --data-dir)
    #[arg(short = 'd', long, default_value = "data")]
    data_dir: PathBuf,

    /// Batch id; defaults to the latest batch (-b, --batch)
    #[arg(short = 'b', long)]
    batch: Option<String>,

    /// Number of detail pages to fetch and parse (-n)
    #[arg(short = 'n', long, default_value_t = 10)]
    n: usize,
}

#[derive(Parser)]
struct ListCommand {
    /// Data directory (-d, --data-dir)
    #[arg(short = 'd', long, default_value = "data")]
    data_dir: PathBuf,

    /// Batch id; defaults to the latest batch (-b, --batch)
    #[arg(short = 'b', long)]
    batch: Option<String>,

    /// Maximum number of records to display (-l, --limit)
    #[arg(short = 'l', long, default_value_t = 10)]
    limit: usize,
}

#[derive(Parser)]
struct ExportCommand {
    /// Data directory (-d, --data-dir)
    #[arg(short = 'd', long, default_value = "data")]
    data_dir: PathBuf,

    /// Batch id; defaults to the latest batch (-b, --batch)
    #[arg(short = 'b', long)]
    batch: Option<String>,

    /// Output file path (-o, --output)
    #[arg(short = 'o', long, default_value = "records.csv")]
    output: PathBuf,
}

async fn fetch_details(
    settings: &Settings,
    store: &BatchStore,
    n: usize,
) -> anyhow::Result<usize> {
    let listing_urls = store
        .read_listing_urls()
        .context("loading harvested listing urls")?;
    anyhow::ensure!(
        !listing_urls.urls.is_empty(),
        "no detail URLs in listing_urls.json"
    );

    let fetcher = PageFetcher::new(&settings.run)?;
    let mut idx = store.next_detail_index()?;
    let total = n.min(listing_urls.urls.len());
    info!("fetching {} details starting at {:04}", total, idx);

    let mut fetched = 0;
    for row in listing_urls.urls.iter().take(n) {
        match fetcher
            .fetch_and_save(store, idx, &row.source_url, SeedKind::Detail)
            .await
        {
            Ok(outcome) => {
                info!("[{}] {} -> {}", outcome.idx, outcome.status, row.source_url);
                fetched += 1;
                idx += 1;
            }
            Err(err) => warn!("failed to fetch {}: {}", row.source_url, err),
        }
        fetcher.polite_sleep().await;
    }
    Ok(fetched)
}

fn parse_details(store: &BatchStore, limit: usize) -> anyhow::Result<usize> {
    anyhow::ensure!(
        !store.detail_indices()?.is_empty(),
        "no detail raw files found in batch {}; run `hearth fetch-details` first",
        store.batch_id()
    );
    let parser = DetailParser::new(&ExtractConfig::default())?;
    let results = parse_saved_details(store, &parser, limit)?;
    Ok(results.len())
}

fn fmt_opt<T: ToString>(value: &Option<T>) -> String {
    value.as_ref().map(T::to_string).unwrap_or_default()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init(cmd) => {
            let settings = Settings::load(&cmd.config)?;
            let batch_id = format!(
                "{}_zips{}",
                Utc::now().format("%Y-%m-%d"),
                settings.zip_count()
            );
            let store = BatchStore::open(&cmd.data_dir, &batch_id)?;

            let search_pages = settings.search_seeds();
            let detail_pages: Vec<SeedPage> = settings
                .seeds
                .detail_urls
                .iter()
                .map(|url| SeedPage {
                    platform_id: PageFetcher::infer_platform(url),
                    zip: None,
                    url: url.clone(),
                })
                .collect();

            let seeds = SeedPages {
                batch_id: batch_id.clone(),
                generated_at: Utc::now(),
                counts: SeedCounts {
                    zip_total: settings.zip_count(),
                    search_pages_total: search_pages.len(),
                    detail_pages_total: detail_pages.len(),
                },
                search_pages,
                detail_pages,
            };
            let path = store.write_seed_pages(&seeds)?;
            info!("batch {} ready, seeds at {}", batch_id, path.display());
        }
        Commands::FetchSearch(cmd) => {
            let settings = Settings::load(&cmd.config)?;
            let store = BatchStore::open_or_latest(&cmd.data_dir, cmd.batch.as_deref())?;
            let seeds = store.read_seed_pages()?;

            let mixed = balanced_mix(&seeds.search_pages, cmd.limit);
            anyhow::ensure!(!mixed.is_empty(), "no search pages in seeds; check config areas");

            let fetcher = PageFetcher::new(&settings.run)?;
            let mut idx = store.next_search_index()?;
            for (i, page) in mixed.iter().enumerate() {
                match fetcher
                    .fetch_and_save(&store, idx, &page.url, SeedKind::Search)
                    .await
                {
                    Ok(outcome) => {
                        info!("[{}/{}] {} -> {}", i + 1, mixed.len(), outcome.status, page.url);
                        idx += 1;
                    }
                    Err(err) => warn!("[{}/{}] {}: {}", i + 1, mixed.len(), page.url, err),
                }
                fetcher.polite_sleep().await;
            }
        }
        Commands::Harvest(cmd) => {
            let store = BatchStore::open_or_latest(&cmd.data_dir, cmd.batch.as_deref())?;
            let harvester = LinkHarvester::new()?;
            let doc = harvester.harvest(&store, cmd.max_files)?;
            info!(
                "extracted {} listing urls in batch {}",
                doc.count,
                store.batch_id()
            );
        }
        Commands::FetchDetails(cmd) => {
            let settings = Settings::load(&cmd.config)?;
            let store = BatchStore::open_or_latest(&cmd.data_dir, cmd.batch.as_deref())?;
            let fetched = fetch_details(&settings, &store, cmd.n).await?;
            info!("fetched {} detail pages in batch {}", fetched, store.batch_id());
        }
        Commands::Parse(cmd) => {
            let store = BatchStore::open_or_latest(&cmd.data_dir, cmd.batch.as_deref())?;
            let parsed = parse_details(&store, cmd.limit)?;
            info!("parsed {} pages in batch {}", parsed, store.batch_id());
        }
        Commands::Run(cmd) => {
            let settings = Settings::load(&cmd.config)?;
            let store = BatchStore::open_or_latest(&cmd.data_dir, cmd.batch.as_deref())?;
            let fetched = fetch_details(&settings, &store, cmd.n).await?;
            info!("fetched {} detail pages", fetched);
            let parsed = parse_details(&store, cmd.n)?;
            info!("parsed {} pages in batch {}", parsed, store.batch_id());
        }
        Commands::List(cmd) => {
            let store = BatchStore::open_or_latest(&cmd.data_dir, cmd.batch.as_deref())?;
            let records: Vec<_> = store
                .read_records()?
                .into_iter()
                .map(|(_, record)| record)
                .take(cmd.limit)
                .collect();
            if records.is_empty() {
                info!("no parsed records in batch {}", store.batch_id());
            } else {
                println!("{}", create_record_table(&records));
            }
        }
        Commands::Export(cmd) => {
            let store = BatchStore::open_or_latest(&cmd.data_dir, cmd.batch.as_deref())?;
            let records = store.read_records()?;

            let mut writer = Writer::from_path(&cmd.output)?;
            writer.write_record([
                "listing_id",
                "platform",
                "source_url",
                "external_id",
                "street",
                "unit",
                "city",
                "region",
                "postal_code",
                "list_price",
                "bedrooms",
                "bathrooms",
                "interior_area",
                "year_built",
                "price_per_area",
                "photo_count",
            ])?;
            let total = records.len();
            for (_, record) in records {
                writer.write_record([
                    record.listing_id,
                    record.source_platform.to_string(),
                    record.source_url,
                    record.external_id.unwrap_or_default(),
                    record.address.street.unwrap_or_default(),
                    record.address.unit.unwrap_or_default(),
                    record.address.city.unwrap_or_default(),
                    record.address.region.unwrap_or_default(),
                    record.address.postal_code.unwrap_or_default(),
                    fmt_opt(&record.list_price),
                    fmt_opt(&record.bedroom_count),
                    fmt_opt(&record.bathroom_count),
                    fmt_opt(&record.interior_area),
                    fmt_opt(&record.year_built),
                    fmt_opt(&record.price_per_area),
                    record.media.len().to_string(),
                ])?;
            }
            writer.flush()?;
            info!("exported {} records to {}", total, cmd.output.display());
        }
    }

    Ok(())
}
