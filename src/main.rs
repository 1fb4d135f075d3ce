use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::{error, warn};

use catalog_etl::config::{Config, CsvConfig, SqliteConfig};
use catalog_etl::constants;
use catalog_etl::extract::{Extractor, ReqwestFetcher};
use catalog_etl::logging;
use catalog_etl::pipeline::{self, Pipeline, PipelineResult};

#[derive(Parser)]
#[command(name = "catalog_etl")]
#[command(about = "Scrape a paginated product catalog, clean it, and load it into sinks")]
#[command(version)]
struct Cli {
    /// Path to the TOML config file
    #[arg(long, global = true, default_value = constants::DEFAULT_CONFIG_PATH)]
    config: String,

    /// Directory for JSON log files
    #[arg(long, global = true, default_value = "logs")]
    log_dir: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract and transform only, printing a preview and a validation summary
    Extract {
        #[command(flatten)]
        extract: ExtractArgs,

        /// Number of rows to preview
        #[arg(long, default_value_t = 5)]
        preview: usize,
    },
    /// Run the full pipeline: extract, transform, then load into every sink
    Run {
        #[command(flatten)]
        extract: ExtractArgs,

        /// Write the CSV sink to this path
        #[arg(long)]
        csv: Option<String>,

        /// Replace a table in this SQLite database
        #[arg(long)]
        sqlite: Option<String>,

        /// Table name for --sqlite
        #[arg(long, default_value = constants::DEFAULT_SQLITE_TABLE)]
        table: String,
    },
}

#[derive(Args)]
struct ExtractArgs {
    /// Catalog address; page n is fetched from {base-url}/page{n}
    #[arg(long)]
    base_url: Option<String>,

    /// Maximum number of pages to visit
    #[arg(long, allow_negative_numbers = true)]
    max_pages: Option<i64>,

    /// Stop after this many records
    #[arg(long, allow_negative_numbers = true)]
    max_items: Option<i64>,

    /// Per-page request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,
}

impl ExtractArgs {
    fn apply(self, config: &mut Config) {
        if let Some(base_url) = self.base_url {
            config.extract.base_url = base_url;
        }
        if let Some(max_pages) = self.max_pages {
            config.extract.max_pages = max_pages;
        }
        if let Some(max_items) = self.max_items {
            config.extract.max_items = max_items;
        }
        if let Some(timeout) = self.timeout {
            config.extract.timeout_seconds = timeout;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    let _log_guard = logging::init_logging(&cli.log_dir)
        .with_context(|| format!("setting up logging in {}", cli.log_dir))?;

    let mut config = Config::load_or_default(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config))?;

    match cli.command {
        Commands::Extract { extract, preview } => {
            extract.apply(&mut config);
            let pipeline = Pipeline::new(extractor(&config)?, Vec::new());
            let result = pipeline.extract_and_transform(&config.extract).await?;
            print_preview(&result, preview);
            println!(
                "\nValidation:\n{}",
                serde_json::to_string_pretty(&result.validation)?
            );
        }
        Commands::Run {
            extract,
            csv,
            sqlite,
            table,
        } => {
            extract.apply(&mut config);
            if let Some(path) = csv {
                config.load.csv = Some(CsvConfig { path });
            }
            if let Some(path) = sqlite {
                config.load.sqlite = Some(SqliteConfig { path, table });
            }

            let pipeline = Pipeline::new(extractor(&config)?, pipeline::build_sinks(&config.load));
            let result = pipeline.run(&config.extract).await?;
            print_preview(&result, 5);

            println!("\nSinks:");
            for outcome in &result.sink_outcomes {
                match &outcome.result {
                    Ok(location) => println!("   ✅ {}: {}", outcome.sink, location),
                    Err(e) => println!("   ❌ {}: {}", outcome.sink, e),
                }
            }

            let failed = result.failed_sinks();
            if !failed.is_empty() {
                warn!("{} sink(s) failed", failed.len());
                if failed.len() == result.sink_outcomes.len() {
                    error!("Every sink failed");
                    anyhow::bail!("no sink accepted the data");
                }
            }
        }
    }

    Ok(())
}

fn extractor(config: &Config) -> anyhow::Result<Extractor> {
    let fetcher = ReqwestFetcher::new(Duration::from_secs(config.extract.timeout_seconds))
        .context("building HTTP client")?;
    Ok(Extractor::new(Box::new(fetcher)))
}

fn print_preview(result: &PipelineResult, rows: usize) {
    println!(
        "📊 Extracted {} records, {} after cleaning",
        result.extracted,
        result.records.len()
    );
    if !result.failed_pages.is_empty() {
        println!("   Pages that failed to load: {:?}", result.failed_pages);
    }
    for record in result.records.iter().take(rows) {
        println!(
            "   {} | ${:.2} | rating {} | {} colors | {} | {}",
            record.title, record.price, record.rating, record.colors, record.size, record.gender
        );
    }
}
