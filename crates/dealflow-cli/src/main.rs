mod commands;

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "dealflow-cli")]
#[command(about = "Deal ingestion pipeline command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Crawl feed sources immediately, outside the schedule.
    Crawl {
        /// Crawl only this source (public id); omitted means every active source.
        #[arg(long)]
        source: Option<Uuid>,
    },
    /// Search the catalog API and queue results for moderation.
    Sync {
        /// Search keywords.
        keywords: String,
        /// Restrict to one category.
        #[arg(long)]
        category: Option<String>,
        /// How many items to request.
        #[arg(long)]
        count: Option<u32>,
        /// Drop results below this discount percentage.
        #[arg(long)]
        min_discount: Option<Decimal>,
    },
    /// Manage the source registry.
    Sources {
        #[command(subcommand)]
        command: SourceCommands,
    },
    /// Remove expired feed deals.
    Purge,
}

#[derive(Debug, Subcommand)]
enum SourceCommands {
    /// List all registered sources.
    List,
    /// Register a new feed source.
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        url: String,
        #[arg(long, default_value = "general")]
        category: String,
        /// Crawl interval in minutes.
        #[arg(long, default_value_t = 60)]
        interval: i32,
        #[arg(long, default_value_t = 0)]
        priority: i32,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = dealflow_core::load_app_config()?;
    let pool_config = dealflow_db::PoolConfig::from_app_config(&config);
    let pool = dealflow_db::connect_pool(&config.database_url, pool_config).await?;
    dealflow_db::run_migrations(&pool).await?;

    match cli.command {
        Commands::Crawl { source } => commands::run_crawl(&pool, &config, source).await,
        Commands::Sync {
            keywords,
            category,
            count,
            min_discount,
        } => commands::run_sync(&pool, &config, keywords, category, count, min_discount).await,
        Commands::Sources { command } => match command {
            SourceCommands::List => commands::list_sources(&pool).await,
            SourceCommands::Add {
                name,
                url,
                category,
                interval,
                priority,
            } => commands::add_source(&pool, name, url, category, interval, priority).await,
        },
        Commands::Purge => commands::run_purge(&pool).await,
    }
}
