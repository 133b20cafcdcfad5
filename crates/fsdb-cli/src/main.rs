mod crawl;
mod runs;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "fsdb")]
#[command(about = "Eatery listing crawler")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Crawl the listing API and upsert every eatery
    Crawl {
        /// Crawl exactly this many pages instead of probing page 1
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        pages: Option<u32>,

        /// Compute and print the crawl plan without writing to the database
        #[arg(long)]
        dry_run: bool,
    },
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Show recent crawl runs
    Runs {
        /// Number of runs to show
        #[arg(long, default_value_t = 10)]
        limit: i64,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check database connectivity
    Ping,
    /// Apply pending migrations
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("fsdb: no command given (try `fsdb --help`)");
        return Ok(());
    };

    let config = fsdb_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    tracing::info!(env = %config.env, "fsdb starting");

    let pool_config = fsdb_db::PoolConfig::from_app_config(&config);
    let pool = fsdb_db::connect_pool(&config.database_url, pool_config).await?;

    match command {
        Commands::Crawl { pages, dry_run } => {
            fsdb_db::run_migrations(&pool).await?;
            crawl::run_crawl_command(&pool, &config, pages, dry_run).await?;
        }
        Commands::Db {
            command: DbCommands::Ping,
        } => {
            fsdb_db::health_check(&pool).await?;
            println!("database ok");
        }
        Commands::Db {
            command: DbCommands::Migrate,
        } => {
            let applied = fsdb_db::run_migrations(&pool).await?;
            println!("applied {applied} migration(s)");
        }
        Commands::Runs { limit } => runs::print_recent_runs(&pool, limit).await?,
    }

    Ok(())
}
