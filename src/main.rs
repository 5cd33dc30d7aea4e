use std::path::PathBuf;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use engagement_dashboard::dashboard::build_dashboard;
use engagement_dashboard::models::{CategoryField, Criteria, Location, Metric};
use engagement_dashboard::source::Dataset;
use engagement_dashboard::{db, filter, report};

#[derive(Parser)]
#[command(name = "engagement-dashboard")]
#[command(about = "Filter and summarise daily engagement metrics", long_about = None)]
struct Cli {
    /// Postgres connection string, needed when no --csv is given
    #[arg(long, global = true, env = "DATABASE_URL", hide_env_values = true)]
    database_url: Option<String>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SourceArgs {
    /// Read records from a CSV file instead of Postgres
    #[arg(long)]
    csv: Option<PathBuf>,
}

#[derive(Args)]
struct CriteriaArgs {
    /// First day of the window (defaults to the earliest record)
    #[arg(long)]
    start: Option<NaiveDate>,
    /// Last day of the window (defaults to the latest record)
    #[arg(long)]
    end: Option<NaiveDate>,
    #[arg(long, default_value = "active_users")]
    metric: Metric,
    #[arg(long, default_value = "USA")]
    location: Location,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Validate a CSV file and upsert its records
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Print the dashboard view for a window
    Summary {
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        criteria: CriteriaArgs,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
        /// Maximum days listed per time series
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
    /// Write the dashboard view as a markdown report
    Report {
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        criteria: CriteriaArgs,
        #[arg(long, default_value = "dashboard.md")]
        out: PathBuf,
        #[arg(long, default_value_t = 31)]
        top: usize,
    },
    /// Count the values of one categorical field in a window
    Counts {
        #[command(flatten)]
        source: SourceArgs,
        #[arg(long)]
        field: CategoryField,
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        end: Option<NaiveDate>,
    },
}

fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn connect(database_url: Option<&str>) -> anyhow::Result<PgPool> {
    let database_url = database_url
        .context("DATABASE_URL must be set unless records are read with --csv")?;

    PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await
        .context("failed to connect to Postgres")
}

async fn load_dataset(source: &SourceArgs, database_url: Option<&str>) -> anyhow::Result<Dataset> {
    let dataset = match &source.csv {
        Some(path) => Dataset::from_csv_path(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => {
            let pool = connect(database_url).await?;
            Dataset::new(db::fetch_records(&pool).await?)?
        }
    };

    if dataset.is_empty() {
        warn!("dataset has no records");
    }
    Ok(dataset)
}

fn build_criteria(dataset: &Dataset, args: &CriteriaArgs) -> anyhow::Result<Criteria> {
    let (start, end) = dataset.window(args.start, args.end)?;
    let criteria = Criteria::new(start, end, args.location, args.metric)?;
    Ok(criteria)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);
    let database_url = cli.database_url.as_deref();

    match cli.command {
        Commands::InitDb => {
            let pool = connect(database_url).await?;
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Import { csv } => {
            let dataset = Dataset::from_csv_path(&csv)
                .with_context(|| format!("failed to load {}", csv.display()))?;
            let pool = connect(database_url).await?;
            let written = db::import_dataset(&pool, &dataset).await?;
            println!("Wrote {written} daily records from {}.", csv.display());
        }
        Commands::Summary {
            source,
            criteria,
            format,
            top,
        } => {
            let dataset = load_dataset(&source, database_url).await?;
            let criteria = build_criteria(&dataset, &criteria)?;
            let dashboard = build_dashboard(&dataset, &criteria);

            if !dashboard.has_data() {
                info!(start = %criteria.start(), end = %criteria.end(), "no records in window");
            }

            match format {
                OutputFormat::Text => print!("{}", report::build_report(&dashboard, top)),
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&dashboard)?);
                }
            }
        }
        Commands::Report {
            source,
            criteria,
            out,
            top,
        } => {
            let dataset = load_dataset(&source, database_url).await?;
            let criteria = build_criteria(&dataset, &criteria)?;
            let dashboard = build_dashboard(&dataset, &criteria);
            std::fs::write(&out, report::build_report(&dashboard, top))
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Counts {
            source,
            field,
            start,
            end,
        } => {
            let dataset = load_dataset(&source, database_url).await?;
            let (start, end) = dataset.window(start, end)?;
            let window = filter::filter_by_date_range(dataset.records(), start, end);
            let counts = filter::count_by_category(window, field);
            print!("{}", report::build_counts(field.name(), &counts));
        }
    }

    Ok(())
}
