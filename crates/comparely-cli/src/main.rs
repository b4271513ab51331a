mod display;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::builder::{BoolishValueParser, PossibleValuesParser};
use clap::{ArgAction, Args, Parser, Subcommand};
use comparely_ai::{AugmentationClient, ChatClient, USE_CASES};
use comparely_core::config::{DEFAULT_LLM_API_URL, DEFAULT_LLM_MODEL};
use comparely_core::{
    AugmentConfig, CategoryId, DeviceFilter, DeviceId, LlmConfig, RecommendationCriteria,
};
use comparely_service::{AnalyzedComparison, AppState, ComparisonService, RecommendationService};
use comparely_store::{DuckStore, SharedStore, import_csv};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "comparely",
    version,
    about = "Device catalogue with side-by-side comparison and recommendations"
)]
struct Cli {
    /// DuckDB database file
    #[arg(long, env = "COMPARELY_DB", default_value = "comparely.duckdb", global = true)]
    db: PathBuf,
    #[command(flatten)]
    augment: AugmentArgs,
    #[command(flatten)]
    llm: LlmArgs,
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Args, Debug)]
struct AugmentArgs {
    /// Send comparisons to the augmentation webhook
    #[arg(
        long,
        env = "COMPARELY_AUGMENT_ENABLED",
        action = ArgAction::Set,
        default_value_t = false,
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    augment_enabled: bool,
    /// Augmentation webhook URL
    #[arg(long, env = "COMPARELY_AUGMENT_URL", global = true)]
    augment_url: Option<String>,
    /// Augmentation request timeout in seconds
    #[arg(long, env = "COMPARELY_AUGMENT_TIMEOUT_SECS", default_value_t = 30, global = true)]
    augment_timeout_secs: u64,
}

impl AugmentArgs {
    fn config(&self) -> AugmentConfig {
        AugmentConfig {
            enabled: self.augment_enabled,
            webhook_url: self.augment_url.clone(),
            timeout: Duration::from_secs(self.augment_timeout_secs),
        }
    }
}

#[derive(Args, Debug)]
struct LlmArgs {
    /// Chat-completion API key
    #[arg(long, env = "AI_API_KEY", hide_env_values = true, global = true)]
    ai_api_key: Option<String>,
    /// Chat-completion endpoint
    #[arg(long, env = "AI_API_URL", default_value = DEFAULT_LLM_API_URL, global = true)]
    ai_api_url: String,
    /// Chat model name
    #[arg(long, env = "AI_MODEL", default_value = DEFAULT_LLM_MODEL, global = true)]
    ai_model: String,
}

impl LlmArgs {
    fn config(&self) -> LlmConfig {
        LlmConfig {
            api_key: self.ai_api_key.clone(),
            api_url: self.ai_api_url.clone(),
            model: self.ai_model.clone(),
            ..Default::default()
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Import devices from a CSV file
    Import { csv: PathBuf },
    /// Manage categories
    Category {
        #[command(subcommand)]
        action: CategoryCommand,
    },
    /// List devices as a table
    List {
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        brand: Option<String>,
        #[arg(long)]
        category: Option<CategoryId>,
        #[arg(long)]
        min_price: Option<f64>,
        #[arg(long)]
        max_price: Option<f64>,
        #[arg(long)]
        min_year: Option<i32>,
        #[arg(short = 'n', long, default_value_t = 20)]
        limit: usize,
    },
    /// Show one device
    Show { id: DeviceId },
    /// Compare two devices
    Compare {
        id1: DeviceId,
        id2: DeviceId,
        /// Also ask the chat model for an analysis
        #[arg(long)]
        ai: bool,
    },
    /// Recommend devices, newest then cheapest first
    Recommend {
        #[arg(long)]
        max_price: Option<f64>,
        #[arg(long)]
        category: Option<CategoryId>,
        #[arg(long)]
        min_year: Option<i32>,
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        /// Also ask the chat model for an analysis
        #[arg(long)]
        ai: bool,
        #[arg(long, value_parser = PossibleValuesParser::new(USE_CASES.iter().copied()))]
        use_case: Option<String>,
    },
    /// List all brands
    Brands,
    /// Run the HTTP API
    Serve {
        #[arg(long, env = "COMPARELY_ADDR", default_value = "127.0.0.1:8000")]
        addr: SocketAddr,
    },
}

#[derive(Subcommand, Debug)]
enum CategoryCommand {
    Add {
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    List,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    tracing::info!("comparely v{}", env!("CARGO_PKG_VERSION"));

    let store = DuckStore::open_persistent(&cli.db)
        .with_context(|| format!("opening database {}", cli.db.display()))?;

    match cli.cmd {
        Commands::Import { csv } => {
            let report = import_csv(&store, &csv)
                .with_context(|| format!("importing {}", csv.display()))?;
            display::print_import_report(&report);
        }
        Commands::Category { action } => match action {
            CategoryCommand::Add { name, description } => {
                let category = store.create_category(&name, description.as_deref())?;
                println!("Created category {} ({})", category.name, category.id);
            }
            CategoryCommand::List => display::print_categories(&store.list_categories()?),
        },
        Commands::List {
            search,
            brand,
            category,
            min_price,
            max_price,
            min_year,
            limit,
        } => {
            let filter = DeviceFilter {
                search,
                brand,
                category_id: category,
                min_price,
                max_price,
                min_year,
                limit: Some(limit),
                offset: None,
            };
            display::print_table(&store.devices_arrow(&filter)?)?;
        }
        Commands::Show { id } => match store.get_device(id)? {
            Some(device) => display::print_device_card(&device),
            None => bail!("device {id} not found"),
        },
        Commands::Compare { id1, id2, ai } => {
            let augmenter = AugmentationClient::new(cli.augment.config())?;
            let service = ComparisonService::new(store, augmenter.into());
            let result = service.compare(id1, id2).await?;
            if ai {
                let llm = ChatClient::new(cli.llm.config())?;
                let analyzed = AnalyzedComparison::build(result, Some(&llm)).await;
                display::print_comparison(&analyzed.comparison);
                display::print_comparison_analysis(&analyzed);
            } else {
                display::print_comparison(&result);
            }
        }
        Commands::Recommend {
            max_price,
            category,
            min_year,
            limit,
            ai,
            use_case,
        } => {
            let criteria = RecommendationCriteria {
                max_price,
                category_id: category,
                min_release_year: min_year,
                limit,
            };
            let llm = if ai {
                Some(ChatClient::new(cli.llm.config())?)
            } else {
                None
            };
            let service = RecommendationService::new(SharedStore::new(store));
            let recs = service
                .recommend(&criteria, use_case.as_deref(), llm.as_ref())
                .await?;
            display::print_recommendations(&recs);
        }
        Commands::Brands => {
            for brand in store.unique_brands()? {
                println!("{brand}");
            }
        }
        Commands::Serve { addr } => {
            let augmenter = AugmentationClient::new(cli.augment.config())?;
            let llm_config = cli.llm.config();
            let llm = match llm_config.api_key() {
                Some(_) => Some(ChatClient::new(llm_config)?),
                None => {
                    tracing::warn!("AI_API_KEY not set, AI analysis endpoints will report unavailable");
                    None
                }
            };
            let state = AppState::new(SharedStore::new(store), augmenter, llm);
            comparely_service::serve(addr, state).await?;
        }
    }

    Ok(())
}
