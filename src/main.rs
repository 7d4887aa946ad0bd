use clap::{Parser, Subcommand};
use tfscaffold::config::Config;
use tfscaffold::mcp::server::ScaffoldServer;
use tfscaffold::registry::client::RegistryClient;
use tfscaffold::terraform::model::provider_code;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(
    name = "tfscaffold",
    about = "Query a private Terraform module registry and scaffold infrastructure config repositories through the Model Context Protocol (MCP).",
    version = APP_VERSION,
    disable_version_flag(true)
)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[arg(
        long,
        short = 'c',
        value_name = "PATH",
        help = "Path to the configuration file"
    )]
    pub config: Option<String>,

    #[arg(long, short = 'V', help = "Print version")]
    pub version: bool,
}

#[derive(Subcommand)]
enum Commands {
    #[command(name = "mcp", about = "Launch tfscaffold as an MCP server")]
    Mcp,

    #[command(name = "describe", about = "Print a module description as JSON")]
    Describe {
        /// Module name as registered
        name: String,

        #[arg(long, short = 'p', default_value = "aws", help = "Provider name")]
        provider: String,

        #[arg(long, default_value = "latest", help = "Module version")]
        version: String,
    },
}

#[tokio::main]
async fn main() {
    init_logging();

    let cli = Cli::parse();

    if cli.version {
        println!("{}", APP_VERSION);
        std::process::exit(0);
    }

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "failed to load configuration");
            std::process::exit(1);
        }
    };

    match &cli.command {
        Some(Commands::Mcp) => {
            info!("starting tfscaffold in MCP server mode");
            if let Err(err) = ScaffoldServer::serve_stdio(config).await {
                error!(error = ?err, "error launching MCP server");
                std::process::exit(1);
            }
        }
        Some(Commands::Describe {
            name,
            provider,
            version,
        }) => {
            let registry = RegistryClient::new(&config.registry);
            let code = provider_code(provider);
            match registry.describe_module(name, code, version).await {
                Ok(details) => match serde_json::to_string_pretty(&details) {
                    Ok(json) => println!("{}", json),
                    Err(e) => {
                        error!(error = %e, "failed to serialize module description");
                        std::process::exit(1);
                    }
                },
                Err(e) => {
                    error!(error = %e, "failed to describe module");
                    std::process::exit(1);
                }
            }
        }
        None => {
            println!("No command specified. Use --help for usage information.");
        }
    };
}

fn init_logging() {
    let log_level = std::env::var("TFSCAFFOLD_LOG_LEVEL")
        .unwrap_or_else(|_| "info".to_string())
        .to_lowercase();

    let filter = match log_level.as_str() {
        "trace" => "trace",
        "debug" => "debug",
        "info" => "info",
        "warn" | "warning" => "warn",
        "error" => "error",
        _ => "info",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("tfscaffold={},reqwest=warn,hyper=warn", filter).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
