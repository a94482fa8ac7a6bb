//! function-sqlinstance CLI - serve the composition function, or run it once
//!
//! `serve` starts the HTTP function runner the pipeline host calls.
//! `run` feeds a request file through the function for local debugging.

use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use function_sqlinstance::{load_request, Function, FunctionConfig, FunctionRunner};

#[derive(Parser)]
#[command(name = "function-sqlinstance")]
#[command(version, about = "Composition function that adds a SQLInstance per XNetworks composite", long_about = None)]
struct Cli {
    /// Emit debug logs
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the function runner over HTTP
    Serve {
        /// Address to listen on (default: FUNCTION_ADDRESS or 0.0.0.0:9443)
        #[arg(short, long)]
        address: Option<SocketAddr>,

        /// Response cache TTL in seconds (default: FUNCTION_TTL_SECONDS or 60)
        #[arg(short, long)]
        ttl_seconds: Option<u64>,
    },

    /// Run the function once against a request file and print the response
    Run {
        /// Path to a RunFunctionRequest in YAML or JSON
        #[arg(short, long)]
        request: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    let mut config = match FunctionConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(2);
        }
    };
    config.debug |= cli.debug;

    init_tracing(config.debug);

    // The root span is the process-wide logger handed to the function.
    let function = Function::new(tracing::info_span!("function-sqlinstance"));

    let code = match cli.command {
        Commands::Serve { address, ttl_seconds } => {
            if let Some(address) = address {
                config.address = address;
            }
            if let Some(secs) = ttl_seconds {
                config.ttl = Duration::from_secs(secs);
            }

            let function = Arc::new(function.with_ttl(config.ttl));
            match function_sqlinstance::server::serve(function, config.address).await {
                Ok(()) => 0,
                Err(e) => {
                    tracing::error!("Server failed: {}", e);
                    1
                }
            }
        }
        Commands::Run { request } => run_once(&function.with_ttl(config.ttl), &request),
    };

    process::exit(code);
}

fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run_once(function: &Function, path: &Path) -> i32 {
    let req = match load_request(path) {
        Ok(req) => req,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 2;
        }
    };

    let rsp = function.run_function(&req);
    match serde_json::to_string_pretty(&rsp) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error: cannot render response: {}", e);
            return 2;
        }
    }

    if rsp.is_fatal() {
        1
    } else {
        0
    }
}
