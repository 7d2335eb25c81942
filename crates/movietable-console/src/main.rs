use std::process::ExitCode;

use clap::Parser;
use movietable_client::{
    ClientConfig, ClientError, DynamoStore, MemoryStore, MovieClient, TableStore,
};
use tokio::runtime::Runtime;
use tracing::info;

mod commands;
mod display;
mod executor;

use commands::Command;
use display::OutputMode;

/// Movietable console: drive the Movies table from the command line.
#[derive(Parser, Debug)]
#[command(name = "movietable", version)]
struct Cli {
    /// Table to operate on [env: MOVIETABLE_TABLE, default: Movies].
    #[arg(long)]
    table: Option<String>,

    /// Service endpoint. Pass an empty value to use the regional AWS endpoint
    /// [env: MOVIETABLE_ENDPOINT, default: http://localhost:8000].
    #[arg(long)]
    endpoint: Option<String>,

    /// AWS region [env: AWS_REGION, default: us-east-1].
    #[arg(long)]
    region: Option<String>,

    /// Maximum items evaluated per scan request [env: MOVIETABLE_PAGE_SIZE].
    #[arg(long)]
    page_size: Option<usize>,

    /// Fail updates against movies that do not exist [env: MOVIETABLE_STRICT_UPDATES].
    #[arg(long)]
    strict_updates: bool,

    /// Run against an in-process table instead of a service.
    #[arg(long)]
    memory: bool,

    /// Output results as machine-parseable JSON.
    #[arg(short, long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    /// Settings from the environment, overridden by any flags given.
    fn client_config(&self) -> Result<ClientConfig, ClientError> {
        Ok(self.apply_flags(ClientConfig::from_env()?))
    }

    fn apply_flags(&self, mut config: ClientConfig) -> ClientConfig {
        if let Some(table) = &self.table {
            config = config.with_table_name(table);
        }
        if let Some(endpoint) = &self.endpoint {
            config = config.with_endpoint(endpoint);
        }
        if let Some(region) = &self.region {
            config = config.with_region(region);
        }
        if self.page_size.is_some() {
            config = config.with_page_size(self.page_size);
        }
        if self.strict_updates {
            config = config.with_strict_updates(true);
        }
        config
    }

    fn output_mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else {
            OutputMode::Pretty
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mode = cli.output_mode();

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            display::render_error(&format!("failed to create tokio runtime: {e}"), mode);
            return ExitCode::FAILURE;
        }
    };

    match run(cli, &runtime) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            display::render_error(&e, mode);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli, runtime: &Runtime) -> Result<(), ClientError> {
    let config = cli.client_config()?;
    let mode = cli.output_mode();
    let store = open_store(&config, cli.memory, runtime)?;
    let client = MovieClient::new(store, config)?;

    executor::execute(&client, runtime, cli.command, &mut |result| {
        display::render(&result, mode)
    })
}

fn open_store(
    config: &ClientConfig,
    memory: bool,
    runtime: &Runtime,
) -> Result<Box<dyn TableStore>, ClientError> {
    if memory {
        info!(table = %config.table_name, "using in-process table");
        return Ok(Box::new(MemoryStore::new()));
    }
    let store = runtime.block_on(DynamoStore::connect(config))?;
    Ok(Box::new(store))
}
