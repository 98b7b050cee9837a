use std::{path::PathBuf, process, sync::Arc};

use clap::Parser;
use parametrization::{CacheBackendType, Config, LogFormat, LoggingConfig, ParamError, Result, ServiceBuilder, api};
use tokio::runtime::Builder;
use tracing::{error, info};
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

#[derive(Debug, Parser)]
#[command(name = "parametrization", version, about = "Feature toggle service")]
struct Args {
    /// Path to the TOML config file
    #[arg(short, long, env = "PARAMETRIZATION_CONFIG")]
    config: Option<PathBuf>,

    /// Override the cache backend (distributed or local)
    #[arg(long, env = "PARAMETRIZATION_CACHE_BACKEND")]
    cache_backend: Option<CacheBackendType>,

    /// Override the listen address
    #[arg(long)]
    listen: Option<String>,
}

fn main() {
    if let Err(err) = run(Args::parse()) {
        error!(error = %err, "application error");
        eprintln!("parametrization: {err}");
        process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => Config::create(path)?,
        None => Config::default(),
    };
    if let Some(backend) = args.cache_backend {
        config.cache.backend = backend;
    }
    if let Some(listen) = args.listen {
        config.server.listen = listen;
    }

    init_telemetry(&config.logging)?;

    let runtime = Arc::new(Builder::new_multi_thread().worker_threads(config.async_worker_thread_number.into()).enable_all().build()?);
    let listen = config.server.listen.clone();
    let service = ServiceBuilder::new().config(config).runtime(runtime.clone()).build()?;

    runtime.block_on(api::serve(service, &listen))?;
    info!("parametrization stopped");
    Ok(())
}

fn init_telemetry(logging: &LoggingConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .map_err(|e| ParamError::Config(format!("invalid log level {:?}: {}", logging.level, e)))?;

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer().json().with_current_span(true).with_target(true).boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| ParamError::Config(format!("failed to install tracing subscriber: {}", e)))
}
