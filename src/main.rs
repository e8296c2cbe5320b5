use clap::Parser;
use std::sync::Arc;

mod cli;
mod config;
mod error;
mod handler;
mod http;
mod logger;
mod request_info;
mod server;

use cli::CliArgs;
use config::{AppState, Config};
use error::Result;

fn main() -> Result<()> {
    let args = CliArgs::parse();

    let mut cfg = Config::load_from(args.config.as_deref())?;
    cfg.apply_cli(&args);
    cfg.validate()?;

    logger::init(&cfg);

    // Tokio runtime sized by the workers setting
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: Config) -> Result<()> {
    let addr = cfg.get_socket_addr()?;
    let listener = server::create_reusable_listener(addr, cfg.server.backlog)?;

    logger::log_server_start(&listener.local_addr()?, &cfg);

    let state = Arc::new(AppState::new(cfg));
    server::start_server_loop(listener, state, server::shutdown_signal()).await;
    Ok(())
}
