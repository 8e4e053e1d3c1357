use wasm_devserve::config::{self, Config};
use wasm_devserve::logger;
use wasm_devserve::server::{self, DevServer};

use std::path::PathBuf;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // First argument overrides the config file path
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| config::DEFAULT_CONFIG_PATH.to_string());
    let cfg = Config::load_from(&config_path)?;

    // Relative paths (log files, requests) resolve against the served directory
    let root = cfg.resolve_root()?;
    std::env::set_current_dir(&root)?;

    logger::init(&cfg)?;

    // Create Tokio runtime, worker thread count from config
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg, root))
}

async fn async_main(cfg: Config, root: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    logger::log_config(&cfg);
    let landing_page = cfg.server.landing_page.clone();

    let server = DevServer::bind(cfg, root)?;
    let port = server.local_addr()?.port();
    let shutdown = server::shutdown_signal();
    logger::log_server_start(port, server.root(), &landing_page);

    server.run_until(shutdown).await;

    logger::log_shutdown();
    Ok(())
}
