use std::process;
use std::sync::Arc;

use tokio::sync::Notify;

mod config;
mod handler;
mod http;
mod logger;
mod server;
mod storage;

fn main() {
    let cfg = match config::Config::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("[FATAL] Failed to load configuration: {e}");
            process::exit(1);
        }
    };

    if let Err(e) = logger::init(&cfg) {
        eprintln!("[FATAL] Failed to open log files: {e}");
        process::exit(1);
    }

    if let Err(e) = storage::ensure_upload_dir(&cfg.upload_dir) {
        logger::log_fatal(&format!("Failed to create upload directory: {e}"));
        process::exit(1);
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            logger::log_fatal(&format!("Failed to build runtime: {e}"));
            process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(async_main(cfg)) {
        logger::log_fatal(&format!("Server failed to start: {e}"));
        process::exit(1);
    }
}

async fn async_main(cfg: config::Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;
    let listener = server::create_listener(addr)?;

    logger::log_server_start(&addr, &cfg);

    let shutdown = Arc::new(Notify::new());
    server::signal::start_signal_handler(Arc::clone(&shutdown));

    server::run_server_loop(listener, Arc::new(cfg), shutdown).await;
    Ok(())
}
