// Server loop module
// Accepts connections until a shutdown signal arrives

use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Notify;

use super::connection::handle_connection;
use crate::config::Config;
use crate::logger;

/// Accept connections and hand each one to its own task.
///
/// Returns once `shutdown` is notified. Connections still in flight are not
/// awaited.
pub async fn run_server_loop(listener: TcpListener, config: Arc<Config>, shutdown: Arc<Notify>) {
    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => handle_connection(stream, peer_addr, &config),
                    Err(e) => logger::log_error(&format!("Failed to accept connection: {e}")),
                }
            }
            () = shutdown.notified() => break,
        }
    }
}
