// Connection handling module
// Serves each accepted TCP connection on its own task

use std::net::SocketAddr;
use std::sync::Arc;

use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::Request;
use hyper_util::rt::TokioIo;

use crate::config::Config;
use crate::handler;
use crate::logger;

/// Serve one connection in a spawned task.
///
/// No timeout is applied: a stalled client holds its task until the peer
/// closes the connection.
pub fn handle_connection(stream: tokio::net::TcpStream, peer_addr: SocketAddr, config: &Arc<Config>) {
    let config = Arc::clone(config);

    tokio::spawn(async move {
        let io = TokioIo::new(stream);

        let service = service_fn(move |req: Request<Incoming>| {
            handler::handle_request(req, Arc::clone(&config), peer_addr)
        });

        if let Err(err) = http1::Builder::new()
            .keep_alive(true)
            .serve_connection(io, service)
            .await
        {
            logger::log_connection_error(&err);
        }
    });
}
