// Connection handling module
// Applies the connection limit and serves one TCP connection with hyper

use std::sync::Arc;
use std::time::Duration;

use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::task::JoinSet;

use crate::config::AppState;
use crate::handler;
use crate::logger;

/// Accept a connection, checking limits, and spawn its task onto `tasks`.
///
/// # Arguments
///
/// * `stream` - The TCP stream to handle
/// * `peer_addr` - The peer's socket address, reported to the handler for every request
/// * `state` - Shared application state
/// * `tasks` - Connection task set drained on shutdown
/// * `shutdown` - Flips to `true` when the server stops accepting
pub fn accept_connection(
    stream: TcpStream,
    peer_addr: std::net::SocketAddr,
    state: &Arc<AppState>,
    tasks: &mut JoinSet<()>,
    shutdown: watch::Receiver<bool>,
) {
    if let Err(active) = state.try_acquire_connection() {
        if let Some(max) = state.config.performance.max_connections {
            logger::log_connection_rejected(&peer_addr, active, max);
        }
        drop(stream);
        return;
    }

    logger::log_connection_accepted(&peer_addr);
    tasks.spawn(serve_connection(stream, peer_addr, Arc::clone(state), shutdown));
}

/// Serve a single connection until the client closes it, the timeout
/// elapses, or shutdown finishes the in-flight request.
///
/// HTTP/1.x and HTTP/2 (prior knowledge) are both accepted; the peer
/// decides. The connection slot is released when this returns.
async fn serve_connection(
    stream: TcpStream,
    peer_addr: std::net::SocketAddr,
    state: Arc<AppState>,
    mut shutdown: watch::Receiver<bool>,
) {
    let io = TokioIo::new(stream);
    let timeout_secs = state.config.performance.connection_timeout;

    let mut builder = ConnBuilder::new(TokioExecutor::new());
    builder.http1().keep_alive(state.config.performance.keep_alive);

    let svc_state = Arc::clone(&state);
    let conn = builder.serve_connection(
        io,
        service_fn(move |req| handler::handle_request(req, peer_addr, Arc::clone(&svc_state))),
    );
    tokio::pin!(conn);

    let served = async {
        let mut draining = false;
        loop {
            tokio::select! {
                res = conn.as_mut() => break res,
                _ = shutdown.changed(), if !draining => {
                    draining = true;
                    conn.as_mut().graceful_shutdown();
                }
            }
        }
    };

    let outcome = if timeout_secs == 0 {
        Ok(served.await)
    } else {
        tokio::time::timeout(Duration::from_secs(timeout_secs), served).await
    };

    match outcome {
        Ok(Ok(())) => {}
        Ok(Err(err)) => logger::log_connection_error(&peer_addr, &err),
        Err(_) => logger::log_connection_timeout(&peer_addr, timeout_secs),
    }

    state.release_connection();
}
