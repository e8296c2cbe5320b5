// Server loop module
// Accepts connections until shutdown, then drains in-flight connections

use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinSet;

use super::connection::accept_connection;
use crate::config::AppState;
use crate::logger;

/// Accept and serve connections until `shutdown` resolves.
///
/// On shutdown the listener is closed first, every open connection is asked
/// to finish its current request, and this returns once all connection
/// tasks have ended.
pub async fn start_server_loop<F>(listener: TcpListener, state: Arc<AppState>, shutdown: F)
where
    F: Future<Output = ()>,
{
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut tasks = JoinSet::new();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            // Check shutdown first so a signal stops accepting even with a full backlog
            biased;

            () = &mut shutdown => {
                logger::log_shutdown_requested(state.active_connections());
                break;
            }

            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(stream, peer_addr, &state, &mut tasks, shutdown_rx.clone());
                    }
                    Err(e) => logger::log_accept_error(&e),
                }
            }

            // Reap finished tasks so the set does not grow on long-running servers
            Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
        }
    }

    drop(listener);
    shutdown_tx.send_replace(true);
    while tasks.join_next().await.is_some() {}

    logger::log_server_stopped();
}
