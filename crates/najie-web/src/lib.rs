mod models;
mod routes;
mod state;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use najie_storage::ObjectStorageClient;

pub use state::WebConfig;

use state::AppState;

/// The HTTP API over `client`, without binding a socket.
pub fn router(client: ObjectStorageClient) -> Router {
    routes::build_router(Arc::new(AppState { client }))
}

/// Serve the HTTP API until `shutdown` resolves.
pub async fn start_web_server(
    config: WebConfig,
    client: ObjectStorageClient,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let app = router(client);

    let addr: SocketAddr = config.listen_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Starting storage API on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("storage API stopped");
    Ok(())
}
