use anyhow::Result;

use najie_storage::ObjectStorageClient;
use najie_web::WebConfig;

pub async fn run(client: ObjectStorageClient, listen: String) -> Result<()> {
    let config = WebConfig {
        listen_addr: listen,
    };
    println!("Storage API listening on http://{}", config.listen_addr);
    println!("Press Ctrl-C to stop");

    najie_web::start_web_server(config, client, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "cannot listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    })
    .await
}
