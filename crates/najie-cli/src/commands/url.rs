use anyhow::Result;

use najie_storage::ObjectStorageClient;

use super::require_ok;

/// Prints only the URL so the output can be piped.
pub async fn run(client: &ObjectStorageClient, key: &str, expires: u64) -> Result<()> {
    let signed = require_ok(client.signed_url(key, expires).await, "Signing URL")?;
    println!("{}", signed.url);
    Ok(())
}
