use anyhow::Result;

use najie_storage::ObjectStorageClient;

use super::require_ok;

pub async fn run(client: &ObjectStorageClient, key: &str) -> Result<()> {
    println!("Deleting: {key}");
    require_ok(client.delete(key).await, "Delete")?;
    println!("Deleted");
    Ok(())
}
