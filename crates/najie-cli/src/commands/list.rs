use anyhow::Result;

use najie_storage::ObjectStorageClient;

use super::{format_bytes, require_ok};

pub async fn run(client: &ObjectStorageClient, prefix: &str, limit: usize) -> Result<()> {
    let listing = require_ok(client.list(prefix, limit).await, "Listing files")?;

    if listing.files.is_empty() {
        println!("Bucket is empty");
        return Ok(());
    }

    println!("{} files:", listing.files.len());
    for file in &listing.files {
        println!("  {} ({})", file.key, format_bytes(file.size));
    }
    Ok(())
}
