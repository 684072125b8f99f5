use anyhow::Result;

use najie_core::{ConfigUpdate, MaskedConfig};
use najie_storage::ObjectStorageClient;

use super::require_ok;

pub struct SetArgs {
    pub secret_id: Option<String>,
    pub secret_key: Option<String>,
    pub bucket: Option<String>,
    pub region: Option<String>,
}

pub async fn set(client: &ObjectStorageClient, args: SetArgs) -> Result<()> {
    let store = client.config_store();
    let current = require_ok(store.load().await, "Loading config")?;

    // An empty flag value keeps the stored one, same as omitting it.
    let given = |v: Option<String>| v.filter(|s| !s.is_empty());
    let update = ConfigUpdate {
        secret_id: given(args.secret_id),
        secret_key: given(args.secret_key),
        bucket: given(args.bucket),
        region: given(args.region),
    };
    let merged = update.resolve(current.as_ref());

    require_ok(store.save(&merged).await, "Saving config")?;
    println!("COS configuration saved");
    println!("  Config file: {}", store.path().display());

    let missing = merged.missing_fields();
    if !missing.is_empty() {
        println!("  Still missing: {}", missing.join(", "));
    }
    Ok(())
}

pub async fn show(client: &ObjectStorageClient) -> Result<()> {
    let store = client.config_store();
    let Some(config) = require_ok(store.load().await, "Loading config")? else {
        println!("COS is not configured yet, run: najie-storage-cos config set");
        return Ok(());
    };

    println!("Current COS configuration:");
    for (label, value) in MaskedConfig::from(&config).display_lines() {
        println!("  {label}: {value}");
    }
    println!("  Config file: {}", store.path().display());
    Ok(())
}

pub async fn test(client: &ObjectStorageClient) -> Result<()> {
    let Some(config) = require_ok(client.config_store().load().await, "Loading config")? else {
        anyhow::bail!("COS is not configured yet, run: najie-storage-cos config set");
    };

    println!("Testing COS connection...");
    require_ok(client.test_connection(&config).await, "Connection")?;
    println!("COS connection OK");
    Ok(())
}
