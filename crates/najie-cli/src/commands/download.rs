use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use najie_storage::ObjectStorageClient;

use super::{format_bytes, require_ok};

pub async fn run(client: &ObjectStorageClient, key: &str, output: Option<&Path>) -> Result<()> {
    let output = match output {
        Some(path) => path.to_path_buf(),
        None => default_output(key)?,
    };
    println!("Downloading: {key} -> {}", output.display());

    let downloaded = require_ok(client.download(key, &output).await, "Download")?;
    println!("Downloaded {}", format_bytes(downloaded.data.bytes));
    Ok(())
}

/// `./<last segment of key>`.
fn default_output(key: &str) -> Result<PathBuf> {
    let name = Path::new(key)
        .file_name()
        .with_context(|| format!("cannot derive a file name from key {key:?}, pass --output"))?;
    Ok(std::env::current_dir()?.join(name))
}
