use std::path::Path;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};

use najie_storage::{ObjectStorageClient, progress_channel};

use super::require_ok;

pub async fn run(client: &ObjectStorageClient, file: &Path, key: Option<&str>) -> Result<()> {
    let file = std::path::absolute(file)?;
    let shown_key = match key {
        Some(k) => k.to_string(),
        None => file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
    };
    println!("Uploading: {} -> {shown_key}", file.display());

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({percent}%)")?
            .progress_chars("=>-"),
    );

    let (tx, mut rx) = progress_channel();
    let bar = pb.clone();
    let watcher = tokio::spawn(async move {
        while let Some(progress) = rx.recv().await {
            bar.set_length(progress.total);
            bar.set_position(progress.loaded);
        }
    });

    let result = client.upload(&file, key, Some(tx)).await;
    // The sender is dropped with the upload, which ends the watcher.
    let _ = watcher.await;

    let uploaded = match require_ok(result, "Upload") {
        Ok(uploaded) => {
            pb.finish();
            uploaded
        }
        Err(e) => {
            pb.abandon();
            return Err(e);
        }
    };

    println!("Uploaded");
    println!("  Location: {}", uploaded.data.location);
    println!("  ETag:     {}", uploaded.data.etag);
    Ok(())
}
