//! Downloads daily reanalysis files over plain HTTP.

use std::{fs::File, io::Write, path::Path};

use anyhow::{bail, Context, Result};
use futures::StreamExt;

/// Streams one file from `url` to `file_path`. No retry; a failed transfer
/// is reported and the caller moves on to the next file.
pub async fn fetch(url: &str, file_path: &Path) -> Result<()> {
    let response = reqwest::get(url)
        .await
        .with_context(|| format!("request for `{}` failed", url))?;

    if !response.status().is_success() {
        bail!("failed to download `{}`: {}", url, response.status());
    }

    let mut file = File::create(file_path)
        .with_context(|| format!("cannot create `{}`", file_path.display()))?;

    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.with_context(|| format!("error reading `{}`", url))?;
        file.write_all(&chunk)?;
    }

    Ok(())
}
