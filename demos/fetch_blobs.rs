//! Example fetching blobs from a store into a local directory.
//!
//! ```text
//! cargo run --example fetch_blobs -- http://localhost:8080 ./blobs <digest>...
//! ```
//!
//! Without digest arguments, digests are read from stdin, one per line.

use color_eyre::eyre::{eyre, Result};
use std::path::PathBuf;
use std::time::Instant;
use stor_client::{Digest, DownloadManagerBuilder};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut args = std::env::args().skip(1);
    let endpoint = args
        .next()
        .ok_or_else(|| eyre!("usage: fetch_blobs <endpoint> <directory> [digest...]"))?;
    let directory = PathBuf::from(args.next().unwrap_or_else(|| "blobs".into()));
    let mut digests = args
        .map(|arg| arg.parse::<Digest>())
        .collect::<Result<Vec<_>, _>>()?;

    if digests.is_empty() {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if !line.is_empty() {
                digests.push(line.parse()?);
            }
        }
    }

    let started = Instant::now();
    let mut manager = DownloadManagerBuilder::new(endpoint)
        .directory(directory)
        .workers(8)
        .build()?;

    manager.start()?;
    for digest in digests {
        manager.submit(digest).await?;
    }
    let total = manager.wait_for_completion().await?;
    total.log(started);

    if total.failed() > 0 {
        return Err(eyre!("{} blob(s) could not be downloaded", total.failed()));
    }
    Ok(())
}
