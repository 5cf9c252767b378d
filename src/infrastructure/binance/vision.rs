//! Binance Vision archive downloader
//!
//! Downloads monthly 1m kline archives from the public mirror at
//! `https://data.binance.vision`. Failures are reported and skipped: the
//! caller receives the archives that could be fetched, in month order.

use crate::config::FetchEnvConfig;
use crate::domain::errors::PipelineError;
use crate::domain::ports::ArchiveFetcher;
use crate::infrastructure::http_client_factory::HttpClientFactory;
use anyhow::{Context, Result};
use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest_middleware::ClientWithMiddleware;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

const KLINE_INTERVAL: &str = "1m";

/// `BTCUSDT-1m-2025-01.zip`
pub fn archive_file_name(symbol: &str, year: i32, month: u32) -> String {
    format!(
        "{}-{}-{}-{:02}.zip",
        symbol.to_uppercase(),
        KLINE_INTERVAL,
        year,
        month
    )
}

/// Public URL of a monthly spot kline archive.
pub fn archive_url(base_url: &str, symbol: &str, year: i32, month: u32) -> String {
    let symbol = symbol.to_uppercase();
    format!(
        "{}/data/spot/monthly/klines/{}/{}/{}",
        base_url.trim_end_matches('/'),
        symbol,
        KLINE_INTERVAL,
        archive_file_name(&symbol, year, month)
    )
}

/// Extract the hex digest from a `.CHECKSUM` sidecar (`<sha256>  <file name>`).
pub fn parse_checksum(content: &str) -> Option<String> {
    let digest = content.split_whitespace().next()?;
    if digest.len() == 64 && digest.chars().all(|c| c.is_ascii_hexdigit()) {
        Some(digest.to_ascii_lowercase())
    } else {
        None
    }
}

pub struct BinanceVisionFetcher {
    client: ClientWithMiddleware,
    base_url: String,
    dest_dir: PathBuf,
    overwrite: bool,
    verify_checksums: bool,
}

impl BinanceVisionFetcher {
    pub fn new(config: &FetchEnvConfig, dest_dir: impl Into<PathBuf>) -> Self {
        Self {
            client: HttpClientFactory::create_client(config),
            base_url: config.base_url.clone(),
            dest_dir: dest_dir.into(),
            overwrite: false,
            verify_checksums: config.verify_checksums,
        }
    }

    /// Replace archives that already exist locally.
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Fetch several months, skipping and reporting any that fail.
    pub async fn fetch_months(&self, symbol: &str, year: i32, months: &[u32]) -> Vec<PathBuf> {
        let mut downloaded = Vec::with_capacity(months.len());
        for &month in months {
            match self.fetch(symbol, year, month).await {
                Ok(path) => downloaded.push(path),
                Err(e) => warn!(
                    "Failed to download {}: {:#}",
                    archive_file_name(symbol, year, month),
                    e
                ),
            }
        }
        downloaded
    }

    async fn download(&self, url: &str, out_path: &Path) -> Result<()> {
        let partial = out_path.with_extension("zip.part");
        let result = self.stream_to_file(url, &partial).await;

        let digest = match result {
            Ok(digest) => digest,
            Err(e) => {
                let _ = tokio::fs::remove_file(&partial).await;
                return Err(e);
            }
        };

        if self.verify_checksums {
            if let Err(e) = self.verify(url, &digest).await {
                let _ = tokio::fs::remove_file(&partial).await;
                return Err(e);
            }
        }

        tokio::fs::rename(&partial, out_path)
            .await
            .with_context(|| format!("Failed to move download into {:?}", out_path))?;
        Ok(())
    }

    /// Stream the response body to disk, returning its SHA-256 hex digest.
    async fn stream_to_file(&self, url: &str, path: &Path) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Request to {} failed", url))?
            .error_for_status()
            .with_context(|| format!("Archive not available at {}", url))?;

        let mut file = tokio::fs::File::create(path)
            .await
            .with_context(|| format!("Failed to create {:?}", path))?;
        let mut hasher = Sha256::new();
        let mut written: u64 = 0;

        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.context("Download interrupted")?;
            hasher.update(&chunk);
            file.write_all(&chunk).await.context("Failed to write archive chunk")?;
            written += chunk.len() as u64;
        }
        file.flush().await.context("Failed to flush archive")?;

        debug!("Downloaded {} bytes from {}", written, url);
        Ok(hex::encode(hasher.finalize()))
    }

    async fn verify(&self, url: &str, digest: &str) -> Result<()> {
        let checksum_url = format!("{}.CHECKSUM", url);
        let content = self
            .client
            .get(&checksum_url)
            .send()
            .await
            .with_context(|| format!("Request to {} failed", checksum_url))?
            .error_for_status()
            .with_context(|| format!("Checksum not available at {}", checksum_url))?
            .text()
            .await
            .context("Failed to read checksum body")?;

        let expected = parse_checksum(&content)
            .with_context(|| format!("Malformed checksum file at {}", checksum_url))?;
        if expected != digest {
            anyhow::bail!(
                "Checksum mismatch for {}: expected {}, got {}",
                url,
                expected,
                digest
            );
        }
        Ok(())
    }
}

#[async_trait]
impl ArchiveFetcher for BinanceVisionFetcher {
    async fn fetch(&self, symbol: &str, year: i32, month: u32) -> Result<PathBuf> {
        if !(1..=12).contains(&month) {
            return Err(PipelineError::Validation(format!("month {} is not in 1..=12", month)).into());
        }

        tokio::fs::create_dir_all(&self.dest_dir)
            .await
            .with_context(|| format!("Failed to create {:?}", self.dest_dir))?;

        let out_path = self.dest_dir.join(archive_file_name(symbol, year, month));
        if !self.overwrite && tokio::fs::try_exists(&out_path).await.unwrap_or(false) {
            info!("Skipping existing file: {:?}", out_path);
            return Ok(out_path);
        }

        let url = archive_url(&self.base_url, symbol, year, month);
        info!("Downloading {}", url);
        self.download(&url, &out_path).await?;
        Ok(out_path)
    }
}
