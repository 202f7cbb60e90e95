use std::path::Path;

use futures::StreamExt;
use reqwest::{Client, ClientBuilder, Response};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, warn};
use url::Url;

use crate::config::{MirrorConfig, CHUNK_SIZE};
use crate::control::{CancelFlag, DownloadProgress};
use crate::error::{MirrorError, Result};
use crate::file_manager::FileManager;
use crate::html_parser::{HtmlParser, PageDocument};

/// Outcome of one page's asset loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssetBatch {
    pub bytes: u64,
    pub files: usize,
}

/// HTTP side of the mirror: fetches pages and streams assets to disk.
///
/// Requests are issued one at a time. Nothing here retries; the first failed
/// request is returned to the caller.
#[derive(Debug, Clone)]
pub struct WebsiteMirror {
    client: Client,
    config: MirrorConfig,
}

impl WebsiteMirror {
    pub fn new(config: MirrorConfig) -> Result<Self> {
        let client = Self::build_http_client(&config)?;
        Ok(Self { client, config })
    }

    fn build_http_client(config: &MirrorConfig) -> Result<Client> {
        let mut builder = ClientBuilder::new()
            .use_rustls_tls()
            .user_agent(config.user_agent.as_str());
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        builder.build().map_err(MirrorError::Client)
    }

    pub fn config(&self) -> &MirrorConfig {
        &self.config
    }

    /// GETs a page and parses it. Non-success statuses are errors.
    pub async fn fetch_page(&self, url: &Url) -> Result<PageDocument> {
        let mut request_url = url.clone();
        request_url.set_fragment(None);

        let response = self.get(&request_url).await?;
        let html = response
            .text()
            .await
            .map_err(|e| MirrorError::network(request_url.as_str(), e))?;

        debug!(url = %request_url, bytes = html.len(), "fetched page");
        Ok(PageDocument::parse(url.clone(), html))
    }

    /// Downloads every link into `folder`, in order, stopping early if `cancel` is set.
    ///
    /// Links are resolved against the page `parser` belongs to. References that
    /// cannot be fetched over HTTP (`data:`, `mailto:`, unresolvable junk) are
    /// skipped. Any failed request aborts the remaining links.
    pub async fn download_assets(
        &self,
        links: &[String],
        parser: &HtmlParser,
        files: &FileManager,
        folder: &Path,
        progress: &mut DownloadProgress<'_>,
        cancel: &CancelFlag,
    ) -> Result<AssetBatch> {
        let mut batch = AssetBatch::default();

        for (index, link) in links.iter().enumerate() {
            if cancel.is_cancelled() {
                warn!(page = %parser.base_url(), remaining = links.len() - index, "asset downloads cancelled");
                break;
            }

            let url = match parser.resolve_url(link) {
                Ok(url) if is_fetchable(&url) => url,
                Ok(url) => {
                    debug!(%url, "skipping non-HTTP asset");
                    continue;
                }
                Err(e) => {
                    debug!(link = %link, error = %e, "skipping unresolvable asset");
                    continue;
                }
            };

            let path = files.asset_path(folder, &url);
            batch.bytes += self.download_asset(&url, &path, progress).await?;
            batch.files += 1;
        }

        Ok(batch)
    }

    /// Streams one asset to `path` in fixed-size chunks, reporting after each chunk.
    pub async fn download_asset(
        &self,
        url: &Url,
        path: &Path,
        progress: &mut DownloadProgress<'_>,
    ) -> Result<u64> {
        let response = self.get(url).await?;

        let file = File::create(path)
            .await
            .map_err(|e| MirrorError::filesystem(path, e))?;
        let mut writer = BufWriter::new(file);
        let mut stream = response.bytes_stream();
        let mut written: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| MirrorError::network(url.as_str(), e))?;
            for slice in chunk.chunks(CHUNK_SIZE) {
                writer
                    .write_all(slice)
                    .await
                    .map_err(|e| MirrorError::filesystem(path, e))?;
                written += slice.len() as u64;
                progress.record(slice.len());
            }
        }

        writer
            .flush()
            .await
            .map_err(|e| MirrorError::filesystem(path, e))?;

        info!(%url, path = %path.display(), bytes = written, "asset saved");
        Ok(written)
    }

    async fn get(&self, url: &Url) -> Result<Response> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| MirrorError::network(url.as_str(), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MirrorError::http_status(url.as_str(), status.as_u16()));
        }
        Ok(response)
    }
}

pub fn is_fetchable(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}
