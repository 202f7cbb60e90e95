use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::vec;

use serde::Serialize;
use tracing::{debug, info, warn};
use url::Url;

use crate::control::{CancelFlag, DownloadProgress};
use crate::downloader::{is_fetchable, WebsiteMirror};
use crate::error::{MirrorError, Result};
use crate::file_manager::{ensure_dir, FileManager};
use crate::html_parser::HtmlParser;

/// Traversal limits. The defaults mirror a single page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlOptions {
    /// Follow internal links into sub-folders.
    pub recurse: bool,
    /// Deepest link level to follow; the root page is depth 0.
    pub max_depth: Option<usize>,
    /// Upper bound on pages fetched, root included.
    pub max_pages: Option<usize>,
}

/// One user-initiated download.
#[derive(Debug, Clone)]
pub struct CrawlRequest {
    root_url: Url,
    destination: PathBuf,
    options: CrawlOptions,
    cancel: CancelFlag,
}

impl CrawlRequest {
    pub fn new(root_url: &str, destination: impl Into<PathBuf>) -> Result<Self> {
        let root_url =
            Url::parse(root_url).map_err(|e| MirrorError::invalid_url(root_url, e))?;
        Ok(Self {
            root_url,
            destination: destination.into(),
            options: CrawlOptions::default(),
            cancel: CancelFlag::new(),
        })
    }

    pub fn recursive(mut self, recurse: bool) -> Self {
        self.options.recurse = recurse;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.options.max_depth = Some(max_depth);
        self
    }

    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.options.max_pages = Some(max_pages);
        self
    }

    pub fn with_options(mut self, options: CrawlOptions) -> Self {
        self.options = options;
        self
    }

    pub fn root_url(&self) -> &Url {
        &self.root_url
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    pub fn options(&self) -> &CrawlOptions {
        &self.options
    }

    /// Handle for stopping this request from another thread.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }
}

/// URLs already scheduled within one traversal. Only ever grows.
#[derive(Debug, Clone, Default, Serialize)]
pub struct VisitedSet {
    urls: HashSet<String>,
}

impl VisitedSet {
    /// Returns `false` if the URL was already present.
    pub fn insert(&mut self, url: &Url) -> bool {
        self.urls.insert(url.as_str().to_string())
    }

    pub fn contains(&self, url: &Url) -> bool {
        self.urls.contains(url.as_str())
    }

    pub fn contains_str(&self, url: &str) -> bool {
        self.urls.contains(url)
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.urls.iter().map(String::as_str)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PageRecord {
    pub url: String,
    pub folder: PathBuf,
    pub depth: usize,
    pub assets: usize,
    pub asset_bytes: u64,
}

/// What a finished (or cancelled) traversal produced.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CrawlReport {
    /// Asset bytes written across every page.
    pub total_bytes: u64,
    /// Pages in the order they were mirrored.
    pub pages: Vec<PageRecord>,
    pub visited: VisitedSet,
    pub cancelled: bool,
}

impl CrawlReport {
    fn record(&mut self, page: PageRecord) {
        self.total_bytes += page.asset_bytes;
        self.pages.push(page);
    }
}

/// A page whose internal links are still being walked.
struct Frame {
    links: vec::IntoIter<Url>,
    depth: usize,
}

struct MirroredPage {
    record: PageRecord,
    links: Vec<Url>,
}

impl WebsiteMirror {
    /// Mirrors the request's root page, and with `recurse` every internal page reachable from it.
    ///
    /// Pages are visited depth-first in link order. A link is marked visited
    /// right before it is fetched, so a page linked from several parents is
    /// mirrored once, under the folder derived from its own URL path.
    /// `progress` receives the kilobytes written so far for the current page.
    pub async fn crawl(
        &self,
        request: &CrawlRequest,
        progress: &mut dyn FnMut(u64),
    ) -> Result<CrawlReport> {
        let files = FileManager::new(request.destination())?;
        let cancel = &request.cancel;
        let options = request.options();
        let mut report = CrawlReport::default();

        info!(url = %request.root_url(), destination = %files.base_dir().display(), recurse = options.recurse, "starting mirror");

        report.visited.insert(request.root_url());
        let root = self
            .mirror_page(request.root_url(), files.base_dir(), 0, &files, options.recurse, &mut *progress, cancel)
            .await?;
        report.record(root.record);

        let mut stack = vec![Frame {
            links: root.links.into_iter(),
            depth: 0,
        }];

        while let Some(frame) = stack.last_mut() {
            if cancel.is_cancelled() {
                warn!(pages = report.pages.len(), "crawl cancelled");
                break;
            }

            let Some(link) = frame.links.next() else {
                stack.pop();
                continue;
            };
            let depth = frame.depth + 1;

            if !is_fetchable(&link) {
                debug!(%link, "skipping non-HTTP link");
                continue;
            }
            if report.visited.contains(&link) {
                continue;
            }
            if options.max_depth.is_some_and(|max| depth > max) {
                debug!(%link, depth, "skipping link beyond max depth");
                continue;
            }
            if options
                .max_pages
                .is_some_and(|max| report.pages.len() >= max)
            {
                info!(pages = report.pages.len(), "page limit reached");
                break;
            }

            report.visited.insert(&link);
            let folder = files.page_folder(&link);
            let page = self
                .mirror_page(&link, &folder, depth, &files, true, &mut *progress, cancel)
                .await?;
            report.record(page.record);
            stack.push(Frame {
                links: page.links.into_iter(),
                depth,
            });
        }

        report.cancelled = cancel.is_cancelled();
        info!(
            pages = report.pages.len(),
            bytes = report.total_bytes,
            cancelled = report.cancelled,
            "mirror finished"
        );
        Ok(report)
    }

    /// Fetches one page, writes its `index.html`, downloads its assets and,
    /// when `collect_links` is set, returns its internal links.
    #[allow(clippy::too_many_arguments)]
    async fn mirror_page(
        &self,
        url: &Url,
        folder: &Path,
        depth: usize,
        files: &FileManager,
        collect_links: bool,
        progress: &mut dyn FnMut(u64),
        cancel: &CancelFlag,
    ) -> Result<MirroredPage> {
        ensure_dir(folder)?;

        let document = self.fetch_page(url).await?;
        files.write_index(folder, document.html())?;

        let parser = HtmlParser::for_url(url.clone());
        let assets = parser.extract_assets(&document);
        let mut page_progress = DownloadProgress::new(progress);
        let batch = self
            .download_assets(&assets, &parser, files, folder, &mut page_progress, cancel)
            .await?;

        let links = if collect_links {
            parser.internal_links(&document)
        } else {
            Vec::new()
        };

        info!(%url, depth, assets = batch.files, bytes = batch.bytes, links = links.len(), "page mirrored");
        Ok(MirroredPage {
            record: PageRecord {
                url: url.to_string(),
                folder: folder.to_path_buf(),
                depth,
                assets: batch.files,
                asset_bytes: batch.bytes,
            },
            links,
        })
    }

    /// Runs a traversal without a progress listener.
    pub async fn crawl_quietly(&self, request: &CrawlRequest) -> Result<CrawlReport> {
        self.crawl(request, &mut |_: u64| {}).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults_to_single_page() {
        let request = CrawlRequest::new("https://example.test/", "/tmp/out").unwrap();
        assert_eq!(request.options(), &CrawlOptions::default());
        assert!(!request.options().recurse);
        assert_eq!(request.destination(), Path::new("/tmp/out"));
        assert!(!request.cancel_flag().is_cancelled());
    }

    #[test]
    fn test_request_builder_options() {
        let request = CrawlRequest::new("https://example.test/", "/tmp/out")
            .unwrap()
            .recursive(true)
            .with_max_depth(2)
            .with_max_pages(50);
        assert_eq!(
            request.options(),
            &CrawlOptions {
                recurse: true,
                max_depth: Some(2),
                max_pages: Some(50),
            }
        );
    }

    #[test]
    fn test_request_rejects_bad_url() {
        let error = CrawlRequest::new("example dot test", "/tmp/out").unwrap_err();
        assert!(matches!(error, MirrorError::InvalidUrl { .. }));
    }

    #[test]
    fn test_cancel_flag_is_shared_with_request() {
        let request = CrawlRequest::new("https://example.test/", "/tmp/out").unwrap();
        request.cancel_flag().cancel();
        assert!(request.cancel.is_cancelled());
    }

    #[test]
    fn test_visited_set_only_grows() {
        let mut visited = VisitedSet::default();
        let about = Url::parse("https://example.test/about").unwrap();
        assert!(visited.insert(&about));
        assert!(!visited.insert(&about));
        assert!(visited.contains(&about));
        assert!(visited.contains_str("https://example.test/about"));
        assert!(!visited.contains_str("https://example.test/about#team"));
        assert_eq!(visited.len(), 1);
    }

    #[test]
    fn test_report_accumulates_bytes() {
        let mut report = CrawlReport::default();
        for (url, bytes) in [("https://example.test/", 10), ("https://example.test/a", 32)] {
            report.record(PageRecord {
                url: url.to_string(),
                folder: PathBuf::from("/tmp"),
                depth: 0,
                assets: 1,
                asset_bytes: bytes,
            });
        }
        assert_eq!(report.total_bytes, 42);
        assert_eq!(report.pages.len(), 2);
    }
}
