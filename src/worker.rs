use std::thread::{self, JoinHandle};

use tracing::error;

use crate::control::CancelFlag;
use crate::crawler::{CrawlReport, CrawlRequest};
use crate::downloader::WebsiteMirror;
use crate::error::{MirrorError, Result};

/// A traversal running on its own thread.
///
/// The whole traversal, every page and asset, runs sequentially on that one
/// thread inside a current-thread runtime. The owner keeps its own loop free
/// and talks to the worker only through the cancel flag and `join`.
pub struct CrawlHandle {
    cancel: CancelFlag,
    worker: JoinHandle<Result<CrawlReport>>,
}

impl CrawlHandle {
    pub fn spawn<F>(mirror: WebsiteMirror, request: CrawlRequest, mut progress: F) -> Result<Self>
    where
        F: FnMut(u64) + Send + 'static,
    {
        let cancel = request.cancel_flag();
        let worker = thread::Builder::new()
            .name("site-mirror-crawl".to_string())
            .spawn(move || {
                let runtime = tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .map_err(|e| MirrorError::Worker(format!("failed to start runtime: {e}")))?;
                let result = runtime.block_on(mirror.crawl(&request, &mut progress));
                if let Err(e) = &result {
                    error!(error = %e, url = %request.root_url(), "crawl aborted");
                }
                result
            })
            .map_err(|e| MirrorError::Worker(format!("failed to spawn worker thread: {e}")))?;

        Ok(Self { cancel, worker })
    }

    /// Asks the worker to stop at its next checkpoint. Requests already in flight complete.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.worker.is_finished()
    }

    /// Blocks until the traversal ends and returns its outcome.
    pub fn join(self) -> Result<CrawlReport> {
        self.worker
            .join()
            .map_err(|_| MirrorError::Worker("crawl worker panicked".to_string()))?
    }
}
