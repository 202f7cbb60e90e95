use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative stop signal shared between the controlling side and the worker.
///
/// Clones observe the same flag. The engine only polls it before each asset
/// and before each page it would descend into; in-flight requests finish.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    cancelled: Arc<AtomicBool>,
}

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// Running byte counter for one page's asset batch.
///
/// A fresh counter is created for every page, so the values handed to the
/// callback restart at zero on each page boundary.
pub struct DownloadProgress<'a> {
    callback: Option<&'a mut dyn FnMut(u64)>,
    bytes: u64,
}

impl<'a> DownloadProgress<'a> {
    pub fn new(callback: &'a mut dyn FnMut(u64)) -> Self {
        Self {
            callback: Some(callback),
            bytes: 0,
        }
    }

    /// A counter nobody listens to.
    pub fn silent() -> Self {
        Self {
            callback: None,
            bytes: 0,
        }
    }

    /// Adds `len` bytes and reports the running total in whole kilobytes.
    pub fn record(&mut self, len: usize) {
        self.bytes += len as u64;
        if let Some(callback) = self.callback.as_mut() {
            callback(self.bytes / 1024);
        }
    }

    pub fn bytes(&self) -> u64 {
        self.bytes
    }
}
