pub mod cli;
pub mod config;
pub mod control;
pub mod crawler;
pub mod downloader;
pub mod error;
pub mod file_manager;
pub mod html_parser;
pub mod worker;

// Re-export main types for convenience
pub use cli::MirrorCommand;
pub use config::MirrorConfig;
pub use control::{CancelFlag, DownloadProgress};
pub use crawler::{CrawlOptions, CrawlReport, CrawlRequest, PageRecord, VisitedSet};
pub use downloader::{AssetBatch, WebsiteMirror};
pub use error::{MirrorError, Result};
pub use file_manager::FileManager;
pub use html_parser::{Element, HtmlParser, MediaParent, PageDocument};
pub use worker::CrawlHandle;
