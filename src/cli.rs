use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::{MirrorConfig, DEFAULT_USER_AGENT};
use crate::crawler::CrawlOptions;

#[derive(Parser, Debug)]
#[command(
    name = "site-mirror",
    about = "Mirror a web page and its assets to a local folder",
    version,
    long_about = "Downloads a page's HTML together with its images, stylesheets, audio/video sources and linked documents (.txt, .pdf, .docx, .exe). With --recursive, every same-site page it links to is mirrored into a sub-folder named after its URL path. Press Ctrl-C to stop a running mirror."
)]
pub struct MirrorCommand {
    /// The URL of the page to mirror
    #[arg(required = true)]
    pub url: String,

    /// Output directory for the mirrored site
    #[arg(short, long, default_value = "./mirrored_site")]
    pub output_dir: PathBuf,

    /// Follow internal links and mirror the entire site (may not terminate on large sites)
    #[arg(short, long)]
    pub recursive: bool,

    /// Maximum link depth to follow when recursing
    #[arg(short = 'd', long, value_parser = clap::value_parser!(u64).range(1..))]
    pub max_depth: Option<u64>,

    /// Stop scheduling new pages once this many have been mirrored
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub max_pages: Option<u64>,

    /// User agent string to use for requests
    #[arg(long, default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// Timeout for each request in seconds (unbounded when omitted)
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Write a JSON report of mirrored pages to this file
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl MirrorCommand {
    pub fn mirror_config(&self) -> MirrorConfig {
        let config = MirrorConfig::default().with_user_agent(self.user_agent.clone());
        match self.timeout {
            Some(secs) => config.with_timeout(Duration::from_secs(secs)),
            None => config,
        }
    }

    pub fn crawl_options(&self) -> CrawlOptions {
        CrawlOptions {
            recurse: self.recursive,
            max_depth: self.max_depth.map(|d| d as usize),
            max_pages: self.max_pages.map(|p| p as usize),
        }
    }

    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}
