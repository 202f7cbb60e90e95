use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use site_mirror::{CrawlHandle, CrawlReport, CrawlRequest, MirrorCommand, WebsiteMirror};

#[tokio::main]
async fn main() -> Result<()> {
    let args = MirrorCommand::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.log_level()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let request = CrawlRequest::new(&args.url, args.output_dir.clone())?
        .with_options(args.crawl_options());
    let mirror = WebsiteMirror::new(args.mirror_config())?;

    println!("🚀 Mirroring: {}", request.root_url().as_str().blue());
    println!("📁 Output directory: {:?}", request.destination());
    if request.options().recurse {
        println!(
            "{}",
            "⚠️  Recursive mode follows every internal link and may not terminate. Press Ctrl-C to stop."
                .yellow()
        );
    }

    let progress_bar = ProgressBar::new_spinner();
    progress_bar.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner} {msg}")
            .context("invalid progress template")?,
    );
    let bar = progress_bar.clone();
    let handle = CrawlHandle::spawn(mirror, request, move |kb| {
        bar.set_message(format!("{kb} KB downloaded for current page"));
        bar.tick();
    })?;

    let cancel = handle.cancel_flag();
    let mut finished = tokio::task::spawn_blocking(move || handle.join());
    let outcome = tokio::select! {
        joined = &mut finished => joined,
        _ = tokio::signal::ctrl_c() => {
            progress_bar.set_message("Stopping after the current download...");
            cancel.cancel();
            finished.await
        }
    };
    let result = outcome.context("crawl worker did not report back")?;

    match result {
        Ok(report) => {
            progress_bar.finish_and_clear();
            print_summary(&report);
            if let Some(path) = &args.report {
                let json = serde_json::to_string_pretty(&report)?;
                std::fs::write(path, json)
                    .with_context(|| format!("Failed to write report: {:?}", path))?;
                println!("📝 Report written to {:?}", path);
            }
            Ok(())
        }
        Err(e) => {
            progress_bar.abandon_with_message("❌ Mirror failed");
            Err(e).context("An error occurred while downloading the website")
        }
    }
}

fn print_summary(report: &CrawlReport) {
    if report.cancelled {
        println!("{}", "🛑 Download stopped.".yellow());
    } else {
        println!("{}", "✅ Website downloaded successfully!".green());
    }
    println!("📊 Pages mirrored: {}", report.pages.len());
    println!("📦 Asset bytes downloaded: {}", report.total_bytes);
}
