use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use profiler::Profiler;
use tracing::info;

use crawler::config::{compile_anchored, CrawlConfig};
use crawler::engine::CrawlEngine;
use crawler::parser::HttpPageParser;

/// Crawl the web from a set of seed pages and report the most popular
/// words found along the way.
#[derive(Parser, Debug)]
#[command(name = "crawler", version, about)]
struct Args {
    /// Path to the crawl configuration JSON file
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let config = CrawlConfig::from_file(&args.config)?;

    let profiler = Profiler::new();
    let ignored_words = compile_anchored(&config.ignored_words)?;
    let parser =
        HttpPageParser::new(ignored_words).context("failed to build the HTTP client")?;
    let parser = profiler.wrap(parser)?;

    let engine = CrawlEngine::new(Arc::new(parser), &config)?;

    info!(seeds = config.start_pages.len(), "starting crawl");
    let result = engine.crawl(&config.start_pages).await;
    info!(urls_visited = result.urls_visited, "crawl finished");

    let rendered =
        serde_json::to_string_pretty(&result).context("failed to serialize the crawl result")?;
    match &config.result_path {
        Some(path) => fs::write(path, rendered)
            .with_context(|| format!("failed to write the result to {}", path.display()))?,
        None => println!("{rendered}"),
    }

    match &config.profile_output_path {
        Some(path) => profiler
            .write_report(path)
            .with_context(|| format!("failed to write profile data to {}", path.display()))?,
        None => profiler
            .write_report_to(&mut io::stdout())
            .context("failed to write profile data")?,
    }

    Ok(())
}
