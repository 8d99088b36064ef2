//! VOC batch: crawl the gallery window, classify mentions, write the
//! report. An empty crawl still writes an (empty-state) report so the
//! published page never goes missing.

use super::{analyze, crawler::GalleryCrawler};
use crate::config::Config;
use crate::error::Result;
use crate::report;
use chrono::{FixedOffset, Utc};
use std::path::Path;

pub struct SignalArgs {
    pub days: Option<i64>,
    pub max_pages: Option<u32>,
}

pub async fn run(config: &Config, args: SignalArgs) -> Result<()> {
    let mut signal_config = config.signal.clone();
    if let Some(days) = args.days {
        signal_config.target_days = days;
    }
    if let Some(max_pages) = args.max_pages {
        signal_config.max_pages = max_pages;
    }

    println!(
        "🚀 [M-OS] '{}' gallery analysis start (last {} days)",
        signal_config.gallery_id, signal_config.target_days
    );

    let crawler = GalleryCrawler::new(&signal_config)?;
    let posts = crawler.crawl().await;
    if posts.is_empty() {
        println!("⚠️ collected 0 posts (writing empty report)");
    } else {
        println!("📥 collected {} posts", posts.len());
    }

    let voc = analyze::process_posts(&posts);

    let now_str = Utc::now()
        .with_timezone(&FixedOffset::east_opt(9 * 3600).unwrap())
        .format("%Y-%m-%d %H:%M")
        .to_string();

    let out_path = Path::new("reports").join("external_signal.html");
    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let html = report::signal_page::render(&voc, &now_str);
    std::fs::write(&out_path, html)?;

    println!("✅ External Signal report written: {}", out_path.display());
    Ok(())
}
