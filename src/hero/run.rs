//! The banner batch: one browser reused across brands, one brand's
//! failure never aborting the run, CSV + report at the end.

use super::assets::{AssetStore, SaveOutcome};
use super::extract::{self, ExtractOutcome, RawCandidate};
use super::session::{self, BrowserSession};
use super::{dates, dedupe, BrandSpec, ExtractMode, BRANDS};
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::{Banner, ImgStatus};
use crate::report;
use chrono::{DateTime, FixedOffset, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashSet;
use std::io::Write;
use std::path::Path;

pub fn kst_now() -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&FixedOffset::east_opt(9 * 3600).unwrap())
}

pub async fn run(config: &Config) -> Result<()> {
    let hero = &config.hero;

    std::fs::create_dir_all(&hero.out_dir)?;
    std::fs::create_dir_all(hero.asset_dir())?;
    std::fs::create_dir_all(hero.snapshot_dir())?;

    let now = kst_now();
    let date_s = now.format("%Y-%m-%d").to_string();
    let ts = now.format("%Y%m%d_%H%M%S").to_string();

    let today_snap = hero
        .snapshot_dir()
        .join(format!("hero_main_banners_{}.csv", date_s));
    let report_csv = hero.out_dir.join(format!("hero_main_banners_{}.csv", ts));
    let report_html = hero.out_dir.join("hero_main.html");

    let progress = ProgressBar::new(BRANDS.len() as u64);
    progress.set_style(
        ProgressStyle::with_template("[{bar:28}] {pos}/{len} {msg} ({elapsed_precise} ETA {eta})")
            .unwrap()
            .progress_chars("█░"),
    );

    let mut session = BrowserSession::new(hero);
    session.launch().await?;
    let mut assets = AssetStore::new(
        &hero.asset_dir(),
        hero.max_img_width,
        hero.jpg_quality,
        &hero.user_agent,
    )?;

    let mut rows: Vec<Banner> = Vec::new();
    let mut ok_brands = 0usize;
    let mut failed_brands = 0usize;

    for brand in BRANDS {
        progress.set_message(format!("{} goto", brand.name));

        let mut brand_rows: Vec<Banner> = Vec::new();
        let mut brand_ok = false;

        for attempt in 1..=2 {
            match crawl_brand(&session, &mut assets, brand, &date_s).await {
                Ok(banners) => {
                    brand_rows = banners;
                    brand_ok = true;
                    break;
                }
                Err(e) => {
                    progress.suspend(|| {
                        println!(" - {} attempt {}/2 failed: {}", brand.name, attempt, e)
                    });
                    if session::is_closed_error(&e) {
                        if let Err(relaunch_err) = session.relaunch().await {
                            progress
                                .suspend(|| println!(" - relaunch failed: {}", relaunch_err));
                            break;
                        }
                    }
                }
            }
        }

        let mut brand_rows = dedupe::dedupe_brand_rows(brand_rows);

        if hero.fetch_campaign_dates {
            progress.set_message(format!("{} fetch_dates", brand.name));
            for banner in &mut brand_rows {
                let href = if banner.href_clean.is_empty() {
                    banner.href.clone()
                } else {
                    banner.href_clean.clone()
                };
                if href.is_empty() {
                    continue;
                }
                match dates::fetch_campaign_dates(&session, &href, hero.date_fetch_timeout_ms).await
                {
                    Ok((start, end)) => {
                        banner.plan_start = start;
                        banner.plan_end = end;
                    }
                    Err(e) => {
                        tracing::debug!(error = %e, brand = brand.key, "campaign date fetch failed")
                    }
                }
            }
        }

        rows.extend(brand_rows);
        if brand_ok {
            ok_brands += 1;
        } else {
            failed_brands += 1;
        }
        progress.inc(1);
    }

    progress.finish_with_message(format!("OK:{} FAIL:{}", ok_brands, failed_brands));

    write_banner_csv(&today_snap, &rows)?;
    write_banner_csv(&report_csv, &rows)?;

    let html = report::hero_page::render(&rows, hero, &now.format("%Y-%m-%d %H:%M").to_string());
    std::fs::write(&report_html, html)?;

    println!("[CSV] {}", report_csv.display());
    println!("[HTML] {}", report_html.display());
    println!("[ASSET_DIR] {}", hero.asset_dir().display());

    session.close().await?;

    if !report_html.exists() {
        return Err(AppError::Storage(format!(
            "HTML not created: {}",
            report_html.display()
        )));
    }
    println!("✅ hero_main.html generated successfully");
    Ok(())
}

async fn crawl_brand(
    session: &BrowserSession,
    assets: &mut AssetStore,
    brand: &BrandSpec,
    date_s: &str,
) -> Result<Vec<Banner>> {
    let page = session.open(brand.url).await?;

    extract::close_common_popups(&page).await;
    if brand.mode == ExtractMode::Generic {
        extract::scroll_nudge(&page).await;
    }

    let result = match extract::extract_candidates(&page, brand.mode).await {
        ExtractOutcome::Found(candidates) => {
            Ok(build_banners(candidates, brand, date_s, assets).await)
        }
        ExtractOutcome::Empty => {
            tracing::info!(brand = brand.key, "no banner candidates found");
            Ok(Vec::new())
        }
        ExtractOutcome::Failed(msg) => Err(AppError::Scrape(format!("{}: {}", brand.name, msg))),
    };

    let _ = page.close().await;
    result
}

/// Shared banner assembly: absolutize URLs, drop candidate-level
/// duplicates, pick a title, persist the image.
async fn build_banners(
    candidates: Vec<RawCandidate>,
    brand: &BrandSpec,
    date_s: &str,
    assets: &mut AssetStore,
) -> Vec<Banner> {
    let mut out: Vec<Banner> = Vec::new();
    let mut seen: HashSet<(String, String)> = HashSet::new();

    for cand in candidates {
        if out.len() >= brand.max_items {
            break;
        }

        let href = extract::abs_url(brand.url, &cand.href);
        let img_url = extract::abs_url(brand.url, &cand.img);
        if href.is_empty() && img_url.is_empty() {
            continue;
        }

        let href_clean = dedupe::normalize_href(&href);
        if !seen.insert((href_clean.clone(), img_url.clone())) {
            continue;
        }

        let rank = out.len() as u32 + 1;
        let title = extract::choose_title(&[cand.txt.as_str(), cand.alt.as_str()]);

        let mut banner = Banner::new(date_s, brand.key, brand.name, rank, title);
        banner.href = href;
        banner.href_clean = href_clean;
        banner.img_url = img_url.clone();

        if !img_url.is_empty() {
            let saved = match assets.save_image(&img_url, brand.key, rank, brand.url).await {
                SaveOutcome::Saved(filename) => Some((filename, ImgStatus::Ok)),
                SaveOutcome::Cached(filename) => Some((filename, ImgStatus::Cached)),
                SaveOutcome::DownloadFail => {
                    banner.img_status = ImgStatus::DownloadFail;
                    None
                }
                SaveOutcome::NoUrl => {
                    banner.img_status = ImgStatus::NoUrl;
                    None
                }
            };
            if let Some((filename, status)) = saved {
                if let Some(meta) = assets.meta(&filename) {
                    banner.img_w = meta.width;
                    banner.img_h = meta.height;
                    banner.img_bytes = meta.bytes;
                }
                banner.img_local = filename;
                banner.img_status = status;
            }
        }

        out.push(banner);
    }

    out
}

const BANNER_COLUMNS: &[&str] = &[
    "date", "brand_key", "brand_name", "rank", "title", "href", "href_clean", "plan_start",
    "plan_end", "img_url", "img_local", "img_status", "img_w", "img_h", "img_bytes",
];

pub fn write_banner_csv(path: &Path, rows: &[Banner]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = std::fs::File::create(path)
        .map_err(|e| AppError::Storage(format!("Failed to create {}: {}", path.display(), e)))?;
    file.write_all(b"\xEF\xBB\xBF")?;

    let mut writer = csv::Writer::from_writer(file);
    writer.write_record(BANNER_COLUMNS)?;
    for b in rows {
        writer.write_record(&[
            b.date.clone(),
            b.brand_key.clone(),
            b.brand_name.clone(),
            b.rank.to_string(),
            b.title.clone(),
            b.href.clone(),
            b.href_clean.clone(),
            b.plan_start.clone(),
            b.plan_end.clone(),
            b.img_url.clone(),
            b.img_local.clone(),
            b.img_status.as_str().to_string(),
            b.img_w.to_string(),
            b.img_h.to_string(),
            b.img_bytes.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_banner_csv_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshots/hero_main_banners_2026-02-01.csv");

        let mut banner = Banner::new("2026-02-01", "tnf", "The North Face", 1, "윈터 세일".to_string());
        banner.href = "https://www.thenorthfacekorea.co.kr/event/winter".to_string();
        banner.href_clean = banner.href.clone();
        banner.img_url = "https://cdn.example/banner.jpg".to_string();
        banner.img_local = "tnf_1_ab12cd34ef.jpg".to_string();
        banner.img_status = ImgStatus::Ok;
        banner.img_w = 1100;
        banner.img_h = 450;
        banner.img_bytes = 120_000;

        write_banner_csv(&path, &[banner]).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.len(), BANNER_COLUMNS.len());
        assert_eq!(headers.get(11), Some("img_status"));

        let record = reader.records().next().unwrap().unwrap();
        assert_eq!(record.get(3), Some("1"));
        assert_eq!(record.get(11), Some("ok"));
        assert_eq!(record.get(12), Some("1100"));
    }
}
