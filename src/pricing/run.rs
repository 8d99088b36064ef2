//! The reconciliation batch: load catalog, query the search API per
//! product (through the cache), rank and score, diff against the
//! previous snapshot, emit CSV + dashboard.

use super::api::ShopSearchClient;
use super::cache::SearchCache;
use super::{catalog, history, matcher};
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::{PriceRow, Product, SearchItem, Top3Entry};
use crate::report;
use chrono::Local;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub struct PriceArgs {
    pub input: Option<PathBuf>,
    pub output_csv: Option<PathBuf>,
    pub output_html: PathBuf,
    pub delay: f64,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub exclude_malls: Vec<String>,
    pub history_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub cache_ttl_hours: u64,
    pub limit: usize,
    pub official_hashes: PathBuf,
}

/// Per-product decision. Exclusions are filtering, not errors.
pub enum RowOutcome {
    Row(Box<PriceRow>),
    NoPrice,
    NoImage,
}

/// Assemble the output row for one product from its surviving search
/// results. A row exists iff a numeric lowest price was found and an
/// image could be resolved from any source.
pub fn assemble_row(
    product: &Product,
    filtered: &[SearchItem],
    official_image: Option<&str>,
) -> RowOutcome {
    let best = matcher::pick_lowest_item(filtered);
    let top3_items = matcher::pick_top_n_by_price(filtered, 3);

    let marketplace_image = matcher::choose_best_image(best, &top3_items);
    let (final_image, official_image, naver_image) =
        matcher::resolve_images(official_image, &marketplace_image);

    let Some(naver_price) = best.and_then(|b| b.price()) else {
        return RowOutcome::NoPrice;
    };
    if final_image.is_empty() {
        return RowOutcome::NoImage;
    }

    let diff = if naver_price > 0 {
        product.official_price.map(|o| o - naver_price)
    } else {
        None
    };

    let confidence = matcher::compute_confidence(&product.code, best);
    let top3: Vec<Top3Entry> = top3_items.iter().map(Top3Entry::from_item).collect();

    RowOutcome::Row(Box::new(PriceRow {
        code: product.code.clone(),
        name_en: product.name_en.clone(),
        name_ko: product.name_ko.clone(),
        official_price: product.official_price,
        naver_price: Some(naver_price),
        diff,
        mall: best.map(|b| b.mall_name.clone()).unwrap_or_default(),
        link: best.map(|b| b.link.clone()).unwrap_or_default(),
        image_url: final_image,
        official_image_url: official_image,
        naver_image_url: naver_image,
        naver_title: best
            .map(|b| matcher::strip_html_tags(&b.title))
            .unwrap_or_default(),
        confidence,
        top3,
        prev_naver: None,
        delta_naver: None,
    }))
}

pub async fn run(config: &Config, args: PriceArgs) -> Result<()> {
    println!("🚀 PRICE RUN START");

    config.naver.require_credentials()?;

    let official_img_map = catalog::build_official_image_map(&args.official_hashes);

    let input_path = catalog::pick_input_file(args.input.as_deref(), Path::new("."))?;
    println!("📄 INPUT FILE SELECTED: {}", input_path.display());

    let products = catalog::load_products(&input_path, args.limit)?;
    println!("📥 CSV LOAD DONE: rows={}", products.len());
    if products.is_empty() {
        return Err(AppError::InvalidInput(
            "Input CSV has no product rows".to_string(),
        ));
    }

    let today_token = Local::now().format("%m%d").to_string();
    let prev_csv_path = history::find_previous_result_csv(&args.history_dir, &today_token);
    let prev_map = prev_csv_path
        .as_deref()
        .map(history::load_previous_prices)
        .unwrap_or_default();
    match &prev_csv_path {
        Some(p) => println!("🕘 PREV RESULT: {}", p.display()),
        None => println!("🕘 PREV RESULT: NONE"),
    }

    println!(
        "🧪 FILTER: min_price={:?} max_price={:?} exclude_malls={:?}",
        args.min_price, args.max_price, args.exclude_malls
    );

    let cache = SearchCache::new(&args.cache_dir, args.cache_ttl_hours);
    let client = ShopSearchClient::new(&config.naver)?;
    let delay = Duration::from_secs_f64(args.delay.max(0.0));

    let mut rows: Vec<PriceRow> = Vec::new();
    let mut skipped_no_price = 0usize;
    let mut skipped_no_img = 0usize;

    println!(
        "🚚 START FETCH: products={} delay={}s cache_ttl={}h",
        products.len(),
        args.delay,
        args.cache_ttl_hours
    );

    let total = products.len();
    for (i, product) in products.iter().enumerate() {
        println!("  [{}/{}] {}", i + 1, total, product.code);

        let items = match cache.load(&product.code) {
            Some(items) => {
                println!("    ✅ CACHE HIT ({} items)", items.len());
                items
            }
            None => {
                println!("    ❌ CACHE MISS -> API CALL");
                let items = client.search(&product.code, 10).await;
                if let Err(e) = cache.store(&product.code, &items) {
                    tracing::warn!(error = %e, code = %product.code, "cache write failed");
                }
                println!("    📡 API RETURN ({} items)", items.len());
                items
            }
        };

        let filtered = matcher::filter_items_for_accuracy(
            &items,
            args.min_price,
            args.max_price,
            &args.exclude_malls,
        );

        let official_image = official_img_map
            .get(&product.code.to_uppercase())
            .map(String::as_str);

        match assemble_row(product, &filtered, official_image) {
            RowOutcome::Row(mut row) => {
                history::apply_history(&mut row, &prev_map);
                println!(
                    "    ✅ KEEP: naver={} diff={} match={}/5 (official_img={}, naver_img={})",
                    row.naver_price.unwrap_or_default(),
                    row.diff.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string()),
                    row.confidence,
                    if row.official_image_url.is_empty() { "N" } else { "Y" },
                    if row.naver_image_url.is_empty() { "N" } else { "Y" },
                );
                rows.push(*row);
            }
            RowOutcome::NoPrice => {
                skipped_no_price += 1;
                println!("    ⛔ SKIP: naver_price missing");
            }
            RowOutcome::NoImage => {
                skipped_no_img += 1;
                println!("    ⛔ SKIP: final_image missing");
            }
        }

        tokio::time::sleep(delay).await;
    }

    println!(
        "📌 SUMMARY: kept={} skip_no_price={} skip_no_img={}",
        rows.len(),
        skipped_no_price,
        skipped_no_img
    );

    let out_csv = args
        .output_csv
        .clone()
        .unwrap_or_else(|| PathBuf::from(format!("result_{}.csv", today_token)));
    write_result_csv(&out_csv, &rows)?;
    println!("✅ CSV SAVED: {} (rows={})", out_csv.display(), rows.len());

    let meta = report::price_page::DashboardMeta {
        generated_at: Local::now().format("%Y-%m-%d %H:%M").to_string(),
        prev_csv_label: prev_csv_path
            .as_deref()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned()),
    };
    let html = report::price_page::render(&rows, &meta)?;
    std::fs::write(&args.output_html, html)?;
    println!("✅ HTML SAVED: {}", args.output_html.display());

    Ok(())
}

const RESULT_COLUMNS: &[&str] = &[
    "코드",
    "상품명(영문)",
    "상품명(한글)",
    "공식몰가",
    "네이버최저가",
    "가격차이",
    "최저가몰",
    "링크",
    "이미지URL",
    "공식이미지URL",
    "네이버이미지URL",
    "naver_title",
    "confidence",
    "top3",
    "prev_naver",
    "delta_naver",
];

fn opt_to_string(v: Option<i64>) -> String {
    v.map(|x| x.to_string()).unwrap_or_default()
}

/// Excel expects a UTF-8 BOM; the snapshot is also what the next run's
/// delta lookup reads back.
pub fn write_result_csv(path: &Path, rows: &[PriceRow]) -> Result<()> {
    let mut file = std::fs::File::create(path)
        .map_err(|e| AppError::Storage(format!("Failed to create {}: {}", path.display(), e)))?;
    file.write_all(b"\xEF\xBB\xBF")?;

    let mut writer = csv::Writer::from_writer(file);
    writer.write_record(RESULT_COLUMNS)?;
    for row in rows {
        let top3_json = serde_json::to_string(&row.top3)?;
        writer.write_record(&[
            row.code.clone(),
            row.name_en.clone(),
            row.name_ko.clone(),
            opt_to_string(row.official_price),
            opt_to_string(row.naver_price),
            opt_to_string(row.diff),
            row.mall.clone(),
            row.link.clone(),
            row.image_url.clone(),
            row.official_image_url.clone(),
            row.naver_image_url.clone(),
            row.naver_title.clone(),
            row.confidence.to_string(),
            top3_json,
            opt_to_string(row.prev_naver),
            opt_to_string(row.delta_naver),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn product(code: &str, official: Option<i64>) -> Product {
        Product {
            code: code.to_string(),
            name_en: "Trail Jacket".to_string(),
            name_ko: "트레일 자켓".to_string(),
            official_price: official,
        }
    }

    fn item(title: &str, lprice: &str, image: &str) -> SearchItem {
        SearchItem {
            title: title.to_string(),
            link: "https://shopping.example/1".to_string(),
            image: image.to_string(),
            lprice: lprice.to_string(),
            mall_name: "어느몰".to_string(),
        }
    }

    #[test]
    fn test_row_requires_price_and_image() {
        let p = product("C6X123", Some(50000));

        // no items at all -> no price -> excluded
        assert!(matches!(assemble_row(&p, &[], None), RowOutcome::NoPrice));

        // price but no image anywhere -> excluded
        let no_img = [item("C6X123 자켓", "45000", "")];
        assert!(matches!(
            assemble_row(&p, &no_img, None),
            RowOutcome::NoImage
        ));

        // price + marketplace image -> kept
        let with_img = [item("C6X123 자켓", "45000", "https://img.example/a.jpg")];
        match assemble_row(&p, &with_img, None) {
            RowOutcome::Row(row) => {
                assert_eq!(row.naver_price, Some(45000));
                assert_eq!(row.diff, Some(5000));
                assert_eq!(row.image_url, "https://img.example/a.jpg");
                assert!(row.official_image_url.is_empty());
            }
            _ => panic!("expected a row"),
        }
    }

    #[test]
    fn test_official_image_rescues_imageless_match() {
        let p = product("C6X123", None);
        let no_img = [item("C6X123 자켓", "45000", "")];
        match assemble_row(&p, &no_img, Some("https://official.example/a.jpg")) {
            RowOutcome::Row(row) => {
                assert_eq!(row.image_url, "https://official.example/a.jpg");
                assert_eq!(row.official_image_url, "https://official.example/a.jpg");
                // no official price -> no diff
                assert_eq!(row.diff, None);
            }
            _ => panic!("expected a row"),
        }
    }

    #[test]
    fn test_result_csv_roundtrips_for_delta_lookup() {
        let p = product("C6X123", Some(50000));
        let items = [item("C6X123 자켓", "45000", "https://img.example/a.jpg")];
        let RowOutcome::Row(mut row) = assemble_row(&p, &items, None) else {
            panic!("expected a row");
        };
        history::apply_history(&mut row, &HashMap::from([("C6X123".to_string(), 47000)]));
        assert_eq!(row.prev_naver, Some(47000));
        assert_eq!(row.delta_naver, Some(-2000));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("result_0101.csv");
        write_result_csv(&path, &[*row]).unwrap();

        // the next run reads today's snapshot back through this path
        let prev = history::load_previous_prices(&path);
        assert_eq!(prev.get("C6X123"), Some(&45000));
    }
}
