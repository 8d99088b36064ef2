//! Input catalog loading: price-list discovery and column mapping, and
//! the official product-image map.

use crate::error::{AppError, Result};
use crate::models::Product;
use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

const DEFAULT_INPUT_NAME: &str = "공식몰가격.csv";
const INPUT_STEM: &str = "공식몰가격";

const CODE_COLS: &[&str] = &["코드", "상품코드", "style_code", "product_code"];
const NAME_EN_COLS: &[&str] = &["상품명(영문)", "상품명_영문", "상품명", "product_name_en", "name_en"];
const NAME_KO_COLS: &[&str] = &["상품명(한글)", "상품명_한글", "상품명(국문)", "product_name_ko", "name_ko"];
const PRICE_COLS: &[&str] = &["공식몰가", "판매가", "정가", "price", "official_price"];

fn url_code_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)/([A-Z]\d{2}[A-Z]{2}\d{7})\.(?:jpg|jpeg|png|webp)(?:\?|$)").unwrap()
    })
}

fn name_code_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\(([A-Z]\d{2}[A-Z]{2}\d{7})\)").unwrap())
}

/// Resolve the input CSV: explicit path, the default file name, or the
/// newest file in `dir` whose name carries the price-list stem.
pub fn pick_input_file(explicit: Option<&Path>, dir: &Path) -> Result<PathBuf> {
    if let Some(path) = explicit {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        return Err(AppError::Configuration(format!(
            "Input file not found: {}",
            path.display()
        )));
    }

    let default = dir.join(DEFAULT_INPUT_NAME);
    if default.exists() {
        return Ok(default);
    }

    let mut candidates: Vec<(std::time::SystemTime, PathBuf)> = Vec::new();
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let lower = name.to_lowercase();
            if lower.contains(INPUT_STEM) && lower.ends_with(".csv") {
                let mtime = entry
                    .metadata()
                    .and_then(|m| m.modified())
                    .unwrap_or(std::time::UNIX_EPOCH);
                candidates.push((mtime, path));
            }
        }
    }

    candidates.sort_by(|a, b| b.0.cmp(&a.0));
    candidates
        .into_iter()
        .next()
        .map(|(_, p)| p)
        .ok_or_else(|| {
            AppError::Configuration(format!(
                "No input file found: place a '{}...' CSV in the working directory or pass --input",
                INPUT_STEM
            ))
        })
}

/// Case-insensitive header lookup against a synonym list. The first
/// synonym with a matching header wins.
pub fn find_col(headers: &csv::StringRecord, candidates: &[&str]) -> Option<usize> {
    let normalized: Vec<String> = headers
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_lowercase())
        .collect();
    for cand in candidates {
        let key = cand.trim().to_lowercase();
        if let Some(idx) = normalized.iter().position(|h| *h == key) {
            return Some(idx);
        }
    }
    None
}

fn row_value<'a>(
    record: &'a csv::StringRecord,
    col: Option<usize>,
    fallback_idx: Option<usize>,
) -> Option<&'a str> {
    col.and_then(|i| record.get(i))
        .or_else(|| fallback_idx.and_then(|i| record.get(i)))
}

/// Official prices arrive formatted ("129,000원"); keep the digits.
pub fn parse_price(raw: &str) -> Option<i64> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

/// Load the product catalog. Rows without a code are dropped; at most
/// `limit` rows are kept.
pub fn load_products(path: &Path, limit: usize) -> Result<Vec<Product>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| AppError::Storage(format!("Failed to open {}: {}", path.display(), e)))?;

    let headers = reader.headers()?.clone();
    let col_code = find_col(&headers, CODE_COLS);
    let col_name_en = find_col(&headers, NAME_EN_COLS);
    let col_name_ko = find_col(&headers, NAME_KO_COLS);
    let col_price = find_col(&headers, PRICE_COLS);
    println!(
        "🧭 COLMAP code={:?} name_en={:?} name_ko={:?} price={:?}",
        col_code, col_name_en, col_name_ko, col_price
    );

    let mut products = Vec::new();
    for record in reader.records() {
        let record = record?;

        let code = row_value(&record, col_code, Some(1))
            .map(str::trim)
            .unwrap_or("");
        if code.is_empty() || code.eq_ignore_ascii_case("nan") {
            continue;
        }

        let name_en = row_value(&record, col_name_en, Some(2))
            .map(str::trim)
            .unwrap_or("")
            .to_string();
        let name_ko = row_value(&record, col_name_ko, None)
            .map(str::trim)
            .unwrap_or("")
            .to_string();
        let official_price = row_value(&record, col_price, Some(4)).and_then(parse_price);

        products.push(Product {
            code: code.to_string(),
            name_en,
            name_ko,
            official_price,
        });

        if products.len() >= limit {
            break;
        }
    }

    Ok(products)
}

/// Build the code → official image URL map from the hash CSV. Missing
/// file or missing columns yield an empty map; the run continues on
/// marketplace images alone.
pub fn build_official_image_map(path: &Path) -> HashMap<String, String> {
    if !path.exists() {
        println!("🖼️ official_hashes not found: {}", path.display());
        return HashMap::new();
    }

    println!("🖼️ Loading official_hashes: {}", path.display());
    let mut reader = match csv::ReaderBuilder::new().flexible(true).from_path(path) {
        Ok(r) => r,
        Err(e) => {
            println!("🖼️ official_hashes unreadable: {}", e);
            return HashMap::new();
        }
    };

    let headers = match reader.headers() {
        Ok(h) => h.clone(),
        Err(_) => return HashMap::new(),
    };
    let col_name = find_col(&headers, &["product_name"]);
    let col_url = find_col(&headers, &["image_url"]);
    let col_hash = find_col(&headers, &["aHash64"]);
    let (Some(col_name), Some(col_url)) = (col_name, col_url) else {
        println!(
            "🖼️ official_hashes columns missing. found={:?}",
            headers.iter().collect::<Vec<_>>()
        );
        return HashMap::new();
    };

    let mut pairs: Vec<(String, String)> = Vec::new();
    for record in reader.records().flatten() {
        let url = record.get(col_url).unwrap_or("").trim();
        let name = record.get(col_name).unwrap_or("").trim();
        if url.is_empty() {
            continue;
        }

        let lower = url.to_lowercase();
        // icons and promo banners share the CDN with product shots
        if lower.contains("/images/pc/common/ico_")
            || lower.contains("/data/banner/")
            || lower.contains("gift_banner")
            || lower.contains("icon")
        {
            continue;
        }
        if !lower.contains("/data/productimages/") {
            continue;
        }

        if let Some(idx) = col_hash {
            let hash = record.get(idx).unwrap_or("").trim();
            if hash.is_empty() || hash == "0" {
                continue;
            }
        }

        let code = url_code_re()
            .captures(url)
            .or_else(|| name_code_re().captures(name))
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_uppercase());
        if let Some(code) = code {
            pairs.push((code, url.to_string()));
        }
    }

    pairs.sort_by(|a, b| a.0.cmp(&b.0));
    let mut map = HashMap::new();
    for (code, url) in pairs {
        map.entry(code).or_insert(url);
    }

    println!("🖼️ official image map built: {} codes", map.len());
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_find_col_synonyms_and_bom() {
        let headers = csv::StringRecord::from(vec!["\u{feff}코드", "상품명(영문)", "판매가"]);
        assert_eq!(find_col(&headers, CODE_COLS), Some(0));
        assert_eq!(find_col(&headers, NAME_EN_COLS), Some(1));
        assert_eq!(find_col(&headers, PRICE_COLS), Some(2));
        assert_eq!(find_col(&headers, NAME_KO_COLS), None);

        let english = csv::StringRecord::from(vec!["Product_Code", "Name_EN", "PRICE"]);
        assert_eq!(find_col(&english, CODE_COLS), Some(0));
        assert_eq!(find_col(&english, PRICE_COLS), Some(2));
    }

    #[test]
    fn test_parse_price_strips_formatting() {
        assert_eq!(parse_price("129,000원"), Some(129000));
        assert_eq!(parse_price(" 45000 "), Some(45000));
        assert_eq!(parse_price(""), None);
        assert_eq!(parse_price("미정"), None);
    }

    #[test]
    fn test_load_products_drops_codeless_rows_and_limits() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            dir.path(),
            "input.csv",
            "코드,상품명(영문),상품명(한글),공식몰가\n\
             C6X123,Trail Jacket,트레일 자켓,\"129,000\"\n\
             ,No Code,코드 없음,10000\n\
             C7Y456,Down Parka,다운 파카,359000\n\
             C7Z789,Fleece,플리스,99000\n",
        );

        let products = load_products(&path, 2).unwrap();
        assert_eq!(products.len(), 2);
        assert_eq!(products[0].code, "C6X123");
        assert_eq!(products[0].official_price, Some(129000));
        assert_eq!(products[1].code, "C7Y456");
    }

    #[test]
    fn test_load_products_positional_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            dir.path(),
            "headerless.csv",
            "idx,c,n,extra,p\n0,C6X123,Jacket,x,129000\n",
        );
        let products = load_products(&path, 100).unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].code, "C6X123");
        assert_eq!(products[0].name_en, "Jacket");
        assert_eq!(products[0].official_price, Some(129000));
    }

    #[test]
    fn test_pick_input_file_explicit_and_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let explicit = write_csv(dir.path(), "whatever.csv", "코드\nC1\n");
        assert_eq!(
            pick_input_file(Some(&explicit), dir.path()).unwrap(),
            explicit
        );
        assert!(pick_input_file(Some(Path::new("missing.csv")), dir.path()).is_err());

        assert!(pick_input_file(None, dir.path()).is_err());
        let pattern = write_csv(dir.path(), "공식몰가격_0801.csv", "코드\nC1\n");
        assert_eq!(pick_input_file(None, dir.path()).unwrap(), pattern);

        let default = write_csv(dir.path(), "공식몰가격.csv", "코드\nC1\n");
        assert_eq!(pick_input_file(None, dir.path()).unwrap(), default);
    }

    #[test]
    fn test_official_image_map_filters_and_extracts_codes() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            dir.path(),
            "official_hashes.csv",
            "product_name,image_url,aHash64\n\
             Trail Jacket (C21AB1234567),https://cdn.example/data/ProductImages/C21AB1234567.jpg,f0f0\n\
             Banner,https://cdn.example/data/banner/sale.jpg,f0f0\n\
             Icon,https://cdn.example/images/pc/common/ico_cart.png,f0f0\n\
             Zero Hash,https://cdn.example/data/ProductImages/C63CD7654321.jpg,0\n\
             Name Code Only (C74EF1112223),https://cdn.example/data/ProductImages/thumb_main.jpg,abcd\n",
        );

        let map = build_official_image_map(&path);
        assert_eq!(map.len(), 2);
        assert_eq!(
            map.get("C21AB1234567").unwrap(),
            "https://cdn.example/data/ProductImages/C21AB1234567.jpg"
        );
        assert!(map.contains_key("C74EF1112223"));
        assert!(!map.contains_key("C63CD7654321"));
    }

    #[test]
    fn test_official_image_map_missing_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(dir.path(), "bad.csv", "name,url\nA,https://x\n");
        assert!(build_official_image_map(&path).is_empty());
        assert!(build_official_image_map(Path::new("nope.csv")).is_empty());
    }
}
