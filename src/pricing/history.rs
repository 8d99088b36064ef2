//! Day-over-day comparison against the most recent prior snapshot.
//!
//! "Previous" is the newest-by-mtime `result_<MMDD>.csv` whose date
//! token differs from today's. This is deliberately a filesystem
//! heuristic, not a calendar ordering (see DESIGN.md).

use crate::models::PriceRow;
use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::SystemTime;

fn result_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^result_(\d{4})\.csv$").unwrap())
}

pub fn find_previous_result_csv(history_dir: &Path, today_token: &str) -> Option<PathBuf> {
    let entries = std::fs::read_dir(history_dir).ok()?;

    let mut candidates: Vec<(SystemTime, PathBuf)> = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let Some(caps) = result_name_re().captures(name) else {
            continue;
        };
        if &caps[1] == today_token {
            continue;
        }
        let mtime = entry
            .metadata()
            .and_then(|m| m.modified())
            .unwrap_or(SystemTime::UNIX_EPOCH);
        candidates.push((mtime, path));
    }

    pick_most_recent(candidates)
}

fn pick_most_recent(candidates: Vec<(SystemTime, PathBuf)>) -> Option<PathBuf> {
    candidates
        .into_iter()
        .max_by(|a, b| a.0.cmp(&b.0))
        .map(|(_, p)| p)
}

/// Map of code → previous lowest price. Only rows whose price parses as
/// an integer are kept; everything else means "no previous value".
pub fn load_previous_prices(prev_csv_path: &Path) -> HashMap<String, i64> {
    let mut prev = HashMap::new();

    let mut reader = match csv::ReaderBuilder::new().flexible(true).from_path(prev_csv_path) {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!(error = %e, path = %prev_csv_path.display(), "previous snapshot unreadable");
            return prev;
        }
    };

    let headers = match reader.headers() {
        Ok(h) => h.clone(),
        Err(_) => return prev,
    };
    let col_code = super::catalog::find_col(&headers, &["코드"]);
    let col_price = super::catalog::find_col(&headers, &["네이버최저가"]);
    let (Some(col_code), Some(col_price)) = (col_code, col_price) else {
        return prev;
    };

    for record in reader.records().flatten() {
        let code = record.get(col_code).unwrap_or("").trim();
        if code.is_empty() {
            continue;
        }
        let raw = record.get(col_price).unwrap_or("").trim();
        if let Some(price) = parse_loose_int(raw) {
            prev.insert(code.to_string(), price);
        }
    }

    prev
}

// snapshots round-trip through spreadsheet tools, so "45000.0" happens
fn parse_loose_int(raw: &str) -> Option<i64> {
    if raw.is_empty() {
        return None;
    }
    if let Ok(v) = raw.parse::<i64>() {
        return Some(v);
    }
    raw.parse::<f64>().ok().map(|f| f as i64)
}

/// Delta exists only when a previous value does.
pub fn compute_delta(current: i64, previous: Option<i64>) -> Option<i64> {
    previous.map(|p| current - p)
}

/// Attach previous price and delta to a finished row.
pub fn apply_history(row: &mut PriceRow, prev_map: &HashMap<String, i64>) {
    let prev = prev_map.get(&row.code).copied();
    row.prev_naver = prev;
    row.delta_naver = match row.naver_price {
        Some(current) => compute_delta(current, prev),
        None => None,
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;

    #[test]
    fn test_pick_most_recent_prefers_mtime_not_token() {
        // result_0101.csv written *after* result_0102.csv wins
        let newer = SystemTime::UNIX_EPOCH + Duration::from_secs(2_000_000);
        let older = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000);
        let picked = pick_most_recent(vec![
            (older, PathBuf::from("result_0102.csv")),
            (newer, PathBuf::from("result_0101.csv")),
        ])
        .unwrap();
        assert_eq!(picked, PathBuf::from("result_0101.csv"));

        assert!(pick_most_recent(Vec::new()).is_none());
    }

    #[test]
    fn test_find_previous_excludes_today_and_non_matching() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "result_0103.csv",     // today
            "result_x.csv",        // wrong token
            "result_01015.csv",    // too many digits
            "other_0101.csv",      // wrong prefix
        ] {
            std::fs::write(dir.path().join(name), "코드,네이버최저가\n").unwrap();
        }
        assert!(find_previous_result_csv(dir.path(), "0103").is_none());

        std::fs::write(dir.path().join("result_0102.csv"), "코드,네이버최저가\n").unwrap();
        let picked = find_previous_result_csv(dir.path(), "0103").unwrap();
        assert_eq!(picked.file_name().unwrap(), "result_0102.csv");
    }

    #[test]
    fn test_load_previous_prices_parses_ints_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("result_0102.csv");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(
            "코드,상품명(영문),네이버최저가\n\
             C6X123,Jacket,45000\n\
             C7Y456,Parka,45000.0\n\
             C7Z789,Fleece,미검색\n\
             ,Missing,10000\n"
                .as_bytes(),
        )
        .unwrap();

        let prev = load_previous_prices(&path);
        assert_eq!(prev.len(), 2);
        assert_eq!(prev.get("C6X123"), Some(&45000));
        assert_eq!(prev.get("C7Y456"), Some(&45000));
        assert!(!prev.contains_key("C7Z789"));
    }

    #[test]
    fn test_delta_only_with_previous() {
        assert_eq!(compute_delta(45000, Some(47000)), Some(-2000));
        assert_eq!(compute_delta(45000, Some(45000)), Some(0));
        assert_eq!(compute_delta(45000, None), None);
    }
}
