//! Per-product disk cache for search API responses. One JSON file per
//! sanitized product code; freshness is file mtime against a TTL. No
//! eviction and no size bound; stale entries are simply overwritten
//! after the next fetch.

use crate::error::{AppError, Result};
use crate::models::SearchItem;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    items: Vec<SearchItem>,
    saved_at: String,
}

pub struct SearchCache {
    dir: PathBuf,
    ttl: Duration,
}

impl SearchCache {
    pub fn new(dir: &Path, ttl_hours: u64) -> Self {
        Self {
            dir: dir.to_path_buf(),
            ttl: Duration::from_secs(ttl_hours * 3600),
        }
    }

    pub fn entry_path(&self, style_code: &str) -> PathBuf {
        self.dir.join(format!("{}.json", sanitize_code(style_code)))
    }

    /// A hit requires an existing, parseable entry no older than the
    /// TTL. Everything else (missing, stale, corrupt) is a miss.
    pub fn load(&self, style_code: &str) -> Option<Vec<SearchItem>> {
        let path = self.entry_path(style_code);

        let modified = std::fs::metadata(&path).and_then(|m| m.modified()).ok()?;
        if !is_fresh(modified, SystemTime::now(), self.ttl) {
            return None;
        }

        let contents = std::fs::read_to_string(&path).ok()?;
        let entry: CacheEntry = serde_json::from_str(&contents).ok()?;
        Some(entry.items)
    }

    pub fn store(&self, style_code: &str, items: &[SearchItem]) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .map_err(|e| AppError::Storage(format!("Failed to create cache directory: {}", e)))?;

        let entry = CacheEntry {
            items: items.to_vec(),
            saved_at: Utc::now().to_rfc3339(),
        };
        let json = serde_json::to_string(&entry)?;
        std::fs::write(self.entry_path(style_code), json)
            .map_err(|e| AppError::Storage(format!("Failed to write cache entry: {}", e)))?;
        Ok(())
    }
}

/// Cache keys must be filesystem-safe.
pub fn sanitize_code(style_code: &str) -> String {
    style_code
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect()
}

fn is_fresh(modified: SystemTime, now: SystemTime, ttl: Duration) -> bool {
    match now.duration_since(modified) {
        Ok(age) => age <= ttl,
        // mtime in the future: treat as fresh rather than refetch-looping
        Err(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::UNIX_EPOCH;

    fn items() -> Vec<SearchItem> {
        vec![SearchItem {
            title: "ABC123 자켓".to_string(),
            link: "https://shopping.example/1".to_string(),
            image: "https://img.example/1.jpg".to_string(),
            lprice: "45000".to_string(),
            mall_name: "어느몰".to_string(),
        }]
    }

    #[test]
    fn test_sanitize_code() {
        assert_eq!(sanitize_code("C6X123 / 백팩"), "C6X123_____");
        assert_eq!(sanitize_code("  C7-ABC_1  "), "C7-ABC_1");
    }

    #[test]
    fn test_store_then_load_hits() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SearchCache::new(dir.path(), 12);

        assert!(cache.load("C6X123").is_none());
        cache.store("C6X123", &items()).unwrap();

        let loaded = cache.load("C6X123").unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].lprice, "45000");
    }

    #[test]
    fn test_corrupt_entry_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SearchCache::new(dir.path(), 12);
        std::fs::write(cache.entry_path("C6X123"), "not json").unwrap();
        assert!(cache.load("C6X123").is_none());
    }

    #[test]
    fn test_ttl_expiry_by_age() {
        let ttl = Duration::from_secs(12 * 3600);
        let written = UNIX_EPOCH + Duration::from_secs(1_000_000);

        // 13 hours later: stale
        let now = written + Duration::from_secs(13 * 3600);
        assert!(!is_fresh(written, now, ttl));

        // 11 hours later: fresh
        let now = written + Duration::from_secs(11 * 3600);
        assert!(is_fresh(written, now, ttl));
    }
}
