use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const CONFIG_FILE: &str = "config.toml";

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub naver: NaverConfig,
    pub hero: HeroConfig,
    pub signal: SignalConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NaverConfig {
    pub client_id: String,
    pub client_secret: String,
    pub api_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HeroConfig {
    pub out_dir: PathBuf,
    pub headless: bool,
    pub nav_timeout_ms: u64,
    pub wait_after_goto_ms: u64,
    pub max_img_width: u32,
    pub jpg_quality: u8,
    pub fetch_campaign_dates: bool,
    pub date_fetch_timeout_ms: u64,
    pub user_agent: String,
    pub asset_path_mode: AssetPathMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    pub base_url: String,
    pub gallery_id: String,
    pub max_pages: u32,
    pub target_days: i64,
    pub user_agent: String,
}

/// How the hero report references downloaded banner images.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AssetPathMode {
    /// `file://` URLs pointing at the local asset directory.
    AbsoluteFile,
    /// `assets/` paths relative to the report, for published pages.
    RelativeAssets,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            naver: NaverConfig::default(),
            hero: HeroConfig::default(),
            signal: SignalConfig::default(),
        }
    }
}

impl Default for NaverConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            api_url: "https://openapi.naver.com/v1/search/shop.json".to_string(),
        }
    }
}

impl Default for HeroConfig {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("reports"),
            headless: true,
            nav_timeout_ms: 60_000,
            wait_after_goto_ms: 1_800,
            max_img_width: 1_100,
            jpg_quality: 85,
            fetch_campaign_dates: true,
            date_fetch_timeout_ms: 12_000,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            asset_path_mode: AssetPathMode::AbsoluteFile,
        }
    }
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            base_url: "https://gall.dcinside.com".to_string(),
            gallery_id: "climbing".to_string(),
            max_pages: 50,
            target_days: 7,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl Config {
    /// Load configuration: built-in defaults, overlaid by `config.toml`
    /// when present, overlaid by environment variables.
    pub fn load() -> Result<Self> {
        let mut config = match std::fs::read_to_string(CONFIG_FILE) {
            Ok(contents) => toml::from_str::<Config>(&contents)
                .map_err(|e| AppError::Configuration(format!("Failed to parse {}: {}", CONFIG_FILE, e)))?,
            Err(_) => Config::default(),
        };
        config.apply_env();
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Some(v) = env_var("NAVER_CLIENT_ID") {
            self.naver.client_id = v;
        }
        if let Some(v) = env_var("NAVER_CLIENT_SECRET") {
            self.naver.client_secret = v;
        }

        if let Some(v) = env_var("OUT_DIR") {
            self.hero.out_dir = PathBuf::from(v);
        }
        if let Some(v) = env_var("HEADLESS") {
            self.hero.headless = v != "0";
        }
        if let Some(v) = env_var("NAV_TIMEOUT_MS") {
            self.hero.nav_timeout_ms = v.parse().unwrap_or(self.hero.nav_timeout_ms);
        }
        if let Some(v) = env_var("WAIT_AFTER_GOTO_MS") {
            self.hero.wait_after_goto_ms = v.parse().unwrap_or(self.hero.wait_after_goto_ms);
        }
        if let Some(v) = env_var("MAX_IMG_WIDTH") {
            self.hero.max_img_width = v.parse().unwrap_or(self.hero.max_img_width);
        }
        if let Some(v) = env_var("JPG_QUALITY") {
            self.hero.jpg_quality = v.parse().unwrap_or(self.hero.jpg_quality);
        }
        if let Some(v) = env_var("FETCH_CAMPAIGN_DATES") {
            self.hero.fetch_campaign_dates = v != "0";
        }
        if let Some(v) = env_var("DATE_FETCH_TIMEOUT_MS") {
            self.hero.date_fetch_timeout_ms = v.parse().unwrap_or(self.hero.date_fetch_timeout_ms);
        }
        if let Some(v) = env_var("USER_AGENT") {
            self.hero.user_agent = v.clone();
            self.signal.user_agent = v;
        }
        self.hero.asset_path_mode = resolve_asset_path_mode(
            env_var("HTML_USE_ABSOLUTE_FILE_URL").as_deref(),
            env_var("GITHUB_ACTIONS").as_deref(),
        );

        if let Some(v) = env_var("SIGNAL_MAX_PAGES") {
            self.signal.max_pages = v.parse().unwrap_or(self.signal.max_pages);
        }
        if let Some(v) = env_var("SIGNAL_TARGET_DAYS") {
            self.signal.target_days = v.parse().unwrap_or(self.signal.target_days);
        }
    }

    pub fn validate(&self) -> std::result::Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if !self.naver.api_url.starts_with("http://") && !self.naver.api_url.starts_with("https://") {
            errors.push("Invalid search API URL format".to_string());
        }

        if !self.signal.base_url.starts_with("http://") && !self.signal.base_url.starts_with("https://") {
            errors.push("Invalid gallery base URL format".to_string());
        }

        if self.hero.max_img_width == 0 {
            errors.push("Max image width must be greater than 0".to_string());
        }

        if self.hero.jpg_quality == 0 || self.hero.jpg_quality > 100 {
            errors.push("JPEG quality must be in 1..=100".to_string());
        }

        if self.hero.nav_timeout_ms == 0 {
            errors.push("Navigation timeout must be greater than 0".to_string());
        }

        if self.signal.max_pages == 0 {
            errors.push("Signal max pages must be greater than 0".to_string());
        }

        if self.signal.target_days <= 0 {
            errors.push("Signal target days must be greater than 0".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl NaverConfig {
    /// The search API cannot run without credentials; this is the one
    /// configuration problem that aborts a run outright.
    pub fn require_credentials(&self) -> Result<()> {
        println!(
            "🔑 NAVER_CLIENT_ID: {}",
            if self.client_id.is_empty() { "MISSING" } else { "SET" }
        );
        println!(
            "🔑 NAVER_CLIENT_SECRET: {}",
            if self.client_secret.is_empty() { "MISSING" } else { "SET" }
        );
        if self.client_id.is_empty() || self.client_secret.is_empty() {
            return Err(AppError::Configuration(
                "NAVER_CLIENT_ID / NAVER_CLIENT_SECRET must be set".to_string(),
            ));
        }
        Ok(())
    }
}

impl HeroConfig {
    pub fn asset_dir(&self) -> PathBuf {
        self.out_dir.join("assets")
    }

    pub fn snapshot_dir(&self) -> PathBuf {
        self.out_dir.join("snapshots")
    }
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Explicit override wins; otherwise CI runs get relative paths so the
/// published report keeps working, local runs get `file://` URLs.
fn resolve_asset_path_mode(explicit: Option<&str>, ci: Option<&str>) -> AssetPathMode {
    if let Some(v) = explicit {
        return if v == "0" {
            AssetPathMode::RelativeAssets
        } else {
            AssetPathMode::AbsoluteFile
        };
    }
    match ci.map(|v| v.to_ascii_lowercase()) {
        Some(v) if v == "true" || v == "1" || v == "yes" => AssetPathMode::RelativeAssets,
        _ => AssetPathMode::AbsoluteFile,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.naver.api_url, "https://openapi.naver.com/v1/search/shop.json");
        assert_eq!(config.hero.max_img_width, 1100);
        assert_eq!(config.hero.jpg_quality, 85);
        assert!(config.hero.headless);
        assert_eq!(config.signal.max_pages, 50);
        assert_eq!(config.signal.target_days, 7);
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.hero.jpg_quality = 0;
        assert!(config.validate().is_err());

        config = Config::default();
        config.signal.base_url = "gall.dcinside.com".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_asset_path_mode_resolution() {
        // explicit flag wins over the CI heuristic
        assert_eq!(
            resolve_asset_path_mode(Some("0"), Some("true")),
            AssetPathMode::RelativeAssets
        );
        assert_eq!(
            resolve_asset_path_mode(Some("1"), Some("true")),
            AssetPathMode::AbsoluteFile
        );
        // CI default
        assert_eq!(
            resolve_asset_path_mode(None, Some("true")),
            AssetPathMode::RelativeAssets
        );
        assert_eq!(resolve_asset_path_mode(None, None), AssetPathMode::AbsoluteFile);
    }

    #[test]
    fn test_missing_credentials_are_fatal() {
        let naver = NaverConfig::default();
        assert!(naver.require_credentials().is_err());

        let naver = NaverConfig {
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
            ..NaverConfig::default()
        };
        assert!(naver.require_credentials().is_ok());
    }
}
