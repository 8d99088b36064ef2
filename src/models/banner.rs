use serde::{Deserialize, Serialize};

/// Why a banner row has (or lacks) a local image file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImgStatus {
    Ok,
    Cached,
    DownloadFail,
    NoUrl,
}

impl ImgStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImgStatus::Ok => "ok",
            ImgStatus::Cached => "cached",
            ImgStatus::DownloadFail => "download_fail",
            ImgStatus::NoUrl => "no_url",
        }
    }
}

/// One captured hero banner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Banner {
    pub date: String,
    pub brand_key: String,
    pub brand_name: String,
    pub rank: u32,
    pub title: String,
    pub href: String,
    pub href_clean: String,
    pub plan_start: String,
    pub plan_end: String,
    pub img_url: String,
    pub img_local: String,
    pub img_status: ImgStatus,
    pub img_w: u32,
    pub img_h: u32,
    pub img_bytes: u64,
}

impl Banner {
    pub fn new(date: &str, brand_key: &str, brand_name: &str, rank: u32, title: String) -> Self {
        Self {
            date: date.to_string(),
            brand_key: brand_key.to_string(),
            brand_name: brand_name.to_string(),
            rank,
            title,
            href: String::new(),
            href_clean: String::new(),
            plan_start: String::new(),
            plan_end: String::new(),
            img_url: String::new(),
            img_local: String::new(),
            img_status: ImgStatus::NoUrl,
            img_w: 0,
            img_h: 0,
            img_bytes: 0,
        }
    }
}
