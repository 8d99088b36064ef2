//! Banner image persistence: download once per URL per run, downscale,
//! re-encode as JPEG, and remember dimensions for the report. The cache
//! is owned by the run and passed down explicitly.

use crate::error::{AppError, Result};
use crate::net::{self, RetryPolicy};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Copy, Default)]
pub struct ImageMeta {
    pub width: u32,
    pub height: u32,
    pub bytes: u64,
}

pub enum SaveOutcome {
    Saved(String),
    Cached(String),
    DownloadFail,
    NoUrl,
}

pub struct AssetStore {
    dir: PathBuf,
    max_width: u32,
    jpg_quality: u8,
    http: reqwest::Client,
    policy: RetryPolicy,
    url_to_file: HashMap<String, String>,
    meta: HashMap<String, ImageMeta>,
}

impl AssetStore {
    pub fn new(dir: &Path, max_width: u32, jpg_quality: u8, user_agent: &str) -> Result<Self> {
        std::fs::create_dir_all(dir)
            .map_err(|e| AppError::Storage(format!("Failed to create asset directory: {}", e)))?;
        Ok(Self {
            dir: dir.to_path_buf(),
            max_width,
            jpg_quality,
            http: net::build_client(user_agent, Duration::from_secs(25))?,
            policy: RetryPolicy::new(2, Duration::from_millis(500)),
            url_to_file: HashMap::new(),
            meta: HashMap::new(),
        })
    }

    pub fn meta(&self, filename: &str) -> Option<ImageMeta> {
        self.meta.get(filename).copied()
    }

    /// Download and store one banner image. A URL seen earlier in the
    /// run reuses its file without touching the network.
    pub async fn save_image(
        &mut self,
        img_url: &str,
        brand_key: &str,
        rank: u32,
        referer: &str,
    ) -> SaveOutcome {
        if img_url.is_empty() {
            return SaveOutcome::NoUrl;
        }
        if let Some(existing) = self.url_to_file.get(img_url) {
            return SaveOutcome::Cached(existing.clone());
        }

        let filename = safe_filename(
            &format!("{}_{}_{}", brand_key, rank, short_hash(img_url)),
            ".jpg",
        );
        let out_path = self.dir.join(&filename);

        let Some(bytes) = self.download(img_url, referer).await else {
            return SaveOutcome::DownloadFail;
        };

        let (payload, width, height) = match process_image_bytes(&bytes, self.max_width, self.jpg_quality) {
            Some((jpeg, w, h)) => (jpeg, w, h),
            // undecodable payloads are kept verbatim; the report can
            // still link them even without dimensions
            None => (bytes, 0, 0),
        };

        if let Err(e) = std::fs::write(&out_path, &payload) {
            tracing::warn!(error = %e, file = %out_path.display(), "asset write failed");
            return SaveOutcome::DownloadFail;
        }

        self.meta.insert(
            filename.clone(),
            ImageMeta {
                width,
                height,
                bytes: payload.len() as u64,
            },
        );
        self.url_to_file.insert(img_url.to_string(), filename.clone());
        SaveOutcome::Saved(filename)
    }

    async fn download(&self, url: &str, referer: &str) -> Option<Vec<u8>> {
        let mut builder = self.http.get(url);
        if !referer.is_empty() {
            builder = builder.header(reqwest::header::REFERER, referer);
        }
        let resp = net::send_with_retry(builder, &self.policy).await?;
        let bytes = resp.bytes().await.ok()?;
        if bytes.is_empty() {
            return None;
        }
        Some(bytes.to_vec())
    }
}

/// Decode, downscale to `max_width` keeping aspect, and re-encode as
/// JPEG. `None` when the payload is not a decodable image.
pub fn process_image_bytes(bytes: &[u8], max_width: u32, jpg_quality: u8) -> Option<(Vec<u8>, u32, u32)> {
    let decoded = image::load_from_memory(bytes).ok()?;

    let (w, h) = (decoded.width(), decoded.height());
    let resized = if w > max_width {
        let new_h = ((h as u64 * max_width as u64) / w as u64).max(1) as u32;
        decoded.resize_exact(max_width, new_h, FilterType::Lanczos3)
    } else {
        decoded
    };

    let rgb = resized.to_rgb8();
    let mut out = Vec::new();
    let mut cursor = Cursor::new(&mut out);
    let encoder = JpegEncoder::new_with_quality(&mut cursor, jpg_quality);
    rgb.write_with_encoder(encoder).ok()?;
    Some((out, rgb.width(), rgb.height()))
}

/// Content-addressed, collision-resistant filename component.
pub fn short_hash(s: &str) -> String {
    let digest = Sha256::digest(s.as_bytes());
    hex::encode(digest)[..10].to_string()
}

pub fn safe_filename(name: &str, ext: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || ('가'..='힣').contains(&c) || ".-_".contains(c) {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_matches('_');
    let stem: String = cleaned.chars().take(110).collect();
    let ext = if ext.starts_with('.') {
        ext.to_string()
    } else {
        format!(".{}", ext)
    };
    if stem.is_empty() {
        format!("file{}", ext)
    } else {
        format!("{}{}", stem, ext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_hash_is_stable_and_short() {
        let a = short_hash("https://cdn.example/banner.jpg");
        let b = short_hash("https://cdn.example/banner.jpg");
        let c = short_hash("https://cdn.example/other.jpg");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 10);
        assert!(a.chars().all(|ch| ch.is_ascii_hexdigit()));
    }

    #[test]
    fn test_safe_filename() {
        assert_eq!(safe_filename("tnf_1_abc123", ".jpg"), "tnf_1_abc123.jpg");
        assert_eq!(safe_filename("브랜드/배너?", "jpg"), "브랜드_배너.jpg");
        assert_eq!(safe_filename("???", ".jpg"), "file.jpg");
    }

    #[test]
    fn test_process_image_downscales_wide_images() {
        let img = image::RgbImage::from_pixel(40, 20, image::Rgb([200u8, 10, 10]));
        let mut png = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();

        let (jpeg, w, h) = process_image_bytes(&png, 20, 85).unwrap();
        assert_eq!((w, h), (20, 10));
        assert!(!jpeg.is_empty());
        // output must itself be a decodable JPEG
        let back = image::load_from_memory(&jpeg).unwrap();
        assert_eq!(back.width(), 20);
    }

    #[test]
    fn test_process_image_keeps_small_images() {
        let img = image::RgbImage::from_pixel(10, 10, image::Rgb([0u8, 0, 0]));
        let mut png = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();
        let (_, w, h) = process_image_bytes(&png, 1100, 85).unwrap();
        assert_eq!((w, h), (10, 10));
    }

    #[test]
    fn test_process_image_rejects_non_images() {
        assert!(process_image_bytes(b"<html>not an image</html>", 1100, 85).is_none());
    }
}
