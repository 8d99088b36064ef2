//! Campaign period extraction: scan a banner's target page text for a
//! date range. Korean retail pages write these a few common ways.

use crate::error::Result;
use crate::hero::session::BrowserSession;
use regex::Regex;
use std::sync::OnceLock;
use std::time::Duration;

// 2026.02.01 ~ 2026.02.10
fn full_range_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(\d{4}[./-]\d{1,2}[./-]\d{1,2})\s*(?:~|∼|–|-|—)\s*(\d{4}[./-]\d{1,2}[./-]\d{1,2})",
        )
        .unwrap()
    })
}

// 2026.02.01 ~ 02.10 (end year omitted)
fn elided_year_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(\d{4})[./-](\d{1,2})[./-](\d{1,2})\s*(?:~|∼|–|-|—)\s*(\d{1,2})[./-](\d{1,2})")
            .unwrap()
    })
}

// 2026-02-01부터 2026-02-10까지
fn korean_range_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(\d{4}[./-]\d{1,2}[./-]\d{1,2}).{0,12}?(?:부터|~|∼|–|-|—).{0,12}?(\d{4}[./-]\d{1,2}[./-]\d{1,2})",
        )
        .unwrap()
    })
}

fn ws_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").unwrap())
}

fn norm_date(s: &str) -> String {
    let s = s.trim().replace(['/', '.'], "-");
    let parts: Vec<&str> = s.splitn(3, '-').collect();
    if parts.len() != 3 {
        return s;
    }
    match (parts[1].parse::<u32>(), parts[2].parse::<u32>()) {
        (Ok(m), Ok(d)) => format!("{}-{:02}-{:02}", parts[0], m, d),
        _ => s,
    }
}

/// Returns (start, end), empty strings when nothing matches.
pub fn extract_date_range_from_text(text: &str) -> (String, String) {
    let t = ws_re().replace_all(text, " ");

    if let Some(caps) = full_range_re().captures(&t) {
        return (norm_date(&caps[1]), norm_date(&caps[2]));
    }

    if let Some(caps) = elided_year_re().captures(&t) {
        let year = &caps[1];
        let (m1, d1) = (&caps[2], &caps[3]);
        let (m2, d2) = (&caps[4], &caps[5]);
        let start = norm_date(&format!("{}-{}-{}", year, m1, d1));
        let end = norm_date(&format!("{}-{}-{}", year, m2, d2));
        return (start, end);
    }

    if let Some(caps) = korean_range_re().captures(&t) {
        return (norm_date(&caps[1]), norm_date(&caps[2]));
    }

    (String::new(), String::new())
}

/// Open the campaign page and look for a period in the body text, then
/// in the raw markup (some pages keep it in meta/ld+json only).
pub async fn fetch_campaign_dates(
    session: &BrowserSession,
    href: &str,
    timeout_ms: u64,
) -> Result<(String, String)> {
    if href.is_empty() {
        return Ok((String::new(), String::new()));
    }

    let page = session
        .open_with_timeout(href, Duration::from_millis(timeout_ms))
        .await?;

    let body_text: String = page
        .evaluate("document.body ? document.body.innerText : ''")
        .await
        .ok()
        .and_then(|r| r.into_value().ok())
        .unwrap_or_default();

    let (mut start, mut end) = extract_date_range_from_text(&body_text);

    if start.is_empty() {
        let html: String = page
            .evaluate("document.documentElement.outerHTML")
            .await
            .ok()
            .and_then(|r| r.into_value().ok())
            .unwrap_or_default();
        let (s2, e2) = extract_date_range_from_text(&html);
        if !s2.is_empty() {
            start = s2;
            end = e2;
        }
    }

    let _ = page.close().await;
    Ok((start, end))
}
