//! Campaign link canonicalization and per-brand duplicate removal.
//! Sliders repeat slides (clones, tracking variants); the dedupe key is
//! the tracking-free href when present, else the image URL.

use crate::models::Banner;
use url::Url;

const DROP_KEYS: &[&str] = &[
    "fbclid", "gclid", "wbraid", "gbraid", "NaPm", "nacn", "sms_click", "igshid",
];

/// Strip `utm_*` and click-id query params plus the fragment. An
/// unparsable href is returned unchanged.
pub fn normalize_href(href: &str) -> String {
    let href = href.trim();
    if href.is_empty() {
        return String::new();
    }

    let Ok(mut url) = Url::parse(href) else {
        return href.to_string();
    };

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| !k.starts_with("utm_") && !DROP_KEYS.contains(&k.as_ref()))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    url.set_fragment(None);
    if kept.is_empty() {
        url.set_query(None);
    } else {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (k, v) in &kept {
            serializer.append_pair(k, v);
        }
        url.set_query(Some(&serializer.finish()));
    }

    url.to_string()
}

/// Dedupe one brand's banners in rank order, then re-rank 1..N.
pub fn dedupe_brand_rows(rows: Vec<Banner>) -> Vec<Banner> {
    if rows.is_empty() {
        return rows;
    }

    let mut rows = rows;
    rows.sort_by_key(|b| b.rank);

    let mut seen_href = std::collections::HashSet::new();
    let mut seen_img = std::collections::HashSet::new();
    let mut out: Vec<Banner> = Vec::new();

    for mut banner in rows {
        let href_clean = if banner.href_clean.is_empty() {
            normalize_href(&banner.href)
        } else {
            banner.href_clean.clone()
        };
        let img_url = banner.img_url.trim().to_string();

        if !href_clean.is_empty() {
            if !seen_href.insert(href_clean.clone()) {
                continue;
            }
        } else if !img_url.is_empty() && !seen_img.insert(img_url) {
            continue;
        }

        banner.href_clean = href_clean;
        out.push(banner);
    }

    for (i, banner) in out.iter_mut().enumerate() {
        banner.rank = (i + 1) as u32;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_href_drops_tracking_params() {
        let href = "https://shop.example/event?id=42&utm_source=naver&utm_medium=cpc&fbclid=xyz&NaPm=ct%3Da#top";
        assert_eq!(normalize_href(href), "https://shop.example/event?id=42");
    }

    #[test]
    fn test_normalize_href_without_query() {
        assert_eq!(
            normalize_href("https://shop.example/event?utm_source=naver"),
            "https://shop.example/event"
        );
        assert_eq!(normalize_href(""), "");
        assert_eq!(normalize_href("not a url"), "not a url");
    }

    fn banner(rank: u32, href: &str, img: &str) -> Banner {
        let mut b = Banner::new("2026-02-01", "tnf", "The North Face", rank, "배너".to_string());
        b.href = href.to_string();
        b.img_url = img.to_string();
        b
    }

    #[test]
    fn test_dedupe_by_clean_href_then_img() {
        let rows = vec![
            banner(1, "https://a.example/e?utm_source=x", "https://img/1.jpg"),
            banner(2, "https://a.example/e", "https://img/2.jpg"), // same campaign, tracked twice
            banner(3, "", "https://img/3.jpg"),
            banner(4, "", "https://img/3.jpg"), // same image, no link
            banner(5, "https://a.example/other", "https://img/4.jpg"),
        ];
        let out = dedupe_brand_rows(rows);
        assert_eq!(out.len(), 3);
        assert_eq!(
            out.iter().map(|b| b.rank).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert_eq!(out[0].href_clean, "https://a.example/e");
        assert_eq!(out[1].img_url, "https://img/3.jpg");
        assert_eq!(out[2].href_clean, "https://a.example/other");
    }
}
