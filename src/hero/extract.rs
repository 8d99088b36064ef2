//! Hero banner extraction. Each site mode runs one JS snippet in the
//! page and returns raw `{href, img, alt, txt}` candidates; everything
//! downstream (URL absolutization, titles, dedupe, image download) is
//! shared Rust.

use crate::error::{AppError, Result};
use crate::hero::ExtractMode;
use chromiumoxide::page::Page;
use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;
use url::Url;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawCandidate {
    pub href: String,
    pub img: String,
    pub alt: String,
    pub txt: String,
}

/// Typed result of one extraction step. A site that yields nothing is
/// not an error; a broken evaluation is.
pub enum ExtractOutcome {
    Found(Vec<RawCandidate>),
    Empty,
    Failed(String),
}

/// Image-URL discovery shared by every snippet: inline and computed
/// background-image, poster/data attributes, srcset, lazy img attrs,
/// then a bounded descendant scan.
const JS_HELPERS: &str = r#"
const fromCss = (css) => {
    if (!css || !css.includes('url(')) return '';
    let s = css.split('url(')[1].split(')')[0].trim();
    return s.replace(/^['"]|['"]$/g, '');
};
const pickImg = (el) => {
    if (!el) return '';
    let u = fromCss(el.getAttribute ? (el.getAttribute('style') || '') : '');
    if (u) return u;
    const poster = el.getAttribute
        ? (el.getAttribute('poster') || el.getAttribute('data-poster') || el.getAttribute('data-poster-url') || '')
        : '';
    if (poster) return poster;
    for (const attr of ['data-bg', 'data-background', 'data-image', 'data-img', 'data-src', 'data-original']) {
        const v = el.getAttribute ? (el.getAttribute(attr) || '').trim() : '';
        if (v && !v.startsWith('data:')) return v;
    }
    try { u = fromCss(getComputedStyle(el).backgroundImage); if (u) return u; } catch (e) {}
    const source = el.querySelector ? el.querySelector('picture source[srcset], source[srcset]') : null;
    if (source) {
        const first = (source.getAttribute('srcset') || '').split(',')[0].trim().split(' ')[0];
        if (first) return first;
    }
    const img = el.querySelector ? el.querySelector('img') : null;
    if (img) {
        for (const attr of ['src', 'data-src', 'data-lazy', 'data-original', 'data-img', 'data-image']) {
            const v = (img.getAttribute(attr) || '').trim();
            if (v && !v.startsWith('data:')) return v;
        }
        const first = (img.getAttribute('srcset') || '').split(',')[0].trim().split(' ')[0];
        if (first) return first;
    }
    const bgEl = el.querySelector ? el.querySelector("[style*='background-image']") : null;
    if (bgEl) { u = fromCss(bgEl.getAttribute('style') || ''); if (u) return u; }
    const nodes = el.querySelectorAll ? el.querySelectorAll('div, span, a, section, figure') : [];
    for (let i = 0; i < Math.min(nodes.length, 60); i++) {
        try { u = fromCss(getComputedStyle(nodes[i]).backgroundImage); if (u) return u; } catch (e) {}
    }
    return '';
};
const norm = (s) => (s || '').replace(/\s+/g, ' ').trim();
"#;

const JS_TNF_SLICK: &str = r#"
const root = document.querySelector('[data-module-main-slick-slider]')
    || document.querySelector('.st_component-slider')
    || document;
const slides = Array.from(root.querySelectorAll('.slide-item.slick-slide[data-slick-index]'))
    .filter(el => !el.classList.contains('slick-cloned')
        && (el.getAttribute('data-slick-index') || '0') !== '-1');
return slides.map(el => {
    const a = el.querySelector('a[href]');
    const imgEl = el.querySelector('img[alt]');
    const txtEl = el.querySelector('.img-title-wrap, .slider-contents, h1, h2, h3, p, strong');
    return {
        href: a ? (a.getAttribute('href') || '') : '',
        img: pickImg(el),
        alt: imgEl ? (imgEl.getAttribute('alt') || '') : '',
        txt: norm(txtEl ? txtEl.innerText : '')
    };
});
"#;

const JS_BLACKYAK_SWIPER: &str = r#"
const root = document.querySelector('#main_banner_section') || document;
const anchors = Array.from(root.querySelectorAll(
        '.MAIN-VISUAL-SWIPER .swiper-slide a.item, .MAIN-VISUAL-SWIPER .swiper-slide a'))
    .filter(a => a.querySelector('img'));
return anchors.map(a => {
    const t2 = a.querySelector('.TEXT-2');
    const t3 = a.querySelector('.TEXT-3');
    const imgEl = a.querySelector('img');
    return {
        href: a.getAttribute('href') || '',
        img: pickImg(a),
        alt: imgEl ? (imgEl.getAttribute('alt') || '') : '',
        txt: norm((t2 ? t2.innerText : '') + ' ' + (t3 ? t3.innerText : ''))
    };
});
"#;

const JS_DISCOVERY_SWIPER: &str = r#"
const root = document.querySelector('.click_banner_main');
if (!root) return [];
const slides = Array.from(root.querySelectorAll('div.swiper-slide')).slice(0, 24);
const cands = slides.map(sl => {
    const a = sl.querySelector('a[href]');
    const nameEl = sl.querySelector('.click_banner_main_name');
    const idxAttr = (sl.getAttribute('data-swiper-slide-index') || '').trim();
    const idx = /^\d+$/.test(idxAttr) ? parseInt(idxAttr, 10) : 9999;
    return {
        idx,
        href: a ? (a.getAttribute('href') || '') : '',
        img: pickImg(sl),
        alt: '',
        txt: norm(nameEl ? nameEl.innerText : sl.innerText)
    };
}).filter(c => c.href || c.img);
cands.sort((a, b) => a.idx - b.idx);
return cands.map(c => ({href: c.href, img: c.img, alt: c.alt, txt: c.txt}));
"#;

const JS_NEPA_STATIC: &str = r#"
const roots = [document];
document.querySelectorAll('iframe').forEach(f => {
    try { if (f.contentDocument) roots.push(f.contentDocument); } catch (e) {}
});
const out = [];
for (const doc of roots) {
    for (let i = 1; i < 30; i++) {
        const pad = i < 10 ? ('0' + i) : String(i);
        const box = doc.querySelector('#pcContents .promo-banner' + pad + '.promo-banner')
            || doc.querySelector('#pcContents .promo-banner' + i + '.promo-banner')
            || doc.querySelector('.promo-banner' + pad + '.promo-banner')
            || doc.querySelector('.promo-banner' + i + '.promo-banner');
        if (!box) continue;
        const a = box.querySelector('a[href]');
        const imgEl = box.querySelector('img[alt]');
        out.push({
            href: a ? (a.getAttribute('href') || '') : '',
            img: pickImg(box),
            alt: imgEl ? (imgEl.getAttribute('alt') || '') : '',
            txt: norm(box.innerText)
        });
    }
    if (out.length) break;
}
return out.filter(c => c.href || c.img);
"#;

const JS_PATAGONIA_HERO: &str = r#"
const vw = window.innerWidth || 1440;
let best = null;
let bestArea = 0;
const nodes = Array.from(document.querySelectorAll('section, div')).slice(0, 220);
for (const el of nodes) {
    const r = el.getBoundingClientRect();
    if (!r || r.width <= 0 || r.height <= 0) continue;
    const cs = getComputedStyle(el);
    if (cs.display === 'none' || cs.visibility === 'hidden') continue;
    if (r.top < -80 || r.top > 520) continue;
    if (r.width < vw * 0.75 || r.height < 320) continue;
    const img = pickImg(el);
    if (!img) continue;
    const area = r.width * r.height;
    if (area > bestArea) {
        bestArea = area;
        const tEl = el.querySelector('h1,h2,h3,strong');
        const a = el.querySelector('a[href]');
        const imgEl = el.querySelector('img[alt]');
        best = {
            href: a ? (a.getAttribute('href') || '') : '',
            img,
            alt: imgEl ? (imgEl.getAttribute('alt') || '') : '',
            txt: norm(tEl ? tEl.innerText : '')
        };
    }
}
return best ? [best] : [];
"#;

const JS_GENERIC_TOP: &str = r#"
const vw = window.innerWidth || 1440;
const out = [];
const nodes = Array.from(document.querySelectorAll('a, section, div')).slice(0, 420);
for (const el of nodes) {
    const r = el.getBoundingClientRect();
    if (!r || r.width <= 0 || r.height <= 0) continue;
    const cs = getComputedStyle(el);
    if (cs.display === 'none' || cs.visibility === 'hidden') continue;
    if (r.top < -120 || r.top > 1400) continue;
    if (r.width < vw * 0.55 || r.height < 180) continue;
    const img = pickImg(el);
    let href = '';
    if (el.tagName.toLowerCase() === 'a') {
        href = el.getAttribute('href') || '';
    } else {
        const a = el.querySelector('a[href]');
        if (a) href = a.getAttribute('href') || '';
    }
    if (!img && !href) continue;
    const tEl = el.querySelector('h1,h2,h3,strong,p');
    const imgEl = el.querySelector('img[alt]');
    out.push({
        href,
        img,
        alt: imgEl ? (imgEl.getAttribute('alt') || '') : '',
        txt: norm(tEl ? tEl.innerText : '')
    });
}
return out;
"#;

const JS_CLOSE_POPUPS: &str = r#"
(() => {
    const texts = ['닫기', 'Close', '확인', '동의', '오늘 하루 보지 않기'];
    const sels = ["button[aria-label*='close' i]", "button[aria-label*='닫기']",
        '.modal .close', '.popup .close', '.layer .close', '.btn-close'];
    let clicked = 0;
    document.querySelectorAll('button').forEach(b => {
        const t = (b.innerText || '').trim();
        if (t && texts.some(x => t.includes(x)) && b.offsetParent !== null) {
            try { b.click(); clicked++; } catch (e) {}
        }
    });
    for (const s of sels) {
        document.querySelectorAll(s).forEach(el => {
            if (el.offsetParent !== null) { try { el.click(); clicked++; } catch (e) {} }
        });
    }
    return clicked;
})()
"#;

fn snippet_for(mode: ExtractMode) -> &'static str {
    match mode {
        ExtractMode::TnfSlick => JS_TNF_SLICK,
        ExtractMode::BlackyakSwiper => JS_BLACKYAK_SWIPER,
        ExtractMode::DiscoverySwiper => JS_DISCOVERY_SWIPER,
        ExtractMode::NepaStatic => JS_NEPA_STATIC,
        ExtractMode::PatagoniaHero => JS_PATAGONIA_HERO,
        ExtractMode::Generic => JS_GENERIC_TOP,
    }
}

pub async fn extract_candidates(page: &Page, mode: ExtractMode) -> ExtractOutcome {
    match eval_candidates(page, snippet_for(mode)).await {
        Ok(cands) if cands.is_empty() => ExtractOutcome::Empty,
        Ok(cands) => ExtractOutcome::Found(cands),
        Err(e) => ExtractOutcome::Failed(e.to_string()),
    }
}

async fn eval_candidates(page: &Page, body: &str) -> Result<Vec<RawCandidate>> {
    let script = format!("() => {{\n{}\n{}\n}}", JS_HELPERS, body);
    let result = page
        .evaluate(script)
        .await
        .map_err(|e| AppError::Scrape(format!("Extraction script failed: {}", e)))?;
    let value: serde_json::Value = result
        .into_value()
        .map_err(|e| AppError::Scrape(format!("Extraction result unreadable: {}", e)))?;
    let candidates: Vec<RawCandidate> = serde_json::from_value(value)?;
    Ok(candidates)
}

/// Best-effort dismissal of cookie/notice layers before extraction.
pub async fn close_common_popups(page: &Page) {
    for _ in 0..2 {
        if page.evaluate(JS_CLOSE_POPUPS).await.is_err() {
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(250)).await;
    }
}

/// Lazy sliders only materialize images after some scroll movement.
pub async fn scroll_nudge(page: &Page) {
    for (y, wait_ms) in [(150, 250u64), (600, 300), (0, 250)] {
        if page
            .evaluate(format!("window.scrollTo(0, {});", y))
            .await
            .is_err()
        {
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(wait_ms)).await;
    }
}

// --- title & URL helpers ----------------------------------------------

const NAV_WORDS: &[&str] = &["next", "prev", "이전", "다음", "닫기"];

const JUNK_TOKENS: &[&str] = &[
    "phpthumb", "src=/uploads", "w=1200", "q=80", "f=webp", ".jpg", ".jpeg", ".png", ".webp",
    "data:image", "main_mc", "kakaotalk_", "img_", "banner_", "thumb",
];

const FALLBACK_TITLE: &str = "메인 배너";

fn ws_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").unwrap())
}

fn hashlike_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-f0-9_\-]{18,}$").unwrap())
}

pub fn norm_ws(s: &str) -> String {
    ws_re().replace_all(s.trim(), " ").into_owned()
}

/// File-name-ish or hash-ish strings make useless campaign titles.
pub fn is_junk_title(t: &str) -> bool {
    let tl = t.trim().to_lowercase();
    if tl.is_empty() {
        return true;
    }
    if JUNK_TOKENS.iter().any(|tok| tl.contains(tok)) {
        return true;
    }
    hashlike_re().is_match(&tl)
}

pub fn clean_campaign_title(t: &str) -> String {
    let t = norm_ws(t);
    let t = t.trim_matches(|c| c == '"' || c == '\'').trim();
    t.chars().take(90).collect()
}

/// Pick the most title-like candidate: drop nav words and one-char
/// strings, prefer non-junk, then the longest.
pub fn choose_title(candidates: &[&str]) -> String {
    let normalized: Vec<String> = candidates
        .iter()
        .map(|c| norm_ws(c))
        .filter(|c| c.chars().count() > 1)
        .filter(|c| !NAV_WORDS.contains(&c.to_lowercase().as_str()))
        .collect();

    let mut non_junk: Vec<&String> = normalized.iter().filter(|c| !is_junk_title(c)).collect();
    if !non_junk.is_empty() {
        non_junk.sort_by(|a, b| {
            (b.chars().count(), b.as_str()).cmp(&(a.chars().count(), a.as_str()))
        });
        return clean_campaign_title(non_junk[0]);
    }

    let mut any: Vec<&String> = normalized.iter().collect();
    if !any.is_empty() {
        any.sort_by(|a, b| (b.chars().count(), b.as_str()).cmp(&(a.chars().count(), a.as_str())));
        return clean_campaign_title(any[0]);
    }

    FALLBACK_TITLE.to_string()
}

/// Absolutize a scraped URL against the page URL. Protocol-relative
/// URLs get https.
pub fn abs_url(base: &str, url: &str) -> String {
    let url = url.trim();
    if url.is_empty() {
        return String::new();
    }
    if let Some(rest) = url.strip_prefix("//") {
        return format!("https://{}", rest);
    }
    match Url::parse(base) {
        Ok(base) => base
            .join(url)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| url.to_string()),
        Err(_) => url.to_string(),
    }
}
