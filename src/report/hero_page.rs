//! Competitor hero-banner report: one tab per brand, rank-badged cards
//! with the locally saved image and campaign metadata.

use super::{escape_html, render_page, PageShell, TABS_JS};
use crate::config::{AssetPathMode, HeroConfig};
use crate::hero::BRANDS;
use crate::models::{Banner, ImgStatus};
use std::path::Path;

/// Where a card's `<img>` points, by asset mode: a `file://` URL for
/// local runs, a path relative to the report for published pages. Falls
/// back to the remote image URL when nothing was saved.
fn image_src(banner: &Banner, asset_dir: &Path, mode: AssetPathMode) -> String {
    if !banner.img_local.is_empty() {
        match mode {
            AssetPathMode::AbsoluteFile => {
                let local = asset_dir.join(&banner.img_local);
                let abs = std::fs::canonicalize(&local).unwrap_or(local);
                if let Ok(url) = url::Url::from_file_path(&abs) {
                    return url.to_string();
                }
            }
            AssetPathMode::RelativeAssets => {
                return format!("assets/{}", banner.img_local);
            }
        }
    }
    banner.img_url.clone()
}

fn period_text(banner: &Banner) -> String {
    if !banner.plan_start.is_empty() && !banner.plan_end.is_empty() {
        format!("{} ~ {}", banner.plan_start, banner.plan_end)
    } else if !banner.plan_start.is_empty() {
        banner.plan_start.clone()
    } else {
        String::new()
    }
}

fn meta_text(banner: &Banner) -> String {
    if banner.img_w > 0 && banner.img_h > 0 {
        let mut s = format!("{}×{}", banner.img_w, banner.img_h);
        if banner.img_bytes > 0 {
            s.push_str(&format!(" · {}KB", banner.img_bytes / 1024));
        }
        s
    } else if !matches!(banner.img_status, ImgStatus::Ok | ImgStatus::Cached) {
        banner.img_status.as_str().to_string()
    } else {
        String::new()
    }
}

fn render_card(banner: &Banner, asset_dir: &Path, mode: AssetPathMode) -> String {
    let img_src = image_src(banner, asset_dir, mode);
    let href = if !banner.href_clean.is_empty() {
        banner.href_clean.as_str()
    } else if !banner.href.is_empty() {
        banner.href.as_str()
    } else {
        "#"
    };
    let img_url_btn = if !banner.img_url.is_empty() {
        banner.img_url.as_str()
    } else if !img_src.is_empty() {
        img_src.as_str()
    } else {
        "#"
    };

    format!(
        r#"<div class="glass-card overflow-hidden hover:scale-[1.02] transition-transform flex flex-col">
  <div class="relative aspect-[16/9] bg-slate-100">
    <img src="{img_src}" class="w-full h-full object-cover"
         onerror="this.onerror=null; this.src='https://placehold.co/600x400?text=No+Image';">
    <span class="absolute top-4 left-4 px-3 py-1 bg-black/60 text-white text-[10px] font-bold rounded-full backdrop-blur-md">
      RANK {rank}
    </span>
  </div>
  <div class="p-6 flex flex-col flex-1">
    <h4 class="text-slate-800 font-bold text-sm mb-2 line-clamp-2 min-h-[40px]">"{title}"</h4>

    <div class="text-xs text-slate-500 mb-4">
      <div>{period}</div>
      <div class="opacity-70">{meta}</div>
    </div>

    <div class="flex gap-2 mt-auto">
      <a href="{href}" target="_blank" class="flex-1 px-4 py-2 bg-[#002d72] text-white text-[10px] font-black rounded-xl text-center hover:bg-blue-600 transition-colors">
        기획전 바로가기
      </a>
      <a href="{img_url_btn}" target="_blank" class="px-4 py-2 bg-slate-100 text-slate-500 text-[10px] font-black rounded-xl text-center hover:bg-slate-200 transition-colors">
        원본이미지
      </a>
    </div>
  </div>
</div>"#,
        img_src = escape_html(&img_src),
        rank = banner.rank,
        title = escape_html(&banner.title),
        period = escape_html(&period_text(banner)),
        meta = escape_html(&meta_text(banner)),
        href = escape_html(href),
        img_url_btn = escape_html(img_url_btn),
    )
}

const EMPTY_BRAND_CARD: &str = r#"<div class="glass-card p-8 text-slate-500">
  <div class="text-sm font-bold mb-2">데이터가 아직 없어요</div>
  <div class="text-xs">해당 브랜드의 히어로 배너를 이번 실행에서 수집하지 못했습니다. (일시적 구조 변경/팝업/봇체크 가능)</div>
</div>"#;

pub fn render(rows: &[Banner], hero: &HeroConfig, now_str: &str) -> String {
    let asset_dir = hero.asset_dir();

    let mut tab_menu = String::new();
    let mut content_area = String::new();

    let has_any = BRANDS.iter().any(|b| rows.iter().any(|r| r.brand_key == b.key));

    let mut tab_idx = 0usize;
    for brand in BRANDS {
        let mut items: Vec<&Banner> = rows.iter().filter(|r| r.brand_key == brand.key).collect();
        if items.is_empty() && has_any {
            continue;
        }
        items.sort_by_key(|b| b.rank);

        let active_class = if tab_idx == 0 {
            "bg-[#002d72] text-white shadow-lg"
        } else {
            "bg-white/50 text-slate-500 hover:bg-white"
        };
        tab_menu.push_str(&format!(
            r#"<button onclick="switchTab('{key}')" id="tab-{key}" class="tab-btn px-6 py-3 rounded-2xl font-black transition-all text-sm {class}">
  {name} <span class="ml-1 opacity-60 text-xs">{count}</span>
</button>"#,
            key = brand.key,
            class = active_class,
            name = escape_html(brand.name),
            count = items.len(),
        ));

        let cards: String = if items.is_empty() {
            EMPTY_BRAND_CARD.to_string()
        } else {
            items
                .iter()
                .map(|b| render_card(b, &asset_dir, hero.asset_path_mode))
                .collect()
        };
        content_area.push_str(&format!(
            r#"<div id="content-{key}" class="tab-content grid grid-cols-1 md:grid-cols-2 lg:grid-cols-3 gap-6" style="display: {display};">
  {cards}
</div>"#,
            key = brand.key,
            display = if tab_idx == 0 { "grid" } else { "none" },
            cards = cards,
        ));
        tab_idx += 1;
    }

    let mode_label = match hero.asset_path_mode {
        AssetPathMode::AbsoluteFile => "ABS(file://)",
        AssetPathMode::RelativeAssets => "REL(assets/)",
    };
    let dates_label = if hero.fetch_campaign_dates { "ON" } else { "OFF" };

    let body = format!(
        r#"<p class="text-slate-400 text-xs -mt-6 mb-10">로컬이미지 경로 모드: {mode} · 날짜추출: {dates}</p>

<section>
  <div class="flex flex-wrap gap-2 mb-8">{tab_menu}</div>
  <div class="min-h-[600px]">{content_area}</div>
</section>"#,
        mode = mode_label,
        dates = dates_label,
        tab_menu = tab_menu,
        content_area = content_area,
    );

    let shell = PageShell {
        title: "M-OS PRO | Competitor Hero Analysis",
        heading: "Hero Banner Analysis",
        subtitle: "주요 아웃도어 브랜드 메인 히어로 배너 실시간 모니터링",
        nav_label: "경쟁사 기획전",
        nav_icon: "fa-chart-line",
        now_str,
        sidebar_extra: String::new(),
        body,
        scripts: format!("<script>\n{}\n</script>", TABS_JS),
    };
    render_page(&shell)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn banner(brand_key: &str, rank: u32) -> Banner {
        let mut b = Banner::new("2026-02-01", brand_key, "The North Face", rank, "윈터 세일".to_string());
        b.href = "https://www.thenorthfacekorea.co.kr/event/winter".to_string();
        b.href_clean = b.href.clone();
        b.img_url = "https://cdn.example/banner.jpg".to_string();
        b.img_local = "tnf_1_ab12cd34ef.jpg".to_string();
        b.img_status = ImgStatus::Ok;
        b.img_w = 1100;
        b.img_h = 450;
        b.img_bytes = 123_000;
        b
    }

    #[test]
    fn test_relative_asset_mode_uses_assets_prefix() {
        let b = banner("tnf", 1);
        let src = image_src(&b, Path::new("reports/assets"), AssetPathMode::RelativeAssets);
        assert_eq!(src, "assets/tnf_1_ab12cd34ef.jpg");
    }

    #[test]
    fn test_absolute_mode_yields_file_url() {
        let dir = tempfile::tempdir().unwrap();
        let b = banner("tnf", 1);
        std::fs::write(dir.path().join(&b.img_local), b"jpg").unwrap();
        let src = image_src(&b, dir.path(), AssetPathMode::AbsoluteFile);
        assert!(src.starts_with("file://"), "got {}", src);
        assert!(src.ends_with("tnf_1_ab12cd34ef.jpg"));
    }

    #[test]
    fn test_missing_local_image_falls_back_to_remote() {
        let mut b = banner("tnf", 1);
        b.img_local.clear();
        let src = image_src(&b, Path::new("reports/assets"), AssetPathMode::RelativeAssets);
        assert_eq!(src, "https://cdn.example/banner.jpg");
    }

    #[test]
    fn test_meta_and_period_lines() {
        let mut b = banner("tnf", 1);
        b.plan_start = "2026-02-01".to_string();
        b.plan_end = "2026-02-10".to_string();
        assert_eq!(period_text(&b), "2026-02-01 ~ 2026-02-10");
        assert_eq!(meta_text(&b), "1100×450 · 120KB");

        b.img_w = 0;
        b.img_h = 0;
        b.img_status = ImgStatus::DownloadFail;
        assert_eq!(meta_text(&b), "download_fail");
    }

    #[test]
    fn test_render_keeps_only_collected_brands() {
        let hero = HeroConfig::default();
        let html = render(&[banner("tnf", 1), banner("tnf", 2)], &hero, "2026-02-01 10:00");
        assert!(html.contains("id=\"tab-tnf\""));
        assert!(!html.contains("id=\"tab-nepa\""));
        assert!(html.contains("RANK 1"));
        assert!(html.contains("RANK 2"));
    }

    #[test]
    fn test_render_empty_run_lists_every_brand_with_empty_state() {
        let hero = HeroConfig::default();
        let html = render(&[], &hero, "2026-02-01 10:00");
        assert!(html.contains("id=\"tab-tnf\""));
        assert!(html.contains("id=\"tab-eider\""));
        assert!(html.contains("데이터가 아직 없어요"));
    }
}
