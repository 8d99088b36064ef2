//! VOC report: hot-keyword chips plus per-brand tabs of mention cards.
//! Brands with no mentions are omitted; a run that collected nothing
//! still renders an explanatory empty state.

use super::{escape_html, render_page, PageShell, TABS_JS};
use crate::models::SignalReport;

const TITLE_PREVIEW_CHARS: usize = 25;

fn shorten_title(title: &str) -> String {
    let mut out: String = title.chars().take(TITLE_PREVIEW_CHARS).collect();
    if title.chars().count() > TITLE_PREVIEW_CHARS {
        out.push_str("...");
    }
    out
}

fn keyword_chips(report: &SignalReport) -> String {
    report
        .top_keywords
        .iter()
        .map(|(word, count)| {
            format!(
                r#"<span class="px-4 py-2 rounded-full bg-white/50 border border-white text-sm font-bold text-slate-600"># {} <span class="text-blue-600">{}</span></span>"#,
                escape_html(word),
                count
            )
        })
        .collect()
}

const EMPTY_TAB_NOTICE: &str = r#"<div class="px-6 py-4 rounded-2xl bg-white/60 border border-white text-slate-500 font-bold">
  최근 기간 내 브랜드 언급 데이터가 없습니다.
</div>"#;

const EMPTY_CONTENT_CARD: &str = r#"<div class="glass-card p-10">
  <div class="text-slate-800 font-black text-xl mb-2">데이터 없음</div>
  <div class="text-slate-500 font-medium">
    최근 수집 기간 동안 해당 브랜드 키워드가 포함된 문장이 발견되지 않았습니다.<br/>
    갤러리/기간/브랜드 리스트를 조정해보세요.
  </div>
</div>"#;

pub fn render(report: &SignalReport, now_str: &str) -> String {
    let active: Vec<_> = report
        .brands
        .iter()
        .filter(|(_, mentions)| !mentions.is_empty())
        .collect();

    let (tab_menu, content_area) = if active.is_empty() {
        (EMPTY_TAB_NOTICE.to_string(), EMPTY_CONTENT_CARD.to_string())
    } else {
        let mut tab_menu = String::new();
        let mut content_area = String::new();

        for (i, (brand, mentions)) in active.iter().enumerate() {
            let active_class = if i == 0 {
                "bg-[#002d72] text-white shadow-lg"
            } else {
                "bg-white/50 text-slate-500 hover:bg-white"
            };
            tab_menu.push_str(&format!(
                r#"<button onclick="switchTab('{brand}')" id="tab-{brand}" class="tab-btn px-6 py-3 rounded-2xl font-black transition-all text-sm {class}">
  {brand} <span class="ml-1 opacity-60 text-xs">{count}</span>
</button>"#,
                brand = escape_html(brand),
                class = active_class,
                count = mentions.len(),
            ));

            let cards: String = mentions
                .iter()
                .map(|m| {
                    format!(
                        r#"<div class="glass-card p-6 border-white/80 hover:scale-[1.01] transition-transform">
  <p class="text-slate-700 font-medium leading-relaxed mb-5 italic">" {text} "</p>
  <div class="flex items-center justify-between pt-4 border-t border-slate-100">
    <span class="text-[10px] font-bold text-slate-400 uppercase tracking-widest">글제목: {title}</span>
    <a href="{url}" target="_blank" class="px-4 py-2 bg-[#002d72] text-white text-[10px] font-black rounded-xl hover:bg-blue-600 transition-colors flex items-center gap-2">
      원문 링크 열기 <i class="fa-solid fa-arrow-up-right"></i>
    </a>
  </div>
</div>"#,
                        text = escape_html(&m.text),
                        title = escape_html(&shorten_title(&m.title)),
                        url = escape_html(&m.url),
                    )
                })
                .collect();

            content_area.push_str(&format!(
                r#"<div id="content-{brand}" class="tab-content grid grid-cols-1 md:grid-cols-2 lg:grid-cols-3 gap-6" style="display: {display};">
  {cards}
</div>"#,
                brand = escape_html(brand),
                display = if i == 0 { "grid" } else { "none" },
                cards = cards,
            ));
        }
        (tab_menu, content_area)
    };

    let body = format!(
        r#"<section class="glass-card p-10 mb-12">
  <h3 class="text-[10px] font-black uppercase tracking-[0.3em] text-blue-600 mb-8 flex items-center gap-2">
    <i class="fa-solid fa-hashtag"></i> Hot Keywords
  </h3>
  <div class="flex flex-wrap gap-3">{chips}</div>
</section>

<section>
  <div class="flex flex-wrap gap-2 mb-8">{tab_menu}</div>
  <div class="min-h-[500px]">{content_area}</div>
</section>"#,
        chips = keyword_chips(report),
        tab_menu = tab_menu,
        content_area = content_area,
    );

    let shell = PageShell {
        title: "Columbia M-OS Pro | External Signal (VOC)",
        heading: "VOC Real-time Analysis",
        subtitle: "디시인사이드 등산 갤러리 브랜드 언급 데이터",
        nav_label: "Live VOC 분석",
        nav_icon: "fa-tower-broadcast",
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
    use crate::models::Mention;

    fn report_with(brand: &str, texts: &[&str]) -> SignalReport {
        SignalReport {
            brands: vec![
                (
                    brand.to_string(),
                    texts
                        .iter()
                        .map(|t| Mention {
                            text: t.to_string(),
                            url: "https://gall.example/view/1".to_string(),
                            title: "등산화 추천 좀 해주세요 제발 부탁드립니다".to_string(),
                        })
                        .collect(),
                ),
                ("호카".to_string(), Vec::new()),
            ],
            top_keywords: vec![("바람막이".to_string(), 3), ("세일".to_string(), 2)],
        }
    }

    #[test]
    fn test_shorten_title_counts_chars_not_bytes() {
        assert_eq!(shorten_title("짧은 제목"), "짧은 제목");
        let long = "가".repeat(30);
        let short = shorten_title(&long);
        assert_eq!(short.chars().count(), TITLE_PREVIEW_CHARS + 3);
        assert!(short.ends_with("..."));
    }

    #[test]
    fn test_render_omits_mentionless_brands() {
        let html = render(
            &report_with("컬럼비아", &["컬럼비아 바람막이 요즘 할인하더라"]),
            "2026-02-01 10:00",
        );
        assert!(html.contains("id=\"tab-컬럼비아\""));
        assert!(!html.contains("id=\"tab-호카\""));
        assert!(html.contains("컬럼비아 바람막이 요즘 할인하더라"));
        assert!(html.contains("# 바람막이"));
    }

    #[test]
    fn test_render_empty_report_has_empty_state() {
        let report = SignalReport::default();
        let html = render(&report, "2026-02-01 10:00");
        assert!(html.contains("브랜드 언급 데이터가 없습니다"));
        assert!(html.contains("데이터 없음"));
        // embed-mode hook still present for iframe use
        assert!(html.contains("classList.add('embedded')"));
    }
}
