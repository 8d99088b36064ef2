//! Price reconciliation dashboard. Cards are grouped into code-prefix
//! tabs server-side; search, quick filters, sorting and CSV export run
//! in `assets/price_app.js` over the embedded row JSON and per-card
//! data attributes.

use super::{escape_html, json_for_script, render_page, PageShell};
use crate::error::Result;
use crate::models::PriceRow;

pub const PRICE_APP_JS: &str = include_str!("assets/price_app.js");

const TAB_ORDER: &[&str] = &["C7", "C6", "전체"];
const TOP_GAP_COUNT: usize = 10;

pub struct DashboardMeta {
    pub generated_at: String,
    pub prev_csv_label: Option<String>,
}

fn fmt_comma(v: i64) -> String {
    let negative = v < 0;
    let digits = v.unsigned_abs().to_string();
    let mut out = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    if negative {
        format!("-{}", out)
    } else {
        out
    }
}

fn fmt_won(v: Option<i64>, missing: &str) -> String {
    match v {
        Some(x) => format!("{}원", fmt_comma(x)),
        None => missing.to_string(),
    }
}

fn fmt_signed_won(v: Option<i64>) -> String {
    match v {
        Some(x) if x > 0 => format!("+{}원", fmt_comma(x)),
        Some(x) => format!("{}원", fmt_comma(x)),
        None => "-".to_string(),
    }
}

fn rows_for_tab<'a>(rows: &'a [PriceRow], tab: &str) -> Vec<&'a PriceRow> {
    match tab {
        "전체" => rows.iter().collect(),
        prefix => rows
            .iter()
            .filter(|r| r.code.to_uppercase().starts_with(prefix))
            .collect(),
    }
}

/// Codes of the rows with the widest absolute official-vs-lowest gap,
/// backing the Top Gap quick filter.
fn top_gap_codes(rows: &[PriceRow]) -> Vec<String> {
    let mut ranked: Vec<&PriceRow> = rows.iter().collect();
    ranked.sort_by_key(|r| std::cmp::Reverse(r.diff.map(i64::abs).unwrap_or(-1)));
    ranked
        .iter()
        .take(TOP_GAP_COUNT)
        .map(|r| r.code.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect()
}

fn diff_badge(diff: Option<i64>) -> String {
    let Some(d) = diff else {
        return String::new();
    };
    let (cls, arrow) = if d > 0 {
        ("bg-red-500/10 text-red-600", "공식↑")
    } else {
        ("bg-emerald-500/10 text-emerald-700", "공식↓")
    };
    format!(
        r#"<span class="px-3 py-1 rounded-full text-[10px] font-black {}">{} {}</span>"#,
        cls,
        arrow,
        fmt_signed_won(Some(d))
    )
}

fn delta_badge(delta: Option<i64>) -> String {
    let Some(d) = delta else {
        return String::new();
    };
    let cls = if d > 0 {
        "bg-amber-500/10 text-amber-700"
    } else if d < 0 {
        "bg-sky-500/10 text-sky-700"
    } else {
        "bg-slate-500/10 text-slate-700"
    };
    format!(
        r#"<span class="px-3 py-1 rounded-full text-[10px] font-black {}">Δ최저가 {}</span>"#,
        cls,
        fmt_signed_won(Some(d))
    )
}

fn confidence_badge(conf: i32) -> String {
    let cls = if conf >= 3 {
        "bg-emerald-500/10 text-emerald-700"
    } else if conf == 2 {
        "bg-amber-500/10 text-amber-800"
    } else if conf == 1 {
        "bg-red-500/10 text-red-600"
    } else {
        "bg-slate-500/10 text-slate-700"
    };
    format!(
        r#"<span class="px-3 py-1 rounded-full text-[10px] font-black {}">Match {}/5</span>"#,
        cls, conf
    )
}

/// Provenance of the resolved image: official catalog, marketplace, or
/// something in between.
fn image_source_badge(row: &PriceRow) -> String {
    if row.image_url.is_empty() {
        return String::new();
    }
    let (cls, label) = if !row.official_image_url.is_empty() && row.image_url == row.official_image_url {
        ("bg-blue-500/10 text-blue-700", "IMG: OFFICIAL")
    } else if !row.naver_image_url.is_empty() && row.image_url == row.naver_image_url {
        ("bg-purple-500/10 text-purple-700", "IMG: NAVER")
    } else {
        ("bg-slate-500/10 text-slate-700", "IMG: MIX")
    };
    format!(
        r#"<span class="px-3 py-1 rounded-full text-[10px] font-black {}">{}</span>"#,
        cls, label
    )
}

fn top3_block(row: &PriceRow) -> String {
    let mut lines = String::new();
    for (idx, entry) in row.top3.iter().take(3).enumerate() {
        lines.push_str(&format!(
            r#"<div class="flex items-center justify-between gap-3 py-2">
  <div class="text-xs font-black text-slate-700">#{} {}</div>
  <div class="text-[11px] font-bold text-slate-500 line-clamp-1 flex-1">{}</div>
  <a href="{}" target="_blank" class="text-[11px] font-black text-blue-700 hover:underline">link</a>
</div>"#,
            idx + 1,
            fmt_won(entry.lprice, "-"),
            escape_html(&entry.mall_name),
            escape_html(&entry.link),
        ));
    }
    if lines.is_empty() {
        lines = r#"<div class="text-xs font-bold text-slate-500">Top3 데이터 없음</div>"#.to_string();
    }
    format!(
        r#"<details class="mt-2">
  <summary class="cursor-pointer select-none text-[11px] font-black text-slate-600">Top3 최저가 보기</summary>
  <div class="mt-3 p-4 rounded-2xl bg-white/60 border border-white">{}</div>
</details>"#,
        lines
    )
}

fn render_card(row: &PriceRow) -> String {
    let code = row.code.as_str();
    let diff_abs = row.diff.map(i64::abs).unwrap_or(-1);
    // missing-delta sentinel keeps those rows last in delta sorts
    let delta_attr = row
        .delta_naver
        .map(|d| d.to_string())
        .unwrap_or_else(|| "1000000000000000000".to_string());

    let img_block = if row.image_url.trim().is_empty() {
        String::new()
    } else {
        format!(
            r#"<div class="mb-4">
  <img src="{}" alt="{}"
    class="w-full h-48 object-cover rounded-2xl border border-white/80 bg-white/60"
    loading="lazy" onerror="this.style.display='none';" />
</div>"#,
            escape_html(&row.image_url),
            escape_html(if row.name_en.is_empty() { &row.name_ko } else { &row.name_en }),
        )
    };

    let (title_main, title_sub) = if row.name_ko.is_empty() {
        (escape_html(&row.name_en), String::new())
    } else {
        (escape_html(&row.name_ko), escape_html(&row.name_en))
    };

    format!(
        r#"<div class="glass-card p-6 border-white/80 hover:scale-[1.01] transition-transform card-item"
  data-code="{code_lower}" data-nameen="{name_en_lower}" data-nameko="{name_ko_lower}"
  data-missing="{missing}" data-diffpos="{diffpos}"
  data-diff="{diff}" data-diffabs="{diff_abs}"
  data-naver="{naver}" data-official="{official}"
  data-delta="{delta}" data-conf="{conf}"
  data-code-raw="{code_raw}">

  {img_block}

  <div class="flex items-start justify-between gap-3 mb-4">
    <div class="min-w-0">
      <div class="text-xs font-black tracking-widest text-slate-400 uppercase mb-2">{code_raw}</div>
      <div class="text-slate-900 font-extrabold leading-snug line-clamp-2">{title_main}</div>
      <div class="text-[11px] font-bold text-slate-500 mt-1 line-clamp-1">{title_sub}</div>

      <div class="mt-3 flex flex-wrap gap-2">{diff_badge} {delta_badge} {conf_badge} {src_badge}</div>

      {top3_block}
    </div>

    <div class="flex flex-col items-end gap-2">
      <label class="inline-flex items-center gap-2 text-[11px] font-black text-slate-600 cursor-pointer select-none">
        <input type="checkbox" class="w-4 h-4 accent-[#002d72] chk"
          onchange="toggleCheck('{code_raw}', this.checked)" />
        CHECK
      </label>
    </div>
  </div>

  <div class="grid grid-cols-2 gap-3 mb-4">
    <div class="p-4 rounded-2xl bg-white/60 border border-white">
      <div class="text-[10px] font-black tracking-widest text-slate-400 uppercase mb-1">공식몰가</div>
      <div class="text-lg font-black text-slate-900">{official_s}</div>
    </div>
    <div class="p-4 rounded-2xl bg-white/60 border border-white">
      <div class="text-[10px] font-black tracking-widest text-slate-400 uppercase mb-1">네이버최저가</div>
      <div class="text-lg font-black text-slate-900">{naver_s}</div>
      <div class="text-[10px] font-bold text-slate-500 mt-1">{mall}</div>
    </div>
  </div>

  <div class="grid grid-cols-2 gap-3 mb-5">
    <div class="p-4 rounded-2xl bg-white/60 border border-white">
      <div class="text-[10px] font-black tracking-widest text-slate-400 uppercase mb-1">전일 최저가</div>
      <div class="text-base font-black text-slate-900">{prev_s}</div>
    </div>
    <div class="p-4 rounded-2xl bg-white/60 border border-white">
      <div class="text-[10px] font-black tracking-widest text-slate-400 uppercase mb-1">Δ 최저가</div>
      <div class="text-base font-black text-slate-900">{delta_s}</div>
    </div>
  </div>

  <div class="mb-4">
    <div class="text-[10px] font-black uppercase tracking-[0.3em] text-slate-400 mb-2 flex items-center gap-2">
      <i class="fa-solid fa-note-sticky"></i> Memo
    </div>
    <textarea class="w-full input-glass text-sm font-bold text-slate-800" rows="2"
      placeholder="메모를 남겨두면 이 브라우저에 저장돼요 (예: MD 확인 필요 / 옵션가 의심)"
      oninput="saveMemo('{code_raw}', this.value)"></textarea>
  </div>

  <div class="flex items-center justify-between pt-4 border-t border-slate-100">
    <span class="text-[10px] font-bold text-slate-400 uppercase tracking-widest">가격차이: {diff_s}</span>
    <a href="{link}" target="_blank"
      class="px-4 py-2 bg-[#002d72] text-white text-[10px] font-black rounded-xl hover:bg-blue-600 transition-colors flex items-center gap-2">
      최저가 링크 <i class="fa-solid fa-arrow-up-right"></i>
    </a>
  </div>
</div>"#,
        code_lower = escape_html(&code.to_lowercase()),
        name_en_lower = escape_html(&row.name_en.to_lowercase()),
        name_ko_lower = escape_html(&row.name_ko.to_lowercase()),
        missing = if row.naver_price.is_none() { 1 } else { 0 },
        diffpos = if row.diff.is_some_and(|d| d > 0) { 1 } else { 0 },
        diff = row.diff.map(|d| d.to_string()).unwrap_or_default(),
        diff_abs = diff_abs,
        naver = row.naver_price.unwrap_or(-1),
        official = row.official_price.unwrap_or(-1),
        delta = delta_attr,
        conf = row.confidence,
        code_raw = escape_html(code),
        img_block = img_block,
        title_main = title_main,
        title_sub = title_sub,
        diff_badge = diff_badge(row.diff),
        delta_badge = delta_badge(row.delta_naver),
        conf_badge = confidence_badge(row.confidence),
        src_badge = image_source_badge(row),
        top3_block = top3_block(row),
        official_s = fmt_won(row.official_price, "-"),
        naver_s = fmt_won(row.naver_price, "미검색"),
        mall = escape_html(&row.mall),
        prev_s = fmt_won(row.prev_naver, "-"),
        delta_s = fmt_signed_won(row.delta_naver),
        diff_s = fmt_signed_won(row.diff),
        link = escape_html(&row.link),
    )
}

pub fn render(rows: &[PriceRow], meta: &DashboardMeta) -> Result<String> {
    let mut active_tabs: Vec<&str> = TAB_ORDER
        .iter()
        .copied()
        .filter(|t| !rows_for_tab(rows, t).is_empty())
        .collect();
    if active_tabs.is_empty() {
        active_tabs.push("전체");
    }

    let total_cnt = rows.len();
    let missing_cnt = rows.iter().filter(|r| r.naver_price.is_none()).count();
    let diff_pos_cnt = rows.iter().filter(|r| r.diff.is_some_and(|d| d > 0)).count();

    let mut tab_menu = String::new();
    let mut content_area = String::new();
    for (i, tab) in active_tabs.iter().enumerate() {
        let tab_rows = rows_for_tab(rows, tab);
        let (active_attr, active_class) = if i == 0 {
            ("1", "bg-[#002d72] text-white shadow-lg")
        } else {
            ("0", "bg-white/50 text-slate-500 hover:bg-white")
        };
        tab_menu.push_str(&format!(
            r#"<button onclick="switchTab('{tab}')" id="tab-{tab}" data-active="{active}"
  class="tab-btn px-6 py-3 rounded-2xl font-black transition-all text-sm {class}">
  {tab} <span class="ml-1 opacity-60 text-xs">{count}</span>
</button>"#,
            tab = tab,
            active = active_attr,
            class = active_class,
            count = tab_rows.len(),
        ));

        let cards: String = tab_rows.iter().map(|r| render_card(r)).collect();
        content_area.push_str(&format!(
            r#"<div id="content-{tab}" class="tab-content grid grid-cols-1 md:grid-cols-2 lg:grid-cols-3 gap-6" style="display: {display};">
  {cards}
</div>"#,
            tab = tab,
            display = if i == 0 { "grid" } else { "none" },
            cards = if cards.is_empty() {
                r#"<div class="text-slate-500 font-bold">데이터가 없습니다.</div>"#.to_string()
            } else {
                cards
            },
        ));
    }

    let prev_label = meta
        .prev_csv_label
        .clone()
        .unwrap_or_else(|| "없음(비교 불가)".to_string());

    let body = format!(
        r#"<div id="overlay" class="overlay">
  <div class="glass-card px-8 py-7 flex items-center gap-4">
    <div class="spinner"></div>
    <div>
      <div class="text-sm font-black text-slate-900">Processing...</div>
      <div id="overlayMsg" class="text-xs font-bold text-slate-500 mt-1">잠시만요</div>
    </div>
  </div>
</div>

<section class="mb-10">
  <div class="grid grid-cols-1 lg:grid-cols-4 gap-4">
    <div class="summary-card">
      <div class="small-label text-blue-600 mb-2"><i class="fa-solid fa-list mr-2"></i>Total</div>
      <div class="text-3xl font-black">{total}</div>
      <div class="text-xs font-bold text-slate-500 mt-2">전체 결과 상품 수</div>
    </div>
    <div class="summary-card">
      <div class="small-label text-red-600 mb-2"><i class="fa-solid fa-triangle-exclamation mr-2"></i>Diff &gt; 0</div>
      <div class="text-3xl font-black">{diff_pos}</div>
      <div class="text-xs font-bold text-slate-500 mt-2">공식이 더 비싼 상품</div>
    </div>
    <div class="summary-card">
      <div class="small-label text-slate-600 mb-2"><i class="fa-solid fa-magnifying-glass mr-2"></i>Missing</div>
      <div class="text-3xl font-black">{missing}</div>
      <div class="text-xs font-bold text-slate-500 mt-2">네이버 미검색</div>
    </div>
    <div class="summary-card">
      <div class="small-label text-blue-600 mb-3"><i class="fa-solid fa-file-arrow-down mr-2"></i>Export</div>
      <div class="flex flex-col gap-2">
        <button onclick="downloadCSVAll()" class="px-4 py-3 rounded-2xl bg-[#002d72] text-white font-black text-sm hover:bg-blue-600 transition-colors">
          전체 CSV 다운로드
        </button>
        <button onclick="downloadCSVFiltered()" class="px-4 py-3 rounded-2xl bg-white/70 text-slate-800 font-black text-sm border border-white hover:bg-white transition-colors">
          현재 결과만 CSV 다운로드 (체크/메모 포함)
        </button>
      </div>
    </div>
  </div>

  <div class="mt-5 flex flex-wrap gap-2 items-center">
    <button id="chip-diffpos" class="chip" onclick="toggleQuickFilter('diffpos')">Diff&gt;0만 보기</button>
    <button id="chip-missing" class="chip" onclick="toggleQuickFilter('missing')">미검색만 보기</button>
    <button id="chip-topgap" class="chip" onclick="toggleQuickFilter('topgap')">Top Gap({top_gap_count})만 보기</button>
    <div class="ml-auto text-xs font-black text-slate-500">현재 탭 기준 결과: <span id="matchCount" class="text-slate-900">-</span>개</div>
  </div>
</section>

<section class="glass-card p-8 mb-10">
  <div class="flex flex-col lg:flex-row gap-4 lg:items-end">
    <div class="flex-1">
      <div class="text-[10px] font-black uppercase tracking-[0.3em] text-blue-600 mb-2 flex items-center gap-2">
        <i class="fa-solid fa-magnifying-glass"></i> Search
      </div>
      <div class="text-slate-500 text-sm font-bold mb-4">
        상품명(영문/한글) 또는 상품코드로 필터링 —
        <span class="font-black text-slate-700">Search 버튼 또는 Enter로 적용</span>
      </div>
      <div class="grid grid-cols-1 md:grid-cols-3 gap-3">
        <input id="qNameEn" class="input-glass w-full font-bold text-slate-800" placeholder="상품명(영문) 검색 (ex. jacket, down, shorts...)" />
        <input id="qNameKo" class="input-glass w-full font-bold text-slate-800" placeholder="상품명(한글) 검색 (예: 바람막이, 다운, 팬츠...)" />
        <input id="qCode" class="input-glass w-full font-bold text-slate-800" placeholder="상품코드 검색 (ex. C7XXXX, C6XXXX...)" />
      </div>
    </div>

    <div class="flex flex-col gap-3 min-w-[280px]">
      <div class="text-[10px] font-black uppercase tracking-[0.3em] text-blue-600 flex items-center gap-2">
        <i class="fa-solid fa-arrow-down-wide-short"></i> Sort
      </div>
      <select id="sortMode" class="input-glass font-black text-slate-800">
        <option value="diffabs_desc">가격차이 |abs| 큰 순</option>
        <option value="diff_desc">가격차이 큰 순(공식-네이버)</option>
        <option value="diff_asc">가격차이 작은 순(공식-네이버)</option>
        <option value="naver_asc">네이버최저가 낮은 순</option>
        <option value="naver_desc">네이버최저가 높은 순</option>
        <option value="official_desc">공식몰가 높은 순</option>
        <option value="code_asc">상품코드 오름차순</option>
        <option value="delta_asc">Δ최저가 하락 큰 순(더 내려감)</option>
        <option value="delta_desc">Δ최저가 상승 큰 순(더 오름)</option>
        <option value="conf_desc">Match 점수 높은 순</option>
      </select>

      <div class="flex gap-3">
        <button onclick="onSearchClick()" class="px-6 py-4 bg-[#002d72] text-white font-black rounded-2xl hover:bg-blue-600 transition-colors flex items-center gap-2">
          <i class="fa-solid fa-magnifying-glass"></i> Search
        </button>
        <button onclick="onApplyClick()" class="px-6 py-4 bg-white/70 text-slate-700 font-black rounded-2xl hover:bg-white transition-colors border border-white flex items-center gap-2">
          <i class="fa-solid fa-filter"></i> Apply
        </button>
        <button onclick="resetAll()" class="px-6 py-4 bg-white/70 text-slate-700 font-black rounded-2xl hover:bg-white transition-colors border border-white flex items-center gap-2">
          <i class="fa-solid fa-rotate-left"></i> Reset
        </button>
      </div>
    </div>
  </div>

  <div id="noResults" class="hidden mt-5 glass-card p-5 text-center text-slate-700 font-black">
    검색 결과가 없습니다.
  </div>
</section>

<section>
  <div class="flex flex-wrap gap-2 mb-8">{tab_menu}</div>
  <div class="min-h-[500px]">{content_area}</div>
</section>"#,
        total = total_cnt,
        diff_pos = diff_pos_cnt,
        missing = missing_cnt,
        top_gap_count = TOP_GAP_COUNT,
        tab_menu = tab_menu,
        content_area = content_area,
    );

    let scripts = format!(
        "<script>\nconst ALL_ROWS = {};\nconst TOP_GAP_CODES = {};\n</script>\n<script>\n{}\n</script>",
        json_for_script(&rows)?,
        json_for_script(&top_gap_codes(rows))?,
        PRICE_APP_JS,
    );

    let sidebar_extra = format!(
        r#"    <div class="mt-auto pt-8 text-xs font-bold text-slate-500">
      <div class="small-label text-blue-600 mb-2">History</div>
      <div>전일 비교 파일: <span class="font-black text-slate-700">{}</span></div>
    </div>"#,
        escape_html(&prev_label)
    );

    let shell = PageShell {
        title: "Columbia M-OS Pro | Price Monitoring",
        heading: "Naver Lowest Price Monitor",
        subtitle: "공식몰가 vs 네이버 쇼핑 최저가 자동 비교",
        nav_label: "가격 모니터링",
        nav_icon: "fa-tags",
        now_str: &meta.generated_at,
        sidebar_extra,
        body,
        scripts,
    };
    Ok(render_page(&shell))
}
