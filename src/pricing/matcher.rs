//! Accuracy filtering, ranking and confidence heuristics over search
//! results. Best-effort string matching, not exact classification.

use crate::models::SearchItem;
use regex::Regex;
use std::sync::OnceLock;

/// Accessory/noise listings cut by title substring. Over- and
/// under-excludes by design of the heuristic.
const NOISE_TERMS: &[&str] = &["호환", "케이스", "필름", "스티커", "리필", "커버"];

const BRAND_TOKENS: &[&str] = &["columbia", "컬럼비아"];

const TRUST_MALL_TERMS: &[&str] = &[
    "공식", "브랜드", "백화점", "현대", "롯데", "신세계", "네이버", "스마트스토어",
];

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]+>").unwrap())
}

/// Search API titles carry `<b>` highlight markup.
pub fn strip_html_tags(s: &str) -> String {
    if s.is_empty() {
        return String::new();
    }
    tag_re().replace_all(s, "").into_owned()
}

/// Drop items outside the price bounds, items from excluded sellers and
/// accessory noise. Order-preserving, idempotent.
pub fn filter_items_for_accuracy(
    items: &[SearchItem],
    min_price: Option<i64>,
    max_price: Option<i64>,
    exclude_malls: &[String],
) -> Vec<SearchItem> {
    let lowered_excludes: Vec<String> = exclude_malls
        .iter()
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty())
        .collect();

    let mut out = Vec::new();
    for item in items {
        let lp = item.price().unwrap_or(-1);
        let mall = item.mall_name.trim().to_lowercase();
        let title = strip_html_tags(&item.title).to_lowercase();

        if let Some(min) = min_price {
            if lp < min {
                continue;
            }
        }
        if let Some(max) = max_price {
            if lp > max {
                continue;
            }
        }
        if lowered_excludes.iter().any(|ex| mall.contains(ex.as_str())) {
            continue;
        }
        if NOISE_TERMS.iter().any(|t| title.contains(t)) {
            continue;
        }

        out.push(item.clone());
    }
    out
}

fn price_or_max(item: &SearchItem) -> i64 {
    item.price().unwrap_or(i64::MAX)
}

/// Stable minimum by price; ties keep the earliest item.
pub fn pick_lowest_item(items: &[SearchItem]) -> Option<&SearchItem> {
    items.iter().min_by_key(|it| price_or_max(it))
}

/// Prefix of the stable ascending price sort.
pub fn pick_top_n_by_price(items: &[SearchItem], n: usize) -> Vec<SearchItem> {
    let mut sorted: Vec<SearchItem> = items.to_vec();
    sorted.sort_by_key(price_or_max);
    sorted.truncate(n);
    sorted
}

/// Additive match score in [0, 4]: +2 code in title, +1 brand token in
/// title, +1 trusted seller term in mall name. Display-only.
pub fn compute_confidence(style_code: &str, best_item: Option<&SearchItem>) -> i32 {
    let Some(best) = best_item else {
        return 0;
    };

    let title = strip_html_tags(&best.title).to_lowercase();
    let mall = best.mall_name.to_lowercase();
    let code = style_code.trim().to_lowercase();

    let mut score = 0;
    if !code.is_empty() && title.contains(&code) {
        score += 2;
    }
    if BRAND_TOKENS.iter().any(|t| title.contains(t)) {
        score += 1;
    }
    if TRUST_MALL_TERMS.iter().any(|t| mall.contains(t)) {
        score += 1;
    }
    score
}

/// Marketplace image: the best item's, else the first non-empty image
/// among the ranked items.
pub fn choose_best_image(best_item: Option<&SearchItem>, top_items: &[SearchItem]) -> String {
    if let Some(best) = best_item {
        let img = best.image.trim();
        if !img.is_empty() {
            return img.to_string();
        }
    }
    for item in top_items {
        let img = item.image.trim();
        if !img.is_empty() {
            return img.to_string();
        }
    }
    String::new()
}

/// Official image wins unconditionally; marketplace image is the
/// fallback. Returns (resolved, official, marketplace) so the report can
/// badge the provenance.
pub fn resolve_images(
    official_image: Option<&str>,
    marketplace_image: &str,
) -> (String, String, String) {
    let official = official_image.unwrap_or("").trim().to_string();
    let resolved = if official.is_empty() {
        marketplace_image.trim().to_string()
    } else {
        official.clone()
    };
    (resolved, official, marketplace_image.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(title: &str, lprice: &str, mall: &str) -> SearchItem {
        SearchItem {
            title: title.to_string(),
            link: format!("https://shopping.example/{}", lprice),
            image: String::new(),
            lprice: lprice.to_string(),
            mall_name: mall.to_string(),
        }
    }

    #[test]
    fn test_filter_is_idempotent() {
        let items = vec![
            item("ABC123 자켓", "45000", "어느몰"),
            item("ABC123 케이스 커버", "40000", "nomall"),
            item("ABC123 팬츠", "52000", "좋은몰"),
        ];
        let once = filter_items_for_accuracy(&items, None, None, &[]);
        let twice = filter_items_for_accuracy(&once, None, None, &[]);
        assert_eq!(once.len(), 2);
        assert_eq!(
            once.iter().map(|i| i.lprice.clone()).collect::<Vec<_>>(),
            twice.iter().map(|i| i.lprice.clone()).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_filter_bounds_and_excluded_malls() {
        let items = vec![
            item("정상", "10000", "A몰"),
            item("너무 쌈", "900", "B몰"),
            item("너무 비쌈", "999999", "C몰"),
            item("제외 대상", "20000", "떠리몰 아울렛"),
        ];
        let kept = filter_items_for_accuracy(
            &items,
            Some(1000),
            Some(500000),
            &["떠리몰".to_string()],
        );
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].lprice, "10000");
    }

    #[test]
    fn test_filter_preserves_order() {
        let items = vec![
            item("c", "30000", "m"),
            item("a", "10000", "m"),
            item("b", "20000", "m"),
        ];
        let kept = filter_items_for_accuracy(&items, None, None, &[]);
        let titles: Vec<_> = kept.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_pick_lowest_is_stable_min() {
        let items = vec![
            item("first", "45000", "m1"),
            item("tie-a", "40000", "m2"),
            item("tie-b", "40000", "m3"),
        ];
        let best = pick_lowest_item(&items).unwrap();
        assert_eq!(best.title, "tie-a");
        for it in &items {
            assert!(best.price().unwrap() <= it.price().unwrap());
        }
        assert!(pick_lowest_item(&[]).is_none());
    }

    #[test]
    fn test_top_n_is_prefix_of_ascending_sort() {
        let items = vec![
            item("d", "80000", "m"),
            item("a", "10000", "m"),
            item("c", "30000", "m"),
            item("b", "20000", "m"),
        ];
        let top = pick_top_n_by_price(&items, 3);
        let prices: Vec<_> = top.iter().map(|i| i.price().unwrap()).collect();
        assert_eq!(prices, vec![10000, 20000, 30000]);

        let short = pick_top_n_by_price(&items[..2], 3);
        assert_eq!(short.len(), 2);
        assert!(pick_top_n_by_price(&[], 3).is_empty());
    }

    #[test]
    fn test_unparsable_price_sorts_last() {
        let items = vec![item("broken", "", "m"), item("fine", "15000", "m")];
        assert_eq!(pick_lowest_item(&items).unwrap().title, "fine");
    }

    #[test]
    fn test_confidence_range_and_signals() {
        assert_eq!(compute_confidence("ABC123", None), 0);

        let weak = item("전혀 다른 상품", "10000", "그냥몰");
        assert_eq!(compute_confidence("ABC123", Some(&weak)), 0);

        let coded = item("<b>ABC123</b> 자켓", "10000", "그냥몰");
        assert_eq!(compute_confidence("ABC123", Some(&coded)), 2);

        let full = item("컬럼비아 ABC123 자켓", "10000", "공식 스토어");
        assert_eq!(compute_confidence("ABC123", Some(&full)), 4);

        for it in [&weak, &coded, &full] {
            let c = compute_confidence("ABC123", Some(it));
            assert!((0..=4).contains(&c));
        }
    }

    #[test]
    fn test_denylist_scenario_shifts_best() {
        // the cheaper listing is an accessory; the real product wins
        let items = vec![
            item("ABC123 jacket", "45000", "certified store 공식"),
            item("ABC123 case cover 케이스", "40000", "nomall"),
        ];
        let filtered = filter_items_for_accuracy(&items, None, None, &[]);
        assert_eq!(filtered.len(), 1);
        let best = pick_lowest_item(&filtered).unwrap();
        assert_eq!(best.price(), Some(45000));
        assert_eq!(compute_confidence("abc123", Some(best)), 3);
    }

    #[test]
    fn test_official_image_always_wins() {
        let (resolved, official, naver) =
            resolve_images(Some("https://official.example/a.jpg"), "https://mall.example/b.jpg");
        assert_eq!(resolved, "https://official.example/a.jpg");
        assert_eq!(official, "https://official.example/a.jpg");
        assert_eq!(naver, "https://mall.example/b.jpg");

        let (resolved, official, _) = resolve_images(None, "https://mall.example/b.jpg");
        assert_eq!(resolved, "https://mall.example/b.jpg");
        assert!(official.is_empty());

        let (resolved, _, _) = resolve_images(None, "");
        assert!(resolved.is_empty());
    }

    #[test]
    fn test_choose_best_image_scans_ranked_items() {
        let mut a = item("a", "1", "m");
        let mut b = item("b", "2", "m");
        b.image = "https://img.example/b.jpg".to_string();
        assert_eq!(choose_best_image(Some(&a), &[a.clone(), b.clone()]), b.image);

        a.image = "https://img.example/a.jpg".to_string();
        assert_eq!(choose_best_image(Some(&a), &[b.clone()]), a.image);

        assert_eq!(choose_best_image(None, &[]), "");
    }

    #[test]
    fn test_strip_html_tags() {
        assert_eq!(strip_html_tags("<b>ABC</b> 자켓"), "ABC 자켓");
        assert_eq!(strip_html_tags(""), "");
        assert_eq!(strip_html_tags("plain"), "plain");
    }
}
