use serde::{Deserialize, Serialize};

/// A product row loaded from the official price-list CSV.
#[derive(Debug, Clone)]
pub struct Product {
    pub code: String,
    pub name_en: String,
    pub name_ko: String,
    pub official_price: Option<i64>,
}

/// One listing from the shopping search API, in wire shape. `lprice`
/// arrives as a decimal string and `title` may contain markup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchItem {
    pub title: String,
    pub link: String,
    pub image: String,
    pub lprice: String,
    #[serde(rename = "mallName")]
    pub mall_name: String,
}

impl SearchItem {
    pub fn price(&self) -> Option<i64> {
        self.lprice.trim().parse::<i64>().ok()
    }
}

/// Compact view of a ranked listing kept on the output row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Top3Entry {
    pub lprice: Option<i64>,
    #[serde(rename = "mallName")]
    pub mall_name: String,
    pub link: String,
}

impl Top3Entry {
    pub fn from_item(item: &SearchItem) -> Self {
        Self {
            lprice: item.price(),
            mall_name: item.mall_name.clone(),
            link: item.link.clone(),
        }
    }
}

/// Final reconciliation row. Serialized field names keep the operators'
/// Korean headers: the next run's delta lookup and the Excel workflow
/// both key on them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceRow {
    #[serde(rename = "코드")]
    pub code: String,
    #[serde(rename = "상품명(영문)")]
    pub name_en: String,
    #[serde(rename = "상품명(한글)")]
    pub name_ko: String,
    #[serde(rename = "공식몰가")]
    pub official_price: Option<i64>,
    #[serde(rename = "네이버최저가")]
    pub naver_price: Option<i64>,
    #[serde(rename = "가격차이")]
    pub diff: Option<i64>,
    #[serde(rename = "최저가몰")]
    pub mall: String,
    #[serde(rename = "링크")]
    pub link: String,
    #[serde(rename = "이미지URL")]
    pub image_url: String,
    #[serde(rename = "공식이미지URL")]
    pub official_image_url: String,
    #[serde(rename = "네이버이미지URL")]
    pub naver_image_url: String,
    pub naver_title: String,
    pub confidence: i32,
    pub top3: Vec<Top3Entry>,
    pub prev_naver: Option<i64>,
    pub delta_naver: Option<i64>,
}
