//! Shopping search API client. Failures degrade to an empty item list;
//! a product with no listings is excluded downstream, never fatal.

use crate::config::NaverConfig;
use crate::error::Result;
use crate::models::SearchItem;
use crate::net::{self, RetryPolicy};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct ShopSearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

pub struct ShopSearchClient {
    http: reqwest::Client,
    config: NaverConfig,
    policy: RetryPolicy,
}

impl ShopSearchClient {
    pub fn new(config: &NaverConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;
        Ok(Self {
            http,
            config: config.clone(),
            policy: RetryPolicy::new(4, Duration::from_millis(600)),
        })
    }

    /// Query the API for a product code. Empty list on permanent failure
    /// or exhausted retries.
    pub async fn search(&self, query: &str, display: u32) -> Vec<SearchItem> {
        let url = format!(
            "{}?query={}&display={}&start=1",
            self.config.api_url,
            urlencoding::encode(query),
            display
        );

        let builder = self
            .http
            .get(&url)
            .header("X-Naver-Client-Id", &self.config.client_id)
            .header("X-Naver-Client-Secret", &self.config.client_secret);

        let Some(resp) = net::send_with_retry(builder, &self.policy).await else {
            return Vec::new();
        };

        match resp.json::<ShopSearchResponse>().await {
            Ok(payload) => payload.items,
            Err(e) => {
                tracing::warn!(error = %e, query, "failed to decode search response");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_decoding_tolerates_extra_fields() {
        let payload = r#"{
            "total": 123, "start": 1, "display": 2,
            "items": [
                {"title": "<b>C6X123</b> 자켓", "link": "https://l", "image": "https://i",
                 "lprice": "45000", "hprice": "", "mallName": "어느몰", "productId": "1"},
                {"title": "no price", "link": "", "image": "", "lprice": "", "mallName": ""}
            ]
        }"#;
        let decoded: ShopSearchResponse = serde_json::from_str(payload).unwrap();
        assert_eq!(decoded.items.len(), 2);
        assert_eq!(decoded.items[0].price(), Some(45000));
        assert_eq!(decoded.items[1].price(), None);
    }

    #[test]
    fn test_missing_items_key_is_empty() {
        let decoded: ShopSearchResponse = serde_json::from_str("{}").unwrap();
        assert!(decoded.items.is_empty());
    }
}
