//! Gallery crawl: walk list pages newest-first, open each post, stop
//! once a post falls out of the date window. Per-post failures are
//! skipped; a dead list page ends the crawl.

use crate::config::SignalConfig;
use crate::error::Result;
use crate::models::Post;
use crate::net::{self, RetryPolicy};
use chrono::{DateTime, Duration as ChronoDuration, FixedOffset, NaiveDateTime, TimeZone, Utc};
use scraper::{Html, Selector};
use std::time::Duration;
use url::Url;

pub struct GalleryCrawler {
    http: reqwest::Client,
    config: SignalConfig,
    policy: RetryPolicy,
}

struct ListedPost {
    title: String,
    url: String,
}

struct DetailParts {
    created_at: DateTime<FixedOffset>,
    content: String,
    comments: String,
}

fn kst() -> FixedOffset {
    FixedOffset::east_opt(9 * 3600).unwrap()
}

impl GalleryCrawler {
    pub fn new(config: &SignalConfig) -> Result<Self> {
        Ok(Self {
            http: net::build_client(&config.user_agent, Duration::from_secs(10))?,
            config: config.clone(),
            policy: RetryPolicy::new(3, Duration::from_millis(500)),
        })
    }

    pub async fn crawl(&self) -> Vec<Post> {
        let start_date = (Utc::now().with_timezone(&kst())
            - ChronoDuration::days(self.config.target_days))
        .date_naive();

        let mut posts: Vec<Post> = Vec::new();
        let mut stop = false;

        for page in 1..=self.config.max_pages {
            if stop {
                break;
            }

            let url = format!(
                "{}/board/lists/?id={}&page={}",
                self.config.base_url, self.config.gallery_id, page
            );
            let Some(body) = self.fetch(&url).await else {
                break;
            };

            for listed in parse_list_page(&body, &self.config.base_url) {
                let Some(detail_body) = self.fetch(&listed.url).await else {
                    continue;
                };
                let Some(detail) = parse_detail_page(&detail_body) else {
                    continue;
                };

                if detail.created_at.date_naive() < start_date {
                    stop = true;
                    break;
                }

                posts.push(Post {
                    title: listed.title,
                    url: listed.url,
                    content: detail.content,
                    comments: detail.comments,
                    created_at: detail.created_at,
                });
            }

            println!("   - page {} done (collected: {})", page, posts.len());
        }

        posts
    }

    async fn fetch(&self, url: &str) -> Option<String> {
        let resp = net::send_with_retry(self.http.get(url), &self.policy).await?;
        resp.text().await.ok()
    }
}

/// List rows: `tr.ub-content` with a purely numeric `gall_num` (notices
/// carry labels there) and a post link in `gall_tit`.
fn parse_list_page(html: &str, base_url: &str) -> Vec<ListedPost> {
    let document = Html::parse_document(html);
    let row_sel = Selector::parse("tr.ub-content").unwrap();
    let num_sel = Selector::parse("td.gall_num").unwrap();
    let link_sel = Selector::parse("td.gall_tit a").unwrap();

    let mut out = Vec::new();
    for row in document.select(&row_sel) {
        let Some(num_el) = row.select(&num_sel).next() else {
            continue;
        };
        let num = collapse_text(num_el.text());
        if num.is_empty() || !num.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }

        let Some(a) = row.select(&link_sel).next() else {
            continue;
        };
        let Some(href) = a.value().attr("href") else {
            continue;
        };

        out.push(ListedPost {
            title: collapse_text(a.text()),
            url: join_url(base_url, href),
        });
    }
    out
}

fn parse_detail_page(html: &str) -> Option<DetailParts> {
    let document = Html::parse_document(html);
    let date_sel = Selector::parse(".gall_date").unwrap();
    let content_sel = Selector::parse(".write_div").unwrap();
    let comment_sel = Selector::parse(".comment_list .usertxt").unwrap();

    let date_text = collapse_text(document.select(&date_sel).next()?.text());
    let naive = NaiveDateTime::parse_from_str(&date_text, "%Y.%m.%d %H:%M:%S").ok()?;
    let created_at = kst().from_local_datetime(&naive).single()?;

    let content = document
        .select(&content_sel)
        .next()
        .map(|el| lines_text(el.text()))
        .unwrap_or_default();

    let comments = document
        .select(&comment_sel)
        .map(|el| collapse_text(el.text()))
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    Some(DetailParts {
        created_at,
        content,
        comments,
    })
}

fn collapse_text<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    parts.collect::<String>().trim().to_string()
}

fn lines_text<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    parts
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn join_url(base: &str, href: &str) -> String {
    match Url::parse(base).and_then(|b| b.join(href)) {
        Ok(u) => u.to_string(),
        Err(_) => href.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIST_HTML: &str = r#"
    <table>
      <tr class="ub-content"><td class="gall_num">공지</td>
        <td class="gall_tit"><a href="/board/view/?id=climbing&no=1">공지사항</a></td></tr>
      <tr class="ub-content"><td class="gall_num">4211</td>
        <td class="gall_tit"><a href="/board/view/?id=climbing&no=4211">컬럼비아 신발 어때요</a></td></tr>
      <tr class="ub-content"><td class="gall_num">4210</td>
        <td class="gall_tit"><a href="/board/view/?id=climbing&no=4210">주말 산행 후기</a></td></tr>
      <tr class="ub-content"><td class="gall_num">4209</td></tr>
    </table>"#;

    #[test]
    fn test_list_page_skips_notices_and_linkless_rows() {
        let posts = parse_list_page(LIST_HTML, "https://gall.dcinside.com");
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].title, "컬럼비아 신발 어때요");
        assert_eq!(
            posts[0].url,
            "https://gall.dcinside.com/board/view/?id=climbing&no=4211"
        );
    }

    #[test]
    fn test_detail_page_parsing() {
        let html = r#"
        <div>
          <span class="gall_date">2026.02.01 10:30:00</span>
          <div class="write_div">컬럼비아 바람막이 샀는데<br>  생각보다 좋네요  </div>
          <ul class="comment_list">
            <li><p class="usertxt">저도 그거 씁니다</p></li>
            <li><p class="usertxt">  사이즈 어때요?  </p></li>
          </ul>
        </div>"#;

        let detail = parse_detail_page(html).unwrap();
        assert_eq!(
            detail.created_at.format("%Y-%m-%d %H:%M").to_string(),
            "2026-02-01 10:30"
        );
        assert!(detail.content.contains("컬럼비아 바람막이 샀는데"));
        assert_eq!(detail.comments, "저도 그거 씁니다\n사이즈 어때요?");
    }

    #[test]
    fn test_detail_page_without_date_is_skipped() {
        assert!(parse_detail_page("<div class=\"write_div\">본문만</div>").is_none());
    }
}
