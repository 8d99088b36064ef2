//! Brand mention classification and keyword tally over collected posts.

use crate::models::{Mention, Post, SignalReport};
use std::collections::HashMap;

/// Brands tracked in the VOC report, in display order.
pub const BRAND_LIST: &[&str] = &[
    "컬럼비아", "노스페이스", "파타고니아", "아크테릭스", "블랙야크", "K2", "캠프라인", "살로몬",
    "호카", "마무트",
];

pub const TOP_KEYWORD_COUNT: usize = 15;

pub fn process_posts(posts: &[Post]) -> SignalReport {
    let mut brands: Vec<(String, Vec<Mention>)> = BRAND_LIST
        .iter()
        .map(|b| (b.to_string(), Vec::new()))
        .collect();
    let mut word_counts: HashMap<String, usize> = HashMap::new();

    for post in posts {
        let full_text = format!("{}\n{}\n{}", post.title, post.content, post.comments);

        for word in tokenize(&full_text) {
            if word.chars().count() > 1 {
                *word_counts.entry(word).or_default() += 1;
            }
        }

        for sentence in split_sentences(&full_text) {
            let sentence = sentence.trim();
            if sentence.chars().count() <= 5 {
                continue;
            }
            for (brand, mentions) in brands.iter_mut() {
                if sentence.contains(brand.as_str()) {
                    mentions.push(Mention {
                        text: sentence.to_string(),
                        url: post.url.clone(),
                        title: post.title.clone(),
                    });
                }
            }
        }
    }

    let mut top_keywords: Vec<(String, usize)> = word_counts.into_iter().collect();
    top_keywords.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    top_keywords.truncate(TOP_KEYWORD_COUNT);

    SignalReport {
        brands,
        top_keywords,
    }
}

/// Keep only Hangul and ASCII letters; everything else separates words.
fn tokenize(text: &str) -> Vec<String> {
    let cleaned: String = text
        .chars()
        .map(|c| {
            if ('가'..='힣').contains(&c) || c.is_ascii_alphabetic() {
                c
            } else {
                ' '
            }
        })
        .collect();
    cleaned.split_whitespace().map(str::to_string).collect()
}

fn split_sentences(text: &str) -> impl Iterator<Item = &str> {
    text.split(['.', '!', '?', '\n'])
}
