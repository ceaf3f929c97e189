//! Source records collected during a research session.
//!
//! A [`SourceRecord`] is one web source returned by the search provider.
//! Sources are deduplicated by URL within a session; the first occurrence
//! wins and first-appearance order is preserved.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// A single web source: title, URL, snippet, and an optional relevance
/// score in `[0, 1]` as reported by the search provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRecord {
    /// Page title.
    pub title: String,
    /// Source URL. Unique key for deduplication.
    pub url: String,
    /// Extracted text content or excerpt.
    pub snippet: String,
    /// Relevance score in `[0, 1]`, when the provider reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    /// Explanation of why this source matters. Filled by the synthesizer
    /// for top sources; absent on raw search results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub why_matters: Option<String>,
}

/// An ordered, URL-deduplicated collection of sources.
///
/// Insertion keeps the first-seen record for each URL and preserves the
/// order of first appearance, which is the tie-break order used when
/// selecting top sources.
#[derive(Debug, Clone, Default)]
pub struct SourcePool {
    records: Vec<SourceRecord>,
    seen_urls: HashSet<String>,
}

impl SourcePool {
    /// Creates an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a record unless its URL was already seen.
    ///
    /// Returns `true` if the record was added.
    pub fn insert(&mut self, record: SourceRecord) -> bool {
        if self.seen_urls.contains(&record.url) {
            return false;
        }
        self.seen_urls.insert(record.url.clone());
        self.records.push(record);
        true
    }

    /// Inserts every record in order, skipping already-seen URLs.
    pub fn extend<I: IntoIterator<Item = SourceRecord>>(&mut self, records: I) {
        for record in records {
            self.insert(record);
        }
    }

    /// Returns the deduplicated records in first-appearance order.
    #[must_use]
    pub fn records(&self) -> &[SourceRecord] {
        &self.records
    }

    /// Returns the number of distinct sources collected.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if no sources have been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Consumes the pool, returning the records.
    #[must_use]
    pub fn into_records(self) -> Vec<SourceRecord> {
        self.records
    }
}

/// Selects the `n` highest-scored sources.
///
/// Missing scores rank as `0.0`. The sort is stable, so sources with
/// equal scores keep their original (first-appearance) order.
#[must_use]
pub fn top_by_score(sources: &[SourceRecord], n: usize) -> Vec<SourceRecord> {
    let mut ranked: Vec<SourceRecord> = sources.to_vec();
    ranked.sort_by(|a, b| {
        let sa = a.score.unwrap_or(0.0);
        let sb = b.score.unwrap_or(0.0);
        sb.partial_cmp(&sa).unwrap_or(std::cmp::Ordering::Equal)
    });
    ranked.truncate(n);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(url: &str, score: Option<f64>) -> SourceRecord {
        SourceRecord {
            title: format!("title for {url}"),
            url: url.to_string(),
            snippet: "snippet".to_string(),
            score,
            why_matters: None,
        }
    }

    #[test]
    fn test_pool_dedup_keeps_first_seen() {
        let mut pool = SourcePool::new();
        let mut first = source("https://a.example", Some(0.9));
        first.title = "first title".to_string();
        let mut second = source("https://a.example", Some(0.1));
        second.title = "second title".to_string();

        assert!(pool.insert(first));
        assert!(!pool.insert(second));
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.records()[0].title, "first title");
        assert_eq!(pool.records()[0].score, Some(0.9));
    }

    #[test]
    fn test_pool_preserves_first_appearance_order() {
        let mut pool = SourcePool::new();
        pool.extend(vec![
            source("https://b.example", None),
            source("https://a.example", None),
            source("https://b.example", Some(1.0)),
            source("https://c.example", None),
        ]);
        let urls: Vec<&str> = pool.records().iter().map(|s| s.url.as_str()).collect();
        assert_eq!(
            urls,
            vec!["https://b.example", "https://a.example", "https://c.example"]
        );
    }

    #[test]
    fn test_top_by_score_picks_highest() {
        let sources: Vec<SourceRecord> = (0..12)
            .map(|i| source(&format!("https://s{i}.example"), Some(f64::from(i) / 12.0)))
            .collect();
        let top = top_by_score(&sources, 5);
        assert_eq!(top.len(), 5);
        assert_eq!(top[0].url, "https://s11.example");
        assert_eq!(top[4].url, "https://s7.example");
    }

    #[test]
    fn test_top_by_score_ties_keep_original_order() {
        let sources = vec![
            source("https://x.example", Some(0.5)),
            source("https://y.example", Some(0.5)),
            source("https://z.example", Some(0.5)),
        ];
        let top = top_by_score(&sources, 2);
        assert_eq!(top[0].url, "https://x.example");
        assert_eq!(top[1].url, "https://y.example");
    }

    #[test]
    fn test_top_by_score_missing_scores_rank_last() {
        let sources = vec![
            source("https://none.example", None),
            source("https://low.example", Some(0.1)),
        ];
        let top = top_by_score(&sources, 1);
        assert_eq!(top[0].url, "https://low.example");
    }
}
