//! Text query matching and ranking.
//!
//! A query is split into lowercase word terms. A record matches when its
//! content contains at least one term as a whole word; records are ranked by
//! the number of distinct terms they contain, newest first on ties.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::domain::entities::SearchRecord;

/// Upper bound on results returned for one query.
pub const MAX_RESULTS: usize = 10;

/// Parsed search text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    terms: BTreeSet<String>,
}

impl SearchQuery {
    #[must_use]
    pub fn parse(text: &str) -> Self {
        Self {
            terms: words(text).collect(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    #[must_use]
    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().map(String::as_str)
    }

    /// Number of distinct query terms found in `content`.
    #[must_use]
    pub fn score(&self, content: &str) -> usize {
        let content_words: BTreeSet<String> = words(content).collect();
        self.terms.intersection(&content_words).count()
    }

    /// Rank matching records, best first, at most `limit` of them.
    #[must_use]
    pub fn rank<'a, I>(&self, records: I, limit: usize) -> Vec<SearchRecord>
    where
        I: IntoIterator<Item = &'a SearchRecord>,
    {
        let mut scored: Vec<(usize, &SearchRecord)> = records
            .into_iter()
            .map(|r| (self.score(&r.content), r))
            .filter(|(score, _)| *score > 0)
            .collect();
        scored.sort_by(|(sa, a), (sb, b)| match sb.cmp(sa) {
            Ordering::Equal => b
                .created_at
                .cmp(&a.created_at)
                .then_with(|| a.post_id.cmp(&b.post_id)),
            other => other,
        });
        scored
            .into_iter()
            .take(limit)
            .map(|(_, r)| r.clone())
            .collect()
    }
}

fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
}
