//! Cache key layout for one entity type and its paginated collection.

/// Builds entity and collection keys from two namespace prefixes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKeys {
    entity_prefix: String,
    collection_prefix: String,
}

impl CacheKeys {
    /// Keys for posts: `post:<id>` and `posts:<page>:<limit>`.
    #[must_use]
    pub fn posts() -> Self {
        Self::new("post", "posts")
    }

    #[must_use]
    pub fn new(entity_prefix: impl Into<String>, collection_prefix: impl Into<String>) -> Self {
        Self {
            entity_prefix: entity_prefix.into(),
            collection_prefix: collection_prefix.into(),
        }
    }

    #[must_use]
    pub fn entity(&self, id: &str) -> String {
        format!("{}:{}", self.entity_prefix, id)
    }

    #[must_use]
    pub fn collection(&self, page: u32, limit: u32) -> String {
        format!("{}:{}:{}", self.collection_prefix, page, limit)
    }

    /// Glob matching every collection key.
    #[must_use]
    pub fn collection_pattern(&self) -> String {
        format!("{}:*", self.collection_prefix)
    }
}

/// Redis-style glob match supporting `*` (any run) and `?` (any one char).
pub(crate) fn glob_matches(pattern: &str, key: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let key: Vec<char> = key.chars().collect();

    let (mut p, mut k) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while k < key.len() {
        match pattern.get(p) {
            Some('*') => {
                backtrack = Some((p, k));
                p += 1;
            }
            Some(&c) if c == '?' || c == key[k] => {
                p += 1;
                k += 1;
            }
            _ => match backtrack {
                Some((star, matched)) => {
                    p = star + 1;
                    k = matched + 1;
                    backtrack = Some((star, matched + 1));
                }
                None => return false,
            },
        }
    }

    pattern[p..].iter().all(|&c| c == '*')
}
