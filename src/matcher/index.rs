use std::collections::HashMap;

use super::dictionary::ReferenceEntry;
use super::{MIN_FUZZY_LEN, SCORE_CUTOFF};

/// Entry stored in a length bucket with its lower-cased search key, so a
/// resolve call never re-lowercases the dictionary side.
struct BucketEntry {
    key: String,
    entry: ReferenceEntry,
}

/// The two lookup structures behind the matcher: a normalized-name exact map
/// and per-name-length fuzzy buckets. Built once, read-only afterward.
pub(crate) struct MatchIndex {
    exact: HashMap<String, ReferenceEntry>,
    buckets: HashMap<usize, Vec<BucketEntry>>,
    duplicate_names: usize,
}

impl MatchIndex {
    /// Build both structures from the raw dictionary.
    ///
    /// Duplicate normalized names are last-write-wins — the dictionary is not
    /// deduplicated upstream and that is not this layer's problem to solve —
    /// but the count is kept as a data-quality diagnostic. Names shorter than
    /// [`MIN_FUZZY_LEN`] get no bucket and stay reachable only via the exact
    /// map.
    pub fn build(entries: Vec<ReferenceEntry>) -> Self {
        let mut exact = HashMap::with_capacity(entries.len());
        let mut buckets: HashMap<usize, Vec<BucketEntry>> = HashMap::new();
        let mut duplicate_names = 0;

        for entry in entries {
            let key = entry.name.to_lowercase();

            let name_len = key.chars().count();
            if name_len >= MIN_FUZZY_LEN {
                buckets.entry(name_len).or_default().push(BucketEntry {
                    key: key.clone(),
                    entry: entry.clone(),
                });
            }

            if exact.insert(key, entry).is_some() {
                duplicate_names += 1;
            }
        }

        Self {
            exact,
            buckets,
            duplicate_names,
        }
    }

    /// Exact probe. `key` must already be lower-cased and trimmed.
    pub fn exact(&self, key: &str) -> Option<&ReferenceEntry> {
        self.exact.get(key)
    }

    /// Best candidate in the bucket of names with exactly `len` characters,
    /// or None when the bucket is empty or nothing scores under
    /// [`SCORE_CUTOFF`]. `query` must already be lower-cased.
    pub fn search_bucket(&self, len: usize, query: &str) -> Option<(f64, &ReferenceEntry)> {
        let bucket = self.buckets.get(&len)?;

        let mut best: Option<(f64, &ReferenceEntry)> = None;
        for item in bucket {
            let score = similarity_score(query, &item.key);
            if score >= SCORE_CUTOFF {
                continue;
            }
            if best.as_ref().map_or(true, |(s, _)| score < *s) {
                best = Some((score, &item.entry));
            }
        }
        best
    }

    pub fn names(&self) -> usize {
        self.exact.len()
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// How many dictionary records were shadowed by a later record with the
    /// same normalized name.
    pub fn duplicate_names(&self) -> usize {
        self.duplicate_names
    }

    #[cfg(test)]
    pub fn has_bucket(&self, len: usize) -> bool {
        self.buckets.contains_key(&len)
    }
}

/// Similarity score between two lower-cased strings. Lower is better:
/// 0.0 is an exact match, 1.0 shares nothing.
pub(crate) fn similarity_score(query: &str, key: &str) -> f64 {
    1.0 - strsim::jaro_winkler(query, key)
}
