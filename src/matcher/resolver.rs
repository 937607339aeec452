use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::dictionary::ReferenceEntry;
use super::index::MatchIndex;
use super::{INSTANT_MATCH_SCORE, LENGTH_TOLERANCE, MIN_FUZZY_LEN, SCORE_CUTOFF};

/// First `<digits><optional space><unit>` occurrence in the scan text is
/// taken as the dosage, e.g. "500 mg" or "250mcg".
static DOSAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\d+\s?(mg|ml|g|mcg)").unwrap());

/// Outcome of one resolve call.
///
/// `confidence: true` means the result is usable without user correction;
/// `false` means nothing acceptable was found and the caller must fall back
/// to manual entry. A soft miss is a normal outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub name: String,
    pub dosage: String,
    pub confidence: bool,
}

impl MatchResult {
    fn hit(entry: &ReferenceEntry, detected_dosage: Option<&str>) -> Self {
        Self {
            name: entry.name.clone(),
            dosage: detected_dosage
                .map(str::to_owned)
                .unwrap_or_else(|| entry.strength.clone()),
            confidence: true,
        }
    }

    pub fn no_match() -> Self {
        Self {
            name: String::new(),
            dosage: String::new(),
            confidence: false,
        }
    }
}

/// The resolution engine. Owns the immutable lookup index; every
/// [`resolve`](Self::resolve) call is an independent pure read.
pub struct MedicineMatcher {
    index: MatchIndex,
}

impl MedicineMatcher {
    /// Build the lookup index from a dictionary. One-time startup cost; the
    /// input order matters only for duplicate names (last write wins).
    pub fn new(entries: Vec<ReferenceEntry>) -> Self {
        let index = MatchIndex::build(entries);
        tracing::info!(
            names = index.names(),
            buckets = index.bucket_count(),
            duplicates = index.duplicate_names(),
            "medicine index built"
        );
        Self { index }
    }

    /// How many dictionary records were shadowed by a same-name record.
    pub fn duplicate_names(&self) -> usize {
        self.index.duplicate_names()
    }

    /// Resolve raw multi-line scan text to the best dictionary candidate.
    ///
    /// Dosage is read from the text itself when a unit pattern is present
    /// anywhere in it; otherwise the matched entry's strength fills in.
    /// Never fails — garbage input degrades to a `confidence: false` result.
    pub fn resolve(&self, raw_text: &str) -> MatchResult {
        let detected_dosage = detect_dosage(raw_text);

        let mut best: Option<(f64, &ReferenceEntry)> = None;

        for line in raw_text.split('\n') {
            let cleaned = clean_line(line);
            if cleaned.len() < MIN_FUZZY_LEN || cleaned.bytes().all(|b| b.is_ascii_digit()) {
                continue;
            }

            let lowered = cleaned.to_lowercase();

            // Tier 1: the whole line is exactly a dictionary name.
            if let Some(entry) = self.index.exact(&lowered) {
                tracing::debug!(name = %entry.name, "exact dictionary match");
                return MatchResult::hit(entry, detected_dosage.as_deref());
            }

            // Tier 2: fuzzy search the ±2 length band around this line.
            let line_len = lowered.chars().count();
            let band = line_len.saturating_sub(LENGTH_TOLERANCE)..=line_len + LENGTH_TOLERANCE;
            for bucket_len in band {
                let Some((score, entry)) = self.index.search_bucket(bucket_len, &lowered) else {
                    continue;
                };

                if score < INSTANT_MATCH_SCORE {
                    tracing::debug!(
                        line = %cleaned,
                        name = %entry.name,
                        score,
                        "instant fuzzy match"
                    );
                    return MatchResult::hit(entry, detected_dosage.as_deref());
                }

                if best.as_ref().map_or(true, |(s, _)| score < *s) {
                    best = Some((score, entry));
                }
            }
        }

        // Lowest score seen across every line and bucket in the document.
        if let Some((score, entry)) = best {
            if score < SCORE_CUTOFF {
                tracing::debug!(name = %entry.name, score, "accepted best fuzzy candidate");
                return MatchResult::hit(entry, detected_dosage.as_deref());
            }
        }

        MatchResult::no_match()
    }
}

/// First dosage-looking token in document order, internal whitespace removed
/// ("500 mg" becomes "500mg").
fn detect_dosage(raw_text: &str) -> Option<String> {
    DOSAGE_RE
        .find(raw_text)
        .map(|m| m.as_str().chars().filter(|c| !c.is_whitespace()).collect())
}

/// Strip a scan line down to ASCII letters, digits, and spaces.
fn clean_line(line: &str) -> String {
    line.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == ' ')
        .collect::<String>()
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::super::dictionary::load_test;
    use super::super::index::similarity_score;
    use super::*;

    fn entry(name: &str, strength: &str) -> ReferenceEntry {
        ReferenceEntry {
            name: name.into(),
            strength: strength.into(),
        }
    }

    #[test]
    fn exact_match_returns_immediately_with_confidence() {
        let matcher = MedicineMatcher::new(load_test());

        let result = matcher.resolve("Panadol");
        assert!(result.confidence);
        assert_eq!(result.name, "Panadol");
        assert_eq!(result.dosage, "500mg");
    }

    #[test]
    fn exact_match_is_case_insensitive() {
        let matcher = MedicineMatcher::new(load_test());

        let result = matcher.resolve("PANADOL");
        assert!(result.confidence);
        assert_eq!(result.name, "Panadol");
    }

    #[test]
    fn detected_dosage_wins_over_entry_strength() {
        let matcher = MedicineMatcher::new(load_test());

        let result = matcher.resolve("PANADOL\n500 mg tablets");
        assert_eq!(result.name, "Panadol");
        assert_eq!(result.dosage, "500mg");
        assert!(result.confidence);

        // A strength that disagrees with the dictionary still wins.
        let result = matcher.resolve("PANADOL\n1000 mg tablets");
        assert_eq!(result.dosage, "1000mg");
    }

    #[test]
    fn entry_strength_fills_in_when_text_has_no_dosage() {
        let matcher = MedicineMatcher::new(load_test());

        let result = matcher.resolve("Augmentin");
        assert_eq!(result.dosage, "625mg");
    }

    #[test]
    fn dosage_units_parse_and_normalize() {
        let matcher = MedicineMatcher::new(load_test());

        for (text, expected) in [
            ("Panadol\n500 mg", "500mg"),
            ("Panadol\n10 ml syrup", "10ml"),
            ("Panadol\n75 mcg", "75mcg"),
            ("Panadol\n20g sachet", "20g"),
        ] {
            assert_eq!(matcher.resolve(text).dosage, expected);
        }
    }

    #[test]
    fn fuzzy_match_catches_dropped_character() {
        let matcher = MedicineMatcher::new(load_test());

        // One dropped character: "Augmentin" scanned as "Augmentn".
        let result = matcher.resolve("Augmentn");
        assert!(result.confidence);
        assert_eq!(result.name, "Augmentin");
        assert_eq!(result.dosage, "625mg");
    }

    #[test]
    fn moderate_fuzzy_candidate_accepted_as_running_best() {
        let matcher = MedicineMatcher::new(vec![entry("Metformin", "500mg")]);

        // Calibrate: this pair is between the instant and cutoff bounds, so
        // it must survive the whole scan and come back as the running best.
        let score = similarity_score("metxxxxxx", "metformin");
        assert!(score >= INSTANT_MATCH_SCORE && score < SCORE_CUTOFF);

        let result = matcher.resolve("Metxxxxxx");
        assert!(result.confidence);
        assert_eq!(result.name, "Metformin");
    }

    #[test]
    fn candidate_at_or_above_cutoff_is_never_returned() {
        let matcher = MedicineMatcher::new(vec![entry("Metformin", "500mg")]);

        assert!(similarity_score("qqzzxxyyp", "metformin") >= SCORE_CUTOFF);

        let result = matcher.resolve("Qqzzxxyyp");
        assert!(!result.confidence);
        assert_eq!(result.name, "");
    }

    #[test]
    fn length_band_excludes_distant_buckets() {
        let matcher = MedicineMatcher::new(vec![entry("Paracetamol", "500mg")]);

        // 14-character line, 11-character name: outside the ±2 band even
        // though the prefix is identical.
        let result = matcher.resolve("Paracetamolxyz");
        assert!(!result.confidence);
        assert_eq!(result.name, "");
    }

    #[test]
    fn short_and_numeric_lines_contribute_nothing() {
        let matcher = MedicineMatcher::new(load_test());

        let result = matcher.resolve("ab\n42\n500\n--\n");
        assert!(!result.confidence);
    }

    #[test]
    fn garbage_text_soft_misses() {
        let matcher = MedicineMatcher::new(load_test());

        let result = matcher.resolve("random unrelated words\nhello world");
        assert_eq!(
            result,
            MatchResult {
                name: String::new(),
                dosage: String::new(),
                confidence: false,
            }
        );
    }

    #[test]
    fn empty_text_soft_misses() {
        let matcher = MedicineMatcher::new(load_test());
        assert!(!matcher.resolve("").confidence);
        assert!(!matcher.resolve("\n\n\n").confidence);
    }

    #[test]
    fn line_noise_is_stripped_before_matching() {
        let matcher = MedicineMatcher::new(load_test());

        // Punctuation and non-ASCII artifacts around the name disappear in
        // cleaning; the remainder is an exact hit.
        let result = matcher.resolve("®* Panadol **\nTake twice daily");
        assert!(result.confidence);
        assert_eq!(result.name, "Panadol");
    }

    #[test]
    fn exact_match_beats_any_fuzzy_candidate() {
        // "Flagyl" is both an exact hit and a plausible fuzzy candidate for
        // the second line; the exact tier must decide first.
        let matcher = MedicineMatcher::new(load_test());

        let result = matcher.resolve("Flagyl\nFlagil");
        assert!(result.confidence);
        assert_eq!(result.name, "Flagyl");
        assert_eq!(result.dosage, "400mg");
    }

    #[test]
    fn duplicate_diagnostic_is_exposed() {
        let matcher = MedicineMatcher::new(vec![
            entry("Panadol", "500mg"),
            entry("panadol", "1000mg"),
        ]);
        assert_eq!(matcher.duplicate_names(), 1);

        // Last write wins.
        let result = matcher.resolve("Panadol");
        assert_eq!(result.dosage, "1000mg");
    }
}
