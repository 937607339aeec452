use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One record of the reference dictionary: canonical display name plus the
/// strength printed on the package. Loaded once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceEntry {
    pub name: String,
    pub strength: String,
}

#[derive(Error, Debug)]
pub enum DictionaryError {
    #[error("failed to read dictionary {0}: {1}")]
    Read(String, String),

    #[error("failed to parse dictionary {0}: {1}")]
    Parse(String, String),
}

/// Seed dictionary compiled into the binary.
const BUNDLED_JSON: &str = include_str!("../../resources/data/medicines.json");

/// Parse the dictionary shipped inside the binary.
pub fn bundled() -> Result<Vec<ReferenceEntry>, DictionaryError> {
    serde_json::from_str(BUNDLED_JSON)
        .map_err(|e| DictionaryError::Parse("bundled medicines.json".into(), e.to_string()))
}

/// Load a dictionary from a JSON file on disk. The full ~33k-entry dataset is
/// distributed as an asset alongside the app rather than compiled in.
pub fn load(path: &Path) -> Result<Vec<ReferenceEntry>, DictionaryError> {
    let json = std::fs::read_to_string(path)
        .map_err(|e| DictionaryError::Read(path.display().to_string(), e.to_string()))?;
    serde_json::from_str(&json)
        .map_err(|e| DictionaryError::Parse(path.display().to_string(), e.to_string()))
}

/// Create dictionary entries for tests (no file I/O).
pub fn load_test() -> Vec<ReferenceEntry> {
    [
        ("Panadol", "500mg"),
        ("Augmentin", "625mg"),
        ("Flagyl", "400mg"),
        ("Metformin", "500mg"),
        ("Amoxicillin", "500mg"),
        ("Atorvastatin", "20mg"),
        ("Ibuprofen", "400mg"),
    ]
    .into_iter()
    .map(|(name, strength)| ReferenceEntry {
        name: name.into(),
        strength: strength.into(),
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_dictionary_parses() {
        let entries = bundled().unwrap();
        assert!(entries.len() > 100);
        assert!(entries.iter().any(|e| e.name == "Panadol"));
        assert!(entries.iter().all(|e| !e.name.is_empty()));
        assert!(entries.iter().all(|e| !e.strength.is_empty()));
    }

    #[test]
    fn load_reads_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meds.json");
        std::fs::write(
            &path,
            r#"[{"name": "Panadol", "strength": "500mg"}, {"name": "Flagyl", "strength": "400mg"}]"#,
        )
        .unwrap();

        let entries = load(&path).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "Panadol");
        assert_eq!(entries[1].strength, "400mg");
    }

    #[test]
    fn load_missing_file_errors() {
        let err = load(Path::new("/nonexistent/meds.json")).unwrap_err();
        assert!(matches!(err, DictionaryError::Read(_, _)));
    }

    #[test]
    fn load_malformed_entry_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meds.json");
        // Missing `name` is a parse error, not a silently-skipped record.
        std::fs::write(&path, r#"[{"strength": "500mg"}]"#).unwrap();

        let err = load(&path).unwrap_err();
        assert!(matches!(err, DictionaryError::Parse(_, _)));
    }
}
