//! Package-scan orchestration: raw OCR text in, add-form prefill out.
//!
//! The OCR collaborator hands over whatever text it read off the package;
//! this service runs it through the matcher and tells the UI flow whether it
//! can pre-fill the form or must ask the user to type.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::matcher::{dictionary, DictionaryError, MedicineMatcher, ReferenceEntry};

/// Values to pre-fill in the add-medicine form after a confident scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicinePrefill {
    pub name: String,
    pub dosage: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScanOutcome {
    /// Confident identification; pre-fill the form.
    Identified { prefill: MedicinePrefill },
    /// Soft miss; the user enters details manually.
    Unrecognized,
}

/// Owns the matcher built from one dictionary source. Build once at startup,
/// then share freely — scanning is a pure read.
pub struct ScanService {
    matcher: MedicineMatcher,
}

impl ScanService {
    /// Service over the dictionary compiled into the binary.
    pub fn bundled() -> Result<Self, DictionaryError> {
        Ok(Self::with_entries(dictionary::bundled()?))
    }

    /// Service over a dictionary JSON file on disk.
    pub fn from_file(path: &Path) -> Result<Self, DictionaryError> {
        Ok(Self::with_entries(dictionary::load(path)?))
    }

    pub fn with_entries(entries: Vec<ReferenceEntry>) -> Self {
        Self {
            matcher: MedicineMatcher::new(entries),
        }
    }

    pub fn scan_text(&self, raw_text: &str) -> ScanOutcome {
        let result = self.matcher.resolve(raw_text);

        if result.confidence {
            tracing::info!(name = %result.name, dosage = %result.dosage, "scan identified medicine");
            ScanOutcome::Identified {
                prefill: MedicinePrefill {
                    name: result.name,
                    dosage: result.dosage,
                },
            }
        } else {
            tracing::info!("scan found no usable match, falling back to manual entry");
            ScanOutcome::Unrecognized
        }
    }

    pub fn matcher(&self) -> &MedicineMatcher {
        &self.matcher
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::dictionary::load_test;

    #[test]
    fn confident_scan_prefills_form() {
        let service = ScanService::with_entries(load_test());

        let outcome = service.scan_text("PANADOL\n500 mg tablets");
        assert_eq!(
            outcome,
            ScanOutcome::Identified {
                prefill: MedicinePrefill {
                    name: "Panadol".into(),
                    dosage: "500mg".into(),
                }
            }
        );
    }

    #[test]
    fn soft_miss_asks_for_manual_entry() {
        let service = ScanService::with_entries(load_test());
        assert_eq!(
            service.scan_text("random unrelated words"),
            ScanOutcome::Unrecognized
        );
    }

    #[test]
    fn bundled_dictionary_builds() {
        let service = ScanService::bundled().unwrap();
        assert!(matches!(
            service.scan_text("Augmentin"),
            ScanOutcome::Identified { .. }
        ));
    }
}
