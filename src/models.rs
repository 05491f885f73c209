//! Core data model: scan handles, the engine allow-list, and scan summaries.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::{DEFAULT_ENGINES, SAFE_CATEGORIES, UPLOAD_SUCCESS_MESSAGE};
use crate::upstream::EngineResult;

/// Opaque identifier of a submitted analysis.
///
/// Returned by the upstream on submission (`data.id`) and used only as a
/// lookup key afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScanHandle(String);

impl ScanHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScanHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Engines whose verdicts contribute to a summary. Order is irrelevant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineAllowList(BTreeSet<String>);

impl EngineAllowList {
    /// Builds an allow-list, dropping blank names and surrounding whitespace.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            names
                .into_iter()
                .map(|n| n.as_ref().trim().to_string())
                .filter(|n| !n.is_empty())
                .collect(),
        )
    }

    pub fn contains(&self, engine: &str) -> bool {
        self.0.contains(engine)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl Default for EngineAllowList {
    fn default() -> Self {
        Self::new(DEFAULT_ENGINES)
    }
}

/// Outcome of a completed analysis, restricted to the allow-listed engines.
///
/// Created once when the upstream reports `completed` and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanSummary {
    /// True iff every allow-listed verdict is `undetected` or `timeout`.
    /// Vacuously true when none of the allow-listed engines reported.
    pub safe: bool,
    /// Per-category counts exactly as the upstream reported them
    pub stats: serde_json::Map<String, serde_json::Value>,
    /// Engine name to category, allow-listed engines only
    pub detailed_results: BTreeMap<String, String>,
}

impl ScanSummary {
    /// Builds a summary from the raw `stats` and `results` of a completed analysis.
    ///
    /// Engines outside `engines` are ignored whatever they contain.
    ///
    /// # Errors
    ///
    /// Returns the engine name if an allow-listed engine reported without a
    /// `category`.
    pub fn from_results(
        stats: serde_json::Map<String, serde_json::Value>,
        results: &HashMap<String, EngineResult>,
        engines: &EngineAllowList,
    ) -> Result<Self, String> {
        let mut detailed_results = BTreeMap::new();
        for engine in engines.iter() {
            let Some(result) = results.get(engine) else {
                continue;
            };
            let category = result.category.clone().ok_or_else(|| engine.to_string())?;
            detailed_results.insert(engine.to_string(), category);
        }
        let safe = is_safe(detailed_results.values().map(String::as_str));

        Ok(ScanSummary {
            safe,
            stats,
            detailed_results,
        })
    }
}

/// Body of a successful upload response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadAccepted {
    pub message: String,
    pub file_id: ScanHandle,
}

impl UploadAccepted {
    pub fn new(file_id: ScanHandle) -> Self {
        Self {
            message: UPLOAD_SUCCESS_MESSAGE.to_string(),
            file_id,
        }
    }
}

/// Body of every relay error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub detail: String,
}

/// Returns true if `category` counts as a clean verdict.
pub fn is_clean_category(category: &str) -> bool {
    SAFE_CATEGORIES.contains(&category)
}

/// Safety rule over a set of verdict categories (true for an empty set).
pub fn is_safe<'a>(categories: impl IntoIterator<Item = &'a str>) -> bool {
    categories.into_iter().all(is_clean_category)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn results(pairs: &[(&str, &str)]) -> HashMap<String, EngineResult> {
        pairs
            .iter()
            .map(|(engine, category)| {
                (
                    engine.to_string(),
                    EngineResult {
                        category: Some(category.to_string()),
                        result: None,
                        engine_name: Some(engine.to_string()),
                    },
                )
            })
            .collect()
    }

    fn stats() -> serde_json::Map<String, serde_json::Value> {
        match json!({"malicious": 0, "undetected": 5}) {
            serde_json::Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_safe_when_all_clean() {
        assert!(is_safe(["undetected", "timeout", "undetected"]));
    }

    #[test]
    fn test_unsafe_on_any_other_category() {
        for bad in ["malicious", "suspicious", "harmless", "type-unsupported", "failure", ""] {
            assert!(
                !is_safe(["undetected", bad]),
                "category {:?} should make the verdict unsafe",
                bad
            );
        }
    }

    #[test]
    fn test_empty_verdict_set_is_vacuously_safe() {
        assert!(is_safe(std::iter::empty::<&str>()));

        let summary = ScanSummary::from_results(
            stats(),
            &results(&[("SomeOtherEngine", "malicious")]),
            &EngineAllowList::new(["Microsoft"]),
        )
        .unwrap();
        assert!(summary.detailed_results.is_empty());
        assert!(summary.safe);
    }

    #[test]
    fn test_summary_filters_to_allow_list() {
        let engines = EngineAllowList::new(["Microsoft", "Bitdefender", "Kaspersky"]);
        let summary = ScanSummary::from_results(
            stats(),
            &results(&[
                ("Microsoft", "undetected"),
                ("Bitdefender", "malicious"),
                ("Avast", "undetected"),
            ]),
            &engines,
        )
        .unwrap();

        let expected: BTreeMap<String, String> = [
            ("Microsoft".to_string(), "undetected".to_string()),
            ("Bitdefender".to_string(), "malicious".to_string()),
        ]
        .into_iter()
        .collect();
        assert_eq!(summary.detailed_results, expected);
        assert!(!summary.safe);
        assert_eq!(summary.stats, stats());
    }

    #[test]
    fn test_unlisted_engine_without_category_is_ignored() {
        let mut raw = results(&[("Microsoft", "undetected")]);
        raw.insert(
            "SlowAV".to_string(),
            EngineResult {
                category: None,
                result: None,
                engine_name: Some("SlowAV".to_string()),
            },
        );

        let summary =
            ScanSummary::from_results(stats(), &raw, &EngineAllowList::new(["Microsoft"])).unwrap();
        assert!(summary.safe);
        assert_eq!(summary.detailed_results.len(), 1);
    }

    #[test]
    fn test_listed_engine_without_category_is_an_error() {
        let mut raw = results(&[("Microsoft", "undetected")]);
        raw.insert(
            "Sophos".to_string(),
            EngineResult {
                category: None,
                result: None,
                engine_name: None,
            },
        );

        let engines = EngineAllowList::new(["Microsoft", "Sophos"]);
        let err = ScanSummary::from_results(stats(), &raw, &engines).unwrap_err();
        assert_eq!(err, "Sophos");
    }

    #[test]
    fn test_summary_timeout_counts_as_clean() {
        let engines = EngineAllowList::new(["Microsoft", "Bitdefender", "Kaspersky"]);
        let summary = ScanSummary::from_results(
            stats(),
            &results(&[("Microsoft", "undetected"), ("Bitdefender", "timeout")]),
            &engines,
        )
        .unwrap();
        assert!(summary.safe);
    }

    #[test]
    fn test_summary_serializes_wire_shape() {
        let summary = ScanSummary::from_results(
            stats(),
            &results(&[("Microsoft", "undetected")]),
            &EngineAllowList::new(["Microsoft"]),
        )
        .unwrap();
        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(
            value,
            json!({
                "safe": true,
                "stats": {"malicious": 0, "undetected": 5},
                "detailed_results": {"Microsoft": "undetected"}
            })
        );
    }

    #[test]
    fn test_allow_list_trims_and_dedups() {
        let engines = EngineAllowList::new([" Microsoft ", "Microsoft", "", "Sophos"]);
        assert_eq!(engines.len(), 2);
        assert!(engines.contains("Microsoft"));
        assert!(engines.contains("Sophos"));
    }

    #[test]
    fn test_default_allow_list() {
        let engines = EngineAllowList::default();
        assert_eq!(engines.len(), DEFAULT_ENGINES.len());
        for engine in DEFAULT_ENGINES {
            assert!(engines.contains(engine));
        }
    }

    #[test]
    fn test_scan_handle_is_transparent() {
        let handle = ScanHandle::new("abc==");
        assert_eq!(serde_json::to_value(&handle).unwrap(), json!("abc=="));
        assert_eq!(handle.to_string(), "abc==");
    }
}
