//! Wire types of the VirusTotal v3 API.
//!
//! Every field is optional on the way in: an absent status is reported as
//! `AnalysisStatus::Missing` rather than failing the decode, and the poll loop
//! decides what a missing `stats` or `results` means.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::COMPLETED_STATUS;

/// Response of `POST /files`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub data: Option<UploadData>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UploadData {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "type", default)]
    pub data_type: Option<String>,
}

impl UploadResponse {
    /// The analysis id at `data.id`, if present and non-empty.
    pub fn analysis_id(&self) -> Option<&str> {
        self.data
            .as_ref()
            .and_then(|d| d.id.as_deref())
            .filter(|id| !id.trim().is_empty())
    }
}

/// Response of `GET /analyses/{id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisResponse {
    #[serde(default)]
    pub data: Option<AnalysisData>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisData {
    #[serde(default)]
    pub attributes: Option<AnalysisAttributes>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisAttributes {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub stats: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(default)]
    pub results: Option<HashMap<String, EngineResult>>,
}

/// One engine's verdict inside `results`.
///
/// `category` may be null for engines that did not finish; only the
/// allow-listed engines are required to carry one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineResult {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub engine_name: Option<String>,
}

impl AnalysisResponse {
    pub fn attributes(&self) -> Option<&AnalysisAttributes> {
        self.data.as_ref().and_then(|d| d.attributes.as_ref())
    }

    /// Status at `data.attributes.status`.
    pub fn status(&self) -> AnalysisStatus {
        AnalysisStatus::parse(self.attributes().and_then(|a| a.status.as_deref()))
    }
}

/// Analysis status as reported by the upstream.
///
/// Only `Completed` is terminal; everything else means "ask again".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisStatus {
    Queued,
    InProgress,
    Completed,
    /// A status string we have never seen
    Unknown(String),
    /// No status field at all
    Missing,
}

impl AnalysisStatus {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            None => AnalysisStatus::Missing,
            Some(COMPLETED_STATUS) => AnalysisStatus::Completed,
            Some("queued") => AnalysisStatus::Queued,
            Some("in-progress") => AnalysisStatus::InProgress,
            Some(other) => AnalysisStatus::Unknown(other.to_string()),
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, AnalysisStatus::Completed)
    }

    /// True for statuses outside the documented vocabulary.
    pub fn is_unrecognized(&self) -> bool {
        matches!(self, AnalysisStatus::Unknown(_) | AnalysisStatus::Missing)
    }

    pub fn as_str(&self) -> &str {
        match self {
            AnalysisStatus::Queued => "queued",
            AnalysisStatus::InProgress => "in-progress",
            AnalysisStatus::Completed => COMPLETED_STATUS,
            AnalysisStatus::Unknown(s) => s,
            AnalysisStatus::Missing => "<missing>",
        }
    }
}
