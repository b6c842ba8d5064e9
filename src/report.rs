//! Streak report encoding
//!
//! This module encodes query outcomes into JSON reports for the presentation
//! layer. A no-data outcome is a regular report with `status = no_data`, so
//! consumers can tell "nothing to show" apart from an empty result set.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StreakError;
use crate::pipeline::StreakQuery;
use crate::types::StreakSummary;
use crate::{PRODUCER_NAME, VERSION};

/// Current report schema version
pub const REPORT_VERSION: &str = "1.0.0";

/// Report producer metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Whether a report carries rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Ok,
    NoData,
}

/// Complete streak report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreakReport {
    pub report_version: String,
    pub producer: ReportProducer,
    pub computed_at_utc: String,
    /// Query that produced the report (e.g. `all`, `habit:Jogging`)
    pub query: String,
    pub status: ReportStatus,
    /// Human-readable explanation for no-data reports
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub rows: Vec<StreakSummary>,
}

/// Report encoder with a stable producer instance id
pub struct ReportEncoder {
    instance_id: String,
}

impl Default for ReportEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    /// Encode a query outcome; errors other than no-data are passed through
    pub fn encode(
        &self,
        query: &StreakQuery,
        outcome: Result<Vec<StreakSummary>, StreakError>,
    ) -> Result<StreakReport, StreakError> {
        let (status, message, rows) = match outcome {
            Ok(rows) => (ReportStatus::Ok, None, rows),
            Err(e) if e.is_no_data() => (ReportStatus::NoData, Some(e.to_string()), Vec::new()),
            Err(e) => return Err(e),
        };

        Ok(StreakReport {
            report_version: REPORT_VERSION.to_string(),
            producer: ReportProducer {
                name: PRODUCER_NAME.to_string(),
                version: VERSION.to_string(),
                instance_id: self.instance_id.clone(),
            },
            computed_at_utc: Utc::now().to_rfc3339(),
            query: query.to_string(),
            status,
            message,
            rows,
        })
    }

    /// Encode to JSON string
    pub fn encode_to_json(
        &self,
        query: &StreakQuery,
        outcome: Result<Vec<StreakSummary>, StreakError>,
    ) -> Result<String, StreakError> {
        let report = self.encode(query, outcome)?;
        Ok(serde_json::to_string(&report)?)
    }
}
