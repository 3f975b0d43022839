//! Response items returned by the dashboard API.
//!
//! All response envelopes use camelCase keys; profile and measurement rows keep the warehouse
//! column names.
use crate::date::julian_day_to_datetime;
use crate::quality::{quality_score, PositionQuality};
use crate::query::{SortField, SortOrder};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

/// A warehouse row: column name to JSON value.
pub type Record = serde_json::Map<String, Value>;

/// Typed accessors on warehouse rows.
pub trait RecordExt {
    fn get_str(&self, key: &str) -> Option<&str>;
    fn get_i64(&self, key: &str) -> Option<i64>;
    fn get_f64(&self, key: &str) -> Option<f64>;
}

impl RecordExt for Record {
    fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    fn get_i64(&self, key: &str) -> Option<i64> {
        match self.get(key)? {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    fn get_f64(&self, key: &str) -> Option<f64> {
        match self.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

/// A profile row with its derived display fields.
///
/// - [juld_readable][EnhancedProfile::juld_readable]: `juld` converted to a UTC timestamp
/// - [position_quality][EnhancedProfile::position_quality]: `good` when `position_qc` is `1`
/// - [quality_score][EnhancedProfile::quality_score]: 0-5 score from the three profile QC flags
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnhancedProfile {
    #[serde(flatten)]
    pub fields: Record,
    pub juld_readable: Option<DateTime<Utc>>,
    pub position_quality: PositionQuality,
    pub quality_score: u8,
}

impl EnhancedProfile {
    pub fn from_record(fields: Record) -> EnhancedProfile {
        let juld_readable = fields.get_f64("juld").and_then(julian_day_to_datetime);
        let position_quality = PositionQuality::from_qc(fields.get_str("position_qc"));
        let quality_score = quality_score(
            fields.get_str("profile_temp_qc").unwrap_or_default(),
            fields.get_str("profile_psal_qc").unwrap_or_default(),
            fields.get_str("profile_pres_qc").unwrap_or_default(),
        );
        EnhancedProfile {
            fields,
            juld_readable,
            position_quality,
            quality_score,
        }
    }

    pub fn profile_id(&self) -> Option<i64> {
        self.fields.get_i64("profile_id")
    }
}

impl Display for EnhancedProfile {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| std::fmt::Error)?;
        write!(f, "{}", json)
    }
}

/// Compact profile row for terminal tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(tabled::Tabled))]
pub struct ProfileSummary {
    pub profile_id: String,
    pub platform_number: String,
    pub cycle_number: String,
    pub latitude: String,
    pub longitude: String,
    pub date: String,
    pub data_mode: String,
    pub quality_score: u8,
}

impl From<&EnhancedProfile> for ProfileSummary {
    fn from(profile: &EnhancedProfile) -> Self {
        let text = |key: &str| match profile.fields.get(key) {
            None | Some(Value::Null) => "".to_string(),
            Some(Value::String(s)) => s.clone(),
            Some(v) => v.to_string(),
        };
        ProfileSummary {
            profile_id: text("profile_id"),
            platform_number: text("platform_number"),
            cycle_number: text("cycle_number"),
            latitude: text("latitude"),
            longitude: text("longitude"),
            date: profile
                .juld_readable
                .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_default(),
            data_mode: text("data_mode"),
            quality_score: profile.quality_score,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub offset: u64,
    pub total: u64,
    pub total_pages: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityBreakdown {
    pub count: u64,
    /// mean temperature QC score, two decimals
    pub avg_temp_quality: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub total_profiles: u64,
    pub total_measurements: u64,
    /// keyed by data mode; empty when the breakdown query failed
    pub quality_breakdown: BTreeMap<String, QualityBreakdown>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FiltersApplied {
    /// number of filter conditions applied
    pub applied: usize,
    pub sort_by: SortField,
    pub sort_order: SortOrder,
}

/// Paged profile search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilesResponse {
    pub profiles: Vec<EnhancedProfile>,
    pub pagination: Pagination,
    pub statistics: Statistics,
    pub filters: FiltersApplied,
    pub last_updated: DateTime<Utc>,
}

/// One measurement level of a profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// 1-based position in the returned list
    pub measurement_id: u32,
    pub level_index: Option<i64>,
    pub pres_adjusted: Option<f64>,
    pub temp_adjusted: Option<f64>,
    pub psal_adjusted: Option<f64>,
    pub temp_qc: String,
    pub psal_qc: String,
    pub pres_qc: String,
    pub temp_adjusted_error: Option<f64>,
    pub psal_adjusted_error: Option<f64>,
    pub pres_adjusted_error: Option<f64>,
}

/// QC flag assumed for measurements that carry none.
pub const DEFAULT_MEASUREMENT_QC: &str = "1";

impl Measurement {
    pub fn from_record(measurement_id: u32, record: &Record) -> Measurement {
        let qc = |key: &str| {
            record
                .get_str(key)
                .filter(|v| !v.is_empty())
                .unwrap_or(DEFAULT_MEASUREMENT_QC)
                .to_string()
        };
        Measurement {
            measurement_id,
            level_index: record.get_i64("level_index"),
            pres_adjusted: record.get_f64("pres_adjusted"),
            temp_adjusted: record.get_f64("temp_adjusted"),
            psal_adjusted: record.get_f64("psal_adjusted"),
            temp_qc: qc("temp_qc"),
            psal_qc: qc("psal_qc"),
            pres_qc: qc("pres_qc"),
            temp_adjusted_error: record.get_f64("temp_adjusted_error"),
            psal_adjusted_error: record.get_f64("psal_adjusted_error"),
            pres_adjusted_error: record.get_f64("pres_adjusted_error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileMeasurements {
    pub profile: Record,
    pub measurements: Vec<Measurement>,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledOption {
    pub value: String,
    pub label: String,
}

impl LabeledOption {
    pub fn new(value: &str, label: &str) -> Self {
        LabeledOption {
            value: value.to_string(),
            label: label.to_string(),
        }
    }
}

/// Values for the filter dropdowns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    pub data_centres: Vec<LabeledOption>,
    pub data_modes: Vec<LabeledOption>,
    pub platform_types: Vec<String>,
    pub projects: Vec<String>,
    pub quality_options: Vec<LabeledOption>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptionsResponse {
    pub success: bool,
    pub options: FilterOptions,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartConfig {
    pub title: String,
    pub description: String,
    /// rendering hint: `map`, `pie`, `line`, `scatter` or `bar`
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartResponse {
    pub success: bool,
    pub chart_type: String,
    pub config: ChartConfig,
    pub data: Value,
    pub last_updated: DateTime<Utc>,
}

/// JSON error body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}
