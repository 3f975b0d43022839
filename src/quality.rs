//! Quality-control codes, derived quality scores and display labels.
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::{Display, Formatter};

/// ARGO quality-control flag.
///
/// Only the codes in this enum are accepted as a raw `quality_filter` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QcFlag {
    Good,
    ProbablyGood,
    ProbablyBad,
    Bad,
    Estimated,
    Missing,
    Adjusted,
    RealTime,
    RealTimeCorrected,
    DelayedMode,
    Failed,
}

impl QcFlag {
    pub const ALL: [QcFlag; 11] = [
        QcFlag::Good,
        QcFlag::ProbablyGood,
        QcFlag::ProbablyBad,
        QcFlag::Bad,
        QcFlag::Estimated,
        QcFlag::Missing,
        QcFlag::Adjusted,
        QcFlag::RealTime,
        QcFlag::RealTimeCorrected,
        QcFlag::DelayedMode,
        QcFlag::Failed,
    ];

    pub fn from_code(code: &str) -> Option<QcFlag> {
        match code {
            "1" => Some(QcFlag::Good),
            "2" => Some(QcFlag::ProbablyGood),
            "3" => Some(QcFlag::ProbablyBad),
            "4" => Some(QcFlag::Bad),
            "8" => Some(QcFlag::Estimated),
            "9" => Some(QcFlag::Missing),
            "A" => Some(QcFlag::Adjusted),
            "B" => Some(QcFlag::RealTime),
            "C" => Some(QcFlag::RealTimeCorrected),
            "D" => Some(QcFlag::DelayedMode),
            "F" => Some(QcFlag::Failed),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            QcFlag::Good => "1",
            QcFlag::ProbablyGood => "2",
            QcFlag::ProbablyBad => "3",
            QcFlag::Bad => "4",
            QcFlag::Estimated => "8",
            QcFlag::Missing => "9",
            QcFlag::Adjusted => "A",
            QcFlag::RealTime => "B",
            QcFlag::RealTimeCorrected => "C",
            QcFlag::DelayedMode => "D",
            QcFlag::Failed => "F",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            QcFlag::Good => "Good",
            QcFlag::ProbablyGood => "Probably Good",
            QcFlag::ProbablyBad => "Probably Bad",
            QcFlag::Bad => "Bad",
            QcFlag::Estimated => "Estimated",
            QcFlag::Missing => "Missing",
            QcFlag::Adjusted => "Adjusted/Delayed Mode",
            QcFlag::RealTime => "Real-time",
            QcFlag::RealTimeCorrected => "Real-time (Corrected)",
            QcFlag::DelayedMode => "Delayed Mode",
            QcFlag::Failed => "Failed",
        }
    }

    /// Contribution of this flag to the profile quality score.
    pub fn score(&self) -> u32 {
        match self {
            QcFlag::Adjusted => 5,
            QcFlag::Good => 4,
            QcFlag::ProbablyGood => 3,
            QcFlag::RealTime => 2,
            QcFlag::RealTimeCorrected => 1,
            QcFlag::Failed
            | QcFlag::ProbablyBad
            | QcFlag::Bad
            | QcFlag::Estimated
            | QcFlag::Missing
            | QcFlag::DelayedMode => 0,
        }
    }
}

impl Display for QcFlag {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Flags that mark a profile as problematic when any of its three QC fields carries one.
pub const PROBLEMATIC_FLAGS: [QcFlag; 3] =
    [QcFlag::RealTime, QcFlag::RealTimeCorrected, QcFlag::Failed];

fn code_score(code: &str) -> u32 {
    QcFlag::from_code(code).map(|f| f.score()).unwrap_or(0)
}

/// Overall profile quality score from 0 to 5.
///
/// Each of the temperature, salinity and pressure QC codes is scored (`A`=5, `1`=4, `2`=3,
/// `B`=2, `C`=1, anything else 0) and the mean is rounded half-up.
pub fn quality_score(temp_qc: &str, psal_qc: &str, pres_qc: &str) -> u8 {
    let sum = code_score(temp_qc) + code_score(psal_qc) + code_score(pres_qc);
    // round(sum / 3) with halves rounded up, in integer arithmetic
    ((2 * sum + 3) / 6) as u8
}

/// Position quality indicator derived from `position_qc`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionQuality {
    Good,
    Questionable,
}

impl PositionQuality {
    pub fn from_qc(position_qc: Option<&str>) -> PositionQuality {
        match position_qc {
            Some("1") => PositionQuality::Good,
            _ => PositionQuality::Questionable,
        }
    }
}

lazy_static! {
    static ref DATA_CENTRE_LABELS: HashMap<&'static str, &'static str> = HashMap::from([
        ("AO", "AO - Australia (CSIRO)"),
        ("BO", "BO - France (Coriolis)"),
        ("CS", "CS - Canada"),
        ("HZ", "HZ - Japan (JMA)"),
        ("IF", "IF - Germany (BSH)"),
        ("JA", "JA - Japan (JAMSTEC)"),
        ("KM", "KM - South Korea"),
        ("ME", "ME - USA (AOML)"),
        ("NM", "NM - USA (PMEL)"),
        ("PH", "PH - Philippines"),
        ("VN", "VN - India (INCOIS)"),
    ]);
}

pub fn data_centre_label(centre: &str) -> String {
    match DATA_CENTRE_LABELS.get(centre) {
        Some(label) => label.to_string(),
        None => format!("{} - Unknown", centre),
    }
}

pub fn data_mode_label(mode: &str) -> String {
    match mode {
        "R" => "Real-time".to_string(),
        "A" => "Adjusted (Delayed Mode)".to_string(),
        "D" => "Delayed Mode".to_string(),
        other => other.to_string(),
    }
}

pub fn qc_label(code: &str) -> String {
    match QcFlag::from_code(code) {
        Some(flag) => flag.label().to_string(),
        None => format!("QC {}", code),
    }
}
