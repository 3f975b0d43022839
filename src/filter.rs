//! Filter-condition builder.
//!
//! A [FilterRequest] is expanded into an ordered list of [Predicate]s, each a SQL template with
//! positional `?` placeholders and the values bound to them. The rendered `WHERE` clause is
//! shared verbatim by the page, count and measurement-count statements.
use crate::date::{date_string_to_julian_day, DateBound};
use crate::quality::{QcFlag, PROBLEMATIC_FLAGS};
use crate::query::{FilterRequest, QualityFilter};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Profile columns that filters can reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    PlatformNumber,
    DataCentre,
    DataMode,
    PlatformType,
    ProjectName,
    PiName,
    Latitude,
    Longitude,
    Juld,
    DateCreation,
    ProfileTempQc,
    ProfilePsalQc,
    ProfilePresQc,
}

impl Column {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Column::PlatformNumber => "p.platform_number",
            Column::DataCentre => "p.data_centre",
            Column::DataMode => "p.data_mode",
            Column::PlatformType => "p.platform_type",
            Column::ProjectName => "p.project_name",
            Column::PiName => "p.pi_name",
            Column::Latitude => "p.latitude",
            Column::Longitude => "p.longitude",
            Column::Juld => "p.juld",
            Column::DateCreation => "p.date_creation",
            Column::ProfileTempQc => "p.profile_temp_qc",
            Column::ProfilePsalQc => "p.profile_psal_qc",
            Column::ProfilePresQc => "p.profile_pres_qc",
        }
    }
}

/// Fields covered by free-text search, in match order.
pub const SEARCH_COLUMNS: [Column; 5] = [
    Column::PlatformNumber,
    Column::DataCentre,
    Column::ProjectName,
    Column::PiName,
    Column::PlatformType,
];

/// Temperature, salinity and pressure profile QC fields.
pub const QC_COLUMNS: [Column; 3] = [
    Column::ProfileTempQc,
    Column::ProfilePsalQc,
    Column::ProfilePresQc,
];

/// A value bound to a positional placeholder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BindValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl From<&str> for BindValue {
    fn from(value: &str) -> Self {
        BindValue::Text(value.to_string())
    }
}

impl From<QcFlag> for BindValue {
    fn from(flag: QcFlag) -> Self {
        BindValue::Text(flag.code().to_string())
    }
}

/// Typed filter condition before rendering.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Equals(Column, BindValue),
    Between(Column, BindValue, BindValue),
    AtLeast(Column, BindValue),
    AtMost(Column, BindValue),
    /// case-insensitive substring match on any of the columns
    ContainsIgnoreCase(Vec<Column>, String),
    /// every column equals the value
    AllEqual(Vec<Column>, BindValue),
    /// at least one column equals the value
    AnyEqual(Vec<Column>, BindValue),
    /// at least one column is in the set
    AnyIn(Vec<Column>, Vec<BindValue>),
}

/// A rendered predicate template and its bound values, one value per `?`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Predicate {
    pub template: String,
    pub values: Vec<BindValue>,
}

impl Condition {
    pub fn to_predicate(&self) -> Predicate {
        match self {
            Condition::Equals(col, v) => Predicate {
                template: format!("{} = ?", col.as_sql()),
                values: vec![v.clone()],
            },
            Condition::Between(col, min, max) => Predicate {
                template: format!("{} BETWEEN ? AND ?", col.as_sql()),
                values: vec![min.clone(), max.clone()],
            },
            Condition::AtLeast(col, v) => Predicate {
                template: format!("{} >= ?", col.as_sql()),
                values: vec![v.clone()],
            },
            Condition::AtMost(col, v) => Predicate {
                template: format!("{} <= ?", col.as_sql()),
                values: vec![v.clone()],
            },
            Condition::ContainsIgnoreCase(cols, term) => {
                let term = BindValue::Text(format!("%{}%", term));
                let parts = cols
                    .iter()
                    .map(|c| format!("UPPER({}) LIKE UPPER(?)", c.as_sql()))
                    .collect::<Vec<String>>();
                Predicate {
                    template: format!("({})", parts.join(" OR ")),
                    values: vec![term; cols.len()],
                }
            }
            Condition::AllEqual(cols, v) => {
                let parts = cols
                    .iter()
                    .map(|c| format!("{} = ?", c.as_sql()))
                    .collect::<Vec<String>>();
                Predicate {
                    template: format!("({})", parts.join(" AND ")),
                    values: vec![v.clone(); cols.len()],
                }
            }
            Condition::AnyEqual(cols, v) => {
                let parts = cols
                    .iter()
                    .map(|c| format!("{} = ?", c.as_sql()))
                    .collect::<Vec<String>>();
                Predicate {
                    template: format!("({})", parts.join(" OR ")),
                    values: vec![v.clone(); cols.len()],
                }
            }
            Condition::AnyIn(cols, set) => {
                let placeholders = vec!["?"; set.len()].join(", ");
                let parts = cols
                    .iter()
                    .map(|c| format!("{} IN ({})", c.as_sql(), placeholders))
                    .collect::<Vec<String>>();
                Predicate {
                    template: format!("({})", parts.join(" OR ")),
                    values: cols.iter().flat_map(|_| set.iter().cloned()).collect(),
                }
            }
        }
    }
}

fn quality_condition(filter: QualityFilter) -> Option<Condition> {
    match filter {
        QualityFilter::All => None,
        QualityFilter::Good => Some(Condition::AllEqual(
            QC_COLUMNS.to_vec(),
            QcFlag::Adjusted.into(),
        )),
        QualityFilter::RealTime => Some(Condition::Equals(Column::DataMode, "R".into())),
        QualityFilter::Adjusted => Some(Condition::Equals(Column::DataMode, "A".into())),
        QualityFilter::Problematic => Some(Condition::AnyIn(
            QC_COLUMNS.to_vec(),
            PROBLEMATIC_FLAGS.iter().map(|f| (*f).into()).collect(),
        )),
        QualityFilter::Flag(flag) => Some(Condition::AnyEqual(QC_COLUMNS.to_vec(), flag.into())),
    }
}

/// Date bound on the Julian day column, or on the raw creation timestamp when the bound
/// cannot be reduced to a day offset.
fn date_condition(bound: &DateBound, lower: bool) -> Condition {
    let (column, value) = match date_string_to_julian_day(&bound.raw) {
        Ok(day) => (Column::Juld, BindValue::Integer(day)),
        Err(e) => {
            warn!("falling back to date_creation filtering: {}", e);
            (Column::DateCreation, BindValue::Text(bound.iso_string()))
        }
    };
    match lower {
        true => Condition::AtLeast(column, value),
        false => Condition::AtMost(column, value),
    }
}

/// Ordered set of filter conditions for a profile search.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSet {
    conditions: Vec<Condition>,
}

impl FilterSet {
    pub fn from_request(request: &FilterRequest) -> FilterSet {
        let mut conditions = vec![];

        if let Some(term) = &request.search {
            conditions.push(Condition::ContainsIgnoreCase(
                SEARCH_COLUMNS.to_vec(),
                term.clone(),
            ));
        }

        let exact = [
            (Column::PlatformNumber, &request.platform_number),
            (Column::DataCentre, &request.data_center),
            (Column::DataMode, &request.data_mode),
            (Column::PlatformType, &request.platform_type),
            (Column::ProjectName, &request.project_name),
        ];
        for (column, value) in exact {
            if let Some(v) = value {
                conditions.push(Condition::Equals(column, v.as_str().into()));
            }
        }

        if let Some(range) = request.lat_range {
            conditions.push(Condition::Between(
                Column::Latitude,
                BindValue::Float(range.min),
                BindValue::Float(range.max),
            ));
        }
        if let Some(range) = request.lon_range {
            conditions.push(Condition::Between(
                Column::Longitude,
                BindValue::Float(range.min),
                BindValue::Float(range.max),
            ));
        }

        if let Some(start) = &request.date_range.start {
            conditions.push(date_condition(start, true));
        }
        if let Some(end) = &request.date_range.end {
            conditions.push(date_condition(end, false));
        }

        if let Some(condition) = request.quality_filter.and_then(quality_condition) {
            conditions.push(condition);
        }

        FilterSet { conditions }
    }

    pub fn predicates(&self) -> Vec<Predicate> {
        self.conditions.iter().map(|c| c.to_predicate()).collect()
    }

    /// Number of conditions that were applied.
    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// `WHERE a AND b ...`, or an empty string when no condition applies.
    pub fn where_clause(&self) -> String {
        if self.conditions.is_empty() {
            return "".to_string();
        }
        let templates = self
            .predicates()
            .into_iter()
            .map(|p| p.template)
            .collect::<Vec<String>>();
        format!("WHERE {}", templates.join(" AND "))
    }

    /// Bound values in placeholder order.
    pub fn bind_values(&self) -> Vec<BindValue> {
        self.predicates()
            .into_iter()
            .flat_map(|p| p.values)
            .collect()
    }
}
