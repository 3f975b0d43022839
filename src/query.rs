//! Query-related structs and implementation.
use crate::date::{validate_date_range, DateRange};
use crate::quality::QcFlag;
use crate::ArgoError;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 20;
pub const MAX_LIMIT: u32 = 100;

/// ProfileQuery represents the raw, loosely-typed query-string parameters of a profile search.
///
/// Every field is kept as the string the caller supplied; [FilterRequest::from_query] turns it
/// into validated filters.
///
/// Example for constructing a ProfileQuery:
/// ```
/// use argo_dashboard::ProfileQuery;
/// let params = ProfileQuery::new()
///     .search("ME")
///     .lat_range(-10.0, 10.0)
///     .start_date("2024-01-01")
///     .quality_filter("good")
///     .page(2)
///     .limit(10);
/// assert_eq!(
///     params.to_string(),
///     "?search=ME&min_lat=-10&max_lat=10&start_date=2024-01-01&quality_filter=good&page=2&limit=10"
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileQuery {
    /// free-text match against platform number, data centre, project, PI name and platform type
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    /// exact platform (float) number
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform_number: Option<String>,
    /// exact data centre code, e.g. `ME`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_center: Option<String>,
    /// exact data mode: `R`, `A` or `D`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_lat: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_lat: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_lon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_lon: Option<String>,
    /// inclusive start date, e.g. `2024-01-01`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    /// inclusive end date
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    /// `all`, `good`, `real_time`, `adjusted`, `problematic` or a raw QC code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality_filter: Option<String>,
    /// page number, starting from 1
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
    /// number of profiles per page, default 20, max 100
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    /// `asc` or `desc`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<String>,
}

impl Display for ProfileQuery {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let fields = [
            ("search", &self.search),
            ("platform_number", &self.platform_number),
            ("data_center", &self.data_center),
            ("data_mode", &self.data_mode),
            ("platform_type", &self.platform_type),
            ("project_name", &self.project_name),
            ("min_lat", &self.min_lat),
            ("max_lat", &self.max_lat),
            ("min_lon", &self.min_lon),
            ("max_lon", &self.max_lon),
            ("start_date", &self.start_date),
            ("end_date", &self.end_date),
            ("quality_filter", &self.quality_filter),
            ("page", &self.page),
            ("limit", &self.limit),
            ("sort_by", &self.sort_by),
            ("sort_order", &self.sort_order),
        ];
        let params_vec = fields
            .iter()
            .filter_map(|(name, value)| value.as_ref().map(|v| format!("{}={}", name, v)))
            .collect::<Vec<String>>();

        if !params_vec.is_empty() {
            write!(f, "?{}", params_vec.join("&"))
        } else {
            write!(f, "")
        }
    }
}

impl ProfileQuery {
    pub fn new() -> ProfileQuery {
        ProfileQuery::default()
    }

    /// Build from raw query-string pairs. The first value of a repeated key wins and unknown
    /// keys are ignored.
    pub fn from_pairs<K: AsRef<str>, V: AsRef<str>>(pairs: &[(K, V)]) -> ProfileQuery {
        let mut query = ProfileQuery::default();
        for (key, value) in pairs {
            let slot = match key.as_ref() {
                "search" => &mut query.search,
                "platform_number" => &mut query.platform_number,
                "data_center" => &mut query.data_center,
                "data_mode" => &mut query.data_mode,
                "platform_type" => &mut query.platform_type,
                "project_name" => &mut query.project_name,
                "min_lat" => &mut query.min_lat,
                "max_lat" => &mut query.max_lat,
                "min_lon" => &mut query.min_lon,
                "max_lon" => &mut query.max_lon,
                "start_date" => &mut query.start_date,
                "end_date" => &mut query.end_date,
                "quality_filter" => &mut query.quality_filter,
                "page" => &mut query.page,
                "limit" => &mut query.limit,
                "sort_by" => &mut query.sort_by,
                "sort_order" => &mut query.sort_order,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.as_ref().to_string());
            }
        }
        query
    }

    pub fn search(self, search: &str) -> Self {
        ProfileQuery {
            search: Some(search.to_string()),
            ..self
        }
    }

    pub fn platform_number(self, platform_number: &str) -> Self {
        ProfileQuery {
            platform_number: Some(platform_number.to_string()),
            ..self
        }
    }

    pub fn data_center(self, data_center: &str) -> Self {
        ProfileQuery {
            data_center: Some(data_center.to_string()),
            ..self
        }
    }

    pub fn data_mode(self, data_mode: &str) -> Self {
        ProfileQuery {
            data_mode: Some(data_mode.to_string()),
            ..self
        }
    }

    pub fn platform_type(self, platform_type: &str) -> Self {
        ProfileQuery {
            platform_type: Some(platform_type.to_string()),
            ..self
        }
    }

    pub fn project_name(self, project_name: &str) -> Self {
        ProfileQuery {
            project_name: Some(project_name.to_string()),
            ..self
        }
    }

    /// set both latitude bounds; a single bound is never applied on its own.
    pub fn lat_range(self, min: f64, max: f64) -> Self {
        ProfileQuery {
            min_lat: Some(min.to_string()),
            max_lat: Some(max.to_string()),
            ..self
        }
    }

    pub fn lon_range(self, min: f64, max: f64) -> Self {
        ProfileQuery {
            min_lon: Some(min.to_string()),
            max_lon: Some(max.to_string()),
            ..self
        }
    }

    pub fn start_date(self, start_date: &str) -> Self {
        ProfileQuery {
            start_date: Some(start_date.to_string()),
            ..self
        }
    }

    pub fn end_date(self, end_date: &str) -> Self {
        ProfileQuery {
            end_date: Some(end_date.to_string()),
            ..self
        }
    }

    pub fn quality_filter(self, quality_filter: &str) -> Self {
        ProfileQuery {
            quality_filter: Some(quality_filter.to_string()),
            ..self
        }
    }

    /// set page number for pagination. **the page number starts from 1**.
    pub fn page(self, page: u32) -> Self {
        ProfileQuery {
            page: Some(page.to_string()),
            ..self
        }
    }

    pub fn limit(self, limit: u32) -> Self {
        ProfileQuery {
            limit: Some(limit.to_string()),
            ..self
        }
    }

    pub fn sort_by(self, sort_by: &str) -> Self {
        ProfileQuery {
            sort_by: Some(sort_by.to_string()),
            ..self
        }
    }

    pub fn sort_order(self, sort_order: &str) -> Self {
        ProfileQuery {
            sort_order: Some(sort_order.to_string()),
            ..self
        }
    }
}

/// Columns a profile search can be ordered by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    DateCreation,
    Juld,
    PlatformNumber,
    CycleNumber,
    Latitude,
    Longitude,
}

impl SortField {
    /// Parse a `sort_by` value; anything outside the whitelist falls back to `date_creation`.
    pub fn from_param(value: Option<&str>) -> SortField {
        match value {
            Some("date_creation") => SortField::DateCreation,
            Some("juld") => SortField::Juld,
            Some("platform_number") => SortField::PlatformNumber,
            Some("cycle_number") => SortField::CycleNumber,
            Some("latitude") => SortField::Latitude,
            Some("longitude") => SortField::Longitude,
            _ => SortField::default(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::DateCreation => "date_creation",
            SortField::Juld => "juld",
            SortField::PlatformNumber => "platform_number",
            SortField::CycleNumber => "cycle_number",
            SortField::Latitude => "latitude",
            SortField::Longitude => "longitude",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    /// Parse a `sort_order` value; anything but `asc`/`desc` falls back to `desc`.
    pub fn from_param(value: Option<&str>) -> SortOrder {
        match value {
            Some("asc") => SortOrder::Asc,
            Some("desc") => SortOrder::Desc,
            _ => SortOrder::default(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Quality filter presets plus raw QC codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityFilter {
    All,
    /// all three profile QC flags are `A`
    Good,
    /// data mode `R`
    RealTime,
    /// data mode `A`
    Adjusted,
    /// any of the three profile QC flags is `B`, `C` or `F`
    Problematic,
    /// any of the three profile QC flags equals the code
    Flag(QcFlag),
}

impl QualityFilter {
    /// Parse a `quality_filter` value. Unknown values yield `None` and are dropped.
    pub fn from_param(value: &str) -> Option<QualityFilter> {
        match value {
            "all" => Some(QualityFilter::All),
            "good" => Some(QualityFilter::Good),
            "real_time" => Some(QualityFilter::RealTime),
            "adjusted" => Some(QualityFilter::Adjusted),
            "problematic" => Some(QualityFilter::Problematic),
            code => QcFlag::from_code(code).map(QualityFilter::Flag),
        }
    }
}

/// Inclusive numeric range on one axis of the bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingRange {
    pub min: f64,
    pub max: f64,
}

impl BoundingRange {
    /// Both bounds must be present and numeric, otherwise the axis is not filtered.
    fn from_params(min: Option<&str>, max: Option<&str>) -> Option<BoundingRange> {
        let min = min?.trim().parse::<f64>().ok()?;
        let max = max?.trim().parse::<f64>().ok()?;
        match min.is_finite() && max.is_finite() {
            true => Some(BoundingRange { min, max }),
            false => None,
        }
    }
}

/// Validated profile search request.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterRequest {
    pub search: Option<String>,
    pub platform_number: Option<String>,
    pub data_center: Option<String>,
    pub data_mode: Option<String>,
    pub platform_type: Option<String>,
    pub project_name: Option<String>,
    pub lat_range: Option<BoundingRange>,
    pub lon_range: Option<BoundingRange>,
    pub date_range: DateRange,
    pub quality_filter: Option<QualityFilter>,
    pub page: u32,
    pub limit: u32,
    pub sort_by: SortField,
    pub sort_order: SortOrder,
}

impl Default for FilterRequest {
    fn default() -> Self {
        FilterRequest {
            search: None,
            platform_number: None,
            data_center: None,
            data_mode: None,
            platform_type: None,
            project_name: None,
            lat_range: None,
            lon_range: None,
            date_range: DateRange::default(),
            quality_filter: None,
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
            sort_by: SortField::default(),
            sort_order: SortOrder::default(),
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn parse_page(value: Option<&str>) -> u32 {
    value
        .and_then(|v| v.trim().parse::<u32>().ok())
        .filter(|p| *p >= 1)
        .unwrap_or(DEFAULT_PAGE)
}

fn parse_limit(value: Option<&str>) -> u32 {
    match value.and_then(|v| v.trim().parse::<i64>().ok()) {
        Some(limit) => limit.clamp(1, MAX_LIMIT as i64) as u32,
        None => DEFAULT_LIMIT,
    }
}

impl FilterRequest {
    /// Build a validated request from raw query parameters.
    ///
    /// Unknown or malformed values fall back to their defaults. The only error is an invalid
    /// date range ([ArgoError::InvalidDateRange]).
    pub fn from_query(query: &ProfileQuery) -> Result<FilterRequest, ArgoError> {
        let date_range =
            validate_date_range(non_empty(&query.start_date), non_empty(&query.end_date))?;

        Ok(FilterRequest {
            search: non_empty(&query.search).map(str::to_string),
            platform_number: non_empty(&query.platform_number).map(str::to_string),
            data_center: non_empty(&query.data_center).map(str::to_string),
            data_mode: non_empty(&query.data_mode).map(str::to_string),
            platform_type: non_empty(&query.platform_type).map(str::to_string),
            project_name: non_empty(&query.project_name).map(str::to_string),
            lat_range: BoundingRange::from_params(
                non_empty(&query.min_lat),
                non_empty(&query.max_lat),
            ),
            lon_range: BoundingRange::from_params(
                non_empty(&query.min_lon),
                non_empty(&query.max_lon),
            ),
            date_range,
            quality_filter: non_empty(&query.quality_filter).and_then(QualityFilter::from_param),
            page: parse_page(non_empty(&query.page)),
            limit: parse_limit(non_empty(&query.limit)),
            sort_by: SortField::from_param(non_empty(&query.sort_by)),
            sort_order: SortOrder::from_param(non_empty(&query.sort_order)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_pairs_first_wins() {
        let pairs = [
            ("page", "1"),
            ("sort_by", "latitude"),
            ("page", "2"),
            ("sort_by", "juld"),
            ("unknown", "x"),
            ("data_center", "ME"),
        ];
        let query = ProfileQuery::from_pairs(&pairs);
        assert_eq!(query.page.as_deref(), Some("1"));
        assert_eq!(query.sort_by.as_deref(), Some("latitude"));
        assert_eq!(query.data_center.as_deref(), Some("ME"));
        assert_eq!(query.to_string(), "?data_center=ME&page=1&sort_by=latitude");
    }

    #[test]
    fn test_param_to_string() {
        let param = ProfileQuery {
            platform_number: Some("2902746".to_string()),
            page: Some("2".to_string()),
            ..Default::default()
        };
        assert_eq!(
            "?platform_number=2902746&page=2".to_string(),
            param.to_string()
        );
        assert_eq!("".to_string(), ProfileQuery::new().to_string());
    }

    #[test]
    fn test_defaults() {
        let request = FilterRequest::from_query(&ProfileQuery::new()).unwrap();
        assert_eq!(request, FilterRequest::default());
        assert_eq!(request.page, 1);
        assert_eq!(request.limit, 20);
        assert_eq!(request.sort_by, SortField::DateCreation);
        assert_eq!(request.sort_order, SortOrder::Desc);
    }

    #[test]
    fn test_pagination_parsing() {
        let parse = |page: &str, limit: &str| {
            let query = ProfileQuery {
                page: Some(page.to_string()),
                limit: Some(limit.to_string()),
                ..Default::default()
            };
            let request = FilterRequest::from_query(&query).unwrap();
            (request.page, request.limit)
        };
        assert_eq!(parse("3", "50"), (3, 50));
        assert_eq!(parse("0", "500"), (1, 100));
        assert_eq!(parse("-4", "0"), (1, 1));
        assert_eq!(parse("abc", "xyz"), (1, 20));
        assert_eq!(parse("", ""), (1, 20));
    }

    #[test]
    fn test_sort_fallback() {
        let query = ProfileQuery::new()
            .sort_by("pi_name; DROP TABLE profiles")
            .sort_order("sideways");
        let request = FilterRequest::from_query(&query).unwrap();
        assert_eq!(request.sort_by, SortField::DateCreation);
        assert_eq!(request.sort_order, SortOrder::Desc);

        let query = ProfileQuery::new().sort_by("cycle_number").sort_order("asc");
        let request = FilterRequest::from_query(&query).unwrap();
        assert_eq!(request.sort_by, SortField::CycleNumber);
        assert_eq!(request.sort_order, SortOrder::Asc);
    }

    #[test]
    fn test_quality_filter_parsing() {
        assert_eq!(
            QualityFilter::from_param("problematic"),
            Some(QualityFilter::Problematic)
        );
        assert_eq!(
            QualityFilter::from_param("C"),
            Some(QualityFilter::Flag(QcFlag::RealTimeCorrected))
        );
        assert_eq!(QualityFilter::from_param("excellent"), None);
        assert_eq!(QualityFilter::from_param("5"), None);
    }

    #[test]
    fn test_one_sided_bounding_box_is_dropped() {
        let query = ProfileQuery {
            min_lat: Some("-10".to_string()),
            min_lon: Some("20".to_string()),
            max_lon: Some("not-a-number".to_string()),
            ..Default::default()
        };
        let request = FilterRequest::from_query(&query).unwrap();
        assert_eq!(request.lat_range, None);
        assert_eq!(request.lon_range, None);

        let query = ProfileQuery::new().lat_range(-10.0, 10.5);
        let request = FilterRequest::from_query(&query).unwrap();
        assert_eq!(
            request.lat_range,
            Some(BoundingRange {
                min: -10.0,
                max: 10.5
            })
        );
    }

    #[test]
    fn test_empty_strings_are_absent() {
        let query = ProfileQuery::new().search("").data_center("").quality_filter("");
        let request = FilterRequest::from_query(&query).unwrap();
        assert_eq!(request.search, None);
        assert_eq!(request.data_center, None);
        assert_eq!(request.quality_filter, None);
    }

    #[test]
    fn test_invalid_date_range() {
        let query = ProfileQuery::new()
            .start_date("2024-06-01")
            .end_date("2024-01-01");
        assert!(matches!(
            FilterRequest::from_query(&query),
            Err(ArgoError::InvalidDateRange(_))
        ));
    }
}
