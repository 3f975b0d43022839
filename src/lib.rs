/*!
# Overview

[argo-dashboard][crate] is the backend of a dashboard for browsing ARGO oceanographic float
profiles. It turns loosely-typed query-string parameters into parameterized SQL against an
analytical warehouse, paginates the results and derives display fields (quality score, position
quality, calendar date from the Julian day) for every profile.

# Building Queries

A [ProfileQuery] holds the raw parameters. [FilterRequest::from_query] validates them, and a
[QueryPlan] renders the statements that share one predicate set:

```rust
use argo_dashboard::{FilterRequest, ProfileQuery, QueryPlan, Tables};

let query = ProfileQuery::new()
    .data_center("ME")
    .start_date("2024-01-01")
    .quality_filter("problematic")
    .page(2)
    .limit(10);
let request = FilterRequest::from_query(&query).unwrap();
let plan = QueryPlan::new(&request, &Tables::default());

let rows = plan.rows_statement();
assert!(rows.sql.contains("LIMIT 10 OFFSET 10"));
assert_eq!(rows.sql.matches('?').count(), rows.params.len());
```

# Querying a Running Dashboard

[ArgoDashboard] is a blocking client for the HTTP API served by the `argo-dashboard serve`
command.

```no_run
use argo_dashboard::ArgoDashboard;

let dashboard = ArgoDashboard::new()
    .dashboard_url("http://localhost:40080/api")
    .search("ME")
    .limit(10);
let res = dashboard.query_single_page().unwrap();
for profile in res.profiles {
    println!("{}", profile);
}
```
*/

mod config;
mod date;
#[cfg(feature = "backend")]
mod db;
mod error;
mod filter;
mod item;
mod plan;
mod quality;
mod query;

use serde::de::DeserializeOwned;
use std::fmt::Display;
use tracing::info;

pub use config::{ApiConfig, ArgoConfig, WarehouseConfig};
pub use date::{
    date_string_to_julian_day, datetime_to_julian_day, julian_day_to_datetime, parse_date,
    validate_date_range, DateBound, DateRange, JULIAN_EPOCH_MS,
};
#[cfg(feature = "backend")]
pub use db::{ChartType, ProfileStore, SqliteWarehouse, Warehouse};
pub use error::ArgoError;
pub use filter::{BindValue, Column, Condition, FilterSet, Predicate};
pub use item::{
    ChartConfig, ChartResponse, EnhancedProfile, ErrorBody, FilterOptions, FilterOptionsResponse,
    FiltersApplied, LabeledOption, Measurement, Pagination, ProfileMeasurements, ProfileSummary,
    ProfilesResponse, QualityBreakdown, Record, RecordExt, Statistics,
};
pub use plan::{PageWindow, QueryPlan, Statement, Tables};
pub use quality::{
    data_centre_label, data_mode_label, qc_label, quality_score, PositionQuality, QcFlag,
};
pub use query::{
    BoundingRange, FilterRequest, ProfileQuery, QualityFilter, SortField, SortOrder,
    DEFAULT_LIMIT, DEFAULT_PAGE, MAX_LIMIT,
};

/// ArgoDashboard struct maintains the dashboard API URL and handles making API queries.
///
/// See [module doc][crate] for usage examples.
#[derive(Clone)]
pub struct ArgoDashboard {
    pub dashboard_url: String,
    pub query: ProfileQuery,
    client: reqwest::blocking::Client,
}

impl Default for ArgoDashboard {
    fn default() -> Self {
        let url = match std::env::var("ARGO_DASHBOARD_URL") {
            Ok(url) => url.trim_end_matches('/').to_string(),
            Err(_) => "http://localhost:40080/api".to_string(),
        };
        Self {
            dashboard_url: url,
            query: Default::default(),
            client: reqwest::blocking::Client::new(),
        }
    }
}

/// Map a non-success response to the matching error variant.
fn error_from_response(status: reqwest::StatusCode, body: &str) -> ArgoError {
    let message = match serde_json::from_str::<ErrorBody>(body) {
        Ok(err) => format!("{}: {}", err.error, err.message),
        Err(_) => body.to_string(),
    };
    match status.as_u16() {
        400 => ArgoError::InvalidInput(message),
        404 => ArgoError::NotFound(message),
        _ => ArgoError::UpstreamQueryFailure(message),
    }
}

impl ArgoDashboard {
    /// Construct new ArgoDashboard object.
    ///
    /// The URL and query parameters can be adjusted with other functions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the dashboard API URL, e.g. `http://localhost:40080/api`.
    pub fn dashboard_url<S: Display>(self, url: S) -> Self {
        Self {
            dashboard_url: url.to_string().trim_end_matches('/').to_string(),
            ..self
        }
    }

    /// Replace all query parameters at once.
    pub fn with_query(self, query: ProfileQuery) -> Self {
        Self { query, ..self }
    }

    pub fn search<S: Display>(self, search: S) -> Self {
        let query = self.query.clone().search(&search.to_string());
        Self { query, ..self }
    }

    pub fn platform_number<S: Display>(self, platform_number: S) -> Self {
        let query = self
            .query
            .clone()
            .platform_number(&platform_number.to_string());
        Self { query, ..self }
    }

    pub fn data_center<S: Display>(self, data_center: S) -> Self {
        let query = self.query.clone().data_center(&data_center.to_string());
        Self { query, ..self }
    }

    pub fn data_mode<S: Display>(self, data_mode: S) -> Self {
        let query = self.query.clone().data_mode(&data_mode.to_string());
        Self { query, ..self }
    }

    pub fn platform_type<S: Display>(self, platform_type: S) -> Self {
        let query = self.query.clone().platform_type(&platform_type.to_string());
        Self { query, ..self }
    }

    pub fn project_name<S: Display>(self, project_name: S) -> Self {
        let query = self.query.clone().project_name(&project_name.to_string());
        Self { query, ..self }
    }

    pub fn lat_range(self, min: f64, max: f64) -> Self {
        let query = self.query.clone().lat_range(min, max);
        Self { query, ..self }
    }

    pub fn lon_range(self, min: f64, max: f64) -> Self {
        let query = self.query.clone().lon_range(min, max);
        Self { query, ..self }
    }

    pub fn start_date<S: Display>(self, start_date: S) -> Self {
        let query = self.query.clone().start_date(&start_date.to_string());
        Self { query, ..self }
    }

    pub fn end_date<S: Display>(self, end_date: S) -> Self {
        let query = self.query.clone().end_date(&end_date.to_string());
        Self { query, ..self }
    }

    /// `all`, `good`, `real_time`, `adjusted`, `problematic` or a raw QC code.
    pub fn quality_filter<S: Display>(self, quality_filter: S) -> Self {
        let query = self.query.clone().quality_filter(&quality_filter.to_string());
        Self { query, ..self }
    }

    /// Set the page number. **The page number starts from 1**.
    pub fn page(self, page: u32) -> Self {
        let query = self.query.clone().page(page);
        Self { query, ..self }
    }

    pub fn limit(self, limit: u32) -> Self {
        let query = self.query.clone().limit(limit);
        Self { query, ..self }
    }

    pub fn sort_by<S: Display>(self, sort_by: S) -> Self {
        let query = self.query.clone().sort_by(&sort_by.to_string());
        Self { query, ..self }
    }

    pub fn sort_order<S: Display>(self, sort_order: S) -> Self {
        let query = self.query.clone().sort_order(&sort_order.to_string());
        Self { query, ..self }
    }

    /// Turn to specified page, page starting from 1.
    pub fn turn_page(&mut self, page: u32) {
        self.query.page = Some(page.to_string());
    }

    /// Send a profile search for the current page.
    pub fn query_single_page(&self) -> Result<ProfilesResponse, ArgoError> {
        let url = format!("{}/profiles/enhanced", &self.dashboard_url);
        info!("sending profile query to {}{}", &url, &self.query);
        self.run_query(self.client.get(url.as_str()).query(&self.query))
    }

    /// Measurement levels of one profile.
    pub fn measurements(&self, profile_id: i64) -> Result<ProfileMeasurements, ArgoError> {
        let url = format!(
            "{}/profiles/{}/measurements",
            &self.dashboard_url, profile_id
        );
        self.run_query(self.client.get(url.as_str()))
    }

    pub fn filter_options(&self) -> Result<FilterOptionsResponse, ArgoError> {
        let url = format!("{}/profiles/filters/options", &self.dashboard_url);
        self.run_query(self.client.get(url.as_str()))
    }

    /// Chart dataset by name, e.g. `data-mode-pie`.
    pub fn chart(&self, chart_type: &str) -> Result<ChartResponse, ArgoError> {
        let url = format!("{}/charts", &self.dashboard_url);
        self.run_query(self.client.get(url.as_str()).query(&[("type", chart_type)]))
    }

    /// Check if the dashboard API is reachable and healthy.
    pub fn health_check(&self) -> Result<(), ArgoError> {
        let url = format!("{}/health", &self.dashboard_url);
        match self.client.get(url.as_str()).send() {
            Ok(response) => {
                if response.status() == reqwest::StatusCode::OK {
                    Ok(())
                } else {
                    Err(ArgoError::UpstreamQueryFailure(format!(
                        "endpoint unhealthy {}",
                        self.dashboard_url
                    )))
                }
            }
            Err(e) => Err(ArgoError::NetworkError(e)),
        }
    }

    fn run_query<T: DeserializeOwned>(
        &self,
        request: reqwest::blocking::RequestBuilder,
    ) -> Result<T, ArgoError> {
        let response = request.send()?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(error_from_response(status, body.as_str()));
        }
        Ok(response.json::<T>()?)
    }
}
