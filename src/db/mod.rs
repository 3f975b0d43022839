//! Warehouse access and request coordination.
//!
//! [ProfileStore] pairs a [Warehouse] with the validated table names and answers every
//! dashboard request: paged profile search, measurement lookup, filter options and charts.
mod charts;
mod measurements;
mod options;
mod sqlite;
mod traits;
mod utils;

#[cfg(test)]
pub(crate) mod test_utils;

use crate::db::utils::{first_count, round_to};
use crate::item::{
    EnhancedProfile, FiltersApplied, Pagination, ProfilesResponse, QualityBreakdown, Record,
    RecordExt, Statistics,
};
use crate::plan::{QueryPlan, Tables};
use crate::query::FilterRequest;
use crate::ArgoError;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub use charts::ChartType;
pub use sqlite::SqliteWarehouse;
pub use traits::Warehouse;

#[derive(Clone)]
pub struct ProfileStore {
    warehouse: Arc<dyn Warehouse>,
    tables: Tables,
}

fn parse_quality_breakdown(records: &[Record]) -> BTreeMap<String, QualityBreakdown> {
    records
        .iter()
        .map(|r| {
            let mode = r.get_str("data_mode").unwrap_or("unknown").to_string();
            let breakdown = QualityBreakdown {
                count: r.get_i64("count").unwrap_or(0).max(0) as u64,
                avg_temp_quality: round_to(r.get_f64("avg_temp_quality").unwrap_or(0.0), 2),
            };
            (mode, breakdown)
        })
        .collect()
}

impl ProfileStore {
    pub fn new(warehouse: Arc<dyn Warehouse>, tables: Tables) -> Self {
        ProfileStore { warehouse, tables }
    }

    pub fn tables(&self) -> &Tables {
        &self.tables
    }

    /// Paged profile search.
    ///
    /// The page of rows, the total count and the measurement count run concurrently against
    /// the same predicates; if any of them fails the whole search fails. The per-data-mode
    /// quality breakdown runs afterwards and degrades to an empty map on failure.
    pub async fn search(&self, request: &FilterRequest) -> Result<ProfilesResponse, ArgoError> {
        let plan = QueryPlan::new(request, &self.tables);
        debug!(
            "profile search: {} filters, where clause: {}",
            plan.filters.len(),
            plan.where_clause()
        );

        let rows_stmt = plan.rows_statement();
        let count_stmt = plan.count_statement();
        let measurement_stmt = plan.measurement_count_statement();

        let (rows, count, measurement_count) = tokio::try_join!(
            self.warehouse.execute_statement(&rows_stmt),
            self.warehouse.execute_statement(&count_stmt),
            self.warehouse.execute_statement(&measurement_stmt),
        )?;

        let total = first_count(&count, "total_count");
        let total_measurements = first_count(&measurement_count, "measurement_count");
        info!(
            "profile search: {} profiles, total: {}, measurements: {}",
            rows.len(),
            total,
            total_measurements
        );

        let quality_breakdown = self.quality_breakdown(&plan).await;

        let window = plan.window;
        let total_pages = window.total_pages(total);
        Ok(ProfilesResponse {
            profiles: rows.into_iter().map(EnhancedProfile::from_record).collect(),
            pagination: Pagination {
                page: window.page,
                limit: window.limit,
                offset: window.offset(),
                total,
                total_pages,
                has_next: window.has_next(total),
                has_prev: window.has_prev(),
            },
            statistics: Statistics {
                total_profiles: total,
                total_measurements,
                quality_breakdown,
            },
            filters: FiltersApplied {
                applied: plan.filters.len(),
                sort_by: plan.sort_by,
                sort_order: plan.sort_order,
            },
            last_updated: chrono::Utc::now(),
        })
    }

    async fn quality_breakdown(&self, plan: &QueryPlan) -> BTreeMap<String, QualityBreakdown> {
        match self
            .warehouse
            .execute_statement(&plan.quality_breakdown_statement())
            .await
        {
            Ok(records) => parse_quality_breakdown(&records),
            Err(e) => {
                warn!("failed to get quality breakdown: {}", e);
                BTreeMap::new()
            }
        }
    }
}
