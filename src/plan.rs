//! SQL statement planning for profile searches.
//!
//! Bound values only ever travel as parameters. Table names, the sort clause and
//! `LIMIT`/`OFFSET` are the only text inlined into statements, and each comes from a closed
//! whitelist or a validated identifier.
use crate::filter::{BindValue, FilterSet};
use crate::query::{FilterRequest, SortField, SortOrder};
use crate::ArgoError;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PROFILES_TABLE: &str = "profiles";
pub const DEFAULT_MEASUREMENTS_TABLE: &str = "measurements";

fn validate_identifier(name: &str) -> Result<String, ArgoError> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
    match valid {
        true => Ok(name.to_string()),
        false => Err(ArgoError::InvalidInput(format!(
            "invalid table name: {}",
            name
        ))),
    }
}

/// Validated names of the profiles and measurements tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tables {
    profiles: String,
    measurements: String,
}

impl Default for Tables {
    fn default() -> Self {
        Tables {
            profiles: DEFAULT_PROFILES_TABLE.to_string(),
            measurements: DEFAULT_MEASUREMENTS_TABLE.to_string(),
        }
    }
}

impl Tables {
    pub fn new(profiles: &str, measurements: &str) -> Result<Tables, ArgoError> {
        Ok(Tables {
            profiles: validate_identifier(profiles)?,
            measurements: validate_identifier(measurements)?,
        })
    }

    pub fn profiles(&self) -> &str {
        self.profiles.as_str()
    }

    pub fn measurements(&self) -> &str {
        self.measurements.as_str()
    }
}

/// A SQL statement with its positional parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<BindValue>,
}

/// Page number and size, both at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: u32,
    pub limit: u32,
}

impl PageWindow {
    pub fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.limit as u64
    }

    pub fn total_pages(&self, total: u64) -> u64 {
        total.div_ceil(self.limit as u64)
    }

    pub fn has_next(&self, total: u64) -> bool {
        (self.page as u64) < self.total_pages(total)
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }
}

const PROFILE_COLUMNS: &str = r#"
                p.profile_id,
                p.platform_number,
                p.cycle_number,
                p.latitude,
                p.longitude,
                p.juld,
                p.date_creation,
                p.data_centre AS data_center,
                p.data_mode,
                p.platform_type,
                p.project_name,
                p.pi_name,
                p.profile_temp_qc,
                p.profile_psal_qc,
                p.profile_pres_qc,
                p.position_qc,
                p.juld_qc"#;

/// Every statement needed to answer one profile search.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    pub filters: FilterSet,
    pub window: PageWindow,
    pub sort_by: SortField,
    pub sort_order: SortOrder,
    tables: Tables,
    where_clause: String,
    params: Vec<BindValue>,
}

impl QueryPlan {
    pub fn new(request: &FilterRequest, tables: &Tables) -> QueryPlan {
        let filters = FilterSet::from_request(request);
        let where_clause = filters.where_clause();
        let params = filters.bind_values();
        QueryPlan {
            filters,
            window: PageWindow {
                page: request.page.max(1),
                limit: request.limit.max(1),
            },
            sort_by: request.sort_by,
            sort_order: request.sort_order,
            tables: tables.clone(),
            where_clause,
            params,
        }
    }

    pub fn where_clause(&self) -> &str {
        self.where_clause.as_str()
    }

    fn statement(&self, sql: String) -> Statement {
        Statement {
            sql,
            params: self.params.clone(),
        }
    }

    /// One page of profile rows.
    pub fn rows_statement(&self) -> Statement {
        let direction = match self.sort_order {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        };
        self.statement(format!(
            r#"
            SELECT {}
            FROM {} p
            {}
            ORDER BY p.{} {}
            LIMIT {} OFFSET {}
            "#,
            PROFILE_COLUMNS,
            self.tables.profiles(),
            self.where_clause,
            self.sort_by.as_str(),
            direction,
            self.window.limit,
            self.window.offset(),
        ))
    }

    /// Total number of matching profiles, as `total_count`.
    pub fn count_statement(&self) -> Statement {
        self.statement(format!(
            "SELECT COUNT(*) AS total_count FROM {} p {}",
            self.tables.profiles(),
            self.where_clause
        ))
    }

    /// Number of measurements belonging to matching profiles, as `measurement_count`.
    pub fn measurement_count_statement(&self) -> Statement {
        self.statement(format!(
            r#"
            SELECT COUNT(*) AS measurement_count
            FROM {} m
            WHERE m.profile_id IN (
                SELECT DISTINCT p.profile_id
                FROM {} p
                {}
            )
            "#,
            self.tables.measurements(),
            self.tables.profiles(),
            self.where_clause
        ))
    }

    /// Per-data-mode profile counts and mean temperature QC score.
    pub fn quality_breakdown_statement(&self) -> Statement {
        self.statement(format!(
            r#"
            SELECT
                p.data_mode AS data_mode,
                COUNT(*) AS count,
                AVG(CASE
                    WHEN p.profile_temp_qc = 'A' THEN 5
                    WHEN p.profile_temp_qc = '1' THEN 4
                    WHEN p.profile_temp_qc = '2' THEN 3
                    ELSE 1
                END) AS avg_temp_quality
            FROM {} p
            {}
            GROUP BY p.data_mode
            ORDER BY count DESC
            "#,
            self.tables.profiles(),
            self.where_clause
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::ProfileQuery;

    fn plan(query: ProfileQuery) -> QueryPlan {
        QueryPlan::new(
            &FilterRequest::from_query(&query).unwrap(),
            &Tables::default(),
        )
    }

    #[test]
    fn test_page_window() {
        let window = PageWindow { page: 3, limit: 20 };
        assert_eq!(window.offset(), 40);
        assert_eq!(window.total_pages(45), 3);
        assert_eq!(window.total_pages(40), 2);
        assert_eq!(window.total_pages(0), 0);
        assert!(window.has_prev());
        assert!(!window.has_next(45));
        assert!(window.has_next(61));

        let first = PageWindow { page: 1, limit: 20 };
        assert!(!first.has_prev());
        assert!(!first.has_next(0));
    }

    #[test]
    fn test_rows_statement() {
        let plan = plan(
            ProfileQuery::new()
                .data_mode("D")
                .page(3)
                .limit(10)
                .sort_by("latitude")
                .sort_order("asc"),
        );
        let stmt = plan.rows_statement();
        assert!(stmt.sql.contains("FROM profiles p"));
        assert!(stmt.sql.contains("WHERE p.data_mode = ?"));
        assert!(stmt.sql.contains("ORDER BY p.latitude ASC"));
        assert!(stmt.sql.contains("LIMIT 10 OFFSET 20"));
        assert!(stmt.sql.contains("p.data_centre AS data_center"));
        assert_eq!(stmt.params, vec![BindValue::Text("D".to_string())]);
    }

    #[test]
    fn test_statements_share_where_clause() {
        let plan = plan(ProfileQuery::new().search("ME").quality_filter("problematic"));
        let where_clause = plan.where_clause().to_string();
        for stmt in [
            plan.rows_statement(),
            plan.count_statement(),
            plan.measurement_count_statement(),
            plan.quality_breakdown_statement(),
        ] {
            assert!(stmt.sql.contains(where_clause.as_str()));
            assert_eq!(stmt.params.len(), 14);
            assert_eq!(stmt.sql.matches('?').count(), stmt.params.len());
        }
    }

    #[test]
    fn test_default_sort() {
        let stmt = plan(ProfileQuery::new()).rows_statement();
        assert!(stmt.sql.contains("ORDER BY p.date_creation DESC"));
        assert!(stmt.sql.contains("LIMIT 20 OFFSET 0"));
    }

    #[test]
    fn test_table_validation() {
        assert!(Tables::new("argo_full.profiles", "argo_full.measurements").is_ok());
        assert!(matches!(
            Tables::new("profiles; DROP TABLE x", "measurements"),
            Err(ArgoError::InvalidInput(_))
        ));
        assert!(Tables::new("", "measurements").is_err());
    }
}
