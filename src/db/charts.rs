//! Aggregate datasets for the dashboard charts.
use crate::date::datetime_to_julian_day;
use crate::db::utils::round_to;
use crate::db::ProfileStore;
use crate::filter::BindValue;
use crate::item::{ChartConfig, ChartResponse, Record, RecordExt};
use crate::ArgoError;
use chrono::{Months, NaiveDate, Utc};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use tracing::info;

/// Chart datasets served by `/api/charts?type=<chart>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartType {
    GlobalDistribution,
    DataModePie,
    TemperatureTrends,
    SalinityDepth,
    TsScatter,
    PressureDistribution,
    DeploymentsTimeline,
    RegionalDistribution,
}

impl ChartType {
    pub const ALL: [ChartType; 8] = [
        ChartType::GlobalDistribution,
        ChartType::DataModePie,
        ChartType::TemperatureTrends,
        ChartType::SalinityDepth,
        ChartType::TsScatter,
        ChartType::PressureDistribution,
        ChartType::DeploymentsTimeline,
        ChartType::RegionalDistribution,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChartType::GlobalDistribution => "global-distribution",
            ChartType::DataModePie => "data-mode-pie",
            ChartType::TemperatureTrends => "temperature-trends",
            ChartType::SalinityDepth => "salinity-depth",
            ChartType::TsScatter => "ts-scatter",
            ChartType::PressureDistribution => "pressure-distribution",
            ChartType::DeploymentsTimeline => "deployments-timeline",
            ChartType::RegionalDistribution => "regional-distribution",
        }
    }

    /// Parse the `type` query parameter; a missing or unknown type is an [ArgoError::InvalidInput].
    pub fn from_param(value: Option<&str>) -> Result<ChartType, ArgoError> {
        match value.filter(|v| !v.is_empty()) {
            None => Err(ArgoError::InvalidInput(
                "Chart type is required. Use ?type=chart-name".to_string(),
            )),
            Some(v) => v.parse(),
        }
    }

    pub fn config(&self) -> ChartConfig {
        let (title, description, kind) = match self {
            ChartType::GlobalDistribution => (
                "Global Float Distribution Map",
                "Distribution of ARGO floats worldwide",
                "map",
            ),
            ChartType::DataModePie => (
                "Data Mode Distribution",
                "Real-time vs Adjusted mode floats",
                "pie",
            ),
            ChartType::TemperatureTrends => (
                "Temperature Trends by Region (Last 6 Months)",
                "Average surface temperature across regions",
                "line",
            ),
            ChartType::SalinityDepth => (
                "Salinity vs Depth Profile",
                "Average salinity changes with ocean depth",
                "line",
            ),
            ChartType::TsScatter => (
                "Temperature-Salinity (T-S) Diagram",
                "Water mass identification scatter plot",
                "scatter",
            ),
            ChartType::PressureDistribution => (
                "Measurement Distribution by Depth",
                "Number of measurements at different depths",
                "bar",
            ),
            ChartType::DeploymentsTimeline => (
                "Profile Deployments Over Time",
                "Profile and float deployments by year",
                "bar",
            ),
            ChartType::RegionalDistribution => (
                "Regional Float Distribution",
                "Float count by geographic regions",
                "bar",
            ),
        };
        ChartConfig {
            title: title.to_string(),
            description: description.to_string(),
            kind: kind.to_string(),
        }
    }
}

impl FromStr for ChartType {
    type Err = ArgoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ChartType::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| ArgoError::InvalidInput(format!("Unknown chart type: {}", s)))
    }
}

impl Display for ChartType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

fn float_status(mode: Option<&str>) -> &'static str {
    match mode {
        Some("A") => "adjusted",
        Some("R") => "real-time",
        _ => "other",
    }
}

fn mode_name(mode: &str) -> String {
    match mode {
        "A" => "Adjusted/Delayed Mode".to_string(),
        "R" => "Real-time".to_string(),
        "D" => "Delayed Mode".to_string(),
        other => format!("Mode {}", other),
    }
}

fn rounded(record: &Record, key: &str, decimals: i32) -> Value {
    match record.get_f64(key) {
        Some(v) => json!(round_to(v, decimals)),
        None => Value::Null,
    }
}

fn month_display(month: &str) -> String {
    NaiveDate::parse_from_str(month, "%Y-%m-%d")
        .map(|d| d.format("%b %Y").to_string())
        .unwrap_or_else(|_| month.to_string())
}

impl ProfileStore {
    /// Dataset and display configuration for one chart.
    pub async fn chart(&self, chart_type: ChartType) -> Result<ChartResponse, ArgoError> {
        info!("fetching chart data for {}", chart_type);
        let data = match chart_type {
            ChartType::GlobalDistribution => self.global_distribution().await?,
            ChartType::DataModePie => self.data_mode_distribution().await?,
            ChartType::TemperatureTrends => self.temperature_trends().await?,
            ChartType::SalinityDepth => self.salinity_depth().await?,
            ChartType::TsScatter => self.ts_scatter().await?,
            ChartType::PressureDistribution => self.pressure_distribution().await?,
            ChartType::DeploymentsTimeline => self.deployments_timeline().await?,
            ChartType::RegionalDistribution => self.regional_distribution().await?,
        };
        Ok(ChartResponse {
            success: true,
            chart_type: chart_type.to_string(),
            config: chart_type.config(),
            data,
            last_updated: Utc::now(),
        })
    }

    async fn global_distribution(&self) -> Result<Value, ArgoError> {
        let sql = format!(
            r#"
            SELECT DISTINCT
                p.platform_number,
                p.latitude,
                p.longitude,
                p.data_mode AS status,
                p.data_centre AS data_center
            FROM {} p
            WHERE p.latitude IS NOT NULL
                AND p.longitude IS NOT NULL
                AND p.latitude BETWEEN -90 AND 90
                AND p.longitude BETWEEN -180 AND 180
            LIMIT 2000
            "#,
            self.tables.profiles()
        );
        let rows = self.warehouse.execute(sql.as_str(), &[]).await?;
        let floats = rows
            .iter()
            .map(|r| {
                json!({
                    "platform_number": r.get("platform_number"),
                    "lat": r.get("latitude"),
                    "lng": r.get("longitude"),
                    "status": float_status(r.get_str("status")),
                    "data_center": r.get("data_center"),
                })
            })
            .collect::<Vec<Value>>();
        Ok(json!({ "floats": floats, "total": rows.len() }))
    }

    async fn data_mode_distribution(&self) -> Result<Value, ArgoError> {
        let sql = format!(
            r#"
            SELECT
                data_mode AS status,
                COUNT(DISTINCT platform_number) AS count
            FROM {}
            WHERE data_mode IS NOT NULL
            GROUP BY data_mode
            ORDER BY count DESC
            "#,
            self.tables.profiles()
        );
        let rows = self.warehouse.execute(sql.as_str(), &[]).await?;
        let distribution = rows
            .iter()
            .map(|r| {
                let status = r.get_str("status").unwrap_or_default();
                json!({
                    "name": mode_name(status),
                    "value": r.get_i64("count").unwrap_or(0),
                    "status": status,
                })
            })
            .collect::<Vec<Value>>();
        let total: i64 = rows.iter().filter_map(|r| r.get_i64("count")).sum();
        Ok(json!({ "distribution": distribution, "total": total }))
    }

    async fn temperature_trends(&self) -> Result<Value, ArgoError> {
        let now = Utc::now();
        let six_months_ago = now.checked_sub_months(Months::new(6)).unwrap_or(now);
        let threshold = datetime_to_julian_day(&six_months_ago);

        let sql = format!(
            r#"
            WITH recent_surface_temps AS (
                SELECT
                    p.profile_id,
                    m.temp_adjusted,
                    CASE
                        WHEN p.latitude > 66.5 THEN 'Arctic'
                        WHEN p.latitude > 23.5 THEN 'Northern Hemisphere'
                        WHEN p.latitude > -23.5 THEN 'Tropical'
                        WHEN p.latitude > -66.5 THEN 'Southern Hemisphere'
                        ELSE 'Antarctic'
                    END AS region,
                    strftime('%Y-%m-01', julianday('1950-01-01') + p.juld) AS month
                FROM {} p
                JOIN {} m ON p.profile_id = m.profile_id
                WHERE p.juld IS NOT NULL
                    AND p.juld >= ?
                    AND p.latitude IS NOT NULL
                    AND p.profile_temp_qc = 'A'
                    AND m.level_index <= 5
                    AND m.temp_adjusted IS NOT NULL
                    AND m.temp_adjusted BETWEEN -2 AND 35
                    AND m.temp_qc = '1'
            )
            SELECT
                region,
                month,
                AVG(temp_adjusted) AS avg_temp,
                COUNT(*) AS measurement_count,
                COUNT(DISTINCT profile_id) AS profile_count
            FROM recent_surface_temps
            GROUP BY region, month
            HAVING COUNT(*) >= 20 AND COUNT(DISTINCT profile_id) >= 5
            ORDER BY month, region
            "#,
            self.tables.profiles(),
            self.tables.measurements()
        );
        let rows = self
            .warehouse
            .execute(sql.as_str(), &[BindValue::Integer(threshold)])
            .await?;

        let mut monthly: BTreeMap<String, Map<String, Value>> = BTreeMap::new();
        let mut regions: Vec<String> = vec![];
        for row in &rows {
            let (Some(month), Some(region)) = (row.get_str("month"), row.get_str("region")) else {
                continue;
            };
            let entry = monthly.entry(month.to_string()).or_insert_with(|| {
                let mut m = Map::new();
                m.insert("month".to_string(), json!(month));
                m.insert("month_display".to_string(), json!(month_display(month)));
                m
            });
            entry.insert(region.to_string(), rounded(row, "avg_temp", 2));
            if !regions.iter().any(|r| r == region) {
                regions.push(region.to_string());
            }
        }
        let total_measurements: i64 = rows
            .iter()
            .filter_map(|r| r.get_i64("measurement_count"))
            .sum();

        Ok(json!({
            "trends": monthly.into_values().map(Value::Object).collect::<Vec<Value>>(),
            "regions": regions,
            "metadata": {
                "total_measurements": total_measurements,
                "date_range": format!("Last 6 months (Julian day >= {})", threshold),
            },
        }))
    }

    async fn salinity_depth(&self) -> Result<Value, ArgoError> {
        let sql = format!(
            r#"
            SELECT
                CAST(ROUND(pres_adjusted / 50.0) AS INTEGER) * 50 AS depth_bin,
                AVG(psal_adjusted) AS avg_salinity,
                COUNT(*) AS measurement_count
            FROM {}
            WHERE pres_adjusted IS NOT NULL
                AND psal_adjusted IS NOT NULL
                AND pres_adjusted <= 2000
                AND psal_qc = '1'
            GROUP BY depth_bin
            HAVING COUNT(*) >= 100
            ORDER BY depth_bin
            "#,
            self.tables.measurements()
        );
        let rows = self.warehouse.execute(sql.as_str(), &[]).await?;
        let profile = rows
            .iter()
            .map(|r| {
                json!({
                    "depth": r.get("depth_bin"),
                    "salinity": rounded(r, "avg_salinity", 3),
                    "count": r.get("measurement_count"),
                })
            })
            .collect::<Vec<Value>>();
        Ok(json!({ "profile": profile }))
    }

    async fn ts_scatter(&self) -> Result<Value, ArgoError> {
        let sql = format!(
            r#"
            SELECT
                temp_adjusted AS temperature,
                psal_adjusted AS salinity
            FROM {}
            WHERE temp_adjusted IS NOT NULL
                AND psal_adjusted IS NOT NULL
                AND temp_qc = '1'
                AND psal_qc = '1'
                AND temp_adjusted BETWEEN -2 AND 35
                AND psal_adjusted BETWEEN 30 AND 40
            LIMIT 5000
            "#,
            self.tables.measurements()
        );
        let rows = self.warehouse.execute(sql.as_str(), &[]).await?;
        let points = rows
            .iter()
            .map(|r| {
                json!({
                    "temperature": rounded(r, "temperature", 2),
                    "salinity": rounded(r, "salinity", 3),
                })
            })
            .collect::<Vec<Value>>();
        Ok(json!({ "points": points }))
    }

    async fn pressure_distribution(&self) -> Result<Value, ArgoError> {
        let sql = format!(
            r#"
            SELECT
                CASE
                    WHEN pres_adjusted < 100 THEN '0-100m'
                    WHEN pres_adjusted < 500 THEN '100-500m'
                    WHEN pres_adjusted < 1000 THEN '500-1000m'
                    WHEN pres_adjusted < 1500 THEN '1000-1500m'
                    WHEN pres_adjusted < 2000 THEN '1500-2000m'
                    ELSE '2000m+'
                END AS depth_range,
                COUNT(*) AS measurement_count,
                AVG(pres_adjusted) AS avg_pressure
            FROM {}
            WHERE pres_adjusted IS NOT NULL
            GROUP BY depth_range
            ORDER BY MIN(pres_adjusted)
            "#,
            self.tables.measurements()
        );
        let rows = self.warehouse.execute(sql.as_str(), &[]).await?;
        let distribution = rows
            .iter()
            .map(|r| {
                json!({
                    "depth_range": r.get("depth_range"),
                    "count": r.get("measurement_count"),
                    "avg_pressure": rounded(r, "avg_pressure", 1),
                })
            })
            .collect::<Vec<Value>>();
        Ok(json!({ "distribution": distribution }))
    }

    async fn deployments_timeline(&self) -> Result<Value, ArgoError> {
        let sql = format!(
            r#"
            SELECT
                strftime('%Y-01-01', date_creation) AS year,
                COUNT(DISTINCT profile_id) AS profile_count,
                COUNT(DISTINCT platform_number) AS float_count
            FROM {}
            WHERE date_creation IS NOT NULL
                AND date(date_creation) >= '2000-01-01'
                AND date(date_creation) <= date('now')
            GROUP BY year
            ORDER BY year
            "#,
            self.tables.profiles()
        );
        let rows = self.warehouse.execute(sql.as_str(), &[]).await?;
        let timeline = rows
            .iter()
            .map(|r| {
                json!({
                    "year": r.get("year"),
                    "profiles": r.get("profile_count"),
                    "floats": r.get("float_count"),
                })
            })
            .collect::<Vec<Value>>();
        Ok(json!({ "timeline": timeline }))
    }

    async fn regional_distribution(&self) -> Result<Value, ArgoError> {
        let sql = format!(
            r#"
            SELECT
                CASE
                    WHEN p.latitude > 60 THEN 'Arctic'
                    WHEN p.latitude > 30 THEN 'North Temperate'
                    WHEN p.latitude > 0 THEN 'North Tropical'
                    WHEN p.latitude > -30 THEN 'South Tropical'
                    WHEN p.latitude > -60 THEN 'South Temperate'
                    ELSE 'Antarctic'
                END AS region,
                COUNT(DISTINCT p.platform_number) AS float_count,
                COUNT(DISTINCT p.profile_id) AS profile_count,
                AVG(p.latitude) AS avg_latitude
            FROM {} p
            WHERE p.latitude IS NOT NULL
            GROUP BY region
            ORDER BY float_count DESC
            "#,
            self.tables.profiles()
        );
        let rows = self.warehouse.execute(sql.as_str(), &[]).await?;
        let regions = rows
            .iter()
            .map(|r| {
                json!({
                    "region": r.get("region"),
                    "float_count": r.get("float_count"),
                    "profile_count": r.get("profile_count"),
                    "avg_latitude": rounded(r, "avg_latitude", 2),
                })
            })
            .collect::<Vec<Value>>();
        Ok(json!({ "regions": regions }))
    }
}
