use argo_dashboard::{
    ArgoError, ChartResponse, ChartType, ErrorBody, FilterOptionsResponse, FilterRequest,
    ProfileMeasurements, ProfileQuery, ProfileStore, ProfilesResponse,
};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use axum_prometheus::PrometheusMetricLayer;
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

/// Error returned by a handler, with the summary used for server-side failures.
pub struct ApiError {
    context: &'static str,
    error: ArgoError,
}

impl ApiError {
    fn new(context: &'static str, error: ArgoError) -> Self {
        ApiError { context, error }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, summary) = match &self.error {
            ArgoError::InvalidDateRange(_) => (StatusCode::BAD_REQUEST, "Invalid date range"),
            ArgoError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "Invalid input"),
            ArgoError::NotFound(_) => (StatusCode::NOT_FOUND, "Not found"),
            ArgoError::UpstreamQueryFailure(_) | ArgoError::NetworkError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, self.context)
            }
        };
        if !self.error.is_client_error() {
            error!("{}: {}", self.context, self.error);
        }
        let body = ErrorBody {
            error: summary.to_string(),
            message: self.error.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Raw query-string pairs, repeated keys included.
type QueryPairs = Query<Vec<(String, String)>>;

/// First value of `key`, if present.
fn first_value<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

async fn health() -> Json<Value> {
    Json(json!({"status": "OK"}))
}

async fn search_profiles(
    State(store): State<ProfileStore>,
    Query(pairs): QueryPairs,
) -> Result<Json<ProfilesResponse>, ApiError> {
    let query = ProfileQuery::from_pairs(&pairs);
    info!("profile search: {}", query);
    let request = FilterRequest::from_query(&query)
        .map_err(|e| ApiError::new("Failed to fetch profiles", e))?;
    let response = store
        .search(&request)
        .await
        .map_err(|e| ApiError::new("Failed to fetch profiles", e))?;
    Ok(Json(response))
}

async fn profile_measurements(
    State(store): State<ProfileStore>,
    Path(id): Path<String>,
) -> Result<Json<ProfileMeasurements>, ApiError> {
    let response = store
        .measurements(id.as_str())
        .await
        .map_err(|e| ApiError::new("Failed to fetch measurements", e))?;
    Ok(Json(response))
}

async fn filter_options(
    State(store): State<ProfileStore>,
) -> Result<Json<FilterOptionsResponse>, ApiError> {
    let options = store
        .filter_options()
        .await
        .map_err(|e| ApiError::new("Failed to fetch filter options", e))?;
    Ok(Json(FilterOptionsResponse {
        success: true,
        options,
        last_updated: chrono::Utc::now(),
    }))
}

async fn chart(
    State(store): State<ProfileStore>,
    Query(pairs): QueryPairs,
) -> Result<Json<ChartResponse>, ApiError> {
    let chart_type = ChartType::from_param(first_value(&pairs, "type"))
        .map_err(|e| ApiError::new("Failed to fetch chart data", e))?;
    let response = store
        .chart(chart_type)
        .await
        .map_err(|e| ApiError::new("Failed to fetch chart data", e))?;
    Ok(Json(response))
}

/// Dashboard routes, without the metrics endpoint.
pub fn app(store: ProfileStore) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/api/health", get(health))
        .route("/api/profiles", get(search_profiles))
        .route("/api/profiles/enhanced", get(search_profiles))
        .route("/api/profiles/filters/options", get(filter_options))
        .route("/api/profiles/{id}/measurements", get(profile_measurements))
        .route("/api/charts", get(chart))
        .layer(cors)
        .with_state(store)
}

pub async fn start_api_service(
    store: ProfileStore,
    host: String,
    port: u16,
) -> std::io::Result<()> {
    let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();
    let app = app(store)
        .route("/metrics", get(|| async move { metric_handle.render() }))
        .layer(prometheus_layer);

    let listener = tokio::net::TcpListener::bind(format!("{}:{}", host, port)).await?;
    info!("starting API service on {}:{}", host, port);
    axum::serve(listener, app).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use argo_dashboard::{BindValue, SqliteWarehouse, Tables, Warehouse};
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use std::path::PathBuf;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn create_temp_db_path(test_name: &str) -> PathBuf {
        let mut temp_dir = std::env::temp_dir();
        temp_dir.push(format!(
            "argo_dashboard_api_test_{}_{}.sqlite3",
            test_name,
            chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
        ));
        temp_dir
    }

    fn cleanup_db_file(path: &PathBuf) {
        for ext in ["sqlite3", "sqlite3-wal", "sqlite3-shm"] {
            let p = path.with_extension(ext);
            if p.exists() {
                let _ = std::fs::remove_file(p);
            }
        }
    }

    async fn seeded_app(test_name: &str, tables: Tables) -> (Router, PathBuf) {
        let db_path = create_temp_db_path(test_name);
        let warehouse = SqliteWarehouse::new(db_path.to_str().unwrap())
            .await
            .unwrap();
        warehouse
            .initialize_schema(&Tables::default())
            .await
            .unwrap();

        let profiles = [
            (1, "2902746", "ME", "R", "A"),
            (2, "2902747", "ME", "A", "A"),
            (3, "6901234", "IF", "D", "C"),
        ];
        for (id, platform, centre, mode, qc) in profiles {
            warehouse
                .execute(
                    "INSERT INTO profiles (profile_id, platform_number, cycle_number, latitude, longitude, juld, \
                     data_centre, data_mode, platform_type, project_name, pi_name, \
                     profile_temp_qc, profile_psal_qc, profile_pres_qc, position_qc) \
                     VALUES (?, ?, 1, 10.5, -30.25, 27100.5, ?, ?, 'APEX', 'ARGO', 'DOE', ?, ?, ?, '1')",
                    &[
                        BindValue::Integer(id),
                        BindValue::Text(platform.to_string()),
                        BindValue::Text(centre.to_string()),
                        BindValue::Text(mode.to_string()),
                        BindValue::Text(qc.to_string()),
                        BindValue::Text(qc.to_string()),
                        BindValue::Text(qc.to_string()),
                    ],
                )
                .await
                .unwrap();
        }
        for level in 0..3i64 {
            warehouse
                .execute(
                    "INSERT INTO measurements (profile_id, level_index, pres_adjusted, temp_adjusted, psal_adjusted, temp_qc) \
                     VALUES (1, ?, ?, 20.0, 35.0, ?)",
                    &[
                        BindValue::Integer(level),
                        BindValue::Float(5.0 * (level + 1) as f64),
                        BindValue::Text("1".to_string()),
                    ],
                )
                .await
                .unwrap();
        }

        let store = ProfileStore::new(Arc::new(warehouse), tables);
        (app(store), db_path)
    }

    async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let (app, db_path) = seeded_app("health", Tables::default()).await;

        let (status, body) = get_json(&app, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "OK");

        cleanup_db_file(&db_path);
    }

    #[tokio::test]
    async fn test_search_profiles() {
        let (app, db_path) = seeded_app("search", Tables::default()).await;

        let (status, body) =
            get_json(&app, "/api/profiles/enhanced?data_center=ME&limit=1&page=2").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["pagination"]["total"], 2);
        assert_eq!(body["pagination"]["totalPages"], 2);
        assert_eq!(body["pagination"]["hasNext"], false);
        assert_eq!(body["pagination"]["hasPrev"], true);
        assert_eq!(body["profiles"].as_array().unwrap().len(), 1);
        assert_eq!(body["statistics"]["totalMeasurements"], 3);
        assert_eq!(body["filters"]["applied"], 1);
        assert_eq!(body["filters"]["sortBy"], "date_creation");
        assert_eq!(body["filters"]["sortOrder"], "desc");
        assert!(body["lastUpdated"].is_string());

        let (status, body) = get_json(&app, "/api/profiles?quality_filter=problematic").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["pagination"]["total"], 1);
        assert_eq!(body["profiles"][0]["platform_number"], "6901234");
        assert_eq!(body["profiles"][0]["data_center"], "IF");
        assert_eq!(body["profiles"][0]["quality_score"], 1);
        assert_eq!(body["profiles"][0]["position_quality"], "good");

        cleanup_db_file(&db_path);
    }

    #[tokio::test]
    async fn test_repeated_query_keys() {
        let (app, db_path) = seeded_app("repeated_keys", Tables::default()).await;

        let (status, body) =
            get_json(&app, "/api/profiles/enhanced?page=1&page=2&limit=1&limit=50").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["pagination"]["page"], 1);
        assert_eq!(body["pagination"]["limit"], 1);

        let (status, body) = get_json(
            &app,
            "/api/profiles/enhanced?sort_by=cycle_number&sort_by=latitude&sort_order=asc",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["filters"]["sortBy"], "cycle_number");

        let (status, body) = get_json(&app, "/api/charts?type=data-mode-pie&type=x").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["chartType"], "data-mode-pie");

        cleanup_db_file(&db_path);
    }

    #[tokio::test]
    async fn test_invalid_date_range() {
        let (app, db_path) = seeded_app("date_range", Tables::default()).await;

        let (status, body) = get_json(
            &app,
            "/api/profiles/enhanced?start_date=2024-06-01&end_date=2024-01-01",
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid date range");
        assert!(body["message"].as_str().unwrap().contains("2024-06-01"));

        cleanup_db_file(&db_path);
    }

    #[tokio::test]
    async fn test_measurements() {
        let (app, db_path) = seeded_app("measurements", Tables::default()).await;

        let (status, body) = get_json(&app, "/api/profiles/1/measurements").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["profile"]["platform_number"], "2902746");
        assert_eq!(body["measurements"].as_array().unwrap().len(), 3);
        assert_eq!(body["measurements"][2]["measurement_id"], 3);
        assert_eq!(body["measurements"][2]["pres_adjusted"], 15.0);
        // psal_qc was never set
        assert_eq!(body["measurements"][0]["psal_qc"], "1");

        let (status, _) = get_json(&app, "/api/profiles/abc/measurements").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = get_json(&app, "/api/profiles/42/measurements").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Not found");

        cleanup_db_file(&db_path);
    }

    #[tokio::test]
    async fn test_filter_options() {
        let (app, db_path) = seeded_app("filter_options", Tables::default()).await;

        let (status, body) = get_json(&app, "/api/profiles/filters/options").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["options"]["dataCentres"][0]["value"], "IF");
        assert_eq!(body["options"]["platformTypes"][0], "APEX");
        assert_eq!(body["options"]["qualityOptions"][0]["value"], "all");

        cleanup_db_file(&db_path);
    }

    #[tokio::test]
    async fn test_charts() {
        let (app, db_path) = seeded_app("charts", Tables::default()).await;

        let (status, body) = get_json(&app, "/api/charts?type=data-mode-pie").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["chartType"], "data-mode-pie");
        assert_eq!(body["config"]["type"], "pie");
        assert_eq!(body["data"]["total"], 3);

        let (status, body) = get_json(&app, "/api/charts").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().unwrap().contains("required"));

        let (status, body) = get_json(&app, "/api/charts?type=heatmap").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().unwrap().contains("heatmap"));

        cleanup_db_file(&db_path);
    }

    #[tokio::test]
    async fn test_upstream_failure() {
        let tables = Tables::new("missing_profiles", "measurements").unwrap();
        let (app, db_path) = seeded_app("upstream_failure", tables).await;

        let (status, body) = get_json(&app, "/api/profiles/enhanced").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to fetch profiles");
        assert!(body["message"]
            .as_str()
            .unwrap()
            .contains("missing_profiles"));

        cleanup_db_file(&db_path);
    }
}
