//! Temporary SQLite warehouses for tests.
use crate::db::{ProfileStore, SqliteWarehouse, Warehouse};
use crate::filter::BindValue;
use crate::plan::Tables;
use std::path::PathBuf;
use std::sync::Arc;

/// Helper function to create a temporary database file path
pub(crate) fn create_temp_db_path(test_name: &str) -> PathBuf {
    let mut temp_dir = std::env::temp_dir();
    temp_dir.push(format!(
        "argo_dashboard_test_{}_{}.sqlite3",
        test_name,
        chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
    ));
    temp_dir
}

/// Helper function to ensure cleanup of database files
pub(crate) fn cleanup_db_file(path: &PathBuf) {
    if path.exists() {
        let _ = std::fs::remove_file(path);
    }

    // Remove WAL and SHM files that SQLite creates
    let wal_path = path.with_extension("sqlite3-wal");
    if wal_path.exists() {
        let _ = std::fs::remove_file(wal_path);
    }

    let shm_path = path.with_extension("sqlite3-shm");
    if shm_path.exists() {
        let _ = std::fs::remove_file(shm_path);
    }
}

const INSERT_PROFILE: &str = r#"
    INSERT INTO profiles (
        profile_id, platform_number, cycle_number, latitude, longitude, juld, date_creation,
        data_centre, data_mode, platform_type, project_name, pi_name,
        profile_temp_qc, profile_psal_qc, profile_pres_qc, position_qc, juld_qc
    ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
"#;

const INSERT_MEASUREMENT: &str = r#"
    INSERT INTO measurements (
        profile_id, level_index, pres_adjusted, temp_adjusted, psal_adjusted,
        temp_qc, psal_qc, pres_qc
    ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
"#;

fn text(v: &str) -> BindValue {
    BindValue::Text(v.to_string())
}

/// Seed the standard fixture:
///
/// - profiles 1-25: centre `ME`, project `US ARGO PROJECT`, odd ids real-time (`R`), even ids
///   adjusted (`A`), all QC flags `A` except profile 3 whose temperature QC is `C`;
///   latitude `-10 + id`, `juld` `27028 + id` (2024-01-02 onwards)
/// - profiles 26-30: centre `IF`, project `ARGO GERMANY`, delayed mode (`D`), QC flags `1`,
///   latitude 50, position QC `2`
/// - measurements: three levels for profile 1 (the middle one without QC flags), two for
///   profile 2, one for profile 26
pub(crate) async fn seed_fixture(warehouse: &SqliteWarehouse) {
    for id in 1..=30i64 {
        let me = id <= 25;
        let (centre, project, pi, platform_type) = match me {
            true => ("ME", "US ARGO PROJECT", "SMITH", "APEX"),
            false => ("IF", "ARGO GERMANY", "KLEIN", "NOVA"),
        };
        let mode = match (me, id % 2) {
            (false, _) => "D",
            (true, 1) => "R",
            (true, _) => "A",
        };
        let qc = match me {
            true => "A",
            false => "1",
        };
        let temp_qc = match id {
            3 => "C",
            _ => qc,
        };
        let latitude = match me {
            true => -10.0 + id as f64,
            false => 50.0,
        };
        let position_qc = match me {
            true => "1",
            false => "2",
        };
        let juld = 27028.0 + id as f64;
        let date_creation = format!("2024-01-{:02}T00:00:00Z", id.min(28));

        warehouse
            .execute(
                INSERT_PROFILE,
                &[
                    BindValue::Integer(id),
                    BindValue::Text((2900000 + id).to_string()),
                    BindValue::Integer(id),
                    BindValue::Float(latitude),
                    BindValue::Float(100.0 + id as f64),
                    BindValue::Float(juld),
                    BindValue::Text(date_creation),
                    text(centre),
                    text(mode),
                    text(platform_type),
                    text(project),
                    text(pi),
                    text(temp_qc),
                    text(qc),
                    text(qc),
                    text(position_qc),
                    text("1"),
                ],
            )
            .await
            .unwrap();
    }

    let measurements: [(i64, i64, f64, f64, f64, Option<&str>); 6] = [
        (1, 0, 5.0, 28.1, 34.5, Some("1")),
        (1, 1, 10.0, 27.9, 34.6, None),
        (1, 2, 20.0, 27.5, 34.7, Some("2")),
        (2, 0, 5.0, 26.0, 35.0, Some("1")),
        (2, 1, 10.0, 25.8, 35.1, Some("1")),
        (26, 0, 5.0, 12.0, 35.2, Some("1")),
    ];
    for (profile_id, level, pres, temp, psal, qc) in measurements {
        let qc = match qc {
            Some(v) => text(v),
            None => text(""),
        };
        warehouse
            .execute(
                INSERT_MEASUREMENT,
                &[
                    BindValue::Integer(profile_id),
                    BindValue::Integer(level),
                    BindValue::Float(pres),
                    BindValue::Float(temp),
                    BindValue::Float(psal),
                    qc.clone(),
                    qc.clone(),
                    qc,
                ],
            )
            .await
            .unwrap();
    }
}

/// A seeded store on a fresh temporary database. Callers clean up the returned path.
pub(crate) async fn seeded_store(test_name: &str) -> (ProfileStore, PathBuf) {
    let db_path = create_temp_db_path(test_name);
    let warehouse = SqliteWarehouse::new(db_path.to_str().unwrap())
        .await
        .unwrap();
    warehouse
        .initialize_schema(&Tables::default())
        .await
        .unwrap();
    seed_fixture(&warehouse).await;
    let warehouse: Arc<dyn Warehouse> = Arc::new(warehouse);
    (ProfileStore::new(warehouse, Tables::default()), db_path)
}
