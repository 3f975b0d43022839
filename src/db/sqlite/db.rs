//! SQLite warehouse.

use crate::db::traits::Warehouse;
use crate::filter::BindValue;
use crate::item::Record;
use crate::plan::Tables;
use crate::ArgoError;
use async_trait::async_trait;
use serde_json::{Number, Value};
use sqlx::sqlite::SqliteRow;
use sqlx::SqlitePool;
use sqlx::{migrate::MigrateDatabase, Sqlite};
use sqlx::{Column, Row, TypeInfo, ValueRef};
use tracing::{debug, info};

/// SQLite-backed warehouse.
#[derive(Clone)]
pub struct SqliteWarehouse {
    /// shared connection pool
    conn_pool: SqlitePool,
}

fn row_to_record(row: &SqliteRow) -> Result<Record, ArgoError> {
    let mut record = Record::new();
    for (idx, column) in row.columns().iter().enumerate() {
        let raw = row.try_get_raw(idx)?;
        let value = match raw.is_null() {
            true => Value::Null,
            false => {
                let type_name = raw.type_info().name().to_string();
                match type_name.as_str() {
                    "INTEGER" | "BOOLEAN" => Value::from(row.try_get::<i64, _>(idx)?),
                    "REAL" => Number::from_f64(row.try_get::<f64, _>(idx)?)
                        .map(Value::Number)
                        .unwrap_or(Value::Null),
                    "TEXT" | "DATE" | "TIME" | "DATETIME" => {
                        Value::String(row.try_get::<String, _>(idx)?)
                    }
                    // blobs are never part of a dashboard row
                    _ => Value::Null,
                }
            }
        };
        record.insert(column.name().to_string(), value);
    }
    Ok(record)
}

fn index_prefix(table: &str) -> String {
    table.replace('.', "_")
}

impl SqliteWarehouse {
    /// Open the warehouse at `path`, creating an empty database file if it does not exist.
    pub async fn new(path: &str) -> Result<Self, ArgoError> {
        info!("open sqlite warehouse at {}", path);

        if !Sqlite::database_exists(path).await? {
            Sqlite::create_database(path).await?;
            info!("Created db at {}", path);
        }
        let conn_pool = SqlitePool::connect(path).await?;

        Ok(SqliteWarehouse { conn_pool })
    }

    /// Open an existing warehouse; fails with [ArgoError::NotFound] when the file is missing.
    pub async fn open(path: &str) -> Result<Self, ArgoError> {
        if !Sqlite::database_exists(path).await? {
            return Err(ArgoError::NotFound(format!(
                "no warehouse found at {}",
                path
            )));
        }
        info!("open sqlite warehouse at {}", path);
        let conn_pool = SqlitePool::connect(path).await?;
        Ok(SqliteWarehouse { conn_pool })
    }

    /// Create the profiles and measurements tables and their indexes if missing.
    pub async fn initialize_schema(&self, tables: &Tables) -> Result<(), ArgoError> {
        let profiles = tables.profiles();
        let measurements = tables.measurements();
        let p_idx = index_prefix(profiles);
        let m_idx = index_prefix(measurements);

        sqlx::query(
            format!(
                r#"
            CREATE TABLE IF NOT EXISTS {profiles}(
                profile_id INTEGER PRIMARY KEY,
                platform_number TEXT,
                cycle_number INTEGER,
                latitude REAL,
                longitude REAL,
                juld REAL,
                date_creation TEXT,
                data_centre TEXT,
                data_mode TEXT,
                platform_type TEXT,
                project_name TEXT,
                pi_name TEXT,
                profile_temp_qc TEXT,
                profile_psal_qc TEXT,
                profile_pres_qc TEXT,
                position_qc TEXT,
                juld_qc TEXT
            );

            CREATE TABLE IF NOT EXISTS {measurements}(
                profile_id INTEGER NOT NULL,
                level_index INTEGER NOT NULL,
                pres_adjusted REAL,
                temp_adjusted REAL,
                psal_adjusted REAL,
                temp_qc TEXT,
                psal_qc TEXT,
                pres_qc TEXT,
                temp_adjusted_error REAL,
                psal_adjusted_error REAL,
                pres_adjusted_error REAL,
                constraint {m_idx}_unique_pk
                    unique (profile_id, level_index)
            );

            CREATE INDEX IF NOT EXISTS idx_{p_idx}_platform_number
                ON {profiles}(platform_number);
            CREATE INDEX IF NOT EXISTS idx_{p_idx}_juld
                ON {profiles}(juld);
            CREATE INDEX IF NOT EXISTS idx_{p_idx}_date_creation
                ON {profiles}(date_creation);
            CREATE INDEX IF NOT EXISTS idx_{m_idx}_profile_id
                ON {measurements}(profile_id);

            PRAGMA journal_mode=WAL;
        "#
            )
            .as_str(),
        )
        .execute(&self.conn_pool)
        .await?;

        info!(
            "warehouse schema ready: {}, {}",
            tables.profiles(),
            tables.measurements()
        );
        Ok(())
    }
}

#[async_trait]
impl Warehouse for SqliteWarehouse {
    async fn execute(&self, sql: &str, params: &[BindValue]) -> Result<Vec<Record>, ArgoError> {
        debug!("warehouse query: {}", sql);
        let mut query = sqlx::query(sql);
        for value in params {
            query = match value {
                BindValue::Integer(v) => query.bind(*v),
                BindValue::Float(v) => query.bind(*v),
                BindValue::Text(v) => query.bind(v.clone()),
            };
        }
        let rows = query.fetch_all(&self.conn_pool).await?;
        rows.iter().map(row_to_record).collect()
    }
}
