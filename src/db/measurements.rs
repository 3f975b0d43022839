use crate::db::ProfileStore;
use crate::filter::BindValue;
use crate::item::{Measurement, ProfileMeasurements};
use crate::ArgoError;
use tracing::info;

/// Maximum number of measurement levels returned for one profile.
pub const MAX_MEASUREMENT_LEVELS: u32 = 1000;

fn parse_profile_id(id: &str) -> Result<i64, ArgoError> {
    id.trim()
        .parse::<i64>()
        .map_err(|_| ArgoError::InvalidInput(format!("Invalid profile ID: {}", id)))
}

impl ProfileStore {
    /// Measurement levels of one profile, ordered by `level_index`.
    ///
    /// Fails with [ArgoError::InvalidInput] for a non-numeric id and [ArgoError::NotFound] when
    /// the profile does not exist.
    pub async fn measurements(&self, profile_id: &str) -> Result<ProfileMeasurements, ArgoError> {
        let id = parse_profile_id(profile_id)?;
        let params = [BindValue::Integer(id)];

        let profile_sql = format!(
            r#"
            SELECT
                p.profile_id,
                p.platform_number,
                p.cycle_number,
                p.latitude,
                p.longitude,
                p.date_creation
            FROM {} p
            WHERE p.profile_id = ?
            LIMIT 1
            "#,
            self.tables.profiles()
        );
        let profile = match self
            .warehouse
            .execute(profile_sql.as_str(), &params)
            .await?
            .into_iter()
            .next()
        {
            Some(profile) => profile,
            None => {
                return Err(ArgoError::NotFound(format!(
                    "Profile not found: {}",
                    id
                )))
            }
        };

        let measurements_sql = format!(
            r#"
            SELECT
                m.level_index,
                m.pres_adjusted,
                m.temp_adjusted,
                m.psal_adjusted,
                m.temp_qc,
                m.psal_qc,
                m.pres_qc,
                m.temp_adjusted_error,
                m.psal_adjusted_error,
                m.pres_adjusted_error
            FROM {} m
            WHERE m.profile_id = ?
            ORDER BY m.level_index ASC
            LIMIT {}
            "#,
            self.tables.measurements(),
            MAX_MEASUREMENT_LEVELS
        );
        let records = self
            .warehouse
            .execute(measurements_sql.as_str(), &params)
            .await?;
        info!("found {} measurements for profile {}", records.len(), id);

        let measurements = records
            .iter()
            .enumerate()
            .map(|(idx, record)| Measurement::from_record(idx as u32 + 1, record))
            .collect();

        Ok(ProfileMeasurements {
            profile,
            measurements,
            last_updated: chrono::Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_utils::{cleanup_db_file, seeded_store};
    use crate::db::Warehouse;
    use crate::item::RecordExt;

    #[tokio::test]
    async fn test_measurements() {
        let (store, db_path) = seeded_store("measurements").await;

        let result = store.measurements("1").await.unwrap();
        assert_eq!(result.profile.get_i64("profile_id"), Some(1));
        assert_eq!(result.profile.get_str("platform_number"), Some("2900001"));
        assert_eq!(result.measurements.len(), 3);
        let ids = result
            .measurements
            .iter()
            .map(|m| m.measurement_id)
            .collect::<Vec<u32>>();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(result.measurements[0].temp_adjusted, Some(28.1));
        // level without QC flags
        assert_eq!(result.measurements[1].temp_qc, "1");
        assert_eq!(result.measurements[2].psal_qc, "2");

        let empty = store.measurements("30").await.unwrap();
        assert!(empty.measurements.is_empty());

        drop(store);
        cleanup_db_file(&db_path);
    }

    #[tokio::test]
    async fn test_measurement_level_cap() {
        let (store, db_path) = seeded_store("measurement_level_cap").await;

        // profile 30 has no levels in the fixture
        store
            .warehouse
            .execute(
                r#"
                WITH RECURSIVE levels(n) AS (
                    SELECT 0 UNION ALL SELECT n + 1 FROM levels WHERE n < 1049
                )
                INSERT INTO measurements (profile_id, level_index, pres_adjusted, temp_qc)
                SELECT 30, n, n * 2.0, '1' FROM levels
                "#,
                &[],
            )
            .await
            .unwrap();

        let result = store.measurements("30").await.unwrap();
        assert_eq!(result.measurements.len(), MAX_MEASUREMENT_LEVELS as usize);
        assert_eq!(result.measurements[0].level_index, Some(0));
        let last = result.measurements.last().unwrap();
        assert_eq!(last.level_index, Some(999));
        assert_eq!(last.measurement_id, 1000);
        assert_eq!(last.pres_adjusted, Some(1998.0));

        drop(store);
        cleanup_db_file(&db_path);
    }

    #[tokio::test]
    async fn test_measurements_errors() {
        let (store, db_path) = seeded_store("measurements_errors").await;

        assert!(matches!(
            store.measurements("abc").await,
            Err(ArgoError::InvalidInput(_))
        ));
        assert!(matches!(
            store.measurements("9999").await,
            Err(ArgoError::NotFound(_))
        ));

        drop(store);
        cleanup_db_file(&db_path);
    }
}
