use crate::db::utils::column_strings;
use crate::db::ProfileStore;
use crate::item::{FilterOptions, LabeledOption};
use crate::quality::{data_centre_label, data_mode_label, qc_label, QcFlag};
use crate::ArgoError;
use tracing::info;

/// Number of projects offered, most common first.
pub const TOP_PROJECTS: u32 = 15;

/// Profiles with every categorical field present.
const COMPLETE_PROFILES: &str = "data_centre IS NOT NULL AND data_mode IS NOT NULL \
    AND platform_type IS NOT NULL AND project_name IS NOT NULL";

/// Raw QC flags already covered by a derived quality option.
const COVERED_FLAGS: [QcFlag; 5] = [
    QcFlag::Adjusted,
    QcFlag::Good,
    QcFlag::ProbablyGood,
    QcFlag::ProbablyBad,
    QcFlag::Bad,
];

fn derived_quality_options() -> Vec<LabeledOption> {
    vec![
        LabeledOption::new("all", "All Quality"),
        LabeledOption::new("good", "Good Quality Only (QC=A)"),
        LabeledOption::new("real_time", "Real-time (Mode R)"),
        LabeledOption::new("adjusted", "Adjusted (Mode A)"),
        LabeledOption::new("problematic", "Problematic (QC=B/C/F)"),
    ]
}

fn is_covered(flag: &str) -> bool {
    COVERED_FLAGS.iter().any(|f| f.code() == flag)
}

impl ProfileStore {
    fn distinct_values_sql(&self, column: &str) -> String {
        format!(
            "SELECT DISTINCT {column} AS value FROM {} WHERE {} ORDER BY value",
            self.tables.profiles(),
            COMPLETE_PROFILES
        )
    }

    /// Values for the filter dropdowns.
    pub async fn filter_options(&self) -> Result<FilterOptions, ArgoError> {
        let profiles = self.tables.profiles();
        let centres_sql = self.distinct_values_sql("data_centre");
        let modes_sql = self.distinct_values_sql("data_mode");
        let platforms_sql = self.distinct_values_sql("platform_type");
        let projects_sql = format!(
            r#"
            SELECT project_name AS value, COUNT(*) AS count
            FROM {profiles}
            WHERE {COMPLETE_PROFILES}
            GROUP BY project_name
            ORDER BY count DESC, value
            LIMIT {TOP_PROJECTS}
            "#
        );
        let flags_sql = format!(
            r#"
            SELECT DISTINCT value FROM (
                SELECT profile_temp_qc AS value FROM {profiles} WHERE {COMPLETE_PROFILES}
                UNION
                SELECT profile_psal_qc AS value FROM {profiles} WHERE {COMPLETE_PROFILES}
                UNION
                SELECT profile_pres_qc AS value FROM {profiles} WHERE {COMPLETE_PROFILES}
            )
            WHERE value IS NOT NULL
            ORDER BY value
            "#
        );

        let (centres, modes, platforms, projects, flags) = tokio::try_join!(
            self.warehouse.execute(centres_sql.as_str(), &[]),
            self.warehouse.execute(modes_sql.as_str(), &[]),
            self.warehouse.execute(platforms_sql.as_str(), &[]),
            self.warehouse.execute(projects_sql.as_str(), &[]),
            self.warehouse.execute(flags_sql.as_str(), &[]),
        )?;

        let mut quality_options = derived_quality_options();
        quality_options.extend(
            column_strings(&flags, "value")
                .into_iter()
                .filter(|flag| !is_covered(flag))
                .map(|flag| LabeledOption {
                    label: qc_label(&flag),
                    value: flag,
                }),
        );

        let options = FilterOptions {
            data_centres: column_strings(&centres, "value")
                .into_iter()
                .map(|c| LabeledOption {
                    label: data_centre_label(&c),
                    value: c,
                })
                .collect(),
            data_modes: column_strings(&modes, "value")
                .into_iter()
                .map(|m| LabeledOption {
                    label: data_mode_label(&m),
                    value: m,
                })
                .collect(),
            platform_types: column_strings(&platforms, "value"),
            projects: column_strings(&projects, "value"),
            quality_options,
        };

        info!(
            "found filter options: {} centres, {} platforms, {} projects",
            options.data_centres.len(),
            options.platform_types.len(),
            options.projects.len()
        );
        Ok(options)
    }
}
