use argo_dashboard::ProfileQuery;
use clap::Args;
use serde::{Deserialize, Serialize};

#[derive(Args, Debug, Default, Clone, Serialize, Deserialize)]
pub struct ProfileSearchArgs {
    /// case-insensitive text search over platform number, project, PI, platform type and data centre
    #[clap(short, long)]
    pub search: Option<String>,

    /// exact platform (float WMO) number
    #[clap(long)]
    pub platform_number: Option<String>,

    /// data centre code, e.g. `ME`, `IF`, `AO`
    #[clap(short = 'c', long)]
    pub data_center: Option<String>,

    /// data mode: `R`, `A` or `D`
    #[clap(short = 'm', long)]
    pub data_mode: Option<String>,

    /// platform type, e.g. `APEX`
    #[clap(long)]
    pub platform_type: Option<String>,

    /// project name
    #[clap(long)]
    pub project_name: Option<String>,

    #[clap(long, allow_hyphen_values = true)]
    pub min_lat: Option<f64>,

    #[clap(long, allow_hyphen_values = true)]
    pub max_lat: Option<f64>,

    #[clap(long, allow_hyphen_values = true)]
    pub min_lon: Option<f64>,

    #[clap(long, allow_hyphen_values = true)]
    pub max_lon: Option<f64>,

    /// start date, `YYYY-MM-DD` or RFC3339
    #[clap(short = 't', long)]
    pub start_date: Option<String>,

    /// end date, `YYYY-MM-DD` or RFC3339
    #[clap(short = 'T', long)]
    pub end_date: Option<String>,

    /// `all`, `good`, `real_time`, `adjusted`, `problematic` or a raw QC code
    #[clap(short, long)]
    pub quality_filter: Option<String>,

    /// page number, starting from 1
    #[clap(long)]
    pub page: Option<u32>,

    /// page size, at most 100
    #[clap(short, long)]
    pub limit: Option<u32>,

    /// sort column, e.g. `date_creation`, `juld`, `latitude`
    #[clap(long)]
    pub sort_by: Option<String>,

    /// `asc` or `desc`
    #[clap(long)]
    pub sort_order: Option<String>,
}

impl From<ProfileSearchArgs> for ProfileQuery {
    fn from(args: ProfileSearchArgs) -> Self {
        let float = |v: Option<f64>| v.map(|v| v.to_string());
        ProfileQuery {
            search: args.search,
            platform_number: args.platform_number,
            data_center: args.data_center,
            data_mode: args.data_mode,
            platform_type: args.platform_type,
            project_name: args.project_name,
            min_lat: float(args.min_lat),
            max_lat: float(args.max_lat),
            min_lon: float(args.min_lon),
            max_lon: float(args.max_lon),
            start_date: args.start_date,
            end_date: args.end_date,
            quality_filter: args.quality_filter,
            page: args.page.map(|v| v.to_string()),
            limit: args.limit.map(|v| v.to_string()),
            sort_by: args.sort_by,
            sort_order: args.sort_order,
        }
    }
}
