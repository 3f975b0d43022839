mod api;
mod search;

use crate::api::start_api_service;
use crate::search::ProfileSearchArgs;
use argo_dashboard::{
    ArgoConfig, ArgoDashboard, FilterRequest, ProfileQuery, ProfileStore, ProfileSummary,
    QueryPlan, SqliteWarehouse,
};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::process::exit;
use std::sync::Arc;
use tabled::settings::Style;
use tabled::Table;
use tokio::runtime::Runtime;
use tracing::{debug, error, info};

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
#[clap(propagate_version = true)]
struct Cli {
    /// disable logging
    #[clap(long, global = true)]
    no_log: bool,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the dashboard RESTful API
    Serve {
        /// warehouse db file location, overrides `ARGO_DASHBOARD_DB_PATH`
        #[clap(short, long)]
        db_path: Option<String>,

        /// host address, overrides `ARGO_DASHBOARD_HOST`
        #[clap(long)]
        host: Option<String>,

        /// port number, overrides `ARGO_DASHBOARD_PORT`
        #[clap(short, long)]
        port: Option<u16>,
    },

    /// Create the warehouse tables in a new or existing db file
    Init {
        /// warehouse db file location
        #[clap()]
        db_path: String,
    },

    /// Search profiles on a running dashboard instance
    Search {
        #[clap(flatten)]
        query: ProfileSearchArgs,

        /// dashboard API URL, e.g. `http://localhost:40080/api`
        #[clap(short, long)]
        url: Option<String>,

        /// print out search results in JSON format instead of Markdown table
        #[clap(short, long)]
        json: bool,
    },

    /// Print the SQL statements a profile search would run
    Explain {
        #[clap(flatten)]
        query: ProfileSearchArgs,
    },
}

fn get_tokio_runtime() -> Runtime {
    let blocking_cpus = num_cpus::get();

    debug!("using {} blocking threads", blocking_cpus);
    match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .max_blocking_threads(blocking_cpus)
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            error!("failed to start tokio runtime: {}", e);
            exit(1);
        }
    }
}

fn enable_logging() {
    tracing_subscriber::fmt()
        .with_ansi(true)
        .with_level(true)
        .with_target(false)
        .init();
}

fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let do_log = !cli.no_log;

    if std::env::var_os("RUST_LOG").is_none() {
        std::env::set_var("RUST_LOG", "argo_dashboard=info");
    }

    match cli.command {
        Commands::Serve {
            db_path,
            host,
            port,
        } => {
            if do_log {
                enable_logging();
            }

            let mut config = ArgoConfig::from_env();
            if let Some(db_path) = db_path {
                config.warehouse.db_path = db_path;
            }
            if let Some(host) = host {
                config.api.host = host;
            }
            if let Some(port) = port {
                config.api.port = port;
            }
            for line in config.display_summary() {
                info!("{}", line);
            }

            let tables = match config.warehouse.tables() {
                Ok(tables) => tables,
                Err(e) => {
                    error!("{}", e);
                    exit(1);
                }
            };

            if std::fs::metadata(&config.warehouse.db_path).is_err() {
                error!("The specified database file does not exist. Consider run init command?");
                exit(1);
            }

            let rt = get_tokio_runtime();
            rt.block_on(async {
                let warehouse = match SqliteWarehouse::open(config.warehouse.db_path.as_str()).await
                {
                    Ok(warehouse) => warehouse,
                    Err(e) => {
                        error!("{}", e);
                        exit(1);
                    }
                };
                let store = ProfileStore::new(Arc::new(warehouse), tables);
                if let Err(e) = start_api_service(store, config.api.host, config.api.port).await {
                    error!("API service stopped: {}", e);
                    exit(1);
                }
            });
        }
        Commands::Init { db_path } => {
            if do_log {
                enable_logging();
            }

            let config = ArgoConfig::from_env();
            let tables = match config.warehouse.tables() {
                Ok(tables) => tables,
                Err(e) => {
                    error!("{}", e);
                    exit(1);
                }
            };

            let rt = get_tokio_runtime();
            rt.block_on(async {
                let result = match SqliteWarehouse::new(db_path.as_str()).await {
                    Ok(warehouse) => warehouse.initialize_schema(&tables).await,
                    Err(e) => Err(e),
                };
                if let Err(e) = result {
                    error!("failed to initialize warehouse at {}: {}", db_path, e);
                    exit(1);
                }
            });
        }
        Commands::Search { query, json, url } => {
            let mut dashboard = ArgoDashboard::new();
            if let Some(url) = url {
                dashboard = dashboard.dashboard_url(url);
            }
            // health check first
            if dashboard.health_check().is_err() {
                println!(
                    "dashboard instance at {} is not available",
                    dashboard.dashboard_url
                );
                return;
            }

            let dashboard = dashboard.with_query(ProfileQuery::from(query));
            let res = match dashboard.query_single_page() {
                Ok(res) => res,
                Err(e) => {
                    println!("{}", e);
                    exit(1);
                }
            };

            if json {
                match serde_json::to_string_pretty(&res) {
                    Ok(s) => println!("{}", s),
                    Err(e) => {
                        println!("{}", e);
                        exit(1);
                    }
                }
            } else {
                let rows = res
                    .profiles
                    .iter()
                    .map(ProfileSummary::from)
                    .collect::<Vec<ProfileSummary>>();
                println!("{}", Table::new(rows).with(Style::markdown()));
                println!(
                    "page {}/{}, {} profiles, {} measurements",
                    res.pagination.page,
                    res.pagination.total_pages,
                    res.pagination.total,
                    res.statistics.total_measurements
                );
            }
        }
        Commands::Explain { query } => {
            let config = ArgoConfig::from_env();
            let tables = match config.warehouse.tables() {
                Ok(tables) => tables,
                Err(e) => {
                    println!("{}", e);
                    exit(1);
                }
            };
            let request = match FilterRequest::from_query(&ProfileQuery::from(query)) {
                Ok(request) => request,
                Err(e) => {
                    println!("{}", e);
                    exit(1);
                }
            };
            let plan = QueryPlan::new(&request, &tables);
            let explained = json!({
                "rows": plan.rows_statement(),
                "count": plan.count_statement(),
                "measurement_count": plan.measurement_count_statement(),
                "quality_breakdown": plan.quality_breakdown_statement(),
            });
            match serde_json::to_string_pretty(&explained) {
                Ok(s) => println!("{}", s),
                Err(e) => {
                    println!("{}", e);
                    exit(1);
                }
            }
        }
    }
}
