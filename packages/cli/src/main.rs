#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line front end for the rat risk dashboard.
//!
//! ```text
//! rat_risk zones
//! rat_risk search <query> [--limit 10]
//! rat_risk detail <id>
//! ```
//!
//! Connection settings come from the `RAT_RISK_*` environment variables
//! and can be overridden with the global flags. Log output goes through
//! `indicatif-log-bridge` (see [`console::init_logger`]) so that log lines
//! and the busy spinner never fight for the terminal.

mod console;

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use rat_risk_dashboard::config::DashboardConfig;
use rat_risk_dashboard::controller::{DashboardController, SelectOutcome};
use rat_risk_dashboard::view::ZoneSummaryView;
use rat_risk_restaurant_models::RestaurantId;
use rat_risk_source::client::HttpDataService;
use rat_risk_source::config::ConfigError;

use crate::console::{ConsolePresenter, LogRenderer};

#[derive(Parser)]
#[command(
    name = "rat_risk",
    about = "Restaurant rat-risk dashboard for the command line"
)]
struct Cli {
    /// Data service base URL (overrides `RAT_RISK_API_URL`)
    #[arg(long)]
    api_url: Option<String>,

    /// Dataset served by the list endpoint (overrides `RAT_RISK_DATASET`)
    #[arg(long)]
    dataset: Option<String>,

    /// Maximum number of restaurants to fetch (overrides `RAT_RISK_FETCH_LIMIT`)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    limit: Option<u32>,

    /// Per-request timeout in seconds (overrides `RAT_RISK_TIMEOUT_SECS`)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    timeout_secs: Option<u64>,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print every zone's risk tier, restaurant count, and activity rate
    Zones,
    /// Search restaurants by name
    Search {
        /// Name fragment (at least two characters)
        query: String,
        /// Maximum number of results
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        limit: Option<u32>,
    },
    /// Show inspection and rat-activity detail for one restaurant
    Detail {
        /// Restaurant id (CAMIS)
        id: String,
    },
}

impl Cli {
    /// Layers the command-line overrides on top of the environment.
    fn config(&self) -> Result<DashboardConfig, ConfigError> {
        let mut config = DashboardConfig::from_env()?;

        if let Some(url) = &self.api_url {
            config.service = config.service.with_base_url(url)?;
        }
        if let Some(dataset) = &self.dataset {
            config.service.dataset.clone_from(dataset);
        }
        if let Some(limit) = self.limit {
            config.service.fetch_limit = limit;
        }
        if let Some(secs) = self.timeout_secs {
            config.service.timeout = Duration::from_secs(secs);
        }
        if let Commands::Search {
            limit: Some(limit), ..
        } = &self.command
        {
            config.search_limit = *limit as usize;
        }

        Ok(config)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = console::init_logger();
    let cli = Cli::parse();
    let config = cli.config()?;

    let service = Arc::new(HttpDataService::new(config.service.clone())?);
    let settings = service.config();
    log::debug!(
        "Using {} (dataset={}, limit={}, timeout={:?})",
        settings.base_url,
        settings.dataset,
        settings.fetch_limit,
        settings.timeout
    );
    let controller = DashboardController::new(
        service,
        LogRenderer,
        ConsolePresenter::new(multi, cli.json),
        &config,
    );

    controller.load().await?;

    match cli.command {
        Commands::Zones => {
            let zones: Vec<ZoneSummaryView> = controller
                .classified_zones()
                .iter()
                .map(ZoneSummaryView::from)
                .collect();
            controller.presenter().show_zones(&zones);
        }
        Commands::Search { query, .. } => {
            controller.search(&query);
        }
        Commands::Detail { id } => {
            let outcome = controller.select(&RestaurantId::new(id)).await?;
            if outcome == SelectOutcome::Superseded {
                log::warn!("Detail was superseded before it could be shown");
            }
        }
    }

    Ok(())
}
