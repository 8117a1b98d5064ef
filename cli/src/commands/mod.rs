mod build;
mod helpers;
mod saved;

use anyhow::Result;
use tracing::debug;

use crate::charts::{daily_value_chart, food_group_chart};
use crate::config::Config;
use plate_core::service::{PlateReport, PlateService};

use helpers::{print_plate_table, totals_line};

pub(crate) use build::{cmd_build, cmd_search};
pub(crate) use saved::{cmd_load, cmd_save, cmd_users};

/// Open the plate store named by the config; the dataset loads on first use.
pub(super) fn open_service(config: &Config) -> Result<PlateService> {
    debug!(store = %config.store_path.display(), "opening plate service");
    PlateService::open(&config.dataset_dir, &config.store_path)
}

/// Report unresolved items, then draw the plate table, totals and both charts.
pub(super) fn render_report(report: &PlateReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    for unresolved in &report.unresolved {
        eprintln!("{unresolved}");
    }

    print_plate_table(report);
    println!("  {}\n", totals_line(report));
    println!("{}", food_group_chart(&report.totals.food_groups));
    print!("{}", daily_value_chart(&report.percentages));
    Ok(())
}
