use anyhow::Result;
use std::process;

use crate::config::Config;

use super::helpers::{parse_plate, print_food_table};
use super::{open_service, render_report};

pub(crate) fn cmd_build(config: &Config, foods: &[String], json: bool) -> Result<()> {
    let plate = parse_plate(foods)?;
    let service = open_service(config)?;
    let report = service.analyze(&plate)?;
    render_report(&report, json)
}

pub(crate) fn cmd_search(config: &Config, query: &str, json: bool) -> Result<()> {
    let service = open_service(config)?;
    let hits = service.search(query)?;

    if hits.is_empty() {
        if json {
            println!("[]");
        } else {
            eprintln!("No results found for '{query}'");
        }
        process::exit(2);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&hits)?);
    } else {
        print_food_table(&hits);
    }

    Ok(())
}
