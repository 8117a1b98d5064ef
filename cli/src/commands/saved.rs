use anyhow::Result;
use std::process;

use crate::config::Config;
use plate_core::store::Retrieval;

use super::helpers::parse_plate;
use super::{open_service, render_report};

pub(crate) fn cmd_save(
    config: &Config,
    username: &str,
    password: &str,
    foods: &[String],
    json: bool,
) -> Result<()> {
    let plate = parse_plate(foods)?;
    let service = open_service(config)?;
    let username = service.save_plate(username, password, &plate)?;

    if json {
        println!(
            "{}",
            serde_json::json!({ "username": username, "plate": plate })
        );
    } else {
        println!("Plate saved for user '{username}'!");
    }

    Ok(())
}

pub(crate) fn cmd_load(
    config: &Config,
    username: &str,
    password: &str,
    analyze: bool,
    json: bool,
) -> Result<()> {
    let service = open_service(config)?;

    let plate = match service.load_plate(username, password)? {
        Retrieval::Plate(plate) => plate,
        failure => {
            if json {
                let reason = match failure {
                    Retrieval::WrongPassword => "wrong_password",
                    _ => "not_found",
                };
                println!(
                    "{}",
                    serde_json::json!({ "error": failure.to_string(), "reason": reason })
                );
            } else {
                eprintln!("{failure}");
            }
            process::exit(2);
        }
    };

    if analyze {
        let report = service.analyze(&plate)?;
        return render_report(&report, json);
    }

    let username = username.trim();
    if json {
        println!(
            "{}",
            serde_json::json!({ "username": username, "plate": plate })
        );
    } else if plate.is_empty() {
        println!("Plate for '{username}' is empty.");
    } else {
        println!("Plate for '{username}':");
        for (i, item) in plate.iter().enumerate() {
            println!("  {}. {item}", i + 1);
        }
    }

    Ok(())
}

pub(crate) fn cmd_users(config: &Config, json: bool) -> Result<()> {
    let users = open_service(config)?.list_users()?;

    if users.is_empty() {
        if json {
            println!("[]");
        } else {
            eprintln!("No saved plates");
        }
        process::exit(2);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&users)?);
    } else {
        for user in &users {
            println!("{user}");
        }
    }

    Ok(())
}
