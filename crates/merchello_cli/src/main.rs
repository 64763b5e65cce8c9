//! CLI smoke entry point.
//!
//! # Responsibility
//! - Exercise `merchello_core` end to end against an in-memory database.
//! - Keep output deterministic apart from generated keys.
//!
//! Set `MERCHELLO_LOG_DIR` to an absolute path to also write core logs.

use log::info;
use merchello_core::{Attempt, Database, Entity, Province, ShipCountryService, ShipZoneService};
use std::process::ExitCode;
use uuid::Uuid;

fn main() -> ExitCode {
    println!("merchello_core ping={}", merchello_core::ping());
    println!("merchello_core version={}", merchello_core::core_version());

    if let Ok(log_dir) = std::env::var("MERCHELLO_LOG_DIR") {
        if let Err(err) = merchello_core::init_logging(merchello_core::default_log_level(), &log_dir)
        {
            eprintln!("logging disabled: {err}");
        }
    }

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("smoke failed: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open_in_memory()?;
    let zones = ShipZoneService::new(db.clone());
    let countries = ShipCountryService::new(db);
    let catalog_key = Uuid::new_v4();

    let zone = match zones.create_with_key(catalog_key, "North America", true)? {
        Attempt::Succeeded(zone) => zone,
        other => return Err(format!("zone create did not succeed: {other:?}").into()),
    };
    println!("ship_zone name={} code={}", zone.name(), zone.zone_code());

    let provinces = vec![Province::new("ON", "Ontario"), Province::new("QC", "Quebec")];
    let country = countries
        .create_with_key(catalog_key, Some(zone.key()), "CA", provinces, true)?
        .succeeded()
        .ok_or("country create did not succeed")?;
    println!(
        "ship_country code={} provinces={}",
        country.country_code(),
        country.provinces().len()
    );

    let duplicate = zones.create_with_key(catalog_key, "North America", true)?;
    println!(
        "duplicate_zone constraint_violation={}",
        duplicate.is_constraint_violation()
    );

    info!("event=cli_smoke module=cli status=ok");
    Ok(())
}
