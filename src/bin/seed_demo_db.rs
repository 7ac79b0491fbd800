// Dev utility: back up and recreate a database populated with the demo scenario.
//
// Usage:
//   cargo run --bin seed_demo_db -- [db_path]

use chrono::Local;
use std::error::Error;
use std::fs;
use std::path::Path;

use flood_relief_logistics::app::{resolve_db_path, seed_demo_data, AppState};
use flood_relief_logistics::logging;

fn main() -> Result<(), Box<dyn Error>> {
    logging::init();

    let arg = std::env::args().nth(1);
    let db_path = resolve_db_path(arg.as_deref());

    backup_and_reset_db(&db_path)?;

    let state = AppState::new(db_path.clone())?;
    let summary = seed_demo_data(&state, Local::now().naive_local())?;

    println!("{}", serde_json::to_string_pretty(&summary)?);
    eprintln!("Seeded {}", db_path);
    Ok(())
}

fn backup_and_reset_db(db_path: &str) -> Result<(), Box<dyn Error>> {
    let path = Path::new(db_path);
    if !path.exists() {
        return Ok(());
    }

    let ts = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let backup_path = format!("{}.bak.{}", db_path, ts);
    fs::copy(path, &backup_path)?;
    fs::remove_file(path)?;

    eprintln!("Backed up {} -> {}", db_path, backup_path);
    Ok(())
}
