// src/utils/env.rs
use anyhow::{Context, Result};
use log::{debug, info, warn};

/// Loads `.env` from the working directory if present. Variables already set
/// in the process environment win.
pub fn load_env() {
    match dotenv::dotenv() {
        Ok(path) => info!("Loaded environment from {}", path.display()),
        Err(e) => debug!("No .env file loaded ({}); using process environment", e),
    }
}

/// Loads environment variables from an explicit file. A missing file is not an
/// error; a file that cannot be read line by line is.
pub fn load_env_from_file(file_path: &str) -> Result<()> {
    use std::fs::File;
    use std::io::{BufRead, BufReader};

    info!("Attempting to load environment variables from: {}", file_path);
    let file = match File::open(file_path) {
        Ok(file) => file,
        Err(e) => {
            warn!(
                "Could not open env file '{}': {}. Proceeding with system environment variables.",
                file_path, e
            );
            return Ok(());
        }
    };

    for line in BufReader::new(file).lines() {
        let line = line.context("Failed to read line from env file")?;
        let trimmed = line.trim();
        if trimmed.starts_with('#') || trimmed.is_empty() {
            continue;
        }
        if let Some((key, value)) = trimmed.split_once('=') {
            let key = key.trim();
            let value = value.trim().trim_matches('"');
            if std::env::var(key).is_err() {
                std::env::set_var(key, value);
                debug!(
                    "Set env var from file: {} = {}",
                    key,
                    if key == "POSTGRES_PASSWORD" { "[hidden]" } else { value }
                );
            }
        }
    }
    info!("Successfully processed env file: {}", file_path);
    Ok(())
}
