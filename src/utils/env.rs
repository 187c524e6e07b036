// src/utils/env.rs

use log::{debug, info};

/// Loads variables from a `.env` file in the working directory (or any parent).
/// A missing file is not an error; the process environment is used as-is.
pub fn load_env() {
    match dotenv::dotenv() {
        Ok(path) => info!("Loaded environment from {}", path.display()),
        Err(e) => debug!("No .env file loaded ({}), using process environment", e),
    }
}
