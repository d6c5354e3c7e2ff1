// --- File: crates/schedulify_config/src/lib.rs ---
//! Configuration loading for Schedulify.
//!
//! Layers `config/default.*` and `config/{RUN_ENV}.*` files under
//! `SCHEDULIFY`-prefixed environment variable overrides, with a dotenv file
//! loaded once per process.

use config::{Config, ConfigError, Environment, File};
use once_cell::sync::OnceCell;
use std::env;

pub mod models;
pub use models::*;

static INIT_DOTENV: OnceCell<()> = OnceCell::new();

/// Ensures the dotenv file is loaded into the environment exactly once.
pub fn ensure_dotenv_loaded() {
    let dotenv_path = env::var("DOTENV_OVERRIDE").unwrap_or_else(|_| ".env".to_string());
    INIT_DOTENV.get_or_init(|| {
        dotenv::from_filename(&dotenv_path).ok();
    });
}

/// Loads the application configuration.
///
/// File sources are optional so a bare environment still boots on defaults;
/// environment variables use the `SCHEDULIFY` prefix with `__` separators
/// (e.g. `SCHEDULIFY_SERVER__PORT=9000`).
pub fn load_config() -> Result<AppConfig, ConfigError> {
    ensure_dotenv_loaded();

    let run_env = env::var("RUN_ENV").unwrap_or_else(|_| "debug".to_string());

    let builder = Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(File::with_name(&format!("config/{}", run_env)).required(false))
        .add_source(Environment::with_prefix("SCHEDULIFY").separator("__"));

    builder.build()?.try_deserialize()
}
