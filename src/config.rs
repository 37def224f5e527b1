use std::env;
use std::path::PathBuf;

use anyhow::{Context as _, Result};

/// Credentials and session location, read once at startup and passed
/// around by value. Missing credentials abort before any network call.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub api_id: i32,
    pub api_hash: String,
    pub session_file: PathBuf,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self> {
        let api_id = env::var("TG_API_ID")
            .context("TG_API_ID not set; create an application at https://my.telegram.org")?
            .trim()
            .parse::<i32>()
            .context("TG_API_ID must be an integer")?;
        let api_hash = env::var("TG_API_HASH")
            .context("TG_API_HASH not set; create an application at https://my.telegram.org")?;
        let session_file = env::var("TG_SESSION_FILE")
            .unwrap_or_else(|_| "tgsweep.session".to_string())
            .into();
        Ok(Self {
            api_id,
            api_hash,
            session_file,
        })
    }
}
