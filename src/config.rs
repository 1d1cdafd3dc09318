//! Runtime configuration read from the environment
//!
//! Every setting has a default so the server starts with an empty environment.
//! A `.env` file in the working directory is honoured when present.

use std::env;

use dotenvy::dotenv;

/// Server settings shared with handlers through `AppState`
#[derive(Debug, Clone)]
pub struct Config {
    /// Port the HTTP listener binds to (`PORT`, default 8080)
    pub port: u16,

    /// Path of the redb database file (`DATABASE_URL`, default "data.db")
    pub database_url: String,

    /// Base used to turn relative photo paths into display URLs
    /// (`URL` joined with the port, default "http://localhost:8080")
    pub public_url: String,

    /// Shared secret required in the `Authorization` header (`AUTHORIZATION`)
    ///
    /// When unset or empty the API is open.
    pub api_key: Option<String>,

    /// Optional JSON file replacing the built-in region catalog (`REGION_CATALOG`)
    pub catalog_path: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl Config {
    /// Loads `.env` (if any) and reads the process environment
    pub fn from_env() -> Self {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = lookup("PORT")
            .and_then(|value| value.parse().ok())
            .unwrap_or(8080);

        let database_url = lookup("DATABASE_URL").unwrap_or_else(|| "data.db".to_string());

        let base_url = lookup("URL").unwrap_or_else(|| "http://localhost".to_string());
        let public_url = format!("{}:{}", base_url.trim_end_matches('/'), port);

        let api_key = lookup("AUTHORIZATION").filter(|key| !key.is_empty());
        let catalog_path = lookup("REGION_CATALOG").filter(|path| !path.is_empty());

        Self {
            port,
            database_url,
            public_url,
            api_key,
            catalog_path,
        }
    }

    /// Resolves a stored photo path into a URL the client can load
    ///
    /// Absolute `http(s)` URLs pass through untouched.
    pub fn display_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}/{}", self.public_url, path.trim_start_matches('/'))
        }
    }
}
