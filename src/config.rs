//! Environment-driven settings.
//!
//! Values come from the process environment, typically populated from a
//! `.env` file by `dotenvy` at startup.

use anyhow::{Context, Result, anyhow};
use std::time::Duration;

use crate::contribute::DEFAULT_LOOKUP_CONCURRENCY;

pub const DEFAULT_POSTCODE_API_URL: &str = "https://api.postcodes.io";
const DEFAULT_LOOKUP_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub supabase_url: Option<String>,
    pub supabase_key: Option<String>,
    pub postcode_api_url: String,
    pub lookup_concurrency: usize,
    pub lookup_timeout: Duration,
}

/// Backend coordinates, present only when both variables are set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendSettings<'a> {
    pub url: &'a str,
    pub key: &'a str,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds settings from an arbitrary variable source.
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_empty = |name: &str| var(name).filter(|v| !v.trim().is_empty());

        let lookup_concurrency = match non_empty("LOOKUP_CONCURRENCY") {
            Some(v) => v
                .trim()
                .parse()
                .with_context(|| format!("LOOKUP_CONCURRENCY must be a number, got {v:?}"))?,
            None => DEFAULT_LOOKUP_CONCURRENCY,
        };
        let timeout_secs = match non_empty("LOOKUP_TIMEOUT_SECS") {
            Some(v) => v
                .trim()
                .parse()
                .with_context(|| format!("LOOKUP_TIMEOUT_SECS must be a number, got {v:?}"))?,
            None => DEFAULT_LOOKUP_TIMEOUT_SECS,
        };

        Ok(Self {
            supabase_url: non_empty("SUPABASE_URL"),
            supabase_key: non_empty("SUPABASE_KEY"),
            postcode_api_url: non_empty("POSTCODE_API_URL")
                .unwrap_or_else(|| DEFAULT_POSTCODE_API_URL.to_string()),
            lookup_concurrency,
            lookup_timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// # Errors
    ///
    /// Fails naming the missing variable when the backend is not configured.
    pub fn backend(&self) -> Result<BackendSettings<'_>> {
        let url = self
            .supabase_url
            .as_deref()
            .ok_or_else(|| anyhow!("SUPABASE_URL must be set"))?;
        let key = self
            .supabase_key
            .as_deref()
            .ok_or_else(|| anyhow!("SUPABASE_KEY must be set"))?;
        Ok(BackendSettings { url, key })
    }
}
