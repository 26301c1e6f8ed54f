use std::path::PathBuf;

use crate::app_config::{CrawlConfig, DelayRange, Environment, Viewport};
use crate::ConfigError;

/// Load crawl configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a variable holds an invalid value.
pub fn load_crawl_config() -> Result<CrawlConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_crawl_config_from_env()
}

/// Load crawl configuration from environment variables already in the process.
///
/// Unlike [`load_crawl_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a variable holds an invalid value.
pub fn load_crawl_config_from_env() -> Result<CrawlConfig, ConfigError> {
    build_crawl_config(|key| std::env::var(key))
}

/// Core parsing/validation, decoupled from the process environment so it can
/// be tested with a `HashMap` lookup.
fn build_crawl_config<F>(lookup: F) -> Result<CrawlConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .trim()
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .trim()
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .trim()
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_range = |prefix: &str, min: &str, max: &str| -> Result<DelayRange, ConfigError> {
        let min_var = format!("{prefix}_MIN_MS");
        let max_var = format!("{prefix}_MAX_MS");
        let min_ms = parse_u64(&min_var, min)?;
        let max_ms = parse_u64(&max_var, max)?;
        if min_ms > max_ms {
            return Err(invalid(
                &min_var,
                format!("{min_ms} exceeds {max_var} ({max_ms})"),
            ));
        }
        Ok(DelayRange { min_ms, max_ms })
    };

    let env = parse_environment(&or_default("FPCRAWL_ENV", "development"))?;
    let log_level = or_default("FPCRAWL_LOG_LEVEL", "info");
    let catalogs_path = PathBuf::from(or_default(
        "FPCRAWL_CATALOGS_PATH",
        "./config/catalogs.yaml",
    ));

    let navigation_timeout_secs = parse_u64("FPCRAWL_NAVIGATION_TIMEOUT_SECS", "180")?;
    let settle_delay = parse_range("FPCRAWL_SETTLE_DELAY", "2000", "5000")?;
    let record_delay = parse_range("FPCRAWL_RECORD_DELAY", "1000", "3000")?;
    let page_delay = parse_range("FPCRAWL_PAGE_DELAY", "3000", "7000")?;

    let max_concurrent_pages = parse_usize("FPCRAWL_MAX_CONCURRENT_PAGES", "1")?;
    if max_concurrent_pages == 0 {
        return Err(invalid(
            "FPCRAWL_MAX_CONCURRENT_PAGES",
            "must be at least 1".to_string(),
        ));
    }
    let max_pages = parse_usize("FPCRAWL_MAX_PAGES", "200")?;
    let max_retries = parse_u32("FPCRAWL_MAX_RETRIES", "0")?;
    let retry_backoff_base_secs = parse_u64("FPCRAWL_RETRY_BACKOFF_BASE_SECS", "5")?;

    let snapshot_dir = PathBuf::from(or_default("FPCRAWL_SNAPSHOT_DIR", "./snapshots"));
    let user_agent = lookup("FPCRAWL_USER_AGENT")
        .ok()
        .filter(|ua| !ua.trim().is_empty());
    let locale = or_default("FPCRAWL_LOCALE", "ru-RU");
    let timezone = or_default("FPCRAWL_TIMEZONE", "Europe/Moscow");
    let viewport = parse_viewport(&or_default("FPCRAWL_VIEWPORT", "1920x1080"))
        .map_err(|reason| invalid("FPCRAWL_VIEWPORT", reason))?;
    let scroll_nudge_px = parse_u32("FPCRAWL_SCROLL_NUDGE_PX", "500")?;

    Ok(CrawlConfig {
        env,
        log_level,
        catalogs_path,
        navigation_timeout_secs,
        settle_delay,
        record_delay,
        page_delay,
        max_concurrent_pages,
        max_pages,
        max_retries,
        retry_backoff_base_secs,
        snapshot_dir,
        user_agent,
        locale,
        timezone,
        viewport,
        scroll_nudge_px,
    })
}

fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "FPCRAWL_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

/// Parses `"WIDTHxHEIGHT"`, e.g. `"1920x1080"`.
fn parse_viewport(raw: &str) -> Result<Viewport, String> {
    let (w, h) = raw
        .trim()
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{raw}'"))?;
    let width = w.trim().parse::<u32>().map_err(|e| e.to_string())?;
    let height = h.trim().parse::<u32>().map_err(|e| e.to_string())?;
    if width == 0 || height == 0 {
        return Err(format!("viewport dimensions must be non-zero, got '{raw}'"));
    }
    Ok(Viewport { width, height })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
