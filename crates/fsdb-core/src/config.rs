use crate::app_config::{AppConfig, Environment, PageRounding};
use crate::ConfigError;

const DEFAULT_CRAWL_BASE_URL: &str = "https://mocha.lozi.vn/v6.1/search/eateries/near-by";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files, which suits tests
/// or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// This is the core parsing/validation logic, decoupled from the actual environment
/// so it can be tested with a pure `HashMap` lookup without touching the process environment.
#[allow(clippy::too_many_lines)]
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_f64 = |var: &str, default: &str| -> Result<f64, ConfigError> {
        let value = or_default(var, default)
            .parse::<f64>()
            .map_err(|e| invalid(var, e.to_string()))?;
        if value.is_finite() {
            Ok(value)
        } else {
            Err(invalid(var, "must be a finite number".to_string()))
        }
    };

    let database_url = require("DATABASE_URL")?;

    let env = parse_environment(&or_default("FSDB_ENV", "development"))?;
    let log_level = or_default("FSDB_LOG_LEVEL", "info");

    let db_max_connections = parse_u32("FSDB_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("FSDB_DB_MIN_CONNECTIONS", "1")?;
    if db_min_connections > db_max_connections {
        return Err(invalid(
            "FSDB_DB_MIN_CONNECTIONS",
            format!("must not exceed FSDB_DB_MAX_CONNECTIONS ({db_max_connections})"),
        ));
    }
    let db_acquire_timeout_secs = parse_u64("FSDB_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let crawl_base_url = or_default("FSDB_CRAWL_BASE_URL", DEFAULT_CRAWL_BASE_URL);
    let crawl_city_id = parse_u32("FSDB_CRAWL_CITY_ID", "50")?;
    let crawl_super_category_id = parse_u32("FSDB_CRAWL_SUPER_CATEGORY_ID", "1")?;
    let crawl_page_size = parse_u32("FSDB_CRAWL_PAGE_SIZE", "24")?;
    if crawl_page_size == 0 {
        return Err(invalid("FSDB_CRAWL_PAGE_SIZE", "must be at least 1".to_string()));
    }
    let crawl_lat = parse_f64("FSDB_CRAWL_LAT", "10.7765194")?;
    let crawl_lng = parse_f64("FSDB_CRAWL_LNG", "106.700987")?;

    let crawl_max_in_flight = or_default("FSDB_CRAWL_MAX_IN_FLIGHT", "10")
        .parse::<usize>()
        .map_err(|e| invalid("FSDB_CRAWL_MAX_IN_FLIGHT", e.to_string()))?;
    if crawl_max_in_flight == 0 {
        return Err(invalid(
            "FSDB_CRAWL_MAX_IN_FLIGHT",
            "must be at least 1".to_string(),
        ));
    }

    let crawl_total_pages = match lookup("FSDB_CRAWL_TOTAL_PAGES") {
        Ok(raw) => Some(
            raw.parse::<u32>()
                .map_err(|e| invalid("FSDB_CRAWL_TOTAL_PAGES", e.to_string()))?,
        ),
        Err(_) => None,
    };
    if crawl_total_pages == Some(0) {
        return Err(invalid(
            "FSDB_CRAWL_TOTAL_PAGES",
            "must be at least 1".to_string(),
        ));
    }

    let crawl_page_rounding = or_default("FSDB_CRAWL_PAGE_ROUNDING", "ceil")
        .parse::<PageRounding>()
        .map_err(|reason| invalid("FSDB_CRAWL_PAGE_ROUNDING", reason))?;

    let crawl_request_timeout_secs = parse_u64("FSDB_CRAWL_REQUEST_TIMEOUT_SECS", "30")?;
    let crawl_store_timeout_secs = parse_u64("FSDB_CRAWL_STORE_TIMEOUT_SECS", "15")?;
    let crawl_user_agent = or_default("FSDB_CRAWL_USER_AGENT", "fsdb/0.1 (eatery-crawler)");

    Ok(AppConfig {
        database_url,
        env,
        log_level,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        crawl_base_url,
        crawl_city_id,
        crawl_super_category_id,
        crawl_page_size,
        crawl_lat,
        crawl_lng,
        crawl_max_in_flight,
        crawl_total_pages,
        crawl_page_rounding,
        crawl_request_timeout_secs,
        crawl_store_timeout_secs,
        crawl_user_agent,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "FSDB_ENV".to_string(),
            reason: format!("unknown environment \"{other}\""),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
