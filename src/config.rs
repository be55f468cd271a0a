use std::env;

/// Default base URL for the USDA FoodData Central API
pub const DEFAULT_FDC_BASE_URL: &str = "https://api.nal.usda.gov/fdc/v1";

/// Query terms rejected as food names unless overridden via QUERY_BLACKLIST
const DEFAULT_QUERY_BLACKLIST: &[&str] = &["test", "debug", "admin", "system"];

/// Application configuration, read once at startup
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Port the HTTP server binds to
    pub port: u16,
    /// Deployment environment name, reported by /health
    pub environment: String,
    /// FoodData Central API key; None means /foods returns a configuration error
    pub fdc_api_key: Option<String>,
    /// Base URL of the FoodData Central API
    pub fdc_base_url: String,
    /// Lowercased reserved terms rejected as food queries
    pub query_blacklist: Vec<String>,
}

impl AppConfig {
    /// Load configuration from the environment (and an optional .env file).
    ///
    /// Nothing here is required: a missing API key is reported per-request
    /// so the server can still boot and answer /health.
    pub fn load() -> Self {
        // .env is optional; real environment variables take precedence
        dotenvy::dotenv().ok();

        let fdc_api_key = env::var("FDC_API_KEY")
            .ok()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());

        let query_blacklist = env::var("QUERY_BLACKLIST")
            .map(|raw| {
                raw.split(',')
                    .map(|w| w.trim().to_lowercase())
                    .filter(|w| !w.is_empty())
                    .collect()
            })
            .unwrap_or_else(|_| {
                DEFAULT_QUERY_BLACKLIST
                    .iter()
                    .map(|w| (*w).to_string())
                    .collect()
            });

        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            environment: env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
            fdc_api_key,
            fdc_base_url: env::var("FDC_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_FDC_BASE_URL.to_string()),
            query_blacklist,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_blacklist_contains_reserved_terms() {
        for term in ["test", "debug", "admin", "system"] {
            assert!(DEFAULT_QUERY_BLACKLIST.contains(&term));
        }
    }
}
