use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    /// Recipient of the order-placed notification.
    pub order_notify_email: String,
    pub cache_enabled: bool,
    pub cache_ttl_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET is not set"))?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let order_notify_email =
            env::var("ORDER_NOTIFY_EMAIL").unwrap_or_else(|_| "admin@example.com".to_string());
        let cache_enabled = env::var("CACHE_ENABLED")
            .map(|v| parse_flag(&v))
            .unwrap_or(true);
        let cache_ttl_secs = env::var("CACHE_TTL_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(300);
        Ok(Self {
            port,
            database_url,
            host,
            jwt_secret,
            order_notify_email,
            cache_enabled,
            cache_ttl_secs,
        })
    }
}

fn parse_flag(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "0" | "false" | "no" | "off"
    )
}

#[cfg(test)]
mod tests {
    use super::parse_flag;

    #[test]
    fn flag_parsing_defaults_to_enabled() {
        assert!(parse_flag("true"));
        assert!(parse_flag("1"));
        assert!(parse_flag("anything"));
        assert!(!parse_flag("false"));
        assert!(!parse_flag(" OFF "));
        assert!(!parse_flag("0"));
    }
}
