use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub db_pool_size: usize,
    pub db_busy_timeout_ms: u64,
    /// Shared secret used by the identity gateway to sign `X-User-Id`.
    /// Empty means the header is trusted unsigned (local development).
    pub identity_secret: String,
    pub service_fee_percent: i64,
    pub cors_allow_origin: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "carshare.db".to_string()),
            db_pool_size: env::var("DB_POOL_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(8),
            db_busy_timeout_ms: env::var("DB_BUSY_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5000),
            identity_secret: env::var("IDENTITY_SECRET").unwrap_or_default(),
            service_fee_percent: env::var("SERVICE_FEE_PERCENT")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|p| *p >= 0)
                .unwrap_or(10),
            cors_allow_origin: env::var("CORS_ALLOW_ORIGIN").unwrap_or_else(|_| "*".to_string()),
        }
    }
}
