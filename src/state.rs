use crate::config::AppConfig;
use crate::db::Pool;

pub struct AppState {
    pub db: Pool,
    pub config: AppConfig,
}
