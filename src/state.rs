use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::mailer::Mailer;

/// Shared application state handed to every route module.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub mailer: Arc<Mailer>,
}

impl AppState {
    pub fn new(pool: PgPool, config: Config, mailer: Mailer) -> Self {
        AppState {
            pool,
            config: Arc::new(config),
            mailer: Arc::new(mailer),
        }
    }
}
