use std::sync::Arc;

use crate::auth::{
    jwt::JwtKeys,
    memory::InMemoryUserStore,
    repo::{PgUserStore, UserStore},
};
use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserStore>,
    pub keys: JwtKeys,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = AppConfig::from_env()?;

        let users: Arc<dyn UserStore> = match config.database_url.as_deref() {
            Some(url) => {
                let store = PgUserStore::connect(url).await?;
                store.migrate().await?;
                tracing::info!("database migrations applied");
                Arc::new(store)
            }
            None => {
                tracing::warn!("DATABASE_URL not set; users are kept in memory and lost on restart");
                Arc::new(InMemoryUserStore::new())
            }
        };

        Ok(Self::from_parts(Arc::new(config), users))
    }

    pub fn from_parts(config: Arc<AppConfig>, users: Arc<dyn UserStore>) -> Self {
        let keys = JwtKeys::from_config(&config.jwt);
        Self {
            config,
            users,
            keys,
        }
    }

    #[cfg(test)]
    pub fn fake(users: Arc<dyn UserStore>) -> Self {
        let config = Arc::new(AppConfig {
            database_url: None,
            jwt: crate::config::JwtConfig {
                secret: "test".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_minutes: 5,
            },
            signup_credits: 1,
        });
        Self::from_parts(config, users)
    }
}
