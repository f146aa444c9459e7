//! Connection to the Sponsora store.

use std::fmt;

use serde::Deserialize;
use surrealdb::Surreal;
use surrealdb::engine::remote::ws::{Client, Ws};
use surrealdb::opt::auth::Root;
use tracing::info;

use crate::error::DbError;

/// Where the Sponsora store lives and how to sign in to it.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    /// WebSocket address of the SurrealDB server, e.g. `127.0.0.1:8000`.
    pub url: String,
    pub namespace: String,
    pub database: String,
    pub username: String,
    pub password: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: "127.0.0.1:8000".into(),
            namespace: "sponsora".into(),
            database: "main".into(),
            username: "root".into(),
            password: "root".into(),
        }
    }
}

// Keeps the password out of logged configuration.
impl fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbConfig")
            .field("url", &self.url)
            .field("namespace", &self.namespace)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// An open, authenticated session on the Sponsora namespace and database.
#[derive(Clone)]
pub struct DbManager {
    db: Surreal<Client>,
}

impl DbManager {
    /// Open the store. Each step that fails is reported with the server
    /// address and the step that failed.
    pub async fn connect(config: &DbConfig) -> Result<Self, DbError> {
        let failed = |step: &'static str| {
            let url = config.url.clone();
            move |source| DbError::Connect { url, step, source }
        };

        info!(
            url = %config.url,
            namespace = %config.namespace,
            database = %config.database,
            "Opening Sponsora store"
        );

        let db = Surreal::new::<Ws>(&config.url)
            .await
            .map_err(failed("open connection"))?;
        db.signin(Root {
            username: config.username.clone(),
            password: config.password.clone(),
        })
        .await
        .map_err(failed("sign in"))?;
        db.use_ns(&config.namespace)
            .use_db(&config.database)
            .await
            .map_err(failed("select namespace and database"))?;

        info!(namespace = %config.namespace, "Sponsora store ready");
        Ok(Self { db })
    }

    pub fn client(&self) -> &Surreal<Client> {
        &self.db
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_hides_password() {
        let config = DbConfig {
            password: "hunter2".into(),
            ..DbConfig::default()
        };
        let shown = format!("{config:?}");
        assert!(!shown.contains("hunter2"));
        assert!(shown.contains("sponsora"));
    }
}
