//! Laufzeit-Kontext mit der einmal geoeffneten Schluesseldatenbank

use std::sync::Arc;

use clipvault_crypto::plattform_pruefen;
use clipvault_db::{DatabaseConfig, SqliteDb};
use tokio::sync::OnceCell;

use crate::error::{VaultError, VaultResult};
use crate::key_manager::KeyManager;

/// Haelt Konfiguration und Datenbank-Handle
///
/// `init()` darf beliebig oft aufgerufen werden; die Datenbank wird nur
/// beim ersten Aufruf geoeffnet.
pub struct VaultContext {
    config: DatabaseConfig,
    db: OnceCell<Arc<SqliteDb>>,
}

impl VaultContext {
    pub fn neu(config: DatabaseConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Kontext mit bereits geoeffneter Datenbank (z.B. In-Memory fuer Tests)
    pub fn mit_db(db: SqliteDb) -> Self {
        Self {
            config: DatabaseConfig::default(),
            db: OnceCell::new_with(Some(Arc::new(db))),
        }
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Prueft die Plattform und oeffnet die Datenbank
    pub async fn init(&self) -> VaultResult<Arc<SqliteDb>> {
        let db = self
            .db
            .get_or_try_init(|| async {
                plattform_pruefen()?;
                let db = SqliteDb::oeffnen(&self.config).await.map_err(|e| {
                    VaultError::PlattformNichtUnterstuetzt(format!(
                        "Schluesselspeicher nicht verfuegbar: {e}"
                    ))
                })?;
                Ok::<_, VaultError>(Arc::new(db))
            })
            .await?;
        Ok(Arc::clone(db))
    }

    pub fn ist_initialisiert(&self) -> bool {
        self.db.initialized()
    }

    pub async fn key_manager(&self) -> VaultResult<KeyManager<SqliteDb>> {
        Ok(KeyManager::neu(self.init().await?))
    }

    pub async fn schliessen(&self) {
        if let Some(db) = self.db.get() {
            db.schliessen().await;
        }
    }
}
