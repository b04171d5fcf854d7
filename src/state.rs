use std::sync::Arc;

use tracing::info;

use crate::auth::IdentityStore;
use crate::catalog::CatalogClient;
use crate::config::AppConfig;
use crate::database::Database;
use crate::error::Result;
use crate::interactions::InteractionStore;
use crate::logging::init_logging;
use crate::models::{Account, SignupRequest};

/// Application context: both stores plus the catalog client.
///
/// Session changes go through here so the interaction snapshot always
/// belongs to the signed-in account. The identity store is only handed
/// out read-only for that reason.
pub struct AppState {
    identity: IdentityStore,
    interactions: InteractionStore,
    catalog: CatalogClient,
}

impl AppState {
    /// Reads `.env` and the environment, installs logging at `LOG_LEVEL`
    /// and opens the database.
    pub fn from_env() -> Result<Self> {
        let config = AppConfig::from_env()?;
        init_logging(&config.log_level)?;
        Self::new(&config)
    }

    pub fn new(config: &AppConfig) -> Result<Self> {
        let db = Arc::new(Database::open(&config.data_path)?);
        info!(path = %config.data_path.display(), "database opened");
        let catalog = CatalogClient::from_config(config)?;
        Self::with_parts(db, catalog)
    }

    pub fn with_parts(db: Arc<Database>, catalog: CatalogClient) -> Result<Self> {
        let identity = IdentityStore::open(db.clone());
        let mut interactions = InteractionStore::new(db);
        interactions.load(identity.current_user())?;
        Ok(Self {
            identity,
            interactions,
            catalog,
        })
    }

    pub fn identity(&self) -> &IdentityStore {
        &self.identity
    }

    pub fn current_user(&self) -> Option<&Account> {
        self.identity.current_user()
    }

    pub fn interactions(&self) -> &InteractionStore {
        &self.interactions
    }

    pub fn interactions_mut(&mut self) -> &mut InteractionStore {
        &mut self.interactions
    }

    pub fn catalog(&self) -> &CatalogClient {
        &self.catalog
    }

    // Unsaved interactions are flushed before the session moves, so a
    // failed write leaves both stores on the outgoing account.

    pub fn signup(&mut self, req: SignupRequest) -> Result<Account> {
        self.interactions.flush()?;
        let account = self.identity.signup(req)?;
        self.interactions.load(Some(&account))?;
        Ok(account)
    }

    pub fn login(&mut self, email: &str, password: &str) -> Result<Account> {
        self.interactions.flush()?;
        let account = self.identity.login(email, password)?;
        self.interactions.load(Some(&account))?;
        Ok(account)
    }

    pub fn logout(&mut self) -> Result<()> {
        self.interactions.flush()?;
        self.identity.logout()?;
        self.catalog.cancel_pending();
        self.interactions.load(None)
    }
}
