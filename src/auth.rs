//! Account registry and the single active session.
//!
//! This is a placeholder identity mechanism. Secrets are hashed at rest,
//! but nothing here issues tokens or expires sessions.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::database::AccountStore;
use crate::error::{Error, Result};
use crate::models::{Account, SignupRequest, UserRecord};
use crate::password::{hash_password, verify_password};
use crate::validation;

pub struct IdentityStore {
    store: Arc<dyn AccountStore>,
    session: Option<Account>,
}

impl IdentityStore {
    /// Restores the last signed-in account, if its pointer can be read.
    pub fn open(store: Arc<dyn AccountStore>) -> Self {
        let session = match store.load_session() {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "could not restore session");
                None
            }
        };
        if let Some(account) = &session {
            info!(user = %account.username, "session restored");
        }
        Self { store, session }
    }

    pub fn current_user(&self) -> Option<&Account> {
        self.session.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    pub fn signup(&mut self, req: SignupRequest) -> Result<Account> {
        let username = req.username.trim();
        let email = req.email.trim();
        validation::validate_username(username)?;
        validation::validate_email(email)?;
        validation::validate_password(&req.password)?;
        validation::validate_display_name(&req.display_name)?;

        let mut users = self.store.load_accounts()?;
        if users.iter().any(|u| u.account.email == email) {
            return Err(Error::Conflict("Email already registered".to_string()));
        }
        if users.iter().any(|u| u.account.username == username) {
            return Err(Error::Conflict("Username already taken".to_string()));
        }

        let display_name = req.display_name.trim().to_string();
        let account = Account {
            id: Uuid::now_v7().to_string(),
            username: username.to_string(),
            email: email.to_string(),
            avatar_url: Some(default_avatar_url(&display_name)),
            display_name,
            bio: String::new(),
            joined_date: Utc::now(),
        };
        let password_hash = hash_password(&req.password)?;

        users.push(UserRecord {
            account: account.clone(),
            password_hash,
        });
        self.store.save_registration(&users, &account)?;
        self.session = Some(account.clone());

        info!(user = %account.username, id = %account.id, "account created");
        Ok(account)
    }

    pub fn login(&mut self, email: &str, password: &str) -> Result<Account> {
        let users = self.store.load_accounts()?;
        let record = users
            .into_iter()
            .find(|u| u.account.email == email.trim())
            .ok_or(Error::Authentication)?;

        if !verify_password(password, &record.password_hash)? {
            warn!(user = %record.account.username, "login rejected");
            return Err(Error::Authentication);
        }

        let account = record.account;
        self.store.save_session(Some(&account))?;
        self.session = Some(account.clone());
        info!(user = %account.username, "logged in");
        Ok(account)
    }

    /// Stays signed in if the cleared pointer cannot be written.
    pub fn logout(&mut self) -> Result<()> {
        self.store.save_session(None)?;
        if let Some(account) = self.session.take() {
            info!(user = %account.username, "logged out");
        }
        Ok(())
    }

    pub fn find_by_username(&self, username: &str) -> Result<Option<Account>> {
        Ok(self
            .store
            .load_accounts()?
            .into_iter()
            .find(|u| u.account.username == username)
            .map(|u| u.account))
    }
}

fn default_avatar_url(display_name: &str) -> String {
    format!(
        "https://ui-avatars.com/api/?name={}&background=random",
        urlencoding::encode(display_name)
    )
}
