//! Local sign-up / sign-in.
//!
//! There is no server: accounts live in a credential table (`users`) in the
//! same store as everything else, and the "password" of an account is the
//! user's metadata API key. Signing in binds the session namespace and
//! stores the key where the catalog client picks it up.

use std::sync::OnceLock;

use log::{info, warn};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::app_response::AppResponse;
use crate::storage_area::StorageArea;
use crate::storage_keys::StorageKey;
use crate::user_storage::UserStorage;

const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";

/// One row of the credential table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// Account email.
    pub id: String,
    /// Metadata API key used as the account password.
    pub password: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignUpForm {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub agree_to_terms: bool,
}

/// Account operations bound to a [`UserStorage`].
pub struct AuthService<'a, S: StorageArea> {
    storage: &'a mut UserStorage<S>,
}

pub fn is_valid_email(email: &str) -> bool {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    let pattern = PATTERN.get_or_init(|| match Regex::new(EMAIL_PATTERN) {
        Ok(regex) => Some(regex),
        Err(e) => {
            warn!("Email pattern failed to compile: {e}");
            None
        }
    });
    pattern.as_ref().is_some_and(|regex| regex.is_match(email))
}

impl<'a, S: StorageArea> AuthService<'a, S> {
    pub(crate) fn new(storage: &'a mut UserStorage<S>) -> Self {
        Self { storage }
    }

    /// Creates an account.
    ///
    /// `key_check` decides whether the API key is usable; it normally probes
    /// the metadata API (see
    /// [`CatalogClient::validate_api_key`](crate::catalog::CatalogClient::validate_api_key))
    /// and is only called once every local check has passed.
    pub fn register<F>(&mut self, form: &SignUpForm, key_check: F) -> Result<(), AppResponse>
    where
        F: FnOnce(&str) -> bool,
    {
        let email = form.email.trim();
        if !is_valid_email(email) {
            return Err(AppResponse::ValidationError("Invalid email format".to_string()));
        }
        if form.password != form.confirm_password {
            return Err(AppResponse::ValidationError("Passwords do not match".to_string()));
        }
        if !form.agree_to_terms {
            return Err(AppResponse::ValidationError(
                "You must agree to the required terms".to_string(),
            ));
        }

        let mut users = self.users()?;
        if users.iter().any(|user| user.id == email) {
            return Err(AppResponse::ValidationError(format!(
                "An account for {email} already exists"
            )));
        }

        if !key_check(&form.password) {
            return Err(AppResponse::ValidationError("Invalid API key".to_string()));
        }

        users.push(Credential {
            id: email.to_string(),
            password: form.password.clone(),
        });
        let raw = serde_json::to_string(&users)?;
        self.storage.store().set_item(StorageKey::Users.as_str(), &raw)?;

        info!("Registered account {email}");
        Ok(())
    }

    /// Signs in with a registered email and API key.
    pub fn sign_in(
        &mut self,
        email: &str,
        password: &str,
        remember_me: bool,
    ) -> Result<(), AppResponse> {
        let email = email.trim();
        if !is_valid_email(email) {
            return Err(AppResponse::ValidationError("Invalid email format".to_string()));
        }

        let user = self
            .users()?
            .into_iter()
            .find(|user| user.id == email && user.password == password)
            .ok_or_else(|| {
                warn!("Failed sign-in attempt for {email}");
                AppResponse::Unauthorized("Email or password does not match".to_string())
            })?;

        if !self.storage.init_user(&user.id) {
            return Err(AppResponse::DatabaseError(
                "Could not record the session identity".to_string(),
            ));
        }

        let store = self.storage.store();
        store.set_item(StorageKey::ApiKey.as_str(), &user.password)?;
        store.set_item(StorageKey::IsLoggedIn.as_str(), "true")?;
        if remember_me {
            store.set_item(StorageKey::RememberedEmail.as_str(), &user.id)?;
        } else {
            store.remove_item(StorageKey::RememberedEmail.as_str())?;
        }

        info!("Signed in as {}", user.id);
        Ok(())
    }

    /// Logs out, wiping every stored key.
    pub fn sign_out(&mut self) {
        self.storage.clear_user_data();
    }

    /// Signed in with a stored API key.
    pub fn is_logged_in(&self) -> bool {
        let flag = match self.storage.store().get_item(StorageKey::IsLoggedIn.as_str()) {
            Ok(flag) => flag,
            Err(e) => {
                warn!("Error reading login flag: {e}");
                None
            }
        };
        flag.as_deref() == Some("true") && self.storage.api_key().is_some()
    }

    pub fn remembered_email(&self) -> Option<String> {
        match self
            .storage
            .store()
            .get_item(StorageKey::RememberedEmail.as_str())
        {
            Ok(email) => email,
            Err(e) => {
                warn!("Error reading remembered email: {e}");
                None
            }
        }
    }

    pub fn api_key(&self) -> Option<String> {
        self.storage.api_key()
    }

    /// Ends the session after the API rejected the stored key.
    pub fn invalidate(&self) {
        self.storage.invalidate_credentials();
    }

    fn users(&self) -> Result<Vec<Credential>, AppResponse> {
        match self.storage.store().get_item(StorageKey::Users.as_str())? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }
}
