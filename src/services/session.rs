//! Login session: bearer token kept in the API client and in local storage

use std::rc::Rc;
use std::sync::Arc;

use validator::Validate;

use super::notifications::Notifier;
use crate::{
    api::LibraryApi,
    error::AppResult,
    models::user::{LoginRequest, User},
    storage::{keys, KeyValueStore},
};

#[derive(Clone)]
pub struct SessionService {
    api: Arc<dyn LibraryApi>,
    storage: Rc<dyn KeyValueStore>,
    notifier: Notifier,
}

impl SessionService {
    pub fn new(api: Arc<dyn LibraryApi>, storage: Rc<dyn KeyValueStore>, notifier: Notifier) -> Self {
        Self {
            api,
            storage,
            notifier,
        }
    }

    /// Reuse a token saved by an earlier login. Returns whether one was found.
    pub fn restore(&self) -> bool {
        match self.storage.get(keys::AUTH_TOKEN) {
            Ok(Some(token)) if !token.trim().is_empty() => {
                self.api.set_token(Some(token));
                true
            }
            Ok(_) => false,
            Err(e) => {
                tracing::warn!("Could not read saved session: {}", e);
                false
            }
        }
    }

    pub fn is_logged_in(&self) -> bool {
        matches!(self.storage.get(keys::AUTH_TOKEN), Ok(Some(ref t)) if !t.trim().is_empty())
    }

    pub async fn login(&self, email: &str, password: &str) -> AppResult<User> {
        let request = LoginRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        request.validate()?;

        let session = match self.api.login(&request).await {
            Ok(session) => session,
            Err(e) => {
                self.notifier.error(e.user_message());
                return Err(e);
            }
        };

        self.api.set_token(Some(session.token.clone()));
        self.storage.set(keys::AUTH_TOKEN, &session.token)?;

        tracing::info!(user_id = %session.user.id, "Logged in");
        self.notifier
            .success(format!("Welcome, {}", session.user.display_name()));
        Ok(session.user)
    }

    pub fn logout(&self) -> AppResult<()> {
        self.api.set_token(None);
        self.storage.remove(keys::AUTH_TOKEN)?;
        tracing::info!("Logged out");
        self.notifier.info("You have been logged out");
        Ok(())
    }

    pub async fn me(&self) -> AppResult<User> {
        self.api.me().await
    }
}
