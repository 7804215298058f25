use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::contract::model::{Credentials, Identity, IssuedToken, User};
use crate::domain::error::DomainError;
use crate::domain::password::{hash_password, verify_password};
use crate::domain::repo::UsersRepository;
use crate::domain::token::TokenCodec;

/// Domain service for registration, login and token verification.
/// Depends only on the repository port, not on infra types.
#[derive(Clone)]
pub struct Service {
    repo: Arc<dyn UsersRepository>,
    tokens: TokenCodec,
}

impl Service {
    pub fn new(repo: Arc<dyn UsersRepository>, tokens: TokenCodec) -> Self {
        Self { repo, tokens }
    }

    #[instrument(
        name = "accounts.service.register",
        skip(self, credentials),
        fields(username = %credentials.username)
    )]
    pub async fn register(&self, credentials: Credentials) -> Result<Identity, DomainError> {
        info!("Registering new user");
        Self::validate(&credentials)?;

        if self
            .repo
            .username_exists(&credentials.username)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?
        {
            return Err(DomainError::username_taken(credentials.username));
        }

        let password = credentials.password;
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| DomainError::crypto(e.to_string()))??;

        let user = User {
            id: Uuid::new_v4(),
            username: credentials.username,
            password_hash,
            created_at: Utc::now(),
        };
        let identity = Identity {
            id: user.id,
            username: user.username.clone(),
        };

        let inserted = self
            .repo
            .insert(user)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;
        if !inserted {
            // Lost a race against a concurrent registration.
            return Err(DomainError::username_taken(identity.username));
        }

        info!("Successfully registered user with id={}", identity.id);
        Ok(identity)
    }

    #[instrument(
        name = "accounts.service.login",
        skip(self, credentials),
        fields(username = %credentials.username)
    )]
    pub async fn login(&self, credentials: Credentials) -> Result<IssuedToken, DomainError> {
        debug!("Login attempt");
        Self::validate(&credentials)?;

        let Some(user) = self
            .repo
            .find_by_username(&credentials.username)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?
        else {
            debug!("Unknown username");
            return Err(DomainError::InvalidCredentials);
        };

        let password = credentials.password;
        let stored = user.password_hash.clone();
        let matches = tokio::task::spawn_blocking(move || verify_password(&password, &stored))
            .await
            .map_err(|e| DomainError::crypto(e.to_string()))??;
        if !matches {
            warn!(user_id = %user.id, "Password mismatch");
            return Err(DomainError::InvalidCredentials);
        }

        let identity = Identity {
            id: user.id,
            username: user.username,
        };
        let (token, expires_at) = self.tokens.issue(&identity)?;

        info!(user_id = %identity.id, "Issued token");
        Ok(IssuedToken {
            token,
            identity,
            expires_at,
        })
    }

    /// Verify a raw bearer token. An empty string counts as a missing token.
    #[instrument(name = "accounts.service.authenticate", skip_all)]
    pub async fn authenticate(&self, token: &str) -> Result<Identity, DomainError> {
        if token.is_empty() {
            return Err(DomainError::MissingToken);
        }
        self.tokens.verify(token)
    }

    fn validate(credentials: &Credentials) -> Result<(), DomainError> {
        if credentials.username.is_empty() || credentials.password.is_empty() {
            return Err(DomainError::MissingCredentials);
        }
        Ok(())
    }
}
