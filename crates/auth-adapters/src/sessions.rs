//! # Session accounts
//!
//! Email/password accounts kept in an [`AccountStore`], with opaque session
//! tokens held in process. Passwords are stored as Argon2 hashes; hashing
//! runs on the blocking pool.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use domains::{
    display_label, normalize_email, Account, AccountProvider, AccountStore, DomainError, Identity,
    Profile, Result, Session, SessionToken, UserId,
};
use uuid::Uuid;

use crate::password::{hash_password, verify_password};

pub const MIN_PASSWORD_LEN: usize = 6;

struct LiveSession {
    identity: Identity,
    expires_at: DateTime<Utc>,
}

pub struct SessionAccounts {
    accounts: Arc<dyn AccountStore>,
    sessions: DashMap<String, LiveSession>,
    ttl: Duration,
}

impl SessionAccounts {
    pub fn new(accounts: Arc<dyn AccountStore>, ttl: Duration) -> Self {
        Self { accounts, sessions: DashMap::new(), ttl }
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Drops every expired session.
    pub fn purge_expired(&self) {
        let now = Utc::now();
        self.sessions.retain(|_, session| session.expires_at > now);
    }
}

async fn hash_blocking(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(DomainError::unavailable)?
        .map_err(DomainError::unavailable)
}

async fn verify_blocking(password: String, hash: String) -> Result<bool> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(DomainError::unavailable)
}

#[async_trait]
impl AccountProvider for SessionAccounts {
    async fn sign_up(&self, email: &str, password: &str) -> Result<Identity> {
        let email = normalize_email(email)
            .ok_or_else(|| DomainError::validation("Please enter a valid email address."))?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(DomainError::validation(format!(
                "Passwords need at least {MIN_PASSWORD_LEN} characters."
            )));
        }
        if self.accounts.by_email(&email).await?.is_some() {
            return Err(DomainError::Conflict("An account with this email already exists.".into()));
        }

        let password_hash = hash_blocking(password.to_string()).await?;
        let identity = Identity { id: UserId::new(), display_label: display_label(&email) };
        // A concurrent sign-up may have won while hashing; the store has the last word.
        self.accounts
            .create(Account {
                identity: identity.clone(),
                email,
                password_hash,
                created_at: Utc::now(),
            })
            .await?;
        tracing::info!(user = %identity.id, "account created");
        Ok(identity)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let email = normalize_email(email).ok_or(DomainError::NotAuthenticated)?;
        let Some(account) = self.accounts.by_email(&email).await? else {
            tracing::debug!("sign-in for unknown account");
            return Err(DomainError::NotAuthenticated);
        };
        let identity = account.identity;

        if !verify_blocking(password.to_string(), account.password_hash).await? {
            tracing::info!(user = %identity.id, "sign-in rejected");
            return Err(DomainError::NotAuthenticated);
        }

        let token = SessionToken(Uuid::new_v4().simple().to_string());
        let expires_at = Utc::now() + self.ttl;
        self.sessions.insert(
            token.0.clone(),
            LiveSession { identity: identity.clone(), expires_at },
        );
        tracing::info!(user = %identity.id, "signed in");
        Ok(Session { token, identity, expires_at })
    }

    async fn resolve(&self, token: &SessionToken) -> Result<Option<Identity>> {
        let now = Utc::now();
        match self.sessions.get(token.as_str()) {
            None => return Ok(None),
            Some(session) if session.expires_at > now => return Ok(Some(session.identity.clone())),
            Some(_) => {}
        }
        // Expired; the read guard is released by now.
        self.sessions.remove(token.as_str());
        Ok(None)
    }

    async fn sign_out(&self, token: &SessionToken) -> Result<()> {
        if let Some((_, session)) = self.sessions.remove(token.as_str()) {
            tracing::info!(user = %session.identity.id, "signed out");
        }
        Ok(())
    }

    async fn profile(&self, id: UserId) -> Result<Option<Profile>> {
        Ok(self.accounts.by_id(id).await?.map(Profile::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage_adapters::MemoryAccountStore;

    fn accounts_with_ttl(ttl: Duration) -> SessionAccounts {
        SessionAccounts::new(Arc::new(MemoryAccountStore::new()), ttl)
    }

    fn accounts() -> SessionAccounts {
        accounts_with_ttl(Duration::hours(1))
    }

    #[tokio::test]
    async fn test_sign_up_then_sign_in() {
        let accounts = accounts();
        let identity = accounts.sign_up(" Ada@Example.org ", "secret1").await.unwrap();
        assert_eq!(identity.display_label, "ada");

        let session = accounts.sign_in("ada@example.org", "secret1").await.unwrap();
        assert_eq!(session.identity, identity);
        assert_eq!(accounts.resolve(&session.token).await.unwrap(), Some(identity));
    }

    #[tokio::test]
    async fn test_sign_up_validation() {
        let accounts = accounts();
        let short = accounts.sign_up("ada@example.org", "12345").await.unwrap_err();
        assert!(matches!(short, DomainError::ValidationFailed(_)));

        for bad_email in ["ada", "a@b", "a b@c.de"] {
            let err = accounts.sign_up(bad_email, "secret1").await.unwrap_err();
            assert!(matches!(err, DomainError::ValidationFailed(_)), "{bad_email}");
        }

        accounts.sign_up("ada@example.org", "secret1").await.unwrap();
        let duplicate = accounts.sign_up("ADA@example.org", "secret2").await.unwrap_err();
        assert!(matches!(duplicate, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_wrong_password_is_rejected() {
        let accounts = accounts();
        accounts.sign_up("ada@example.org", "secret1").await.unwrap();
        let err = accounts.sign_in("ada@example.org", "secret2").await.unwrap_err();
        assert_eq!(err, DomainError::NotAuthenticated);
        let err = accounts.sign_in("bob@example.org", "secret1").await.unwrap_err();
        assert_eq!(err, DomainError::NotAuthenticated);
    }

    #[tokio::test]
    async fn test_sign_out_revokes_token() {
        let accounts = accounts();
        accounts.sign_up("ada@example.org", "secret1").await.unwrap();
        let session = accounts.sign_in("ada@example.org", "secret1").await.unwrap();

        accounts.sign_out(&session.token).await.unwrap();
        assert_eq!(accounts.resolve(&session.token).await.unwrap(), None);
        // Signing out twice is harmless.
        accounts.sign_out(&session.token).await.unwrap();
    }

    #[tokio::test]
    async fn test_expired_session_resolves_to_none() {
        let accounts = accounts_with_ttl(Duration::seconds(-1));
        accounts.sign_up("ada@example.org", "secret1").await.unwrap();
        let session = accounts.sign_in("ada@example.org", "secret1").await.unwrap();

        assert_eq!(accounts.resolve(&session.token).await.unwrap(), None);
        assert_eq!(accounts.session_count(), 0);
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let accounts = accounts_with_ttl(Duration::seconds(-1));
        accounts.sign_up("ada@example.org", "secret1").await.unwrap();
        accounts.sign_in("ada@example.org", "secret1").await.unwrap();
        assert_eq!(accounts.session_count(), 1);
        accounts.purge_expired();
        assert_eq!(accounts.session_count(), 0);
    }

    #[tokio::test]
    async fn test_profile_carries_email_and_member_since() {
        let accounts = accounts();
        let before = Utc::now();
        let identity = accounts.sign_up("Ada@Example.org", "secret1").await.unwrap();

        let profile = accounts.profile(identity.id).await.unwrap().unwrap();
        assert_eq!(profile.identity, identity);
        assert_eq!(profile.email, "ada@example.org");
        assert!(profile.member_since >= before);
        assert!(accounts.profile(UserId::new()).await.unwrap().is_none());
    }
}
