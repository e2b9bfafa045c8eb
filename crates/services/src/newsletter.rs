use std::sync::Arc;

use domains::{normalize_email, DomainError, NewsletterStore, Result, SignupOutcome};

#[derive(Clone)]
pub struct NewsletterService {
    store: Arc<dyn NewsletterStore>,
}

impl NewsletterService {
    pub fn new(store: Arc<dyn NewsletterStore>) -> Self {
        Self { store }
    }

    pub async fn subscribe(&self, raw_email: &str) -> Result<SignupOutcome> {
        let email = normalize_email(raw_email)
            .ok_or_else(|| DomainError::validation("Please enter a valid email address."))?;
        let outcome = self.store.subscribe(&email).await?;
        if outcome == SignupOutcome::Subscribed {
            tracing::info!("newsletter signup");
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::MockNewsletterStore;
    use mockall::predicate::eq;

    #[tokio::test]
    async fn test_subscribe_normalises_before_storing() {
        let mut store = MockNewsletterStore::new();
        store
            .expect_subscribe()
            .with(eq("reader@example.org"))
            .times(1)
            .returning(|_| Ok(SignupOutcome::Subscribed));
        let service = NewsletterService::new(Arc::new(store));

        let outcome = service.subscribe(" Reader@Example.org ").await.unwrap();
        assert_eq!(outcome, SignupOutcome::Subscribed);
    }

    #[tokio::test]
    async fn test_invalid_email_skips_store() {
        let mut store = MockNewsletterStore::new();
        store.expect_subscribe().never();
        let service = NewsletterService::new(Arc::new(store));

        let err = service.subscribe("not an email").await.unwrap_err();
        assert!(matches!(err, DomainError::ValidationFailed(_)));
    }
}
