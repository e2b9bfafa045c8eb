//! Essay listing, featured selection and category browsing.

use std::cmp::Reverse;
use std::sync::Arc;

use domains::{Category, DomainError, Essay, EssayStore, Result};

/// The fixed category table: (slug, display name).
pub const CATEGORIES: &[(&str, &str)] = &[
    ("economia", "Economia"),
    ("storia", "Storia"),
    ("societa", "Società"),
    ("geopolitica", "Geopolitica"),
    ("filosofia", "Filosofia"),
    ("tecnologia", "Tecnologia"),
];

pub fn categories() -> Vec<Category> {
    CATEGORIES.iter().map(|(slug, name)| Category::new(slug, name)).collect()
}

pub fn category(slug: &str) -> Option<Category> {
    CATEGORIES
        .iter()
        .find(|(s, _)| *s == slug)
        .map(|(slug, name)| Category::new(slug, name))
}

/// Newest first; undated essays go last, ties broken by slug.
pub fn sort_latest_first(essays: &mut [Essay]) {
    essays.sort_by(|a, b| {
        Reverse(a.date)
            .cmp(&Reverse(b.date))
            .then_with(|| a.slug.cmp(&b.slug))
    });
}

/// Read side of the essay collection.
#[derive(Clone)]
pub struct EssayCatalog {
    store: Arc<dyn EssayStore>,
}

impl EssayCatalog {
    pub fn new(store: Arc<dyn EssayStore>) -> Self {
        Self { store }
    }

    pub async fn latest(&self) -> Result<Vec<Essay>> {
        let mut essays = self.store.list().await?;
        sort_latest_first(&mut essays);
        Ok(essays)
    }

    /// Essays flagged `featured`, newest first. Without any flagged essay
    /// the newest one stands in.
    pub async fn featured(&self) -> Result<Vec<Essay>> {
        let essays = self.latest().await?;
        let featured: Vec<Essay> = essays.iter().filter(|e| e.featured).cloned().collect();
        if featured.is_empty() {
            return Ok(essays.into_iter().take(1).collect());
        }
        Ok(featured)
    }

    /// The essay to lead the home page with.
    pub async fn hero(&self) -> Result<Option<Essay>> {
        Ok(self.featured().await?.into_iter().next())
    }

    pub async fn by_slug(&self, slug: &str) -> Result<Option<Essay>> {
        if !is_valid_slug(slug) {
            return Ok(None);
        }
        self.store.by_slug(slug).await
    }

    /// Like [`EssayCatalog::by_slug`] but a missing essay is an error.
    pub async fn require(&self, slug: &str) -> Result<Essay> {
        self.by_slug(slug)
            .await?
            .ok_or_else(|| DomainError::not_found("essay", slug))
    }

    pub async fn in_category(&self, slug: &str) -> Result<(Category, Vec<Essay>)> {
        let category = category(slug).ok_or_else(|| DomainError::not_found("category", slug))?;
        let essays = self
            .latest()
            .await?
            .into_iter()
            .filter(|essay| category.contains(essay))
            .collect();
        Ok((category, essays))
    }
}

/// Slugs name files in the content directory; anything that could escape it
/// is refused.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug != "."
        && !slug.contains("..")
        && slug
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == '.')
}
