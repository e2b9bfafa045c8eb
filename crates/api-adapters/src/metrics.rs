//! Prometheus counters for the comment and newsletter flows.

use prometheus_client::encoding::text::encode;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::registry::Registry;

pub struct Metrics {
    registry: Registry,
    pub comments_posted: Counter,
    pub comments_deleted: Counter,
    pub comment_load_failures: Counter,
    pub newsletter_signups: Counter,
}

impl Metrics {
    pub fn new() -> Self {
        let mut registry = Registry::with_prefix("marginalia");

        let comments_posted = Counter::default();
        registry.register(
            "comments_posted",
            "Comments and replies accepted by the store",
            comments_posted.clone(),
        );
        let comments_deleted = Counter::default();
        registry.register(
            "comments_deleted",
            "Comments soft-deleted by their authors",
            comments_deleted.clone(),
        );
        let comment_load_failures = Counter::default();
        registry.register(
            "comment_load_failures",
            "Comment section loads that fell back to the empty state",
            comment_load_failures.clone(),
        );
        let newsletter_signups = Counter::default();
        registry.register(
            "newsletter_signups",
            "New newsletter subscribers",
            newsletter_signups.clone(),
        );

        Self {
            registry,
            comments_posted,
            comments_deleted,
            comment_load_failures,
            newsletter_signups,
        }
    }

    /// OpenMetrics text exposition of every registered metric.
    pub fn render(&self) -> Result<String, std::fmt::Error> {
        let mut body = String::new();
        encode(&mut body, &self.registry)?;
        Ok(body)
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
