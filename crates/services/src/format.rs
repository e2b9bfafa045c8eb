//! Small text helpers for rendering essays and comments.

use chrono::{DateTime, Utc};

/// "just now", "5m ago", "3h ago", "12d ago", "4mo ago", "2y ago".
pub fn time_ago(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - then).num_seconds();
    if seconds < 60 {
        return "just now".to_string();
    }
    let minutes = seconds / 60;
    if minutes < 60 {
        return format!("{minutes}m ago");
    }
    let hours = minutes / 60;
    if hours < 24 {
        return format!("{hours}h ago");
    }
    let days = hours / 24;
    if days < 30 {
        return format!("{days}d ago");
    }
    let months = days / 30;
    if months < 12 {
        return format!("{months}mo ago");
    }
    format!("{}y ago", months / 12)
}

/// Splits a body into paragraphs on blank lines.
pub fn paragraphs(body: &str) -> Vec<String> {
    body.split("\n\n")
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .map(|p| p.lines().map(str::trim).collect::<Vec<_>>().join(" "))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_time_ago_thresholds() {
        let now = Utc::now();
        assert_eq!(time_ago(now - Duration::seconds(59), now), "just now");
        assert_eq!(time_ago(now - Duration::minutes(5), now), "5m ago");
        assert_eq!(time_ago(now - Duration::hours(3), now), "3h ago");
        assert_eq!(time_ago(now - Duration::days(12), now), "12d ago");
        assert_eq!(time_ago(now - Duration::days(125), now), "4mo ago");
        assert_eq!(time_ago(now - Duration::days(800), now), "2y ago");
    }

    #[test]
    fn test_future_timestamps_read_as_now() {
        let now = Utc::now();
        assert_eq!(time_ago(now + Duration::minutes(2), now), "just now");
    }

    #[test]
    fn test_paragraphs() {
        let body = "First line\nstill first.\n\n\n  Second.  \n\n";
        assert_eq!(paragraphs(body), vec!["First line still first.", "Second."]);
    }
}
