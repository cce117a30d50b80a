//! Per-host request throttle

use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use reqwest::Url;
use std::time::Duration;

/// Spaces consecutive requests to the same host by a fixed period
pub struct HostThrottle {
    limiter: Option<DefaultKeyedRateLimiter<String>>,
}

impl HostThrottle {
    /// A zero delay disables throttling
    pub fn new(delay: Duration) -> Self {
        Self {
            limiter: Quota::with_period(delay).map(RateLimiter::keyed),
        }
    }

    pub fn disabled() -> Self {
        Self { limiter: None }
    }

    /// Wait until the host may be contacted again
    pub async fn wait(&self, host: &str) {
        if let Some(limiter) = &self.limiter {
            limiter.until_key_ready(&host.to_ascii_lowercase()).await;
        }
    }
}

/// Lowercase host of a URL
pub fn host_of(url: &str) -> Option<String> {
    Url::parse(url).ok()?.host_str().map(normalize_host)
}

/// Throttle key for a link: the URL's host, else the stored domain
pub fn throttle_key(url: &str, domain: &str) -> String {
    host_of(url).unwrap_or_else(|| normalize_host(domain))
}

fn normalize_host(host: &str) -> String {
    let host = host.trim().to_ascii_lowercase();
    match host.strip_prefix("www.") {
        Some(rest) => rest.to_string(),
        None => host,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_host_of() {
        assert_eq!(host_of("https://www.Example.org/a?b=1").as_deref(), Some("example.org"));
        assert_eq!(host_of("not a url"), None);
    }

    #[test]
    fn test_throttle_key_ignores_stored_domain_spelling() {
        assert_eq!(throttle_key("https://www.same.example/a", "www.same.example"), "same.example");
        assert_eq!(throttle_key("https://www.same.example/b", ""), "same.example");
        assert_eq!(throttle_key("not a url", "WWW.Fallback.example"), "fallback.example");
    }

    #[tokio::test]
    async fn test_same_host_is_spaced() {
        let throttle = HostThrottle::new(Duration::from_millis(60));
        let start = Instant::now();
        throttle.wait("a.example").await;
        throttle.wait("a.example").await;
        assert!(start.elapsed() >= Duration::from_millis(40));
    }

    #[tokio::test]
    async fn test_hosts_are_independent() {
        let throttle = HostThrottle::new(Duration::from_millis(500));
        let start = Instant::now();
        throttle.wait("a.example").await;
        throttle.wait("b.example").await;
        assert!(start.elapsed() < Duration::from_millis(400));
    }

    #[tokio::test]
    async fn test_disabled() {
        let throttle = HostThrottle::new(Duration::ZERO);
        let start = Instant::now();
        for _ in 0..5 {
            throttle.wait("a.example").await;
        }
        assert!(start.elapsed() < Duration::from_millis(100));
    }
}
